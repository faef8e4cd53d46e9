use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};

/// Measures each request to the station and reports it back to the client.
///
/// Every response, dashboard assets included, carries `X-Response-Time-Us`
/// and a `Server-Timing: handler;dur=<ms>` entry so the dashboard can show
/// how long ingestion and the feeds took. API calls are also logged, except
/// the long-lived live stream whose duration is the whole connection.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let started = Instant::now();
    let mut response = next.run(req).await;
    let took = started.elapsed();

    let headers = response.headers_mut();
    headers.insert("X-Response-Time-Us", HeaderValue::from(took.as_micros() as u64));
    if let Ok(value) = HeaderValue::from_str(&server_timing(took)) {
        headers.insert("Server-Timing", value);
    }

    if is_logged(&path) {
        log_request(response.status(), method.as_str(), &path, took);
    }
    response
}

fn server_timing(took: Duration) -> String {
    format!("handler;dur={:.3}", took.as_secs_f64() * 1000.0)
}

fn is_logged(path: &str) -> bool {
    path.starts_with("/api/") && path != "/api/stream"
}

fn log_request(status: StatusCode, method: &str, path: &str, took: Duration) {
    let level = match status {
        s if s.is_server_error() => log::Level::Warn,
        s if s.is_client_error() => log::Level::Info,
        _ => log::Level::Debug,
    };
    log::log!(level, "{} {method:<5} {path:<20} {:>7}μs", status.as_u16(), took.as_micros());
}
