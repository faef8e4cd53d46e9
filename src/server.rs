use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::middleware::timing;
use crate::telemetry::stream;
use crate::AppState;

/// Builds the full Axum `Router` with all routes, middleware, and static serving.
pub fn create_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        // ── Ingestion ───────────────────────────────────────────
        .route("/api/data", post(handlers::ingest::post_reading))
        // ── Read feeds ──────────────────────────────────────────
        .route("/api/history", get(handlers::readings::get_history))
        .route("/api/stats", get(handlers::readings::get_stats))
        .route("/api/chart", get(handlers::readings::get_chart))
        .route("/api/export", get(handlers::readings::export_csv))
        .route("/api/stream", get(stream::live_stream))
        // ── Maintenance ─────────────────────────────────────────
        .route("/api/clear", post(handlers::readings::clear))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Serve the dashboard ─────────────────────────────────
        .fallback_service(ServeDir::new(static_dir))
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;
    use crate::persistence::MemoryPersistence;
    use crate::telemetry::{ExportOptions, SampleStore, StatsEngine};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app_with_capacity(capacity: usize) -> (Router, Arc<AppState>) {
        let history = History::open(
            SampleStore::new(capacity).unwrap(),
            Box::new(MemoryPersistence),
        )
        .unwrap();
        let state = Arc::new(AppState {
            history: Arc::new(history),
            engine: StatsEngine::new(1.0),
            export: ExportOptions::default(),
            stream_interval: Duration::from_secs(1),
        });
        (create_router(state.clone(), Path::new("static")), state)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: &Router, uri: &str) -> Value {
        let (status, body) = send(app, Request::get(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        serde_json::from_slice(&body).unwrap()
    }

    async fn post_reading(app: &Router, body: &str) -> StatusCode {
        let req = Request::post("/api/data")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap();
        send(app, req).await.0
    }

    #[tokio::test]
    async fn ingest_then_read_every_feed() {
        let (app, _) = app_with_capacity(100);
        for t in [20.0, 20.0, 20.0, 20.0, 21.2] {
            let body = format!(r#"{{"temperature":{t},"humidity":45,"pressure":1013}}"#);
            assert_eq!(post_reading(&app, &body).await, StatusCode::OK);
        }

        let stats = get_json(&app, "/api/stats").await;
        assert_eq!(stats["count"], 5);
        assert_eq!(stats["temperature"]["trend"], "up");
        assert_eq!(stats["humidity"]["trend"], "stable");
        assert_eq!(stats["temperature"]["current"], 21.2);
        assert!(stats["lastUpdate"].is_string());

        let chart = get_json(&app, "/api/chart").await;
        assert_eq!(chart["times"].as_array().unwrap().len(), 5);
        assert_eq!(chart["temperatures"][4], 21.2);
        assert_eq!(chart["pressures"][0], 1013.0);
        assert_eq!(chart["lastUpdate"], chart["times"][4]);

        let history = get_json(&app, "/api/history").await;
        assert_eq!(history.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn malformed_fields_are_zeroed_not_rejected() {
        let (app, state) = app_with_capacity(10);
        assert_eq!(post_reading(&app, r#"{"temperature":"oops"}"#).await, StatusCode::OK);
        let snap = state.history.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].temperature, 0.0);

        let body = r#"{"temperature":1e400,"humidity":50}"#;
        assert_eq!(post_reading(&app, body).await, StatusCode::OK);
        let snap = state.history.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[1].temperature, 0.0);
        assert_eq!(snap[1].humidity, 50.0);
    }

    #[tokio::test]
    async fn undecodable_payload_is_400_without_mutation() {
        let (app, state) = app_with_capacity(10);
        post_reading(&app, r#"{"temperature":1}"#).await;

        let req = Request::post("/api/data").body(Body::from("garbage")).unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(err["status"], 400);
        assert!(err["error"].as_str().unwrap().contains("invalid payload"));
        assert_eq!(state.history.len(), 1);
    }

    #[tokio::test]
    async fn empty_store_serves_zero_state() {
        let (app, _) = app_with_capacity(10);
        let stats = get_json(&app, "/api/stats").await;
        assert_eq!(stats["count"], 0);
        assert_eq!(stats["pressure"]["average"], 0.0);
        assert_eq!(stats["pressure"]["trend"], "stable");
        assert!(stats["lastUpdate"].is_null());

        let chart = get_json(&app, "/api/chart").await;
        assert!(chart["times"].as_array().unwrap().is_empty());
        assert!(chart["lastUpdate"].is_null());
    }

    #[tokio::test]
    async fn csv_export_has_header_and_rows_in_order() {
        let (app, _) = app_with_capacity(10);
        for t in ["1.5", "2.5", "3.5"] {
            post_reading(&app, &format!(r#"{{"temperature":{t}}}"#)).await;
        }

        let resp = app
            .clone()
            .oneshot(Request::get("/api/export").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        assert!(resp.headers().contains_key("X-Response-Time-Us"));
        assert!(resp.headers()["Server-Timing"]
            .to_str()
            .unwrap()
            .starts_with("handler;dur="));

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0], "Time,Temperature (°C),Humidity (%),Pressure (hPa)");
        assert_eq!(rows.len(), 4);
        assert!(rows[1].ends_with(",1.5,0,0"));
        assert!(rows[3].ends_with(",3.5,0,0"));
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let (app, state) = app_with_capacity(10);
        post_reading(&app, "{}").await;

        for _ in 0..2 {
            let req = Request::post("/api/clear").body(Body::empty()).unwrap();
            let (status, body) = send(&app, req).await;
            assert_eq!(status, StatusCode::OK);
            let ack: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(ack["status"], "success");
        }
        assert_eq!(state.history.len(), 0);
        assert_eq!(get_json(&app, "/api/stats").await["count"], 0);
    }

    #[tokio::test]
    async fn capacity_bounds_what_is_served() {
        let (app, _) = app_with_capacity(3);
        for t in 0..7 {
            post_reading(&app, &format!(r#"{{"temperature":{t}}}"#)).await;
        }
        let chart = get_json(&app, "/api/chart").await;
        assert_eq!(chart["temperatures"], serde_json::json!([4.0, 5.0, 6.0]));
    }
}
