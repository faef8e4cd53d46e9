use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod handlers;
mod history;
mod middleware;
mod persistence;
mod server;
mod simulator;
mod telemetry;

use config::Config;
use history::History;
use persistence::{JsonFilePersistence, MemoryPersistence, Persistence};
use telemetry::{ExportOptions, SampleStore, StatsEngine};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// The one sample history — ingestion appends, every feed snapshots.
    pub history: Arc<History>,

    /// Trend threshold lives here; aggregation itself is stateless.
    pub engine: StatsEngine,

    /// Time offset and CSV flavour for the chart feed and export.
    pub export: ExportOptions,

    /// Tick of the SSE live feed.
    pub stream_interval: Duration,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    // ── 1. Build the store (bad capacity is fatal here, never later) ─
    let store = SampleStore::new(config.capacity).unwrap_or_else(|e| {
        log::error!("{e}");
        std::process::exit(2);
    });

    // ── 2. Pick the persistence backend and restore ─────────────
    let backend: Box<dyn Persistence> = match &config.data_file {
        Some(path) => Box::new(JsonFilePersistence::new(path)),
        None => Box::new(MemoryPersistence),
    };
    log::info!("history backend: {}", backend.describe());

    let history = History::open(store, backend).unwrap_or_else(|e| {
        log::error!("cannot restore history: {e}");
        std::process::exit(1);
    });
    let history = Arc::new(history);

    // ── 3. Build shared state ────────────────────────────────────
    let state = Arc::new(AppState {
        history: history.clone(),
        engine: StatsEngine::new(config.trend_threshold),
        export: config.export_options(),
        stream_interval: config.stream_interval(),
    });

    // ── 4. Optional simulated sensor ─────────────────────────────
    if let Some(every) = config.simulate_every() {
        tokio::spawn(simulator::run(history.clone(), every, 42));
    }

    // ── 5. Build Axum router ─────────────────────────────────────
    let threshold = state.engine.threshold();
    let app = server::create_router(state, &config.static_dir);

    // ── 6. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .unwrap_or_else(|e| {
            log::error!("failed to bind {}: {e}", config.bind);
            std::process::exit(1);
        });

    log::info!(
        "meteo station listening on http://{} ({} of {} samples retained, trend threshold {})",
        config.bind,
        history.len(),
        history.capacity(),
        threshold
    );
    log::info!("ingest  → POST /api/data");
    log::info!("stats   → GET  /api/stats");
    log::info!("chart   → GET  /api/chart");
    log::info!("export  → GET  /api/export");
    log::info!("live    → GET  /api/stream");

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("server exited with error: {e}");
        std::process::exit(1);
    }
}
