use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::telemetry::{export, ChartFeed, Sample, Stats};
use crate::AppState;

use super::{Ack, AppError};

// ─── GET /api/history ────────────────────────────────────────────

pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<Vec<Sample>> {
    Json(state.history.snapshot())
}

// ─── GET /api/stats ──────────────────────────────────────────────

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<Stats> {
    Json(state.engine.compute(&state.history.snapshot()))
}

// ─── GET /api/chart ──────────────────────────────────────────────

pub async fn get_chart(State(state): State<Arc<AppState>>) -> Json<ChartFeed> {
    Json(export::to_chart_feed(&state.history.snapshot(), &state.export))
}

// ─── GET /api/export ─────────────────────────────────────────────

pub async fn export_csv(State(state): State<Arc<AppState>>) -> Response {
    let csv = export::to_csv(&state.history.snapshot(), &state.export);
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"sensor_data.csv\"",
            ),
        ],
        csv,
    )
        .into_response()
}

// ─── POST /api/clear ─────────────────────────────────────────────

pub async fn clear(State(state): State<Arc<AppState>>) -> Result<Json<Ack>, AppError> {
    let history = state.history.clone();
    tokio::task::spawn_blocking(move || history.clear())
        .await
        .map_err(|e| AppError::Internal(format!("clear task failed: {e}")))?;

    log::info!("history cleared");
    Ok(Ack::success("Data cleared"))
}
