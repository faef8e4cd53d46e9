use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;

use crate::telemetry::Reading;
use crate::AppState;

use super::{Ack, AppError};

// ─── POST /api/data ──────────────────────────────────────────────
/// Sensor ingestion. The body is decoded by the core, so a missing
/// `Content-Type` header from the device does not matter.

pub async fn post_reading(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Ack>, AppError> {
    let reading = Reading::decode(&body).map_err(|e| {
        log::debug!("rejected reading: {e}");
        AppError::from(e)
    })?;

    // Saving may touch the disk
    let history = state.history.clone();
    let sample = tokio::task::spawn_blocking(move || history.record(reading))
        .await
        .map_err(|e| AppError::Internal(format!("ingest task failed: {e}")))?;

    log::debug!(
        "received t={} h={} p={}",
        sample.temperature,
        sample.humidity,
        sample.pressure
    );

    Ok(Ack::success("Data received"))
}
