pub mod ingest;
pub mod readings;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::telemetry::TelemetryError;

// ─── Shared response envelope ────────────────────────────────────

/// Acknowledgement returned by every mutating endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Ack {
    pub status: &'static str,
    pub message: &'static str,
}

impl Ack {
    pub fn success(message: &'static str) -> Json<Self> {
        Json(Self {
            status: "success",
            message,
        })
    }
}

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl From<TelemetryError> for AppError {
    fn from(e: TelemetryError) -> Self {
        match e {
            TelemetryError::InvalidPayload(_) => Self::BadRequest(e.to_string()),
            // Only reachable at startup
            TelemetryError::CapacityMisconfigured(_) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error":  message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
