pub mod export;
pub mod reading;
pub mod stats;
pub mod store;
pub mod stream;

pub use export::{ChartFeed, Delimiter, ExportOptions, HeaderLocale};
pub use reading::Reading;
pub use stats::{Stats, StatsEngine};
pub use store::SampleStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One telemetry reading as committed to the store.
/// This is the "read" side — the store creates these, everything else copies them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Assigned by the store at ingestion, never by the device
    pub timestamp: DateTime<Utc>,
    /// °C
    pub temperature: f64,
    /// %
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
}

/// The three measured quantities, in the order every feed lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Temperature,
    Humidity,
    Pressure,
}

impl Metric {
    pub fn value_of(self, sample: &Sample) -> f64 {
        match self {
            Metric::Temperature => sample.temperature,
            Metric::Humidity => sample.humidity,
            Metric::Pressure => sample.pressure,
        }
    }

    /// JSON key used for this metric in ingestion payloads and stats output.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Pressure => "pressure",
        }
    }
}

/// Errors the core hands back to its caller. Nothing else in
/// `telemetry` can fail: coercion defaults locally, stats and export are total.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("store capacity must be positive (got {0})")]
    CapacityMisconfigured(usize),
}
