use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use super::export::{self, ChartFeed, ExportOptions};
use super::stats::{Stats, StatsEngine};
use super::Sample;
use crate::AppState;

/// One SSE frame: everything the dashboard redraws per tick.
#[derive(Debug, Clone, Serialize)]
pub struct LiveUpdate {
    pub stats: Stats,
    pub chart: ChartFeed,
}

impl LiveUpdate {
    /// Stats and chart are derived from the same snapshot so they never disagree.
    pub fn from_snapshot(
        samples: &[Sample],
        engine: &StatsEngine,
        opts: &ExportOptions,
    ) -> Self {
        Self {
            stats: engine.compute(samples),
            chart: export::to_chart_feed(samples, opts),
        }
    }
}

// ─── GET /api/stream ─────────────────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes a `LiveUpdate` as JSON every `stream_interval`.
/// Polling cadence is the client's business; this just saves it a request.

pub async fn live_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(state.stream_interval);

    let stream = IntervalStream::new(interval).map(move |_| {
        let snapshot = state.history.snapshot();
        let update = LiveUpdate::from_snapshot(&snapshot, &state.engine, &state.export);
        let json = serde_json::to_string(&update).unwrap_or_default();
        Ok(Event::default().event("update").data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn update_is_built_from_one_snapshot() {
        let samples: Vec<Sample> = (0..6)
            .map(|i| Sample {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap(),
                temperature: 20.0 + i as f64,
                humidity: 50.0,
                pressure: 1000.0,
            })
            .collect();
        let update = LiveUpdate::from_snapshot(
            &samples,
            &StatsEngine::default(),
            &ExportOptions::default(),
        );
        assert_eq!(update.stats.count, update.chart.count);
        assert_eq!(update.chart.temperatures.last(), Some(&update.stats.temperature.current));

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["stats"]["temperature"]["trend"], "up");
        assert_eq!(json["chart"]["times"].as_array().unwrap().len(), 6);
    }
}
