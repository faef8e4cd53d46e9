use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

use crate::history::History;
use crate::telemetry::Reading;

// ─── Starting point and drift ────────────────────────────────────

const START: Reading = Reading {
    temperature: 21.0,
    humidity: 45.0,
    pressure: 1013.25,
};

/// Max change per tick for temperature, humidity, pressure.
const STEP: [f64; 3] = [0.4, 1.5, 0.3];

// ─── Random walk ─────────────────────────────────────────────────

/// Bounded random walk that looks roughly like a room sensor.
pub struct SensorWalk {
    rng: StdRng,
    current: Reading,
}

impl SensorWalk {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            current: START,
        }
    }

    pub fn next_reading(&mut self) -> Reading {
        let c = self.current;
        let mut drift = |step: f64| self.rng.gen_range(-step..=step);

        self.current = Reading::new(
            (c.temperature + drift(STEP[0])).clamp(-20.0, 45.0),
            (c.humidity + drift(STEP[1])).clamp(0.0, 100.0),
            (c.pressure + drift(STEP[2])).clamp(950.0, 1060.0),
        );
        self.current
    }
}

// ─── Public entry point ──────────────────────────────────────────

/// Stands in for the remote device: records one reading per `every`
/// until the process exits.
pub async fn run(history: Arc<History>, every: Duration, seed: u64) {
    let mut walk = SensorWalk::new(seed);
    let mut ticker = tokio::time::interval(every);
    log::info!("simulated sensor feeding a reading every {every:?}");

    loop {
        ticker.tick().await;
        let reading = walk.next_reading();
        let history = history.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || history.record(reading)).await {
            log::error!("simulated sensor stopped: {e}");
            return;
        }
    }
}
