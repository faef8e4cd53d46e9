use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::{Reading, Sample, TelemetryError};

// ─── Clock ───────────────────────────────────────────────────────

/// Source of ingestion timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe, capacity-bounded sample history with FIFO eviction.
/// Ingestion calls `append()`, every read path calls `snapshot()`.
pub struct SampleStore {
    capacity: usize,
    clock: Arc<dyn Clock>,
    samples: Mutex<VecDeque<Sample>>,
}

// ─── SampleStore impl ────────────────────────────────────────────

impl SampleStore {
    pub fn new(capacity: usize) -> Result<Self, TelemetryError> {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(
        capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TelemetryError> {
        if capacity == 0 {
            return Err(TelemetryError::CapacityMisconfigured(capacity));
        }
        Ok(Self {
            capacity,
            clock,
            samples: Mutex::new(VecDeque::with_capacity(capacity.min(4096) + 1)),
        })
    }

    /// Replace the contents with previously persisted samples.
    /// Only the newest `capacity` samples survive, in their original order.
    pub fn restore(&self, samples: Vec<Sample>) {
        let skip = samples.len().saturating_sub(self.capacity);
        let mut guard = self.samples.lock();
        guard.clear();
        guard.extend(samples.into_iter().skip(skip));
    }

    /// Stamp and commit a reading, evicting from the head if over capacity.
    pub fn append(&self, reading: Reading) -> Sample {
        let mut guard = self.samples.lock();

        // Never let a wall-clock step backwards break time order
        let now = self.clock.now();
        let timestamp = match guard.back() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        let sample = Sample {
            timestamp,
            temperature: reading.temperature,
            humidity: reading.humidity,
            pressure: reading.pressure,
        };

        guard.push_back(sample);
        while guard.len() > self.capacity {
            guard.pop_front();
        }
        sample
    }

    /// Independent copy of the retained samples, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.lock().iter().copied().collect()
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
