use parking_lot::Mutex;

use crate::persistence::{PersistError, Persistence};
use crate::telemetry::{Reading, Sample, SampleStore};

/// The application's one sample history: the in-memory store plus the
/// backend it is mirrored to. Built once in `main` and shared via `AppState`.
pub struct History {
    store: SampleStore,
    backend: Box<dyn Persistence>,
    /// Serializes mutate-then-save so an older snapshot never overwrites a newer one
    write_gate: Mutex<()>,
}

impl History {
    /// Wrap `store` and seed it from whatever `backend` already holds.
    pub fn open(
        store: SampleStore,
        backend: Box<dyn Persistence>,
    ) -> Result<Self, PersistError> {
        let persisted = backend.load()?;
        let loaded = persisted.len();
        store.restore(persisted);
        if !store.is_empty() {
            log::info!(
                "restored {} of {loaded} samples from {}",
                store.len(),
                backend.describe()
            );
        }

        Ok(Self {
            store,
            backend,
            write_gate: Mutex::new(()),
        })
    }

    pub fn record(&self, reading: Reading) -> Sample {
        let _gate = self.write_gate.lock();
        let sample = self.store.append(reading);
        self.persist();
        sample
    }

    pub fn clear(&self) {
        let _gate = self.write_gate.lock();
        self.store.clear();
        self.persist();
    }

    pub fn snapshot(&self) -> Vec<Sample> {
        self.store.snapshot()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Durability is best effort: a failed save leaves memory authoritative.
    fn persist(&self) {
        if let Err(e) = self.backend.save(&self.store.snapshot()) {
            log::warn!("failed to persist history: {e}");
        }
    }
}
