use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::telemetry::Sample;

/// Where the sample history lives between process restarts.
///
/// The store never touches this itself; `History` calls `save` after each
/// mutation and `load` once at startup.
pub trait Persistence: Send + Sync {
    fn load(&self) -> Result<Vec<Sample>, PersistError>;
    fn save(&self, samples: &[Sample]) -> Result<(), PersistError>;

    /// Short label for startup logs.
    fn describe(&self) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt history file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ─── Process memory ──────────────────────────────────────────────

/// Keeps nothing outside the store: history dies with the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryPersistence;

impl Persistence for MemoryPersistence {
    fn load(&self) -> Result<Vec<Sample>, PersistError> {
        Ok(Vec::new())
    }

    fn save(&self, _samples: &[Sample]) -> Result<(), PersistError> {
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}

// ─── JSON file ───────────────────────────────────────────────────

/// Whole history as one JSON array, rewritten on every save.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_err(&self, source: io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Persistence for JsonFilePersistence {
    fn load(&self) -> Result<Vec<Sample>, PersistError> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|source| PersistError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, samples: &[Sample]) -> Result<(), PersistError> {
        let json = serde_json::to_vec(samples).map_err(|source| PersistError::Json {
            path: self.path.clone(),
            source,
        })?;

        // Write beside the target, then rename over it
        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(|e| self.io_err(e))?;
        file.write_all(&json).map_err(|e| self.io_err(e))?;
        file.sync_all().map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
    }

    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }
}
