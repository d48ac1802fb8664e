//! Last-sample store for delta tracking
//!
//! When enabled, each run records its numeric sample so the next run can
//! report the change since then. The store is optional and never affects
//! the check status.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// State store errors
#[derive(Error, Debug)]
pub enum StateError {
    /// Reading or writing a state file failed
    #[error("State store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A state file holds something other than a sample
    #[error("Corrupt state entry: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A recorded sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredSample {
    pub value: f64,
    /// Unix time in seconds
    pub timestamp: u64,
}

/// Change between two samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delta {
    pub change: f64,
    pub elapsed_secs: u64,
}

impl Delta {
    /// Delta from `previous` to `current`
    pub fn between(previous: &StoredSample, current: &StoredSample) -> Self {
        Self {
            change: current.value - previous.value,
            elapsed_secs: current.timestamp.saturating_sub(previous.timestamp),
        }
    }
}

/// Storage for the last sample of each check
pub trait StateStore {
    /// Sample recorded under `key` by a previous run
    fn last_sample(&self, key: &str) -> Result<Option<StoredSample>, StateError>;

    /// Replace the sample recorded under `key`
    fn record(&mut self, key: &str, sample: StoredSample) -> Result<(), StateError>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    /// Store rooted at `dir`; the directory is created on first write
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// File backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl StateStore for FileStateStore {
    fn last_sample(&self, key: &str) -> Result<Option<StoredSample>, StateError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn record(&mut self, key: &str, sample: StoredSample) -> Result<(), StateError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(&sample)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    samples: HashMap<String, StoredSample>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn last_sample(&self, key: &str) -> Result<Option<StoredSample>, StateError> {
        Ok(self.samples.get(key).copied())
    }

    fn record(&mut self, key: &str, sample: StoredSample) -> Result<(), StateError> {
        self.samples.insert(key.to_string(), sample);
        Ok(())
    }
}
