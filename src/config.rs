//! Store configuration
//!
//! All settings have defaults that reproduce the classic layout: a `data`
//! directory next to a `commit.log` file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default root directory for databases
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default commit log location
pub const DEFAULT_COMMIT_LOG: &str = "commit.log";

/// How mutations are serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockGranularity {
    /// One lock per table file; unrelated tables commit in parallel
    PerTable,
    /// A single lock for the whole store
    Global,
}

/// Configuration for opening a [`Store`](crate::store::Store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory holding one subdirectory per database
    pub data_dir: PathBuf,
    /// Shared append-only commit log
    pub commit_log: PathBuf,
    /// Lock granularity for mutations
    pub lock_granularity: LockGranularity,
    /// Whether column names are matched case-sensitively
    pub case_sensitive_columns: bool,
    /// Fsync the candidate file and its directory on every commit
    pub sync_on_commit: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            commit_log: PathBuf::from(DEFAULT_COMMIT_LOG),
            lock_granularity: LockGranularity::PerTable,
            case_sensitive_columns: true,
            sync_on_commit: true,
        }
    }
}

impl StoreConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Config rooted at `dir`, with the commit log placed inside it
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new()
            .data_dir(dir.join(DEFAULT_DATA_DIR))
            .commit_log(dir.join(DEFAULT_COMMIT_LOG))
    }

    /// Set the data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the commit log path
    pub fn commit_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.commit_log = path.into();
        self
    }

    /// Set the lock granularity
    pub fn lock_granularity(mut self, granularity: LockGranularity) -> Self {
        self.lock_granularity = granularity;
        self
    }

    /// Set the column matching policy
    pub fn case_sensitive_columns(mut self, value: bool) -> Self {
        self.case_sensitive_columns = value;
        self
    }

    /// Set whether commits fsync
    pub fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Load a config from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}
