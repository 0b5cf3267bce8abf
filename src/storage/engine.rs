//! Storage engine interface
//!
//! The store talks to table files only through this trait, so the flat text
//! layout could be swapped for another format without touching the command
//! layer.

use std::fmt::Debug;
use std::path::Path;

use super::recovery::RecoveryReport;
use super::table::Table;
use crate::error::Result;

/// Persistence for whole tables
pub trait StorageEngine: Send + Sync + Debug {
    /// File extension used for table files, without the dot
    fn table_extension(&self) -> &str;

    /// Read the table stored at `path`
    fn load(&self, path: &Path, name: &str) -> Result<Table>;

    /// Create a new table file; fails if one already exists
    fn create(&self, path: &Path, table: &Table) -> Result<()>;

    /// Atomically replace the table stored at `path`
    fn commit(&self, path: &Path, table: &Table) -> Result<()>;

    /// Discard the leftovers of interrupted commits under `root`
    fn recover(&self, root: &Path) -> RecoveryReport;
}
