//! Storage engine module
//!
//! This module contains the storage engine components:
//! - In-memory table image and its transformations
//! - Text format for table files
//! - Atomic commit protocol and commit log
//! - Crash recovery

pub mod commit;
pub mod disk;
pub mod engine;
pub mod format;
pub mod recovery;
pub mod table;
pub mod wal;

pub use disk::FlatFileEngine;
pub use engine::StorageEngine;
pub use recovery::RecoveryReport;
pub use table::{ColumnMatch, Row, Table};
pub use wal::{CommitLog, CommitRecord};
