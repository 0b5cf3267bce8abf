//! Flat-file storage engine for FlatDB
//!
//! Each table is one text file; mutations go through the atomic commit
//! protocol.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use super::commit;
use super::engine::StorageEngine;
use super::format::{decode_table, encode_table};
use super::recovery::{recover_unfinished_commits, RecoveryReport};
use super::table::Table;
use super::wal::CommitLog;
use crate::error::{Error, Result};

/// Extension of table files
pub const TABLE_EXTENSION: &str = "txt";

/// Flat-file engine
#[derive(Debug)]
pub struct FlatFileEngine {
    /// Shared commit log
    log: CommitLog,
    /// Fsync on every commit
    sync: bool,
}

impl FlatFileEngine {
    pub fn new(log: CommitLog, sync: bool) -> Self {
        Self { log, sync }
    }

    /// The commit log this engine appends to
    pub fn commit_log(&self) -> &CommitLog {
        &self.log
    }
}

impl StorageEngine for FlatFileEngine {
    fn table_extension(&self) -> &str {
        TABLE_EXTENSION
    }

    fn load(&self, path: &Path, name: &str) -> Result<Table> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::TableNotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        decode_table(name, &text)
    }

    fn create(&self, path: &Path, table: &Table) -> Result<()> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::TableAlreadyExists(table.name().to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(encode_table(table).as_bytes())?;
        if self.sync {
            file.sync_all()?;
        }
        Ok(())
    }

    fn commit(&self, path: &Path, table: &Table) -> Result<()> {
        commit::commit(path, &encode_table(table), &self.log, self.sync)
    }

    fn recover(&self, root: &Path) -> RecoveryReport {
        recover_unfinished_commits(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(dir: &Path) -> FlatFileEngine {
        FlatFileEngine::new(CommitLog::open(dir.join("commit.log")).unwrap(), false)
    }

    #[test]
    fn test_create_load_commit() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        let path = dir.path().join("t.txt");

        let table = Table::new("t", vec!["a".into(), "b".into()]);
        engine.create(&path, &table).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n");

        let mut loaded = engine.load(&path, "t").unwrap();
        loaded.insert(vec!["1".into(), "2".into()]).unwrap();
        engine.commit(&path, &loaded).unwrap();

        assert_eq!(engine.load(&path, "t").unwrap().row_count(), 1);
        assert_eq!(engine.commit_log().records().unwrap().len(), 1);
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        let path = dir.path().join("t.txt");
        let table = Table::new("t", vec!["a".into()]);

        engine.create(&path, &table).unwrap();
        let result = engine.create(&path, &table);
        assert!(matches!(result, Err(Error::TableAlreadyExists(_))));
    }

    #[test]
    fn test_load_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        let result = engine.load(&dir.path().join("nope.txt"), "nope");
        assert!(matches!(result, Err(Error::TableNotFound(name)) if name == "nope"));
    }
}
