//! Commit log
//!
//! An append-only audit trail with one `COMMIT <path> <epoch-millis>` line per
//! commit. It is written before the rename that publishes a commit, so an
//! entry does not prove the rename happened. Recovery never reads it.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::error::Result;

const COMMIT_TAG: &str = "COMMIT";

/// A single commit log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Table file the commit targeted
    pub path: PathBuf,
    /// Milliseconds since the Unix epoch
    pub timestamp_millis: u128,
}

impl CommitRecord {
    /// Create a record stamped with the current time
    pub fn now(path: impl Into<PathBuf>) -> Self {
        let timestamp_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Self {
            path: path.into(),
            timestamp_millis,
        }
    }

    /// Render as a log line, without the trailing newline
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {}",
            COMMIT_TAG,
            self.path.display(),
            self.timestamp_millis
        )
    }

    /// Parse a log line. The path may contain spaces; the timestamp is the
    /// last token.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix(COMMIT_TAG)?.strip_prefix(' ')?;
        let (path, millis) = rest.rsplit_once(' ')?;
        Some(Self {
            path: PathBuf::from(path),
            timestamp_millis: millis.parse().ok()?,
        })
    }
}

/// Appends commit records to the shared log file
#[derive(Debug)]
pub struct CommitLog {
    /// Log file location
    path: PathBuf,
    /// Open append handle
    file: Mutex<File>,
}

impl CommitLog {
    /// Open (or create) the log for appending
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Append one record and flush it
    pub fn append(&self, record: &CommitRecord) -> Result<()> {
        let mut file = self.file.lock();
        writeln!(file, "{}", record.to_line())?;
        file.flush()?;
        Ok(())
    }

    /// Read every well-formed record back, oldest first
    pub fn records(&self) -> Result<Vec<CommitRecord>> {
        let file = File::open(&self.path)?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Some(record) = CommitRecord::parse(&line) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_line_format() {
        let record = CommitRecord {
            path: PathBuf::from("data/shop/items.txt"),
            timestamp_millis: 1700000000123,
        };
        assert_eq!(record.to_line(), "COMMIT data/shop/items.txt 1700000000123");
        assert_eq!(CommitRecord::parse(&record.to_line()), Some(record));
    }

    #[test]
    fn test_parse_path_with_spaces() {
        let record = CommitRecord::parse("COMMIT my data/t.txt 42").unwrap();
        assert_eq!(record.path, PathBuf::from("my data/t.txt"));
        assert_eq!(record.timestamp_millis, 42);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(CommitRecord::parse("BEGIN x 1"), None);
        assert_eq!(CommitRecord::parse("COMMIT x notanumber"), None);
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = CommitLog::open(dir.path().join("logs").join("commit.log")).unwrap();

        log.append(&CommitRecord::now("a.txt")).unwrap();
        log.append(&CommitRecord::now("b.txt")).unwrap();

        let records = log.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path, PathBuf::from("a.txt"));
        assert_eq!(records[1].path, PathBuf::from("b.txt"));
        assert!(records[0].timestamp_millis <= records[1].timestamp_millis);
    }

    #[test]
    fn test_read_back_missing_log_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commit.log");
        let log = CommitLog::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let err = log.records().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}
