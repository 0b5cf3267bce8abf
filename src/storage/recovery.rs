//! Crash recovery
//!
//! Candidate files only exist while a commit is in flight, so any candidate
//! found at startup belongs to a commit that never reached its rename. The
//! original table file is untouched and stays authoritative; the candidate is
//! deleted. Nothing is replayed from the commit log.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::commit::is_candidate;

/// Outcome of a recovery pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Candidate files that were deleted
    pub removed: Vec<PathBuf>,
    /// Paths that could not be scanned or deleted, with the reason
    pub failures: Vec<(PathBuf, String)>,
}

impl RecoveryReport {
    /// True if nothing was found and nothing failed
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.failures.is_empty()
    }
}

/// Delete leftover candidate files in every database directory under `root`.
///
/// Never fails: unreadable directories and undeletable files are logged and
/// recorded in the report.
pub fn recover_unfinished_commits(root: &Path) -> RecoveryReport {
    info!(root = %root.display(), "checking for unfinished transactions");
    let mut report = RecoveryReport::default();

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return report,
        Err(e) => {
            warn!(root = %root.display(), error = %e, "cannot scan data directory");
            report.failures.push((root.to_path_buf(), e.to_string()));
            return report;
        }
    };

    for entry in entries {
        match entry {
            Ok(entry) if entry.path().is_dir() => scan_database(&entry.path(), &mut report),
            Ok(_) => {}
            Err(e) => {
                warn!(root = %root.display(), error = %e, "cannot read directory entry");
                report.failures.push((root.to_path_buf(), e.to_string()));
            }
        }
    }

    if report.removed.is_empty() {
        info!("no unfinished transactions found");
    } else {
        info!(count = report.removed.len(), "rolled back unfinished transactions");
    }
    report
}

fn scan_database(dir: &Path, report: &mut RecoveryReport) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot scan database directory");
            report.failures.push((dir.to_path_buf(), e.to_string()));
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || !is_candidate(&path) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(file = %path.display(), "rolling back");
                report.removed.push(path);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "cannot remove candidate");
                report.failures.push((path, e.to_string()));
            }
        }
    }
}
