//! Atomic commit protocol
//!
//! A commit replaces a table file in three steps:
//! 1. write the full new contents to a candidate file next to the target
//! 2. append a `COMMIT` record to the shared commit log
//! 3. rename the candidate onto the target
//!
//! The rename is the only step that changes what readers see, so a crash at
//! any point leaves either the old file or the new one in place. A candidate
//! left behind by a crash is removed by [`recovery`](super::recovery).

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::wal::{CommitLog, CommitRecord};
use crate::error::Result;

/// Suffix appended to a table file name to form its candidate file
pub const CANDIDATE_SUFFIX: &str = ".tmp";

/// Candidate file path for a target: `items.txt` -> `items.txt.tmp`
pub fn candidate_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(CANDIDATE_SUFFIX);
    PathBuf::from(name)
}

/// Whether a path follows the candidate naming convention
pub fn is_candidate(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.ends_with(CANDIDATE_SUFFIX))
}

/// Write `contents` to the candidate file for `target` (step 1)
pub fn write_candidate(target: &Path, contents: &str, sync: bool) -> Result<PathBuf> {
    let candidate = candidate_path(target);
    let mut file = File::create(&candidate)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    if sync {
        file.sync_all()?;
    }
    Ok(candidate)
}

/// Durably replace `target` with `contents`
pub fn commit(target: &Path, contents: &str, log: &CommitLog, sync: bool) -> Result<()> {
    debug!(target = %target.display(), bytes = contents.len(), "writing candidate");
    let candidate = match write_candidate(target, contents, sync) {
        Ok(candidate) => candidate,
        Err(e) => {
            discard(&candidate_path(target));
            return Err(e);
        }
    };

    if let Err(e) = log.append(&CommitRecord::now(target)) {
        discard(&candidate);
        return Err(e);
    }

    debug!(target = %target.display(), "renaming candidate");
    if let Err(e) = fs::rename(&candidate, target) {
        discard(&candidate);
        return Err(e.into());
    }

    if sync {
        // The new contents are already visible; only durability of the
        // directory entry is in question here.
        if let Err(e) = sync_parent_dir(target) {
            warn!(target = %target.display(), error = %e, "directory sync failed after commit");
        }
    }
    Ok(())
}

/// Remove a candidate after a failed commit
fn discard(candidate: &Path) {
    match fs::remove_file(candidate) {
        Ok(()) => debug!(candidate = %candidate.display(), "discarded candidate"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(candidate = %candidate.display(), error = %e, "could not discard candidate"),
    }
}

#[cfg(unix)]
fn sync_parent_dir(target: &Path) -> std::io::Result<()> {
    match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => File::open(dir)?.sync_all(),
        _ => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_target: &Path) -> std::io::Result<()> {
    Ok(())
}
