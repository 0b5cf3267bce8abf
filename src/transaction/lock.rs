//! Lock Manager
//!
//! Serializes mutations. Every insert, update and delete holds the lock for
//! its table across read, transform and commit. Locks are granted strictly in
//! arrival order and are reentrant for the owning thread.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::config::LockGranularity;

#[derive(Debug, Default)]
struct LockState {
    /// Next ticket handed to an arriving thread
    next_ticket: u64,
    /// Ticket currently allowed to hold the lock
    now_serving: u64,
    owner: Option<ThreadId>,
    /// Reentrant acquisitions by the owner
    depth: usize,
}

/// A fair (FIFO) reentrant mutual-exclusion lock
#[derive(Debug, Default)]
pub struct FairLock {
    state: Mutex<LockState>,
    released: Condvar,
}

impl FairLock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Block until the lock is held by the current thread
    pub fn acquire(self: &Arc<Self>) -> LockGuard {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.owner == Some(me) {
            state.depth += 1;
            return LockGuard::new(self.clone());
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        while state.now_serving != ticket {
            self.released.wait(&mut state);
        }
        state.owner = Some(me);
        state.depth = 1;
        LockGuard::new(self.clone())
    }

    /// Whether any thread holds the lock
    pub fn is_locked(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    fn release(&self) {
        let mut state = self.state.lock();
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            state.now_serving += 1;
            drop(state);
            self.released.notify_all();
        }
    }
}

/// Scoped ownership of a [`FairLock`]; released on drop
#[derive(Debug)]
pub struct LockGuard {
    lock: Arc<FairLock>,
    // Ownership is tied to the acquiring thread.
    _not_send: PhantomData<*const ()>,
}

impl LockGuard {
    fn new(lock: Arc<FairLock>) -> Self {
        Self {
            lock,
            _not_send: PhantomData,
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}

/// Hands out table locks according to the configured granularity
#[derive(Debug)]
pub struct LockManager {
    granularity: LockGranularity,
    /// Lock per table path; a single entry in global mode. Entries nobody
    /// holds or waits on are pruned on release.
    locks: Mutex<HashMap<PathBuf, Arc<FairLock>>>,
}

impl LockManager {
    pub fn new(granularity: LockGranularity) -> Self {
        Self {
            granularity,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn key(&self, path: &Path) -> PathBuf {
        match self.granularity {
            LockGranularity::PerTable => path.to_path_buf(),
            LockGranularity::Global => PathBuf::new(),
        }
    }

    /// The lock guarding mutations of the table at `path`
    fn lock_for(&self, key: &Path) -> Arc<FairLock> {
        self.locks
            .lock()
            .entry(key.to_path_buf())
            .or_insert_with(FairLock::new)
            .clone()
    }

    /// Block until the current thread may mutate the table at `path`
    pub fn acquire(&self, path: &Path) -> TableLockGuard<'_> {
        trace!(table = %path.display(), "acquiring table lock");
        let key = self.key(path);
        let guard = self.lock_for(&key).acquire();
        TableLockGuard {
            manager: self,
            key,
            guard: Some(guard),
        }
    }

    /// Forget the lock for `key` if only the map still refers to it
    fn prune(&self, key: &Path) {
        let mut locks = self.locks.lock();
        if locks.get(key).map_or(false, |l| Arc::strong_count(l) == 1) {
            locks.remove(key);
            trace!(table = %key.display(), "table lock released and pruned");
        }
    }
}

/// A held table lock; releases and prunes on drop
#[derive(Debug)]
pub struct TableLockGuard<'a> {
    manager: &'a LockManager,
    key: PathBuf,
    guard: Option<LockGuard>,
}

impl Drop for TableLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.manager.prune(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_reentrant() {
        let lock = FairLock::new();
        let outer = lock.acquire();
        let inner = lock.acquire();
        assert!(lock.is_locked());
        drop(inner);
        assert!(lock.is_locked());
        drop(outer);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_held_lock_seen_from_other_thread() {
        let lock = FairLock::new();
        let _guard = lock.acquire();

        let other = lock.clone();
        let locked = thread::spawn(move || other.is_locked()).join().unwrap();
        assert!(locked);
    }

    #[test]
    fn test_mutual_exclusion() {
        let lock = FairLock::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = lock.clone();
                let inside = inside.clone();
                let max_inside = max_inside.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        let _guard = lock.acquire();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_per_table_locks_are_independent() {
        let manager = Arc::new(LockManager::new(LockGranularity::PerTable));
        let _a = manager.acquire(Path::new("db/a.txt"));

        let (tx, rx) = mpsc::channel();
        let m = manager.clone();
        thread::spawn(move || {
            let _b = m.acquire(Path::new("db/b.txt"));
            tx.send(()).unwrap();
        });
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_global_lock_covers_all_tables() {
        let manager = LockManager::new(LockGranularity::Global);
        let _a = manager.acquire(Path::new("db/a.txt"));

        let lock_b = manager.lock_for(&manager.key(Path::new("other/b.txt")));
        assert!(lock_b.is_locked());
    }

    #[test]
    fn test_released_locks_are_pruned() {
        let manager = LockManager::new(LockGranularity::PerTable);
        {
            let _outer = manager.acquire(Path::new("db/a.txt"));
            let _inner = manager.acquire(Path::new("db/a.txt"));
            let _b = manager.acquire(Path::new("db/b.txt"));
            assert_eq!(manager.locks.lock().len(), 2);
        }
        assert!(manager.locks.lock().is_empty());
    }

    #[test]
    fn test_lock_kept_while_waited_on() {
        let manager = LockManager::new(LockGranularity::PerTable);
        let path = Path::new("db/a.txt");
        let waiting = manager.lock_for(&manager.key(path));

        drop(manager.acquire(path));
        assert_eq!(manager.locks.lock().len(), 1);

        drop(waiting);
        drop(manager.acquire(path));
        assert!(manager.locks.lock().is_empty());
    }
}
