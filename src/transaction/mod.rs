//! Concurrency control
//!
//! Mutations on a table are serialized through a fair, reentrant lock.

pub mod lock;

pub use lock::{FairLock, LockGuard, LockManager, TableLockGuard};
