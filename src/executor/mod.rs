//! Command execution module
//!
//! This module contains the per-session executor.

pub mod executor;

pub use executor::{failure_label, render_error, ExecutionEngine, QueryResult};
