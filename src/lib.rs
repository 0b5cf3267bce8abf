//! FlatDB - a flat-file record store written in Rust
//!
//! This library provides the components of a small multi-database store:
//! - Command parsing (lexer, parser, AST)
//! - Flat-file storage with atomic, logged commits and crash recovery
//! - Per-table fair locking for concurrent writers
//! - Catalog of databases and tables, and per-caller sessions
//! - Command execution and a TCP server

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod server;
pub mod sql;
pub mod storage;
pub mod store;
pub mod transaction;

pub use config::StoreConfig;
pub use error::{Error, ErrorKind, Result};
pub use executor::ExecutionEngine;
pub use store::Store;
