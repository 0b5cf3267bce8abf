//! Catalog module
//!
//! This module maps databases and tables onto the filesystem and holds the
//! per-caller session.

pub mod catalog;
pub mod session;

pub use catalog::{validate_name, Catalog};
pub use session::Session;
