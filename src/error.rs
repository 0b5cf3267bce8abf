//! Error types for FlatDB
//!
//! This module defines all error types used throughout the store, and the
//! coarse taxonomy the command boundary uses to render them.

use thiserror::Error;

/// The main error type for FlatDB
#[derive(Error, Debug)]
pub enum Error {
    // ========== Command Errors ==========
    #[error("Empty command.")]
    EmptyCommand,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Carries the full user-facing text, e.g. "Invalid INSERT syntax."
    #[error("{0}")]
    Syntax(String),

    #[error("Unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("Invalid name '{0}': only letters, digits and '_' are allowed")]
    InvalidName(String),

    // ========== Catalog Errors ==========
    #[error("No database selected.")]
    NoDatabaseSelected,

    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    #[error("Database already exists: {0}")]
    DatabaseAlreadyExists(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("Column not found: {0} in table '{1}'")]
    ColumnNotFound(String, String),

    // ========== Storage Errors ==========
    #[error("Value count mismatch with columns: table '{table}' has {expected} columns, got {found} values")]
    ShapeMismatch {
        table: String,
        expected: usize,
        found: usize,
    },

    #[error("Corrupted table '{0}': missing header")]
    CorruptedTable(String),

    // ========== I/O Errors ==========
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ========== Internal Errors ==========
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    NotFound,
    AlreadyExists,
    ShapeMismatch,
    NoDatabaseSelected,
    Io,
    Internal,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyCommand
            | Error::UnknownCommand(_)
            | Error::Syntax(_)
            | Error::UnterminatedString(_)
            | Error::InvalidName(_) => ErrorKind::Syntax,
            Error::DatabaseNotFound(_) | Error::TableNotFound(_) | Error::ColumnNotFound(..) => {
                ErrorKind::NotFound
            }
            Error::DatabaseAlreadyExists(_) | Error::TableAlreadyExists(_) => {
                ErrorKind::AlreadyExists
            }
            Error::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            Error::NoDatabaseSelected => ErrorKind::NoDatabaseSelected,
            Error::IoError(_) | Error::CorruptedTable(_) => ErrorKind::Io,
            Error::Config(_) | Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias for FlatDB operations
pub type Result<T> = std::result::Result<T, Error>;
