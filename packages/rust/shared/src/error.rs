//! Error types for controlkb.
//!
//! Library crates use [`ControlKbError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all controlkb operations.
#[derive(Debug, thiserror::Error)]
pub enum ControlKbError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Source or data parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A control file declares no title.
    #[error("no title declaration found in control {file_name}")]
    MissingTitle { file_name: String },

    /// A control title has no entry in the title→category table.
    #[error("control '{title}' ({file_name}) is missing from the category table")]
    UnmappedTitle { title: String, file_name: String },

    /// Two control files declare the same title.
    #[error("duplicate control title '{title}' in {file_name} (already declared by {first_file})")]
    DuplicateTitle {
        title: String,
        file_name: String,
        first_file: String,
    },

    /// JSON serialization failed while persisting a collection.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A background analysis task panicked or was cancelled.
    #[error("worker error: {0}")]
    Worker(String),

    /// Lookup of a control or request result found nothing.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ControlKbError>;

impl ControlKbError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a lookup miss for the given kind of record.
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Lookup misses are reported to callers, never treated as build failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
