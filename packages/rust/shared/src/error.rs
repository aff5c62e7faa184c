//! Error types for cairn.
//!
//! Library crates use [`CairnError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Malformed *data* is not an error anywhere in the pipeline: normalization
//! degrades to well-defined absent sentinels. Errors here cover
//! configuration, dispatch, I/O, and the network boundary only.

use std::path::PathBuf;

/// Top-level error type for all cairn operations.
#[derive(Debug, thiserror::Error)]
pub enum CairnError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A content-type tag outside the closed set. The record cannot be
    /// dispatched to a field set, so this is fatal to the caller.
    #[error("unknown content type tag: {tag}")]
    Dispatch { tag: String },

    /// Network/HTTP error while talking to the content API.
    #[error("network error: {0}")]
    Network(String),

    /// Export/serialization error while writing output files.
    #[error("export error: {0}")]
    Export(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed input file, bad bbox, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CairnError>;

impl CairnError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a dispatch error for an unrecognized content-type tag.
    pub fn dispatch(tag: impl Into<String>) -> Self {
        Self::Dispatch { tag: tag.into() }
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
}
