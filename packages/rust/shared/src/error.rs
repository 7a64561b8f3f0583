//! Error types for pdfharvest.
//!
//! Library crates use [`PdfHarvestError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all pdfharvest operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfHarvestError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Building an HTTP client or request failed.
    #[error("request error: {0}")]
    Request(String),

    /// Transport-level failure (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with something other than 200 OK.
    #[error("{url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The response is not a PDF.
    #[error("{url}: invalid content type {content_type:?} (expected application/pdf)")]
    ContentType { url: String, content_type: String },

    /// The response body was empty.
    #[error("{url}: downloaded 0 bytes")]
    EmptyBody { url: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON or HTML parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The destination file is already on disk.
    #[error("file already exists: {path:?}")]
    AlreadyExists { path: PathBuf },

    /// Data validation error (bad URL, empty filename, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PdfHarvestError>;

impl PdfHarvestError {
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

    /// True when the failure means the document was already downloaded.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}
