//! Error types for nbstyle operations.

use thiserror::Error;

/// Errors that can occur while reading or exporting a notebook.
///
/// Style extraction and injection never fail; only I/O, notebook parsing and
/// the PDF backend surface errors to the caller.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid notebook: {0}")]
    InvalidNotebook(String),

    #[error("PDF backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("PDF rendering failed: {0}")]
    Pdf(String),
}

pub type Result<T> = std::result::Result<T, Error>;
