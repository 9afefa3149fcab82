//! Error types for the Zeno hub.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZenoError {
    /// Malformed or incomplete request payload.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Write rejected because the record already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A required credential was absent from the environment; the request
    /// fails, the process does not.
    #[error("{0} is not configured")]
    MissingCredential(&'static str),

    /// An external dependency answered with an error; the upstream body is
    /// preserved for diagnostics.
    #[error("{service} error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
