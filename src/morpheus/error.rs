//! Errors returned by the Morpheus API layer

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single call against the Morpheus API.
///
/// A response that made it back from the server keeps its status code so the
/// caller can tell a missing remote object (404) from every other failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API request failed: {status}")]
    Status { status: StatusCode, message: String },

    #[error("{collection} not found by name '{name}'")]
    NameNotFound { collection: String, name: String },

    #[error("failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse response JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid API url: {0}")]
    Url(#[from] url::ParseError),

    #[error("authentication failed: {0}")]
    Auth(String),
}

impl ApiError {
    /// HTTP status of the failed call, if the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NameNotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// True exactly when the server reported 404
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}
