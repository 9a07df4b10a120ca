//! Errors surfaced to the host by resource operations

use crate::morpheus::error::ApiError;
use std::fmt;
use thiserror::Error;

/// Lifecycle step an error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

#[derive(Debug, Error)]
pub enum ResourceError {
    /// The remote record is gone (HTTP 404)
    #[error("{kind} '{identity}' not found")]
    NotFound {
        kind: &'static str,
        identity: String,
        #[source]
        source: ApiError,
    },

    /// Any other failure reported by the API or the transport
    #[error("{operation} {kind} failed: {source}")]
    Api {
        kind: &'static str,
        operation: Operation,
        #[source]
        source: ApiError,
    },

    #[error("{kind} cannot be read without name or id")]
    MissingIdentity { kind: &'static str },

    /// The API reported success without the record in the body
    #[error("{operation} operation: {kind} not found in response data")]
    InvariantViolation {
        kind: &'static str,
        operation: Operation,
    },

    #[error("{kind} in response could not be decoded: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {kind} id '{id}'")]
    InvalidId { kind: &'static str, id: String },

    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("unknown resource type '{0}'")]
    UnknownResource(String),
}

impl ResourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Classify an API failure: 404 becomes [`NotFound`](Self::NotFound)
    pub fn from_api(kind: &'static str, operation: Operation, identity: &str, source: ApiError) -> Self {
        if source.is_not_found() {
            Self::NotFound {
                kind,
                identity: identity.to_string(),
                source,
            }
        } else {
            Self::Api {
                kind,
                operation,
                source,
            }
        }
    }

    /// The underlying API error, if there is one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::NotFound { source, .. } | Self::Api { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_api_splits_on_404() {
        let gone = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            message: "Not Found".into(),
        };
        let err = ResourceError::from_api("task", Operation::Read, "42", gone);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "task '42' not found");

        let broken = ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "boom".into(),
        };
        let err = ResourceError::from_api("task", Operation::Update, "42", broken);
        assert!(!err.is_not_found());
        assert!(err.to_string().starts_with("update task failed"));
    }

    #[test]
    fn test_invalid_config_lists_every_problem() {
        let err = ResourceError::InvalidConfig(vec![
            "name: is required".into(),
            "visibility: expected one of [private, public]".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid configuration: name: is required; visibility: expected one of [private, public]"
        );
    }
}
