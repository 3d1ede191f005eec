//! Azure DevOps client error types.

/// Errors from Azure DevOps Git API calls.
#[derive(Debug, thiserror::Error)]
pub enum GitApiError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The service returned a non-2xx status.
    #[error("Azure DevOps {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The service rejected the request with 409: a ref moved under a push,
    /// or a repository with the requested name already exists.
    #[error("Azure DevOps {endpoint} rejected the request with a conflict: {body}")]
    Conflict { endpoint: String, body: String },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl GitApiError {
    /// Whether the service answered 409 Conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// HTTP status carried by the error, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::Conflict { .. } => Some(409),
            _ => None,
        }
    }
}
