//! Error types for binding, decoding and serving

use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Hard failures of `ApiServer::bind`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("invalid service instance `{0}`: a service must be a named struct")]
    InvalidInstance(&'static str),
}

/// Failures while filling parameter slots from a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid query string: {0}")]
    Query(String),

    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error("unsupported content type `{0}`")]
    UnsupportedContentType(String),

    #[error("request body is empty")]
    EmptyBody,

    #[error("malformed request body: {0}")]
    Malformed(String),

    #[error("{expected} parameter received a {found} argument")]
    SlotMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl DecodeError {
    /// Short summary reported as the envelope message
    pub fn summary(&self) -> &'static str {
        match self {
            DecodeError::Query(_) => "invalid query parameters",
            DecodeError::SlotMismatch { .. } => "unknown server error",
            _ => "invalid request body",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DecodeError::SlotMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DecodeError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("url prefix `{0}` must be empty or start with '/' and not end with '/'")]
    InvalidPrefix(String),

    #[error("default version must not be empty")]
    EmptyVersion,
}

/// Server lifecycle errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("server task failed: {0}")]
    Task(String),

    #[error("graceful shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),
}
