//! Ranking API error types and their classification.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Stable error classes surfaced to callers of the lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    RateLimited,
    ServerError,
    NetworkError,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the ranking API client and the lookup pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The API answered 404 for the subject.
    #[error("player not found")]
    NotFound,

    /// Rate limited (429) after the retry budget was spent.
    #[error("rate limited: HTTP {status}")]
    RateLimited { status: u16 },

    /// 5xx after the retry budget was spent, or any other non-success status.
    #[error("server error: HTTP {status}")]
    Server { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Transport failure with no HTTP response.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response body was not a profile document.
    #[error("parse error: {0}")]
    Parse(String),

    /// Input rejected before any request was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The queued request was dropped before it produced a result.
    #[error("request interrupted before completion")]
    Interrupted,
}

impl ApiError {
    /// Classify this error into the stable taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NotFound => ErrorKind::NotFound,
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::Server { .. } => ErrorKind::ServerError,
            ApiError::Timeout | ApiError::Network(_) => ErrorKind::NetworkError,
            ApiError::Parse(_) | ApiError::InvalidInput(_) | ApiError::Interrupted => ErrorKind::Unknown,
        }
    }

    /// HTTP status that produced this error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::RateLimited { status } | ApiError::Server { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ApiError::Timeout } else { ApiError::Network(Arc::new(err)) }
    }
}

/// Errors from the request queue itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The job was dropped or panicked before resolving its caller.
    #[error("queued request was dropped before completing")]
    Interrupted,
}

impl From<QueueError> for ApiError {
    fn from(_: QueueError) -> Self {
        ApiError::Interrupted
    }
}
