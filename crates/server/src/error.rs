//! Boundary error envelope.
//!
//! Lookup failures never cross the tool boundary as protocol errors; they
//! are turned into a stable `{ kind, message }` pair instead.

use serde::{Deserialize, Serialize};
use tierscope_client::{ApiError, ErrorKind};

/// User-facing error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorBody {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, message: user_message(kind).to_string() }
    }
}

impl From<&ApiError> for ErrorBody {
    fn from(err: &ApiError) -> Self {
        Self::new(err.kind())
    }
}

/// Stable message shown for each error class.
pub fn user_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "Player not found.",
        ErrorKind::RateLimited => "The ranking service is busy. Try again in a moment.",
        ErrorKind::ServerError => "The ranking service returned an error. Try again later.",
        ErrorKind::NetworkError => "Could not reach the ranking service. Check your connection.",
        ErrorKind::Unknown => "Something went wrong while looking up that player.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_message() {
        for kind in [
            ErrorKind::NotFound,
            ErrorKind::RateLimited,
            ErrorKind::ServerError,
            ErrorKind::NetworkError,
            ErrorKind::Unknown,
        ] {
            assert!(!user_message(kind).is_empty());
        }
    }

    #[test]
    fn test_from_api_error() {
        let body = ErrorBody::from(&ApiError::RateLimited { status: 429 });
        assert_eq!(body.kind, ErrorKind::RateLimited);
        assert_eq!(body.message, user_message(ErrorKind::RateLimited));

        let body = ErrorBody::from(&ApiError::Interrupted);
        assert_eq!(body.kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(ErrorBody::new(ErrorKind::NotFound)).unwrap();
        assert_eq!(value["kind"], "NOT_FOUND");
        assert_eq!(value["message"], "Player not found.");
    }
}
