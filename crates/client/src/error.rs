//! Client error types

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors surfaced by the campus API client
#[derive(Debug, Error)]
pub enum ApiError {
    /// Session could not be renewed and has been cleared
    #[error("Session expired: {0}")]
    AuthExpired(String),

    /// Server rejected the credential and no recovery was attempted
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Transport failure, no response received
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Client-side error status other than 401
    #[error("Request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    /// Server-side or otherwise unexpected status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Serialization error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

/// Coarse classification of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    AuthExpired,
    Unauthorized,
    Network,
    Validation,
    Server,
    Decode,
    Configuration,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Create error from a failed HTTP status and its response body
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message(status, body);
        match status.as_u16() {
            401 => Self::Unauthorized(message),
            code @ 400..=499 => Self::Validation {
                status: code,
                message,
            },
            code => Self::Server {
                status: code,
                message,
            },
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::AuthExpired(_) => ApiErrorKind::AuthExpired,
            Self::Unauthorized(_) => ApiErrorKind::Unauthorized,
            Self::Network(_) => ApiErrorKind::Network,
            Self::Validation { .. } => ApiErrorKind::Validation,
            Self::Server { .. } => ApiErrorKind::Server,
            Self::Decode(_) => ApiErrorKind::Decode,
            Self::Configuration(_) => ApiErrorKind::Configuration,
        }
    }

    /// HTTP status reported by the server, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::Validation { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the caller should send the user back to login
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired(_))
    }
}

/// Message for a failed response: the JSON `message` field, the body text, or the reason
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(ErrorBody {
        message: Some(message),
    }) = serde_json::from_str::<ErrorBody>(body)
    {
        return message;
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| status.as_u16().to_string(), str::to_string)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "");
        assert_eq!(err.kind(), ApiErrorKind::Unauthorized);
        assert_eq!(err.http_status(), Some(401));

        let err = ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "bad field");
        assert_eq!(err.kind(), ApiErrorKind::Validation);
        assert_eq!(err.http_status(), Some(422));

        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "");
        assert_eq!(err.kind(), ApiErrorKind::Server);
        assert_eq!(err.http_status(), Some(502));
    }

    #[test]
    fn test_message_prefers_json_field() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Email already registered","status":400}"#,
        );
        match err {
            ApiError::Validation { message, .. } => {
                assert_eq!(message, "Email already registered");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_message_falls_back_to_text_then_reason() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom\n");
        assert_eq!(err.to_string(), "Server error 500: boom");

        let err = ApiError::from_status(StatusCode::NOT_FOUND, "  ");
        assert_eq!(err.to_string(), "Request rejected (404): Not Found");
    }
}
