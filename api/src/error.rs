//! Error taxonomy for the HTTP transport.
//!
//! The server answers every failure with a uniform body
//! `{error_code, message}` plus an HTTP status. [`ApiError::classify`] folds
//! status and body into the caller-facing taxonomy: rate limiting and
//! session expiry get their own variants because callers react to them
//! structurally (distinct warning UI, silent poll stop), everything else is
//! surfaced verbatim.

use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error codes the server emits.
///
/// New codes decode into `Other` rather than failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    UserExists,
    ContentTooLong,
    InternalServer,
    Other(String),
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::Validation => "VALIDATION_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::UserExists => "USER_EXISTS",
            ErrorCode::ContentTooLong => "CONTENT_TOO_LONG",
            ErrorCode::InternalServer => "INTERNAL_SERVER_ERROR",
            ErrorCode::Other(raw) => raw,
        }
    }
}

impl From<String> for ErrorCode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "VALIDATION_ERROR" => ErrorCode::Validation,
            "UNAUTHORIZED" => ErrorCode::Unauthorized,
            "FORBIDDEN" => ErrorCode::Forbidden,
            "NOT_FOUND" => ErrorCode::NotFound,
            "CONFLICT" => ErrorCode::Conflict,
            "USER_EXISTS" => ErrorCode::UserExists,
            "CONTENT_TOO_LONG" => ErrorCode::ContentTooLong,
            "INTERNAL_SERVER_ERROR" => ErrorCode::InternalServer,
            _ => ErrorCode::Other(raw),
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_owned()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform error body shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub error_code: ErrorCode,
    pub message: String,
}

/// One failed transport call, classified for the caller.
///
/// `Display` yields the user-facing message for every variant, so callers
/// surfacing errors to a human can use `to_string()` directly.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Daily submission quota exhausted (HTTP 429, or a `FORBIDDEN` body).
    #[error("{message}")]
    RateLimited { code: ErrorCode, message: String },

    /// Session missing or expired (HTTP 401).
    #[error("{message}")]
    Unauthorized { message: String },

    /// The resource does not exist. For analysis fetches this is the
    /// expected "not submitted yet" answer, not a failure.
    #[error("{message}")]
    NotFound { message: String },

    /// Any other structured server rejection, surfaced verbatim.
    #[error("{message}")]
    Api {
        status: u16,
        code: ErrorCode,
        message: String,
    },

    /// The connection failed, timed out, or broke mid-response.
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// A 2xx answer whose body did not decode as the expected shape.
    #[error("invalid response from server: {0}")]
    InvalidBody(String),
}

impl ApiError {
    /// Fold an HTTP status and the decoded error body (when one was
    /// readable) into the taxonomy.
    #[must_use]
    pub fn classify(status: StatusCode, body: Option<ErrorBody>) -> Self {
        let (code, message) = match body {
            Some(body) => (Some(body.error_code), body.message),
            None => (None, format!("server returned HTTP {}", status.as_u16())),
        };

        if status == StatusCode::TOO_MANY_REQUESTS || code == Some(ErrorCode::Forbidden) {
            return ApiError::RateLimited {
                code: code.unwrap_or(ErrorCode::Forbidden),
                message,
            };
        }
        if status == StatusCode::UNAUTHORIZED || code == Some(ErrorCode::Unauthorized) {
            return ApiError::Unauthorized { message };
        }
        if status == StatusCode::NOT_FOUND || code == Some(ErrorCode::NotFound) {
            return ApiError::NotFound { message };
        }

        ApiError::Api {
            status: status.as_u16(),
            code: code.unwrap_or_else(|| ErrorCode::Other(String::new())),
            message,
        }
    }

    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Wire error code attached to this failure, if the server sent one.
    #[must_use]
    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            ApiError::RateLimited { code, .. } | ApiError::Api { code, .. } => Some(code),
            ApiError::Unauthorized { .. } => Some(&ErrorCode::Unauthorized),
            ApiError::NotFound { .. } => Some(&ErrorCode::NotFound),
            ApiError::Http(_) | ApiError::InvalidBody(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, ErrorBody, ErrorCode};
    use reqwest::StatusCode;

    fn body(code: &str, message: &str) -> ErrorBody {
        ErrorBody {
            error_code: ErrorCode::from(code.to_owned()),
            message: message.to_owned(),
        }
    }

    #[test]
    fn test_429_classifies_rate_limited() {
        let err = ApiError::classify(
            StatusCode::TOO_MANY_REQUESTS,
            Some(body("FORBIDDEN", "Daily submission limit reached (5/5)")),
        );
        assert!(err.is_rate_limited());
        assert_eq!(err.to_string(), "Daily submission limit reached (5/5)");
        assert_eq!(err.code(), Some(&ErrorCode::Forbidden));
    }

    #[test]
    fn test_forbidden_body_classifies_rate_limited_regardless_of_status() {
        let err = ApiError::classify(StatusCode::FORBIDDEN, Some(body("FORBIDDEN", "limit")));
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_429_without_body_still_rate_limited() {
        let err = ApiError::classify(StatusCode::TOO_MANY_REQUESTS, None);
        assert!(err.is_rate_limited());
        assert_eq!(err.code(), Some(&ErrorCode::Forbidden));
    }

    #[test]
    fn test_401_classifies_unauthorized() {
        let err = ApiError::classify(
            StatusCode::UNAUTHORIZED,
            Some(body("UNAUTHORIZED", "User not authenticated")),
        );
        assert!(err.is_unauthorized());
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_404_classifies_not_found() {
        let err = ApiError::classify(StatusCode::NOT_FOUND, Some(body("NOT_FOUND", "no analysis")));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_validation_error_stays_generic_api_error() {
        let err = ApiError::classify(
            StatusCode::BAD_REQUEST,
            Some(body("VALIDATION_ERROR", "Only draft writings can be submitted")),
        );
        match err {
            ApiError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, ErrorCode::Validation);
                assert_eq!(message, "Only draft writings can be submitted");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_code_decodes_to_other() {
        let parsed: ErrorBody =
            serde_json::from_str(r#"{"error_code":"TEAPOT","message":"short and stout"}"#).unwrap();
        assert_eq!(parsed.error_code, ErrorCode::Other("TEAPOT".into()));
        assert_eq!(parsed.error_code.as_str(), "TEAPOT");
    }
}
