//! HyperFlex Token Error Types
//!
//! Error hierarchy for token acquisition, validation, and persistence.

use std::time::Duration;
use thiserror::Error;

/// Root error type for the token integration.
#[derive(Error, Debug)]
pub enum HxTokenError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl HxTokenError {
    /// Get error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "HX_TOKEN_CONFIG",
            Self::InvalidArgument(_) => "HX_TOKEN_ARGUMENT",
            Self::Network(_) => "HX_TOKEN_NETWORK",
            Self::Protocol(_) => "HX_TOKEN_PROTOCOL",
            Self::Provider(_) => "HX_TOKEN_PROVIDER",
            Self::Storage(StorageError::NotFound { .. }) => "HX_TOKEN_STORAGE_NOT_FOUND",
            Self::Storage(StorageError::Corrupt { .. }) => "HX_TOKEN_STORAGE_CORRUPT",
            Self::Storage(_) => "HX_TOKEN_STORAGE",
        }
    }

    /// Check if the caller could reasonably retry the same call.
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_retryable(),
            Self::Provider(ProviderError::ServerError { .. }) => true,
            _ => false,
        }
    }

    /// True when a read found no record at the requested path.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(StorageError::NotFound { .. }))
    }

    /// True for caller-input errors raised before any I/O.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to build HTTP client: {message}")]
    ClientBuild { message: String },
}

/// Caller-input error, raised before any network or file access.
#[derive(Error, Debug)]
pub enum ArgumentError {
    #[error("Unrecognized projection '{value}'; expected one of token, access_token, refresh_token, token_type, human_readable_time, unix_timestamp_time, source_module")]
    InvalidProjection { value: String },

    #[error("Unrecognized scope '{value}'; expected READ or MODIFY")]
    InvalidScope { value: String },

    #[error("Overwrite setting must be true or false, got '{value}'")]
    InvalidOverwrite { value: String },

    #[error("Token is missing required field: {field}")]
    MissingField { field: String },

    #[error("Storage path must not be empty")]
    EmptyPath,
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("TLS error: {message}")]
    TlsError { message: String },
}

impl NetworkError {
    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::TlsError { .. })
    }
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },
}

/// Non-success answer from the HyperFlex authentication service.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Bad request ({status}): {message}")]
    BadRequest { status: u16, message: String },

    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Forbidden ({status}): {message}")]
    Forbidden { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

impl ProviderError {
    /// HTTP status returned by the service.
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest { status, .. }
            | Self::Unauthorized { status, .. }
            | Self::Forbidden { status, .. }
            | Self::ServerError { status, .. }
            | Self::UnexpectedStatus { status, .. } => *status,
        }
    }
}

/// Storage error.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("No token record at {path}")]
    NotFound { path: String },

    #[error("Corrupt token record at {path}: {message}")]
    Corrupt { path: String, message: String },

    #[error("Read failed for {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Write failed for {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("Delete failed for {path}: {message}")]
    DeleteFailed { path: String, message: String },
}

/// Result type for token operations.
pub type HxTokenResult<T> = Result<T, HxTokenError>;

/// Pull a human-readable message out of an error body.
///
/// The service answers with JSON objects whose message key varies between
/// releases; a non-JSON body is returned trimmed.
pub fn parse_error_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error_description", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return Some(text.to_string());
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Create error from a failed HTTP response.
pub fn create_error_from_response(status: u16, body: &str) -> HxTokenError {
    let message = parse_error_message(body).unwrap_or_else(|| format!("HTTP {}", status));

    let error = match status {
        400 => ProviderError::BadRequest { status, message },
        401 => ProviderError::Unauthorized { status, message },
        403 => ProviderError::Forbidden { status, message },
        500..=599 => ProviderError::ServerError { status, message },
        _ => ProviderError::UnexpectedStatus {
            status,
            body: body.to_string(),
        },
    };

    HxTokenError::Provider(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retryable() {
        assert!(HxTokenError::Network(NetworkError::Timeout {
            timeout: Duration::from_secs(30)
        })
        .is_retryable());
        assert!(!HxTokenError::Network(NetworkError::TlsError {
            message: "bad certificate".to_string()
        })
        .is_retryable());
        assert!(create_error_from_response(503, "").is_retryable());
        assert!(!create_error_from_response(401, "").is_retryable());
    }

    #[test]
    fn test_storage_kinds_are_distinct() {
        let missing = HxTokenError::Storage(StorageError::NotFound {
            path: "/tmp/token.xml".to_string(),
        });
        let corrupt = HxTokenError::Storage(StorageError::Corrupt {
            path: "/tmp/token.xml".to_string(),
            message: "missing field `access_token`".to_string(),
        });

        assert!(missing.is_not_found());
        assert!(!corrupt.is_not_found());
        assert_ne!(missing.error_code(), corrupt.error_code());
    }

    #[test]
    fn test_create_error_from_json_body() {
        let error = create_error_from_response(401, r#"{"message":"Authentication failed"}"#);
        match error {
            HxTokenError::Provider(ProviderError::Unauthorized { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Authentication failed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_create_error_keeps_unexpected_body() {
        let error = create_error_from_response(302, "moved");
        match error {
            HxTokenError::Provider(e @ ProviderError::UnexpectedStatus { .. }) => {
                assert_eq!(e.status(), 302);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_message() {
        assert_eq!(
            parse_error_message(r#"{"error":"invalid_grant"}"#),
            Some("invalid_grant".to_string())
        );
        assert_eq!(parse_error_message("  plain text \n"), Some("plain text".to_string()));
        assert_eq!(parse_error_message(""), None);
    }
}
