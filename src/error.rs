//! Unified error handling for the Key Protect client
//!
//! This module provides a structured error system with:
//! - Unique error codes for debugging and documentation
//! - Typed variants carrying the raw remote context (status, headers, body)
//! - Convenient constructor methods
//! - Automatic conversions from common error types

use std::fmt;
use thiserror::Error;

/// Unified Result type for all client operations
pub type Result<T> = std::result::Result<T, KpError>;

/// Error codes for client operations
///
/// Each error has a unique code in the format `KXXX` where:
/// - K1XX: Authentication errors
/// - K2XX: Network and API errors
/// - K3XX: File and I/O errors
/// - K4XX: Configuration errors
/// - K5XX: Validation and input errors
/// - K7XX: Resource lookup errors
/// - K8XX: UI and interaction errors
/// - K9XX: Internal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (K1XX)
    /// K101: Authentication failed
    AuthenticationFailed,
    /// K102: No credential supplied
    MissingCredentials,
    /// K103: Token expired
    TokenExpired,

    // Network (K2XX)
    /// K201: HTTP request failed
    HttpError,
    /// K202: Connection timeout
    ConnectionTimeout,
    /// K204: Connection refused
    ConnectionRefused,
    /// K205: API returned error response
    ApiError,
    /// K206: Invalid API response format
    InvalidResponse,

    // File/IO (K3XX)
    /// K301: File read error
    FileReadError,

    // Configuration (K4XX)
    /// K401: Configuration error
    ConfigError,
    /// K402: Invalid endpoint URL
    InvalidEndpoint,

    // Validation (K5XX)
    /// K501: Invalid input
    InvalidInput,
    /// K502: Validation failed
    ValidationFailed,

    // Resource (K7XX)
    /// K705: Resource not found
    ResourceNotFound,

    // UI (K8XX)
    /// K801: Dialog error
    DialogError,

    // Internal (K9XX)
    /// K901: Internal error
    InternalError,
    /// K902: Serialization error
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::AuthenticationFailed => 101,
            ErrorCode::MissingCredentials => 102,
            ErrorCode::TokenExpired => 103,

            ErrorCode::HttpError => 201,
            ErrorCode::ConnectionTimeout => 202,
            ErrorCode::ConnectionRefused => 204,
            ErrorCode::ApiError => 205,
            ErrorCode::InvalidResponse => 206,

            ErrorCode::FileReadError => 301,

            ErrorCode::ConfigError => 401,
            ErrorCode::InvalidEndpoint => 402,

            ErrorCode::InvalidInput => 501,
            ErrorCode::ValidationFailed => 502,

            ErrorCode::ResourceNotFound => 705,

            ErrorCode::DialogError => 801,

            ErrorCode::InternalError => 901,
            ErrorCode::SerializationError => 902,
        }
    }

    /// Get the string code (e.g., "K101")
    pub fn as_str(&self) -> String {
        format!("K{}", self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "K{}", self.code())
    }
}

/// Main error type for all client operations
#[derive(Error, Debug)]
pub enum KpError {
    // ==================== Authentication Errors (K1XX) ====================
    /// Credential rejected or missing at the IAM endpoint
    ///
    /// `status` and `body` carry the raw token-endpoint response when the
    /// rejection came from the service; both are `None` when the error was
    /// raised locally before any request was made.
    #[error("[{code}] Authentication failed: {message}")]
    Auth {
        code: ErrorCode,
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    // ==================== Network Errors (K2XX) ====================
    /// HTTP/Network error
    #[error("[{code}] Network error: {message}")]
    Network {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Non-2xx response from the key management or account API
    ///
    /// `headers` holds the complete response header list with any
    /// `authorization` value already redacted.
    #[error("[{code}] API error: {status} {reason}")]
    Api {
        code: ErrorCode,
        status: u16,
        reason: String,
        headers: Vec<(String, String)>,
        body: String,
    },

    // ==================== File/IO Errors (K3XX) ====================
    /// File or IO error
    #[error("[{code}] {context}: {message}")]
    Io {
        code: ErrorCode,
        context: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // ==================== Configuration Errors (K4XX) ====================
    /// Configuration error
    #[error("[{code}] Configuration error: {message}")]
    Config {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<config::ConfigError>,
    },

    // ==================== Validation Errors (K5XX) ====================
    /// Validation error
    #[error("[{code}] Validation error: {message}")]
    Validation { code: ErrorCode, message: String },

    /// Invalid input error
    #[error("[{code}] Invalid input: {message}")]
    InvalidInput { code: ErrorCode, message: String },

    // ==================== Resource Errors (K7XX) ====================
    /// Logical lookup yielded no match
    #[error("[{code}] Not found: {resource}")]
    NotFound { code: ErrorCode, resource: String },

    // ==================== UI Errors (K8XX) ====================
    /// UI/Dialog error
    #[error("[{code}] UI error: {message}")]
    Ui { code: ErrorCode, message: String },

    // ==================== Internal Errors (K9XX) ====================
    /// JSON serialization error
    #[error("[{code}] Serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

// ==================== Constructor Methods ====================

impl KpError {
    // --- Authentication ---

    /// Create authentication error raised locally (no request made)
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Auth {
            code: ErrorCode::AuthenticationFailed,
            message: message.into(),
            status: None,
            body: None,
        }
    }

    /// Create missing-credentials error
    pub fn missing_credentials() -> Self {
        Self::Auth {
            code: ErrorCode::MissingCredentials,
            message: "must supply one of username/password or an API key".to_string(),
            status: None,
            body: None,
        }
    }

    /// Create authentication error from a token-endpoint rejection
    pub fn auth_rejected(status: u16, body: impl Into<String>) -> Self {
        Self::Auth {
            code: ErrorCode::AuthenticationFailed,
            message: format!("token endpoint returned {}", status),
            status: Some(status),
            body: Some(body.into()),
        }
    }

    // --- Network ---

    /// Create network error from message
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            code: ErrorCode::HttpError,
            message: message.into(),
            source: None,
        }
    }

    /// Create network error from reqwest error
    pub fn network_from_reqwest(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::ConnectionTimeout
        } else if err.is_connect() {
            ErrorCode::ConnectionRefused
        } else {
            ErrorCode::HttpError
        };

        Self::Network {
            code,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create API error from a non-2xx response
    pub fn api(
        status: u16,
        reason: impl Into<String>,
        headers: Vec<(String, String)>,
        body: impl Into<String>,
    ) -> Self {
        Self::Api {
            code: ErrorCode::ApiError,
            status,
            reason: reason.into(),
            headers,
            body: body.into(),
        }
    }

    /// Create invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::InvalidResponse,
            status: 0,
            reason: message.into(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    // --- File/IO ---

    /// Create IO error from std::io::Error
    pub fn io_from_error(context: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            code: ErrorCode::FileReadError,
            context: context.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    // --- Configuration ---

    /// Create configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: message.into(),
            source: None,
        }
    }

    /// Create invalid endpoint error
    pub fn invalid_endpoint(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::InvalidEndpoint,
            message: message.into(),
            source: None,
        }
    }

    // --- Validation ---

    /// Create validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
        }
    }

    /// Create invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code: ErrorCode::InvalidInput,
            message: message.into(),
        }
    }

    // --- Resource ---

    /// Create not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            code: ErrorCode::ResourceNotFound,
            resource: resource.into(),
        }
    }

    // --- Utility Methods ---

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Auth { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Api { code, .. } => *code,
            Self::Io { code, .. } => *code,
            Self::Config { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::InvalidInput { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Ui { code, .. } => *code,
            Self::Serialization { code, .. } => *code,
        }
    }

    /// Check if this is an authentication error
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Check if this is a lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Api { status: 503, .. }
                | Self::Api { status: 429, .. }
        )
    }

    /// Render the full diagnostic block for an API error
    ///
    /// Mirrors the raw response: status line, headers (already redacted),
    /// then the body. Other variants render their `Display` form.
    pub fn render(&self) -> String {
        match self {
            Self::Api {
                status,
                reason,
                headers,
                body,
                ..
            } => {
                let mut out = format!("{} {}\n", status, reason);
                for (name, value) in headers {
                    out.push_str(&format!("{}: {}\n", name, value));
                }
                out.push_str(body);
                out
            }
            Self::Auth {
                status: Some(status),
                body: Some(body),
                ..
            } => format!("{}\n{}", status, body),
            other => other.to_string(),
        }
    }
}

// ==================== From Implementations ====================

impl From<reqwest::Error> for KpError {
    fn from(err: reqwest::Error) -> Self {
        Self::network_from_reqwest(err)
    }
}

impl From<serde_json::Error> for KpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            code: ErrorCode::SerializationError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<config::ConfigError> for KpError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<std::io::Error> for KpError {
    fn from(err: std::io::Error) -> Self {
        Self::io_from_error("IO operation", err)
    }
}

impl From<validator::ValidationErrors> for KpError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: err.to_string(),
        }
    }
}

impl From<dialoguer::Error> for KpError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Ui {
            code: ErrorCode::DialogError,
            message: format!("Dialog error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::AuthenticationFailed.code(), 101);
        assert_eq!(ErrorCode::ApiError.code(), 205);
        assert_eq!(ErrorCode::ConfigError.code(), 401);
        assert_eq!(ErrorCode::ResourceNotFound.code(), 705);
    }

    #[test]
    fn test_error_code_string() {
        assert_eq!(ErrorCode::MissingCredentials.as_str(), "K102");
        assert_eq!(ErrorCode::InvalidResponse.as_str(), "K206");
    }

    #[test]
    fn test_error_display() {
        let err = KpError::missing_credentials();
        assert!(err.to_string().contains("K102"));
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_error_is_retryable() {
        let unavailable = KpError::api(503, "Service Unavailable", Vec::new(), "");
        assert!(unavailable.is_retryable());

        let auth_err = KpError::authentication("failed");
        assert!(!auth_err.is_retryable());
    }

    #[test]
    fn test_api_error_render() {
        let err = KpError::api(
            404,
            "Not Found",
            vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("authorization".to_string(), "REDACTED".to_string()),
            ],
            r#"{"resources":[]}"#,
        );

        let rendered = err.render();
        assert!(rendered.starts_with("404 Not Found\n"));
        assert!(rendered.contains("authorization: REDACTED"));
        assert!(rendered.ends_with(r#"{"resources":[]}"#));
    }
}
