//! Error types for coinmetrics-stream
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Every variant maps onto one [`ErrorKind`], the small taxonomy shared by
//! the stream and materialized consumption modes.

use crate::types::NO_DATA_FOUND;
use thiserror::Error;

/// The main error type for coinmetrics-stream
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Classified API Errors
    // ============================================================================
    #[error("Bad request ({error_type}): {message}")]
    BadRequest { error_type: String, message: String },

    #[error("Unauthorized ({error_type}): {message}")]
    Unauthorized { error_type: String, message: String },

    #[error("Forbidden ({error_type}): {message}")]
    Forbidden { error_type: String, message: String },

    #[error("{}", NO_DATA_FOUND)]
    NoDataFound,

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid filter, id or parameter value
    BadRequest,
    /// Missing or invalid credentials
    Unauthorized,
    /// Credentials lack access to the resource
    Forbidden,
    /// The first page came back empty
    NoDataFound,
    /// Network, decoding or cancellation failure from the fetcher itself
    Transport,
    /// Invalid local configuration
    Config,
}

impl Error {
    /// Create a bad request error
    pub fn bad_request(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Forbidden {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BadRequest { .. } => ErrorKind::BadRequest,
            Error::Unauthorized { .. } => ErrorKind::Unauthorized,
            Error::Forbidden { .. } => ErrorKind::Forbidden,
            Error::NoDataFound => ErrorKind::NoDataFound,
            Error::Http(_)
            | Error::HttpStatus { .. }
            | Error::Timeout { .. }
            | Error::Transport { .. }
            | Error::Cancelled
            | Error::JsonParse(_)
            | Error::Other(_) => ErrorKind::Transport,
            Error::InvalidConfigValue { .. }
            | Error::YamlParse(_)
            | Error::InvalidUrl(_)
            | Error::Io(_) => ErrorKind::Config,
        }
    }

    /// Check if a failed send is worth another attempt
    ///
    /// Retryable statuses are decided by the HTTP fetcher before a status
    /// ever becomes an error, so `HttpStatus` is always final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Timeout { .. })
    }
}

/// Result type alias for coinmetrics-stream
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
