use std::fmt;

use http::StatusCode;
use thiserror::Error;

use crate::response::RawResponse;

/// Result type for restkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for restkit
#[derive(Error, Debug)]
pub enum Error {
    /// Lookup of a key that has no entry in a `MultiDict`
    #[error("Key not found: {0:?}")]
    KeyNotFound(String),

    /// `MultiDict::get_one` found more than one value
    #[error("Multiple values match {key:?}: {count} entries")]
    AmbiguousKey { key: String, count: usize },

    /// The server answered with an error status
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timeout errors
    #[error("Request timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Invalid request configuration
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Create a new key-not-found error
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Error::KeyNotFound(key.into())
    }

    /// Create a new timeout error
    pub fn timeout(duration: std::time::Duration) -> Self {
        Error::Timeout { duration }
    }

    /// Create a new invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest(message.into())
    }

    /// Check if this is a 404 classification
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Resource(ResourceError::NotFound(_)))
    }

    /// Check if this is a 401/403 classification
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Resource(ResourceError::Unauthorized(_)))
    }

    /// Check if this is any other >= 400 classification
    pub fn is_request_failed(&self) -> bool {
        matches!(self, Error::Resource(ResourceError::RequestFailed(_)))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Check if this is a network error
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    /// Get the classified HTTP failure, if this is one
    pub fn as_resource_error(&self) -> Option<&ResourceError> {
        match self {
            Error::Resource(e) => Some(e),
            _ => None,
        }
    }

    /// Status code of a classified HTTP failure
    pub fn status_code(&self) -> Option<StatusCode> {
        self.as_resource_error().map(ResourceError::status)
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Error::InvalidRequest(format!("Invalid header name: {}", err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Error::InvalidRequest(format!("Invalid header value: {}", err))
    }
}

impl From<http::method::InvalidMethod> for Error {
    fn from(err: http::method::InvalidMethod) -> Self {
        Error::InvalidRequest(format!("Invalid method: {}", err))
    }
}

/// Message extracted from an error response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorMessage {
    /// The body was a JSON object; its `error` and `reason` members
    Structured {
        error: Option<String>,
        reason: Option<String>,
    },
    /// Any other body, verbatim
    Raw(String),
}

impl ErrorMessage {
    /// The `error` member of a structured body
    pub fn error(&self) -> Option<&str> {
        match self {
            ErrorMessage::Structured { error, .. } => error.as_deref(),
            ErrorMessage::Raw(_) => None,
        }
    }

    /// The `reason` member of a structured body
    pub fn reason(&self) -> Option<&str> {
        match self {
            ErrorMessage::Structured { reason, .. } => reason.as_deref(),
            ErrorMessage::Raw(_) => None,
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessage::Structured { error, reason } => write!(
                f,
                "({}, {})",
                error.as_deref().unwrap_or("-"),
                reason.as_deref().unwrap_or("-")
            ),
            ErrorMessage::Raw(body) => f.write_str(body),
        }
    }
}

/// Everything known about a failed response
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub message: ErrorMessage,
    pub status: StatusCode,
    pub response: RawResponse,
}

/// A response whose status code is 400 or above
///
/// The variant set is closed: 404 is `NotFound`, 401 and 403 are
/// `Unauthorized`, every other error status is `RequestFailed`.
#[derive(Error, Debug, Clone)]
pub enum ResourceError {
    /// No resource was found at the given URI
    #[error("Resource not found ({}): {}", .0.status, .0.message)]
    NotFound(ErrorDetails),

    /// Authorization is required or was refused
    #[error("Unauthorized ({}): {}", .0.status, .0.message)]
    Unauthorized(ErrorDetails),

    /// Any other error status
    #[error("Request failed ({}): {}", .0.status, .0.message)]
    RequestFailed(ErrorDetails),
}

impl ResourceError {
    /// Get the details shared by all variants
    pub fn details(&self) -> &ErrorDetails {
        match self {
            ResourceError::NotFound(d)
            | ResourceError::Unauthorized(d)
            | ResourceError::RequestFailed(d) => d,
        }
    }

    /// Get the extracted error message
    pub fn message(&self) -> &ErrorMessage {
        &self.details().message
    }

    /// Get the status code
    pub fn status(&self) -> StatusCode {
        self.details().status
    }

    /// Get the raw response
    pub fn response(&self) -> &RawResponse {
        &self.details().response
    }
}
