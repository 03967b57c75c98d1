//! Error types for xmljson
//!
//! This module defines all error types used throughout the library.
//! Structural, namespace and validation failures are kept apart so callers
//! can tell a malformed internal tree from an unknown prefix.

use std::fmt;
use thiserror::Error;

/// Result type alias using xmljson Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xmljson operations
#[derive(Error, Debug)]
pub enum Error {
    /// Internal form does not have the expected shape
    #[error("structural error: {0}")]
    Structure(String),

    /// Namespace prefix could not be resolved
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Rejected configuration (reserved prefix, bad separator)
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// XML parsing or writing error
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON parsing or writing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by a remote API inside a response body
    #[error("API error: {0}")]
    Api(String),
}

impl Error {
    /// Shorthand for a structural error
    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure(message.into())
    }

    /// Shorthand for an XML error built from any displayable cause
    pub fn xml(cause: impl fmt::Display) -> Self {
        Self::Xml(cause.to_string())
    }
}

/// Rejected configuration value, with optional context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Error message
    pub message: String,
    /// The offending value
    pub value: Option<String>,
    /// Why the value was rejected
    pub reason: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            value: None,
            reason: None,
        }
    }

    /// Set the offending value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref value) = self.value {
            write!(f, ": '{}'", value)?;
        }

        if let Some(ref reason) = self.reason {
            write!(f, " ({})", reason)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}
