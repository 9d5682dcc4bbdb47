//! Error types for steuern.
//!
//! [`SteuernError`] covers the failures that can happen before the panel is
//! up: configuration loading, log directory setup and address parsing.
//! Request failures live in `steuern-client`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`SteuernError`].
pub type Result<T> = std::result::Result<T, SteuernError>;

/// Error type for core steuern operations.
#[derive(Debug, Error)]
pub enum SteuernError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file could not be read
    #[error("Configuration not readable at {path}")]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is invalid YAML
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Address Errors
    // =========================================================================
    /// The page address could not be parsed
    #[error("Invalid page address {address}: {message}")]
    InvalidAddress { address: String, message: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Unexpected internal state
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SteuernError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create an invalid-address error.
    pub fn invalid_address(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Get a user-facing hint for resolving this error.
    pub fn suggested_action(&self) -> &'static str {
        match self {
            Self::ConfigUnreadable { .. } => "Check the permissions of the configuration file.",
            Self::ConfigInvalid { .. } | Self::ConfigValidation { .. } => {
                "Fix the configuration file at ~/.steuern/config.yaml or pass --config."
            }
            Self::DirectoryCreation { .. } | Self::Io { .. } => {
                "Check that the directory exists and is writable."
            }
            Self::InvalidAddress { .. } => {
                "Pass the panel address, e.g. http://localhost:5000/projekt/3/steuern."
            }
            Self::Internal { .. } => "Check the logs for details.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = SteuernError::validation("narrow_width must be positive");
        assert_eq!(
            err.to_string(),
            "Configuration validation failed: narrow_width must be positive"
        );
    }

    #[test]
    fn test_invalid_address_suggests_example() {
        let err = SteuernError::invalid_address("::", "relative URL without a base");
        assert!(err.to_string().contains("::"));
        assert!(err.suggested_action().contains("/projekt/"));
    }
}
