//! Error types for backend requests.

use std::path::PathBuf;

use thiserror::Error;

/// Backend request errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Connection could not be established
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Server answered with a non-success status and no usable payload
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),

    /// File selected for upload could not be read
    #[error("Cannot read upload source {path}")]
    UploadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Client construction failed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ClientError {
    /// Classify a transport error from reqwest.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_connect() {
            ClientError::ConnectionFailed(err.to_string())
        } else {
            ClientError::HttpError(err)
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let body: String = body.chars().take(200).collect();
        match status {
            408 | 504 => ClientError::Timeout(format!("HTTP {status}")),
            _ => ClientError::HttpStatus { status, body },
        }
    }

    /// Check if this error is a transport-level failure.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            ClientError::Timeout(_) | ClientError::ConnectionFailed(_) | ClientError::HttpError(_)
        )
    }

    /// Check if the server answered at all.
    pub fn is_server_error(&self) -> bool {
        matches!(self, ClientError::HttpStatus { status, .. } if *status >= 500)
    }

    /// Short message for the panel's status line.
    pub fn friendly_message(&self) -> String {
        match self {
            ClientError::Timeout(_) => "Zeitüberschreitung der Anfrage.".to_string(),
            ClientError::ConnectionFailed(_) => "Server nicht erreichbar.".to_string(),
            ClientError::HttpStatus { status, .. } => format!("Server antwortete mit {status}."),
            ClientError::InvalidPayload(_) | ClientError::JsonError(_) => {
                "Unerwartete Antwort vom Server.".to_string()
            }
            ClientError::UploadSource { path, .. } => {
                format!("Datei nicht lesbar: {}", path.display())
            }
            ClientError::ConfigError(msg) => format!("Konfigurationsfehler: {msg}"),
            ClientError::HttpError(_) => "Netzwerkfehler.".to_string(),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_timeout_is_timeout() {
        assert!(matches!(
            ClientError::from_http_status(504, "gateway"),
            ClientError::Timeout(_)
        ));
    }

    #[test]
    fn test_http_status_keeps_body_prefix() {
        let body = "x".repeat(500);
        match ClientError::from_http_status(500, &body) {
            ClientError::HttpStatus { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), 200);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_network_classification() {
        assert!(ClientError::ConnectionFailed("refused".into()).is_network_error());
        assert!(!ClientError::InvalidPayload("x".into()).is_network_error());
        assert!(ClientError::from_http_status(502, "").is_server_error());
        assert!(!ClientError::from_http_status(404, "").is_server_error());
    }

    #[test]
    fn test_friendly_message_for_upload_source() {
        let err = ClientError::UploadSource {
            path: PathBuf::from("/tmp/missing.md"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.friendly_message().contains("/tmp/missing.md"));
    }
}
