//! Response payloads returned by the backend.

use serde::{Deserialize, Serialize};
use steuern_core::TrustedFragment;

/// JSON status payload (`{success, error?, ...}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Stored file name after an upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uebergabe_id: Option<u64>,

    /// Task label the upload was attached to, e.g. `"2.3"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auftrag: Option<String>,
}

impl StatusPayload {
    /// A bare `{success: true}` payload.
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// A `{success: false, error}` payload.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// The server-supplied error text, or a generic one.
    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or("Unbekannter Fehler")
    }
}

/// A downloaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// File name suggested by the server
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Parsed response of one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResponse {
    Fragment(TrustedFragment),
    Status(StatusPayload),
    Document(Document),
}

/// Extract the file name from a `Content-Disposition` header value.
pub fn disposition_filename(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let value = part.strip_prefix("filename=")?;
        let value = value.trim_matches('"');
        let name = value.rsplit(['/', '\\']).next().unwrap_or(value);
        (!name.is_empty()).then(|| name.to_string())
    })
}
