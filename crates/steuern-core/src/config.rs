//! Configuration for the steuern panel.
//!
//! Loaded from `~/.steuern/config.yaml` (or `--config <path>`). A missing file
//! means defaults; a malformed file is an error.
//!
//! ```yaml
//! server:
//!   base_url: http://localhost:5000
//!   timeout_secs: 120
//! panel:
//!   handoff_reload_delay_ms: 1500
//!   narrow_width: 100
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SteuernError};
use crate::logging::steuern_home;

/// Fallback backend address when neither the CLI, the config nor the page
/// address name one.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteuernConfig {
    /// Backend connection settings
    pub server: ServerConfig,

    /// Panel behaviour settings
    pub panel: PanelConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the project backend
    pub base_url: Option<String>,

    /// Request timeout in seconds. `None` leaves timing to the server and
    /// the transport.
    pub timeout_secs: Option<u64>,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: None,
            user_agent: format!("steuern/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Panel behaviour settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Delay between a successful upload and the handoff list reload
    pub handoff_reload_delay_ms: u64,

    /// Quiet period after the last resize before layout decisions are made
    pub resize_debounce_ms: u64,

    /// Terminal width at or below which the sidebar is an overlay
    pub narrow_width: u16,

    /// Characters of an error report echoed into the chat log
    pub error_preview_chars: usize,

    /// Directory that receives PDF exports (current directory when unset)
    pub export_dir: Option<PathBuf>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            handoff_reload_delay_ms: 1500,
            resize_debounce_ms: 250,
            narrow_width: 100,
            error_preview_chars: 100,
            export_dir: None,
        }
    }
}

impl PanelConfig {
    pub fn handoff_reload_delay(&self) -> Duration {
        Duration::from_millis(self.handoff_reload_delay_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

impl SteuernConfig {
    /// Default config file location (`~/.steuern/config.yaml`).
    pub fn default_path() -> Result<PathBuf> {
        Ok(steuern_home()?.join("config.yaml"))
    }

    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(SteuernError::ConfigUnreadable { path, source: e });
            }
        };

        let config = Self::from_yaml(&content).map_err(|message| SteuernError::ConfigInvalid {
            path: path.clone(),
            message,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML content. Empty content yields the defaults.
    pub fn from_yaml(content: &str) -> std::result::Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.panel.narrow_width == 0 {
            return Err(SteuernError::validation("panel.narrow_width must be positive"));
        }
        if self.panel.error_preview_chars == 0 {
            return Err(SteuernError::validation(
                "panel.error_preview_chars must be positive",
            ));
        }
        if let Some(url) = &self.server.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(SteuernError::validation(format!(
                    "server.base_url must be an http(s) URL, got {url}"
                )));
            }
        }
        Ok(())
    }

    /// Resolve the backend base URL.
    ///
    /// Precedence: explicit override, configured `server.base_url`, origin of
    /// the page address, [`DEFAULT_BASE_URL`].
    pub fn resolve_base_url(&self, cli_override: Option<&str>, page_address: &str) -> String {
        cli_override
            .map(str::to_string)
            .or_else(|| self.server.base_url.clone())
            .or_else(|| crate::address::origin_of(page_address))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SteuernConfig::default();
        assert_eq!(config.panel.handoff_reload_delay(), Duration::from_millis(1500));
        assert_eq!(config.panel.resize_debounce(), Duration::from_millis(250));
        assert!(config.server.timeout_secs.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = SteuernConfig::from_yaml("panel:\n  narrow_width: 80\n").unwrap();
        assert_eq!(config.panel.narrow_width, 80);
        assert_eq!(config.panel.handoff_reload_delay_ms, 1500);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = SteuernConfig::load(Some(&dir.path().join("nope.yaml"))).unwrap();
        assert_eq!(config, SteuernConfig::default());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "panel: [unclosed").unwrap();

        let err = SteuernConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, SteuernError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_validation_rejects_non_http_base_url() {
        let config =
            SteuernConfig::from_yaml("server:\n  base_url: ftp://example.org\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_url_precedence() {
        let mut config = SteuernConfig::default();
        let page = "http://panel.local:8080/projekt/3/steuern";

        assert_eq!(config.resolve_base_url(None, page), "http://panel.local:8080");
        assert_eq!(config.resolve_base_url(None, "/projekt/3"), DEFAULT_BASE_URL);

        config.server.base_url = Some("http://configured:5000/".into());
        assert_eq!(config.resolve_base_url(None, page), "http://configured:5000");
        assert_eq!(
            config.resolve_base_url(Some("http://cli:1"), page),
            "http://cli:1"
        );
    }
}
