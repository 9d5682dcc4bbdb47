//! # steuern-core
//!
//! Core types, errors, and utilities shared by the steuern crates.
//!
//! This crate provides:
//! - [`SteuernError`] - Error type for configuration, I/O and address handling
//! - [`logging`] - Tracing setup and log file management
//! - [`config`] - YAML configuration (`~/.steuern/config.yaml`)
//! - [`types`] - Identifiers and chat messages shared across crates
//! - [`address`] - Project id extraction from a page address
//! - [`markup`] - Escaping and trusted server fragments
//!
//! ## Example
//!
//! ```no_run
//! use steuern_core::{address, logging};
//!
//! fn main() -> steuern_core::Result<()> {
//!     let _guard = logging::init_logging(None, false)?;
//!
//!     let project = address::project_id_from_address("http://localhost:5000/projekt/7/steuern");
//!     tracing::info!(?project, "page opened");
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod config;
pub mod error;
pub mod logging;
pub mod markup;
pub mod types;

pub use address::{PROJECT_MARKER, project_id_from_address};
pub use config::{PanelConfig, ServerConfig, SteuernConfig};
pub use error::{Result, SteuernError};
pub use logging::{LogGuard, init_logging};
pub use markup::{TrustedFragment, escape_html, fragment_to_text};
pub use types::{Author, ChatMessage, ErrorReportId, HandoffId, ProjectId, TaskId};
