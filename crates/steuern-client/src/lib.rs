//! # steuern-client
//!
//! Client for the NEXUS project backend behind the "Projekt steuern" panel.
//!
//! This crate provides:
//! - [`Action`] - Every backend action the panel can trigger, with its
//!   request descriptor ([`RequestSpec`])
//! - [`ProjectApi`] - Trait for executing an action against a backend
//! - [`HttpProjectApi`] - reqwest implementation
//! - [`MockProjectApi`] - Scripted implementation for tests
//! - [`ClientError`] - Transport and payload failures
//!
//! The backend owns all state. Responses are either pre-rendered HTML
//! fragments, small JSON status payloads, or a document download.
//!
//! ## Example
//!
//! ```no_run
//! use steuern_client::{Action, ActionResponse, HttpProjectApi, ProjectApi};
//! use steuern_core::{ProjectId, ServerConfig};
//!
//! # async fn example() -> steuern_client::Result<()> {
//! let api = HttpProjectApi::new("http://localhost:5000", &ServerConfig::default())?;
//! match api.execute(ProjectId(3), &Action::FetchTask).await? {
//!     ActionResponse::Fragment(html) => println!("{}", html.to_text()),
//!     other => println!("unexpected: {:?}", other),
//! }
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod api;
pub mod error;
pub mod mock;
pub mod response;

pub use action::{Action, ActionKind, Method, RequestBody, RequestSpec, ResponseShape, TaskStatus};
pub use api::{HttpProjectApi, ProjectApi};
pub use error::{ClientError, Result};
pub use mock::{MockProjectApi, MockReply};
pub use response::{ActionResponse, Document, StatusPayload};
