//! Scripted [`ProjectApi`] for tests.
//!
//! Replies are queued per [`ActionKind`]. Every call is recorded before the
//! reply is produced, so tests can assert on issued requests. A gated mock
//! holds each reply until the test releases a permit, which keeps a request
//! observably in flight.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use steuern_core::{ProjectId, TrustedFragment};
use tokio::sync::Semaphore;

use crate::action::{Action, ActionKind};
use crate::api::ProjectApi;
use crate::error::{ClientError, Result};
use crate::response::{ActionResponse, Document, StatusPayload};

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Fragment(String),
    Status(StatusPayload),
    Document(Vec<u8>),
    ConnectionFailed(String),
    HttpStatus(u16, String),
}

impl MockReply {
    fn into_result(self) -> Result<ActionResponse> {
        match self {
            MockReply::Fragment(html) => Ok(ActionResponse::Fragment(TrustedFragment::from_server(html))),
            MockReply::Status(payload) => Ok(ActionResponse::Status(payload)),
            MockReply::Document(bytes) => Ok(ActionResponse::Document(Document {
                filename: None,
                bytes,
            })),
            MockReply::ConnectionFailed(msg) => Err(ClientError::ConnectionFailed(msg)),
            MockReply::HttpStatus(status, body) => Err(ClientError::from_http_status(status, &body)),
        }
    }
}

/// Scripted backend.
#[derive(Default)]
pub struct MockProjectApi {
    replies: Mutex<HashMap<ActionKind, VecDeque<MockReply>>>,
    calls: Mutex<Vec<(ProjectId, Action)>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockProjectApi {
    /// Create a mock with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that holds every reply until a permit is added to the
    /// returned semaphore.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mock = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (mock, gate)
    }

    /// Queue a reply for the next call of `kind`.
    pub fn with_reply(self, kind: ActionKind, reply: MockReply) -> Self {
        self.push_reply(kind, reply);
        self
    }

    /// Queue a reply for the next call of `kind`.
    pub fn push_reply(&self, kind: ActionKind, reply: MockReply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.entry(kind).or_default().push_back(reply);
        }
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<(ProjectId, Action)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ProjectApi for MockProjectApi {
    async fn execute(&self, project: ProjectId, action: &Action) -> Result<ActionResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((project, action.clone()));
        }

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| ClientError::ConnectionFailed("mock gate closed".into()))?;
            permit.forget();
        }

        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.get_mut(&action.kind())?.pop_front());

        reply
            .unwrap_or_else(|| MockReply::ConnectionFailed(format!("no reply scripted for {}", action.kind())))
            .into_result()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_are_consumed_in_order() {
        let mock = MockProjectApi::new()
            .with_reply(ActionKind::FetchTask, MockReply::Fragment("<p>1</p>".into()))
            .with_reply(ActionKind::FetchTask, MockReply::Fragment("<p>2</p>".into()));

        let first = mock.execute(ProjectId(1), &Action::FetchTask).await.unwrap();
        let second = mock.execute(ProjectId(1), &Action::FetchTask).await.unwrap();
        assert_eq!(first, ActionResponse::Fragment(TrustedFragment::from_server("<p>1</p>")));
        assert_eq!(second, ActionResponse::Fragment(TrustedFragment::from_server("<p>2</p>")));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unscripted_call_fails_as_network_error() {
        let mock = MockProjectApi::new();
        let err = mock.execute(ProjectId(1), &Action::RunAnalysis).await.unwrap_err();
        assert!(err.is_network_error());
    }

    #[tokio::test]
    async fn test_gated_reply_waits_for_permit() {
        let (mock, gate) = MockProjectApi::gated();
        let mock = Arc::new(mock.with_reply(ActionKind::ExportPdf, MockReply::Document(vec![1, 2])));

        let task = {
            let mock = mock.clone();
            tokio::spawn(async move { mock.execute(ProjectId(1), &Action::ExportPdf).await })
        };
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        gate.add_permits(1);
        let response = task.await.unwrap().unwrap();
        assert!(matches!(response, ActionResponse::Document(doc) if doc.bytes == vec![1, 2]));
    }
}
