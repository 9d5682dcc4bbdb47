//! Executing actions against the project backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use steuern_core::{ProjectId, ServerConfig, TrustedFragment};
use tracing::{debug, warn};

use crate::action::{Action, Method, RequestBody, ResponseShape};
use crate::error::{ClientError, Result};
use crate::response::{ActionResponse, Document, StatusPayload, disposition_filename};

/// Executes panel actions against a project backend.
///
/// One call performs exactly one request/response round trip. There are no
/// retries; every retry is initiated by the user.
#[async_trait]
pub trait ProjectApi: Send + Sync {
    /// Execute `action` for `project`.
    async fn execute(&self, project: ProjectId, action: &Action) -> Result<ActionResponse>;

    /// Human-readable name of the backend (for logs and the header).
    fn name(&self) -> &str;
}

/// reqwest-backed [`ProjectApi`].
pub struct HttpProjectApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProjectApi {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>, config: &ServerConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn build_request(&self, project: ProjectId, action: &Action) -> Result<(reqwest::RequestBuilder, ResponseShape)> {
        let spec = action.request(project);
        let url = format!("{}{}", self.base_url, spec.path);

        let request = match spec.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };

        let request = match spec.body {
            RequestBody::Empty if spec.method == Method::Post => {
                request.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            }
            RequestBody::Empty => request,
            RequestBody::Form(fields) => request.form(&fields),
            RequestBody::Multipart { field, path } => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|source| ClientError::UploadSource {
                        path: path.clone(),
                        source,
                    })?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "upload".to_string());
                let part = Part::bytes(bytes).file_name(file_name);
                request.multipart(Form::new().part(field, part))
            }
        };

        Ok((request, spec.shape))
    }

    async fn read_response(response: reqwest::Response, shape: ResponseShape) -> Result<ActionResponse> {
        let status = response.status();

        match shape {
            ResponseShape::Fragment => {
                let body = response.text().await.map_err(ClientError::from_transport)?;
                if !status.is_success() {
                    return Err(ClientError::from_http_status(status.as_u16(), &body));
                }
                Ok(ActionResponse::Fragment(TrustedFragment::from_server(body)))
            }
            ResponseShape::Status => {
                let body = response.text().await.map_err(ClientError::from_transport)?;
                // Failure payloads arrive with 4xx statuses and still carry
                // the error text.
                match serde_json::from_str::<StatusPayload>(&body) {
                    Ok(payload) => Ok(ActionResponse::Status(payload)),
                    Err(e) if status.is_success() => Err(ClientError::InvalidPayload(e.to_string())),
                    Err(_) => Err(ClientError::from_http_status(status.as_u16(), &body)),
                }
            }
            ResponseShape::Document => {
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ClientError::from_http_status(status.as_u16(), &body));
                }
                let filename = response
                    .headers()
                    .get(CONTENT_DISPOSITION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(disposition_filename);
                let bytes = response.bytes().await.map_err(ClientError::from_transport)?;
                Ok(ActionResponse::Document(Document {
                    filename,
                    bytes: bytes.to_vec(),
                }))
            }
        }
    }
}

#[async_trait]
impl ProjectApi for HttpProjectApi {
    async fn execute(&self, project: ProjectId, action: &Action) -> Result<ActionResponse> {
        let start = Instant::now();
        let (request, shape) = self.build_request(project, action).await?;

        debug!(project_id = %project, action = %action.kind(), "sending request");
        let response = request.send().await.map_err(ClientError::from_transport)?;
        let status = response.status();
        let result = Self::read_response(response, shape).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => debug!(action = %action.kind(), status = status.as_u16(), duration_ms, "request completed"),
            Err(e) => warn!(action = %action.kind(), status = status.as_u16(), duration_ms, error = %e, "request failed"),
        }
        result
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    fn api(server: &MockServer) -> HttpProjectApi {
        HttpProjectApi::new(server.uri(), &ServerConfig::default()).unwrap()
    }

    #[test]
    fn test_base_url_is_normalised() {
        let api = HttpProjectApi::new("http://localhost:5000/", &ServerConfig::default()).unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000");
    }

    #[tokio::test]
    async fn test_fragment_response() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/projekt/3/auftrag"))
            .and(matchers::header("content-type", "application/x-www-form-urlencoded"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<div>Auftrag 1.1</div>"))
            .expect(1)
            .mount(&server)
            .await;

        let response = api(&server).execute(ProjectId(3), &Action::FetchTask).await.unwrap();
        match response {
            ActionResponse::Fragment(html) => assert_eq!(html.as_html(), "<div>Auftrag 1.1</div>"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fragment_server_error_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = api(&server).execute(ProjectId(3), &Action::RunAnalysis).await.unwrap_err();
        assert!(err.is_server_error());
    }

    #[tokio::test]
    async fn test_status_payload_with_client_error_status() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/projekt/3/auftrag/9/status"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "success": false,
                "error": "Auftrag nicht gefunden"
            })))
            .mount(&server)
            .await;

        let action = Action::SetTaskStatus {
            task: steuern_core::TaskId(9),
            status: crate::TaskStatus::Done,
        };
        let response = api(&server).execute(ProjectId(3), &action).await.unwrap();
        assert_eq!(
            response,
            ActionResponse::Status(StatusPayload::failed("Auftrag nicht gefunden"))
        );
    }
}
