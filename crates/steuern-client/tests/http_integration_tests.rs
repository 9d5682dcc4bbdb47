//! HTTP-level tests for the reqwest project client.
//!
//! These tests verify that every panel action reaches the right endpoint
//! with the right body encoding, and that each response shape is parsed
//! the way the panel expects.

use std::io::Write;

use steuern_client::{
    Action, ActionResponse, ClientError, HttpProjectApi, ProjectApi, StatusPayload,
};
use steuern_core::{ErrorReportId, HandoffId, ProjectId, ServerConfig};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string, body_string_contains, header, header_exists, method, path},
};

const PROJECT: ProjectId = ProjectId(4);

fn client(server: &MockServer) -> HttpProjectApi {
    HttpProjectApi::new(server.uri(), &ServerConfig::default()).unwrap()
}

// ============================================================
// Fragment endpoints
// ============================================================

#[tokio::test]
async fn test_report_error_posts_urlencoded_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projekt/4/fehler"))
        .and(body_string("fehler_text=Cannot+read+property+%27x%27"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div class="chat-message" data-fehler-id="12">Lösung</div>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let action = Action::ReportError {
        text: "Cannot read property 'x'\n\n".into(),
    };
    let response = client(&server).execute(PROJECT, &action).await.unwrap();

    match response {
        ActionResponse::Fragment(html) => {
            assert_eq!(html.numeric_attribute("data-fehler-id"), Some(12));
        }
        other => panic!("expected fragment, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_and_view_handoffs_use_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projekt/4/uebergaben"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<ul></ul>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projekt/4/uebergaben/8"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<pre>inhalt</pre>"))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    assert!(matches!(
        api.execute(PROJECT, &Action::ListHandoffs).await.unwrap(),
        ActionResponse::Fragment(_)
    ));
    match api.execute(PROJECT, &Action::ViewHandoff(HandoffId(8))).await.unwrap() {
        ActionResponse::Fragment(html) => assert_eq!(html.to_text(), "inhalt"),
        other => panic!("expected fragment, got {other:?}"),
    }
}

// ============================================================
// JSON status endpoints
// ============================================================

#[tokio::test]
async fn test_upload_sends_multipart_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projekt/4/uebergaben/upload"))
        .and(header_exists("content-type"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"notes.md\""))
        .and(body_string_contains("# Übergabe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "uebergabe_id": 21,
            "filename": "2026-10-19_12-00_notes.md",
            "auftrag": "2.1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("notes.md");
    let mut file = std::fs::File::create(&file_path).unwrap();
    writeln!(file, "# Übergabe").unwrap();

    let action = Action::UploadHandoff { path: file_path };
    match client(&server).execute(PROJECT, &action).await.unwrap() {
        ActionResponse::Status(payload) => {
            assert!(payload.success);
            assert_eq!(payload.filename.as_deref(), Some("2026-10-19_12-00_notes.md"));
            assert_eq!(payload.auftrag.as_deref(), Some("2.1"));
        }
        other => panic!("expected status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_upload_of_missing_file_issues_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let action = Action::UploadHandoff {
        path: "/definitely/not/here.pdf".into(),
    };
    let err = client(&server).execute(PROJECT, &action).await.unwrap_err();
    assert!(matches!(err, ClientError::UploadSource { .. }));
}

#[tokio::test]
async fn test_upload_rejection_surfaces_server_error_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projekt/4/uebergaben/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "success": false,
            "error": "Datei zu groß. Max 5MB erlaubt."
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("big.pdf");
    std::fs::write(&file_path, b"%PDF-1.4").unwrap();

    let response = client(&server)
        .execute(PROJECT, &Action::UploadHandoff { path: file_path })
        .await
        .unwrap();
    assert_eq!(
        response,
        ActionResponse::Status(StatusPayload::failed("Datei zu groß. Max 5MB erlaubt."))
    );
}

#[tokio::test]
async fn test_delete_and_feedback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projekt/4/uebergaben/8/delete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "Übergabe gelöscht"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projekt/4/fehler/3/feedback"))
        .and(body_string("erfolg=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "Feedback gespeichert"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let deleted = api.execute(PROJECT, &Action::DeleteHandoff(HandoffId(8))).await.unwrap();
    assert!(matches!(deleted, ActionResponse::Status(ref p) if p.success));

    let feedback = Action::SubmitFeedback {
        error: ErrorReportId(3),
        success: true,
    };
    let response = api.execute(PROJECT, &feedback).await.unwrap();
    assert!(matches!(response, ActionResponse::Status(ref p) if p.success));
}

#[tokio::test]
async fn test_send_chat_encodes_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projekt/4/chat"))
        .and(body_string("inhalt=Hallo+Welt&typ=USER"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message_id": 1,
            "typ": "USER",
            "inhalt": "Hallo Welt",
            "timestamp": "12:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let action = Action::SendChat {
        text: "Hallo Welt".into(),
    };
    let response = client(&server).execute(PROJECT, &action).await.unwrap();
    assert!(matches!(response, ActionResponse::Status(ref p) if p.success));
}

#[tokio::test]
async fn test_non_json_success_body_is_invalid_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projekt/4/uebergaben/2/delete"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .execute(PROJECT, &Action::DeleteHandoff(HandoffId(2)))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidPayload(_)));
}

// ============================================================
// Document download
// ============================================================

#[tokio::test]
async fn test_export_pdf_reads_disposition_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projekt/4/export-pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .insert_header("content-disposition", "attachment; filename=\"Demo_Dokumentation.pdf\"")
                .set_body_bytes(b"%PDF-1.7 test".to_vec()),
        )
        .mount(&server)
        .await;

    match client(&server).execute(PROJECT, &Action::ExportPdf).await.unwrap() {
        ActionResponse::Document(doc) => {
            assert_eq!(doc.filename.as_deref(), Some("Demo_Dokumentation.pdf"));
            assert!(doc.bytes.starts_with(b"%PDF"));
        }
        other => panic!("expected document, got {other:?}"),
    }
}

// ============================================================
// Transport failures
// ============================================================

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Port 9 (discard) is not served in the test environment.
    let api = HttpProjectApi::new("http://127.0.0.1:9", &ServerConfig::default()).unwrap();
    let err = api.execute(PROJECT, &Action::FetchTask).await.unwrap_err();
    assert!(err.is_network_error(), "got {err:?}");
}

#[tokio::test]
async fn test_configured_timeout_is_enforced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projekt/4/analysieren"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<p>spät</p>")
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = ServerConfig {
        timeout_secs: Some(1),
        ..ServerConfig::default()
    };
    let api = HttpProjectApi::new(server.uri(), &config).unwrap();
    let err = api.execute(PROJECT, &Action::RunAnalysis).await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(_)), "got {err:?}");
}
