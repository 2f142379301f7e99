use std::sync::Arc;
use std::time::Duration;

use ocr_core::{JobHandle, SelectedFile, UploadedRef};
use ocr_engine::{FailureKind, OcrTransport, ReqwestTransport, ServiceConfig};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_for(server: &MockServer) -> ReqwestTransport {
    let config = ServiceConfig::with_base_url(server.uri());
    ReqwestTransport::new(Arc::new(config)).expect("client builds")
}

fn invoice() -> SelectedFile {
    SelectedFile::new("invoice.pdf", b"%PDF-1.7 fake".to_vec()).expect("pdf accepted")
}

fn uploaded_invoice() -> UploadedRef {
    UploadedRef {
        file_path: "uploads/invoice.pdf".to_string(),
        file_type: "pdf".to_string(),
    }
}

#[tokio::test]
async fn upload_returns_server_reference() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(body_string_contains("filename=\"invoice.pdf\""))
        .and(body_string_contains("%PDF-1.7 fake"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "file_path": "uploads/invoice.pdf",
            "file_type": "pdf",
            "filename": "invoice.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uploaded = transport_for(&server)
        .upload(&invoice())
        .await
        .expect("upload ok");
    assert_eq!(uploaded, uploaded_invoice());
}

#[tokio::test]
async fn upload_rejection_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": "disk full"
        })))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .upload(&invoice())
        .await
        .expect_err("rejected");
    assert_eq!(err.kind, FailureKind::Rejected);
    assert_eq!(err.user_message().as_deref(), Some("disk full"));
}

#[tokio::test]
async fn start_job_posts_reference_and_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ocr"))
        .and(body_json(json!({
            "file_path": "uploads/invoice.pdf",
            "file_type": "pdf",
            "prompt": "<image>\nFree OCR."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "running",
            "task_id": "abc123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job = transport_for(&server)
        .start_job(&uploaded_invoice(), "<image>\nFree OCR.")
        .await
        .expect("job started");
    assert_eq!(job, JobHandle::new("abc123"));
}

#[tokio::test]
async fn start_job_without_task_id_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ocr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "running" })))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .start_job(&uploaded_invoice(), "prompt")
        .await
        .expect_err("no task id");
    assert_eq!(err.kind, FailureKind::MalformedResponse);
}

#[tokio::test]
async fn start_job_error_status_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ocr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": "model not loaded"
        })))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .start_job(&uploaded_invoice(), "prompt")
        .await
        .expect_err("rejected");
    assert_eq!(err.kind, FailureKind::Rejected);
    assert_eq!(err.message, "model not loaded");
}

#[tokio::test]
async fn fetch_result_returns_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/result/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "content": "# Invoice 42",
            "output_file": "outputs/abc123.md"
        })))
        .mount(&server)
        .await;

    let content = transport_for(&server)
        .fetch_result(&JobHandle::new("abc123"))
        .await
        .expect("result");
    assert_eq!(content, "# Invoice 42");
}

#[tokio::test]
async fn http_errors_map_to_status_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/result/abc123"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .fetch_result(&JobHandle::new("abc123"))
        .await
        .expect_err("server error");
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert!(err.user_message().is_some());
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/result/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .fetch_result(&JobHandle::new("abc123"))
        .await
        .expect_err("not json");
    assert_eq!(err.kind, FailureKind::MalformedResponse);
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "backend": "ok", "vllm": "ok" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = ServiceConfig {
        request_timeout_secs: 1,
        ..ServiceConfig::with_base_url(server.uri())
    };
    let transport = ReqwestTransport::new(Arc::new(config)).expect("client builds");
    let err = transport.health().await.expect_err("timed out");
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn health_and_model_status_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "backend": "ok", "vllm": "ok" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/model/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ready",
            "ready": true,
            "message": "Model is ready",
            "model": "deepseek-ai/DeepSeek-OCR"
        })))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let health = transport.health().await.expect("health");
    assert_eq!(health.backend, "ok");
    assert_eq!(health.vllm, "ok");

    let model = transport.model_status().await.expect("model status");
    assert!(model.ready);
    assert_eq!(model.model.as_deref(), Some("deepseek-ai/DeepSeek-OCR"));
}
