#![allow(missing_docs, unused_results)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use assert_matches::assert_matches;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use genai::types::{
    AutomaticFunctionCallingConfig, CallableTool, Content, FunctionCall, FunctionDeclaration,
    GenerateContentConfig, GenerateContentParameters, ListModelsConfig, Part, Tool, ToolUnion,
    UploadFileConfig,
};
use genai::{Client, ClientSettings, GenAiError};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> ClientSettings {
    let mut settings = ClientSettings::direct("test-key");
    settings.http.base_url = Some(format!("{}/", server.uri()));
    settings.upload.initial_retry_delay_ms = 1;
    settings
}

fn client(server: &MockServer) -> Client {
    Client::new(settings(server)).unwrap()
}

fn function_call_body() -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{"functionCall": {"name": "get_weather", "args": {"city": "Oslo"}}}]
            }
        }]
    })
}

fn text_body(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

struct Weather {
    calls: AtomicUsize,
}

#[async_trait]
impl CallableTool for Weather {
    fn declaration(&self) -> Tool {
        Tool::functions(vec![FunctionDeclaration::new(
            "get_weather",
            "Current weather for a city",
            json!({"type": "OBJECT", "properties": {"city": {"type": "STRING"}}}),
        )])
    }

    async fn call_tool(&self, calls: &[FunctionCall]) -> genai::Result<Vec<Part>> {
        self.calls.fetch_add(calls.len(), Ordering::SeqCst);
        Ok(calls
            .iter()
            .map(|_| Part::function_response("get_weather", json!({"output": "21C"})))
            .collect())
    }
}

fn afc_request(tool: Arc<Weather>, max_remote_calls: Option<f64>) -> GenerateContentParameters {
    GenerateContentParameters::new("gemini-2.0-flash", vec![Content::user_text("weather in Oslo?")])
        .with_config(GenerateContentConfig {
            tools: Some(vec![ToolUnion::Callable(tool)]),
            automatic_function_calling: Some(AutomaticFunctionCallingConfig {
                maximum_remote_calls: max_remote_calls,
                ..AutomaticFunctionCallingConfig::default()
            }),
            ..GenerateContentConfig::default()
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Content generation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_content_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_string_contains("hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .models()
        .generate_content(GenerateContentParameters::new(
            "gemini-2.0-flash",
            vec![Content::user_text("hello")],
        ))
        .await
        .unwrap();
    assert_eq!(response.text().as_deref(), Some("hi there"));
    assert!(response.automatic_function_calling_history.is_none());
}

#[tokio::test]
async fn afc_performs_exactly_ceiling_rounds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call_body()))
        .expect(2)
        .mount(&server)
        .await;

    let tool = Arc::new(Weather { calls: AtomicUsize::new(0) });
    let response = client(&server)
        .models()
        .generate_content(afc_request(tool.clone(), Some(2.0)))
        .await
        .unwrap();
    assert_eq!(tool.calls.load(Ordering::SeqCst), 2);
    assert_eq!(response.function_calls().len(), 1);
}

#[tokio::test]
async fn afc_resubmits_tool_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(body_string_contains("functionResponse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("It is 21C in Oslo.")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call_body()))
        .expect(1)
        .mount(&server)
        .await;

    let tool = Arc::new(Weather { calls: AtomicUsize::new(0) });
    let response = client(&server)
        .models()
        .generate_content(afc_request(tool.clone(), None))
        .await
        .unwrap();
    assert_eq!(response.text().as_deref(), Some("It is 21C in Oslo."));
    assert_eq!(response.automatic_function_calling_history.unwrap().len(), 3);
}

#[tokio::test]
async fn invalid_ceiling_falls_back_to_single_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call_body()))
        .expect(1)
        .mount(&server)
        .await;

    let tool = Arc::new(Weather { calls: AtomicUsize::new(0) });
    let response = client(&server)
        .models()
        .generate_content(afc_request(tool.clone(), Some(1.5)))
        .await
        .unwrap();
    assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    assert_eq!(response.function_calls().len(), 1);
}

#[tokio::test]
async fn duplicate_callable_names_rejected_before_request() {
    let server = MockServer::start().await;
    let first = Arc::new(Weather { calls: AtomicUsize::new(0) });
    let second = Arc::new(Weather { calls: AtomicUsize::new(0) });
    let params = GenerateContentParameters::new("gemini", vec![Content::user_text("?")]).with_config(
        GenerateContentConfig {
            tools: Some(vec![ToolUnion::Callable(first), ToolUnion::Callable(second)]),
            ..GenerateContentConfig::default()
        },
    );
    let result = client(&server).models().generate_content(params).await;
    assert_matches!(result, Err(GenAiError::InvalidRequest { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn stream_decodes_sse_chunks() {
    let server = MockServer::start().await;
    let body = format!(
        "data: {}\n\ndata: {}\n\n",
        text_body("Hel"),
        text_body("lo")
    );
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let stream = client(&server)
        .models()
        .generate_content_stream(GenerateContentParameters::new(
            "gemini",
            vec![Content::user_text("hi")],
        ))
        .await
        .unwrap();
    let texts: Vec<String> = stream
        .map(|chunk| chunk.unwrap().text().unwrap_or_default())
        .collect()
        .await;
    assert_eq!(texts, vec!["Hel", "lo"]);
}

#[tokio::test]
async fn stream_afc_round_trips_tool_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:streamGenerateContent"))
        .and(body_string_contains("functionResponse"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!("data: {}\n\n", text_body("21C")),
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!("data: {}\n\n", function_call_body()),
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let tool = Arc::new(Weather { calls: AtomicUsize::new(0) });
    let chunks: Vec<_> = client(&server)
        .models()
        .generate_content_stream(afc_request(tool.clone(), None))
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(Result::is_ok));
    assert_eq!(chunks[2].as_ref().unwrap().text().as_deref(), Some("21C"));
    assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn api_error_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_string(
            r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#,
        ))
        .mount(&server)
        .await;

    let err = client(&server)
        .models()
        .generate_content(GenerateContentParameters::new("gemini", vec![Content::user_text("x")]))
        .await
        .unwrap_err();
    assert_matches!(err, GenAiError::Api { status: 429, .. });
    assert!(err.is_retryable());
}

// ─────────────────────────────────────────────────────────────────────────────
// Pagination
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_models_walks_three_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(query_param("pageToken", "t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "models/c"}, {"name": "models/d"}],
            "nextPageToken": "t3"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(query_param("pageToken", "t3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "models/e"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "models/a"}, {"name": "models/b"}],
            "nextPageToken": "t2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pager = client(&server)
        .models()
        .list(ListModelsConfig {
            page_size: Some(2),
            ..ListModelsConfig::default()
        })
        .await
        .unwrap();
    assert_eq!(pager.page().len(), 2);
    assert!(pager.has_next_page());

    let names: Vec<String> = pager
        .into_stream()
        .map(|model| model.unwrap().name.unwrap_or_default())
        .collect()
        .await;
    assert_eq!(
        names,
        vec!["models/a", "models/b", "models/c", "models/d", "models/e"]
    );
}

#[tokio::test]
async fn next_page_on_last_page_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": [{"name": "models/a"}]})))
        .mount(&server)
        .await;

    let mut pager = client(&server)
        .models()
        .list(ListModelsConfig::default())
        .await
        .unwrap();
    assert_matches!(pager.next_page().await, Err(GenAiError::NoMorePages));
}

// ─────────────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────────────

async fn mount_upload_start(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .and(header("x-goog-upload-protocol", "resumable"))
        .and(header("x-goog-upload-command", "start"))
        .and(header("x-goog-upload-header-content-length", "6"))
        .and(header("x-goog-upload-header-content-type", "text/plain"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-goog-upload-url", format!("{}/upload-session/1", server.uri()).as_str()),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn upload_config() -> UploadFileConfig {
    UploadFileConfig {
        mime_type: Some("text/plain".into()),
        display_name: Some("notes".into()),
        ..UploadFileConfig::default()
    }
}

#[tokio::test]
async fn upload_active_then_final() {
    let server = MockServer::start().await;
    mount_upload_start(&server).await;
    Mock::given(method("POST"))
        .and(path("/upload-session/1"))
        .and(header("x-goog-upload-offset", "0"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-goog-upload-status", "active"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload-session/1"))
        .and(header("x-goog-upload-offset", "4"))
        .and(header("x-goog-upload-command", "upload, finalize"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-goog-upload-status", "final")
                .set_body_json(json!({"file": {
                    "name": "files/abc",
                    "displayName": "notes",
                    "mimeType": "text/plain",
                    "sizeBytes": "6",
                    "state": "ACTIVE"
                }})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.upload.chunk_size_bytes = 4;
    let file = Client::new(settings)
        .unwrap()
        .files()
        .upload(Bytes::from_static(b"abcdef"), upload_config())
        .await
        .unwrap();
    assert_eq!(file.name.as_deref(), Some("files/abc"));
    assert_eq!(file.display_name.as_deref(), Some("notes"));
    assert_eq!(file.size_bytes.as_deref(), Some("6"));
}

#[tokio::test]
async fn upload_never_final_is_incomplete() {
    let server = MockServer::start().await;
    mount_upload_start(&server).await;
    Mock::given(method("POST"))
        .and(path("/upload-session/1"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-goog-upload-status", "active"))
        .mount(&server)
        .await;

    let result = client(&server)
        .files()
        .upload(Bytes::from_static(b"abcdef"), upload_config())
        .await;
    assert_matches!(result, Err(GenAiError::UploadIncomplete { .. }));
}

#[tokio::test]
async fn upload_path_reads_file() {
    let server = MockServer::start().await;
    mount_upload_start(&server).await;
    Mock::given(method("POST"))
        .and(path("/upload-session/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-goog-upload-status", "final")
                .set_body_json(json!({"file": {"name": "files/xyz"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("notes.txt");
    std::fs::write(&file_path, b"abcdef").unwrap();
    let file = client(&server)
        .files()
        .upload_path(&file_path, UploadFileConfig {
            mime_type: Some("text/plain".into()),
            ..UploadFileConfig::default()
        })
        .await
        .unwrap();
    assert_eq!(file.name.as_deref(), Some("files/xyz"));

    let start = &server.received_requests().await.unwrap()[0];
    let metadata: serde_json::Value = serde_json::from_slice(&start.body).unwrap();
    assert_eq!(metadata["file"]["displayName"], "notes.txt");
}
