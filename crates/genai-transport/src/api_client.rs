//! # API Client
//!
//! Executes [`HttpRequestDescriptor`]s against the selected backend.
//!
//! URL layout: `{base_url}{api_version}/{resource prefix}{path}?{query}`. The
//! managed backend scopes paths under `projects/{p}/locations/{l}/` unless the path
//! is already project-qualified, the client runs in express (API-key) mode, or the
//! path lists the public base-model catalogue.
//!
//! Every call runs inside a [`CancelScope`]: the descriptor's timeout (or the
//! client default) and its cancellation token race the network I/O.

use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use genai_core::{BackendTarget, GenAiError, HttpMethod, HttpRequestDescriptor, RequestOptions, Result};
use genai_settings::ClientSettings;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::auth::{AuthProvider, auth_from_settings};
use crate::cancel::CancelScope;
use crate::sse::json_stream;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Direct backend base URL.
pub const DIRECT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
/// Direct backend API version.
pub const DIRECT_API_VERSION: &str = "v1beta";
/// Managed backend base URL for the `global` location and express mode.
pub const MANAGED_GLOBAL_BASE_URL: &str = "https://aiplatform.googleapis.com/";
/// Managed backend API version.
pub const MANAGED_API_VERSION: &str = "v1beta1";

/// Resumable upload status response header.
pub const UPLOAD_STATUS_HEADER: &str = "x-goog-upload-status";
/// Resumable upload session URL response header.
pub const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
const BASE_MODEL_CATALOGUE: &str = "publishers/google/models";

/// Base URL for the managed backend in `location`.
pub fn managed_base_url(location: &str) -> String {
    if location == "global" {
        MANAGED_GLOBAL_BASE_URL.to_string()
    } else {
        format!("https://{location}-aiplatform.googleapis.com/")
    }
}

/// Response of one resumable-upload call.
#[derive(Clone, Debug, Default)]
pub struct UploadResponse {
    /// `x-goog-upload-status`, when the server sent one.
    pub status: Option<String>,
    /// JSON body (`Null` when empty).
    pub body: Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP transport bound to one backend.
///
/// Base URL, version, and default headers are fixed at construction and read-only
/// afterwards; the client is cheap to clone and safe to share.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    auth: Arc<dyn AuthProvider>,
    backend: BackendTarget,
    base_url: String,
    api_version: String,
    project: Option<String>,
    location: String,
    express: bool,
    default_headers: HeaderMap,
    timeout_ms: Option<u64>,
    settings: Arc<ClientSettings>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| GenAiError::Config {
        message: format!("invalid header name '{name}': {e}"),
    })
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| GenAiError::Config {
        message: format!("invalid header value: {e}"),
    })
}

fn extend_headers<'a>(
    headers: &mut HeaderMap,
    extra: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> Result<()> {
    for (name, value) in extra {
        let _ = headers.insert(header_name(name)?, header_value(value)?);
    }
    Ok(())
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Turn a non-2xx response into [`GenAiError::Api`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let err = GenAiError::from_error_body(status.as_u16(), &body);
    error!(status = status.as_u16(), error = %err, "API request failed");
    Err(err)
}

async fn read_json(response: reqwest::Response) -> Result<Value> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| GenAiError::transport("failed to read response body", e))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    Ok(serde_json::from_slice(&bytes)?)
}

impl ApiClient {
    /// Build a client from settings, choosing the auth provider they imply.
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let http = reqwest::Client::new();
        let auth = auth_from_settings(&settings, &http)?;
        Self::with_auth(settings, http, auth)
    }

    /// Build a client with an explicit auth provider.
    pub fn with_auth(
        settings: ClientSettings,
        http: reqwest::Client,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self> {
        settings.validate()?;
        let backend = settings.backend();
        let express = settings.is_express();
        let location = settings.location_or_default().to_string();
        let base_url = match (&settings.http.base_url, backend) {
            (Some(url), _) => url.clone(),
            (None, BackendTarget::Direct) => DIRECT_BASE_URL.to_string(),
            (None, BackendTarget::Managed) if express => MANAGED_GLOBAL_BASE_URL.to_string(),
            (None, BackendTarget::Managed) => managed_base_url(&location),
        };
        let api_version = settings.http.api_version.clone().unwrap_or_else(|| {
            match backend {
                BackendTarget::Direct => DIRECT_API_VERSION,
                BackendTarget::Managed => MANAGED_API_VERSION,
            }
            .to_string()
        });

        let mut default_headers = HeaderMap::new();
        let _ = default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let agent = format!("genai-rs/{SDK_VERSION}");
        let _ = default_headers.insert(USER_AGENT, header_value(&agent)?);
        let _ = default_headers.insert("x-goog-api-client", header_value(&agent)?);
        extend_headers(&mut default_headers, &settings.http.headers)?;

        debug!(%backend, %base_url, %api_version, express, "API client configured");
        Ok(Self {
            http,
            auth,
            backend,
            base_url,
            api_version,
            project: settings.project.clone(),
            location,
            express,
            default_headers,
            timeout_ms: settings.http.timeout_ms,
            settings: Arc::new(settings),
        })
    }

    /// Backend this client targets.
    pub fn backend(&self) -> BackendTarget {
        self.backend
    }

    /// Base URL, always ending with `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// API version segment.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Managed project, if configured.
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// Managed location (`global` when unset).
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Managed express mode (API key, no project scoping).
    pub fn is_express(&self) -> bool {
        self.express
    }

    /// Settings this client was built from.
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Auth provider used for every request.
    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    /// Client-wide default timeout.
    pub fn default_timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }

    /// Resource prefix for `path` (`projects/{p}/locations/{l}/` or empty).
    pub fn resource_prefix(&self, path: &str) -> String {
        if self.backend == BackendTarget::Direct
            || self.express
            || path.starts_with("projects/")
            || path == BASE_MODEL_CATALOGUE
        {
            return String::new();
        }
        match &self.project {
            Some(project) => format!("projects/{project}/locations/{}/", self.location),
            None => String::new(),
        }
    }

    /// Full URL for a descriptor path, without query.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}{}/{}{}",
            self.base_url,
            self.api_version,
            self.resource_prefix(path),
            path
        )
    }

    /// Default headers plus per-call headers plus auth.
    pub async fn headers(&self, options: &RequestOptions) -> Result<HeaderMap> {
        let mut headers = self.default_headers.clone();
        extend_headers(&mut headers, &options.headers)?;
        self.auth.add_auth_headers(&mut headers).await?;
        Ok(headers)
    }

    pub(crate) fn scope(&self, options: &RequestOptions) -> CancelScope {
        CancelScope::new(options, self.timeout_ms)
    }

    async fn send(
        &self,
        descriptor: &HttpRequestDescriptor,
        extra_query: Option<(&str, &str)>,
    ) -> Result<reqwest::Response> {
        let url = self.url_for(&descriptor.path);
        let headers = self.headers(&descriptor.options).await?;
        let mut builder = self
            .http
            .request(reqwest_method(descriptor.http_method), &url)
            .headers(headers)
            .query(&descriptor.query_params);
        if let Some(pair) = extra_query {
            builder = builder.query(&[pair]);
        }
        if let Some(body) = &descriptor.body {
            builder = builder.json(body);
        }
        debug!(method = descriptor.http_method.as_str(), %url, "sending request");
        let response = builder
            .send()
            .await
            .map_err(|e| GenAiError::transport(format!("request to {url} failed"), e))?;
        check_status(response).await
    }

    /// Issue a unary request and return the JSON body (`{}` when empty).
    #[instrument(skip_all, fields(backend = %self.backend, path = %descriptor.path))]
    pub async fn request(&self, descriptor: HttpRequestDescriptor) -> Result<Value> {
        let scope = self.scope(&descriptor.options);
        scope
            .run(async {
                let response = self.send(&descriptor, None).await?;
                read_json(response).await
            })
            .await
    }

    /// Issue a streaming request (`alt=sse`) and return its chunks.
    ///
    /// The returned stream is finite and single-consumer; dropping it releases the
    /// connection. The request timeout covers the whole stream.
    #[instrument(skip_all, fields(backend = %self.backend, path = %descriptor.path))]
    pub async fn stream(
        &self,
        descriptor: HttpRequestDescriptor,
    ) -> Result<BoxStream<'static, Result<Value>>> {
        let scope = self.scope(&descriptor.options);
        let response = scope
            .run(self.send(&descriptor, Some(("alt", "sse"))))
            .await?;
        Ok(scope.guard_stream(json_stream(response.bytes_stream())).boxed())
    }

    /// Open a resumable upload session and return its session URL.
    #[instrument(skip_all, fields(size_bytes = size_bytes))]
    pub async fn upload_start(
        &self,
        metadata: &Value,
        size_bytes: u64,
        mime_type: &str,
        options: &RequestOptions,
    ) -> Result<String> {
        let url = format!("{}upload/{}/files", self.base_url, self.api_version);
        let mut headers = self.headers(options).await?;
        let _ = headers.insert("x-goog-upload-protocol", HeaderValue::from_static("resumable"));
        let _ = headers.insert("x-goog-upload-command", HeaderValue::from_static("start"));
        let _ = headers.insert(
            "x-goog-upload-header-content-length",
            HeaderValue::from(size_bytes),
        );
        let _ = headers.insert("x-goog-upload-header-content-type", header_value(mime_type)?);

        self.scope(options)
            .run(async {
                let response = self
                    .http
                    .post(&url)
                    .headers(headers)
                    .json(metadata)
                    .send()
                    .await
                    .map_err(|e| GenAiError::transport("upload start failed", e))?;
                let response = check_status(response).await?;
                response
                    .headers()
                    .get(UPLOAD_URL_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from)
                    .ok_or_else(|| GenAiError::UploadIncomplete {
                        message: "server did not return an upload URL".into(),
                    })
            })
            .await
    }

    /// Send one upload chunk at `offset`.
    pub async fn upload_chunk(
        &self,
        upload_url: &str,
        chunk: Bytes,
        offset: u64,
        finalize: bool,
        options: &RequestOptions,
    ) -> Result<UploadResponse> {
        let mut headers = self.headers(options).await?;
        let command = if finalize { "upload, finalize" } else { "upload" };
        let _ = headers.insert("x-goog-upload-command", HeaderValue::from_static(command));
        let _ = headers.insert("x-goog-upload-offset", HeaderValue::from(offset));
        let _ = headers.remove(CONTENT_TYPE);

        let response = self
            .http
            .post(upload_url)
            .headers(headers)
            .body(chunk)
            .send()
            .await
            .map_err(|e| GenAiError::transport("upload chunk failed", e))?;
        let response = check_status(response).await?;
        let status = response
            .headers()
            .get(UPLOAD_STATUS_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenAiError::transport("failed to read upload response", e))?;
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok(UploadResponse { status, body })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn direct_settings(server: &MockServer) -> ClientSettings {
        let mut settings = ClientSettings::direct("test-key");
        settings.http.base_url = Some(format!("{}/", server.uri()));
        settings
    }

    fn managed(location: &str) -> ApiClient {
        let mut settings = ClientSettings::managed("proj", location);
        settings.access_token = Some("tok".into());
        ApiClient::new(settings).unwrap()
    }

    // ── URL layout ──

    #[test]
    fn direct_defaults() {
        let client = ApiClient::new(ClientSettings::direct("k")).unwrap();
        assert_eq!(client.base_url(), DIRECT_BASE_URL);
        assert_eq!(
            client.url_for("models/gemini:generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini:generateContent"
        );
    }

    #[test]
    fn managed_regional_url_is_project_scoped() {
        let client = managed("us-central1");
        assert_eq!(
            client.url_for("publishers/google/models/gemini:generateContent"),
            "https://us-central1-aiplatform.googleapis.com/v1beta1/projects/proj/locations/us-central1/publishers/google/models/gemini:generateContent"
        );
    }

    #[test]
    fn managed_global_and_qualified_paths() {
        let client = managed("global");
        assert_eq!(client.base_url(), MANAGED_GLOBAL_BASE_URL);
        assert_eq!(
            client.url_for("projects/other/locations/x/cachedContents/c"),
            "https://aiplatform.googleapis.com/v1beta1/projects/other/locations/x/cachedContents/c"
        );
        assert_eq!(
            client.url_for("publishers/google/models"),
            "https://aiplatform.googleapis.com/v1beta1/publishers/google/models"
        );
    }

    #[test]
    fn express_mode_skips_prefix() {
        let mut settings = ClientSettings::direct("k");
        settings.vertexai = true;
        let client = ApiClient::new(settings).unwrap();
        assert!(client.is_express());
        assert_eq!(
            client.url_for("publishers/google/models/m:generateContent"),
            "https://aiplatform.googleapis.com/v1beta1/publishers/google/models/m:generateContent"
        );
    }

    #[test]
    fn invalid_settings_rejected() {
        assert_matches!(
            ApiClient::new(ClientSettings::default()),
            Err(GenAiError::Config { .. })
        );
    }

    // ── unary ──

    #[tokio::test]
    async fn request_sends_headers_query_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/m:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(header("content-type", "application/json"))
            .and(header("x-custom", "1"))
            .and(query_param("pageSize", "5"))
            .and(body_json(json!({"contents": []})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let mut settings = direct_settings(&server);
        let _ = settings.http.headers.insert("x-custom".into(), "1".into());
        let client = ApiClient::new(settings).unwrap();
        let mut descriptor = HttpRequestDescriptor::post("models/m:generateContent", json!({"contents": []}));
        let _ = descriptor.query_params.insert("pageSize".into(), "5".into());
        let value = client.request(descriptor).await.unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn empty_body_is_empty_object() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1beta/files/abc"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = ApiClient::new(direct_settings(&server)).unwrap();
        let mut descriptor = HttpRequestDescriptor::get("files/abc");
        descriptor.http_method = HttpMethod::Delete;
        assert_eq!(client.request(descriptor).await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn error_envelope_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string(
                r#"{"error":{"code":404,"message":"not found","status":"NOT_FOUND"}}"#,
            ))
            .mount(&server)
            .await;

        let client = ApiClient::new(direct_settings(&server)).unwrap();
        let err = client
            .request(HttpRequestDescriptor::get("models/missing"))
            .await
            .unwrap_err();
        assert_matches!(err, GenAiError::Api { status: 404, ref code, .. } if code.as_deref() == Some("NOT_FOUND"));
    }

    #[tokio::test]
    async fn connection_failure_is_transport_error() {
        let mut settings = ClientSettings::direct("k");
        settings.http.base_url = Some("http://127.0.0.1:1/".into());
        let client = ApiClient::new(settings).unwrap();
        let err = client.request(HttpRequestDescriptor::get("models")).await.unwrap_err();
        assert_matches!(err, GenAiError::Transport { .. });
        assert!(err.status().is_none());
    }

    #[tokio::test]
    async fn timeout_fires() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = ApiClient::new(direct_settings(&server)).unwrap();
        let descriptor = HttpRequestDescriptor::get("models").with_options(RequestOptions::with_timeout(50));
        assert_matches!(
            client.request(descriptor).await,
            Err(GenAiError::Timeout { timeout_ms: 50 })
        );
    }

    #[tokio::test]
    async fn external_cancel_aborts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = ApiClient::new(direct_settings(&server)).unwrap();
        let token = CancellationToken::new();
        let descriptor =
            HttpRequestDescriptor::get("models").with_options(RequestOptions::with_cancel(token.clone()));
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        assert_matches!(client.request(descriptor).await, Err(GenAiError::Cancelled));
        canceller.await.unwrap();
    }

    // ── streaming ──

    #[tokio::test]
    async fn stream_forces_sse_and_yields_chunks() {
        let server = MockServer::start().await;
        let body = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"a\"}]}}]}\n\n\
                    data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"b\"}]}}]}\n\n";
        Mock::given(method("POST"))
            .and(path("/v1beta/models/m:streamGenerateContent"))
            .and(query_param("alt", "sse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(direct_settings(&server)).unwrap();
        let stream = client
            .stream(HttpRequestDescriptor::post("models/m:streamGenerateContent", json!({})))
            .await
            .unwrap();
        let chunks: Vec<_> = stream.collect().await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[1].as_ref().unwrap()["candidates"][0]["content"]["parts"][0]["text"],
            "b"
        );
    }

    #[tokio::test]
    async fn stream_error_status_fails_before_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"error":{"code":400,"message":"bad","status":"INVALID_ARGUMENT"}}"#,
            ))
            .mount(&server)
            .await;

        let client = ApiClient::new(direct_settings(&server)).unwrap();
        let result = client
            .stream(HttpRequestDescriptor::post("models/m:streamGenerateContent", json!({})))
            .await;
        assert!(matches!(result, Err(GenAiError::Api { status: 400, .. })));
    }

    #[tokio::test]
    async fn stream_truncation_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("data: {\"a\":1}\n\ndata: {\"a\""))
            .mount(&server)
            .await;

        let client = ApiClient::new(direct_settings(&server)).unwrap();
        let chunks: Vec<_> = client
            .stream(HttpRequestDescriptor::post("models/m:streamGenerateContent", json!({})))
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(chunks.len(), 2);
        assert_matches!(chunks[1], Err(GenAiError::StreamFraming { .. }));
    }

    // ── upload start ──

    #[tokio::test]
    async fn upload_start_returns_session_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/v1beta/files"))
            .and(header("x-goog-upload-protocol", "resumable"))
            .and(header("x-goog-upload-command", "start"))
            .and(header("x-goog-upload-header-content-length", "11"))
            .and(header("x-goog-upload-header-content-type", "text/plain"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("x-goog-upload-url", "https://upload/session"),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(direct_settings(&server)).unwrap();
        let url = client
            .upload_start(&json!({"file": {}}), 11, "text/plain", &RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(url, "https://upload/session");
    }

    #[tokio::test]
    async fn upload_start_without_url_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = ApiClient::new(direct_settings(&server)).unwrap();
        let result = client
            .upload_start(&json!({}), 0, "text/plain", &RequestOptions::default())
            .await;
        assert_matches!(result, Err(GenAiError::UploadIncomplete { .. }));
    }
}
