//! # Authentication
//!
//! Pluggable header injection, chosen once per client from settings:
//!
//! - [`ApiKeyAuth`]: `x-goog-api-key` (direct backend, managed express mode)
//! - [`BearerTokenAuth`]: static OAuth access token
//! - [`ServiceAccountAuth`]: RS256 JWT bearer grant against the token endpoint,
//!   cached in memory and refreshed 5 minutes before expiry

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use genai_core::{GenAiError, Result};
use genai_settings::ClientSettings;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
/// Refresh this many seconds before the cached token expires.
const TOKEN_REFRESH_WINDOW_SECS: i64 = 300;
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Adds credentials to outgoing request headers.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Insert auth headers, refreshing credentials first if needed.
    async fn add_auth_headers(&self, headers: &mut HeaderMap) -> Result<()>;

    /// Credentials for a WebSocket URL query (`key=...`), for providers that use one.
    fn api_key(&self) -> Option<&str> {
        None
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value).map_err(|e| GenAiError::Config {
        message: format!("credential is not a valid header value: {e}"),
    })?;
    value.set_sensitive(true);
    Ok(value)
}

fn bearer(token: &str) -> Result<HeaderValue> {
    header_value(&format!("Bearer {token}"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Static credentials
// ─────────────────────────────────────────────────────────────────────────────

/// API key authentication.
#[derive(Clone)]
pub struct ApiKeyAuth {
    api_key: String,
}

impl ApiKeyAuth {
    /// Authenticate with `api_key`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth").finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProvider for ApiKeyAuth {
    async fn add_auth_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        let _ = headers.insert(API_KEY_HEADER, header_value(&self.api_key)?);
        Ok(())
    }

    fn api_key(&self) -> Option<&str> {
        Some(&self.api_key)
    }
}

/// Static bearer token authentication.
#[derive(Clone)]
pub struct BearerTokenAuth {
    token: String,
}

impl BearerTokenAuth {
    /// Authenticate with a pre-issued access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for BearerTokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerTokenAuth").finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProvider for BearerTokenAuth {
    async fn add_auth_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        let _ = headers.insert(AUTHORIZATION, bearer(&self.token)?);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service account
// ─────────────────────────────────────────────────────────────────────────────

/// Fields of a service-account JSON key used by the JWT bearer grant.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    /// Service account email, the JWT issuer.
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// Token endpoint.
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountCredentials {
    /// Parse a service-account JSON key.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GenAiError::Config {
            message: format!("invalid service account JSON: {e}"),
        })
    }

    /// Read and parse a service-account JSON key file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| GenAiError::Config {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_json(&json)
    }

    fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    token: String,
    expires_at: i64,
}

/// Service-account authentication with in-memory token caching.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
    signed_assertion: Option<String>,
}

impl std::fmt::Debug for ServiceAccountAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountAuth")
            .field("client_email", &self.credentials.client_email)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountAuth {
    /// Provider for `credentials`.
    pub fn new(credentials: ServiceAccountCredentials, http: reqwest::Client) -> Self {
        Self {
            credentials,
            http,
            cached: Mutex::new(None),
            signed_assertion: None,
        }
    }

    /// Use a pre-signed JWT assertion instead of signing with the private key
    /// (e.g. when signing happens in a key management service).
    #[must_use]
    pub fn with_signed_assertion(mut self, assertion: impl Into<String>) -> Self {
        self.signed_assertion = Some(assertion.into());
        self
    }

    fn assertion(&self, now: i64) -> Result<String> {
        if let Some(assertion) = &self.signed_assertion {
            return Ok(assertion.clone());
        }
        let claims = Claims {
            iss: &self.credentials.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: self.credentials.token_uri(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes()).map_err(
            |e| GenAiError::Config {
                message: format!("invalid RSA private key: {e}"),
            },
        )?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key).map_err(|e| {
            GenAiError::Config {
                message: format!("failed to sign JWT: {e}"),
            }
        })
    }

    #[instrument(skip_all, fields(client_email = %self.credentials.client_email))]
    async fn fetch_token(&self) -> Result<CachedToken> {
        let now = chrono::Utc::now().timestamp();
        let assertion = self.assertion(now)?;
        let form = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];
        let response = self
            .http
            .post(self.credentials.token_uri())
            .form(&form)
            .send()
            .await
            .map_err(|e| GenAiError::transport("token endpoint request failed", e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::from_error_body(status.as_u16(), &body));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GenAiError::transport("invalid token endpoint response", e))?;
        debug!(expires_in = token.expires_in, "access token refreshed");
        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + token.expires_in,
        })
    }

    /// Current access token, refreshed when within 5 minutes of expiry.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = chrono::Utc::now().timestamp();
        if let Some(token) = cached.as_ref() {
            if token.expires_at - TOKEN_REFRESH_WINDOW_SECS > now {
                return Ok(token.token.clone());
            }
        }
        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

#[async_trait]
impl AuthProvider for ServiceAccountAuth {
    async fn add_auth_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        let token = self.access_token().await?;
        let _ = headers.insert(AUTHORIZATION, bearer(&token)?);
        Ok(())
    }
}

/// Choose the provider implied by `settings`.
///
/// Precedence: API key, static access token, service-account key file.
pub fn auth_from_settings(
    settings: &ClientSettings,
    http: &reqwest::Client,
) -> Result<Arc<dyn AuthProvider>> {
    if let Some(key) = &settings.api_key {
        return Ok(Arc::new(ApiKeyAuth::new(key.clone())));
    }
    if let Some(token) = &settings.access_token {
        return Ok(Arc::new(BearerTokenAuth::new(token.clone())));
    }
    if let Some(path) = &settings.service_account_file {
        let credentials = ServiceAccountCredentials::from_file(Path::new(path))?;
        return Ok(Arc::new(ServiceAccountAuth::new(credentials, http.clone())));
    }
    Err(GenAiError::Config {
        message: format!("no credentials configured for the {} backend", settings.backend()),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials(token_uri: &str) -> ServiceAccountCredentials {
        ServiceAccountCredentials {
            client_email: "svc@project.iam.gserviceaccount.com".into(),
            private_key: "not a key".into(),
            token_uri: Some(token_uri.into()),
        }
    }

    #[tokio::test]
    async fn api_key_header() {
        let mut headers = HeaderMap::new();
        ApiKeyAuth::new("k-123").add_auth_headers(&mut headers).await.unwrap();
        assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "k-123");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn bearer_header() {
        let mut headers = HeaderMap::new();
        BearerTokenAuth::new("tok").add_auth_headers(&mut headers).await.unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
    }

    #[tokio::test]
    async fn invalid_header_value_is_config_error() {
        let mut headers = HeaderMap::new();
        let result = ApiKeyAuth::new("bad\nkey").add_auth_headers(&mut headers).await;
        assert_matches!(result, Err(GenAiError::Config { .. }));
    }

    #[test]
    fn debug_hides_secrets() {
        let rendered = format!("{:?}", ApiKeyAuth::new("secret"));
        assert!(!rendered.contains("secret"));
    }

    #[tokio::test]
    async fn service_account_token_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("assertion=signed.jwt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "ya29.x", "expires_in": 3600})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let auth = ServiceAccountAuth::new(
            credentials(&format!("{}/token", server.uri())),
            reqwest::Client::new(),
        )
        .with_signed_assertion("signed.jwt");

        let mut headers = HeaderMap::new();
        auth.add_auth_headers(&mut headers).await.unwrap();
        auth.add_auth_headers(&mut headers).await.unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer ya29.x");
    }

    #[tokio::test]
    async fn service_account_refreshes_near_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "short", "expires_in": 60})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let auth = ServiceAccountAuth::new(
            credentials(&format!("{}/token", server.uri())),
            reqwest::Client::new(),
        )
        .with_signed_assertion("a");
        assert_eq!(auth.access_token().await.unwrap(), "short");
        assert_eq!(auth.access_token().await.unwrap(), "short");
    }

    #[tokio::test]
    async fn token_endpoint_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"error":{"code":401,"message":"invalid_grant","status":"UNAUTHENTICATED"}}"#,
            ))
            .mount(&server)
            .await;

        let auth = ServiceAccountAuth::new(
            credentials(&format!("{}/token", server.uri())),
            reqwest::Client::new(),
        )
        .with_signed_assertion("a");
        assert_matches!(auth.access_token().await, Err(GenAiError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn malformed_private_key_is_config_error() {
        let auth = ServiceAccountAuth::new(credentials("http://127.0.0.1:1/token"), reqwest::Client::new());
        assert_matches!(auth.access_token().await, Err(GenAiError::Config { .. }));
    }

    #[test]
    fn provider_precedence() {
        let http = reqwest::Client::new();
        let direct = auth_from_settings(&ClientSettings::direct("k"), &http).unwrap();
        assert_eq!(direct.api_key(), Some("k"));

        let mut managed = ClientSettings::managed("p", "l");
        managed.access_token = Some("t".into());
        assert!(auth_from_settings(&managed, &http).unwrap().api_key().is_none());

        let bare = ClientSettings::managed("p", "l");
        assert!(matches!(auth_from_settings(&bare, &http), Err(GenAiError::Config { .. })));
    }

    #[test]
    fn service_account_file_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"client_email": "svc@x", "private_key": "pem", "type": "service_account"}}"#
        )
        .unwrap();
        let credentials = ServiceAccountCredentials::from_file(file.path()).unwrap();
        assert_eq!(credentials.client_email, "svc@x");
        assert_eq!(credentials.token_uri(), DEFAULT_TOKEN_URI);

        let mut settings = ClientSettings::managed("p", "l");
        settings.service_account_file = Some(file.path().display().to_string());
        assert!(auth_from_settings(&settings, &reqwest::Client::new()).is_ok());
    }
}
