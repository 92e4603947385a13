//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a partial JSON
//! file fills the gaps with production defaults.

use std::collections::BTreeMap;

use genai_core::BackendTarget;
use genai_core::retry::{
    Backoff, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_RETRIES, DEFAULT_MULTIPLIER,
};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Hard ceiling for one resumable-upload chunk (8 MiB).
pub const MAX_UPLOAD_CHUNK_BYTES: usize = 8 * 1024 * 1024;

/// Default number of generation rounds for automatic function calling.
pub const DEFAULT_MAXIMUM_REMOTE_CALLS: u32 = 10;

/// Location used for the managed backend when none is configured.
pub const DEFAULT_LOCATION: &str = "global";

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP transport settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpSettings {
    /// Base URL override; must end with `/`.
    pub base_url: Option<String>,
    /// API version override (`v1beta` direct, `v1beta1` managed by default).
    pub api_version: Option<String>,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Default per-request timeout.
    pub timeout_ms: Option<u64>,
}

/// Resumable upload settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadSettings {
    /// Bytes per chunk; clamped to [`MAX_UPLOAD_CHUNK_BYTES`].
    pub chunk_size_bytes: usize,
    /// Attempts per chunk while the server reports no upload status.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_retry_delay_ms: u64,
    /// Delay growth factor.
    pub retry_multiplier: u32,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            chunk_size_bytes: MAX_UPLOAD_CHUNK_BYTES,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_retry_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            retry_multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl UploadSettings {
    /// Effective chunk size, never zero and never above the ceiling.
    #[must_use]
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size_bytes.clamp(1, MAX_UPLOAD_CHUNK_BYTES)
    }

    /// Retry schedule for chunk uploads.
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        Backoff {
            max_retries: self.max_retries,
            initial_delay_ms: self.initial_retry_delay_ms,
            multiplier: self.retry_multiplier,
        }
    }
}

/// Automatic function calling defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AfcSettings {
    /// Rounds per call when the request does not set its own ceiling.
    pub maximum_remote_calls: u32,
}

impl Default for AfcSettings {
    fn default() -> Self {
        Self {
            maximum_remote_calls: DEFAULT_MAXIMUM_REMOTE_CALLS,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Root
// ─────────────────────────────────────────────────────────────────────────────

/// Root client configuration.
///
/// Loaded from `~/.genai/settings.json` with defaults applied for missing fields;
/// environment variables override specific values. Passed by value to the client;
/// nothing here is global.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Target the managed backend instead of the direct one.
    pub vertexai: bool,
    /// API key (direct backend, or managed express mode).
    pub api_key: Option<String>,
    /// Cloud project (managed backend).
    pub project: Option<String>,
    /// Cloud location (managed backend).
    pub location: Option<String>,
    /// Static OAuth access token (managed backend).
    pub access_token: Option<String>,
    /// Path to a service-account JSON key (managed backend).
    pub service_account_file: Option<String>,
    /// HTTP transport.
    pub http: HttpSettings,
    /// Resumable uploads.
    pub upload: UploadSettings,
    /// Automatic function calling.
    pub automatic_function_calling: AfcSettings,
    /// Log level for the bundled subscriber.
    pub log_level: Option<String>,
}

impl ClientSettings {
    /// Settings for the direct backend with an API key.
    #[must_use]
    pub fn direct(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Settings for the managed backend scoped to a project and location.
    #[must_use]
    pub fn managed(project: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            vertexai: true,
            project: Some(project.into()),
            location: Some(location.into()),
            ..Self::default()
        }
    }

    /// The backend this configuration targets.
    #[must_use]
    pub fn backend(&self) -> BackendTarget {
        BackendTarget::from_vertexai(self.vertexai)
    }

    /// Managed location, defaulting to `global`.
    #[must_use]
    pub fn location_or_default(&self) -> &str {
        self.location.as_deref().unwrap_or(DEFAULT_LOCATION)
    }

    /// Managed express mode: API key without project scoping.
    #[must_use]
    pub fn is_express(&self) -> bool {
        self.vertexai && self.api_key.is_some() && self.project.is_none()
    }

    /// Check that the configuration is usable for its backend.
    pub fn validate(&self) -> Result<()> {
        match self.backend() {
            BackendTarget::Direct => {
                if self.api_key.is_none() {
                    return Err(SettingsError::InvalidValue(
                        "an API key is required for the direct backend".into(),
                    ));
                }
            }
            BackendTarget::Managed => {
                if self.api_key.is_some() && self.project.is_some() {
                    return Err(SettingsError::InvalidValue(
                        "project/location and API key are mutually exclusive".into(),
                    ));
                }
                if self.api_key.is_none() {
                    if self.project.is_none() {
                        return Err(SettingsError::InvalidValue(
                            "a project is required for the managed backend".into(),
                        ));
                    }
                    if self.access_token.is_none() && self.service_account_file.is_none() {
                        return Err(SettingsError::InvalidValue(
                            "an access token or service account file is required".into(),
                        ));
                    }
                }
            }
        }
        if let Some(base) = &self.http.base_url {
            if !base.ends_with('/') {
                return Err(SettingsError::InvalidValue(format!(
                    "base URL must end with '/': {base}"
                )));
            }
        }
        if self.upload.chunk_size_bytes > MAX_UPLOAD_CHUNK_BYTES {
            tracing::warn!(
                chunk_size_bytes = self.upload.chunk_size_bytes,
                "upload chunk size above 8 MiB, clamping"
            );
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults() {
        let s = ClientSettings::default();
        assert!(!s.vertexai);
        assert_eq!(s.backend(), BackendTarget::Direct);
        assert_eq!(s.upload.chunk_size_bytes, 8 * 1024 * 1024);
        assert_eq!(s.upload.max_retries, 3);
        assert_eq!(s.upload.initial_retry_delay_ms, 1000);
        assert_eq!(s.upload.retry_multiplier, 2);
        assert_eq!(s.automatic_function_calling.maximum_remote_calls, 10);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: ClientSettings =
            serde_json::from_str(r#"{"vertexai": true, "upload": {"maxRetries": 5}}"#).unwrap();
        assert_eq!(s.backend(), BackendTarget::Managed);
        assert_eq!(s.upload.max_retries, 5);
        assert_eq!(s.upload.chunk_size_bytes, MAX_UPLOAD_CHUNK_BYTES);
    }

    #[test]
    fn direct_requires_api_key() {
        assert_matches!(
            ClientSettings::default().validate(),
            Err(SettingsError::InvalidValue(_))
        );
        assert!(ClientSettings::direct("k").validate().is_ok());
    }

    #[test]
    fn managed_requires_credentials() {
        let mut s = ClientSettings::managed("p", "us-central1");
        assert!(s.validate().is_err());
        s.access_token = Some("t".into());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn managed_express_mode() {
        let s = ClientSettings {
            vertexai: true,
            api_key: Some("k".into()),
            ..ClientSettings::default()
        };
        assert!(s.is_express());
        assert!(s.validate().is_ok());
        assert_eq!(s.location_or_default(), "global");
    }

    #[test]
    fn managed_key_and_project_conflict() {
        let mut s = ClientSettings::managed("p", "l");
        s.api_key = Some("k".into());
        assert!(s.validate().is_err());
    }

    #[test]
    fn base_url_needs_trailing_slash() {
        let mut s = ClientSettings::direct("k");
        s.http.base_url = Some("http://localhost:8080".into());
        assert!(s.validate().is_err());
    }

    #[test]
    fn chunk_size_clamped() {
        let upload = UploadSettings {
            chunk_size_bytes: 64 * 1024 * 1024,
            ..UploadSettings::default()
        };
        assert_eq!(upload.effective_chunk_size(), MAX_UPLOAD_CHUNK_BYTES);
        let zero = UploadSettings {
            chunk_size_bytes: 0,
            ..UploadSettings::default()
        };
        assert_eq!(zero.effective_chunk_size(), 1);
    }
}
