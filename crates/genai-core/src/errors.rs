//! Error taxonomy for the genai client.
//!
//! Every failure carries enough structure (kind plus offending field or status)
//! for a caller to decide between "fix my request" and "retry transiently":
//!
//! - Configuration bugs: [`GenAiError::FieldNotSupported`],
//!   [`GenAiError::OperationNotSupported`], [`GenAiError::InvalidRequest`],
//!   [`GenAiError::Config`], [`GenAiError::LiveProtocol`]
//! - Backend rejections: [`GenAiError::Api`]
//! - Network failures before a status was obtained: [`GenAiError::Transport`],
//!   [`GenAiError::Timeout`]
//! - Byte-stream failures: [`GenAiError::StreamFraming`], [`GenAiError::UploadIncomplete`]

use serde_json::Value;
use thiserror::Error;

use crate::backend::BackendTarget;

/// Result type alias for genai operations.
pub type Result<T> = std::result::Result<T, GenAiError>;

/// Errors surfaced by the genai client.
#[derive(Debug, Error)]
pub enum GenAiError {
    /// A backend-exclusive field was supplied for the other backend.
    #[error("{field} parameter is not supported by the {backend} backend")]
    FieldNotSupported {
        /// Canonical path of the offending field.
        field: String,
        /// Backend the request was being encoded for.
        backend: BackendTarget,
    },

    /// A whole operation is unavailable on the selected backend.
    #[error("{operation} is not supported by the {backend} backend")]
    OperationNotSupported {
        /// Operation name (e.g. `files.upload`).
        operation: String,
        /// Backend the client targets.
        backend: BackendTarget,
    },

    /// The request could not be built (empty model name, path conflict, ...).
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Error description.
        message: String,
    },

    /// The backend rejected the request.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code (or the in-band `code` of a streamed error).
        status: u16,
        /// Error message from the error envelope.
        message: String,
        /// Symbolic status (e.g. `INVALID_ARGUMENT`), when present.
        code: Option<String>,
        /// Raw `details` array from the envelope, when present.
        details: Option<Value>,
    },

    /// Network-level failure before any HTTP status was obtained.
    #[error("transport error: {message}")]
    Transport {
        /// Error description.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The request-scoped timeout fired.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The caller's cancellation signal fired.
    #[error("request cancelled")]
    Cancelled,

    /// Malformed or truncated SSE byte stream.
    #[error("stream framing error: {message}")]
    StreamFraming {
        /// Error description.
        message: String,
    },

    /// Live protocol violation detected locally, or the session is unusable.
    #[error("live protocol error: {message}")]
    LiveProtocol {
        /// Error description.
        message: String,
    },

    /// Resumable upload ended without the server reporting `final`.
    #[error("upload incomplete: {message}")]
    UploadIncomplete {
        /// Error description.
        message: String,
    },

    /// `next_page()` was called with no cursor left.
    #[error("no more pages")]
    NoMorePages,

    /// Tool registry or tool invocation failure during automatic function calling.
    #[error("tool '{name}': {message}")]
    Tool {
        /// Function name.
        name: String,
        /// Error description.
        message: String,
    },

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Client configuration is invalid or could not be loaded.
    #[error("configuration error: {message}")]
    Config {
        /// Error description.
        message: String,
    },
}

impl GenAiError {
    /// Shorthand for [`GenAiError::InvalidRequest`].
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Shorthand for [`GenAiError::Transport`] with a source error.
    #[must_use]
    pub fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Shorthand for [`GenAiError::LiveProtocol`].
    #[must_use]
    pub fn live(message: impl Into<String>) -> Self {
        Self::LiveProtocol {
            message: message.into(),
        }
    }

    /// Build an [`GenAiError::Api`] from an HTTP status and a raw response body.
    ///
    /// Understands the `{"error": {"code", "message", "status", "details"}}`
    /// envelope; anything else becomes `HTTP {status}: {body}`.
    #[must_use]
    pub fn from_error_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(json) if json.get("error").is_some_and(Value::is_object) => {
                Self::from_error_envelope(status, &json["error"])
            }
            _ => Self::Api {
                status,
                message: format!("HTTP {status}: {body}"),
                code: None,
                details: None,
            },
        }
    }

    /// Build an [`GenAiError::Api`] from the inner `error` object of an envelope.
    #[must_use]
    pub fn from_error_envelope(status: u16, error: &Value) -> Self {
        let message = error["message"]
            .as_str()
            .unwrap_or("Unknown error")
            .to_string();
        let code = error["status"].as_str().map(String::from);
        let details = error.get("details").cloned();
        Self::Api {
            status,
            message,
            code,
            details,
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::FieldNotSupported { .. }
            | Self::OperationNotSupported { .. }
            | Self::InvalidRequest { .. }
            | Self::Cancelled
            | Self::StreamFraming { .. }
            | Self::LiveProtocol { .. }
            | Self::UploadIncomplete { .. }
            | Self::NoMorePages
            | Self::Tool { .. }
            | Self::Json(_)
            | Self::Config { .. } => false,
        }
    }

    /// Error category string for logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::FieldNotSupported { .. }
            | Self::OperationNotSupported { .. }
            | Self::InvalidRequest { .. }
            | Self::Config { .. } => "config",
            Self::Api { .. } => "api",
            Self::Transport { .. } | Self::Timeout { .. } => "network",
            Self::Cancelled => "cancelled",
            Self::StreamFraming { .. } | Self::Json(_) => "parse",
            Self::LiveProtocol { .. } => "live",
            Self::UploadIncomplete { .. } => "upload",
            Self::NoMorePages => "pagination",
            Self::Tool { .. } => "tool",
        }
    }

    /// HTTP status, for [`GenAiError::Api`] only.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
