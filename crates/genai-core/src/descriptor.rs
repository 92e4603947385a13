//! Transport-neutral request description.
//!
//! A transcoder produces an [`HttpRequestDescriptor`]; the transport client turns
//! it into a network call. Descriptors are created fresh per call and never shared.

use std::collections::BTreeMap;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// HTTP method of a descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    #[default]
    Post,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Uppercase method name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Per-call options that travel with a descriptor.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Request-scoped timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// External cancellation signal. Cancelling it aborts the in-flight call and
    /// any sub-operation started on its behalf.
    pub cancel: Option<CancellationToken>,
    /// Extra headers for this call only.
    pub headers: BTreeMap<String, String>,
}

impl RequestOptions {
    /// Options with only a timeout.
    #[must_use]
    pub fn with_timeout(timeout_ms: u64) -> Self {
        Self {
            timeout_ms: Some(timeout_ms),
            ..Self::default()
        }
    }

    /// Options with only a cancellation token.
    #[must_use]
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel: Some(cancel),
            ..Self::default()
        }
    }
}

/// A fully transcoded request, ready for the transport client.
#[derive(Clone, Debug, Default)]
pub struct HttpRequestDescriptor {
    /// Resource path relative to `{base_url}{api_version}/` (e.g. `models/x:generateContent`).
    pub path: String,
    /// Query parameters, appended in key order.
    pub query_params: BTreeMap<String, String>,
    /// JSON body; `None` for body-less methods.
    pub body: Option<Value>,
    /// HTTP method.
    pub http_method: HttpMethod,
    /// Per-call options.
    pub options: RequestOptions,
}

impl HttpRequestDescriptor {
    /// A `POST` with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            path: path.into(),
            body: Some(body),
            http_method: HttpMethod::Post,
            ..Self::default()
        }
    }

    /// A `GET` without a body.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            http_method: HttpMethod::Get,
            ..Self::default()
        }
    }

    /// Attach per-call options.
    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_sets_body_and_method() {
        let d = HttpRequestDescriptor::post("models/x:generateContent", serde_json::json!({}));
        assert_eq!(d.http_method, HttpMethod::Post);
        assert!(d.body.is_some());
        assert!(d.query_params.is_empty());
    }

    #[test]
    fn get_has_no_body() {
        let d = HttpRequestDescriptor::get("models");
        assert_eq!(d.http_method.as_str(), "GET");
        assert!(d.body.is_none());
    }

    #[test]
    fn options_builders() {
        assert_eq!(RequestOptions::with_timeout(50).timeout_ms, Some(50));
        let token = CancellationToken::new();
        assert!(RequestOptions::with_cancel(token).cancel.is_some());
    }
}
