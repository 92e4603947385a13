//! Embedding requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::Content;
use crate::descriptor::RequestOptions;

/// Optional parameters for `embedContent`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedContentConfig {
    /// Intended downstream task (e.g. `RETRIEVAL_DOCUMENT`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    /// Document title, for retrieval tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Truncate the embedding to this many dimensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dimensionality: Option<u32>,
    /// Input MIME type (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Silently truncate over-long input (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_truncate: Option<bool>,
    /// Per-call transport options.
    #[serde(skip)]
    pub http_options: Option<RequestOptions>,
}

/// Parameters for `embedContent`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedContentParameters {
    /// Model id or resource name.
    pub model: String,
    /// One embedding is produced per content.
    pub contents: Vec<Content>,
    /// Options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<EmbedContentConfig>,
}

/// One embedding vector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEmbedding {
    /// Vector components.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f32>>,
    /// Token count and truncation info (managed backend).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Value>,
}

/// Response of `embedContent`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedContentResponse {
    /// One embedding per input content, in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<ContentEmbedding>>,
    /// Billing metadata (managed backend).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}
