//! Model metadata and listing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::RequestOptions;

/// Metadata for a base or tuned model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Resource name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Version id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Maximum input tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_token_limit: Option<u32>,
    /// Maximum output tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_token_limit: Option<u32>,
    /// Supported methods (e.g. `generateContent`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_actions: Option<Vec<String>>,
    /// Default temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_temperature: Option<f64>,
    /// Default top-p.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Default top-k.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<f64>,
    /// Whether the model supports thinking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<bool>,
    /// Tuning provenance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuned_model_info: Option<Value>,
    /// Labels (managed backend).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Value>,
    /// Deployed endpoints (managed backend).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Value>,
}

/// Parameters for `models.get`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetModelParameters {
    /// Model id or resource name.
    pub model: String,
    /// Per-call transport options.
    #[serde(skip)]
    pub http_options: Option<RequestOptions>,
}

/// Options for `models.list`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModelsConfig {
    /// Maximum items per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Cursor from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    /// Server-side filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// List base models (`true`, default) or tuned models (`false`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_base: Option<bool>,
    /// Per-call transport options.
    #[serde(skip)]
    pub http_options: Option<RequestOptions>,
}

/// Parameters for `models.list`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModelsParameters {
    /// Options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ListModelsConfig>,
}

/// One page of models.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModelsResponse {
    /// Cursor for the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    /// Models on this page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<Model>>,
}
