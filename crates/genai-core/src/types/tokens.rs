//! Token counting.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::Content;
use super::tools::Tool;
use crate::descriptor::RequestOptions;

/// Optional parameters for `countTokens`. All fields are managed-backend only.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountTokensConfig {
    /// System instruction included in the count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Tools included in the count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Generation configuration included in the count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<Value>,
    /// Per-call transport options.
    #[serde(skip)]
    pub http_options: Option<RequestOptions>,
}

/// Parameters for `countTokens`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountTokensParameters {
    /// Model id or resource name.
    pub model: String,
    /// Content to count.
    pub contents: Vec<Content>,
    /// Options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<CountTokensConfig>,
}

/// Response of `countTokens`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountTokensResponse {
    /// Total tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
    /// Tokens served from cached content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_content_token_count: Option<u32>,
}
