//! Cached content resources.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::Content;
use super::tools::{Tool, ToolConfig};
use crate::descriptor::RequestOptions;

/// A cached prompt prefix.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedContent {
    /// Resource name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Model the cache belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Creation timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// Last update timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    /// Expiry timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<String>,
    /// Token accounting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<Value>,
}

/// Options for `caches.create`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCachedContentConfig {
    /// Time to live, e.g. `"3600s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    /// Absolute expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<String>,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Cached turns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<Content>>,
    /// Cached system instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Cached tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Cached tool configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
    /// Customer-managed encryption key (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_name: Option<String>,
    /// Per-call transport options.
    #[serde(skip)]
    pub http_options: Option<RequestOptions>,
}

/// Parameters for `caches.create`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCachedContentParameters {
    /// Model id or resource name.
    pub model: String,
    /// Options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<CreateCachedContentConfig>,
}

/// Options for `caches.update`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCachedContentConfig {
    /// New time to live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    /// New absolute expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<String>,
    /// Per-call transport options.
    #[serde(skip)]
    pub http_options: Option<RequestOptions>,
}

/// Parameters for `caches.update`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCachedContentParameters {
    /// Cache id or resource name.
    pub name: String,
    /// Options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<UpdateCachedContentConfig>,
}

/// Options for `caches.list`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCachedContentsConfig {
    /// Maximum items per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Cursor from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    /// Per-call transport options.
    #[serde(skip)]
    pub http_options: Option<RequestOptions>,
}

/// One page of cached contents.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCachedContentsResponse {
    /// Cursor for the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    /// Caches on this page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_contents: Option<Vec<CachedContent>>,
}
