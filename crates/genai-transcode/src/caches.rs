//! Transcoders for cached contents.

use genai_core::types::{
    CachedContent, CreateCachedContentParameters, ListCachedContentsConfig,
    ListCachedContentsResponse, UpdateCachedContentParameters,
};
use genai_core::{HttpMethod, HttpRequestDescriptor, Result};
use serde_json::{Value, json};

use crate::common::{CONTENT, TOOL, TOOL_CONFIG};
use crate::table::{FieldRule, Transform, TranscodeContext, decode_into, encode_request, field};

/// `caches.create` request.
pub const CREATE_CACHED_CONTENT: &[FieldRule] = &[
    field("model").with(Transform::CachesModel),
    field("config.ttl").to("ttl"),
    field("config.expireTime").to("expireTime"),
    field("config.displayName").to("displayName"),
    field("config.contents").to("contents").nested(CONTENT),
    field("config.systemInstruction")
        .to("systemInstruction")
        .nested(CONTENT),
    field("config.tools").to("tools").nested(TOOL),
    field("config.toolConfig").to("toolConfig").nested(TOOL_CONFIG),
    field("config.kmsKeyName")
        .to("encryption_spec.kmsKeyName")
        .managed_only(),
];

/// `caches.get` / `caches.delete` request.
pub const CACHED_CONTENT_NAME: &[FieldRule] =
    &[field("name").to("_url.name").with(Transform::CachedContentName)];

/// `caches.update` request.
pub const UPDATE_CACHED_CONTENT: &[FieldRule] = &[
    field("name").to("_url.name").with(Transform::CachedContentName),
    field("config.ttl").to("ttl"),
    field("config.expireTime").to("expireTime"),
];

/// `caches.list` request.
pub const LIST_CACHED_CONTENTS: &[FieldRule] = &[
    field("pageSize").to("_query.pageSize"),
    field("pageToken").to("_query.pageToken"),
];

/// Cached content resource.
pub const CACHED_CONTENT: &[FieldRule] = &[
    field("name"),
    field("displayName"),
    field("model"),
    field("createTime"),
    field("updateTime"),
    field("expireTime"),
    field("usageMetadata"),
];

/// `caches.list` response.
pub const LIST_CACHED_CONTENTS_RESPONSE: &[FieldRule] = &[
    field("nextPageToken"),
    field("cachedContents").nested(CACHED_CONTENT),
];

/// Build a `caches.create` request.
pub fn create_cached_content_request(
    params: &CreateCachedContentParameters,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    let options = params
        .config
        .as_ref()
        .and_then(|c| c.http_options.clone())
        .unwrap_or_default();
    Ok(
        encode_request(CREATE_CACHED_CONTENT, params, ctx, "cachedContents", HttpMethod::Post)?
            .with_options(options),
    )
}

/// Build a `caches.get` request.
pub fn get_cached_content_request(
    name: &str,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    encode_request(CACHED_CONTENT_NAME, &json!({ "name": name }), ctx, "{name}", HttpMethod::Get)
}

/// Build a `caches.delete` request.
pub fn delete_cached_content_request(
    name: &str,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    encode_request(
        CACHED_CONTENT_NAME,
        &json!({ "name": name }),
        ctx,
        "{name}",
        HttpMethod::Delete,
    )
}

/// Build a `caches.update` request.
pub fn update_cached_content_request(
    params: &UpdateCachedContentParameters,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    let options = params
        .config
        .as_ref()
        .and_then(|c| c.http_options.clone())
        .unwrap_or_default();
    Ok(
        encode_request(UPDATE_CACHED_CONTENT, params, ctx, "{name}", HttpMethod::Patch)?
            .with_options(options),
    )
}

/// Build a `caches.list` request.
pub fn list_cached_contents_request(
    config: &ListCachedContentsConfig,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    Ok(
        encode_request(LIST_CACHED_CONTENTS, config, ctx, "cachedContents", HttpMethod::Get)?
            .with_options(config.http_options.clone().unwrap_or_default()),
    )
}

/// Decode a cached content resource.
pub fn cached_content_response(wire: &Value, ctx: &TranscodeContext) -> Result<CachedContent> {
    decode_into(CACHED_CONTENT, wire, ctx)
}

/// Decode a `caches.list` page.
pub fn list_cached_contents_response(
    wire: &Value,
    ctx: &TranscodeContext,
) -> Result<ListCachedContentsResponse> {
    decode_into(LIST_CACHED_CONTENTS_RESPONSE, wire, ctx)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
