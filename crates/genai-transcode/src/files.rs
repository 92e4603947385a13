//! Transcoders for file metadata. Files exist only on the direct backend; every
//! builder here fails with [`GenAiError::OperationNotSupported`] on Managed.

use genai_core::types::{File, ListFilesConfig, ListFilesResponse, UploadFileConfig};
use genai_core::{BackendTarget, GenAiError, HttpMethod, HttpRequestDescriptor, Result};
use serde_json::{Value, json};

use crate::table::{FieldRule, Transform, TranscodeContext, decode_into, encode_request, field};

/// File metadata.
pub const FILE: &[FieldRule] = &[
    field("name"),
    field("displayName"),
    field("mimeType"),
    field("sizeBytes"),
    field("createTime"),
    field("expirationTime"),
    field("updateTime"),
    field("sha256Hash"),
    field("uri"),
    field("downloadUri"),
    field("state"),
    field("source"),
    field("videoMetadata"),
    field("error"),
];

/// `files.get` / `files.delete` request.
pub const FILE_NAME: &[FieldRule] = &[field("name").to("_url.file").with(Transform::FileName)];

/// `files.list` request.
pub const LIST_FILES: &[FieldRule] = &[
    field("pageSize").to("_query.pageSize"),
    field("pageToken").to("_query.pageToken"),
];

/// `files.list` response.
pub const LIST_FILES_RESPONSE: &[FieldRule] = &[field("nextPageToken"), field("files").nested(FILE)];

fn direct_only(operation: &str, ctx: &TranscodeContext) -> Result<()> {
    match ctx.backend {
        BackendTarget::Direct => Ok(()),
        BackendTarget::Managed => Err(GenAiError::OperationNotSupported {
            operation: operation.to_string(),
            backend: ctx.backend,
        }),
    }
}

/// Build a `files.get` request.
pub fn get_file_request(name: &str, ctx: &TranscodeContext) -> Result<HttpRequestDescriptor> {
    direct_only("files.get", ctx)?;
    encode_request(FILE_NAME, &json!({ "name": name }), ctx, "files/{file}", HttpMethod::Get)
}

/// Build a `files.delete` request.
pub fn delete_file_request(name: &str, ctx: &TranscodeContext) -> Result<HttpRequestDescriptor> {
    direct_only("files.delete", ctx)?;
    encode_request(FILE_NAME, &json!({ "name": name }), ctx, "files/{file}", HttpMethod::Delete)
}

/// Build a `files.list` request.
pub fn list_files_request(
    config: &ListFilesConfig,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    direct_only("files.list", ctx)?;
    Ok(encode_request(LIST_FILES, config, ctx, "files", HttpMethod::Get)?
        .with_options(config.http_options.clone().unwrap_or_default()))
}

/// Metadata body for the `start` call of a resumable upload.
pub fn upload_file_body(config: &UploadFileConfig, ctx: &TranscodeContext) -> Result<Value> {
    direct_only("files.upload", ctx)?;
    let mut file = serde_json::Map::new();
    if let Some(name) = &config.name {
        let name = if name.starts_with("files/") {
            name.clone()
        } else {
            format!("files/{name}")
        };
        let _ = file.insert("name".into(), Value::String(name));
    }
    if let Some(mime_type) = &config.mime_type {
        let _ = file.insert("mimeType".into(), Value::String(mime_type.clone()));
    }
    if let Some(display_name) = &config.display_name {
        let _ = file.insert("displayName".into(), Value::String(display_name.clone()));
    }
    Ok(json!({ "file": file }))
}

/// Decode file metadata. Upload completion wraps it in a `file` key; a bare
/// resource is accepted too.
pub fn file_response(wire: &Value, ctx: &TranscodeContext) -> Result<File> {
    let inner = wire.get("file").filter(|v| v.is_object()).unwrap_or(wire);
    decode_into(FILE, inner, ctx)
}

/// Decode a `files.list` page.
pub fn list_files_response(wire: &Value, ctx: &TranscodeContext) -> Result<ListFilesResponse> {
    decode_into(LIST_FILES_RESPONSE, wire, ctx)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn get_strips_prefix() {
        let d = get_file_request("files/abc", &TranscodeContext::direct()).unwrap();
        assert_eq!(d.path, "files/abc");
        assert_eq!(d.http_method, HttpMethod::Get);
        assert!(d.body.is_none());
    }

    #[test]
    fn delete_uses_delete_method() {
        let d = delete_file_request("abc", &TranscodeContext::direct()).unwrap();
        assert_eq!(d.path, "files/abc");
        assert_eq!(d.http_method, HttpMethod::Delete);
    }

    #[test]
    fn managed_is_not_supported() {
        let ctx = TranscodeContext::managed("p", "l");
        assert_matches!(
            get_file_request("abc", &ctx),
            Err(GenAiError::OperationNotSupported { ref operation, .. }) if operation == "files.get"
        );
        assert!(list_files_request(&ListFilesConfig::default(), &ctx).is_err());
        assert!(upload_file_body(&UploadFileConfig::default(), &ctx).is_err());
    }

    #[test]
    fn list_query() {
        let config = ListFilesConfig {
            page_size: Some(10),
            ..ListFilesConfig::default()
        };
        let d = list_files_request(&config, &TranscodeContext::direct()).unwrap();
        assert_eq!(d.path, "files");
        assert_eq!(d.query_params.get("pageSize").map(String::as_str), Some("10"));
    }

    #[test]
    fn upload_body_qualifies_name() {
        let config = UploadFileConfig {
            name: Some("doc".into()),
            mime_type: Some("text/plain".into()),
            ..UploadFileConfig::default()
        };
        let body = upload_file_body(&config, &TranscodeContext::direct()).unwrap();
        assert_eq!(body, json!({"file": {"name": "files/doc", "mimeType": "text/plain"}}));
    }

    #[test]
    fn file_response_unwraps_upload_envelope() {
        let ctx = TranscodeContext::direct();
        let wrapped = json!({"file": {"name": "files/a", "state": "ACTIVE"}});
        assert_eq!(file_response(&wrapped, &ctx).unwrap().name.as_deref(), Some("files/a"));
        let bare = json!({"name": "files/b", "sizeBytes": "12"});
        assert_eq!(file_response(&bare, &ctx).unwrap().size_bytes.as_deref(), Some("12"));
    }
}
