//! Resource-name normalization.
//!
//! Each backend addresses models, cached contents, and files through its own
//! resource hierarchy. Already-qualified names pass through untouched; bare ids are
//! prefixed according to the backend.

use genai_core::{BackendTarget, GenAiError, Result};
use serde_json::Value;

use crate::table::TranscodeContext;

fn as_name<'v>(value: &'v Value, what: &str) -> Result<&'v str> {
    value
        .as_str()
        .ok_or_else(|| GenAiError::invalid_request(format!("{what} must be a string")))
}

fn project_location(ctx: &TranscodeContext) -> Result<(&str, &str)> {
    let project = ctx
        .project
        .as_deref()
        .ok_or_else(|| GenAiError::invalid_request("a project is required for this resource"))?;
    let location = ctx.location.as_deref().unwrap_or("global");
    Ok((project, location))
}

/// Qualify a model id for `backend`.
///
/// Direct keeps `models/…` and `tunedModels/…`, otherwise prefixes `models/`.
/// Managed keeps `publishers/…`, `projects/…`, and `models/…`, maps `owner/id` to
/// `publishers/owner/models/id`, otherwise prefixes `publishers/google/models/`.
pub fn model_name(model: &str, backend: BackendTarget) -> Result<String> {
    if model.is_empty() {
        return Err(GenAiError::invalid_request("model is required and must not be empty"));
    }
    if model.contains("..") || model.contains('?') || model.contains('&') {
        return Err(GenAiError::invalid_request(format!(
            "invalid model parameter: {model}"
        )));
    }
    let name = match backend {
        BackendTarget::Direct => {
            if model.starts_with("models/") || model.starts_with("tunedModels/") {
                model.to_string()
            } else {
                format!("models/{model}")
            }
        }
        BackendTarget::Managed => {
            if model.starts_with("publishers/")
                || model.starts_with("projects/")
                || model.starts_with("models/")
            {
                model.to_string()
            } else if let Some((owner, id)) = model.split_once('/') {
                format!("publishers/{owner}/models/{id}")
            } else {
                format!("publishers/google/models/{model}")
            }
        }
    };
    Ok(name)
}

/// Qualify a model id for resources that reference it by full path (cached
/// contents, live setup). On Managed the name is scoped to the project; express
/// mode has no project and keeps the publisher path.
pub fn caches_model_name(model: &str, ctx: &TranscodeContext) -> Result<String> {
    let name = model_name(model, ctx.backend)?;
    if ctx.backend == BackendTarget::Direct
        || ctx.project.is_none()
        || name.starts_with("projects/")
    {
        return Ok(name);
    }
    let (project, location) = project_location(ctx)?;
    if name.starts_with("publishers/") {
        Ok(format!("projects/{project}/locations/{location}/{name}"))
    } else if let Some(id) = name.strip_prefix("models/") {
        Ok(format!(
            "projects/{project}/locations/{location}/publishers/google/models/{id}"
        ))
    } else {
        Ok(name)
    }
}

/// Qualify a cached-content id.
pub fn cached_content_name(name: &str, ctx: &TranscodeContext) -> Result<String> {
    if name.is_empty() {
        return Err(GenAiError::invalid_request("cached content name must not be empty"));
    }
    match ctx.backend {
        BackendTarget::Direct => {
            if name.starts_with("cachedContents/") {
                Ok(name.to_string())
            } else {
                Ok(format!("cachedContents/{name}"))
            }
        }
        BackendTarget::Managed => {
            if name.starts_with("projects/") {
                return Ok(name.to_string());
            }
            let (project, location) = project_location(ctx)?;
            if name.starts_with("locations/") {
                Ok(format!("projects/{project}/{name}"))
            } else if name.starts_with("cachedContents/") {
                Ok(format!("projects/{project}/locations/{location}/{name}"))
            } else {
                Ok(format!(
                    "projects/{project}/locations/{location}/cachedContents/{name}"
                ))
            }
        }
    }
}

/// Reduce a file name or URI to its bare id (`files/abc` → `abc`).
pub fn file_id(name: &str) -> Result<String> {
    let tail = match name.find("files/") {
        Some(idx) if name.starts_with("http") || idx == 0 => &name[idx + "files/".len()..],
        _ => name,
    };
    let id = tail.split(['?', ':']).next().unwrap_or_default();
    if id.is_empty() {
        return Err(GenAiError::invalid_request(format!("invalid file name: {name}")));
    }
    Ok(id.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Table transforms
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn t_model(value: &Value, ctx: &TranscodeContext) -> Result<Value> {
    model_name(as_name(value, "model")?, ctx.backend).map(Value::String)
}

pub(crate) fn t_caches_model(value: &Value, ctx: &TranscodeContext) -> Result<Value> {
    caches_model_name(as_name(value, "model")?, ctx).map(Value::String)
}

pub(crate) fn t_cached_content_name(value: &Value, ctx: &TranscodeContext) -> Result<Value> {
    cached_content_name(as_name(value, "cached content name")?, ctx).map(Value::String)
}

pub(crate) fn t_file_name(value: &Value, _ctx: &TranscodeContext) -> Result<Value> {
    file_id(as_name(value, "file name")?).map(Value::String)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
