//! Field tables and the generic engine that interprets them.
//!
//! A table is a list of [`FieldRule`]s. Each rule names a canonical path, the wire
//! path on each backend, and a value transform. One table drives both directions:
//! [`encode`] reads canonical paths and writes wire paths, [`decode`] does the
//! reverse. Encoding a present field whose wire side is [`Wire::Unsupported`]
//! fails with [`GenAiError::FieldNotSupported`]; decoding simply skips it.
//!
//! Wire paths rooted at `_url` and `_query` never reach the body: [`build_request`]
//! moves them into the path template and the query string.

use std::collections::BTreeMap;

use genai_core::{BackendTarget, GenAiError, HttpMethod, HttpRequestDescriptor, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::names;
use crate::path::{get_value_by_path, set_value_by_path};

/// Root for path template parameters.
pub const URL_ROOT: &str = "_url";
/// Root for query parameters.
pub const QUERY_ROOT: &str = "_query";

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a transform may depend on besides the value itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranscodeContext {
    /// Target backend.
    pub backend: BackendTarget,
    /// Cloud project (managed backend).
    pub project: Option<String>,
    /// Cloud location (managed backend).
    pub location: Option<String>,
}

impl TranscodeContext {
    /// Context for the direct backend.
    #[must_use]
    pub fn direct() -> Self {
        Self::default()
    }

    /// Context for the managed backend.
    #[must_use]
    pub fn managed(project: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            backend: BackendTarget::Managed,
            project: Some(project.into()),
            location: Some(location.into()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────────────────

/// A value transform applied in one direction.
pub type TransformFn = fn(&Value, &TranscodeContext) -> Result<Value>;

/// How a field's value is converted.
#[derive(Clone, Copy)]
pub enum Transform {
    /// Copied unchanged.
    Copy,
    /// Object (or each element of an array) transcoded by a sub-table.
    Nested(&'static [FieldRule]),
    /// Model id normalized into a resource name.
    Model,
    /// Model id normalized into a project-scoped resource name (caches, live).
    CachesModel,
    /// Cached-content id normalized into a resource name.
    CachedContentName,
    /// File resource reduced to its bare id.
    FileName,
    /// Arbitrary function pair.
    Custom {
        /// Canonical to wire.
        encode: TransformFn,
        /// Wire to canonical.
        decode: TransformFn,
    },
}

/// Where a field lives on one backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wire {
    /// Written to / read from this path.
    Path(&'static str),
    /// Exclusive to the other backend; encoding it here is an error.
    Unsupported,
    /// Not written on this backend, without error. Used for rules that duplicate a
    /// field into a second wire location on the other backend.
    Skip,
}

/// One row of a transcoder table.
#[derive(Clone, Copy)]
pub struct FieldRule {
    /// Path in the canonical JSON.
    pub canonical: &'static str,
    /// Wire location on the direct backend.
    pub direct: Wire,
    /// Wire location on the managed backend.
    pub managed: Wire,
    /// Value conversion.
    pub transform: Transform,
}

/// A rule copying `canonical` to the same path on both backends.
pub const fn field(canonical: &'static str) -> FieldRule {
    FieldRule {
        canonical,
        direct: Wire::Path(canonical),
        managed: Wire::Path(canonical),
        transform: Transform::Copy,
    }
}

impl FieldRule {
    /// Same wire path on both backends.
    #[must_use]
    pub const fn to(self, wire: &'static str) -> Self {
        Self {
            direct: Wire::Path(wire),
            managed: Wire::Path(wire),
            ..self
        }
    }

    /// Wire path on the direct backend.
    #[must_use]
    pub const fn direct_as(self, wire: &'static str) -> Self {
        Self {
            direct: Wire::Path(wire),
            ..self
        }
    }

    /// Wire path on the managed backend.
    #[must_use]
    pub const fn managed_as(self, wire: &'static str) -> Self {
        Self {
            managed: Wire::Path(wire),
            ..self
        }
    }

    /// Reject on the managed backend.
    #[must_use]
    pub const fn direct_only(self) -> Self {
        Self {
            managed: Wire::Unsupported,
            ..self
        }
    }

    /// Reject on the direct backend.
    #[must_use]
    pub const fn managed_only(self) -> Self {
        Self {
            direct: Wire::Unsupported,
            ..self
        }
    }

    /// Ignore on the managed backend.
    #[must_use]
    pub const fn skip_managed(self) -> Self {
        Self {
            managed: Wire::Skip,
            ..self
        }
    }

    /// Ignore on the direct backend.
    #[must_use]
    pub const fn skip_direct(self) -> Self {
        Self {
            direct: Wire::Skip,
            ..self
        }
    }

    /// Transcode through a sub-table.
    #[must_use]
    pub const fn nested(self, table: &'static [FieldRule]) -> Self {
        Self {
            transform: Transform::Nested(table),
            ..self
        }
    }

    /// Apply a transform.
    #[must_use]
    pub const fn with(self, transform: Transform) -> Self {
        Self { transform, ..self }
    }

    /// Wire location for `backend`.
    #[must_use]
    pub fn wire(&self, backend: BackendTarget) -> Wire {
        match backend {
            BackendTarget::Direct => self.direct,
            BackendTarget::Managed => self.managed,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Encode a canonical JSON object into wire JSON.
///
/// Absent canonical fields are omitted from the output.
pub fn encode(table: &[FieldRule], canonical: &Value, ctx: &TranscodeContext) -> Result<Value> {
    encode_at(table, canonical, ctx, "")
}

fn encode_at(
    table: &[FieldRule],
    canonical: &Value,
    ctx: &TranscodeContext,
    prefix: &str,
) -> Result<Value> {
    let mut out = Value::Object(Map::new());
    for rule in table {
        let Some(value) = get_value_by_path(canonical, rule.canonical) else {
            continue;
        };
        let field_path = format!("{prefix}{}", rule.canonical);
        let dest = match rule.wire(ctx.backend) {
            Wire::Path(dest) => dest,
            Wire::Skip => continue,
            Wire::Unsupported => {
                return Err(GenAiError::FieldNotSupported {
                    field: field_path,
                    backend: ctx.backend,
                });
            }
        };
        let wire = match rule.transform {
            Transform::Copy => value,
            Transform::Nested(sub) => map_nested(&value, &field_path, |v, p| encode_at(sub, v, ctx, p))?,
            Transform::Model => names::t_model(&value, ctx)?,
            Transform::CachesModel => names::t_caches_model(&value, ctx)?,
            Transform::CachedContentName => names::t_cached_content_name(&value, ctx)?,
            Transform::FileName => names::t_file_name(&value, ctx)?,
            Transform::Custom { encode, .. } => encode(&value, ctx)?,
        };
        set_value_by_path(&mut out, dest, wire)?;
    }
    Ok(out)
}

/// Decode wire JSON into a canonical JSON object.
///
/// Wire fields without a rule are ignored; absent wire fields stay absent.
pub fn decode(table: &[FieldRule], wire: &Value, ctx: &TranscodeContext) -> Result<Value> {
    let mut out = Value::Object(Map::new());
    for rule in table {
        let Wire::Path(src) = rule.wire(ctx.backend) else {
            continue;
        };
        if src.starts_with(URL_ROOT) || src.starts_with(QUERY_ROOT) {
            continue;
        }
        let Some(value) = get_value_by_path(wire, src) else {
            continue;
        };
        let canonical = match rule.transform {
            Transform::Nested(sub) => map_nested(&value, rule.canonical, |v, _| decode(sub, v, ctx))?,
            Transform::Custom { decode, .. } => decode(&value, ctx)?,
            Transform::Copy
            | Transform::Model
            | Transform::CachesModel
            | Transform::CachedContentName
            | Transform::FileName => value,
        };
        set_value_by_path(&mut out, rule.canonical, canonical)?;
    }
    Ok(out)
}

/// Decode wire JSON straight into a canonical type.
pub fn decode_into<T: DeserializeOwned>(
    table: &[FieldRule],
    wire: &Value,
    ctx: &TranscodeContext,
) -> Result<T> {
    Ok(serde_json::from_value(decode(table, wire, ctx)?)?)
}

fn map_nested(
    value: &Value,
    field_path: &str,
    f: impl Fn(&Value, &str) -> Result<Value>,
) -> Result<Value> {
    match value {
        Value::Array(items) => {
            let prefix = format!("{field_path}[].");
            items
                .iter()
                .map(|item| if item.is_null() { Ok(Value::Null) } else { f(item, &prefix) })
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        Value::Object(_) => f(value, &format!("{field_path}.")),
        other => Err(GenAiError::invalid_request(format!(
            "{field_path} must be an object or a list of objects, got {other}"
        ))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Descriptor assembly
// ─────────────────────────────────────────────────────────────────────────────

fn param_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Fill `{name}` placeholders in `template` from `params`.
pub fn format_template(template: &str, params: &Map<String, Value>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}') else {
            return Err(GenAiError::invalid_request(format!(
                "unterminated placeholder in '{template}'"
            )));
        };
        let name = &rest[open + 1..open + close];
        let value = params.get(name).ok_or_else(|| {
            GenAiError::invalid_request(format!("missing path parameter '{name}'"))
        })?;
        out.push_str(&param_string(value));
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Split an encoded request into path, query and body.
///
/// `GET` and `DELETE` requests carry no body.
pub fn build_request(
    encoded: Value,
    template: &str,
    method: HttpMethod,
) -> Result<HttpRequestDescriptor> {
    let mut body = match encoded {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let url_params = match body.remove(URL_ROOT) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let query_params: BTreeMap<String, String> = match body.remove(QUERY_ROOT) {
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), param_string(v))).collect(),
        _ => BTreeMap::new(),
    };
    let path = format_template(template, &url_params)?;
    let body = match method {
        HttpMethod::Get | HttpMethod::Delete => None,
        HttpMethod::Post | HttpMethod::Patch => Some(Value::Object(body)),
    };
    Ok(HttpRequestDescriptor {
        path,
        query_params,
        body,
        http_method: method,
        ..HttpRequestDescriptor::default()
    })
}

/// Serialize canonical parameters, encode them through `table`, and assemble the
/// descriptor for `template`.
pub fn encode_request<T: Serialize>(
    table: &[FieldRule],
    params: &T,
    ctx: &TranscodeContext,
    template: &str,
    method: HttpMethod,
) -> Result<HttpRequestDescriptor> {
    let canonical = serde_json::to_value(params)?;
    let encoded = encode(table, &canonical, ctx)?;
    let descriptor = build_request(encoded, template, method)?;
    tracing::debug!(
        backend = %ctx.backend,
        method = method.as_str(),
        path = %descriptor.path,
        "encoded request"
    );
    Ok(descriptor)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    const INNER: &[FieldRule] = &[
        field("name"),
        field("secret").managed_only(),
        field("alias").direct_as("aka").managed_as("alias_name"),
    ];

    const OUTER: &[FieldRule] = &[
        field("model").to("_url.model").with(Transform::Model),
        field("items").nested(INNER),
        field("config.limit").to("_query.pageSize"),
        field("config.temperature").to("generationConfig.temperature"),
        field("config.civic").to("generationConfig.civic").direct_only(),
    ];

    #[test]
    fn encode_renames_and_nests() {
        let canonical = json!({
            "model": "gemini",
            "items": [{"name": "a", "alias": "x"}],
            "config": {"temperature": 0.2}
        });
        let wire = encode(OUTER, &canonical, &TranscodeContext::direct()).unwrap();
        assert_eq!(
            wire,
            json!({
                "_url": {"model": "models/gemini"},
                "items": [{"name": "a", "aka": "x"}],
                "generationConfig": {"temperature": 0.2}
            })
        );
    }

    #[test]
    fn encode_omits_absent_fields() {
        let wire = encode(OUTER, &json!({"model": "m"}), &TranscodeContext::direct()).unwrap();
        assert_eq!(wire, json!({"_url": {"model": "models/m"}}));
    }

    #[test]
    fn encode_rejects_exclusive_field_with_full_path() {
        let canonical = json!({"items": [{"secret": 1}]});
        let err = encode(OUTER, &canonical, &TranscodeContext::direct()).unwrap_err();
        assert_matches!(
            err,
            GenAiError::FieldNotSupported { ref field, backend: BackendTarget::Direct }
                if field == "items[].secret"
        );

        let ctx = TranscodeContext::managed("p", "l");
        let err = encode(OUTER, &json!({"config": {"civic": true}}), &ctx).unwrap_err();
        assert_matches!(err, GenAiError::FieldNotSupported { ref field, .. } if field == "config.civic");
    }

    #[test]
    fn decode_is_inverse_for_supported_fields() {
        let ctx = TranscodeContext::managed("p", "l");
        let canonical = json!({
            "items": [{"name": "a", "secret": 1, "alias": "z"}],
            "config": {"temperature": 0.7}
        });
        let wire = encode(OUTER, &canonical, &ctx).unwrap();
        assert_eq!(wire["items"][0]["alias_name"], "z");
        assert_eq!(decode(OUTER, &wire, &ctx).unwrap(), canonical);
    }

    #[test]
    fn decode_ignores_unknown_wire_fields() {
        let wire = json!({"items": [{"name": "a", "brandNew": true}], "other": 1});
        let canonical = decode(OUTER, &wire, &TranscodeContext::direct()).unwrap();
        assert_eq!(canonical, json!({"items": [{"name": "a"}]}));
    }

    #[test]
    fn build_request_splits_url_query_body() {
        let encoded = json!({
            "_url": {"model": "models/x"},
            "_query": {"pageSize": 5},
            "contents": []
        });
        let d = build_request(encoded, "{model}:generateContent", HttpMethod::Post).unwrap();
        assert_eq!(d.path, "models/x:generateContent");
        assert_eq!(d.query_params.get("pageSize").map(String::as_str), Some("5"));
        assert_eq!(d.body, Some(json!({"contents": []})));
    }

    #[test]
    fn build_request_get_has_no_body() {
        let d = build_request(json!({"_url": {"name": "files/a"}}), "{name}", HttpMethod::Get).unwrap();
        assert_eq!(d.path, "files/a");
        assert!(d.body.is_none());
    }

    #[test]
    fn missing_template_parameter_fails() {
        let err = build_request(json!({}), "{model}:predict", HttpMethod::Post).unwrap_err();
        assert!(err.to_string().contains("missing path parameter 'model'"));
    }
}
