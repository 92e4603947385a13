//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ClientSettings::default()`]
//! 2. If `~/.genai/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::ClientSettings;

/// Resolve the path to the settings file (`~/.genai/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".genai").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ClientSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains invalid
/// JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<ClientSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults deep-merged with the file at `path`, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<ClientSettings> {
    let defaults = serde_json::to_value(ClientSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut ClientSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are ignored with a warning (fall back to file/default)
/// - `GOOGLE_API_KEY` wins over `GEMINI_API_KEY`
pub fn apply_overrides_from(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let env = EnvReader { lookup };

    if let Some(v) = env.bool("GOOGLE_GENAI_USE_VERTEXAI") {
        settings.vertexai = v;
    }
    if let Some(v) = env
        .string("GOOGLE_API_KEY")
        .or_else(|| env.string("GEMINI_API_KEY"))
    {
        settings.api_key = Some(v);
    }
    if let Some(v) = env.string("GOOGLE_CLOUD_PROJECT") {
        settings.project = Some(v);
    }
    if let Some(v) = env.string("GOOGLE_CLOUD_LOCATION") {
        settings.location = Some(v);
    }
    if let Some(v) = env.string("GOOGLE_APPLICATION_CREDENTIALS") {
        settings.service_account_file = Some(v);
    }

    // Base URL override is per backend; only the active backend's var applies.
    let base_url_var = if settings.vertexai {
        "GOOGLE_VERTEX_BASE_URL"
    } else {
        "GOOGLE_GEMINI_BASE_URL"
    };
    if let Some(v) = env.string(base_url_var) {
        settings.http.base_url = Some(if v.ends_with('/') { v } else { format!("{v}/") });
    }

    if let Some(v) = env.u64("GENAI_TIMEOUT_MS", 1, 3_600_000) {
        settings.http.timeout_ms = Some(v);
    }
    if let Some(v) = env.string("GENAI_LOG") {
        settings.log_level = Some(v);
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = (self.lookup)(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
