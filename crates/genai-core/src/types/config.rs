//! Generation configuration and the content-generation request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::Content;
use super::tools::{ToolConfig, ToolUnion};
use crate::descriptor::RequestOptions;

/// Safety threshold for one harm category.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetySetting {
    /// Harm category, e.g. `HARM_CATEGORY_HATE_SPEECH`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Block threshold, e.g. `BLOCK_ONLY_HIGH`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<String>,
    /// `SEVERITY` or `PROBABILITY` (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Reasoning controls.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    /// Return thought parts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_thoughts: Option<bool>,
    /// Token budget; `0` disables, `-1` lets the model decide.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_budget: Option<i64>,
    /// Discrete level (`LOW`, `HIGH`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_level: Option<String>,
}

/// A prebuilt voice selection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    /// `{ "voiceName": ... }`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prebuilt_voice_config: Option<Value>,
}

/// Speech output settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    /// Single-speaker voice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_config: Option<VoiceConfig>,
    /// Multi-speaker voices (direct backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_speaker_voice_config: Option<Value>,
    /// BCP-47 language code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

/// Client-side automatic function calling controls. Never sent on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomaticFunctionCallingConfig {
    /// Disable the loop and return function calls to the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,
    /// Upper bound on generation rounds. Must be a positive integer; any other
    /// value disables the loop. Defaults to 10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_remote_calls: Option<f64>,
    /// Do not attach the accumulated history to the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_call_history: Option<bool>,
}

/// Optional parameters for content generation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentConfig {
    /// Instructions that steer the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling mass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Top-k sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<f64>,
    /// Number of candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<u32>,
    /// Output token limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    /// Return log probabilities of chosen tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_logprobs: Option<bool>,
    /// Number of top alternative tokens to report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<u32>,
    /// Presence penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Frequency penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Sampling seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Output MIME type, e.g. `application/json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    /// OpenAPI schema the output must follow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    /// JSON Schema the output must follow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_json_schema: Option<Value>,
    /// Model routing (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_config: Option<Value>,
    /// Model selection preference (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_selection_config: Option<Value>,
    /// Per-category safety thresholds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,
    /// Tools the model may use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolUnion>>,
    /// Shared tool configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
    /// Billing labels (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    /// Cached content resource used as a prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_content: Option<String>,
    /// Requested output modalities (`TEXT`, `IMAGE`, `AUDIO`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    /// Media resolution for inputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_resolution: Option<String>,
    /// Speech output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
    /// Timestamp understanding for audio (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_timestamp: Option<bool>,
    /// Reasoning controls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
    /// Image output settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<Value>,
    /// Civic answer quality (direct backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_enhanced_civic_answers: Option<bool>,
    /// Automatic function calling controls.
    #[serde(skip)]
    pub automatic_function_calling: Option<AutomaticFunctionCallingConfig>,
    /// Per-call transport options.
    #[serde(skip)]
    pub http_options: Option<RequestOptions>,
}

/// A content-generation request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentParameters {
    /// Model id or resource name.
    pub model: String,
    /// Conversation so far.
    pub contents: Vec<Content>,
    /// Optional configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<GenerateContentConfig>,
}

impl GenerateContentParameters {
    /// A request with default configuration.
    #[must_use]
    pub fn new(model: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            model: model.into(),
            contents,
            config: None,
        }
    }

    /// Attach a configuration.
    #[must_use]
    pub fn with_config(mut self, config: GenerateContentConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Transport options from the config, if any.
    #[must_use]
    pub fn request_options(&self) -> RequestOptions {
        self.config
            .as_ref()
            .and_then(|c| c.http_options.clone())
            .unwrap_or_default()
    }
}
