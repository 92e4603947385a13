//! Live (bidirectional streaming) session messages.
//!
//! Client messages are exactly one of setup, client content, realtime input or
//! tool response. Server messages carry exactly one of the fields of
//! [`LiveServerMessage`] (plus optional usage metadata).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::config::{SpeechConfig, ThinkingConfig};
use super::content::{Blob, Content, FunctionCall, FunctionResponse};
use super::response::UsageMetadata;
use super::tools::Tool;

// ─────────────────────────────────────────────────────────────────────────────
// Connect configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Session resumption request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResumptionConfig {
    /// Handle from a previous session's resumption update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Transparent reconnection (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparent: Option<bool>,
}

/// Configuration sent in the `setup` message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveConnectConfig {
    /// Output modalities (`TEXT` or `AUDIO`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling mass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Top-k sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<f64>,
    /// Output token limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Sampling seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Speech output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
    /// Reasoning controls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
    /// Instructions that steer the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Resume a previous session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_resumption: Option<SessionResumptionConfig>,
    /// Transcribe user audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<Value>,
    /// Transcribe model audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_transcription: Option<Value>,
    /// Voice activity detection settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realtime_input_config: Option<Value>,
    /// Sliding-window context compression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window_compression: Option<Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Client messages
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered conversation turns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveClientContent {
    /// Turns appended to the conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turns: Option<Vec<Content>>,
    /// Whether the model should start generating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_complete: Option<bool>,
}

/// Best-effort realtime media.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveRealtimeInput {
    /// Media chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_chunks: Option<Vec<Blob>>,
    /// Audio chunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<Blob>,
    /// Video frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Blob>,
    /// Realtime text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// End of the audio stream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_stream_end: Option<bool>,
    /// Manual activity start marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_start: Option<Value>,
    /// Manual activity end marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_end: Option<Value>,
}

/// Replies to server-initiated tool calls.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveToolResponse {
    /// One response per call.
    #[serde(default)]
    pub function_responses: Vec<FunctionResponse>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Server messages
// ─────────────────────────────────────────────────────────────────────────────

/// A transcription fragment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    /// Transcribed text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Whether this ends the transcription.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished: Option<bool>,
}

/// Model output.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveServerContent {
    /// Generated content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_turn: Option<Content>,
    /// The model finished its turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_complete: Option<bool>,
    /// The user interrupted generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<bool>,
    /// Generation finished (may precede `turn_complete`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_complete: Option<bool>,
    /// User audio transcription.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_transcription: Option<Transcription>,
    /// Model audio transcription.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_transcription: Option<Transcription>,
    /// Grounding sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<Value>,
}

/// Function calls the client must satisfy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveServerToolCall {
    /// Calls to execute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_calls: Option<Vec<FunctionCall>>,
}

/// Previously issued calls that should not be executed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveServerToolCallCancellation {
    /// Ids of cancelled calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
}

/// Server-initiated shutdown notice.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveServerGoAway {
    /// Time before the connection is closed, e.g. `"10s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_left: Option<String>,
}

/// A fresh resumption handle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveServerSessionResumptionUpdate {
    /// Handle to persist for reconnection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_handle: Option<String>,
    /// Whether the session can be resumed at this point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resumable: Option<bool>,
    /// Index of the last client message covered by the handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_consumed_client_message_index: Option<String>,
}

/// A message received on a live session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveServerMessage {
    /// Setup acknowledged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_complete: Option<Value>,
    /// Model output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_content: Option<LiveServerContent>,
    /// Tool calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<LiveServerToolCall>,
    /// Tool call cancellation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_cancellation: Option<LiveServerToolCallCancellation>,
    /// Shutdown notice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_away: Option<LiveServerGoAway>,
    /// Resumption handle update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_resumption_update: Option<LiveServerSessionResumptionUpdate>,
    /// Token accounting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
}

impl LiveServerMessage {
    /// Concatenated text of the model turn, if any.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.server_content.as_ref()?.model_turn.as_ref()?.text()
    }
}
