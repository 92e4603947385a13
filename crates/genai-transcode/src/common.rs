//! Field tables shared by several capabilities: content, parts, tools, safety and
//! speech settings, candidates.

use crate::table::{FieldRule, field};

/// Inline bytes.
pub const BLOB: &[FieldRule] = &[
    field("data"),
    field("mimeType"),
    field("displayName").managed_only(),
];

/// File reference.
pub const FILE_DATA: &[FieldRule] = &[
    field("fileUri"),
    field("mimeType"),
    field("displayName").managed_only(),
];

/// Model-issued function call.
pub const FUNCTION_CALL: &[FieldRule] = &[field("id"), field("name"), field("args")];

/// Caller-supplied function result.
pub const FUNCTION_RESPONSE: &[FieldRule] = &[field("id"), field("name"), field("response")];

/// One part of a turn.
pub const PART: &[FieldRule] = &[
    field("videoMetadata").managed_only(),
    field("thought"),
    field("thoughtSignature"),
    field("inlineData").nested(BLOB),
    field("fileData").nested(FILE_DATA),
    field("functionCall").nested(FUNCTION_CALL),
    field("functionResponse").nested(FUNCTION_RESPONSE),
    field("executableCode"),
    field("codeExecutionResult"),
    field("text"),
];

/// One conversation turn.
pub const CONTENT: &[FieldRule] = &[field("role"), field("parts").nested(PART)];

/// Function declaration inside a tool.
pub const FUNCTION_DECLARATION: &[FieldRule] = &[
    field("name"),
    field("description"),
    field("parameters"),
    field("parametersJsonSchema"),
    field("response"),
    field("behavior").direct_only(),
];

/// Tool declaration.
pub const TOOL: &[FieldRule] = &[
    field("functionDeclarations").nested(FUNCTION_DECLARATION),
    field("googleSearch"),
    field("googleSearchRetrieval"),
    field("codeExecution"),
    field("urlContext"),
    field("retrieval").managed_only(),
    field("enterpriseWebSearch").managed_only(),
];

/// Function-calling and retrieval settings.
pub const TOOL_CONFIG: &[FieldRule] = &[field("functionCallingConfig"), field("retrievalConfig")];

/// One safety threshold.
pub const SAFETY_SETTING: &[FieldRule] = &[
    field("category"),
    field("threshold"),
    field("method").managed_only(),
];

/// Speech output settings.
pub const SPEECH_CONFIG: &[FieldRule] = &[
    field("voiceConfig"),
    field("multiSpeakerVoiceConfig").direct_only(),
    field("languageCode"),
];

/// Citation block of a candidate.
pub const CITATION_METADATA: &[FieldRule] = &[field("citations").direct_as("citationSources")];

/// One response candidate.
pub const CANDIDATE: &[FieldRule] = &[
    field("content").nested(CONTENT),
    field("citationMetadata").nested(CITATION_METADATA),
    field("tokenCount"),
    field("finishReason"),
    field("finishMessage"),
    field("avgLogprobs"),
    field("groundingMetadata"),
    field("index"),
    field("logprobsResult"),
    field("safetyRatings"),
    field("urlContextMetadata"),
];

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
