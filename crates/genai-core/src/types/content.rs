//! Conversation content: turns and their parts.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Roles
// ─────────────────────────────────────────────────────────────────────────────

/// Role of the end user.
pub const ROLE_USER: &str = "user";
/// Role of the model.
pub const ROLE_MODEL: &str = "model";

// ─────────────────────────────────────────────────────────────────────────────
// Part payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Raw bytes with a MIME type. `data` holds standard base64.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// IANA MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Base64-encoded bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Display name (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Blob {
    /// Encode raw bytes.
    #[must_use]
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: Some(mime_type.into()),
            data: Some(STANDARD.encode(bytes)),
            display_name: None,
        }
    }

    /// Decode the payload. Returns `None` if absent or not valid base64.
    #[must_use]
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.data.as_deref().and_then(|d| STANDARD.decode(d).ok())
    }
}

/// Reference to previously uploaded or remotely hosted data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// IANA MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// URI of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_uri: Option<String>,
    /// Display name (managed backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A function invocation requested by the model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
    /// Correlation id echoed back in the matching [`FunctionResponse`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Function name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Arguments as a JSON object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

/// The result of executing a [`FunctionCall`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    /// Id of the originating call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Function name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Result as a JSON object. Use `output` for the value and `error` for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

/// Code generated by the model for the code-execution tool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutableCode {
    /// Programming language (e.g. `PYTHON`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Source code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Outcome of running [`ExecutableCode`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeExecutionResult {
    /// Outcome (e.g. `OUTCOME_OK`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// stdout, or stderr on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Clip boundaries for video input (managed backend only).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    /// Start offset, e.g. `"1.5s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<String>,
    /// End offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<String>,
    /// Sampling frame rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
}

/// The single payload of a [`Part`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartData {
    /// Plain text.
    Text(String),
    /// Inline bytes.
    InlineData(Blob),
    /// File reference.
    FileData(FileData),
    /// Model-issued function call.
    FunctionCall(FunctionCall),
    /// Caller-supplied function result.
    FunctionResponse(FunctionResponse),
    /// Generated code.
    ExecutableCode(ExecutableCode),
    /// Code execution outcome.
    CodeExecutionResult(CodeExecutionResult),
}

// ─────────────────────────────────────────────────────────────────────────────
// Part
// ─────────────────────────────────────────────────────────────────────────────

/// One element of a [`Content`] turn.
///
/// A part carries at most one payload in [`PartData`] plus optional metadata. Parts
/// whose payload kind is unknown decode with `data: None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Whether this text is model reasoning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
    /// Opaque signature for reusing the thought in later turns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought_signature: Option<String>,
    /// Video clip metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_metadata: Option<VideoMetadata>,
    /// Payload.
    #[serde(flatten)]
    pub data: Option<PartData>,
}

impl Part {
    fn with(data: PartData) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// A text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::with(PartData::Text(text.into()))
    }

    /// An inline-bytes part.
    #[must_use]
    pub fn inline_data(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::with(PartData::InlineData(Blob::from_bytes(mime_type, bytes)))
    }

    /// A file-reference part.
    #[must_use]
    pub fn file_data(file_uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::with(PartData::FileData(FileData {
            mime_type: Some(mime_type.into()),
            file_uri: Some(file_uri.into()),
            display_name: None,
        }))
    }

    /// A function-call part.
    #[must_use]
    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        Self::with(PartData::FunctionCall(FunctionCall {
            id: None,
            name: Some(name.into()),
            args: Some(args),
        }))
    }

    /// A function-response part.
    #[must_use]
    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self::with(PartData::FunctionResponse(FunctionResponse {
            id: None,
            name: Some(name.into()),
            response: Some(response),
        }))
    }

    /// The text payload, if this is a text part.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            Some(PartData::Text(t)) => Some(t),
            _ => None,
        }
    }

    /// The function call, if this is a function-call part.
    #[must_use]
    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match &self.data {
            Some(PartData::FunctionCall(fc)) => Some(fc),
            _ => None,
        }
    }

    /// Whether the part is flagged as reasoning.
    #[must_use]
    pub fn is_thought(&self) -> bool {
        self.thought.unwrap_or(false)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Content
// ─────────────────────────────────────────────────────────────────────────────

/// One conversation turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// `user` or `model`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Ordered parts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
}

impl Content {
    /// A user turn.
    #[must_use]
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some(ROLE_USER.into()),
            parts: Some(parts),
        }
    }

    /// A model turn.
    #[must_use]
    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Some(ROLE_MODEL.into()),
            parts: Some(parts),
        }
    }

    /// A user turn with a single text part.
    #[must_use]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::user(vec![Part::text(text)])
    }

    /// Parts, or an empty slice.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        self.parts.as_deref().unwrap_or_default()
    }

    /// Concatenated non-thought text.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let mut out = String::new();
        let mut any = false;
        for part in self.parts() {
            if part.is_thought() {
                continue;
            }
            if let Some(t) = part.as_text() {
                out.push_str(t);
                any = true;
            }
        }
        any.then_some(out)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::user_text(text)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::user_text(text)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
