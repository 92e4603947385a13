//! Transcoders for live session frames.
//!
//! Client frames are JSON objects with exactly one of `setup`, `clientContent`,
//! `realtimeInput`, or `toolResponse`. Server frames carry exactly one of the
//! members of [`LiveServerMessage`].

use genai_core::types::{
    LiveClientContent, LiveConnectConfig, LiveRealtimeInput, LiveServerMessage, LiveToolResponse,
};
use genai_core::Result;
use serde::Serialize;
use serde_json::Value;

use crate::common::{BLOB, CONTENT, FUNCTION_CALL, FUNCTION_RESPONSE, SPEECH_CONFIG, TOOL};
use crate::table::{FieldRule, Transform, TranscodeContext, decode_into, encode, field};

/// Session resumption settings.
pub const SESSION_RESUMPTION: &[FieldRule] =
    &[field("handle"), field("transparent").managed_only()];

/// `setup` frame.
pub const LIVE_SETUP: &[FieldRule] = &[
    field("model").to("setup.model").with(Transform::CachesModel),
    field("config.responseModalities").to("setup.generationConfig.responseModalities"),
    field("config.temperature").to("setup.generationConfig.temperature"),
    field("config.topP").to("setup.generationConfig.topP"),
    field("config.topK").to("setup.generationConfig.topK"),
    field("config.maxOutputTokens").to("setup.generationConfig.maxOutputTokens"),
    field("config.seed").to("setup.generationConfig.seed"),
    field("config.speechConfig")
        .to("setup.generationConfig.speechConfig")
        .nested(SPEECH_CONFIG),
    field("config.thinkingConfig").to("setup.generationConfig.thinkingConfig"),
    field("config.systemInstruction")
        .to("setup.systemInstruction")
        .nested(CONTENT),
    field("config.tools").to("setup.tools").nested(TOOL),
    field("config.sessionResumption")
        .to("setup.sessionResumption")
        .nested(SESSION_RESUMPTION),
    field("config.inputAudioTranscription").to("setup.inputAudioTranscription"),
    field("config.outputAudioTranscription").to("setup.outputAudioTranscription"),
    field("config.realtimeInputConfig").to("setup.realtimeInputConfig"),
    field("config.contextWindowCompression").to("setup.contextWindowCompression"),
];

/// `clientContent` frame.
pub const LIVE_CLIENT_CONTENT: &[FieldRule] = &[
    field("turns").to("clientContent.turns").nested(CONTENT),
    field("turnComplete").to("clientContent.turnComplete"),
];

/// `realtimeInput` frame.
pub const LIVE_REALTIME_INPUT: &[FieldRule] = &[
    field("mediaChunks").to("realtimeInput.mediaChunks").nested(BLOB),
    field("audio").to("realtimeInput.audio").nested(BLOB),
    field("video").to("realtimeInput.video").nested(BLOB),
    field("text").to("realtimeInput.text"),
    field("audioStreamEnd").to("realtimeInput.audioStreamEnd"),
    field("activityStart").to("realtimeInput.activityStart"),
    field("activityEnd").to("realtimeInput.activityEnd"),
];

/// `toolResponse` frame.
pub const LIVE_TOOL_RESPONSE: &[FieldRule] = &[field("functionResponses")
    .to("toolResponse.functionResponses")
    .nested(FUNCTION_RESPONSE)];

/// Server turn content.
pub const LIVE_SERVER_CONTENT: &[FieldRule] = &[
    field("modelTurn").nested(CONTENT),
    field("turnComplete"),
    field("interrupted"),
    field("generationComplete"),
    field("inputTranscription"),
    field("outputTranscription"),
    field("groundingMetadata"),
];

/// Server-issued tool calls.
pub const LIVE_SERVER_TOOL_CALL: &[FieldRule] =
    &[field("functionCalls").nested(FUNCTION_CALL)];

/// Any server frame.
pub const LIVE_SERVER_MESSAGE: &[FieldRule] = &[
    field("setupComplete"),
    field("serverContent").nested(LIVE_SERVER_CONTENT),
    field("toolCall").nested(LIVE_SERVER_TOOL_CALL),
    field("toolCallCancellation"),
    field("goAway"),
    field("sessionResumptionUpdate"),
    field("usageMetadata"),
];

#[derive(Serialize)]
struct SetupParameters<'a> {
    model: &'a str,
    config: &'a LiveConnectConfig,
}

/// Encode the `setup` frame for `model`.
pub fn setup_message(model: &str, config: &LiveConnectConfig, ctx: &TranscodeContext) -> Result<Value> {
    let canonical = serde_json::to_value(SetupParameters { model, config })?;
    encode(LIVE_SETUP, &canonical, ctx)
}

/// Encode a `clientContent` frame.
pub fn client_content_message(content: &LiveClientContent, ctx: &TranscodeContext) -> Result<Value> {
    encode(LIVE_CLIENT_CONTENT, &serde_json::to_value(content)?, ctx)
}

/// Encode a `realtimeInput` frame.
pub fn realtime_input_message(input: &LiveRealtimeInput, ctx: &TranscodeContext) -> Result<Value> {
    encode(LIVE_REALTIME_INPUT, &serde_json::to_value(input)?, ctx)
}

/// Encode a `toolResponse` frame.
pub fn tool_response_message(response: &LiveToolResponse, ctx: &TranscodeContext) -> Result<Value> {
    encode(LIVE_TOOL_RESPONSE, &serde_json::to_value(response)?, ctx)
}

/// Decode one server frame.
pub fn server_message(wire: &Value, ctx: &TranscodeContext) -> Result<LiveServerMessage> {
    decode_into(LIVE_SERVER_MESSAGE, wire, ctx)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use genai_core::types::{Content, FunctionResponse, SessionResumptionConfig};
    use genai_core::{BackendTarget, GenAiError};
    use serde_json::json;

    #[test]
    fn setup_direct() {
        let config = LiveConnectConfig {
            response_modalities: Some(vec!["TEXT".into()]),
            temperature: Some(0.3),
            system_instruction: Some(Content::user_text("be nice")),
            ..LiveConnectConfig::default()
        };
        let frame = setup_message("gemini-live", &config, &TranscodeContext::direct()).unwrap();
        assert_eq!(frame["setup"]["model"], "models/gemini-live");
        assert_eq!(frame["setup"]["generationConfig"]["responseModalities"][0], "TEXT");
        assert_eq!(frame["setup"]["generationConfig"]["temperature"], 0.3);
        assert_eq!(frame["setup"]["systemInstruction"]["parts"][0]["text"], "be nice");
    }

    #[test]
    fn setup_managed_uses_full_model_path() {
        let ctx = TranscodeContext::managed("p", "us-central1");
        let frame = setup_message("gemini-live", &LiveConnectConfig::default(), &ctx).unwrap();
        assert_eq!(
            frame["setup"]["model"],
            "projects/p/locations/us-central1/publishers/google/models/gemini-live"
        );
    }

    #[test]
    fn transparent_resumption_is_managed_only() {
        let config = LiveConnectConfig {
            session_resumption: Some(SessionResumptionConfig {
                handle: Some("h".into()),
                transparent: Some(true),
            }),
            ..LiveConnectConfig::default()
        };
        assert_matches!(
            setup_message("m", &config, &TranscodeContext::direct()),
            Err(GenAiError::FieldNotSupported { ref field, backend: BackendTarget::Direct })
                if field == "config.sessionResumption.transparent"
        );
        let frame = setup_message("m", &config, &TranscodeContext::managed("p", "l")).unwrap();
        assert_eq!(frame["setup"]["sessionResumption"]["handle"], "h");
    }

    #[test]
    fn client_frames() {
        let ctx = TranscodeContext::direct();
        let content = LiveClientContent {
            turns: Some(vec![Content::user_text("hi")]),
            turn_complete: Some(true),
        };
        let frame = client_content_message(&content, &ctx).unwrap();
        assert_eq!(frame["clientContent"]["turnComplete"], true);
        assert_eq!(frame["clientContent"]["turns"][0]["parts"][0]["text"], "hi");

        let input = LiveRealtimeInput {
            text: Some("typing".into()),
            ..LiveRealtimeInput::default()
        };
        assert_eq!(realtime_input_message(&input, &ctx).unwrap(), json!({"realtimeInput": {"text": "typing"}}));

        let response = LiveToolResponse {
            function_responses: vec![FunctionResponse {
                id: Some("c1".into()),
                name: Some("f".into()),
                response: Some(json!({"ok": true})),
            }],
        };
        let frame = tool_response_message(&response, &ctx).unwrap();
        assert_eq!(frame["toolResponse"]["functionResponses"][0]["id"], "c1");
    }

    #[test]
    fn server_frames_decode() {
        let ctx = TranscodeContext::direct();
        let setup = server_message(&json!({"setupComplete": {}}), &ctx).unwrap();
        assert!(setup.setup_complete.is_some());

        let content = server_message(
            &json!({"serverContent": {"modelTurn": {"parts": [{"text": "yo"}]}, "turnComplete": true}}),
            &ctx,
        )
        .unwrap();
        assert_eq!(content.text().as_deref(), Some("yo"));

        let call = server_message(
            &json!({"toolCall": {"functionCalls": [{"id": "c1", "name": "f", "args": {}}]}}),
            &ctx,
        )
        .unwrap();
        let calls = call.tool_call.unwrap().function_calls.unwrap();
        assert_eq!(calls[0].id.as_deref(), Some("c1"));

        let update = server_message(
            &json!({"sessionResumptionUpdate": {"newHandle": "h2", "resumable": true}}),
            &ctx,
        )
        .unwrap();
        assert_eq!(update.session_resumption_update.unwrap().new_handle.as_deref(), Some("h2"));

        let unknown = server_message(&json!({"somethingNew": 1}), &ctx).unwrap();
        assert!(unknown.server_content.is_none() && unknown.go_away.is_none());
    }
}
