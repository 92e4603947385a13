//! Transcoders for the `models` capability family: content generation, token
//! counting, embeddings, image and video generation, and model metadata.

use genai_core::types::{
    CountTokensParameters, CountTokensResponse, EmbedContentParameters, EmbedContentResponse,
    GenerateContentParameters, GenerateContentResponse, GenerateImagesParameters,
    GenerateImagesResponse, GenerateVideosOperation, GenerateVideosParameters, GetModelParameters,
    ListModelsParameters, ListModelsResponse, Model,
};
use genai_core::{BackendTarget, GenAiError, HttpMethod, HttpRequestDescriptor, Result};
use serde_json::Value;

use crate::common::{CANDIDATE, CONTENT, SAFETY_SETTING, SPEECH_CONFIG, TOOL, TOOL_CONFIG};
use crate::table::{
    FieldRule, Transform, TranscodeContext, decode_into, encode, encode_request, field,
};

// ─────────────────────────────────────────────────────────────────────────────
// generateContent
// ─────────────────────────────────────────────────────────────────────────────

/// `generateContent` / `streamGenerateContent` request.
pub const GENERATE_CONTENT: &[FieldRule] = &[
    field("model").to("_url.model").with(Transform::Model),
    field("contents").nested(CONTENT),
    field("config.systemInstruction").to("systemInstruction").nested(CONTENT),
    field("config.temperature").to("generationConfig.temperature"),
    field("config.topP").to("generationConfig.topP"),
    field("config.topK").to("generationConfig.topK"),
    field("config.candidateCount").to("generationConfig.candidateCount"),
    field("config.maxOutputTokens").to("generationConfig.maxOutputTokens"),
    field("config.stopSequences").to("generationConfig.stopSequences"),
    field("config.responseLogprobs").to("generationConfig.responseLogprobs"),
    field("config.logprobs").to("generationConfig.logprobs"),
    field("config.presencePenalty").to("generationConfig.presencePenalty"),
    field("config.frequencyPenalty").to("generationConfig.frequencyPenalty"),
    field("config.seed").to("generationConfig.seed"),
    field("config.responseMimeType").to("generationConfig.responseMimeType"),
    field("config.responseSchema").to("generationConfig.responseSchema"),
    field("config.responseJsonSchema").to("generationConfig.responseJsonSchema"),
    field("config.routingConfig")
        .managed_only()
        .managed_as("generationConfig.routingConfig"),
    field("config.modelSelectionConfig")
        .managed_only()
        .managed_as("generationConfig.modelConfig"),
    field("config.safetySettings").to("safetySettings").nested(SAFETY_SETTING),
    field("config.tools").to("tools").nested(TOOL),
    field("config.toolConfig").to("toolConfig").nested(TOOL_CONFIG),
    field("config.labels").to("labels").managed_only(),
    field("config.cachedContent")
        .to("cachedContent")
        .with(Transform::CachedContentName),
    field("config.responseModalities").to("generationConfig.responseModalities"),
    field("config.mediaResolution").to("generationConfig.mediaResolution"),
    field("config.speechConfig")
        .to("generationConfig.speechConfig")
        .nested(SPEECH_CONFIG),
    field("config.audioTimestamp")
        .to("generationConfig.audioTimestamp")
        .managed_only(),
    field("config.thinkingConfig").to("generationConfig.thinkingConfig"),
    field("config.imageConfig").to("generationConfig.imageConfig"),
    field("config.enableEnhancedCivicAnswers")
        .to("generationConfig.enableEnhancedCivicAnswers")
        .direct_only(),
];

/// `generateContent` response (and each streamed chunk).
pub const GENERATE_CONTENT_RESPONSE: &[FieldRule] = &[
    field("candidates").nested(CANDIDATE),
    field("createTime"),
    field("modelVersion"),
    field("promptFeedback"),
    field("responseId"),
    field("usageMetadata"),
];

/// Build a unary `generateContent` request.
pub fn generate_content_request(
    params: &GenerateContentParameters,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    Ok(encode_request(
        GENERATE_CONTENT,
        params,
        ctx,
        "{model}:generateContent",
        HttpMethod::Post,
    )?
    .with_options(params.request_options()))
}

/// Build a streaming `streamGenerateContent` request. The transport adds the
/// `alt=sse` negotiation parameter.
pub fn stream_generate_content_request(
    params: &GenerateContentParameters,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    Ok(encode_request(
        GENERATE_CONTENT,
        params,
        ctx,
        "{model}:streamGenerateContent",
        HttpMethod::Post,
    )?
    .with_options(params.request_options()))
}

/// Decode a `generateContent` response or stream chunk.
pub fn generate_content_response(
    wire: &Value,
    ctx: &TranscodeContext,
) -> Result<GenerateContentResponse> {
    decode_into(GENERATE_CONTENT_RESPONSE, wire, ctx)
}

// ─────────────────────────────────────────────────────────────────────────────
// countTokens
// ─────────────────────────────────────────────────────────────────────────────

/// `countTokens` request.
pub const COUNT_TOKENS: &[FieldRule] = &[
    field("model").to("_url.model").with(Transform::Model),
    field("contents").nested(CONTENT),
    field("config.systemInstruction")
        .to("systemInstruction")
        .nested(CONTENT)
        .managed_only(),
    field("config.tools").to("tools").nested(TOOL).managed_only(),
    field("config.generationConfig")
        .to("generationConfig")
        .managed_only(),
];

/// `countTokens` response.
pub const COUNT_TOKENS_RESPONSE: &[FieldRule] =
    &[field("totalTokens"), field("cachedContentTokenCount")];

/// Build a `countTokens` request.
pub fn count_tokens_request(
    params: &CountTokensParameters,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    let options = params
        .config
        .as_ref()
        .and_then(|c| c.http_options.clone())
        .unwrap_or_default();
    Ok(encode_request(COUNT_TOKENS, params, ctx, "{model}:countTokens", HttpMethod::Post)?
        .with_options(options))
}

/// Decode a `countTokens` response.
pub fn count_tokens_response(wire: &Value, ctx: &TranscodeContext) -> Result<CountTokensResponse> {
    decode_into(COUNT_TOKENS_RESPONSE, wire, ctx)
}

// ─────────────────────────────────────────────────────────────────────────────
// embedContent
// ─────────────────────────────────────────────────────────────────────────────

fn encode_embed_contents(value: &Value, ctx: &TranscodeContext) -> Result<Value> {
    let Value::Array(contents) = value else {
        return Err(GenAiError::invalid_request("contents must be a list"));
    };
    contents
        .iter()
        .map(|content| match ctx.backend {
            BackendTarget::Direct => encode(CONTENT, content, ctx),
            BackendTarget::Managed => managed_embed_text(content, ctx),
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// The managed `predict` instance carries a single text string per content.
fn managed_embed_text(content: &Value, ctx: &TranscodeContext) -> Result<Value> {
    let parts = content
        .get("parts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let unsupported = |field: String| GenAiError::FieldNotSupported {
        field,
        backend: ctx.backend,
    };
    match parts {
        [] => Ok(Value::Null),
        [part] => {
            let Some(fields) = part.as_object() else {
                return Err(GenAiError::invalid_request("contents[].parts[0] must be an object"));
            };
            if let Some(other) = fields.keys().find(|k| k.as_str() != "text") {
                return Err(unsupported(format!("contents[].parts[0].{other}")));
            }
            Ok(fields.get("text").cloned().unwrap_or(Value::Null))
        }
        [_, ..] => Err(unsupported("contents[].parts[1]".into())),
    }
}

fn passthrough(value: &Value, _ctx: &TranscodeContext) -> Result<Value> {
    Ok(value.clone())
}

/// `embedContent` request: batched `requests[]` on Direct, `instances[]` plus
/// `parameters` on Managed.
pub const EMBED_CONTENT: &[FieldRule] = &[
    field("model").to("_url.model").with(Transform::Model),
    field("contents")
        .direct_as("requests[].content")
        .managed_as("instances[].content")
        .with(Transform::Custom {
            encode: encode_embed_contents,
            decode: passthrough,
        }),
    field("model")
        .direct_as("requests[].model")
        .skip_managed()
        .with(Transform::Model),
    field("config.taskType")
        .direct_as("requests[].taskType")
        .managed_as("instances[].task_type"),
    field("config.title")
        .direct_as("requests[].title")
        .managed_as("instances[].title"),
    field("config.outputDimensionality")
        .direct_as("requests[].outputDimensionality")
        .managed_as("parameters.outputDimensionality"),
    field("config.mimeType")
        .managed_only()
        .managed_as("instances[].mimeType"),
    field("config.autoTruncate")
        .managed_only()
        .managed_as("parameters.autoTruncate"),
];

/// `embedContent` response.
pub const EMBED_CONTENT_RESPONSE: &[FieldRule] = &[
    field("embeddings").managed_as("predictions[].embeddings"),
    field("metadata").skip_direct(),
];

/// Build an `embedContent` request.
pub fn embed_content_request(
    params: &EmbedContentParameters,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    let template = match ctx.backend {
        BackendTarget::Direct => "{model}:batchEmbedContents",
        BackendTarget::Managed => "{model}:predict",
    };
    let options = params
        .config
        .as_ref()
        .and_then(|c| c.http_options.clone())
        .unwrap_or_default();
    Ok(encode_request(EMBED_CONTENT, params, ctx, template, HttpMethod::Post)?.with_options(options))
}

/// Decode an `embedContent` response.
pub fn embed_content_response(wire: &Value, ctx: &TranscodeContext) -> Result<EmbedContentResponse> {
    decode_into(EMBED_CONTENT_RESPONSE, wire, ctx)
}

// ─────────────────────────────────────────────────────────────────────────────
// generateImages
// ─────────────────────────────────────────────────────────────────────────────

/// Generated or input image.
pub const IMAGE: &[FieldRule] = &[
    field("gcsUri").managed_only(),
    field("imageBytes").to("bytesBase64Encoded"),
    field("mimeType"),
];

/// `generateImages` request.
pub const GENERATE_IMAGES: &[FieldRule] = &[
    field("model").to("_url.model").with(Transform::Model),
    field("prompt").to("instances[0].prompt"),
    field("config.numberOfImages").to("parameters.sampleCount"),
    field("config.aspectRatio").to("parameters.aspectRatio"),
    field("config.guidanceScale").to("parameters.guidanceScale"),
    field("config.safetyFilterLevel").to("parameters.safetySetting"),
    field("config.personGeneration").to("parameters.personGeneration"),
    field("config.includeRaiReason").to("parameters.includeRaiReason"),
    field("config.outputMimeType").to("parameters.outputOptions.mimeType"),
    field("config.imageSize").to("parameters.sampleImageSize"),
    field("config.negativePrompt")
        .to("parameters.negativePrompt")
        .managed_only(),
    field("config.seed").to("parameters.seed").managed_only(),
    field("config.addWatermark")
        .to("parameters.addWatermark")
        .managed_only(),
    field("config.enhancePrompt")
        .to("parameters.enhancePrompt")
        .managed_only(),
    field("config.outputGcsUri")
        .to("parameters.storageUri")
        .managed_only(),
];

/// One prediction of a `generateImages` response.
pub const GENERATED_IMAGE: &[FieldRule] = &[
    field("image").to("_self").nested(IMAGE),
    field("raiFilteredReason"),
    field("enhancedPrompt").to("prompt"),
];

/// `generateImages` response.
pub const GENERATE_IMAGES_RESPONSE: &[FieldRule] = &[field("generatedImages")
    .to("predictions")
    .nested(GENERATED_IMAGE)];

/// Build a `generateImages` request.
pub fn generate_images_request(
    params: &GenerateImagesParameters,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    let options = params
        .config
        .as_ref()
        .and_then(|c| c.http_options.clone())
        .unwrap_or_default();
    Ok(encode_request(GENERATE_IMAGES, params, ctx, "{model}:predict", HttpMethod::Post)?
        .with_options(options))
}

/// Decode a `generateImages` response.
pub fn generate_images_response(
    wire: &Value,
    ctx: &TranscodeContext,
) -> Result<GenerateImagesResponse> {
    decode_into(GENERATE_IMAGES_RESPONSE, wire, ctx)
}

// ─────────────────────────────────────────────────────────────────────────────
// generateVideos
// ─────────────────────────────────────────────────────────────────────────────

/// `generateVideos` request.
pub const GENERATE_VIDEOS: &[FieldRule] = &[
    field("model").to("_url.model").with(Transform::Model),
    field("prompt").to("instances[0].prompt"),
    field("image").to("instances[0].image").nested(IMAGE),
    field("config.numberOfVideos").to("parameters.sampleCount"),
    field("config.durationSeconds").to("parameters.durationSeconds"),
    field("config.aspectRatio").to("parameters.aspectRatio"),
    field("config.negativePrompt").to("parameters.negativePrompt"),
    field("config.personGeneration").to("parameters.personGeneration"),
    field("config.resolution").to("parameters.resolution"),
    field("config.enhancePrompt").to("parameters.enhancePrompt"),
    field("config.seed").to("parameters.seed").managed_only(),
    field("config.fps").to("parameters.fps").managed_only(),
    field("config.generateAudio")
        .to("parameters.generateAudio")
        .managed_only(),
    field("config.outputGcsUri")
        .to("parameters.storageUri")
        .managed_only(),
];

/// Generated video.
pub const VIDEO: &[FieldRule] = &[
    field("uri").managed_as("gcsUri"),
    field("videoBytes")
        .direct_as("encodedVideo")
        .managed_as("bytesBase64Encoded"),
    field("mimeType").direct_as("encoding"),
];

/// One generated sample.
pub const GENERATED_VIDEO: &[FieldRule] = &[field("video").managed_as("_self").nested(VIDEO)];

/// Result payload of a finished video operation.
pub const GENERATE_VIDEOS_RESPONSE: &[FieldRule] = &[
    field("generatedVideos")
        .direct_as("generatedSamples")
        .managed_as("videos")
        .nested(GENERATED_VIDEO),
    field("raiMediaFilteredCount"),
    field("raiMediaFilteredReasons"),
];

/// Long-running video operation.
pub const GENERATE_VIDEOS_OPERATION: &[FieldRule] = &[
    field("name"),
    field("metadata"),
    field("done"),
    field("error"),
    field("response")
        .direct_as("response.generateVideoResponse")
        .nested(GENERATE_VIDEOS_RESPONSE),
];

/// Build a `generateVideos` request.
pub fn generate_videos_request(
    params: &GenerateVideosParameters,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    let options = params
        .config
        .as_ref()
        .and_then(|c| c.http_options.clone())
        .unwrap_or_default();
    Ok(encode_request(
        GENERATE_VIDEOS,
        params,
        ctx,
        "{model}:predictLongRunning",
        HttpMethod::Post,
    )?
    .with_options(options))
}

/// Decode a video generation operation.
pub fn generate_videos_operation(
    wire: &Value,
    ctx: &TranscodeContext,
) -> Result<GenerateVideosOperation> {
    decode_into(GENERATE_VIDEOS_OPERATION, wire, ctx)
}

// ─────────────────────────────────────────────────────────────────────────────
// models.get / models.list
// ─────────────────────────────────────────────────────────────────────────────

/// Model metadata.
pub const MODEL: &[FieldRule] = &[
    field("name"),
    field("displayName"),
    field("description"),
    field("version").managed_as("versionId"),
    field("tunedModelInfo"),
    field("inputTokenLimit"),
    field("outputTokenLimit"),
    field("supportedActions")
        .direct_as("supportedGenerationMethods")
        .skip_managed(),
    field("temperature"),
    field("maxTemperature"),
    field("topP"),
    field("topK"),
    field("thinking"),
    field("labels"),
    field("endpoints"),
];

/// `models.get` request.
pub const GET_MODEL: &[FieldRule] = &[field("model").to("_url.name").with(Transform::Model)];

/// `models.list` request.
pub const LIST_MODELS: &[FieldRule] = &[
    field("config.pageSize").to("_query.pageSize"),
    field("config.pageToken").to("_query.pageToken"),
    field("config.filter").to("_query.filter"),
];

/// `models.list` response.
pub const LIST_MODELS_RESPONSE: &[FieldRule] =
    &[field("nextPageToken"), field("models").nested(MODEL)];

/// Build a `models.get` request.
pub fn get_model_request(
    params: &GetModelParameters,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    Ok(encode_request(GET_MODEL, params, ctx, "{name}", HttpMethod::Get)?
        .with_options(params.http_options.clone().unwrap_or_default()))
}

/// Decode model metadata.
pub fn model_response(wire: &Value, ctx: &TranscodeContext) -> Result<Model> {
    decode_into(MODEL, wire, ctx)
}

/// Collection path for `models.list`: base models by default, tuned models when
/// `query_base` is `false`.
fn list_models_path(query_base: bool, backend: BackendTarget) -> &'static str {
    match (backend, query_base) {
        (BackendTarget::Direct, true) => "models",
        (BackendTarget::Direct, false) => "tunedModels",
        (BackendTarget::Managed, true) => "publishers/google/models",
        (BackendTarget::Managed, false) => "models",
    }
}

/// Build a `models.list` request.
pub fn list_models_request(
    params: &ListModelsParameters,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    let config = params.config.as_ref();
    let query_base = config.and_then(|c| c.query_base).unwrap_or(true);
    let options = config
        .and_then(|c| c.http_options.clone())
        .unwrap_or_default();
    Ok(encode_request(
        LIST_MODELS,
        params,
        ctx,
        list_models_path(query_base, ctx.backend),
        HttpMethod::Get,
    )?
    .with_options(options))
}

/// Decode a `models.list` page.
pub fn list_models_response(wire: &Value, ctx: &TranscodeContext) -> Result<ListModelsResponse> {
    decode_into(LIST_MODELS_RESPONSE, wire, ctx)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
