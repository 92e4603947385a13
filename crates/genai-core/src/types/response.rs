//! Content-generation responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::{Content, FunctionCall};

/// Token accounting for a request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt, including cached content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_token_count: Option<u32>,
    /// Tokens served from cached content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_content_token_count: Option<u32>,
    /// Tokens across all candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates_token_count: Option<u32>,
    /// Tokens in tool-use prompts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_use_prompt_token_count: Option<u32>,
    /// Reasoning tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thoughts_token_count: Option<u32>,
    /// Total tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_token_count: Option<u32>,
    /// Per-modality prompt breakdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens_details: Option<Value>,
    /// Per-modality candidate breakdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates_tokens_details: Option<Value>,
    /// Traffic type (managed backend).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_type: Option<String>,
}

/// Safety rating for one harm category.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyRating {
    /// Harm category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Probability bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<String>,
    /// Whether this rating blocked the content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked: Option<bool>,
    /// Probability score (managed backend).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability_score: Option<f64>,
    /// Severity bucket (managed backend).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Severity score (managed backend).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_score: Option<f64>,
}

/// Source attributions for a candidate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationMetadata {
    /// Citations, each with `startIndex`, `endIndex`, `uri`, `title`, `license`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Value>>,
}

/// One response candidate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Why generation stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Human-readable detail for `finish_reason`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_message: Option<String>,
    /// Index among candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Tokens in this candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u32>,
    /// Average log probability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_logprobs: Option<f64>,
    /// Per-token log probabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs_result: Option<Value>,
    /// Safety ratings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_ratings: Option<Vec<SafetyRating>>,
    /// Citations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_metadata: Option<CitationMetadata>,
    /// Grounding sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<Value>,
    /// URL context retrieval results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_context_metadata: Option<Value>,
}

/// Response of `generateContent`, or one chunk of `streamGenerateContent`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<Candidate>>,
    /// Prompt safety feedback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<Value>,
    /// Token accounting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
    /// Model version that produced the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    /// Response id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    /// Creation timestamp (managed backend).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// Turns exchanged by automatic function calling, excluding the final response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic_function_calling_history: Option<Vec<Content>>,
}

impl GenerateContentResponse {
    /// Content of the first candidate.
    #[must_use]
    pub fn first_content(&self) -> Option<&Content> {
        self.candidates.as_ref()?.first()?.content.as_ref()
    }

    /// Concatenated text of the first candidate.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.first_content()?.text()
    }

    /// Function calls in the first candidate, in order.
    #[must_use]
    pub fn function_calls(&self) -> Vec<FunctionCall> {
        self.first_content()
            .map(|c| {
                c.parts()
                    .iter()
                    .filter_map(|p| p.as_function_call().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}
