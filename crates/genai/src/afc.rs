//! Automatic function calling.
//!
//! When a request registers [`CallableTool`]s, the model's function calls are
//! executed locally and their results sent back as a user turn, round after
//! round, until the model answers without calls or the round ceiling is reached.
//! The response returned at the ceiling still carries its (already executed)
//! function calls.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use genai_core::types::{
    Candidate, CallableTool, Content, FunctionCall, GenerateContentConfig,
    GenerateContentParameters, GenerateContentResponse, Part,
};
use genai_core::{GenAiError, Result};
use tracing::{debug, info, warn};

/// Callable tools and limits for one call.
#[derive(Clone)]
pub struct AfcPlan {
    tools: HashMap<String, Arc<dyn CallableTool>>,
    max_remote_calls: u32,
    ignore_call_history: bool,
}

impl std::fmt::Debug for AfcPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("AfcPlan")
            .field("tools", &names)
            .field("max_remote_calls", &self.max_remote_calls)
            .field("ignore_call_history", &self.ignore_call_history)
            .finish()
    }
}

/// Positive integral ceiling, or `None` when the value disables the loop.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::float_cmp)]
fn ceiling(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        None
    }
}

/// Decide whether automatic function calling applies to a request.
///
/// Returns `Ok(None)` for a single pass-through call: no callable tools, the loop
/// disabled, or an unusable ceiling (logged). Two callables declaring the same
/// function name is an [`GenAiError::InvalidRequest`].
pub fn plan(config: Option<&GenerateContentConfig>, default_ceiling: u32) -> Result<Option<AfcPlan>> {
    let Some(config) = config else {
        return Ok(None);
    };
    let mut tools: HashMap<String, Arc<dyn CallableTool>> = HashMap::new();
    for callable in config.tools.iter().flatten().filter_map(|t| t.as_callable()) {
        let declaration = callable.declaration();
        for name in declaration
            .function_declarations
            .iter()
            .flatten()
            .filter_map(|f| f.name.clone())
        {
            if tools.contains_key(&name) {
                return Err(GenAiError::invalid_request(format!(
                    "function '{name}' is declared by more than one callable tool"
                )));
            }
            let _ = tools.insert(name, Arc::clone(callable));
        }
    }
    if tools.is_empty() {
        return Ok(None);
    }

    let afc = config.automatic_function_calling.clone().unwrap_or_default();
    if afc.disable == Some(true) {
        debug!("automatic function calling disabled by request");
        return Ok(None);
    }
    let max_remote_calls = match afc.maximum_remote_calls {
        None if default_ceiling == 0 => {
            warn!("default maximum_remote_calls is 0; automatic function calling disabled");
            return Ok(None);
        }
        None => default_ceiling,
        Some(value) => {
            let Some(max) = ceiling(value) else {
                warn!(maximum_remote_calls = value, "maximum_remote_calls must be a positive integer; automatic function calling disabled");
                return Ok(None);
            };
            max
        }
    };
    Ok(Some(AfcPlan {
        tools,
        max_remote_calls,
        ignore_call_history: afc.ignore_call_history.unwrap_or(false),
    }))
}

impl AfcPlan {
    /// Round ceiling.
    pub fn max_remote_calls(&self) -> u32 {
        self.max_remote_calls
    }

    /// Execute `calls` in order, one function-response part (or more) per call.
    ///
    /// A call naming no registered callable is a [`GenAiError::Tool`] error.
    pub async fn execute(&self, calls: &[FunctionCall]) -> Result<Vec<Part>> {
        let mut parts = Vec::with_capacity(calls.len());
        for call in calls {
            let name = call.name.clone().unwrap_or_default();
            let Some(tool) = self.tools.get(&name) else {
                return Err(GenAiError::Tool {
                    name,
                    message: "no callable tool is registered for this function".into(),
                });
            };
            debug!(function = %name, "invoking callable tool");
            parts.extend(tool.call_tool(std::slice::from_ref(call)).await?);
        }
        Ok(parts)
    }

    fn attach_history(&self, response: &mut GenerateContentResponse, history: &[Content]) {
        if !self.ignore_call_history {
            response.automatic_function_calling_history = Some(history.to_vec());
        }
    }
}

fn next_request(params: &GenerateContentParameters, history: &[Content]) -> GenerateContentParameters {
    GenerateContentParameters {
        model: params.model.clone(),
        contents: history.to_vec(),
        config: params.config.clone(),
    }
}

/// Run the unary loop, issuing each round through `generate`.
pub async fn run<F, Fut>(
    plan: &AfcPlan,
    params: GenerateContentParameters,
    mut generate: F,
) -> Result<GenerateContentResponse>
where
    F: FnMut(GenerateContentParameters) -> Fut,
    Fut: Future<Output = Result<GenerateContentResponse>>,
{
    let mut history = params.contents.clone();
    let mut remote_calls = 0u32;
    loop {
        let mut response = generate(next_request(&params, &history)).await?;
        let calls = response.function_calls();
        if calls.is_empty() {
            if remote_calls > 0 {
                plan.attach_history(&mut response, &history);
            }
            return Ok(response);
        }

        let results = plan.execute(&calls).await?;
        let model_turn = response
            .first_content()
            .cloned()
            .unwrap_or_else(|| Content::model(Vec::new()));
        history.push(model_turn);
        history.push(Content::user(results));
        remote_calls += 1;

        if remote_calls >= plan.max_remote_calls {
            info!(remote_calls, "maximum remote calls reached; returning last response");
            plan.attach_history(&mut response, &history);
            return Ok(response);
        }
    }
}

/// Response chunk carrying a round's tool results as a user turn.
fn tool_results_chunk(turn: Content) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: Some(vec![Candidate {
            content: Some(turn),
            ..Candidate::default()
        }]),
        ..GenerateContentResponse::default()
    }
}

/// Run the streaming loop, opening each round's stream through `open`.
///
/// Every upstream chunk is re-emitted as it arrives. Once a round's stream
/// drains with function calls pending, the tools run and one tool-results chunk
/// is emitted before the next round opens. The first error ends the stream.
pub fn run_stream<F, Fut>(
    plan: AfcPlan,
    params: GenerateContentParameters,
    mut open: F,
) -> impl Stream<Item = Result<GenerateContentResponse>> + Send
where
    F: FnMut(GenerateContentParameters) -> Fut + Send + 'static,
    Fut: Future<Output = Result<BoxStream<'static, Result<GenerateContentResponse>>>> + Send,
{
    async_stream::stream! {
        let mut history = params.contents.clone();
        let mut remote_calls = 0u32;
        loop {
            let mut upstream = match open(next_request(&params, &history)).await {
                Ok(upstream) => upstream,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let mut model_parts: Vec<Part> = Vec::new();
            let mut calls: Vec<FunctionCall> = Vec::new();
            while let Some(chunk) = upstream.next().await {
                match chunk {
                    Ok(chunk) => {
                        if let Some(content) = chunk.first_content() {
                            model_parts.extend(content.parts().iter().cloned());
                        }
                        calls.extend(chunk.function_calls());
                        yield Ok(chunk);
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
            if calls.is_empty() {
                return;
            }

            let results = match plan.execute(&calls).await {
                Ok(results) => results,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let tool_turn = Content::user(results);
            history.push(Content::model(model_parts));
            history.push(tool_turn.clone());
            remote_calls += 1;
            yield Ok(tool_results_chunk(tool_turn));

            if remote_calls >= plan.max_remote_calls {
                info!(remote_calls, "maximum remote calls reached; ending stream");
                return;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
