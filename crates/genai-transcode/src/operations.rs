//! Transcoders for long-running operation polling.
//!
//! Direct polls the operation resource itself. Managed asks the model that started
//! the operation via `fetchPredictOperation`.

use genai_core::types::GetOperationParameters;
use genai_core::{BackendTarget, GenAiError, HttpMethod, HttpRequestDescriptor, Result};
use serde_json::json;

use crate::table::{FieldRule, TranscodeContext, encode_request, field};

/// Operation polling request.
pub const GET_OPERATION: &[FieldRule] = &[
    field("operationName")
        .direct_as("_url.operationName")
        .managed_as("operationName"),
    field("resourceName")
        .to("_url.resourceName")
        .skip_direct(),
];

/// Resource that owns an operation name (`…/operations/{id}` minus the suffix).
pub fn operation_resource(operation_name: &str) -> Option<&str> {
    operation_name
        .split_once("/operations/")
        .map(|(resource, _)| resource)
}

/// Build an operation polling request.
pub fn get_operation_request(
    params: &GetOperationParameters,
    ctx: &TranscodeContext,
) -> Result<HttpRequestDescriptor> {
    if params.operation_name.is_empty() {
        return Err(GenAiError::invalid_request("operation name must not be empty"));
    }
    let options = params.http_options.clone().unwrap_or_default();
    let descriptor = match ctx.backend {
        BackendTarget::Direct => encode_request(
            GET_OPERATION,
            params,
            ctx,
            "{operationName}",
            HttpMethod::Get,
        )?,
        BackendTarget::Managed => {
            let resource = params
                .resource_name
                .as_deref()
                .or_else(|| operation_resource(&params.operation_name))
                .ok_or_else(|| {
                    GenAiError::invalid_request(format!(
                        "cannot derive the owning model from operation '{}'",
                        params.operation_name
                    ))
                })?;
            let canonical = json!({
                "operationName": params.operation_name,
                "resourceName": resource,
            });
            encode_request(
                GET_OPERATION,
                &canonical,
                ctx,
                "{resourceName}:fetchPredictOperation",
                HttpMethod::Post,
            )?
        }
    };
    Ok(descriptor.with_options(options))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
