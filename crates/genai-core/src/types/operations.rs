//! Long-running operation polling.

use serde::{Deserialize, Serialize};

use crate::descriptor::RequestOptions;

/// Parameters for polling an operation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOperationParameters {
    /// Operation resource name.
    pub operation_name: String,
    /// Model that started the operation; needed by the managed backend, derived
    /// from `operation_name` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    /// Per-call transport options.
    #[serde(skip)]
    pub http_options: Option<RequestOptions>,
}
