//! The `operations` capability: polling long-running operations.

use std::sync::Arc;
use std::time::Duration;

use genai_core::types::{GenerateVideosOperation, GetOperationParameters};
use genai_core::{GenAiError, RequestOptions, Result};
use genai_transcode::models::generate_videos_operation;
use genai_transcode::operations::get_operation_request;
use tracing::{debug, instrument};

use crate::client::ClientInner;

/// Handle for the `operations` capability.
#[derive(Clone, Debug)]
pub struct Operations {
    inner: Arc<ClientInner>,
}

impl Operations {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Current state of a video generation operation.
    #[instrument(skip_all, fields(operation = %params.operation_name))]
    pub async fn get_videos_operation(
        &self,
        params: GetOperationParameters,
    ) -> Result<GenerateVideosOperation> {
        let descriptor = get_operation_request(&params, &self.inner.ctx)?;
        let wire = self.inner.api.request(descriptor).await?;
        generate_videos_operation(&wire, &self.inner.ctx)
    }

    /// Poll `operation` every `interval` until it is done.
    ///
    /// Bounded by `options.timeout_ms` and cancellable through `options.cancel`.
    #[instrument(skip_all, fields(operation = operation.name.as_deref().unwrap_or_default()))]
    pub async fn wait_for_videos(
        &self,
        operation: GenerateVideosOperation,
        interval: Duration,
        options: RequestOptions,
    ) -> Result<GenerateVideosOperation> {
        let name = operation
            .name
            .clone()
            .ok_or_else(|| GenAiError::invalid_request("operation has no name"))?;
        let deadline = options
            .timeout_ms
            .map(|ms| tokio::time::Instant::now() + Duration::from_millis(ms));
        let cancel = options.cancel.clone().unwrap_or_default();
        let mut current = operation;
        while !current.is_done() {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(GenAiError::Cancelled),
                () = sleep_until(deadline) => {
                    return Err(GenAiError::Timeout { timeout_ms: options.timeout_ms.unwrap_or_default() });
                }
                () = tokio::time::sleep(interval) => {}
            }
            debug!(operation = %name, "polling operation");
            current = self
                .get_videos_operation(GetOperationParameters {
                    operation_name: name.clone(),
                    resource_name: None,
                    http_options: Some(RequestOptions {
                        timeout_ms: None,
                        cancel: Some(cancel.clone()),
                        headers: options.headers.clone(),
                    }),
                })
                .await?;
        }
        Ok(current)
    }
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
