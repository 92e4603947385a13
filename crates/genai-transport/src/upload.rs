//! # Resumable Upload
//!
//! Sends a blob to an upload session in fixed-size chunks.
//!
//! Each chunk carries `X-Goog-Upload-Command` (`upload`, or `upload, finalize`
//! for the last one) and `X-Goog-Upload-Offset`. A chunk is retried with
//! exponential backoff while the server answers without an upload status, or
//! fails transiently. The loop succeeds only when the server reports `final`;
//! running out of bytes while it still says `active`, or any other status, is
//! [`GenAiError::UploadIncomplete`].

use bytes::Bytes;
use genai_core::{GenAiError, RequestOptions, Result};
use genai_settings::UploadSettings;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::api_client::{ApiClient, UploadResponse};
use crate::cancel::CancelScope;

impl ApiClient {
    /// Upload `data` to an open session and return the server's final JSON payload.
    ///
    /// Chunk size and retry schedule come from `settings`. The whole transfer,
    /// backoff sleeps included, runs under one cancellation scope.
    #[instrument(skip_all, fields(size_bytes = data.len()))]
    pub async fn upload_blob(
        &self,
        upload_url: &str,
        data: Bytes,
        settings: &UploadSettings,
        options: &RequestOptions,
    ) -> Result<Value> {
        let scope = self.scope(options);
        let chunk_size = settings.effective_chunk_size();
        let total = data.len();
        let mut offset = 0usize;

        loop {
            let end = offset.saturating_add(chunk_size).min(total);
            let finalize = end == total;
            let chunk = data.slice(offset..end);
            let response = self
                .send_chunk_with_retry(&scope, upload_url, chunk, offset, finalize, settings, options)
                .await?;
            offset = end;

            match response.status.as_deref() {
                Some("final") => {
                    debug!(bytes = total, "upload finalized");
                    return Ok(response.body);
                }
                Some("active") if offset < total => {}
                Some("active") => {
                    return Err(GenAiError::UploadIncomplete {
                        message: format!(
                            "all {total} bytes sent but the server still reports 'active'"
                        ),
                    });
                }
                Some(other) => {
                    return Err(GenAiError::UploadIncomplete {
                        message: format!("unexpected upload status '{other}' at offset {offset}"),
                    });
                }
                None => {
                    return Err(GenAiError::UploadIncomplete {
                        message: format!("no upload status received at offset {offset}"),
                    });
                }
            }
        }
    }

    /// Send one chunk, retrying with backoff.
    ///
    /// Unlike unary requests, a chunk is retried on transport errors as well as
    /// on a missing status header, 429 and 5xx: the upload session lets the same
    /// offset be resent. Cancel and timeout are never retried.
    #[allow(clippy::too_many_arguments)]
    async fn send_chunk_with_retry(
        &self,
        scope: &CancelScope,
        upload_url: &str,
        chunk: Bytes,
        offset: usize,
        finalize: bool,
        settings: &UploadSettings,
        options: &RequestOptions,
    ) -> Result<UploadResponse> {
        let backoff = settings.backoff();
        let attempts = backoff.max_retries.max(1);
        let mut retry = 0;
        loop {
            let result = scope
                .run(self.upload_chunk(upload_url, chunk.clone(), offset as u64, finalize, options))
                .await;
            let retryable = match &result {
                Ok(response) => response.status.is_none(),
                Err(e @ (GenAiError::Cancelled | GenAiError::Timeout { .. })) => {
                    debug!(error = %e, "upload aborted");
                    false
                }
                Err(e) => e.is_retryable(),
            };
            retry += 1;
            if !retryable || retry >= attempts {
                return result;
            }
            let delay = backoff.delay_ms(retry - 1);
            warn!(offset, retry, delay_ms = delay, "retrying upload chunk");
            scope
                .run(async {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    Ok(())
                })
                .await?;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
