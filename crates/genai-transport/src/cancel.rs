//! Request-scoped cancellation.
//!
//! A [`CancelScope`] owns a child of the caller's [`CancellationToken`] and an
//! optional deadline. Whichever fires first wins: the caller's token yields
//! [`GenAiError::Cancelled`], the deadline yields [`GenAiError::Timeout`] and
//! cancels the scope's token so sub-operations holding it stop too.

use std::future::Future;
use std::time::Duration;

use futures::{Stream, StreamExt};
use genai_core::{GenAiError, RequestOptions, Result};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation controller for one call tree.
#[derive(Clone, Debug)]
pub struct CancelScope {
    token: CancellationToken,
    timeout_ms: Option<u64>,
    deadline: Option<Instant>,
}

impl CancelScope {
    /// Scope linked to `options.cancel`, timing out after `options.timeout_ms`
    /// (or `default_timeout_ms` when the call sets none).
    pub fn new(options: &RequestOptions, default_timeout_ms: Option<u64>) -> Self {
        let token = options
            .cancel
            .as_ref()
            .map_or_else(CancellationToken::new, CancellationToken::child_token);
        let timeout_ms = options.timeout_ms.or(default_timeout_ms);
        let deadline = timeout_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
        Self {
            token,
            timeout_ms,
            deadline,
        }
    }

    /// Scope with neither timeout nor external signal.
    pub fn unbounded() -> Self {
        Self::new(&RequestOptions::default(), None)
    }

    /// Token cancelled when this scope ends early; hand it to sub-operations.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Drive `fut` until it completes, the token fires, or the deadline passes.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(GenAiError::Cancelled),
            () = deadline => {
                self.token.cancel();
                Err(GenAiError::Timeout {
                    timeout_ms: self.timeout_ms.unwrap_or_default(),
                })
            }
            result = fut => result,
        }
    }

    /// Apply this scope to every item of `inner`. The stream ends after the first
    /// error, dropping `inner` so the underlying reader is released.
    pub fn guard_stream<S, T>(self, inner: S) -> impl Stream<Item = Result<T>> + Send
    where
        S: Stream<Item = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        async_stream::stream! {
            futures::pin_mut!(inner);
            loop {
                let next = self.run(async { Ok(inner.next().await) }).await;
                match next {
                    Ok(Some(Ok(item))) => yield Ok(item),
                    Ok(Some(Err(e))) | Err(e) => {
                        yield Err(e);
                        break;
                    }
                    Ok(None) => break,
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
