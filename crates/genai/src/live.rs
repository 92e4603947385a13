//! The `live` capability: bidirectional sessions.

use std::sync::Arc;

use genai_core::Result;
use genai_core::types::LiveConnectConfig;
use genai_live::{LiveConnectOptions, LiveSession};

use crate::client::ClientInner;

/// Handle for the `live` capability.
#[derive(Clone, Debug)]
pub struct Live {
    inner: Arc<ClientInner>,
}

impl Live {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Open a session for `model` and wait for the server to accept its setup.
    pub async fn connect(
        &self,
        model: &str,
        config: &LiveConnectConfig,
        options: LiveConnectOptions,
    ) -> Result<LiveSession> {
        genai_live::connect(&self.inner.api, model, config, options).await
    }
}
