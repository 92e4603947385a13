//! Entry point bundling the transport and transcoding context.

use std::sync::Arc;

use genai_core::{BackendTarget, Result};
use genai_settings::{ClientSettings, load_settings};
use genai_transcode::TranscodeContext;
use genai_transport::ApiClient;
use tracing::info;

use crate::caches::Caches;
use crate::files::Files;
use crate::live::Live;
use crate::models::Models;
use crate::operations::Operations;

/// State shared by every capability handle.
#[derive(Debug)]
pub(crate) struct ClientInner {
    pub(crate) api: ApiClient,
    pub(crate) ctx: TranscodeContext,
}

impl ClientInner {
    /// Ceiling for automatic function calling when a request sets none.
    pub(crate) fn default_remote_calls(&self) -> u32 {
        self.api.settings().automatic_function_calling.maximum_remote_calls
    }
}

/// Client for one backend. Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Client from explicit settings.
    pub fn new(settings: ClientSettings) -> Result<Self> {
        Ok(Self::from_api_client(ApiClient::new(settings)?))
    }

    /// Client from `~/.genai/settings.json` and `GOOGLE_*`/`GENAI_*` variables.
    ///
    /// Installs the bundled log subscriber when the settings name a level.
    pub fn from_env() -> Result<Self> {
        let settings = load_settings()?;
        if let Some(level) = settings.log_level.as_deref() {
            genai_core::logging::init_subscriber(level);
        }
        Self::new(settings)
    }

    /// Client over an already configured transport (custom auth, HTTP client).
    pub fn from_api_client(api: ApiClient) -> Self {
        let ctx = genai_live::transcode_context(&api);
        info!(backend = %api.backend(), base_url = %api.base_url(), "genai client ready");
        Self {
            inner: Arc::new(ClientInner { api, ctx }),
        }
    }

    /// Backend this client talks to.
    pub fn backend(&self) -> BackendTarget {
        self.inner.api.backend()
    }

    /// Underlying transport.
    pub fn api_client(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Content generation, embeddings, media generation and model metadata.
    pub fn models(&self) -> Models {
        Models::new(Arc::clone(&self.inner))
    }

    /// Uploaded files (direct backend).
    pub fn files(&self) -> Files {
        Files::new(Arc::clone(&self.inner))
    }

    /// Cached contents.
    pub fn caches(&self) -> Caches {
        Caches::new(Arc::clone(&self.inner))
    }

    /// Long-running operations.
    pub fn operations(&self) -> Operations {
        Operations::new(Arc::clone(&self.inner))
    }

    /// Live sessions.
    pub fn live(&self) -> Live {
        Live::new(Arc::clone(&self.inner))
    }
}
