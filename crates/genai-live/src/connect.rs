//! Live endpoint resolution and session opening over the shared transport.

use std::sync::Arc;
use std::time::Duration;

use genai_core::types::LiveConnectConfig;
use genai_core::{BackendTarget, RequestOptions, Result};
use genai_transcode::TranscodeContext;
use genai_transcode::live::setup_message;
use genai_transport::ApiClient;
use tracing::instrument;

use crate::channel::WsConnector;
use crate::session::{DEFAULT_SETUP_TIMEOUT, LiveSession};

/// Options for opening a live session.
#[derive(Clone, Debug)]
pub struct LiveConnectOptions {
    /// Bound on the wait for `setupComplete`.
    pub setup_timeout: Duration,
    /// Extra handshake headers.
    pub request: RequestOptions,
}

impl Default for LiveConnectOptions {
    fn default() -> Self {
        Self {
            setup_timeout: DEFAULT_SETUP_TIMEOUT,
            request: RequestOptions::default(),
        }
    }
}

/// WebSocket URL of the bidirectional generation service.
pub fn live_url(client: &ApiClient) -> String {
    let base = client.base_url();
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    let version = client.api_version();
    match client.backend() {
        BackendTarget::Direct => format!(
            "{ws_base}ws/google.ai.generativelanguage.{version}.GenerativeService.BidiGenerateContent"
        ),
        BackendTarget::Managed => {
            format!("{ws_base}ws/google.cloud.aiplatform.{version}.LlmBidiService/BidiGenerateContent")
        }
    }
}

/// Transcoding context for `client`'s backend.
pub fn transcode_context(client: &ApiClient) -> TranscodeContext {
    match client.backend() {
        BackendTarget::Direct => TranscodeContext::direct(),
        BackendTarget::Managed if client.is_express() => TranscodeContext {
            backend: BackendTarget::Managed,
            project: None,
            location: None,
        },
        BackendTarget::Managed => TranscodeContext {
            backend: BackendTarget::Managed,
            project: client.project().map(String::from),
            location: Some(client.location().to_string()),
        },
    }
}

/// Open a live session for `model`.
///
/// The setup frame is transcoded before the socket is opened, so
/// backend-exclusive fields fail without any network activity.
#[instrument(skip_all, fields(model = %model, backend = %client.backend()))]
pub async fn connect(
    client: &ApiClient,
    model: &str,
    config: &LiveConnectConfig,
    options: LiveConnectOptions,
) -> Result<LiveSession> {
    let ctx = transcode_context(client);
    let setup = setup_message(model, config, &ctx)?;
    let headers = client.headers(&options.request).await?;
    let connector = Arc::new(WsConnector::new(live_url(client), headers));
    let handle = config
        .session_resumption
        .as_ref()
        .and_then(|r| r.handle.clone());
    LiveSession::connect(connector, setup, ctx, handle, options.setup_timeout).await
}
