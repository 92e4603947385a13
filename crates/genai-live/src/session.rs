//! # Live Session
//!
//! One logical conversation over one socket.
//!
//! - **Handshake**: open the socket, send the transcoded `setup` frame, wait (bounded)
//!   for `setupComplete`
//! - **Sending**: client content, realtime input, and tool responses are legal only
//!   in `Ready`; any send failure moves the session to `Errored`
//! - **Receiving**: server frames are decoded into [`LiveServerMessage`]; the latest
//!   resumable handle from `sessionResumptionUpdate` is kept for reconnection
//! - **Termination**: `close()`, a clean socket close, a `goAway` while no
//!   resumption handle is held, or any socket or decoding error; after that every
//!   send is rejected

use std::sync::Arc;
use std::time::Duration;

use genai_core::types::{
    LiveClientContent, LiveRealtimeInput, LiveServerMessage, LiveToolResponse,
};
use genai_core::{BackendTarget, GenAiError, Result};
use genai_transcode::TranscodeContext;
use genai_transcode::live::{
    client_content_message, realtime_input_message, server_message, tool_response_message,
};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{Instrument, debug, info, info_span, instrument, warn};
use uuid::Uuid;

use crate::channel::{LiveConnector, LiveSink, LiveStream};
use crate::state::SessionState;

/// Default bound on the wait for `setupComplete`.
pub const DEFAULT_SETUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Reject tool responses the backend would refuse.
///
/// The direct backend needs every function response to echo the id of the call
/// it answers.
pub fn validate_tool_response(response: &LiveToolResponse, backend: BackendTarget) -> Result<()> {
    if backend == BackendTarget::Managed {
        return Ok(());
    }
    for (index, item) in response.function_responses.iter().enumerate() {
        if item.id.as_deref().is_none_or(str::is_empty) {
            return Err(GenAiError::live(format!(
                "functionResponses[{index}] ({}) has no id; the {backend} backend requires the originating call id",
                item.name.as_deref().unwrap_or("unnamed")
            )));
        }
    }
    Ok(())
}

/// A live session.
///
/// Sending and receiving use separate locks, so one task can drain
/// [`receive`](Self::receive) while another sends.
pub struct LiveSession {
    id: Uuid,
    ctx: TranscodeContext,
    state: Mutex<SessionState>,
    resumption_handle: Mutex<Option<String>>,
    sink: tokio::sync::Mutex<Box<dyn LiveSink>>,
    stream: tokio::sync::Mutex<Box<dyn LiveStream>>,
}

impl std::fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSession")
            .field("id", &self.id)
            .field("backend", &self.ctx.backend)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl LiveSession {
    /// Open a socket, perform the setup handshake, and return a `Ready` session.
    ///
    /// `setup` is the already-transcoded `setup` frame; `resumption_handle` seeds
    /// the handle reported before the server issues a new one.
    pub async fn connect(
        connector: Arc<dyn LiveConnector>,
        setup: Value,
        ctx: TranscodeContext,
        resumption_handle: Option<String>,
        setup_timeout: Duration,
    ) -> Result<Self> {
        let id = Uuid::now_v7();
        let span = info_span!("live_session", session_id = %id, backend = %ctx.backend);
        async move {
            debug!(state = %SessionState::Connecting, "opening socket");
            let (sink, stream) = connector.open().await?;
            let session = Self {
                id,
                ctx,
                state: Mutex::new(SessionState::Open),
                resumption_handle: Mutex::new(resumption_handle),
                sink: tokio::sync::Mutex::new(sink),
                stream: tokio::sync::Mutex::new(stream),
            };
            session.handshake(setup, setup_timeout).await?;
            info!("live session ready");
            Ok(session)
        }
        .instrument(span)
        .await
    }

    async fn handshake(&self, setup: Value, setup_timeout: Duration) -> Result<()> {
        self.write(SessionState::Open, setup.to_string()).await?;
        self.transition(SessionState::SetupSent);

        let first = tokio::time::timeout(setup_timeout, self.read_frame()).await;
        let message = match first {
            Err(_) => {
                self.transition(SessionState::Errored);
                return Err(GenAiError::Timeout {
                    timeout_ms: u64::try_from(setup_timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
            Ok(Err(e)) => return Err(e),
            Ok(Ok(None)) => {
                self.transition(SessionState::Errored);
                return Err(GenAiError::live("socket closed before setup completed"));
            }
            Ok(Ok(Some(message))) => message,
        };
        if message.setup_complete.is_none() {
            self.transition(SessionState::Errored);
            return Err(GenAiError::live("expected setupComplete as the first server message"));
        }
        self.transition(SessionState::Ready);
        Ok(())
    }

    // ── state ──

    /// Correlation id of this session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Latest resumption handle, for reconnecting into the same conversation.
    pub fn resumption_handle(&self) -> Option<String> {
        self.resumption_handle.lock().clone()
    }

    fn transition(&self, next: SessionState) {
        let mut state = self.state.lock();
        if state.can_transition_to(next) {
            debug!(session_id = %self.id, from = %*state, to = %next, "live state change");
            *state = next;
        }
    }

    fn ensure_state(&self, expected: SessionState) -> Result<()> {
        match self.state() {
            state if state == expected => Ok(()),
            other => Err(GenAiError::live(format!("cannot send while the session is {other}"))),
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        self.ensure_state(SessionState::Ready)
    }

    /// Write one frame. The state is checked again once the sink is held, so a
    /// send queued behind a failing one is rejected.
    async fn write(&self, expected: SessionState, text: String) -> Result<()> {
        let mut sink = self.sink.lock().await;
        self.ensure_state(expected)?;
        let result = sink.send_text(text).await;
        if result.is_err() {
            self.transition(SessionState::Errored);
        }
        result
    }

    async fn send_frame(&self, frame: Value) -> Result<()> {
        self.write(SessionState::Ready, frame.to_string()).await
    }

    // ── sending ──

    /// Send ordered conversation turns.
    #[instrument(skip_all, fields(session_id = %self.id))]
    pub async fn send_client_content(&self, content: &LiveClientContent) -> Result<()> {
        self.ensure_ready()?;
        self.send_frame(client_content_message(content, &self.ctx)?).await
    }

    /// Send best-effort realtime media or text.
    #[instrument(skip_all, fields(session_id = %self.id))]
    pub async fn send_realtime_input(&self, input: &LiveRealtimeInput) -> Result<()> {
        self.ensure_ready()?;
        self.send_frame(realtime_input_message(input, &self.ctx)?).await
    }

    /// Answer server-issued tool calls.
    ///
    /// Ids are checked before anything is transcoded or sent; a missing id on the
    /// direct backend fails locally and leaves the session usable.
    #[instrument(skip_all, fields(session_id = %self.id))]
    pub async fn send_tool_response(&self, response: &LiveToolResponse) -> Result<()> {
        self.ensure_ready()?;
        validate_tool_response(response, self.ctx.backend)?;
        self.send_frame(tool_response_message(response, &self.ctx)?).await
    }

    // ── receiving ──

    async fn read_frame(&self) -> Result<Option<LiveServerMessage>> {
        let next = self.stream.lock().await.next_text().await;
        let text = match next {
            None => return Ok(None),
            Some(Err(e)) => {
                self.transition(SessionState::Errored);
                return Err(e);
            }
            Some(Ok(text)) => text,
        };
        let wire: Value = serde_json::from_str(&text).map_err(|e| {
            self.transition(SessionState::Errored);
            GenAiError::live(format!("server frame is not JSON: {e}"))
        })?;
        let message = server_message(&wire, &self.ctx).inspect_err(|_| {
            self.transition(SessionState::Errored);
        })?;
        Ok(Some(message))
    }

    /// Next server message; `None` once the socket has closed.
    #[instrument(skip_all, fields(session_id = %self.id))]
    pub async fn receive(&self) -> Result<Option<LiveServerMessage>> {
        let state = self.state();
        if state.is_terminal() {
            return match state {
                SessionState::Errored => Err(GenAiError::live("session is errored")),
                _ => Ok(None),
            };
        }
        let Some(message) = self.read_frame().await? else {
            self.transition(SessionState::Closed);
            return Ok(None);
        };
        if let Some(update) = &message.session_resumption_update {
            if update.resumable.unwrap_or(false) {
                if let Some(handle) = update.new_handle.as_ref().filter(|h| !h.is_empty()) {
                    *self.resumption_handle.lock() = Some(handle.clone());
                }
            }
        }
        if let Some(go_away) = &message.go_away {
            let time_left = go_away.time_left.as_deref().unwrap_or("unknown");
            if self.resumption_handle.lock().is_some() {
                warn!(time_left, "server is going away; reconnect with the resumption handle");
            } else {
                // Nothing to resume: drain what is left but accept no more sends.
                warn!(time_left, "server is going away without a resumption handle");
                self.transition(SessionState::Closing);
            }
        }
        Ok(Some(message))
    }

    /// Close the socket. Idempotent.
    #[instrument(skip_all, fields(session_id = %self.id))]
    pub async fn close(&self) -> Result<()> {
        if self.state().is_terminal() {
            return Ok(());
        }
        self.transition(SessionState::Closing);
        let result = self.sink.lock().await.close().await;
        match &result {
            Ok(()) => self.transition(SessionState::Closed),
            Err(_) => self.transition(SessionState::Errored),
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::LiveHalves;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use genai_core::types::{Content, FunctionResponse};
    use serde_json::json;
    use tokio::sync::mpsc;

    /// Records sent frames and plays back scripted server frames.
    struct Script {
        sent: Arc<Mutex<Vec<Value>>>,
        incoming: Mutex<Option<mpsc::UnboundedReceiver<Result<String>>>>,
        fail_sends: bool,
    }

    struct RecordingSink {
        sent: Arc<Mutex<Vec<Value>>>,
        fail: bool,
    }

    #[async_trait]
    impl LiveSink for RecordingSink {
        async fn send_text(&mut self, text: String) -> Result<()> {
            if self.fail {
                return Err(GenAiError::live("broken pipe"));
            }
            self.sent.lock().push(serde_json::from_str(&text).unwrap());
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    struct ScriptedStream(mpsc::UnboundedReceiver<Result<String>>);

    #[async_trait]
    impl LiveStream for ScriptedStream {
        async fn next_text(&mut self) -> Option<Result<String>> {
            self.0.recv().await
        }
    }

    #[async_trait]
    impl LiveConnector for Script {
        async fn open(&self) -> Result<LiveHalves> {
            let rx = self.incoming.lock().take().ok_or_else(|| GenAiError::live("reopened"))?;
            Ok((
                Box::new(RecordingSink {
                    sent: Arc::clone(&self.sent),
                    fail: self.fail_sends,
                }),
                Box::new(ScriptedStream(rx)),
            ))
        }
    }

    struct Harness {
        sent: Arc<Mutex<Vec<Value>>>,
        server: mpsc::UnboundedSender<Result<String>>,
        connector: Arc<dyn LiveConnector>,
    }

    fn harness() -> Harness {
        let (server, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let connector = Arc::new(Script {
            sent: Arc::clone(&sent),
            incoming: Mutex::new(Some(rx)),
            fail_sends: false,
        });
        Harness {
            sent,
            server,
            connector,
        }
    }

    fn push(h: &Harness, frame: Value) {
        h.server.send(Ok(frame.to_string())).unwrap();
    }

    async fn ready(h: &Harness, ctx: TranscodeContext) -> LiveSession {
        push(h, json!({"setupComplete": {}}));
        LiveSession::connect(
            Arc::clone(&h.connector),
            json!({"setup": {"model": "models/m"}}),
            ctx,
            None,
            DEFAULT_SETUP_TIMEOUT,
        )
        .await
        .unwrap()
    }

    fn tool_response(id: Option<&str>) -> LiveToolResponse {
        LiveToolResponse {
            function_responses: vec![FunctionResponse {
                id: id.map(String::from),
                name: Some("lookup".into()),
                response: Some(json!({"ok": true})),
            }],
        }
    }

    // ── handshake ──

    #[tokio::test]
    async fn handshake_reaches_ready() {
        let h = harness();
        let session = ready(&h, TranscodeContext::direct()).await;
        assert_eq!(session.state(), SessionState::Ready);
        let sent = h.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["setup"]["model"], "models/m");
    }

    #[tokio::test(start_paused = true)]
    async fn handshake_times_out() {
        let h = harness();
        let result = LiveSession::connect(
            Arc::clone(&h.connector),
            json!({"setup": {}}),
            TranscodeContext::direct(),
            None,
            Duration::from_millis(100),
        )
        .await;
        assert_matches!(result, Err(GenAiError::Timeout { timeout_ms: 100 }));
        drop(h.server);
    }

    #[tokio::test]
    async fn handshake_rejects_other_first_message() {
        let h = harness();
        push(&h, json!({"serverContent": {"turnComplete": true}}));
        let result = LiveSession::connect(
            Arc::clone(&h.connector),
            json!({"setup": {}}),
            TranscodeContext::direct(),
            None,
            DEFAULT_SETUP_TIMEOUT,
        )
        .await;
        assert_matches!(result, Err(GenAiError::LiveProtocol { .. }));
    }

    #[tokio::test]
    async fn handshake_fails_on_close() {
        let h = harness();
        let Harness { server, connector, .. } = h;
        drop(server);
        let result = LiveSession::connect(
            connector,
            json!({"setup": {}}),
            TranscodeContext::direct(),
            None,
            DEFAULT_SETUP_TIMEOUT,
        )
        .await;
        assert_matches!(result, Err(GenAiError::LiveProtocol { .. }));
    }

    #[tokio::test]
    async fn broken_socket_fails_setup_send() {
        let (_server, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Script {
            sent: Arc::new(Mutex::new(Vec::new())),
            incoming: Mutex::new(Some(rx)),
            fail_sends: true,
        });
        let result = LiveSession::connect(
            connector,
            json!({"setup": {}}),
            TranscodeContext::direct(),
            None,
            DEFAULT_SETUP_TIMEOUT,
        )
        .await;
        assert!(result.is_err());
    }

    // ── sending ──

    #[tokio::test]
    async fn client_content_and_realtime_input_are_sent() {
        let h = harness();
        let session = ready(&h, TranscodeContext::direct()).await;
        session
            .send_client_content(&LiveClientContent {
                turns: Some(vec![Content::user_text("hello")]),
                turn_complete: Some(true),
            })
            .await
            .unwrap();
        session
            .send_realtime_input(&LiveRealtimeInput {
                text: Some("typing".into()),
                ..LiveRealtimeInput::default()
            })
            .await
            .unwrap();

        let sent = h.sent.lock();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1]["clientContent"]["turns"][0]["parts"][0]["text"], "hello");
        assert_eq!(sent[2]["realtimeInput"]["text"], "typing");
    }

    #[tokio::test]
    async fn tool_response_without_id_never_reaches_socket() {
        let h = harness();
        let session = ready(&h, TranscodeContext::direct()).await;
        let result = session.send_tool_response(&tool_response(None)).await;
        assert_matches!(result, Err(GenAiError::LiveProtocol { .. }));
        assert_eq!(h.sent.lock().len(), 1);
        assert_eq!(session.state(), SessionState::Ready);

        session.send_tool_response(&tool_response(Some("call-1"))).await.unwrap();
        let sent = h.sent.lock();
        assert_eq!(sent[1]["toolResponse"]["functionResponses"][0]["id"], "call-1");
    }

    #[tokio::test]
    async fn managed_accepts_tool_response_without_id() {
        let h = harness();
        let session = ready(&h, TranscodeContext::managed("p", "us-central1")).await;
        session.send_tool_response(&tool_response(None)).await.unwrap();
        assert_eq!(h.sent.lock().len(), 2);
    }

    #[test]
    fn empty_id_counts_as_missing() {
        assert!(validate_tool_response(&tool_response(Some("")), BackendTarget::Direct).is_err());
        assert!(validate_tool_response(&tool_response(Some("x")), BackendTarget::Direct).is_ok());
    }

    // ── receiving ──

    #[tokio::test]
    async fn receive_tracks_resumption_handle() {
        let h = harness();
        let session = ready(&h, TranscodeContext::direct()).await;
        push(&h, json!({"sessionResumptionUpdate": {"newHandle": "h1", "resumable": true}}));
        push(&h, json!({"sessionResumptionUpdate": {"newHandle": "h2", "resumable": false}}));
        push(&h, json!({"serverContent": {"modelTurn": {"parts": [{"text": "hi"}]}}}));

        let _ = session.receive().await.unwrap().unwrap();
        assert_eq!(session.resumption_handle().as_deref(), Some("h1"));
        let _ = session.receive().await.unwrap().unwrap();
        assert_eq!(session.resumption_handle().as_deref(), Some("h1"));
        let content = session.receive().await.unwrap().unwrap();
        assert_eq!(content.text().as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn seeded_handle_reported_until_replaced() {
        let h = harness();
        push(&h, json!({"setupComplete": {}}));
        let session = LiveSession::connect(
            Arc::clone(&h.connector),
            json!({"setup": {}}),
            TranscodeContext::direct(),
            Some("old".into()),
            DEFAULT_SETUP_TIMEOUT,
        )
        .await
        .unwrap();
        assert_eq!(session.resumption_handle().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn tool_calls_and_go_away_delivered() {
        let h = harness();
        let session = ready(&h, TranscodeContext::direct()).await;
        push(&h, json!({"toolCall": {"functionCalls": [{"id": "c1", "name": "lookup", "args": {}}]}}));
        push(&h, json!({"sessionResumptionUpdate": {"newHandle": "h1", "resumable": true}}));
        push(&h, json!({"goAway": {"timeLeft": "10s"}}));

        let call = session.receive().await.unwrap().unwrap();
        assert_eq!(call.tool_call.unwrap().function_calls.unwrap()[0].id.as_deref(), Some("c1"));
        let _ = session.receive().await.unwrap().unwrap();
        let go_away = session.receive().await.unwrap().unwrap();
        assert_eq!(go_away.go_away.unwrap().time_left.as_deref(), Some("10s"));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.resumption_handle().as_deref(), Some("h1"));
    }

    #[tokio::test]
    async fn go_away_without_handle_ends_session() {
        let h = harness();
        let session = ready(&h, TranscodeContext::direct()).await;
        push(&h, json!({"goAway": {"timeLeft": "0s"}}));
        push(&h, json!({"serverContent": {"turnComplete": true}}));

        let go_away = session.receive().await.unwrap().unwrap();
        assert!(go_away.go_away.is_some());
        assert_eq!(session.state(), SessionState::Closing);

        let result = session
            .send_client_content(&LiveClientContent {
                turns: Some(vec![Content::user_text("still there?")]),
                turn_complete: Some(true),
            })
            .await;
        assert_matches!(result, Err(GenAiError::LiveProtocol { .. }));
        assert_eq!(h.sent.lock().len(), 1);

        // Frames already in flight are still delivered.
        assert!(session.receive().await.unwrap().unwrap().server_content.is_some());
        let Harness { server, .. } = h;
        drop(server);
        assert!(session.receive().await.unwrap().is_none());
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn server_close_ends_session() {
        let h = harness();
        let session = ready(&h, TranscodeContext::direct()).await;
        let Harness { server, sent, .. } = h;
        drop(server);
        assert!(session.receive().await.unwrap().is_none());
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.receive().await.unwrap().is_none());

        let result = session.send_realtime_input(&LiveRealtimeInput::default()).await;
        assert_matches!(result, Err(GenAiError::LiveProtocol { .. }));
        assert_eq!(sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn socket_error_moves_to_errored() {
        let h = harness();
        let session = ready(&h, TranscodeContext::direct()).await;
        h.server
            .send(Err(GenAiError::live("server closed the session (1007): bad")))
            .unwrap();
        assert!(session.receive().await.is_err());
        assert_eq!(session.state(), SessionState::Errored);
        assert!(session.receive().await.is_err());
        assert!(session.send_tool_response(&tool_response(Some("c"))).await.is_err());
    }

    #[tokio::test]
    async fn invalid_json_moves_to_errored() {
        let h = harness();
        let session = ready(&h, TranscodeContext::direct()).await;
        h.server.send(Ok("not json".into())).unwrap();
        assert_matches!(session.receive().await, Err(GenAiError::LiveProtocol { .. }));
        assert_eq!(session.state(), SessionState::Errored);
    }

    #[tokio::test]
    async fn undecodable_frame_moves_to_errored() {
        let h = harness();
        let session = ready(&h, TranscodeContext::direct()).await;
        push(&h, json!({"serverContent": 5}));
        assert!(session.receive().await.is_err());
        assert_eq!(session.state(), SessionState::Errored);

        let result = session.send_realtime_input(&LiveRealtimeInput::default()).await;
        assert_matches!(result, Err(GenAiError::LiveProtocol { .. }));
        assert_eq!(h.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn queued_send_rejected_once_errored() {
        let h = harness();
        let session = Arc::new(ready(&h, TranscodeContext::direct()).await);
        let held = session.sink.lock().await;

        let queued = tokio::spawn({
            let session = Arc::clone(&session);
            async move {
                session
                    .send_client_content(&LiveClientContent {
                        turns: Some(vec![Content::user_text("late")]),
                        turn_complete: Some(true),
                    })
                    .await
            }
        });
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        session.transition(SessionState::Errored);
        drop(held);

        let result = queued.await.unwrap();
        assert_matches!(result, Err(GenAiError::LiveProtocol { .. }));
        assert_eq!(h.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn close_is_idempotent_and_blocks_sends() {
        let h = harness();
        let session = ready(&h, TranscodeContext::direct()).await;
        session.close().await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        session.close().await.unwrap();
        let result = session
            .send_client_content(&LiveClientContent::default())
            .await;
        assert_matches!(result, Err(GenAiError::LiveProtocol { .. }));
    }
}
