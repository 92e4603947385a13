//! # genai-live
//!
//! Bidirectional live sessions over WebSocket.
//!
//! - **State machine**: [`SessionState`] (`Connecting → Open → SetupSent → Ready →
//!   Closing → Closed`, with absorbing `Errored`)
//! - **Session**: [`LiveSession`] performs the setup handshake, sends client content,
//!   realtime input, and tool responses, and tracks the resumption handle
//! - **Channel**: [`LiveSink`]/[`LiveStream`] abstract the socket; [`WsConnector`]
//!   is the `tokio-tungstenite` implementation
//! - **Endpoint**: [`connect`] resolves the per-backend URL and auth from an
//!   [`ApiClient`](genai_transport::ApiClient)

#![deny(unsafe_code)]

pub mod channel;
pub mod connect;
pub mod session;
pub mod state;

pub use channel::{LiveConnector, LiveHalves, LiveSink, LiveStream, WsConnector};
pub use connect::{LiveConnectOptions, connect, live_url, transcode_context};
pub use session::{DEFAULT_SETUP_TIMEOUT, LiveSession, validate_tool_response};
pub use state::SessionState;
