//! Duplex text channel under a live session.
//!
//! [`LiveSink`] and [`LiveStream`] are the two halves of one socket; a
//! [`LiveConnector`] opens them. Production uses [`WsConnector`] over
//! `tokio-tungstenite`; anything carrying JSON text frames works.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use genai_core::{GenAiError, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outgoing half.
#[async_trait]
pub trait LiveSink: Send {
    /// Send one text frame.
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Close the socket.
    async fn close(&mut self) -> Result<()>;
}

/// Incoming half.
#[async_trait]
pub trait LiveStream: Send {
    /// Next text frame; `None` once the socket closed cleanly.
    async fn next_text(&mut self) -> Option<Result<String>>;
}

/// Boxed socket halves.
pub type LiveHalves = (Box<dyn LiveSink>, Box<dyn LiveStream>);

/// Opens a socket.
#[async_trait]
pub trait LiveConnector: Send + Sync {
    /// Open a new socket.
    async fn open(&self) -> Result<LiveHalves>;
}

// ─────────────────────────────────────────────────────────────────────────────
// WebSocket
// ─────────────────────────────────────────────────────────────────────────────

/// WebSocket connector with fixed URL and handshake headers.
#[derive(Clone, Debug)]
pub struct WsConnector {
    url: String,
    headers: HeaderMap,
}

impl WsConnector {
    /// Connector for `url`, sending `headers` with the upgrade request.
    pub fn new(url: impl Into<String>, mut headers: HeaderMap) -> Self {
        let _ = headers.remove(CONTENT_TYPE);
        Self {
            url: url.into(),
            headers,
        }
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LiveConnector for WsConnector {
    async fn open(&self) -> Result<LiveHalves> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| GenAiError::transport(format!("invalid live URL {}", self.url), e))?;
        request
            .headers_mut()
            .extend(self.headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        let (socket, response) = connect_async(request)
            .await
            .map_err(|e| GenAiError::transport("WebSocket connect failed", e))?;
        debug!(status = response.status().as_u16(), "WebSocket connected");
        let (sink, stream) = socket.split();
        Ok((Box::new(WsSink(sink)), Box::new(WsReader(stream))))
    }
}

struct WsSink(SplitSink<WsStream, Message>);

#[async_trait]
impl LiveSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.0
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| GenAiError::transport("WebSocket send failed", e))
    }

    async fn close(&mut self) -> Result<()> {
        self.0
            .close()
            .await
            .map_err(|e| GenAiError::transport("WebSocket close failed", e))
    }
}

struct WsReader(SplitStream<WsStream>);

#[async_trait]
impl LiveStream for WsReader {
    async fn next_text(&mut self) -> Option<Result<String>> {
        loop {
            match self.0.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => {
                    return Some(String::from_utf8(bytes.to_vec()).map_err(|e| {
                        GenAiError::live(format!("binary frame is not UTF-8 JSON: {e}"))
                    }));
                }
                Ok(Message::Close(frame)) => {
                    let frame = frame?;
                    if frame.code == CloseCode::Normal {
                        return None;
                    }
                    return Some(Err(GenAiError::live(format!(
                        "server closed the session ({}): {}",
                        u16::from(frame.code),
                        &*frame.reason
                    ))));
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(GenAiError::transport("WebSocket receive failed", e))),
            }
        }
    }
}
