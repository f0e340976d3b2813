//! Pump.fun WebSocket Transport
//!
//! [`FeedTransport`] over tokio-tungstenite. Connects to
//! wss://pumpportal.fun/api/data (or any configured ws/wss url).

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::domain::error::FeedError;
use crate::ports::transport::{FeedSession, FeedTransport, SessionEvent};

/// Default WebSocket URL for pump.fun data
pub const DEFAULT_WS_URL: &str = "wss://pumpportal.fun/api/data";

/// Default handshake timeout
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens tokio-tungstenite sessions
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    connect_timeout: Duration,
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
    }
}

impl WebSocketTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl FeedTransport for WebSocketTransport {
    async fn open(&self, url: &str) -> Result<Box<dyn FeedSession>, FeedError> {
        debug!("Opening WebSocket: {}", url);

        let (stream, response) = tokio::time::timeout(self.connect_timeout, connect_async(url))
            .await
            .map_err(|_| {
                FeedError::Transport(format!(
                    "connection timed out after {}s",
                    self.connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| FeedError::Transport(format!("connection failed: {}", e)))?;

        info!("WebSocket connected: {} (HTTP {})", url, response.status());

        Ok(Box::new(WebSocketSession {
            stream,
            finished: false,
        }))
    }
}

/// Live tokio-tungstenite session
pub struct WebSocketSession {
    stream: WsStream,
    finished: bool,
}

#[async_trait]
impl FeedSession for WebSocketSession {
    async fn send_text(&mut self, text: String) -> Result<(), FeedError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(FeedError::transport)
    }

    async fn next_event(&mut self) -> SessionEvent {
        loop {
            if self.finished {
                return SessionEvent::Closed;
            }

            match self.stream.next().await {
                None => {
                    self.finished = true;
                    return SessionEvent::Closed;
                }
                Some(Err(e)) => {
                    warn!("WebSocket error: {}", e);
                    self.finished = true;
                    return SessionEvent::Error(format!("connection error: {}", e));
                }
                Some(Ok(Message::Text(text))) => return SessionEvent::Frame(text),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => return SessionEvent::Frame(text),
                    Err(_) => debug!("Dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Ping(payload))) => {
                    if let Err(e) = self.stream.send(Message::Pong(payload)).await {
                        debug!("Failed to answer ping: {}", e);
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("WebSocket closed by server: {:?}", frame);
                    self.finished = true;
                    return SessionEvent::Closed;
                }
                Some(Ok(_)) => {} // pong / raw frame
            }
        }
    }

    async fn close(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Err(e) = self.stream.close(None).await {
            debug!("Error while closing WebSocket: {}", e);
        }
    }
}
