//! Feed Transport Port
//!
//! Abstracts the stream connection so the connection manager can run against a
//! real WebSocket or a scripted session in tests.

use async_trait::async_trait;

use crate::domain::error::FeedError;

/// One thing that happened on an open session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Text payload, forwarded verbatim to the decoder
    Frame(String),
    /// Transport failure; a `Closed` follows
    Error(String),
    /// Stream ended (remote close, EOF, or after an error)
    Closed,
}

/// Opens sessions against a stream endpoint
#[async_trait]
pub trait FeedTransport: Send + Sync {
    /// Open a new session. Handshake failures are returned as `FeedError::Transport`.
    async fn open(&self, url: &str) -> Result<Box<dyn FeedSession>, FeedError>;
}

/// A live stream session
#[async_trait]
pub trait FeedSession: Send + Sync {
    /// Send a text message (a subscription request)
    async fn send_text(&mut self, text: String) -> Result<(), FeedError>;

    /// Wait for the next session event. Must keep returning `Closed` once the
    /// stream has ended.
    async fn next_event(&mut self) -> SessionEvent;

    /// Forcibly close; no further events are read afterwards
    async fn close(&mut self);
}
