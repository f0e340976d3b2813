//! Feed Errors
//!
//! Closed set of failure kinds for the ingestion pipeline. Transport errors are
//! recovered by the reconnect policy, retries exhaustion ends the session until
//! a manual connect, and decode skips are dropped silently.

use thiserror::Error;

/// Why an inbound frame did not produce an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("frame is not valid JSON")]
    Unparseable,

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("system notice: {0}")]
    SystemMessage(String),

    #[error("frame matches no known event schema")]
    UnknownSchema,

    #[error("event carries no identity (mint, signature or ca)")]
    MissingIdentity,

    #[error("malformed event fields: {0}")]
    Malformed(String),

    #[error("frame too large: {0} bytes")]
    Oversized(usize),
}

/// Errors raised by the connection manager and its transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("exhausted retries after {attempts} reconnect attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("frame skipped: {0}")]
    DecodeSkipped(#[from] SkipReason),

    #[error("update channel closed")]
    ChannelClosed,
}

impl FeedError {
    /// Shorthand for transport failures built from any displayable error
    pub fn transport(err: impl std::fmt::Display) -> Self {
        FeedError::Transport(err.to_string())
    }

    /// True for errors the reconnect policy is expected to recover from
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FeedError::Transport(_) | FeedError::DecodeSkipped(_))
    }
}
