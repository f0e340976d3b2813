//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these traits abstract:
//! - The streaming transport carrying raw feed frames
//! - Alert side effects (notifications, opening links)
//! - Observers of core events

pub mod alerts;
pub mod mocks;
pub mod transport;

// Re-export main traits and types
pub use alerts::{
    CoreEvent, IngestionObserver, LinkOpener, MatchAlert, Notifier, NotifyError, ALERT_TITLE,
};
pub use transport::{FeedSession, FeedTransport, SessionEvent};
