//! Alert and Observer Ports
//!
//! The core never renders anything. It emits typed [`CoreEvent`]s to
//! registered observers and calls injected capabilities for side effects
//! (system notifications, opening links). Implementations live in the
//! presentation layer and may be no-ops.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::connection::ConnectionStatus;
use crate::domain::event::TokenEvent;

/// Default alert title
pub const ALERT_TITLE: &str = "PumpFun Alert";

/// Errors from alert capabilities. Logged by the core, never propagated.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Capability not supported: {0}")]
    Unsupported(String),
}

/// Events emitted by the ingestion core
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// Every decoded event, duplicates included
    EventReceived(TokenEvent),
    /// Connection status changed
    StatusChanged(ConnectionStatus),
    /// An event newly entered the matched collection
    EventMatched(TokenEvent),
}

/// Receives core events. Called synchronously on the ingestion task.
pub trait IngestionObserver: Send + Sync {
    fn on_core_event(&self, event: &CoreEvent);
}

impl<F> IngestionObserver for F
where
    F: Fn(&CoreEvent) + Send + Sync,
{
    fn on_core_event(&self, event: &CoreEvent) {
        self(event)
    }
}

/// Alert content for a matched event
#[derive(Debug, Clone, PartialEq)]
pub struct MatchAlert {
    pub title: String,
    pub message: String,
    pub url: String,
    pub event: TokenEvent,
}

impl MatchAlert {
    pub fn for_event(event: &TokenEvent) -> Self {
        Self {
            title: ALERT_TITLE.to_string(),
            message: format!("Token found: {}", event.name()),
            url: event.url().to_string(),
            event: event.clone(),
        }
    }
}

/// Delivers match alerts (desktop notification, sound, chat webhook, ...)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_match(&self, alert: &MatchAlert) -> Result<(), NotifyError>;
}

/// Opens a url in the user's browser
#[async_trait]
pub trait LinkOpener: Send + Sync {
    async fn open_url(&self, url: &str) -> Result<(), NotifyError>;
}
