//! Ingestion Coordinator
//!
//! Wires decode output to the store, the matcher and the alert capabilities:
//!
//! ```text
//! FeedUpdate::Event -> all_seen + recent -> EventReceived
//!                   -> matches(search)?  -> matched (new only) -> EventMatched + alert
//! FeedUpdate::Status -> StatusChanged
//! ```
//!
//! The coordinator owns the [`EventStore`] outright and is driven from a
//! single task, so no lock guards the store.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::connection::ConnectionStatus;
use crate::domain::error::FeedError;
use crate::domain::event::TokenEvent;
use crate::domain::search::{matches, SearchConfiguration, SearchError};
use crate::domain::store::{EventStore, StoreSnapshot};
use crate::ports::alerts::{CoreEvent, IngestionObserver, LinkOpener, MatchAlert, Notifier};

use super::connection_manager::FeedUpdate;
use super::observers::{Observers, SubscriptionId};

/// Which side effects fire on a new match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertSettings {
    /// Call the notifier
    pub enabled: bool,
    /// Call the link opener with the token url
    pub open_links: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            open_links: false,
        }
    }
}

/// What happened to one ingested event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// First time the address entered `all_seen`
    pub newly_seen: bool,
    /// Matched the active search
    pub matched: bool,
    /// First time the address entered `matched`; alerts fired
    pub newly_matched: bool,
}

pub struct IngestionCoordinator {
    store: EventStore,
    search: Option<SearchConfiguration>,
    observers: Observers,
    notifier: Arc<dyn Notifier>,
    link_opener: Arc<dyn LinkOpener>,
    alerts: AlertSettings,
    status: ConnectionStatus,
}

impl IngestionCoordinator {
    pub fn new(
        store: EventStore,
        notifier: Arc<dyn Notifier>,
        link_opener: Arc<dyn LinkOpener>,
    ) -> Self {
        Self {
            store,
            search: None,
            observers: Observers::new(),
            notifier,
            link_opener,
            alerts: AlertSettings::default(),
            status: ConnectionStatus::Disconnected,
        }
    }

    pub fn with_alerts(mut self, alerts: AlertSettings) -> Self {
        self.alerts = alerts;
        self
    }

    /// Parse `raw` and make it the active search. Nothing matches before the
    /// first call.
    pub fn prepare_search(&mut self, raw: &str) -> Result<&SearchConfiguration, SearchError> {
        let config = SearchConfiguration::parse(raw)?;
        info!("Monitoring for: {}", config);
        Ok(self.search.insert(config))
    }

    pub fn search(&self) -> Option<&SearchConfiguration> {
        self.search.as_ref()
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Explicit user reset. `all_seen` and `recent` are kept.
    pub fn clear_matched(&mut self) {
        self.store.clear_matched();
        debug!("Matched events cleared");
    }

    pub fn subscribe(&self, observer: Arc<dyn IngestionObserver>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Registry handle, for observers that manage their own subscription
    pub fn observers(&self) -> &Observers {
        &self.observers
    }

    /// Apply one manager update. Retries exhaustion comes back as an error
    /// after observers have seen the status change.
    pub async fn handle_update(&mut self, update: FeedUpdate) -> Result<(), FeedError> {
        match update {
            FeedUpdate::Event(event) => {
                self.ingest(event).await;
                Ok(())
            }
            FeedUpdate::Status(status) => {
                self.set_status(status);
                Ok(())
            }
            FeedUpdate::RetriesExhausted { attempts } => {
                warn!("Feed gave up after {} attempts", attempts);
                Err(FeedError::RetriesExhausted { attempts })
            }
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status.clone();
        self.observers.emit(&CoreEvent::StatusChanged(status));
    }

    pub async fn ingest(&mut self, event: TokenEvent) -> IngestOutcome {
        let newly_seen = self.store.insert_seen(event.clone());
        self.store.insert_recent(event.clone());
        self.observers.emit(&CoreEvent::EventReceived(event.clone()));

        let matched = self
            .search
            .as_ref()
            .is_some_and(|search| matches(&event, search));

        let newly_matched = matched && self.store.insert_matched(event.clone());
        if newly_matched {
            info!("🎯 Match: {}", event.summary());
            self.observers.emit(&CoreEvent::EventMatched(event.clone()));
            self.fire_alerts(&event).await;
        } else if matched {
            debug!("Already matched: {}", event.address());
        }

        IngestOutcome {
            newly_seen,
            matched,
            newly_matched,
        }
    }

    async fn fire_alerts(&self, event: &TokenEvent) {
        if self.alerts.enabled {
            let alert = MatchAlert::for_event(event);
            if let Err(e) = self.notifier.notify_match(&alert).await {
                warn!("Match notification failed: {}", e);
            }
        }

        if self.alerts.open_links {
            if let Err(e) = self.link_opener.open_url(event.url()).await {
                warn!("Failed to open {}: {}", event.url(), e);
            }
        }
    }

    /// Consume updates until the manager stops (Ok) or gives up on
    /// reconnecting (`FeedError::RetriesExhausted`).
    pub async fn run(&mut self, mut updates: mpsc::Receiver<FeedUpdate>) -> Result<(), FeedError> {
        while let Some(update) = updates.recv().await {
            self.handle_update(update).await?;
        }
        debug!("Update channel closed");
        Ok(())
    }
}
