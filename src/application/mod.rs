//! Application Layer - Ingestion pipeline
//!
//! - `connection_manager`: owns the feed connection and its reconnect timer
//! - `coordinator`: store, matching and alerts for decoded events
//! - `observers`: subscribe/unsubscribe registry for core events

pub mod connection_manager;
pub mod coordinator;
pub mod observers;

pub use connection_manager::{
    ConnectionConfig, ConnectionHandle, ConnectionManager, FeedUpdate, DEFAULT_UPDATE_BUFFER,
    MAX_FRAME_BYTES,
};
pub use coordinator::{AlertSettings, IngestOutcome, IngestionCoordinator};
pub use observers::{Observers, SubscriptionId};
