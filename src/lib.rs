//! PumpAlert - pump.fun token launch monitor library
//!
//! Watches the pump.fun launch stream, keeps bounded deduplicated views of
//! what it has seen, and alerts on tokens whose names match a search.
//!
//! # Modules
//!
//! - `domain`: Core logic (TokenEvent, SearchConfiguration, EventStore, ConnectionMachine)
//! - `ports`: Trait abstractions (FeedTransport, Notifier, LinkOpener, IngestionObserver)
//! - `adapters`: External implementations (pump.fun WebSocket, alerts, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Connection manager and ingestion coordinator

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
