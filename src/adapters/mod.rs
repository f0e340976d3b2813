//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Pump.fun: WebSocket feed transport, frame decoder, health probes
//! - Alerts: log notifier and browser link opener
//! - CLI: Command-line interface handlers

pub mod alerts;
pub mod cli;
pub mod pump_fun;

pub use alerts::{BrowserLinkOpener, NoopLinkOpener, TracingNotifier};
pub use cli::CliApp;
pub use pump_fun::{HealthChecker, WebSocketTransport};
