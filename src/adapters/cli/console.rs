//! Console output for the CLI: prints matches and connection changes.

use crate::domain::connection::ConnectionStatus;
use crate::domain::event::TokenEvent;
use crate::domain::search::SearchConfiguration;
use crate::ports::alerts::{CoreEvent, IngestionObserver};

/// Prints core events to stdout
#[derive(Debug, Clone, Default)]
pub struct ConsoleObserver {
    /// Also print every received event, not just matches
    show_all: bool,
}

impl ConsoleObserver {
    pub fn new(show_all: bool) -> Self {
        Self { show_all }
    }
}

pub fn format_event(event: &TokenEvent) -> String {
    let mut line = format!(
        "[{}] {}",
        event.timestamp().format("%H:%M:%S"),
        event.summary()
    );
    if let Some(mcap) = event.market_cap_sol() {
        line.push_str(&format!(" | mcap {:.2} SOL", mcap));
    }
    line
}

pub fn format_search(search: &SearchConfiguration) -> String {
    if search.is_monitor_all() {
        return "all tokens".to_string();
    }
    let terms = search.terms();
    format!(
        "{} term{}: {}",
        terms.len(),
        if terms.len() == 1 { "" } else { "s" },
        terms.join(", ")
    )
}

pub fn format_status(status: &ConnectionStatus) -> String {
    match status {
        ConnectionStatus::Connected => "✓ Connected to pump.fun".to_string(),
        ConnectionStatus::Connecting => "… Connecting".to_string(),
        ConnectionStatus::Disconnected => "✗ Disconnected".to_string(),
        ConnectionStatus::Error(message) => format!("⚠ Connection error: {}", message),
    }
}

impl IngestionObserver for ConsoleObserver {
    fn on_core_event(&self, event: &CoreEvent) {
        match event {
            CoreEvent::EventMatched(token) => {
                println!("🎯 MATCH {}", format_event(token));
                println!("   {}", token.url());
            }
            CoreEvent::EventReceived(token) if self.show_all => {
                println!("   {}", format_event(token));
            }
            CoreEvent::EventReceived(_) => {}
            CoreEvent::StatusChanged(status) => println!("{}", format_status(status)),
        }
    }
}
