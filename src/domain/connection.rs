//! Connection State Machine
//!
//! Pure bookkeeping for the single feed connection: status, reconnect arming
//! and the attempt counter. The async driver in
//! `application::connection_manager` performs the I/O and asks this machine
//! what to do next.
//!
//! ```text
//! Disconnected --connect--> Connecting --open--> Connected
//!      ^                        |                   |
//!      |                      error               error
//!      |                        v                   v
//!      +--------close------- Error(msg) <-----------+
//! ```
//!
//! `disconnect` returns to Disconnected from any state and disarms reconnects.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::backoff::ReconnectPolicy;

/// Status message used once the retry ceiling is hit
pub const RETRIES_EXHAUSTED_MESSAGE: &str = "exhausted retries";

/// Connection status reported to collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    /// True while a connection is open or being opened
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionStatus::Connecting | ConnectionStatus::Connected)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ConnectionStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Error(message) => write!(f, "error: {}", message),
        }
    }
}

/// What the driver should do after the stream closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Reconnects are disarmed; stay disconnected
    Idle,
    /// Schedule one reconnect after `delay`
    Reconnect { attempt: u32, delay: Duration },
    /// Retry ceiling hit; wait for a manual connect
    Exhausted { attempts: u32 },
}

/// Connection lifecycle bookkeeping
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    policy: ReconnectPolicy,
    auto_reconnect: bool,
    should_reconnect: bool,
    attempts: u32,
    status: ConnectionStatus,
    transitions: Vec<ConnectionStatus>,
}

impl ConnectionMachine {
    pub fn new(policy: ReconnectPolicy, auto_reconnect: bool) -> Self {
        Self {
            policy,
            auto_reconnect,
            should_reconnect: false,
            attempts: 0,
            status: ConnectionStatus::Disconnected,
            transitions: Vec::new(),
        }
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Whether a close will schedule a reconnect
    pub fn reconnect_armed(&self) -> bool {
        self.should_reconnect
    }

    /// Status changes recorded since the last drain, oldest first
    pub fn drain_transitions(&mut self) -> Vec<ConnectionStatus> {
        std::mem::take(&mut self.transitions)
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status.clone();
        self.transitions.push(status);
    }

    /// Request a connection. Returns false (no-op) while already connecting
    /// or connected; otherwise arms reconnects per config and moves to
    /// Connecting.
    pub fn begin_connect(&mut self) -> bool {
        if self.status.is_active() {
            return false;
        }
        self.should_reconnect = self.auto_reconnect;
        self.set_status(ConnectionStatus::Connecting);
        true
    }

    /// Stream opened and subscribed. Resets the attempt counter.
    pub fn on_open(&mut self) {
        self.attempts = 0;
        self.set_status(ConnectionStatus::Connected);
    }

    /// Transport failure. Reconnection is left to the close that follows.
    pub fn on_transport_error(&mut self, message: impl Into<String>) {
        self.set_status(ConnectionStatus::Error(message.into()));
    }

    /// Stream closed. Decides whether to reconnect and after how long.
    pub fn on_close(&mut self) -> CloseOutcome {
        self.set_status(ConnectionStatus::Disconnected);

        if !self.should_reconnect {
            return CloseOutcome::Idle;
        }

        self.attempts = self.attempts.saturating_add(1);

        if self.policy.is_exhausted(self.attempts) {
            self.set_status(ConnectionStatus::Error(RETRIES_EXHAUSTED_MESSAGE.to_string()));
            return CloseOutcome::Exhausted {
                attempts: self.attempts,
            };
        }

        CloseOutcome::Reconnect {
            attempt: self.attempts,
            delay: self.policy.next_delay(self.attempts),
        }
    }

    /// Explicit disconnect: disarm reconnects and go to Disconnected
    pub fn disconnect(&mut self) {
        self.should_reconnect = false;
        self.set_status(ConnectionStatus::Disconnected);
    }
}
