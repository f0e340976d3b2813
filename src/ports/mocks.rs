//! Test doubles for the ports: a scripted feed transport and recording
//! alert capabilities. No network, fully deterministic.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::connection::ConnectionStatus;
use crate::domain::error::FeedError;
use crate::domain::event::TokenEvent;

use super::alerts::{CoreEvent, IngestionObserver, LinkOpener, MatchAlert, Notifier, NotifyError};
use super::transport::{FeedSession, FeedTransport, SessionEvent};

/// Planned result of one `open` call
#[derive(Debug, Clone)]
pub enum ScriptedOpen {
    /// Handshake fails with this message
    Fail(String),
    /// Session replays `events`; when exhausted it either closes or stays
    /// open until closed by the caller
    Session {
        events: Vec<SessionEvent>,
        hold_open: bool,
    },
}

/// Feed transport that replays a script of connection attempts
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<ScriptedOpen>>>,
    fallback: Arc<Mutex<Option<ScriptedOpen>>>,
    opened_urls: Arc<Mutex<Vec<String>>>,
    sent: Arc<Mutex<Vec<String>>>,
    closes: Arc<Mutex<usize>>,
    open_delay: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next open fails
    pub fn with_failure(self, message: &str) -> Self {
        self.push(ScriptedOpen::Fail(message.to_string()))
    }

    /// Next open yields a session that replays `frames` and then closes
    pub fn with_session(self, frames: &[&str]) -> Self {
        self.push(ScriptedOpen::Session {
            events: frames.iter().map(|f| SessionEvent::Frame(f.to_string())).collect(),
            hold_open: false,
        })
    }

    /// Next open yields a session that replays `frames` and stays open
    pub fn with_open_session(self, frames: &[&str]) -> Self {
        self.push(ScriptedOpen::Session {
            events: frames.iter().map(|f| SessionEvent::Frame(f.to_string())).collect(),
            hold_open: true,
        })
    }

    /// Next open yields a session with explicit events
    pub fn with_events(self, events: Vec<SessionEvent>, hold_open: bool) -> Self {
        self.push(ScriptedOpen::Session { events, hold_open })
    }

    /// Every open after the script runs out fails with `message`
    pub fn always_fail(self, message: &str) -> Self {
        *self.fallback.lock().unwrap() = Some(ScriptedOpen::Fail(message.to_string()));
        self
    }

    /// Every open waits `delay` before resolving (a slow handshake)
    pub fn with_open_delay(self, delay: Duration) -> Self {
        Self {
            open_delay: delay,
            ..self
        }
    }

    fn push(self, open: ScriptedOpen) -> Self {
        self.script.lock().unwrap().push_back(open);
        self
    }

    /// Number of `open` calls so far
    pub fn open_count(&self) -> usize {
        self.opened_urls.lock().unwrap().len()
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened_urls.lock().unwrap().clone()
    }

    /// Messages sent on any session
    pub fn sent_messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Sessions closed by the caller
    pub fn close_count(&self) -> usize {
        *self.closes.lock().unwrap()
    }
}

#[async_trait]
impl FeedTransport for ScriptedTransport {
    async fn open(&self, url: &str) -> Result<Box<dyn FeedSession>, FeedError> {
        self.opened_urls.lock().unwrap().push(url.to_string());

        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback.lock().unwrap().clone())
            .unwrap_or_else(|| ScriptedOpen::Fail("no scripted connection".to_string()));

        match next {
            ScriptedOpen::Fail(message) => Err(FeedError::Transport(message)),
            ScriptedOpen::Session { events, hold_open } => Ok(Box::new(ScriptedSession {
                events: events.into(),
                hold_open,
                closed: false,
                sent: self.sent.clone(),
                closes: self.closes.clone(),
            })),
        }
    }
}

/// Session produced by [`ScriptedTransport`]
#[derive(Debug)]
pub struct ScriptedSession {
    events: VecDeque<SessionEvent>,
    hold_open: bool,
    closed: bool,
    sent: Arc<Mutex<Vec<String>>>,
    closes: Arc<Mutex<usize>>,
}

#[async_trait]
impl FeedSession for ScriptedSession {
    async fn send_text(&mut self, text: String) -> Result<(), FeedError> {
        if self.closed {
            return Err(FeedError::Transport("session closed".to_string()));
        }
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn next_event(&mut self) -> SessionEvent {
        if self.closed {
            return SessionEvent::Closed;
        }

        match self.events.pop_front() {
            Some(SessionEvent::Closed) => {
                self.closed = true;
                SessionEvent::Closed
            }
            Some(event) => event,
            None if self.hold_open => std::future::pending::<SessionEvent>().await,
            None => {
                self.closed = true;
                SessionEvent::Closed
            }
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            *self.closes.lock().unwrap() += 1;
        }
    }
}

/// Notifier that records every alert
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    alerts: Arc<Mutex<Vec<MatchAlert>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record alerts but report a delivery failure for each
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn alerts(&self) -> Vec<MatchAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_match(&self, alert: &MatchAlert) -> Result<(), NotifyError> {
        self.alerts.lock().unwrap().push(alert.clone());
        if self.fail {
            return Err(NotifyError::Delivery("recording notifier set to fail".to_string()));
        }
        Ok(())
    }
}

/// Link opener that records urls instead of opening them
#[derive(Debug, Clone, Default)]
pub struct RecordingLinkOpener {
    urls: Arc<Mutex<Vec<String>>>,
}

impl RecordingLinkOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LinkOpener for RecordingLinkOpener {
    async fn open_url(&self, url: &str) -> Result<(), NotifyError> {
        self.urls.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Observer that records every core event
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<CoreEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CoreEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn received(&self) -> Vec<TokenEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CoreEvent::EventReceived(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    pub fn matched(&self) -> Vec<TokenEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CoreEvent::EventMatched(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<ConnectionStatus> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CoreEvent::StatusChanged(status) => Some(status),
                _ => None,
            })
            .collect()
    }
}

impl IngestionObserver for RecordingObserver {
    fn on_core_event(&self, event: &CoreEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
