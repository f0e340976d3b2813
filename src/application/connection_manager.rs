//! Connection Manager
//!
//! Owns the single feed connection. A `tokio::select!` loop drives the
//! [`ConnectionMachine`] from commands sent through a [`ConnectionHandle`],
//! the in-flight handshake, events from the open session, and at most one
//! pending reconnect timer. Decoded events and status changes are sent out as
//! [`FeedUpdate`]s.
//!
//! The handshake runs as its own `select!` arm, so a disconnect or shutdown
//! drops it before it can complete.

use std::future::{pending, Future};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::time::Sleep;
use tracing::{debug, error, info, warn};

use crate::adapters::pump_fun::{decode_frame, SubscribeMessage, DEFAULT_WS_URL};
use crate::domain::backoff::ReconnectPolicy;
use crate::domain::connection::{CloseOutcome, ConnectionMachine, ConnectionStatus};
use crate::domain::error::{FeedError, SkipReason};
use crate::domain::event::TokenEvent;
use crate::ports::transport::{FeedSession, FeedTransport, SessionEvent};

/// Maximum frame size in bytes (prevent memory exhaustion)
pub const MAX_FRAME_BYTES: usize = 1_048_576; // 1 MB

/// Default update channel capacity
pub const DEFAULT_UPDATE_BUFFER: usize = 1000;

/// Output of the connection manager
#[derive(Debug, Clone, PartialEq)]
pub enum FeedUpdate {
    /// A frame decoded into an event
    Event(TokenEvent),
    /// Connection status changed
    Status(ConnectionStatus),
    /// Retry ceiling hit; only a manual connect resumes the feed
    RetriesExhausted { attempts: u32 },
}

/// Configuration for the connection manager
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// WebSocket URL
    pub ws_url: String,
    /// Reconnect after an unexpected close
    pub auto_reconnect: bool,
    /// Backoff schedule and retry ceiling
    pub policy: ReconnectPolicy,
    /// Frames larger than this are dropped undecoded
    pub max_frame_bytes: usize,
    /// Update channel capacity
    pub update_buffer: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            auto_reconnect: true,
            policy: ReconnectPolicy::default(),
            max_frame_bytes: MAX_FRAME_BYTES,
            update_buffer: DEFAULT_UPDATE_BUFFER,
        }
    }
}

#[derive(Debug)]
enum ConnectionCommand {
    Connect,
    Disconnect,
    Subscribe {
        message: SubscribeMessage,
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

/// Cloneable control surface for a running [`ConnectionManager`]
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    command_tx: mpsc::Sender<ConnectionCommand>,
    status: Arc<RwLock<ConnectionStatus>>,
    attempts: Arc<RwLock<u32>>,
}

impl ConnectionHandle {
    async fn send(&self, command: ConnectionCommand) -> Result<(), FeedError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| FeedError::ChannelClosed)
    }

    /// Open the feed (no-op while connecting or connected)
    pub async fn connect(&self) -> Result<(), FeedError> {
        self.send(ConnectionCommand::Connect).await
    }

    /// Close the feed and cancel any pending reconnect
    pub async fn disconnect(&self) -> Result<(), FeedError> {
        self.send(ConnectionCommand::Disconnect).await
    }

    /// Send an extra subscription on the live session.
    ///
    /// Returns `Ok(false)` without sending unless the feed is connected.
    /// Empty `keys` are omitted from the request.
    pub async fn subscribe(
        &self,
        method: impl Into<String>,
        keys: Option<Vec<String>>,
    ) -> Result<bool, FeedError> {
        let (reply, sent) = oneshot::channel();
        self.send(ConnectionCommand::Subscribe {
            message: SubscribeMessage::new(method, keys),
            reply,
        })
        .await?;
        sent.await.map_err(|_| FeedError::ChannelClosed)
    }

    /// Disconnect and stop the manager task
    pub async fn shutdown(&self) -> Result<(), FeedError> {
        self.send(ConnectionCommand::Shutdown).await
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.status.read().await.clone()
    }

    /// Consecutive failed reconnects since the last successful open
    pub async fn reconnect_attempts(&self) -> u32 {
        *self.attempts.read().await
    }
}

/// Handshake plus subscription request, resolved by the run loop
type PendingOpen = Pin<Box<dyn Future<Output = Result<Box<dyn FeedSession>, FeedError>> + Send>>;

/// Reconnecting feed client
pub struct ConnectionManager<T: FeedTransport> {
    config: ConnectionConfig,
    transport: Arc<T>,
    machine: ConnectionMachine,
    update_tx: mpsc::Sender<FeedUpdate>,
    command_rx: mpsc::Receiver<ConnectionCommand>,
    pending_open: Option<PendingOpen>,
    session: Option<Box<dyn FeedSession>>,
    reconnect_timer: Option<Pin<Box<Sleep>>>,
    status: Arc<RwLock<ConnectionStatus>>,
    attempts: Arc<RwLock<u32>>,
}

/// Outcome of the in-flight open; never resolves without one
async fn open_completed(
    pending_open: &mut Option<PendingOpen>,
) -> Result<Box<dyn FeedSession>, FeedError> {
    match pending_open {
        Some(open) => open.as_mut().await,
        None => pending().await,
    }
}

/// Open a session and request new token events on it
async fn open_and_subscribe<T: FeedTransport>(
    transport: Arc<T>,
    url: String,
) -> Result<Box<dyn FeedSession>, FeedError> {
    let mut session = transport.open(&url).await?;

    let sent = match SubscribeMessage::new_token().to_json() {
        Ok(subscribe) => session.send_text(subscribe).await,
        Err(e) => Err(FeedError::transport(e)),
    };

    if let Err(e) = sent {
        warn!("Subscription request failed: {}", e);
        session.close().await;
        return Err(e);
    }
    Ok(session)
}

async fn send_update(tx: &mpsc::Sender<FeedUpdate>, update: FeedUpdate) -> Result<(), FeedError> {
    tx.send(update).await.map_err(|_| FeedError::ChannelClosed)
}

/// Next event of the open session; never resolves without one
async fn next_session_event(session: &mut Option<Box<dyn FeedSession>>) -> SessionEvent {
    match session {
        Some(session) => session.next_event().await,
        None => pending().await,
    }
}

/// Resolves when the pending reconnect is due; never resolves without one
async fn reconnect_due(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}

fn status_message(err: &FeedError) -> String {
    match err {
        FeedError::Transport(message) => message.clone(),
        other => other.to_string(),
    }
}

impl<T: FeedTransport + 'static> ConnectionManager<T> {
    /// Create a manager; returns it with its control handle and update receiver
    pub fn new(
        config: ConnectionConfig,
        transport: T,
    ) -> (Self, ConnectionHandle, mpsc::Receiver<FeedUpdate>) {
        let (update_tx, update_rx) = mpsc::channel(config.update_buffer.max(1));
        let (command_tx, command_rx) = mpsc::channel(32);
        let status = Arc::new(RwLock::new(ConnectionStatus::Disconnected));
        let attempts = Arc::new(RwLock::new(0));

        let handle = ConnectionHandle {
            command_tx,
            status: status.clone(),
            attempts: attempts.clone(),
        };

        let manager = Self {
            machine: ConnectionMachine::new(config.policy.clone(), config.auto_reconnect),
            config,
            transport: Arc::new(transport),
            update_tx,
            command_rx,
            pending_open: None,
            session: None,
            reconnect_timer: None,
            status,
            attempts,
        };

        (manager, handle, update_rx)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Run until shutdown, until every handle is dropped, or until the update
    /// receiver is dropped (`FeedError::ChannelClosed`).
    pub async fn run(mut self) -> Result<(), FeedError> {
        info!("Connection manager started for {}", self.config.ws_url);

        let result = self.run_loop().await;
        self.teardown().await;

        info!("Connection manager stopped");
        result
    }

    async fn run_loop(&mut self) -> Result<(), FeedError> {
        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(ConnectionCommand::Connect) => self.connect().await?,
                    Some(ConnectionCommand::Disconnect) => self.disconnect().await?,
                    Some(ConnectionCommand::Subscribe { message, reply }) => {
                        let sent = self.subscribe(&message).await;
                        // The caller may have stopped waiting
                        let _ = reply.send(sent);
                    }
                    Some(ConnectionCommand::Shutdown) | None => {
                        info!("Shutdown requested");
                        return Ok(());
                    }
                },
                opened = open_completed(&mut self.pending_open) => {
                    self.pending_open = None;
                    self.handle_open(opened).await?;
                }
                event = next_session_event(&mut self.session) => {
                    self.handle_session_event(event).await?;
                }
                _ = reconnect_due(&mut self.reconnect_timer) => {
                    self.reconnect_timer = None;
                    debug!("Reconnect timer fired");
                    self.connect().await?;
                }
            }
        }
    }

    /// Forward machine transitions to the shared status and the update channel
    async fn publish_transitions(&mut self) -> Result<(), FeedError> {
        *self.attempts.write().await = self.machine.attempts();

        for status in self.machine.drain_transitions() {
            debug!("Connection status: {}", status);
            *self.status.write().await = status.clone();
            send_update(&self.update_tx, FeedUpdate::Status(status)).await?;
        }
        Ok(())
    }

    /// Drop the current session, abandon any handshake and cancel the pending
    /// reconnect
    async fn cleanup(&mut self) {
        self.reconnect_timer = None;
        if self.pending_open.take().is_some() {
            debug!("Abandoned in-flight connection attempt");
        }
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
    }

    async fn connect(&mut self) -> Result<(), FeedError> {
        if !self.machine.begin_connect() {
            debug!("Connect ignored, already {}", self.machine.status());
            return Ok(());
        }

        self.cleanup().await;
        self.publish_transitions().await?;

        info!(
            "Connecting to {} (attempt {})",
            self.config.ws_url,
            self.machine.attempts()
        );

        self.pending_open = Some(Box::pin(open_and_subscribe(
            Arc::clone(&self.transport),
            self.config.ws_url.clone(),
        )));
        Ok(())
    }

    async fn handle_open(
        &mut self,
        opened: Result<Box<dyn FeedSession>, FeedError>,
    ) -> Result<(), FeedError> {
        match opened {
            Ok(session) => {
                self.session = Some(session);
                self.machine.on_open();
                info!("Connected to pump.fun, subscribed to new token events");
                self.publish_transitions().await
            }
            Err(e) => {
                warn!("Connection failed: {}", e);
                self.fail_and_close(status_message(&e)).await
            }
        }
    }

    /// Send an extra subscription; only while connected
    async fn subscribe(&mut self, message: &SubscribeMessage) -> bool {
        let session = match self.session.as_mut() {
            Some(session) if self.machine.status().is_connected() => session,
            _ => {
                debug!("Subscribe to {} ignored, not connected", message.method);
                return false;
            }
        };

        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not encode subscription {}: {}", message.method, e);
                return false;
            }
        };

        match session.send_text(text).await {
            Ok(()) => {
                info!("Subscribed to {}", message.method);
                true
            }
            Err(e) => {
                warn!("Subscription {} failed: {}", message.method, e);
                false
            }
        }
    }

    /// A failed open behaves like an error followed by a close
    async fn fail_and_close(&mut self, message: String) -> Result<(), FeedError> {
        self.machine.on_transport_error(message);
        self.publish_transitions().await?;
        self.handle_close().await
    }

    async fn disconnect(&mut self) -> Result<(), FeedError> {
        info!("Disconnecting from {}", self.config.ws_url);
        self.cleanup().await;
        self.machine.disconnect();
        self.publish_transitions().await
    }

    async fn teardown(&mut self) {
        self.cleanup().await;
        self.machine.disconnect();
        if let Err(e) = self.publish_transitions().await {
            debug!("Final status not delivered: {}", e);
        }
    }

    async fn handle_session_event(&mut self, event: SessionEvent) -> Result<(), FeedError> {
        match event {
            SessionEvent::Frame(text) => self.handle_frame(&text).await,
            SessionEvent::Error(message) => {
                warn!("Transport error: {}", message);
                self.machine.on_transport_error(message);
                self.publish_transitions().await
            }
            SessionEvent::Closed => {
                info!(
                    "Feed connection closed (auto-reconnect {})",
                    if self.machine.reconnect_armed() { "armed" } else { "off" }
                );
                self.session = None;
                self.handle_close().await
            }
        }
    }

    async fn handle_frame(&mut self, text: &str) -> Result<(), FeedError> {
        let decoded = if text.len() > self.config.max_frame_bytes {
            Err(SkipReason::Oversized(text.len()))
        } else {
            decode_frame(text)
        };

        match decoded {
            Ok(event) => {
                debug!("New token event: {}", event.summary());
                send_update(&self.update_tx, FeedUpdate::Event(event)).await
            }
            Err(reason) => {
                debug!("Dropping frame: {}", reason);
                Ok(())
            }
        }
    }

    async fn handle_close(&mut self) -> Result<(), FeedError> {
        let outcome = self.machine.on_close();
        self.publish_transitions().await?;

        match outcome {
            CloseOutcome::Idle => {
                debug!("Not reconnecting");
            }
            CloseOutcome::Reconnect { attempt, delay } => {
                warn!(
                    "Reconnecting in {}ms (attempt {}/{})",
                    delay.as_millis(),
                    attempt,
                    self.machine.policy().max_attempts
                );
                self.schedule_reconnect(delay);
            }
            CloseOutcome::Exhausted { attempts } => {
                error!(
                    "Giving up after {} reconnect attempts; call connect() to resume",
                    attempts - 1
                );
                send_update(&self.update_tx, FeedUpdate::RetriesExhausted { attempts }).await?;
            }
        }
        Ok(())
    }

    fn schedule_reconnect(&mut self, delay: Duration) {
        // Replacing the timer drops any previous one
        self.reconnect_timer = Some(Box::pin(tokio::time::sleep(delay)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::pump_fun::WebSocketTransport;
    use crate::ports::mocks::ScriptedTransport;
    use tokio::task::JoinHandle;

    const CREATE_FRAME: &str = r#"{"txType":"create","name":"Foo","mint":"ABC","symbol":"FOO"}"#;

    fn test_config() -> ConnectionConfig {
        ConnectionConfig {
            ws_url: "wss://test.invalid/api/data".to_string(),
            policy: ReconnectPolicy {
                base_delay: Duration::from_millis(1000),
                max_jitter: Duration::ZERO,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn start(
        config: ConnectionConfig,
        transport: ScriptedTransport,
    ) -> (
        ConnectionHandle,
        mpsc::Receiver<FeedUpdate>,
        JoinHandle<Result<(), FeedError>>,
    ) {
        let (manager, handle, rx) = ConnectionManager::new(config, transport);
        let task = tokio::spawn(manager.run());
        (handle, rx, task)
    }

    async fn next_update(rx: &mut mpsc::Receiver<FeedUpdate>) -> FeedUpdate {
        tokio::time::timeout(Duration::from_secs(3600), rx.recv())
            .await
            .expect("timed out waiting for update")
            .expect("update channel closed")
    }

    fn status(s: ConnectionStatus) -> FeedUpdate {
        FeedUpdate::Status(s)
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_subscribes_and_forwards_events() {
        let transport = ScriptedTransport::new().with_open_session(&[
            r#"{"message":"Successfully subscribed"}"#,
            "garbage",
            CREATE_FRAME,
        ]);
        let (handle, mut rx, task) = start(test_config(), transport.clone());

        handle.connect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connecting));
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connected));

        match next_update(&mut rx).await {
            FeedUpdate::Event(event) => {
                assert_eq!(event.address(), "ABC");
                assert_eq!(event.name(), "Foo");
            }
            other => panic!("expected event, got {:?}", other),
        }

        assert_eq!(
            transport.sent_messages(),
            vec![r#"{"method":"subscribeNewToken"}"#.to_string()]
        );
        assert_eq!(transport.opened_urls(), vec!["wss://test.invalid/api/data".to_string()]);
        assert!(handle.status().await.is_connected());

        handle.shutdown().await.unwrap();
        assert!(task.await.unwrap().is_ok());
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_close() {
        let transport = ScriptedTransport::new()
            .with_session(&[])
            .with_open_session(&[CREATE_FRAME]);
        let (handle, mut rx, _task) = start(test_config(), transport.clone());

        handle.connect().await.unwrap();
        let expected = vec![
            status(ConnectionStatus::Connecting),
            status(ConnectionStatus::Connected),
            status(ConnectionStatus::Disconnected),
            status(ConnectionStatus::Connecting),
            status(ConnectionStatus::Connected),
        ];
        for want in expected {
            assert_eq!(next_update(&mut rx).await, want);
        }
        assert!(matches!(next_update(&mut rx).await, FeedUpdate::Event(_)));

        assert_eq!(transport.open_count(), 2);
        assert_eq!(handle.reconnect_attempts().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_then_close() {
        let transport = ScriptedTransport::new()
            .with_events(
                vec![SessionEvent::Error("reset by peer".to_string()), SessionEvent::Closed],
                false,
            )
            .with_open_session(&[]);
        let (handle, mut rx, _task) = start(test_config(), transport.clone());

        handle.connect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connecting));
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connected));
        assert_eq!(
            next_update(&mut rx).await,
            status(ConnectionStatus::Error("reset by peer".to_string()))
        );
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Disconnected));
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connecting));
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connected));
        assert_eq!(transport.open_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_ceiling_stops_reconnecting() {
        let transport = ScriptedTransport::new().always_fail("connection refused");
        let (handle, mut rx, _task) = start(test_config(), transport.clone());

        handle.connect().await.unwrap();
        let attempts = loop {
            if let FeedUpdate::RetriesExhausted { attempts } = next_update(&mut rx).await {
                break attempts;
            }
        };

        assert_eq!(attempts, 11);
        assert_eq!(transport.open_count(), 11);
        assert_eq!(
            handle.status().await,
            ConnectionStatus::Error("exhausted retries".to_string())
        );

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(transport.open_count(), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_reconnect() {
        let transport = ScriptedTransport::new()
            .with_session(&[])
            .always_fail("should not be called");
        let (handle, mut rx, _task) = start(test_config(), transport.clone());

        handle.connect().await.unwrap();
        loop {
            if next_update(&mut rx).await == status(ConnectionStatus::Disconnected) {
                break;
            }
        }

        handle.disconnect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Disconnected));

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(transport.open_count(), 1);
        assert_eq!(handle.status().await, ConnectionStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_reconnect_when_disabled() {
        let config = ConnectionConfig {
            auto_reconnect: false,
            ..test_config()
        };
        let transport = ScriptedTransport::new().with_session(&[]);
        let (handle, mut rx, _task) = start(config, transport.clone());

        handle.connect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connecting));
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connected));
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Disconnected));

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(transport.open_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_while_connected_is_noop() {
        let transport = ScriptedTransport::new().with_open_session(&[]);
        let (handle, mut rx, _task) = start(test_config(), transport.clone());

        handle.connect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connecting));
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connected));

        handle.connect().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.open_count(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_frame_dropped() {
        let config = ConnectionConfig {
            max_frame_bytes: 16,
            ..test_config()
        };
        let transport = ScriptedTransport::new().with_open_session(&[CREATE_FRAME]);
        let (handle, mut rx, _task) = start(config, transport);

        handle.connect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connecting));
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connected));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_during_handshake() {
        let transport = ScriptedTransport::new()
            .with_open_delay(Duration::from_secs(5))
            .with_open_session(&[CREATE_FRAME]);
        let (handle, mut rx, _task) = start(test_config(), transport.clone());

        handle.connect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connecting));

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.disconnect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Disconnected));

        // The abandoned handshake never completes or subscribes
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(rx.try_recv().is_err());
        assert!(transport.sent_messages().is_empty());
        assert_eq!(transport.open_count(), 1);
        assert_eq!(handle.status().await, ConnectionStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_after_abandoned_handshake() {
        let transport = ScriptedTransport::new()
            .with_open_delay(Duration::from_secs(5))
            .with_open_session(&[CREATE_FRAME]);
        let (handle, mut rx, _task) = start(test_config(), transport.clone());

        handle.connect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connecting));
        handle.disconnect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Disconnected));

        handle.connect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connecting));
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connected));
        assert!(matches!(next_update(&mut rx).await, FeedUpdate::Event(_)));
        assert_eq!(transport.open_count(), 2);
        assert_eq!(transport.sent_messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_handshake() {
        let transport = ScriptedTransport::new()
            .with_open_delay(Duration::from_secs(5))
            .with_open_session(&[]);
        let (handle, mut rx, task) = start(test_config(), transport.clone());

        handle.connect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connecting));
        handle.shutdown().await.unwrap();

        assert!(task.await.unwrap().is_ok());
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Disconnected));
        assert!(transport.sent_messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_while_connected() {
        let transport = ScriptedTransport::new().with_open_session(&[]);
        let (handle, mut rx, _task) = start(test_config(), transport.clone());

        handle.connect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connecting));
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connected));

        let sent = handle
            .subscribe("subscribeTokenTrade", Some(vec!["ABC".to_string()]))
            .await
            .unwrap();
        assert!(sent);
        assert_eq!(
            transport.sent_messages(),
            vec![
                r#"{"method":"subscribeNewToken"}"#.to_string(),
                r#"{"method":"subscribeTokenTrade","keys":["ABC"]}"#.to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_requires_connection() {
        let transport = ScriptedTransport::new()
            .with_open_delay(Duration::from_secs(5))
            .with_open_session(&[]);
        let (handle, mut rx, _task) = start(test_config(), transport.clone());

        assert!(!handle.subscribe("subscribeTokenTrade", None).await.unwrap());

        // Still handshaking
        handle.connect().await.unwrap();
        assert_eq!(next_update(&mut rx).await, status(ConnectionStatus::Connecting));
        assert!(!handle.subscribe("subscribeTokenTrade", None).await.unwrap());

        assert!(transport.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_after_manager_stopped() {
        let (manager, handle, _rx) = ConnectionManager::new(test_config(), ScriptedTransport::new());
        drop(manager);
        assert_eq!(
            handle.subscribe("subscribeTokenTrade", None).await,
            Err(FeedError::ChannelClosed)
        );
    }

    fn assert_send<F: Send>(_: &F) {}

    #[test]
    fn test_run_future_is_send() {
        let (manager, _handle, _rx) =
            ConnectionManager::new(ConnectionConfig::default(), WebSocketTransport::default());
        let run = manager.run();
        assert_send(&run);
    }

    #[tokio::test]
    async fn test_manager_stops_when_handles_dropped() {
        let (manager, handle, _rx) = ConnectionManager::new(test_config(), ScriptedTransport::new());
        drop(handle);
        assert!(manager.run().await.is_ok());
    }
}
