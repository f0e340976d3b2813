//! Ingestion Pipeline Integration Tests
//!
//! Integration tests that verify the ingestion components work together:
//! 1. ConnectionManager -> decoder -> IngestionCoordinator flow
//! 2. Reconnect backoff and the retry ceiling
//! 3. Manual recovery and explicit disconnect
//!
//! All tests are deterministic (no real network calls) and run on paused
//! tokio time, so backoff timers fire instantly.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use pump_alert::application::{
    ConnectionConfig, ConnectionHandle, ConnectionManager, FeedUpdate, IngestionCoordinator,
};
use pump_alert::domain::backoff::ReconnectPolicy;
use pump_alert::domain::connection::{ConnectionStatus, RETRIES_EXHAUSTED_MESSAGE};
use pump_alert::domain::error::FeedError;
use pump_alert::domain::store::EventStore;
use pump_alert::ports::mocks::{
    RecordingLinkOpener, RecordingNotifier, RecordingObserver, ScriptedTransport,
};

// ============================================================================
// Test Fixtures
// ============================================================================

const SUBSCRIBED: &str = r#"{"message":"Successfully subscribed to token creation events."}"#;

fn create_frame(mint: &str, name: &str) -> String {
    format!(
        r#"{{"signature":"sig-{mint}","mint":"{mint}","txType":"create","name":"{name}","symbol":"TKN","marketCapSol":30.5,"solAmount":1.2,"initialBuy":1000000}}"#
    )
}

fn legacy_frame(ca: &str, name: &str) -> String {
    format!(r#"{{"type":"newToken","ca":"{ca}","name":"{name}","timestamp":"2024-03-01T12:00:00Z"}}"#)
}

fn fast_config() -> ConnectionConfig {
    ConnectionConfig {
        ws_url: "wss://feed.test/api/data".to_string(),
        policy: ReconnectPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(50),
            max_attempts: 10,
        },
        ..Default::default()
    }
}

struct Pipeline {
    coordinator: IngestionCoordinator,
    notifier: RecordingNotifier,
    observer: RecordingObserver,
    handle: ConnectionHandle,
    updates: mpsc::Receiver<FeedUpdate>,
    transport: ScriptedTransport,
}

fn start_pipeline(transport: ScriptedTransport, config: ConnectionConfig, search: &str) -> Pipeline {
    let notifier = RecordingNotifier::new();
    let observer = RecordingObserver::new();

    let mut coordinator = IngestionCoordinator::new(
        EventStore::new(),
        Arc::new(notifier.clone()),
        Arc::new(RecordingLinkOpener::new()),
    );
    coordinator.prepare_search(search).unwrap();
    coordinator.subscribe(Arc::new(observer.clone()));

    let (manager, handle, updates) = ConnectionManager::new(config, transport.clone());
    tokio::spawn(manager.run());

    Pipeline {
        coordinator,
        notifier,
        observer,
        handle,
        updates,
        transport,
    }
}

impl Pipeline {
    /// Apply updates until `done` returns true for one of them
    async fn pump_until(&mut self, done: impl Fn(&FeedUpdate) -> bool) -> Result<(), FeedError> {
        loop {
            let update = tokio::time::timeout(Duration::from_secs(3600), self.updates.recv())
                .await
                .expect("timed out waiting for update")
                .expect("update channel closed");
            let finished = done(&update);
            self.coordinator.handle_update(update).await?;
            if finished {
                return Ok(());
            }
        }
    }

    async fn pump_events(&mut self, count: usize) {
        let target = self.observer.received().len() + count;
        while self.observer.received().len() < target {
            self.pump_until(|u| matches!(u, FeedUpdate::Event(_)))
                .await
                .unwrap();
        }
    }
}

fn is_status(update: &FeedUpdate, status: &ConnectionStatus) -> bool {
    matches!(update, FeedUpdate::Status(s) if s == status)
}

// ============================================================================
// End-to-end flow
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stream_to_store_and_alerts() {
    let first = [
        SUBSCRIBED.to_string(),
        create_frame("M1", "SOOS Token"),
        "{broken".to_string(),
        legacy_frame("C1", "Random"),
    ];
    let second = [
        create_frame("M1", "SOOS Token"),
        create_frame("M2", "social_club"),
        r#"{"txType":"buy","name":"Ignored","mint":"M9"}"#.to_string(),
    ];
    let first: Vec<&str> = first.iter().map(String::as_str).collect();
    let second: Vec<&str> = second.iter().map(String::as_str).collect();

    let transport = ScriptedTransport::new()
        .with_session(&first)
        .with_open_session(&second);
    let mut p = start_pipeline(transport, fast_config(), "SOOS, SOCIAL");

    p.handle.connect().await.unwrap();
    p.pump_events(4).await;

    // Both sessions were opened and subscribed
    assert_eq!(p.transport.open_count(), 2);
    assert_eq!(p.transport.sent_messages().len(), 2);
    assert!(p.handle.status().await.is_connected());

    let store = p.coordinator.store();
    assert_eq!(store.all_seen().len(), 3);
    assert_eq!(store.recent().len(), 3);
    assert_eq!(store.matched().len(), 2);

    // Newest first
    let matched: Vec<&str> = store.matched().iter().map(|e| e.address()).collect();
    assert_eq!(matched, vec!["M2", "M1"]);

    // The repeated M1 did not alert twice
    let alerts = p.notifier.alerts();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].message, "Token found: SOOS Token");
    assert_eq!(alerts[1].url, "https://www.pump.fun/token/M2");

    let statuses = p.observer.statuses();
    assert_eq!(
        statuses,
        vec![
            ConnectionStatus::Connecting,
            ConnectionStatus::Connected,
            ConnectionStatus::Disconnected,
            ConnectionStatus::Connecting,
            ConnectionStatus::Connected,
        ]
    );

    let snapshot = p.coordinator.snapshot();
    let legacy = snapshot
        .all_seen
        .iter()
        .find(|e| e.address() == "C1")
        .expect("legacy event stored");
    assert_eq!(legacy.timestamp().to_rfc3339(), "2024-03-01T12:00:00+00:00");
}

#[tokio::test(start_paused = true)]
async fn test_monitor_all_matches_everything() {
    let frames = [create_frame("A", "zzz"), create_frame("B", "")];
    let frames: Vec<&str> = frames.iter().map(String::as_str).collect();
    let transport = ScriptedTransport::new().with_open_session(&frames);
    let mut p = start_pipeline(transport, fast_config(), "");

    p.handle.connect().await.unwrap();
    p.pump_events(1).await;

    // An empty name is not a create event, so only "zzz" arrives
    assert_eq!(p.coordinator.store().matched().len(), 1);
    assert_eq!(p.notifier.alerts().len(), 1);
}

// ============================================================================
// Reconnect and retry ceiling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_retry_ceiling_then_manual_recovery() {
    let mut transport = ScriptedTransport::new();
    for _ in 0..11 {
        transport = transport.with_failure("connection refused");
    }
    let frame = create_frame("M1", "vampire");
    let transport = transport.with_open_session(&[frame.as_str()]);
    let mut p = start_pipeline(transport, fast_config(), "vamp");

    p.handle.connect().await.unwrap();
    let result = p
        .pump_until(|u| matches!(u, FeedUpdate::RetriesExhausted { .. }))
        .await;

    assert_eq!(result, Err(FeedError::RetriesExhausted { attempts: 11 }));
    assert_eq!(p.transport.open_count(), 11);
    assert_eq!(
        p.observer.statuses().last(),
        Some(&ConnectionStatus::Error(RETRIES_EXHAUSTED_MESSAGE.to_string()))
    );

    // No further timer is pending
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(p.transport.open_count(), 11);

    // A manual connect resumes the feed and resets the counter
    p.handle.connect().await.unwrap();
    p.pump_until(|u| is_status(u, &ConnectionStatus::Connected))
        .await
        .unwrap();
    assert_eq!(p.handle.reconnect_attempts().await, 0);

    p.pump_events(1).await;
    assert_eq!(p.coordinator.store().matched().len(), 1);
    assert_eq!(p.transport.open_count(), 12);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_during_backoff() {
    let transport = ScriptedTransport::new()
        .with_session(&[])
        .always_fail("unexpected reconnect");
    let mut p = start_pipeline(transport, fast_config(), "");

    p.handle.connect().await.unwrap();
    p.pump_until(|u| is_status(u, &ConnectionStatus::Disconnected))
        .await
        .unwrap();

    p.handle.disconnect().await.unwrap();
    p.pump_until(|u| is_status(u, &ConnectionStatus::Disconnected))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(p.transport.open_count(), 1);
    assert_eq!(p.handle.status().await, ConnectionStatus::Disconnected);

    // Disconnect is safe to repeat
    p.handle.disconnect().await.unwrap();
    p.pump_until(|u| is_status(u, &ConnectionStatus::Disconnected))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_ends_coordinator_run() {
    let transport = ScriptedTransport::new().with_open_session(&[]);
    let p = start_pipeline(transport, fast_config(), "");
    let Pipeline {
        mut coordinator,
        handle,
        updates,
        transport,
        ..
    } = p;

    handle.connect().await.unwrap();
    handle.shutdown().await.unwrap();

    assert!(coordinator.run(updates).await.is_ok());
    assert_eq!(coordinator.status(), &ConnectionStatus::Disconnected);
    assert_eq!(transport.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_during_slow_handshake() {
    let frame = create_frame("M1", "vampire");
    let transport = ScriptedTransport::new()
        .with_open_delay(Duration::from_secs(5))
        .with_open_session(&[frame.as_str()]);
    let mut p = start_pipeline(transport, fast_config(), "vamp");

    p.handle.connect().await.unwrap();
    p.pump_until(|u| is_status(u, &ConnectionStatus::Connecting))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    p.handle.disconnect().await.unwrap();
    p.pump_until(|u| is_status(u, &ConnectionStatus::Disconnected))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert!(p.updates.try_recv().is_err());
    assert!(p.transport.sent_messages().is_empty());
    assert!(p.coordinator.store().all_seen().is_empty());
    assert_eq!(
        p.observer.statuses(),
        vec![ConnectionStatus::Connecting, ConnectionStatus::Disconnected]
    );
}
