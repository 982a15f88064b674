//! Connection Manager behaviour against scripted links.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use async_trait::async_trait;
use cortex_dash_core::Outbound;
use cortex_dash_transport::*;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

struct ScriptedLink {
    inbound: mpsc::UnboundedReceiver<String>,
    sent: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl Link for ScriptedLink {
    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        let _ = self.sent.send(text);
        Ok(())
    }

    async fn close(&mut self) {}
}

/// Controls for one scripted open link.
struct LinkControl {
    inbound: mpsc::UnboundedSender<String>,
    sent: mpsc::UnboundedReceiver<String>,
}

fn scripted_link() -> (ScriptedLink, LinkControl) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    (
        ScriptedLink {
            inbound: inbound_rx,
            sent: sent_tx,
        },
        LinkControl {
            inbound: inbound_tx,
            sent: sent_rx,
        },
    )
}

/// Link that stays silent and fails every write.
struct BrokenLink;

#[async_trait]
impl Link for BrokenLink {
    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        std::future::pending().await
    }

    async fn send(&mut self, _text: String) -> Result<(), TransportError> {
        Err(TransportError::ConnectFailed("broken pipe".to_string()))
    }

    async fn close(&mut self) {}
}

enum Attempt {
    Fail,
    Open(ScriptedLink),
    Broken,
}

/// Plays back attempts in order, then fails forever.
struct ScriptedConnector {
    script: Mutex<VecDeque<Attempt>>,
    attempts: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    fn new(script: Vec<Attempt>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _url: &Url) -> Result<Box<dyn Link>, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Attempt::Open(link)) => Ok(Box::new(link)),
            Some(Attempt::Broken) => Ok(Box::new(BrokenLink)),
            Some(Attempt::Fail) | None => {
                Err(TransportError::ConnectFailed("connection refused".to_string()))
            }
        }
    }
}

fn endpoint() -> Url {
    Url::parse("ws://127.0.0.1:8000/ws/chat").unwrap()
}

async fn next_delay(events: &mut mpsc::Receiver<ConnectionEvent>) -> Duration {
    loop {
        match events.recv().await.expect("manager stopped") {
            ConnectionEvent::ReconnectScheduled { delay, .. } => return delay,
            _ => continue,
        }
    }
}

async fn wait_for_open(events: &mut mpsc::Receiver<ConnectionEvent>) {
    loop {
        if events.recv().await.expect("manager stopped") == ConnectionEvent::Opened {
            return;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_five_failures_follow_exponential_backoff() {
    let connector = ScriptedConnector::new(vec![]);
    let (manager, _handle, mut events) =
        ConnectionManager::new(connector, endpoint(), BackoffPolicy::default());
    let task = manager.spawn();

    let mut delays = Vec::new();
    for _ in 0..5 {
        delays.push(next_delay(&mut events).await.as_millis());
    }
    assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_backoff_caps_and_never_gives_up() {
    let connector = ScriptedConnector::new(vec![]);
    let attempts = connector.attempts.clone();
    let policy = BackoffPolicy {
        base: Duration::from_millis(100),
        cap: Duration::from_millis(400),
    };
    let (manager, _handle, mut events) = ConnectionManager::new(connector, endpoint(), policy);
    let task = manager.spawn();

    let mut delays = Vec::new();
    for _ in 0..12 {
        delays.push(next_delay(&mut events).await.as_millis());
    }
    assert_eq!(&delays[..4], &[100, 200, 400, 400]);
    assert!(delays[4..].iter().all(|d| *d == 400));
    assert!(attempts.load(Ordering::SeqCst) >= 12);

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_successful_open_resets_backoff() {
    let (link, control) = scripted_link();
    let connector = ScriptedConnector::new(vec![
        Attempt::Fail,
        Attempt::Fail,
        Attempt::Open(link),
        Attempt::Fail,
    ]);
    let (manager, handle, mut events) =
        ConnectionManager::new(connector, endpoint(), BackoffPolicy::default());
    let task = manager.spawn();

    assert_eq!(next_delay(&mut events).await.as_millis(), 1000);
    assert_eq!(next_delay(&mut events).await.as_millis(), 2000);

    wait_for_open(&mut events).await;
    assert_eq!(handle.state(), ConnectionState::Open);

    // Peer goes away.
    drop(control);

    match events.recv().await.unwrap() {
        ConnectionEvent::Closed { reason } => assert_eq!(reason, "closed by peer"),
        other => panic!("expected close, got {:?}", other),
    }
    assert_eq!(next_delay(&mut events).await.as_millis(), 1000);
    assert_eq!(next_delay(&mut events).await.as_millis(), 2000);
    assert_ne!(handle.state(), ConnectionState::Open);

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_send_while_disconnected_never_reaches_link() {
    let (link, mut control) = scripted_link();
    let connector = ScriptedConnector::new(vec![Attempt::Fail, Attempt::Open(link)]);
    let (manager, handle, mut events) =
        ConnectionManager::new(connector, endpoint(), BackoffPolicy::default());

    // Before the manager even runs.
    assert!(matches!(
        handle.send(&Outbound::chat("too early")),
        Err(TransportError::NotConnected)
    ));
    let task = manager.spawn();

    next_delay(&mut events).await;
    assert!(!handle.is_open());
    assert!(matches!(
        handle.send(&Outbound::chat("still too early")),
        Err(TransportError::NotConnected)
    ));

    wait_for_open(&mut events).await;
    handle.send(&Outbound::chat("/mode vision")).unwrap();
    assert_eq!(control.sent.recv().await.unwrap(), "/mode vision");
    assert!(control.sent.try_recv().is_err());

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_frames_and_control_messages_flow_while_open() {
    let (link, mut control) = scripted_link();
    let connector = ScriptedConnector::new(vec![Attempt::Open(link)]);
    let (manager, handle, mut events) =
        ConnectionManager::new(connector, endpoint(), BackoffPolicy::default());
    let task = manager.spawn();

    wait_for_open(&mut events).await;

    control
        .inbound
        .send(r#"{"type":"system","payload":{"msg":"hi"}}"#.to_string())
        .unwrap();
    control.inbound.send("garbage".to_string()).unwrap();
    assert_eq!(
        events.recv().await.unwrap(),
        ConnectionEvent::Frame(r#"{"type":"system","payload":{"msg":"hi"}}"#.to_string())
    );
    assert_eq!(
        events.recv().await.unwrap(),
        ConnectionEvent::Frame("garbage".to_string())
    );

    handle.send(&Outbound::set_power(7.5).unwrap()).unwrap();
    assert_eq!(
        control.sent.recv().await.unwrap(),
        r#"{"type":"set_power","payload":{"level":7.5}}"#
    );

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_messages_lost_with_the_link_are_reported() {
    let connector = ScriptedConnector::new(vec![Attempt::Broken]);
    let (manager, handle, mut events) =
        ConnectionManager::new(connector, endpoint(), BackoffPolicy::default());
    let task = manager.spawn();

    wait_for_open(&mut events).await;

    // Both are accepted while open. The first write fails and the second is
    // still queued when the link goes down.
    handle.send(&Outbound::chat("first")).unwrap();
    handle.send(&Outbound::chat("second")).unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        ConnectionEvent::Discarded { count: 2 }
    );
    match events.recv().await.unwrap() {
        ConnectionEvent::Closed { reason } => assert!(reason.contains("broken pipe")),
        other => panic!("expected close, got {:?}", other),
    }
    assert_eq!(next_delay(&mut events).await.as_millis(), 1000);
    assert!(!handle.is_open());

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_clean_close_reports_nothing_discarded() {
    let (link, control) = scripted_link();
    let connector = ScriptedConnector::new(vec![Attempt::Open(link)]);
    let (manager, _handle, mut events) =
        ConnectionManager::new(connector, endpoint(), BackoffPolicy::default());
    let task = manager.spawn();

    wait_for_open(&mut events).await;
    drop(control);

    assert!(matches!(
        events.recv().await.unwrap(),
        ConnectionEvent::Closed { .. }
    ));

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_manager_stops_when_events_dropped() {
    let connector = ScriptedConnector::new(vec![]);
    let (manager, _handle, events) =
        ConnectionManager::new(connector, endpoint(), BackoffPolicy::default());
    drop(events);

    tokio::time::timeout(Duration::from_secs(5), manager.run())
        .await
        .expect("manager should exit once nobody listens");
}
