//! Connection Manager: owns the link and keeps it alive.

use crate::backoff::{Backoff, BackoffPolicy};
use crate::error::TransportError;
use crate::link::{Connector, Link};
use cortex_dash_core::Outbound;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
        }
    }
}

/// What the manager reports to the app, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Opened,
    Frame(String),
    Closed { reason: String },
    /// Messages accepted while open that never made it onto the wire.
    Discarded { count: usize },
    ReconnectScheduled { attempt: u32, delay: Duration },
}

/// Where outbound messages go. Sends are rejected outright unless the link is open.
pub trait CommandSink {
    fn is_open(&self) -> bool;

    /// # Errors
    /// [`TransportError::NotConnected`] when no link is open. Nothing is queued.
    fn send(&self, message: &Outbound) -> Result<(), TransportError>;
}

/// Cheap, cloneable view of the connection for everyone except the manager.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    state: watch::Receiver<ConnectionState>,
    outbound: mpsc::UnboundedSender<String>,
}

impl ConnectionHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }
}

impl CommandSink for ConnectionHandle {
    fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    fn send(&self, message: &Outbound) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotConnected);
        }
        let text = message.encode()?;
        self.outbound.send(text).map_err(|_| TransportError::Closed)
    }
}

enum PumpExit {
    /// Link gone. `unsent` counts a message whose write failed.
    Lost { reason: String, unsent: usize },
    Shutdown,
}

pub struct ConnectionManager<C> {
    connector: C,
    url: Url,
    backoff: Backoff,
    state: watch::Sender<ConnectionState>,
    events: mpsc::Sender<ConnectionEvent>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl<C> ConnectionManager<C>
where
    C: Connector + 'static,
{
    pub fn new(
        connector: C,
        url: Url,
        policy: BackoffPolicy,
    ) -> (Self, ConnectionHandle, mpsc::Receiver<ConnectionEvent>) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let manager = Self {
            connector,
            url,
            backoff: Backoff::new(policy),
            state: state_tx,
            events: events_tx,
            outbound: outbound_rx,
        };
        let handle = ConnectionHandle {
            state: state_rx,
            outbound: outbound_tx,
        };
        (manager, handle, events_rx)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Connect, pump, and reconnect forever. Returns only once the event
    /// receiver has been dropped.
    pub async fn run(mut self) {
        loop {
            self.set_state(ConnectionState::Connecting);

            let (reason, unsent) = match self.connector.connect(&self.url).await {
                Ok(mut link) => {
                    self.backoff.reset();
                    self.set_state(ConnectionState::Open);
                    info!(url = %self.url, "Connected");

                    if self.events.send(ConnectionEvent::Opened).await.is_err() {
                        link.close().await;
                        return;
                    }
                    match pump(link.as_mut(), &mut self.outbound, &self.events).await {
                        PumpExit::Lost { reason, unsent } => (reason, unsent),
                        PumpExit::Shutdown => {
                            link.close().await;
                            return;
                        }
                    }
                }
                Err(e) => (e.to_string(), 0),
            };

            self.set_state(ConnectionState::Disconnected);
            let count = unsent + self.discard_pending();
            warn!(reason = %reason, "Connection lost");
            if count > 0
                && self
                    .events
                    .send(ConnectionEvent::Discarded { count })
                    .await
                    .is_err()
            {
                return;
            }
            if self
                .events
                .send(ConnectionEvent::Closed { reason })
                .await
                .is_err()
            {
                return;
            }

            let delay = self.backoff.next_delay();
            let attempt = self.backoff.attempt();
            info!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Scheduling reconnect"
            );
            if self
                .events
                .send(ConnectionEvent::ReconnectScheduled { attempt, delay })
                .await
                .is_err()
            {
                return;
            }
            tokio::time::sleep(delay).await;
        }
    }

    fn set_state(&self, state: ConnectionState) {
        debug!(state = state.as_str(), "Connection state");
        self.state.send_replace(state);
    }

    /// Anything accepted just before the link died is not carried over.
    fn discard_pending(&mut self) -> usize {
        let mut dropped = 0usize;
        while self.outbound.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            warn!(dropped, "Discarded unsent messages after disconnect");
        }
        dropped
    }
}

async fn pump(
    link: &mut dyn Link,
    outbound: &mut mpsc::UnboundedReceiver<String>,
    events: &mpsc::Sender<ConnectionEvent>,
) -> PumpExit {
    loop {
        tokio::select! {
            inbound = link.recv() => match inbound {
                Some(Ok(text)) => {
                    if events.send(ConnectionEvent::Frame(text)).await.is_err() {
                        return PumpExit::Shutdown;
                    }
                }
                Some(Err(e)) => return PumpExit::Lost { reason: e.to_string(), unsent: 0 },
                None => {
                    return PumpExit::Lost {
                        reason: "closed by peer".to_string(),
                        unsent: 0,
                    }
                }
            },
            Some(text) = outbound.recv() => {
                if let Err(e) = link.send(text).await {
                    warn!(error = %e, "Write failed");
                    return PumpExit::Lost { reason: e.to_string(), unsent: 1 };
                }
            }
        }
    }
}
