//! The dashboard event loop: connection events, user input and countdown
//! ticks are applied to one `Dashboard`, one at a time, in arrival order.

use crate::input::{parse_input, UserInput, HELP};
use crate::metrics::Metrics;
use crate::render::{render_change, status_report};
use crate::timer::CountdownTimer;
use chrono::{Local, NaiveTime};
use cortex_dash_core::{Change, Command, Dashboard, Frame, Outbound};
use cortex_dash_interfaces::Interface;
use cortex_dash_transport::{CommandSink, ConnectionEvent, ConnectionState, TransportError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const NOT_READY_WARNING: &str = "Connection not ready. Please wait...";
pub const CONNECTED_NOTICE: &str = "Connected to Cortex.";
pub const CONNECTION_LOST_NOTICE: &str = "Connection lost. Will try to reconnect...";
pub const EMERGENCY_STOP_NOTICE: &str = "EMERGENCY STOP: resetting system mode...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session<S> {
    dashboard: Dashboard,
    sink: S,
    interface: Arc<dyn Interface>,
    timer: CountdownTimer,
    metrics: Arc<Metrics>,
    connection: ConnectionState,
}

impl<S: CommandSink> Session<S> {
    pub fn new(dashboard: Dashboard, sink: S, interface: Arc<dyn Interface>) -> Self {
        Self {
            dashboard,
            sink,
            interface,
            timer: CountdownTimer::default(),
            metrics: Metrics::new(),
            connection: ConnectionState::Disconnected,
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    pub fn timer_active(&self) -> bool {
        self.timer.is_active()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Run until the user quits or the connection manager goes away.
    /// End of user input leaves the dashboard running as a monitor.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<ConnectionEvent>,
        mut input: mpsc::Receiver<String>,
    ) {
        let mut input_open = true;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_connection_event(event).await,
                    None => {
                        warn!("Connection manager stopped");
                        break;
                    }
                },
                line = input.recv(), if input_open => match line {
                    Some(line) => {
                        if self.handle_input(&line).await == Flow::Quit {
                            break;
                        }
                    }
                    None => {
                        debug!("Input closed");
                        input_open = false;
                    }
                },
                _ = self.timer.tick() => self.handle_tick().await,
            }
        }
    }

    pub async fn handle_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Opened => {
                self.connection = ConnectionState::Open;
                self.interface.set_banner(None).await;
                let change = self.dashboard.record_notice(CONNECTED_NOTICE, now());
                self.apply_changes(vec![change]).await;
            }
            ConnectionEvent::Frame(text) => self.handle_frame(&text).await,
            ConnectionEvent::Closed { reason } => {
                let was_open = self.connection == ConnectionState::Open;
                self.connection = ConnectionState::Disconnected;
                debug!(reason = %reason, "Link closed");
                self.interface
                    .set_banner(Some("Disconnected from Cortex, retrying..."))
                    .await;
                if was_open {
                    let change = self.dashboard.record_notice(CONNECTION_LOST_NOTICE, now());
                    self.apply_changes(vec![change]).await;
                }
            }
            ConnectionEvent::Discarded { count } => {
                self.metrics.inc_discarded_sends(count);
                self.interface
                    .show_warning(&format!(
                        "{} message(s) did not reach Cortex before the connection dropped",
                        count
                    ))
                    .await;
            }
            ConnectionEvent::ReconnectScheduled { attempt, delay } => {
                self.metrics.inc_reconnect_attempts();
                let banner = format!(
                    "Disconnected from Cortex, retrying in {:.1}s (attempt {})",
                    delay.as_secs_f64(),
                    attempt
                );
                self.interface.set_banner(Some(banner.as_str())).await;
            }
        }
    }

    async fn handle_frame(&mut self, text: &str) {
        let frame = match Frame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Discarding malformed frame");
                self.metrics.inc_decode_failures();
                return;
            }
        };

        self.metrics.inc_frames_received(frame.kind());
        if matches!(frame, Frame::Unknown(_)) {
            self.metrics.inc_unknown_frames();
        }
        let changes = self.dashboard.apply(frame, now());
        self.apply_changes(changes).await;
    }

    pub async fn handle_input(&mut self, line: &str) -> Flow {
        let Some(input) = parse_input(line) else {
            return Flow::Continue;
        };

        match input {
            UserInput::Chat(text) => self.dispatch(Outbound::chat(text)).await,
            UserInput::ToggleVision => {
                let command = self.dashboard.vision_toggle();
                self.dispatch(command.into()).await;
            }
            UserInput::ToggleAutonomy => {
                let command = self.dashboard.autonomy_toggle();
                self.dispatch(command.into()).await;
            }
            UserInput::ToggleGamer => {
                let command = self.dashboard.gamer_toggle();
                self.dispatch(command.into()).await;
            }
            UserInput::EmergencyStop => self.emergency_stop().await,
            UserInput::DismissOverlay => {
                let changes = self.dashboard.dismiss_overlay();
                self.apply_changes(changes).await;
            }
            UserInput::SetPower(level) => match Outbound::set_power(level) {
                Ok(message) => self.dispatch(message).await,
                Err(e) => self.interface.show_warning(&e.to_string()).await,
            },
            UserInput::Status => {
                let report =
                    status_report(&self.dashboard, self.connection, &self.metrics.snapshot());
                self.interface.send_output(&report).await;
            }
            UserInput::Help => self.interface.send_output(HELP).await,
            UserInput::Quit => return Flow::Quit,
            UserInput::Invalid(message) => self.interface.show_warning(&message).await,
        }
        Flow::Continue
    }

    pub async fn handle_tick(&mut self) {
        let changes = self.dashboard.tick();
        self.apply_changes(changes).await;
    }

    /// Send the stop command and reset the mode locally whether or not it went out.
    async fn emergency_stop(&mut self) {
        info!("Emergency stop requested");
        let change = self.dashboard.record_notice(EMERGENCY_STOP_NOTICE, now());
        self.apply_changes(vec![change]).await;
        self.dispatch(Command::StopAutonomy.into()).await;
        let changes = self.dashboard.emergency_stop();
        self.apply_changes(changes).await;
    }

    /// Hand a message to the connection. Rejected messages are never queued.
    async fn dispatch(&mut self, message: Outbound) {
        match self.sink.send(&message) {
            Ok(()) => {
                self.metrics.inc_messages_sent();
                let change = self
                    .dashboard
                    .record_user_message(&message.describe(), now());
                self.apply_changes(vec![change]).await;
            }
            Err(TransportError::NotConnected) => {
                warn!(message = %message.describe(), "Send rejected, connection not open");
                self.metrics.inc_rejected_sends();
                self.interface.show_warning(NOT_READY_WARNING).await;
            }
            Err(e) => {
                warn!(error = %e, "Send failed");
                self.metrics.inc_rejected_sends();
                self.interface
                    .show_warning(&format!("Send failed: {}", e))
                    .await;
            }
        }
    }

    async fn apply_changes(&mut self, changes: Vec<Change>) {
        for change in changes {
            if let Change::Timer(command) = change {
                debug!(?command, "Countdown timer");
                self.timer.apply(command);
                continue;
            }
            if let Some(text) = render_change(&self.dashboard, change) {
                self.interface.send_output(&text).await;
            }
        }
    }
}

fn now() -> NaiveTime {
    Local::now().time()
}
