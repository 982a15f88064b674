//! Cortex Dash core
//!
//! Pure dashboard state for a remote Cortex agent: the wire protocol, the
//! mode reconciler and countdown, display logs and gauges. Nothing here does
//! I/O; the transport and the app drive it.

pub mod countdown;
pub mod dashboard;
pub mod gauge;
pub mod log;
pub mod mode;
pub mod protocol;
pub mod vision;

pub use countdown::{Countdown, Tick};
pub use dashboard::{Change, Dashboard, DashboardConfig, Nucleus, Telemetry};
pub use gauge::{Gauge, GaugeBand, GaugeThresholds, Polarity};
pub use log::{ChatEntry, DisplayLog, LogEntry};
pub use mode::{
    reconcile, Facets, ModeReconciler, ModeState, ModeUpdate, ReconcilerConfig, TimerCommand,
};
pub use protocol::{Command, ControlMessage, Frame, Outbound, ProtocolError};
pub use vision::{ImageFormat, Pointer, VisionImage};
