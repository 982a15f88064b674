//! Cortex Dash app: configuration, metrics and the terminal dashboard loop.

pub mod config;
pub mod input;
pub mod metrics;
pub mod render;
pub mod session;
pub mod timer;

pub use config::{Config, ConfigError};
pub use session::{Flow, Session};
