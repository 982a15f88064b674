//! Cortex Dash transport
//!
//! Keeps one connection to the agent alive, reconnecting with exponential
//! backoff forever, and refuses outbound messages while the link is down.

pub mod backoff;
pub mod connection;
pub mod error;
pub mod link;
pub mod websocket;

pub use backoff::{Backoff, BackoffPolicy};
pub use connection::{
    CommandSink, ConnectionEvent, ConnectionHandle, ConnectionManager, ConnectionState,
};
pub use error::TransportError;
pub use link::{Connector, Link};
pub use websocket::WsConnector;
