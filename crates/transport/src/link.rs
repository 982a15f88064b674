//! Transport seams.

use crate::error::TransportError;
use async_trait::async_trait;
use url::Url;

/// One established connection to the agent.
#[async_trait]
pub trait Link: Send {
    /// Next inbound text message. `None` once the peer has gone away.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Write one text message.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Close politely. Errors are ignored.
    async fn close(&mut self);
}

/// Opens links. The Connection Manager calls this once per attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Link>, TransportError>;
}
