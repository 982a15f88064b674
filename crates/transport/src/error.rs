use cortex_dash_core::ProtocolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection not ready")]
    NotConnected,

    #[error("Connection task has stopped")]
    Closed,

    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] ProtocolError),

    #[error("Invalid endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
