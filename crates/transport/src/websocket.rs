//! WebSocket transport built on tokio-tungstenite.

use crate::error::TransportError;
use crate::link::{Connector, Link};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Link>, TransportError> {
        debug!(url = %url, "Opening WebSocket");
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::ConnectFailed(format!("{}: {}", url, e)))?;
        Ok(Box::new(WsLink { stream }))
    }
}

struct WsLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Link for WsLink {
    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => {
                        warn!("Discarding non-UTF-8 binary message");
                        continue;
                    }
                },
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Peer closed the connection");
                    return None;
                }
                // Ping/pong replies are queued by tungstenite itself.
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
