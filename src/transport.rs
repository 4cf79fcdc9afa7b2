//! Transport seam between the connection manager and the network
//!
//! `WsTransport` talks to the real assistant over `tokio-tungstenite`.
//! Tests plug in their own `Transport` to drive connections by hand.

use crate::{OverlayError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Text frame (expected to carry JSON)
    Text(String),
    /// Binary frame
    Binary(Vec<u8>),
    /// Peer sent a close frame
    Close,
}

/// Opens connections to an endpoint
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Connection>>;
}

/// One open duplex connection
#[async_trait]
pub trait Connection: Send {
    /// Next inbound frame; `None` once the stream has ended
    async fn next_frame(&mut self) -> Option<Result<Frame>>;

    /// Close the connection from our side
    async fn close(&mut self) -> Result<()>;
}

/// WebSocket transport over `tokio-tungstenite`
#[derive(Debug, Default, Clone)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Connection>> {
        debug!("WebSocket connecting to {}", endpoint);

        let (stream, _) = tokio_tungstenite::connect_async(endpoint)
            .await
            .map_err(|e| OverlayError::ConnectionError(format!("{endpoint}: {e}")))?;

        info!("WebSocket connected to {}", endpoint);
        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WsStream,
}

#[async_trait]
impl Connection for WsConnection {
    async fn next_frame(&mut self) -> Option<Result<Frame>> {
        loop {
            let frame = match self.stream.next().await? {
                Ok(Message::Text(text)) => Frame::Text(text.as_str().to_owned()),
                Ok(Message::Binary(data)) => Frame::Binary(data.to_vec()),
                Ok(Message::Close(_)) => Frame::Close,
                // Ping/Pong are answered by tungstenite
                Ok(_) => continue,
                Err(e) => return Some(Err(OverlayError::TransportError(e.to_string()))),
            };
            return Some(Ok(frame));
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.stream
            .close(None)
            .await
            .map_err(|e| OverlayError::TransportError(format!("close failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        // Bind then drop a listener to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = WsTransport::new();
        let result = transport.connect(&format!("ws://127.0.0.1:{port}/ws")).await;
        assert!(matches!(result, Err(OverlayError::ConnectionError(_))));
    }

    #[tokio::test]
    async fn test_text_frames_from_real_socket() {
        use futures::SinkExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(Message::text(r#"{"status":"listening"}"#))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        });

        let transport = WsTransport::new();
        let mut conn = transport
            .connect(&format!("ws://127.0.0.1:{port}/ws"))
            .await
            .unwrap();

        assert_eq!(
            conn.next_frame().await.unwrap().unwrap(),
            Frame::Text(r#"{"status":"listening"}"#.to_string())
        );
        assert_eq!(conn.next_frame().await.unwrap().unwrap(), Frame::Close);

        server.await.unwrap();
    }
}
