//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! Both roles share [`WebSocketConnection`]: the host side produces one per
//! accepted socket, the client side produces one from an outbound connect.
//! The connection is cheaply cloneable so independent reader and writer
//! tasks can each hold a handle to the same socket.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

fn next_connection_id() -> ConnectionId {
    ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
}

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| {
                TransportError::AcceptFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;

        let id = next_connection_id();
        tracing::debug!(%id, %addr, "accepted WebSocket connection");

        Ok(WebSocketConnection {
            id,
            ws: Arc::new(Mutex::new(ws)),
        })
    }
}

/// A single WebSocket connection.
///
/// Cloning yields another handle to the same underlying socket.
#[derive(Clone)]
pub struct WebSocketConnection {
    id: ConnectionId,
    ws: Arc<Mutex<WsStream>>,
}

impl WebSocketConnection {
    /// Opens an outbound WebSocket connection to `host:port`.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::ConnectFailed)?;

        let (ws, _) =
            tokio_tungstenite::client_async(format!("ws://{addr}"), stream)
                .await
                .map_err(|e| {
                    TransportError::ConnectFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        e,
                    ))
                })?;

        let id = next_connection_id();
        tracing::debug!(%id, %addr, "WebSocket connection established");

        Ok(Self {
            id,
            ws: Arc::new(Mutex::new(ws)),
        })
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        let msg = Message::Binary(data.to_vec().into());
        self.ws.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        use futures_util::StreamExt;
        loop {
            let msg = self.ws.lock().await.next().await;
            match msg {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.ws.lock().await.close(None).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_accept_and_round_trip() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = transport.local_addr().expect("local addr").to_string();

        let client = tokio::spawn(async move {
            WebSocketConnection::connect(&addr).await.expect("connect")
        });

        let server_conn = transport.accept().await.expect("accept");
        let client_conn = client.await.expect("join");

        client_conn.send(b"hello").await.expect("send");
        let got = server_conn.recv().await.expect("recv");
        assert_eq!(got.as_deref(), Some(&b"hello"[..]));

        server_conn.send(b"welcome").await.expect("send");
        let got = client_conn.recv().await.expect("recv");
        assert_eq!(got.as_deref(), Some(&b"welcome"[..]));
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_close() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = transport.local_addr().expect("local addr").to_string();

        let client = tokio::spawn(async move {
            WebSocketConnection::connect(&addr).await.expect("connect")
        });

        let server_conn = transport.accept().await.expect("accept");
        let client_conn = client.await.expect("join");

        client_conn.close().await.expect("close");
        let got = server_conn.recv().await.expect("recv");
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn test_connect_to_dead_port_fails() {
        // Bind then drop a listener to get a port nothing listens on.
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr").to_string();
        drop(listener);

        let result = WebSocketConnection::connect(&addr).await;
        assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
    }
}
