//! The WebSocket listener players connect to.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Connection ids are process-wide and never reused.
static CONNECTION_SEQ: AtomicU64 = AtomicU64::new(1);

type Socket = WebSocketStream<TcpStream>;

/// TCP listener that upgrades every accepted stream to a WebSocket.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        tracing::info!(addr, "listening for players");
        Ok(Self { listener })
    }

    /// The bound address; tests bind port 0 and read the real one here.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<WebSocketConnection, TransportError> {
        let (tcp, peer) = self.listener.accept().await.map_err(TransportError::Accept)?;
        let socket = tokio_tungstenite::accept_async(tcp)
            .await
            .map_err(TransportError::Upgrade)?;

        let id = ConnectionId::new(CONNECTION_SEQ.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %peer, "websocket upgraded");
        Ok(WebSocketConnection::new(id, peer, socket))
    }
}

/// One player's socket, split into independently locked halves.
///
/// The read half is held by the connection's read loop for as long as it
/// waits; the write half belongs to the outbox writer.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    writer: Mutex<SplitSink<Socket, Message>>,
    reader: Mutex<SplitStream<Socket>>,
}

impl WebSocketConnection {
    fn new(id: ConnectionId, peer: SocketAddr, socket: Socket) -> Self {
        let (writer, reader) = socket.split();
        Self {
            id,
            peer,
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        }
    }

    /// Remote address of the player.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn write_error(&self, err: tungstenite::Error) -> TransportError {
        match err {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                TransportError::Closed(self.peer.to_string())
            }
            other => TransportError::Write(other),
        }
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    /// UTF-8 payloads go out as text frames, everything else as binary.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let frame = match std::str::from_utf8(data) {
            Ok(text) => Message::text(text.to_owned()),
            Err(_) => Message::binary(data.to_vec()),
        };
        let mut writer = self.writer.lock().await;
        writer.send(frame).await.map_err(|e| self.write_error(e))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut reader = self.reader.lock().await;
        while let Some(frame) = reader.next().await {
            match frame.map_err(TransportError::Read)? {
                Message::Text(text) => return Ok(Some(text.as_bytes().to_vec())),
                Message::Binary(bytes) => return Ok(Some(bytes.to_vec())),
                Message::Close(_) => return Ok(None),
                // Control frames are answered by tungstenite itself.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer.close().await.map_err(|e| self.write_error(e))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
