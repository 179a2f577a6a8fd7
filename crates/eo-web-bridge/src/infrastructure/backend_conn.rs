//! TCP connection to the game server.
//!
//! Each browser WebSocket session gets its own TCP connection to the backend;
//! the game server sees the relay as just another game client.  Connections
//! are never pooled or reused across sessions.

use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::infrastructure::error::RelayError;

/// A freshly dialled connection to the game server, already split into
/// independently owned halves so each forwarding loop can own one.
pub struct BackendConnection {
    /// Read half: packets from the game server.
    pub read_half: OwnedReadHalf,
    /// Write half: bytes from the browser.
    pub write_half: OwnedWriteHalf,
}

impl BackendConnection {
    /// Dials `address` (`host:port`, resolved now) within `connect_timeout`.
    ///
    /// Nagle's algorithm is disabled: EO packets are small and
    /// latency-sensitive, and every write already carries whole messages.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::BackendUnreachable`] if resolution or the TCP
    /// handshake fails, or if it does not finish within `connect_timeout`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use eo_web_bridge::infrastructure::backend_conn::BackendConnection;
    ///
    /// # async fn example() -> Result<(), eo_web_bridge::infrastructure::RelayError> {
    /// let conn = BackendConnection::connect("127.0.0.1:8078", Duration::from_secs(5)).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(address: &str, connect_timeout: Duration) -> Result<Self, RelayError> {
        let unreachable = |source| RelayError::BackendUnreachable {
            addr: address.to_string(),
            source,
        };

        let stream = match timeout(connect_timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(unreachable(e)),
            Err(_) => {
                return Err(unreachable(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect timed out after {connect_timeout:?}"),
                )))
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("backend {address}: failed to set TCP_NODELAY: {e}");
        }
        debug!("backend {address}: connected");

        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            read_half,
            write_half,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_to_listening_backend_succeeds() {
        // Arrange: a local "game server"
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        // Act
        let mut conn = BackendConnection::connect(&addr, Duration::from_secs(2))
            .await
            .unwrap();
        let (mut server_side, _) = listener.accept().await.unwrap();

        // Assert: bytes flow through the write half
        conn.write_half.write_all(&[0x02, 0xFE, 0x07]).await.unwrap();
        let mut buf = [0u8; 3];
        server_side.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [0x02, 0xFE, 0x07]);
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_is_backend_unreachable() {
        // Arrange: bind then drop to get a port nothing listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };

        // Act
        let result = BackendConnection::connect(&addr, Duration::from_secs(2)).await;

        // Assert
        match result {
            Err(RelayError::BackendUnreachable { addr: reported, .. }) => assert_eq!(reported, addr),
            Err(other) => panic!("expected BackendUnreachable, got {other:?}"),
            Ok(_) => panic!("expected BackendUnreachable, got a connection"),
        }
    }

    #[tokio::test]
    async fn test_connect_to_unparseable_address_is_backend_unreachable() {
        let result = BackendConnection::connect("no-port-here", Duration::from_secs(2)).await;
        assert!(matches!(result, Err(RelayError::BackendUnreachable { .. })));
    }
}
