//! End-to-end relay tests over real loopback sockets.
//!
//! Each test starts a relay through [`RelayManager`], plays the game server
//! with a bare `TcpListener`, and plays the browser with a tokio-tungstenite
//! client.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use eo_web_bridge::domain::{OriginPolicy, RelayConfig};
use eo_web_bridge::infrastructure::RelayManager;

type Browser = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

/// Helper: a fake game server on an OS-assigned port.
async fn fake_backend() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

/// Helper: start a relay on an OS-assigned port in front of `backend`.
async fn start_relay(manager: &RelayManager, backend: &str) -> SocketAddr {
    manager
        .start(RelayConfig::new("127.0.0.1", 0, backend))
        .await
        .unwrap()
}

/// Helper: connect a browser and accept the matching backend connection.
async fn connect_pair(relay: SocketAddr, backend: &TcpListener) -> (Browser, TcpStream) {
    let (browser, _) = tokio_tungstenite::connect_async(format!("ws://{relay}/"))
        .await
        .unwrap();
    let (server_side, _) = tokio::time::timeout(WAIT, backend.accept())
        .await
        .expect("relay never dialled the backend")
        .unwrap();
    (browser, server_side)
}

/// Helper: next binary message, with a timeout.
async fn next_binary(browser: &mut Browser) -> Vec<u8> {
    let msg = tokio::time::timeout(WAIT, browser.next())
        .await
        .expect("timed out waiting for WS message")
        .expect("stream ended")
        .expect("WS error");
    match msg {
        Message::Binary(data) => data.to_vec(),
        other => panic!("expected Binary message, got {other:?}"),
    }
}

/// Helper: true once the browser side has observed the session ending.
async fn browser_sees_end(browser: &mut Browser) -> bool {
    loop {
        match tokio::time::timeout(WAIT, browser.next()).await {
            Err(_) => return false,
            Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
            Ok(Some(Ok(_))) => continue,
        }
    }
}

// ── Backend → browser ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_split_packet_arrives_as_one_binary_message() {
    // Arrange
    let manager = RelayManager::new();
    let (backend, backend_addr) = fake_backend().await;
    let relay = start_relay(&manager, &backend_addr).await;
    let (mut browser, mut server_side) = connect_pair(relay, &backend).await;

    // Act: length header for 3, then the body in a separate write
    server_side.write_all(&[0x04, 0xFE]).await.unwrap();
    server_side.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    server_side.write_all(&[0x10, 0x20, 0x30]).await.unwrap();

    // Assert: one 5-byte message, prefix included
    assert_eq!(
        next_binary(&mut browser).await,
        vec![0x04, 0xFE, 0x10, 0x20, 0x30]
    );

    // Act: the framer is waiting on the next header
    server_side
        .write_all(&[0x03, 0xFE, 0xAA, 0xBB, 0x02, 0xFE, 0xCC])
        .await
        .unwrap();

    // Assert: two packets from one write become two messages, in order
    assert_eq!(next_binary(&mut browser).await, vec![0x03, 0xFE, 0xAA, 0xBB]);
    assert_eq!(next_binary(&mut browser).await, vec![0x02, 0xFE, 0xCC]);

    manager.stop().await;
}

#[tokio::test]
async fn test_backend_close_ends_browser_session() {
    // Arrange
    let manager = RelayManager::new();
    let (backend, backend_addr) = fake_backend().await;
    let relay = start_relay(&manager, &backend_addr).await;
    let (mut browser, server_side) = connect_pair(relay, &backend).await;

    // Act
    drop(server_side);

    // Assert
    assert!(browser_sees_end(&mut browser).await);

    manager.stop().await;
}

// ── Browser → backend ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_text_message_is_ignored_and_session_stays_alive() {
    // Arrange
    let manager = RelayManager::new();
    let (backend, backend_addr) = fake_backend().await;
    let relay = start_relay(&manager, &backend_addr).await;
    let (mut browser, mut server_side) = connect_pair(relay, &backend).await;

    // Act
    browser.send(Message::Text("hello".into())).await.unwrap();
    browser
        .send(Message::Binary(vec![0x02, 0xFE, 0x07].into()))
        .await
        .unwrap();

    // Assert: only the binary payload reaches the backend, verbatim
    let mut buf = [0u8; 3];
    tokio::time::timeout(WAIT, server_side.read_exact(&mut buf))
        .await
        .expect("timed out waiting for backend bytes")
        .unwrap();
    assert_eq!(buf, [0x02, 0xFE, 0x07]);

    manager.stop().await;
}

#[tokio::test]
async fn test_browser_disconnect_closes_backend_socket() {
    // Arrange
    let manager = RelayManager::new();
    let (backend, backend_addr) = fake_backend().await;
    let relay = start_relay(&manager, &backend_addr).await;
    let (mut browser, mut server_side) = connect_pair(relay, &backend).await;

    // Act
    browser.close(None).await.unwrap();

    // Assert: the backend reads EOF
    let mut buf = [0u8; 16];
    let n = tokio::time::timeout(WAIT, server_side.read(&mut buf))
        .await
        .expect("backend socket was never closed")
        .unwrap_or(0);
    assert_eq!(n, 0);

    manager.stop().await;
}

#[tokio::test]
async fn test_browser_close_frame_is_answered() {
    // Arrange
    let manager = RelayManager::new();
    let (backend, backend_addr) = fake_backend().await;
    let relay = start_relay(&manager, &backend_addr).await;
    let (mut browser, _server_side) = connect_pair(relay, &backend).await;

    // Act
    browser.send(Message::Close(None)).await.unwrap();

    // Assert: the relay completes the closing handshake
    let reply = tokio::time::timeout(WAIT, browser.next())
        .await
        .expect("timed out waiting for the close reply")
        .expect("stream ended");
    match reply {
        Ok(Message::Close(_)) => {}
        other => panic!("expected a Close frame, got {other:?}"),
    }

    manager.stop().await;
}

#[tokio::test]
async fn test_sessions_are_independent() {
    // Arrange: two browsers, two backend connections
    let manager = RelayManager::new();
    let (backend, backend_addr) = fake_backend().await;
    let relay = start_relay(&manager, &backend_addr).await;
    let (mut browser_a, mut backend_a) = connect_pair(relay, &backend).await;
    let (mut browser_b, mut backend_b) = connect_pair(relay, &backend).await;

    // Act
    backend_a.write_all(&[0x02, 0xFE, 0x0A]).await.unwrap();
    backend_b.write_all(&[0x02, 0xFE, 0x0B]).await.unwrap();

    // Assert
    assert_eq!(next_binary(&mut browser_a).await, vec![0x02, 0xFE, 0x0A]);
    assert_eq!(next_binary(&mut browser_b).await, vec![0x02, 0xFE, 0x0B]);

    // Act: ending one session leaves the other working
    drop(backend_a);
    assert!(browser_sees_end(&mut browser_a).await);
    backend_b.write_all(&[0x02, 0xFE, 0x0C]).await.unwrap();

    // Assert
    assert_eq!(next_binary(&mut browser_b).await, vec![0x02, 0xFE, 0x0C]);

    manager.stop().await;
}

// ── Setup failures ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unreachable_backend_closes_browser_and_listener_keeps_accepting() {
    // Arrange: a backend address nothing listens on
    let dead_addr = {
        let (listener, addr) = fake_backend().await;
        drop(listener);
        addr
    };
    let manager = RelayManager::new();
    let relay = start_relay(&manager, &dead_addr).await;

    // Act
    let (mut first, _) = tokio_tungstenite::connect_async(format!("ws://{relay}/"))
        .await
        .unwrap();

    // Assert
    assert!(browser_sees_end(&mut first).await);
    assert!(manager.status().running);
    let second = tokio_tungstenite::connect_async(format!("ws://{relay}/")).await;
    assert!(second.is_ok());

    manager.stop().await;
}

#[tokio::test]
async fn test_disallowed_origin_is_rejected_with_403() {
    // Arrange
    let (_backend, backend_addr) = fake_backend().await;
    let manager = RelayManager::new();
    let mut config = RelayConfig::new("127.0.0.1", 0, backend_addr);
    config.origin_policy = OriginPolicy::AllowList(vec!["https://play.example.org".to_string()]);
    let relay = manager.start(config).await.unwrap();

    let mut request = format!("ws://{relay}/").into_client_request().unwrap();
    request
        .headers_mut()
        .insert("Origin", "https://evil.example".parse().unwrap());

    // Act
    let result = tokio_tungstenite::connect_async(request).await;

    // Assert
    match result {
        Err(WsError::Http(response)) => assert_eq!(response.status(), 403),
        Err(other) => panic!("expected HTTP 403, got {other:?}"),
        Ok(_) => panic!("expected HTTP 403, got an open WebSocket"),
    }

    manager.stop().await;
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_stop_tears_down_in_flight_sessions() {
    // Arrange
    let manager = RelayManager::new();
    let (backend, backend_addr) = fake_backend().await;
    let relay = start_relay(&manager, &backend_addr).await;
    let (mut browser, mut server_side) = connect_pair(relay, &backend).await;

    // Act
    manager.stop().await;

    // Assert: both sides of the session are gone, and the port is closed
    let mut buf = [0u8; 16];
    let n = tokio::time::timeout(WAIT, server_side.read(&mut buf))
        .await
        .expect("backend socket was never closed")
        .unwrap_or(0);
    assert_eq!(n, 0);
    assert!(browser_sees_end(&mut browser).await);
    assert!(TcpStream::connect(relay).await.is_err());
}

#[tokio::test]
async fn test_restart_on_same_port_after_stop() {
    // Arrange
    let manager = RelayManager::new();
    let (backend, backend_addr) = fake_backend().await;
    let first = start_relay(&manager, &backend_addr).await;
    manager.stop().await;

    // Act
    let second = manager
        .start(RelayConfig::new("127.0.0.1", first.port(), backend_addr))
        .await
        .unwrap();
    let (mut browser, mut server_side) = connect_pair(second, &backend).await;
    server_side.write_all(&[0x02, 0xFE, 0x01]).await.unwrap();

    // Assert
    assert_eq!(second.port(), first.port());
    assert_eq!(next_binary(&mut browser).await, vec![0x02, 0xFE, 0x01]);

    manager.stop().await;
}
