//! Relay session: one browser WebSocket bridged to one game-server socket.
//!
//! A session runs two forwarding loops concurrently, each in its own Tokio
//! task and each owning one half of each socket:
//!
//! ```text
//!            ┌──────────── browser_to_backend ────────────┐
//! browser ── ws_rx ──► binary payload, verbatim ──► backend write_half
//! browser ◄── ws_tx ◄── one packet per message ◄── backend read_half
//!            └──────────── backend_to_browser ────────────┘
//! ```
//!
//! Each loop holds at most one message in flight, so a slow peer stalls only
//! its own direction.
//!
//! # Teardown
//!
//! The session is over as soon as either loop returns.  The surviving task is
//! then aborted, which drops the socket halves it owns and closes both
//! sockets, and it is awaited before [`RelaySession::run`] returns.  When
//! `run` returns, neither loop is alive and no socket of this session remains
//! open.  If `run` is itself cancelled, both loops are aborted with it.
//! Nothing is retried and a broken packet stream is never resynced.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use eo_core::{read_packet, FramingError};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::task::{AbortHandle, JoinError};
use tokio_tungstenite::{
    tungstenite::{Error as WsError, Message as WsMessage},
    WebSocketStream,
};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::infrastructure::backend_conn::BackendConnection;

// ── Outcome types ─────────────────────────────────────────────────────────────

/// A forwarding direction within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    BrowserToBackend,
    BackendToBrowser,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::BrowserToBackend => f.write_str("browser→backend"),
            Direction::BackendToBrowser => f.write_str("backend→browser"),
        }
    }
}

/// Why a forwarding loop stopped.
#[derive(Debug, Error)]
pub enum SessionEnd {
    /// The browser sent a Close frame or its stream ended.
    #[error("browser closed the connection")]
    BrowserClosed,

    /// Reading from the browser failed (reset, malformed frame, ...).
    #[error("browser read failed: {0}")]
    BrowserReadFailed(#[source] WsError),

    /// Writing a browser payload to the game server failed.
    #[error("backend write failed: {0}")]
    BackendWriteFailed(#[source] std::io::Error),

    /// The game server closed its socket on a packet boundary.
    #[error("backend closed the connection")]
    BackendClosed,

    /// The backend stream broke mid-packet or carried a malformed header.
    #[error("backend framing failed: {0}")]
    Framing(#[source] FramingError),

    /// Sending a packet to the browser failed.
    #[error("browser send failed: {0}")]
    BrowserSendFailed(#[source] WsError),

    /// The forwarding task panicked or was cancelled from outside.
    #[error("forwarding task failed: {0}")]
    TaskFailed(String),
}

/// The single "session ended" signal both directions funnel into.
#[derive(Debug)]
pub struct SessionOutcome {
    pub session_id: Uuid,
    /// The loop that finished first.
    pub ended_by: Direction,
    pub reason: SessionEnd,
}

// ── Session ───────────────────────────────────────────────────────────────────

/// One bridged browser↔backend conversation.
///
/// Owns both sockets exclusively; nothing else can reach them once the
/// session is built.
pub struct RelaySession<S> {
    id: Uuid,
    peer_addr: SocketAddr,
    browser: WebSocketStream<S>,
    backend: BackendConnection,
}

impl<S> RelaySession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Pairs an upgraded browser socket with a dialled backend connection.
    pub fn new(
        peer_addr: SocketAddr,
        browser: WebSocketStream<S>,
        backend: BackendConnection,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer_addr,
            browser,
            backend,
        }
    }

    /// Unique identifier used in log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Address of the browser end.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Runs both forwarding loops until one ends, then tears the other down
    /// and waits for it to exit.
    pub async fn run(self) -> SessionOutcome {
        let Self {
            id,
            peer_addr,
            browser,
            backend,
        } = self;

        debug!("session {id} ({peer_addr}): forwarding started");

        let (ws_tx, ws_rx) = browser.split();
        let BackendConnection {
            read_half,
            write_half,
        } = backend;

        let mut upstream = tokio::spawn(browser_to_backend(ws_rx, write_half, id));
        let mut downstream = tokio::spawn(backend_to_browser(read_half, ws_tx, id));
        // If `run` itself is cancelled (listener shutdown aborts its task),
        // the loops must not outlive it.
        let _guard = AbortOnDrop([upstream.abort_handle(), downstream.abort_handle()]);

        let (ended_by, first, survivor) = tokio::select! {
            res = &mut upstream => (Direction::BrowserToBackend, res, downstream),
            res = &mut downstream => (Direction::BackendToBrowser, res, upstream),
        };

        // Aborting drops the survivor's socket halves, closing both sockets
        // even while it is parked on a read.  Await it so the loop has
        // observably exited before the session is declared over.
        survivor.abort();
        match survivor.await {
            Ok(reason) => debug!("session {id}: other direction also ended: {reason}"),
            Err(e) if e.is_cancelled() => trace!("session {id}: other direction cancelled"),
            Err(e) => debug!("session {id}: other direction failed: {e}"),
        }

        SessionOutcome {
            session_id: id,
            ended_by,
            reason: flatten(first),
        }
    }
}

/// Aborts both forwarding tasks when dropped.
struct AbortOnDrop([AbortHandle; 2]);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

fn flatten(result: Result<SessionEnd, JoinError>) -> SessionEnd {
    result.unwrap_or_else(|e| SessionEnd::TaskFailed(e.to_string()))
}

// ── Forwarding loops ──────────────────────────────────────────────────────────

/// Browser → backend: forwards every binary message payload verbatim.
///
/// Text, ping, pong and raw frames are ignored without ending the session.
/// One WebSocket message produces exactly one `write_all`, so payloads are
/// never split or coalesced by the relay.
pub async fn browser_to_backend<St, W>(
    mut ws_rx: St,
    mut backend: W,
    session_id: Uuid,
) -> SessionEnd
where
    St: Stream<Item = Result<WsMessage, WsError>> + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let msg = match ws_rx.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                return SessionEnd::BrowserClosed;
            }
            Some(Err(e)) => return SessionEnd::BrowserReadFailed(e),
        };

        match msg {
            WsMessage::Binary(payload) => {
                if let Err(e) = backend.write_all(&payload).await {
                    return SessionEnd::BackendWriteFailed(e);
                }
                trace!(
                    "session {session_id}: browser → backend {} bytes",
                    payload.len()
                );
            }
            WsMessage::Text(_) => {
                debug!("session {session_id}: text message from browser (ignored)");
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
            WsMessage::Close(_) => {
                finish_close_handshake(&mut ws_rx, session_id).await;
                return SessionEnd::BrowserClosed;
            }
        }
    }
}

/// Upper bound on waiting for the close reply to go out.
const CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Keeps reading after the browser's Close frame until the stream ends.
///
/// tungstenite queues the Close reply when it reads the browser's Close and
/// only writes it on the next read, so the stream must be polled again
/// before the socket is dropped.  Frames that still arrive are discarded.
async fn finish_close_handshake<St>(ws_rx: &mut St, session_id: Uuid)
where
    St: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    let drain = async {
        while let Some(Ok(_)) = ws_rx.next().await {}
    };
    if tokio::time::timeout(CLOSE_HANDSHAKE_TIMEOUT, drain)
        .await
        .is_err()
    {
        debug!("session {session_id}: browser kept sending after its close frame");
    }
}

/// Backend → browser: frames the game server's stream and sends each packet
/// as one binary WebSocket message, header included.
pub async fn backend_to_browser<R, Si>(
    mut backend: R,
    mut ws_tx: Si,
    session_id: Uuid,
) -> SessionEnd
where
    R: AsyncRead + Unpin,
    Si: Sink<WsMessage, Error = WsError> + Unpin,
{
    loop {
        let packet = match read_packet(&mut backend).await {
            Ok(packet) => packet,
            Err(e) if e.is_clean_eof() => return SessionEnd::BackendClosed,
            Err(e) => return SessionEnd::Framing(e),
        };

        let len = packet.len();
        if let Err(e) = ws_tx.send(WsMessage::Binary(packet)).await {
            return SessionEnd::BrowserSendFailed(e);
        }
        trace!("session {session_id}: backend → browser {len} bytes");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
