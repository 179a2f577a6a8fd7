//! Relay listener: accept loop and per-connection setup.
//!
//! This module is responsible for:
//!
//! 1. Accepting incoming TCP connections from browsers on a bound listener.
//! 2. Upgrading each connection to a WebSocket, applying the origin policy.
//! 3. Dialling the game server, once per accepted connection.
//! 4. Handing both sockets to a [`RelaySession`] and running it.
//! 5. Stopping when the lifecycle manager signals shutdown.
//!
//! Each connection runs in its own Tokio task.  The accept loop never waits
//! on a session: it spawns and goes straight back to `accept()`.  A failed
//! upgrade or dial is logged and affects only that connection.
//!
//! # Shutdown
//!
//! Shutdown is forcible.  The session tasks live in a `JoinSet` owned by the
//! accept loop; when the loop exits the set is shut down, which aborts every
//! in-flight session and drops its sockets.  There is no graceful drain.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::SinkExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        http::StatusCode,
    },
};
use tracing::{debug, error, info, warn};

use crate::domain::{OriginPolicy, RelayConfig};
use crate::infrastructure::backend_conn::BackendConnection;
use crate::infrastructure::error::RelayError;
use crate::infrastructure::session::RelaySession;

// ── Accept loop ───────────────────────────────────────────────────────────────

/// Runs the accept loop on an already-bound `listener` until `shutdown`
/// fires or its sender is dropped.
///
/// Binding happens in the lifecycle manager so bind errors reach the caller
/// of `start` synchronously.
pub async fn run_listener(
    listener: TcpListener,
    config: Arc<RelayConfig>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut sessions = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("relay listener shutting down");
                break;
            }

            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    debug!("new browser connection from {peer_addr}");
                    let cfg = Arc::clone(&config);
                    sessions.spawn(handle_browser_connection(stream, peer_addr, cfg));
                }
                Err(e) => {
                    // Transient accept error (e.g. out of file descriptors).
                    // Keep the listener alive.
                    error!("accept error: {e}");
                }
            },

            // Reap finished sessions so the set does not grow without bound.
            Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        error!("relay session task panicked: {e}");
                    }
                }
            }
        }
    }

    let in_flight = sessions.len();
    if in_flight > 0 {
        info!("closing {in_flight} in-flight relay session(s)");
    }
    sessions.shutdown().await;
}

// ── Per-connection handling ───────────────────────────────────────────────────

/// Top-level task body for one accepted browser connection.
///
/// Wraps [`accept_and_upgrade`] and [`RelaySession::run`] and logs the outcome.
async fn handle_browser_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<RelayConfig>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("{peer_addr}: failed to set TCP_NODELAY: {e}");
    }

    let session = match accept_and_upgrade(stream, peer_addr, &config).await {
        Ok(session) => session,
        Err(e) => {
            warn!("connection {peer_addr} aborted: {e}");
            return;
        }
    };

    let session_id = session.id();
    info!(
        "session {session_id}: bridging {} ↔ {}",
        session.peer_addr(),
        config.backend_address
    );

    let outcome = session.run().await;
    info!(
        "session {session_id} closed ({} ended first): {}",
        outcome.ended_by, outcome.reason
    );
}

/// Upgrades `stream` to a WebSocket and dials the backend for it.
///
/// The upgrade accepts any origin unless `config.origin_policy` says
/// otherwise.  If the backend dial fails, the already-upgraded WebSocket is
/// closed before returning, so no socket ever reaches a forwarding loop.
///
/// # Errors
///
/// - [`RelayError::UpgradeFailed`] if the handshake fails or the origin is
///   rejected.
/// - [`RelayError::BackendUnreachable`] if the backend dial fails or times out.
pub async fn accept_and_upgrade<S>(
    stream: S,
    peer_addr: SocketAddr,
    config: &RelayConfig,
) -> Result<RelaySession<S>, RelayError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let policy = &config.origin_policy;
    let mut browser = accept_hdr_async(stream, |req: &Request, resp: Response| {
        check_origin(policy, req, resp)
    })
    .await
    .map_err(RelayError::UpgradeFailed)?;

    debug!("{peer_addr}: WebSocket upgrade complete");

    let backend = match BackendConnection::connect(
        &config.backend_address,
        config.backend_connect_timeout,
    )
    .await
    {
        Ok(backend) => backend,
        Err(e) => {
            // Best effort: the browser may already be gone.
            let _ = browser.close(None).await;
            return Err(e);
        }
    };

    Ok(RelaySession::new(peer_addr, browser, backend))
}

/// Handshake callback enforcing the origin policy.
fn check_origin(
    policy: &OriginPolicy,
    req: &Request,
    resp: Response,
) -> Result<Response, ErrorResponse> {
    let origin = req
        .headers()
        .get("origin")
        .and_then(|value| value.to_str().ok());

    if policy.allows(origin) {
        return Ok(resp);
    }

    warn!("rejecting WebSocket upgrade from origin {origin:?}");
    let mut rejection = ErrorResponse::new(Some("origin not allowed".to_string()));
    *rejection.status_mut() = StatusCode::FORBIDDEN;
    Err(rejection)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
