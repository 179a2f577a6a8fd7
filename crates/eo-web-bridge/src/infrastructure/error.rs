//! Error type for relay setup and lifecycle failures.
//!
//! Mid-session failures are not errors in this sense: they end one session
//! and are reported as a [`crate::infrastructure::session::SessionEnd`].

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

/// Failures of a relay start attempt or of one connection's setup.
///
/// None of these is retried.  Start failures abort only that start attempt;
/// connection failures abort only that connection while the listener keeps
/// accepting.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A start was requested while a relay is starting or running.
    #[error("relay already running")]
    AlreadyRunning,

    /// The relay listener could not bind its address (e.g. port in use).
    #[error("failed to bind relay listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A stop arrived while the listener was still binding.
    #[error("relay start aborted by a concurrent stop")]
    StartAborted,

    /// The browser's HTTP request could not be upgraded to a WebSocket
    /// (bad headers, not an upgrade request, or a rejected origin).
    #[error("WebSocket upgrade failed: {0}")]
    UpgradeFailed(#[source] WsError),

    /// The game server could not be reached for this connection.
    #[error("backend {addr} unreachable: {source}")]
    BackendUnreachable {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
