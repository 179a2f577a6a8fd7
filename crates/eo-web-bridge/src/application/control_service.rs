//! Control-plane translation logic.
//!
//! Pure functions that sit between the control panel's JSON and the relay
//! lifecycle manager:
//!
//! ```text
//! StartRequest (JSON)  → build_relay_config()  → RelayConfig
//! RelayStatus          → describe_status()     → StatusResponse (JSON)
//! directory body bytes → parse_directory()     → Vec<GameServerDescriptor>
//! ```
//!
//! No sockets, no locks, no runtime.  The HTTP handlers in the
//! infrastructure layer call these and do the I/O.

use thiserror::Error;

use crate::domain::{
    BridgeConfig, GameServerDescriptor, RelayConfig, RelayStatus, StartRequest, StatusResponse,
};

/// Status banner shown when no relay is active.
pub const STATUS_STOPPED: &str = "Bridge Stopped";

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors caused by bad input to the control plane.
///
/// These are user-correctable and reported back to the control panel; none of
/// them is fatal to the process.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    /// The requested relay port is outside `1..=65535`.
    #[error("invalid port {0}: must be between 1 and 65535")]
    InvalidPort(i64),

    /// The start request did not name a backend server.
    #[error("no game server specified")]
    MissingServer,

    /// The upstream directory answered with something that is not a list of
    /// server entries.
    #[error("invalid server directory response: {0}")]
    InvalidDirectory(String),
}

// ── Start ─────────────────────────────────────────────────────────────────────

/// Validates a start request and builds the relay configuration for it.
///
/// The bind interface, origin policy and dial timeout come from the process
/// configuration; the request only chooses the port and the backend.
///
/// # Errors
///
/// - [`ControlError::InvalidPort`] if `req.port` is not in `1..=65535`.
/// - [`ControlError::MissingServer`] if `req.server` is blank.
///
/// # Example
///
/// ```rust
/// use eo_web_bridge::application::build_relay_config;
/// use eo_web_bridge::domain::{BridgeConfig, StartRequest};
///
/// let req = StartRequest { port: 8080, server: "eo.example.org:8078".into() };
/// let relay = build_relay_config(&req, &BridgeConfig::default()).unwrap();
/// assert_eq!(relay.bind_addr(), "0.0.0.0:8080");
/// ```
pub fn build_relay_config(
    req: &StartRequest,
    config: &BridgeConfig,
) -> Result<RelayConfig, ControlError> {
    let port = u16::try_from(req.port)
        .ok()
        .filter(|p| *p != 0)
        .ok_or(ControlError::InvalidPort(req.port))?;

    let server = req.server.trim();
    if server.is_empty() {
        return Err(ControlError::MissingServer);
    }

    Ok(config.relay_config(port, server))
}

// ── Status ────────────────────────────────────────────────────────────────────

/// Renders a manager status snapshot for the control panel.
pub fn describe_status(status: &RelayStatus) -> StatusResponse {
    match (status.running, status.bound_addr) {
        (true, Some(addr)) => {
            let port = addr.port().to_string();
            StatusResponse {
                running: true,
                status: format!("Bridge Running - ws://localhost:{port}"),
                port,
            }
        }
        _ => StatusResponse {
            running: false,
            status: STATUS_STOPPED.to_string(),
            port: String::new(),
        },
    }
}

// ── Directory ─────────────────────────────────────────────────────────────────

/// Parses the upstream directory's JSON body.
///
/// # Errors
///
/// Returns [`ControlError::InvalidDirectory`] if the body is not a JSON array
/// of server entries.
pub fn parse_directory(body: &[u8]) -> Result<Vec<GameServerDescriptor>, ControlError> {
    serde_json::from_slice(body).map_err(|e| ControlError::InvalidDirectory(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
