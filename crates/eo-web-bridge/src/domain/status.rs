//! Snapshot of the relay lifecycle state.

use std::net::SocketAddr;

/// What the lifecycle manager reports when asked for its status.
///
/// `bound_addr` is the address the listener actually bound, which differs
/// from the requested one when port `0` was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayStatus {
    pub running: bool,
    pub bound_addr: Option<SocketAddr>,
}

impl RelayStatus {
    /// The status of a manager with no active listener.
    pub fn stopped() -> Self {
        Self::default()
    }

    /// The status of a manager whose listener is bound to `addr`.
    pub fn running(addr: SocketAddr) -> Self {
        Self {
            running: true,
            bound_addr: Some(addr),
        }
    }
}
