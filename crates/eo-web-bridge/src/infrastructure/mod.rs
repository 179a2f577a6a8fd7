//! Infrastructure layer for eo-web-bridge.
//!
//! The infrastructure layer handles all I/O: accepting WebSocket connections
//! from browsers, dialling the game server, and serving the control panel.
//!
//! # Responsibilities
//!
//! - Binding the relay listener and enforcing at-most-one active relay
//! - Performing the WebSocket HTTP upgrade handshake (with the origin policy)
//! - Opening one TCP connection to the game server per browser session
//! - Forwarding framed EO packets in both directions
//! - Serving the control-plane HTTP API and static assets
//! - Fetching and caching the upstream game-server directory
//!
//! # What does NOT belong here?
//!
//! - Start-request validation and status text (that is the application layer)
//! - Message type definitions (that is the domain layer)
//! - Packet framing rules (that is `eo-core`)

pub mod backend_conn;
pub mod control_api;
pub mod directory;
pub mod error;
pub mod relay_listener;
pub mod relay_manager;
pub mod session;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use control_api::{create_router, ControlState, SharedControlState};
pub use directory::{DirectoryError, DirectorySource, HttpDirectorySource, ServerDirectory};
pub use error::RelayError;
pub use relay_manager::RelayManager;
pub use session::{Direction, RelaySession, SessionEnd, SessionOutcome};
