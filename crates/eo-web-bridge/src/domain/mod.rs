//! Domain layer for eo-web-bridge.
//!
//! Pure types with no dependencies on I/O, networking, or async runtimes.
//!
//! # What belongs in the domain layer?
//!
//! - Configuration structures (process-wide and per relay)
//! - The origin policy applied at WebSocket handshake time
//! - Control-plane JSON message types and directory entries
//! - The relay status snapshot
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or `WebSocket` types
//! - File I/O or environment variable reading

pub mod config;
pub mod messages;
pub mod status;

pub use config::{BridgeConfig, OriginPolicy, RelayConfig};
pub use messages::{
    GameServerDescriptor, RefreshResponse, StartRequest, StartResponse, StatusResponse,
    StopResponse,
};
pub use status::RelayStatus;
