//! Application layer for eo-web-bridge.
//!
//! The application layer knows *what* the control plane means (which start
//! requests are valid, how a status is described, what a directory response
//! looks like) but delegates *how* to the infrastructure layer.
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or listening for connections (that is infrastructure)
//! - Tokio task spawning or locking relay state (that is the lifecycle manager)
//! - Packet framing (that is `eo-core`)

pub mod control_service;

pub use control_service::{
    build_relay_config, describe_status, parse_directory, ControlError, STATUS_STOPPED,
};
