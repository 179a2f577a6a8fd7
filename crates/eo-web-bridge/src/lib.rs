//! eo-web-bridge library crate.
//!
//! This crate provides a WebSocket-to-TCP relay that lets browser-based
//! Endless Online clients talk to ordinary EO game servers, plus the small
//! HTTP control panel used to start and stop it.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser (binary WebSocket frames, one EO packet each)
//!         ↕
//! [eo-web-bridge]
//!   ├── domain/           Pure types: configs, origin policy, JSON messages
//!   ├── application/      Control-plane validation and status text
//!   └── infrastructure/
//!         ├── relay_manager/   At-most-one relay listener (start/stop/status)
//!         ├── relay_listener/  Accept loop + WebSocket upgrade (tokio-tungstenite)
//!         ├── session/         Two forwarding loops per browser (eo-core framer)
//!         ├── backend_conn/    TCP dial to the game server
//!         ├── directory/       Upstream server list (reqwest)
//!         └── control_api/     HTTP API + static files (axum)
//!         ↕
//! EO game server (raw TCP)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies beyond `serde`.
//! - `application` depends on `domain` only.
//! - `infrastructure` depends on all other layers plus `tokio`, `tungstenite`,
//!   `axum` and `reqwest`.

/// Domain layer: pure types (no I/O).
pub mod domain;

/// Application layer: control-plane logic.
pub mod application;

/// Infrastructure layer: relay sockets, control API, directory fetch.
pub mod infrastructure;
