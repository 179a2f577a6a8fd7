//! # eo-core
//!
//! Shared protocol library for the EO WebSocket bridge.
//!
//! Endless Online (EO) clients and servers talk over raw TCP using
//! self-delimiting packets: a two-byte length prefix written in EO's own
//! base-253 numeral format, followed by the packet body.  Browsers cannot
//! open raw TCP sockets, so the bridge needs to cut the server's byte stream
//! back into individual packets before handing each one to a WebSocket.
//!
//! This crate is that cutting tool.  It has no knowledge of sockets, servers,
//! or WebSockets; it only needs something that implements `AsyncRead`.
//!
//! - **`protocol::number`** – the EO numeral codec (`decode_number`,
//!   `encode_number`).
//! - **`protocol::framer`** – reads exactly one packet per call from a byte
//!   stream and returns it unchanged.
//!
//! The packet body is treated as opaque bytes.  Nothing here inspects packet
//! families, actions, or encryption.

pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `eo_core::read_packet` instead of `eo_core::protocol::framer::read_packet`.
pub use protocol::framer::{decode_length, read_packet, FrameStage, FramingError};
pub use protocol::number::{decode_number, encode_number, NumberError};
