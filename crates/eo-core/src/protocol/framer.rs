//! Packet framer for the Endless Online TCP stream.
//!
//! Wire format of one packet:
//! ```text
//! [length:2 (EO numeral)][body:length]
//! ```
//!
//! TCP delivers bytes, not packets: a single `read()` may return half a header
//! or three packets at once.  [`read_packet`] hides that by reading exactly one
//! packet per call and leaving the stream positioned at the next header.
//!
//! The header bytes are returned exactly as received.  The length is decoded
//! only to know how many body bytes to read; it is never re-encoded, because
//! several byte pairs decode to the same value (`[0x02, 0x00]` and
//! `[0x02, 0xFE]` are both 1, and `[0xFE, x]` is 0 for any `x`).

use std::fmt;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::protocol::number::{decode_number, PAD_BYTE, SHORT_MAX};

/// Size of the length prefix in bytes.
pub const PACKET_HEADER_LEN: usize = 2;

/// Largest body length a two-byte EO numeral can express.
pub const MAX_PACKET_BODY_LEN: usize = (SHORT_MAX - 1) as usize;

/// Which part of a packet was being read when the stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    /// The two-byte length prefix.
    Header,
    /// The body announced by the prefix.
    Body,
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameStage::Header => f.write_str("header"),
            FrameStage::Body => f.write_str("body"),
        }
    }
}

/// Errors produced while reading a packet from the backend stream.
#[derive(Debug, Error)]
pub enum FramingError {
    /// The stream reached EOF before the current stage was complete.
    #[error("stream closed mid-{stage}: expected {expected} bytes, got {received}")]
    ShortRead {
        stage: FrameStage,
        expected: usize,
        received: usize,
    },

    /// The length prefix contains a byte that is not a valid EO digit.
    #[error("malformed length prefix {header:02X?}")]
    MalformedLength { header: [u8; PACKET_HEADER_LEN] },

    /// Any other I/O failure from the underlying reader.
    #[error("I/O error while reading packet: {0}")]
    Io(#[from] std::io::Error),
}

impl FramingError {
    /// Returns `true` when the stream ended exactly on a packet boundary.
    ///
    /// This is how an orderly backend disconnect looks to the framer.
    pub fn is_clean_eof(&self) -> bool {
        matches!(
            self,
            FramingError::ShortRead {
                stage: FrameStage::Header,
                received: 0,
                ..
            }
        )
    }
}

/// Decodes the body length announced by a packet header.
///
/// # Errors
///
/// Returns [`FramingError::MalformedLength`] if a byte read as a digit is
/// `0xFF`, which would be digit 254 and is outside base 253.  Bytes after the
/// first `0xFE` are padding and are not checked.
///
/// # Examples
///
/// ```rust
/// use eo_core::protocol::framer::decode_length;
///
/// assert_eq!(decode_length([0x04, 0xFE]).unwrap(), 3);
/// assert!(decode_length([0xFF, 0x01]).is_err());
/// ```
pub fn decode_length(header: [u8; PACKET_HEADER_LEN]) -> Result<usize, FramingError> {
    let mut digits = header.iter().take_while(|&&byte| byte != PAD_BYTE);
    if digits.any(|&byte| byte == 0xFF) {
        return Err(FramingError::MalformedLength { header });
    }
    Ok(decode_number(&header) as usize)
}

/// Reads exactly one packet from `reader`.
///
/// Returns the two header bytes followed by the body, byte-for-byte as they
/// arrived.  Nothing beyond the packet is consumed.
///
/// # Errors
///
/// - [`FramingError::ShortRead`] if the stream closes mid-header (including
///   before the first byte) or mid-body.
/// - [`FramingError::MalformedLength`] if the header is not a valid numeral.
/// - [`FramingError::Io`] for any other read failure.
pub async fn read_packet<R>(reader: &mut R) -> Result<Vec<u8>, FramingError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; PACKET_HEADER_LEN];
    let received = read_until_full(reader, &mut header).await?;
    if received < PACKET_HEADER_LEN {
        return Err(FramingError::ShortRead {
            stage: FrameStage::Header,
            expected: PACKET_HEADER_LEN,
            received,
        });
    }

    let body_len = decode_length(header)?;

    let mut packet = vec![0u8; PACKET_HEADER_LEN + body_len];
    packet[..PACKET_HEADER_LEN].copy_from_slice(&header);

    let received = read_until_full(reader, &mut packet[PACKET_HEADER_LEN..]).await?;
    if received < body_len {
        return Err(FramingError::ShortRead {
            stage: FrameStage::Body,
            expected: body_len,
            received,
        });
    }

    trace!("framed packet: header={header:02X?} body_len={body_len}");
    Ok(packet)
}

/// Fills `buf` from `reader`, stopping early only at EOF.
///
/// Unlike `read_exact`, this reports how many bytes arrived before EOF so the
/// caller can build a precise [`FramingError::ShortRead`].
async fn read_until_full<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
