//! Endless Online numeral codec.
//!
//! EO does not put plain binary integers on the wire.  Every number is written
//! as little-endian base-253 digits, and each digit is stored as `digit + 1` so
//! that the byte values `0x00` and `0xFF` never appear in a well-formed
//! encoding.  Positions above the most significant digit are padded with
//! `0xFE`.
//!
//! ```text
//! value = d0 * 1  +  d1 * 253  +  d2 * 253²  +  d3 * 253³
//! byte  = d + 1          (0xFE when the position is unused)
//! ```
//!
//! For example the value `3` encodes as `[0x04, 0xFE]` in a two-byte field,
//! and `253` as `[0x01, 0x02]`.
//!
//! On decode, the first `0xFE` ends the number: it and every byte after it are
//! ignored.  A `0x00` byte is read as digit 0, the same as `0x01`.  The packet
//! framer uses this codec only to *measure* a packet; it never re-encodes a
//! length it has read.

use thiserror::Error;

/// Exclusive upper bound of a one-byte EO number (253).
pub const CHAR_MAX: u32 = 253;

/// Exclusive upper bound of a two-byte EO number (253²).
pub const SHORT_MAX: u32 = CHAR_MAX * CHAR_MAX;

/// Exclusive upper bound of a three-byte EO number (253³).
pub const THREE_MAX: u32 = SHORT_MAX * CHAR_MAX;

/// Exclusive upper bound of a four-byte EO number (253⁴).
pub const FOUR_MAX: u32 = THREE_MAX * CHAR_MAX;

/// Byte used to pad unused high-order positions.
pub const PAD_BYTE: u8 = 0xFE;

/// Positional weight of each digit, least significant first.
const DIGIT_WEIGHTS: [u32; 4] = [1, CHAR_MAX, SHORT_MAX, THREE_MAX];

/// Errors produced when encoding a value into the EO numeral format.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NumberError {
    /// The value does not fit in four EO digits.
    #[error("value {0} is out of range for a four-byte EO number (max {max})", max = FOUR_MAX - 1)]
    OutOfRange(u32),
}

/// Decodes an EO number from up to the first four bytes of `bytes`.
///
/// Shorter slices are decoded as narrower fields (a two-byte slice is an EO
/// "short").  Decoding stops at the first `0xFE`; bytes past the fourth are
/// ignored.
///
/// # Examples
///
/// ```rust
/// use eo_core::protocol::number::decode_number;
///
/// assert_eq!(decode_number(&[0x04, 0xFE]), 3);
/// assert_eq!(decode_number(&[0x01, 0x02]), 253);
/// assert_eq!(decode_number(&[0xFE, 0x02]), 0);
/// ```
pub fn decode_number(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(DIGIT_WEIGHTS.len())
        .take_while(|&&byte| byte != PAD_BYTE)
        .zip(DIGIT_WEIGHTS)
        .map(|(&byte, weight)| digit_of(byte) * weight)
        .sum()
}

/// Encodes `value` as a four-byte EO number.
///
/// Take the first N bytes of the result for an N-byte field; the value must
/// then be below the matching `*_MAX` constant for the truncation to be exact.
///
/// # Errors
///
/// Returns [`NumberError::OutOfRange`] if `value >= FOUR_MAX`.
///
/// # Examples
///
/// ```rust
/// use eo_core::protocol::number::encode_number;
///
/// assert_eq!(encode_number(3).unwrap(), [0x04, 0xFE, 0xFE, 0xFE]);
/// ```
pub fn encode_number(value: u32) -> Result<[u8; 4], NumberError> {
    if value >= FOUR_MAX {
        return Err(NumberError::OutOfRange(value));
    }

    let mut encoded = [PAD_BYTE; 4];
    let mut remaining = value;

    // Walk from the most significant position down.  A position stays padded
    // only while no higher digit has been written and its own digit is zero.
    let mut started = false;
    for position in (1..DIGIT_WEIGHTS.len()).rev() {
        let weight = DIGIT_WEIGHTS[position];
        if remaining >= weight || started {
            encoded[position] = (remaining / weight) as u8 + 1;
            remaining %= weight;
            started = true;
        }
    }
    encoded[0] = remaining as u8 + 1;

    Ok(encoded)
}

/// Maps a single non-pad wire byte to its base-253 digit.
fn digit_of(byte: u8) -> u32 {
    match byte {
        0x00 => 0,
        other => u32::from(other) - 1,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
