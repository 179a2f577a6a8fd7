//! Protocol module containing the EO numeral codec and the packet framer.

pub mod framer;
pub mod number;

pub use framer::{
    decode_length, read_packet, FrameStage, FramingError, MAX_PACKET_BODY_LEN, PACKET_HEADER_LEN,
};
pub use number::{decode_number, encode_number, NumberError};
