#![doc = include_str!("../README.md")]
#![deny(
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::bare_urls,
    rustdoc::invalid_html_tags
)]
#![warn(
    trivial_casts,
    trivial_numeric_casts,
    unused_lifetimes,
    unused_import_braces,
    unreachable_pub,
    clippy::dbg_macro
)]

pub mod bits;
mod error;
mod framing;
mod packet;
pub mod packets;
mod registry;
pub mod strings;
mod types;
mod wire_enum;

pub use bits::{BitReader, BitWriter};
pub use error::CodecError;
pub use framing::{PacketFlags, PacketType};
pub use packet::{decode_packet, encode_packet, PacketFamily, PacketFrame, ProtocolPacket};
pub use registry::{ControlDecoder, CryptoDecoder, GameDecoder, ProtocolRegistry};
pub use types::Guid;
pub use wire_enum::{read_enum, write_enum, WireEnum};

/// Reads a value from a bit stream.
///
/// Implementations consume exactly the bits that [`Encode`] produces for
/// the same value and leave the reader positioned on the next field.
/// Failures are reported, never panicked, and carry the bit offset they
/// happened at.
///
/// ```
/// use planetside_protocol::packets::game::KeepAliveMessage;
/// use planetside_protocol::{BitReader, Decode};
///
/// let bytes = [0x34, 0x12];
/// let mut r = BitReader::new(&bytes);
/// let packet = KeepAliveMessage::decode(&mut r).unwrap();
/// assert_eq!(packet.code, 0x1234);
/// assert_eq!(r.remaining(), 0);
/// ```
pub trait Decode: Sized {
    /// Reads this value, advancing the reader past it.
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError>;
}

/// Writes a value to a bit stream.
///
/// This is the inverse of [`Decode`]: whatever `encode` appends must
/// decode back to an equal value, bit for bit. Reserved constants are
/// emitted verbatim; values wider than their field fail with
/// [`CodecError::ValueOutOfRange`] rather than truncating.
pub trait Encode {
    /// Appends this value to the writer.
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError>;
}
