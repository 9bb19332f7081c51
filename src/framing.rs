//! The flags header leading every frame.

use num_derive::FromPrimitive;

use crate::bits::{BitReader, BitWriter};
use crate::error::CodecError;
use crate::wire_enum::{read_enum, wire_enum, write_enum};
use crate::{Decode, Encode};

/// The 4-bit packet-type field at the front of the flags header.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, FromPrimitive)]
pub enum PacketType {
    /// Round-trips; the client's intent for it is undocumented.
    ResetSequence = 1,
    /// Round-trips; the client's intent for it is undocumented.
    Unknown2 = 2,
    Crypto = 3,
    Normal = 4,
}

wire_enum!(PacketType, width = 4, ids = 1..=4);

/// The 8-bit preamble of every frame:
/// `[packet_type:4][0][secured][1][0]`.
///
/// The three literal bits are part of the codec. Decode rejects a frame
/// where any of them differs, and encode always emits them, so a frame
/// that decodes re-encodes to the same byte.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PacketFlags {
    pub packet_type: PacketType,
    /// Whether the payload went through the encryption layer upstream.
    /// Carried through; never interpreted here.
    pub secured: bool,
}

impl Decode for PacketFlags {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        let packet_type = read_enum(r)?;
        r.expect_constant_be(1, 0)?;
        let secured = r.read_bool()?;
        r.expect_constant_be(1, 1)?;
        r.expect_constant_be(1, 0)?;
        Ok(Self {
            packet_type,
            secured,
        })
    }
}

impl Encode for PacketFlags {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        write_enum(w, self.packet_type)?;
        w.write_bool(false);
        w.write_bool(self.secured);
        w.write_bool(true);
        w.write_bool(false);
        Ok(())
    }
}
