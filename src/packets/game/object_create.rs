//! Detailed object creation.
//!
//! The outer packet names an object class, a GUID, and an optional
//! parent mount point, then carries a constructor payload whose layout
//! depends on the class. Every constructor declares an exact bit size;
//! the packet's declared payload length must equal it, which is what
//! lets the client delimit payloads for classes it streams past.
//!
//! Constructors are full of reserved fields the client expects verbatim.
//! Decode verifies each one and encode reproduces them bit for bit.

use crate::bits::{BitReader, BitWriter};
use crate::error::CodecError;
use crate::types::Guid;
use crate::{Decode, Encode};

/// Class ids with a detailed constructor.
pub mod object_class {
    pub const ACE: u16 = 32;
    pub const BOOMER_TRIGGER: u16 = 149;
    pub const REMOTE_ELECTRONICS_KIT: u16 = 728;
}

/// Where a created object is mounted: holder GUID plus slot index.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ObjectCreateParent {
    pub guid: Guid,
    pub slot: u8,
}

/// Creates one game object with full (owner-visible) state.
#[derive(Clone, PartialEq, Debug)]
pub struct ObjectCreateDetailedMessage {
    pub guid: Guid,
    pub parent: Option<ObjectCreateParent>,
    pub data: ConstructorData,
}

impl ObjectCreateDetailedMessage {
    /// The class id the payload will be delimited by on the wire.
    pub fn object_class(&self) -> u16 {
        self.data.object_class()
    }
}

impl Decode for ObjectCreateDetailedMessage {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        let length_offset = r.position();
        let declared = r.read_u32_le()?;

        let class_offset = r.position();
        let object_class = r.read_uint_le(11)? as u16;
        let guid = Guid::decode(r)?;

        let parent = if r.read_bool()? {
            Some(ObjectCreateParent {
                guid: Guid::decode(r)?,
                slot: r.read_u8()?,
            })
        } else {
            None
        };

        let expected = ConstructorData::bit_size_of(object_class).ok_or_else(|| {
            CodecError::invalid(
                format!("unsupported object class 0x{object_class:03x}"),
                class_offset,
            )
        })?;
        if declared != expected {
            return Err(CodecError::SizeMismatch {
                declared,
                actual: expected,
                offset: length_offset,
            });
        }

        let data_offset = r.position();
        let data = ConstructorData::decode(r, object_class, class_offset)?;
        let consumed = (r.position() - data_offset) as u32;
        if consumed != declared {
            return Err(CodecError::SizeMismatch {
                declared,
                actual: consumed,
                offset: data_offset,
            });
        }

        Ok(Self { guid, parent, data })
    }
}

impl Encode for ObjectCreateDetailedMessage {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u32_le(self.data.bit_size());
        w.write_uint_le(u32::from(self.data.object_class()), 11)?;
        self.guid.encode(w)?;

        match self.parent {
            Some(parent) => {
                w.write_bool(true);
                parent.guid.encode(w)?;
                w.write_u8(parent.slot);
            }
            None => w.write_bool(false),
        }

        let start = w.bit_len();
        self.data.encode(w)?;
        let written = (w.bit_len() - start) as u32;
        if written != self.data.bit_size() {
            return Err(CodecError::SizeMismatch {
                declared: self.data.bit_size(),
                actual: written,
                offset: start,
            });
        }
        Ok(())
    }
}

/// The class-dependent payload of an object-creation packet.
#[derive(Clone, PartialEq, Debug)]
pub enum ConstructorData {
    Ace(DetailedAceData),
    BoomerTrigger(DetailedBoomerTriggerData),
    Rek(DetailedRekData),
}

impl ConstructorData {
    pub fn object_class(&self) -> u16 {
        match self {
            ConstructorData::Ace(_) => object_class::ACE,
            ConstructorData::BoomerTrigger(_) => object_class::BOOMER_TRIGGER,
            ConstructorData::Rek(_) => object_class::REMOTE_ELECTRONICS_KIT,
        }
    }

    /// Exact payload width in bits.
    pub fn bit_size(&self) -> u32 {
        match self {
            ConstructorData::Ace(_) => DetailedAceData::BIT_SIZE,
            ConstructorData::BoomerTrigger(_) => DetailedBoomerTriggerData::BIT_SIZE,
            ConstructorData::Rek(_) => DetailedRekData::BIT_SIZE,
        }
    }

    /// Exact payload width for a class id, or `None` if the class has no
    /// detailed constructor.
    pub fn bit_size_of(object_class: u16) -> Option<u32> {
        match object_class {
            self::object_class::ACE => Some(DetailedAceData::BIT_SIZE),
            self::object_class::BOOMER_TRIGGER => Some(DetailedBoomerTriggerData::BIT_SIZE),
            self::object_class::REMOTE_ELECTRONICS_KIT => Some(DetailedRekData::BIT_SIZE),
            _ => None,
        }
    }

    fn decode(
        r: &mut BitReader<'_>,
        object_class: u16,
        class_offset: usize,
    ) -> Result<Self, CodecError> {
        match object_class {
            self::object_class::ACE => DetailedAceData::decode(r).map(ConstructorData::Ace),
            self::object_class::BOOMER_TRIGGER => {
                DetailedBoomerTriggerData::decode(r).map(ConstructorData::BoomerTrigger)
            }
            self::object_class::REMOTE_ELECTRONICS_KIT => {
                DetailedRekData::decode(r).map(ConstructorData::Rek)
            }
            _ => Err(CodecError::invalid(
                format!("unsupported object class 0x{object_class:03x}"),
                class_offset,
            )),
        }
    }
}

impl Encode for ConstructorData {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        match self {
            ConstructorData::Ace(data) => data.encode(w),
            ConstructorData::BoomerTrigger(data) => data.encode(w),
            ConstructorData::Rek(data) => data.encode(w),
        }
    }
}

/// A Remote Electronics Kit in someone's holster or inventory.
///
/// Layout: `unk1:4 | 8:4 | 0:20 | 2:4 | 0:16 | 8:4 | unk2:15`, every
/// field little-endian.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DetailedRekData {
    pub unk1: u8,
    pub unk2: u16,
}

impl DetailedRekData {
    pub const BIT_SIZE: u32 = 67;
}

impl Decode for DetailedRekData {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        let unk1 = r.read_uint_le(4)? as u8;
        r.expect_constant_le(4, 8)?;
        r.expect_constant_le(20, 0)?;
        r.expect_constant_le(4, 2)?;
        r.expect_constant_le(16, 0)?;
        r.expect_constant_le(4, 8)?;
        let unk2 = r.read_uint_le(15)? as u16;
        Ok(Self { unk1, unk2 })
    }
}

impl Encode for DetailedRekData {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_uint_le(u32::from(self.unk1), 4)?;
        w.write_uint_le(8, 4)?;
        w.write_uint_le(0, 20)?;
        w.write_uint_le(2, 4)?;
        w.write_uint_le(0, 16)?;
        w.write_uint_le(8, 4)?;
        w.write_uint_le(u32::from(self.unk2), 15)
    }
}

/// An Adaptive Construction Engine cartridge.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DetailedAceData {
    pub unk1: u8,
}

impl DetailedAceData {
    pub const BIT_SIZE: u32 = 52;
}

impl Decode for DetailedAceData {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        let unk1 = r.read_uint_le(4)? as u8;
        r.expect_constant_le(4, 8)?;
        r.expect_constant_le(20, 0)?;
        r.expect_constant_le(4, 2)?;
        r.expect_constant_le(16, 0)?;
        r.expect_constant_le(4, 8)?;
        Ok(Self { unk1 })
    }
}

impl Encode for DetailedAceData {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_uint_le(u32::from(self.unk1), 4)?;
        w.write_uint_le(8, 4)?;
        w.write_uint_le(0, 20)?;
        w.write_uint_le(2, 4)?;
        w.write_uint_le(0, 16)?;
        w.write_uint_le(8, 4)
    }
}

/// The detonator paired with a planted Boomer.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DetailedBoomerTriggerData {
    pub unk1: u8,
}

impl DetailedBoomerTriggerData {
    pub const BIT_SIZE: u32 = 40;
}

impl Decode for DetailedBoomerTriggerData {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        let unk1 = r.read_u8()?;
        r.expect_constant_le(16, 0)?;
        r.expect_constant_le(4, 8)?;
        r.expect_constant_le(12, 0)?;
        Ok(Self { unk1 })
    }
}

impl Encode for DetailedBoomerTriggerData {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u8(self.unk1);
        w.write_uint_le(0, 16)?;
        w.write_uint_le(8, 4)?;
        w.write_uint_le(0, 12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rek_message() -> ObjectCreateDetailedMessage {
        ObjectCreateDetailedMessage {
            guid: Guid(1024),
            parent: Some(ObjectCreateParent {
                guid: Guid(75),
                slot: 1,
            }),
            data: ConstructorData::Rek(DetailedRekData {
                unk1: 0xa,
                unk2: 0x1234,
            }),
        }
    }

    fn encoded(value: &impl Encode) -> Vec<u8> {
        let mut w = BitWriter::new();
        value.encode(&mut w).unwrap();
        w.into_bytes()
    }

    #[test]
    fn rek_payload_is_exactly_67_bits() {
        let mut w = BitWriter::new();
        DetailedRekData {
            unk1: 0xa,
            unk2: 0x1234,
        }
        .encode(&mut w)
        .unwrap();
        assert_eq!(w.bit_len(), DetailedRekData::BIT_SIZE as usize);

        let bytes = w.into_bytes();
        let mut r = BitReader::new(&bytes);
        let decoded = DetailedRekData::decode(&mut r).unwrap();
        assert_eq!(r.position(), 67);
        assert_eq!(
            decoded,
            DetailedRekData {
                unk1: 0xa,
                unk2: 0x1234
            }
        );
    }

    #[test]
    fn rek_payload_bit_layout() {
        let mut w = BitWriter::new();
        DetailedRekData {
            unk1: 0xa,
            unk2: 0x1234,
        }
        .encode(&mut w)
        .unwrap();
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_uint_le(4).unwrap(), 0xa);
        assert_eq!(r.read_uint_le(4).unwrap(), 8);
        assert_eq!(r.read_uint_le(20).unwrap(), 0);
        assert_eq!(r.read_uint_le(4).unwrap(), 2);
        assert_eq!(r.read_uint_le(16).unwrap(), 0);
        assert_eq!(r.read_uint_le(4).unwrap(), 8);
        assert_eq!(r.read_uint_le(15).unwrap(), 0x1234);
    }

    #[test]
    fn altered_constants_fail_decode() {
        let good = encoded(&DetailedRekData {
            unk1: 0xa,
            unk2: 0x1234,
        });

        // The second nibble is the first reserved field.
        for bit in 4..8 {
            let mut bytes = good.clone();
            bytes[bit / 8] ^= 1 << (7 - bit % 8);

            let mut r = BitReader::new(&bytes);
            assert!(
                matches!(
                    DetailedRekData::decode(&mut r),
                    Err(CodecError::ConstantMismatch { offset: 4, .. })
                ),
                "flipped bit {bit}"
            );
        }
    }

    #[test]
    fn message_round_trips_bit_exactly() {
        let msg = rek_message();
        let bytes = encoded(&msg);

        let mut r = BitReader::new(&bytes);
        let decoded = ObjectCreateDetailedMessage::decode(&mut r).unwrap();
        assert_eq!(decoded, msg);
        assert!(r.remaining() < 8);

        assert_eq!(encoded(&decoded), bytes);
    }

    #[test]
    fn unparented_message_round_trips() {
        let msg = ObjectCreateDetailedMessage {
            guid: Guid(2000),
            parent: None,
            data: ConstructorData::BoomerTrigger(DetailedBoomerTriggerData { unk1: 0 }),
        };
        let bytes = encoded(&msg);

        let mut r = BitReader::new(&bytes);
        assert_eq!(
            ObjectCreateDetailedMessage::decode(&mut r).unwrap(),
            msg
        );
    }

    #[test]
    fn declared_length_must_match_the_constructor() {
        let mut bytes = encoded(&rek_message());
        // The length word is first: claim one bit fewer.
        bytes[0] = 66;

        let mut r = BitReader::new(&bytes);
        assert_eq!(
            ObjectCreateDetailedMessage::decode(&mut r).unwrap_err(),
            CodecError::SizeMismatch {
                declared: 66,
                actual: 67,
                offset: 0
            }
        );
    }

    #[test]
    fn unknown_object_class_is_rejected() {
        let msg = ObjectCreateDetailedMessage {
            guid: Guid(7),
            parent: None,
            data: ConstructorData::Ace(DetailedAceData { unk1: 0 }),
        };
        let mut bytes = encoded(&msg);

        // Rewrite the 11-bit class field (bits 32..43) to an id without
        // a constructor: flip the low class bit (first of the field).
        bytes[4] ^= 0x80;

        let mut r = BitReader::new(&bytes);
        assert!(matches!(
            ObjectCreateDetailedMessage::decode(&mut r),
            Err(CodecError::InvalidFormat { offset: 32, .. })
        ));
    }
}
