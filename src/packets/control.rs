//! Control-family packets: session handshake and maintenance traffic.
//!
//! A control packet rides behind a zero marker byte where a game opcode
//! would otherwise sit; its own opcode byte follows the marker.

use num_derive::FromPrimitive;

use crate::bits::{BitReader, BitWriter};
use crate::error::CodecError;
use crate::registry::ProtocolRegistry;
use crate::{Decode, Encode};

/// The byte that distinguishes a control packet from a game packet.
pub(crate) const MARKER: u8 = ControlOpcode::HandleGamePacket as u8;

/// Control-family opcodes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, FromPrimitive)]
pub enum ControlOpcode {
    /// Sentinel: the marker byte itself, never a packet of its own.
    HandleGamePacket = 0x00,
    ClientStart = 0x01,
    ServerStart = 0x02,
    MultiPacket = 0x03,
    ControlSync = 0x07,
    ControlSyncResp = 0x08,
    SlottedMetaPacket0 = 0x09,
    SlottedMetaPacket1 = 0x0a,
    SlottedMetaPacket2 = 0x0b,
    SlottedMetaPacket3 = 0x0c,
    SlottedMetaPacket4 = 0x0d,
    SlottedMetaPacket5 = 0x0e,
    SlottedMetaPacket6 = 0x0f,
    SlottedMetaPacket7 = 0x10,
    ConnectionClose = 0x1d,
}

/// A decoded control-family packet.
#[derive(Clone, PartialEq, Debug)]
pub enum ControlPacket {
    ClientStart(ClientStart),
    ServerStart(ServerStart),
    MultiPacket(MultiPacket),
    ControlSync(ControlSync),
    ControlSyncResp(ControlSyncResp),
    SlottedMetaPacket(SlottedMetaPacket),
    ConnectionClose,
}

const SLOTTED_OPCODES: [ControlOpcode; 8] = [
    ControlOpcode::SlottedMetaPacket0,
    ControlOpcode::SlottedMetaPacket1,
    ControlOpcode::SlottedMetaPacket2,
    ControlOpcode::SlottedMetaPacket3,
    ControlOpcode::SlottedMetaPacket4,
    ControlOpcode::SlottedMetaPacket5,
    ControlOpcode::SlottedMetaPacket6,
    ControlOpcode::SlottedMetaPacket7,
];

impl ControlPacket {
    /// The opcode this packet encodes behind. For a slotted meta packet
    /// the slot index selects it, so the slot must be 0..=7.
    pub fn opcode(&self) -> ControlOpcode {
        match self {
            ControlPacket::ClientStart(_) => ControlOpcode::ClientStart,
            ControlPacket::ServerStart(_) => ControlOpcode::ServerStart,
            ControlPacket::MultiPacket(_) => ControlOpcode::MultiPacket,
            ControlPacket::ControlSync(_) => ControlOpcode::ControlSync,
            ControlPacket::ControlSyncResp(_) => ControlOpcode::ControlSyncResp,
            ControlPacket::SlottedMetaPacket(p) => SLOTTED_OPCODES[usize::from(p.slot) & 7],
            ControlPacket::ConnectionClose => ControlOpcode::ConnectionClose,
        }
    }
}

impl Encode for ControlPacket {
    /// Writes the marker byte, the opcode byte, and the packet body.
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        if let ControlPacket::SlottedMetaPacket(p) = self {
            if p.slot > 7 {
                return Err(CodecError::ValueOutOfRange {
                    value: u64::from(p.slot),
                    width: 3,
                    offset: w.bit_len(),
                });
            }
        }

        w.write_u8(MARKER);
        w.write_u8(self.opcode() as u8);
        match self {
            ControlPacket::ClientStart(p) => p.encode(w),
            ControlPacket::ServerStart(p) => p.encode(w),
            ControlPacket::MultiPacket(p) => p.encode(w),
            ControlPacket::ControlSync(p) => p.encode(w),
            ControlPacket::ControlSyncResp(p) => p.encode(w),
            ControlPacket::SlottedMetaPacket(p) => p.encode(w),
            ControlPacket::ConnectionClose => Ok(()),
        }
    }
}

/// Opens a session; the nonce is echoed back in [`ServerStart`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ClientStart {
    pub client_nonce: u32,
}

impl Decode for ClientStart {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        r.expect_constant_le(32, 2)?;
        Ok(Self {
            client_nonce: r.read_u32_le()?,
        })
    }
}

impl Encode for ClientStart {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u32_le(2);
        w.write_u32_le(self.client_nonce);
        Ok(())
    }
}

const SERVER_START_TAIL: [u8; 10] = [0x00, 0x00, 0x00, 0x00, 0x01, 0xd3, 0x00, 0x00, 0x00, 0x02];

/// Accepts a session, echoing the client nonce.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ServerStart {
    pub client_nonce: u32,
    pub server_nonce: u32,
}

impl Decode for ServerStart {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        let client_nonce = r.read_u32_le()?;
        let server_nonce = r.read_u32_le()?;
        for byte in SERVER_START_TAIL {
            r.expect_constant_le(8, u32::from(byte))?;
        }
        Ok(Self {
            client_nonce,
            server_nonce,
        })
    }
}

impl Encode for ServerStart {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u32_le(self.client_nonce);
        w.write_u32_le(self.server_nonce);
        w.write_bytes(&SERVER_START_TAIL);
        Ok(())
    }
}

/// Several packets coalesced into one frame, each behind a one-byte
/// length.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct MultiPacket {
    pub packets: Vec<Vec<u8>>,
}

impl Decode for MultiPacket {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        let mut packets = Vec::new();
        while r.remaining() >= 8 {
            let len = r.read_u8()?;
            packets.push(r.read_bytes(usize::from(len))?);
        }
        Ok(Self { packets })
    }
}

impl Encode for MultiPacket {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        for packet in &self.packets {
            if packet.len() > usize::from(u8::MAX) {
                return Err(CodecError::ValueOutOfRange {
                    value: packet.len() as u64,
                    width: 8,
                    offset: w.bit_len(),
                });
            }
            w.write_u8(packet.len() as u8);
            w.write_bytes(packet);
        }
        Ok(())
    }
}

/// Periodic client clock report.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ControlSync {
    pub time_diff: u16,
    pub unk: u32,
    pub field1: u32,
    pub field2: u32,
    pub field3: u32,
    pub field4: u32,
}

impl Decode for ControlSync {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            time_diff: r.read_u16_le()?,
            unk: r.read_u32_le()?,
            field1: r.read_u32_le()?,
            field2: r.read_u32_le()?,
            field3: r.read_u32_le()?,
            field4: r.read_u32_le()?,
        })
    }
}

impl Encode for ControlSync {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u16_le(self.time_diff);
        w.write_u32_le(self.unk);
        w.write_u32_le(self.field1);
        w.write_u32_le(self.field2);
        w.write_u32_le(self.field3);
        w.write_u32_le(self.field4);
        Ok(())
    }
}

/// Server's answer to [`ControlSync`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ControlSyncResp {
    pub time_diff: u16,
    pub server_tick: u32,
    pub field1: u32,
    pub field2: u32,
}

impl Decode for ControlSyncResp {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            time_diff: r.read_u16_le()?,
            server_tick: r.read_u32_le()?,
            field1: r.read_u32_le()?,
            field2: r.read_u32_le()?,
        })
    }
}

impl Encode for ControlSyncResp {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u16_le(self.time_diff);
        w.write_u32_le(self.server_tick);
        w.write_u32_le(self.field1);
        w.write_u32_le(self.field2);
        Ok(())
    }
}

/// A reliability slot carrying an opaque inner payload. The slot index
/// comes from the opcode; the subslot counter is the one big-endian
/// field in the format.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SlottedMetaPacket {
    pub slot: u8,
    pub subslot: u16,
    pub rest: Vec<u8>,
}

impl SlottedMetaPacket {
    fn decode_with_slot(r: &mut BitReader<'_>, slot: u8) -> Result<Self, CodecError> {
        let subslot = r.read_u16_be()?;
        let rest = r.read_bytes(r.remaining() / 8)?;
        Ok(Self {
            slot,
            subslot,
            rest,
        })
    }
}

impl Encode for SlottedMetaPacket {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u16_be(self.subslot);
        w.write_bytes(&self.rest);
        Ok(())
    }
}

fn decode_slotted<const SLOT: u8>(r: &mut BitReader<'_>) -> Result<ControlPacket, CodecError> {
    SlottedMetaPacket::decode_with_slot(r, SLOT).map(ControlPacket::SlottedMetaPacket)
}

pub(crate) fn register_standard(registry: &mut ProtocolRegistry) {
    registry.register_control_opcode(ControlOpcode::ClientStart, |r| {
        ClientStart::decode(r).map(ControlPacket::ClientStart)
    });
    registry.register_control_opcode(ControlOpcode::ServerStart, |r| {
        ServerStart::decode(r).map(ControlPacket::ServerStart)
    });
    registry.register_control_opcode(ControlOpcode::MultiPacket, |r| {
        MultiPacket::decode(r).map(ControlPacket::MultiPacket)
    });
    registry.register_control_opcode(ControlOpcode::ControlSync, |r| {
        ControlSync::decode(r).map(ControlPacket::ControlSync)
    });
    registry.register_control_opcode(ControlOpcode::ControlSyncResp, |r| {
        ControlSyncResp::decode(r).map(ControlPacket::ControlSyncResp)
    });
    registry.register_control_opcode(ControlOpcode::SlottedMetaPacket0, decode_slotted::<0>);
    registry.register_control_opcode(ControlOpcode::SlottedMetaPacket1, decode_slotted::<1>);
    registry.register_control_opcode(ControlOpcode::SlottedMetaPacket2, decode_slotted::<2>);
    registry.register_control_opcode(ControlOpcode::SlottedMetaPacket3, decode_slotted::<3>);
    registry.register_control_opcode(ControlOpcode::SlottedMetaPacket4, decode_slotted::<4>);
    registry.register_control_opcode(ControlOpcode::SlottedMetaPacket5, decode_slotted::<5>);
    registry.register_control_opcode(ControlOpcode::SlottedMetaPacket6, decode_slotted::<6>);
    registry.register_control_opcode(ControlOpcode::SlottedMetaPacket7, decode_slotted::<7>);
    registry.register_control_opcode(ControlOpcode::ConnectionClose, |_| {
        Ok(ControlPacket::ConnectionClose)
    });
}
