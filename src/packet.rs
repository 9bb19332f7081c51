//! Whole frames: the flags preamble plus a family-tagged packet.

use std::fmt;

use crate::bits::BitWriter;
use crate::error::CodecError;
use crate::framing::{PacketFlags, PacketType};
use crate::packets::control::ControlPacket;
use crate::packets::crypto::CryptoPacket;
use crate::packets::game::GamePacket;
use crate::registry::ProtocolRegistry;
use crate::Encode;

/// The three disjoint opcode namespaces.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum PacketFamily {
    Game,
    Control,
    Crypto,
}

impl fmt::Display for PacketFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PacketFamily::Game => "game",
            PacketFamily::Control => "control",
            PacketFamily::Crypto => "crypto",
        })
    }
}

/// A decoded packet, tagged with its family.
#[derive(Clone, PartialEq, Debug)]
pub enum ProtocolPacket {
    Game(GamePacket),
    Control(ControlPacket),
    Crypto(CryptoPacket),
}

impl ProtocolPacket {
    pub fn family(&self) -> PacketFamily {
        match self {
            ProtocolPacket::Game(_) => PacketFamily::Game,
            ProtocolPacket::Control(_) => PacketFamily::Control,
            ProtocolPacket::Crypto(_) => PacketFamily::Crypto,
        }
    }
}

impl From<GamePacket> for ProtocolPacket {
    fn from(packet: GamePacket) -> Self {
        ProtocolPacket::Game(packet)
    }
}

impl From<ControlPacket> for ProtocolPacket {
    fn from(packet: ControlPacket) -> Self {
        ProtocolPacket::Control(packet)
    }
}

impl From<CryptoPacket> for ProtocolPacket {
    fn from(packet: CryptoPacket) -> Self {
        ProtocolPacket::Crypto(packet)
    }
}

/// One full frame as it crosses the wire.
#[derive(Clone, PartialEq, Debug)]
pub struct PacketFrame {
    pub flags: PacketFlags,
    pub packet: ProtocolPacket,
}

impl PacketFrame {
    /// Wraps a packet with the packet type it normally rides behind:
    /// crypto for crypto packets, normal for everything else.
    pub fn new(packet: impl Into<ProtocolPacket>, secured: bool) -> Self {
        let packet = packet.into();
        let packet_type = match packet.family() {
            PacketFamily::Crypto => PacketType::Crypto,
            _ => PacketType::Normal,
        };
        Self {
            flags: PacketFlags {
                packet_type,
                secured,
            },
            packet,
        }
    }
}

/// Encodes one frame, zero-padding the final partial byte.
///
/// The crypto family and the crypto packet type imply each other on the
/// wire, so a frame pairing them any other way fails before anything is
/// written.
pub fn encode_packet(frame: &PacketFrame) -> Result<Vec<u8>, CodecError> {
    let crypto_packet = frame.packet.family() == PacketFamily::Crypto;
    let crypto_type = frame.flags.packet_type == PacketType::Crypto;
    if crypto_packet != crypto_type {
        return Err(CodecError::invalid(
            "packet family does not match the packet type flag",
            0,
        ));
    }

    let mut w = BitWriter::new();
    frame.flags.encode(&mut w)?;
    match &frame.packet {
        ProtocolPacket::Game(packet) => packet.encode(&mut w)?,
        ProtocolPacket::Control(packet) => packet.encode(&mut w)?,
        ProtocolPacket::Crypto(packet) => packet.encode(&mut w)?,
    }
    Ok(w.into_bytes())
}

/// Decodes one frame against the standard packet catalogue.
///
/// See [`ProtocolRegistry::decode_packet`] for decoding against a custom
/// catalogue.
pub fn decode_packet(bytes: &[u8]) -> Result<PacketFrame, CodecError> {
    ProtocolRegistry::global().decode_packet(bytes)
}
