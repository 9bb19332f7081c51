//! Opcode dispatch tables.
//!
//! Type-driven packet resolution is replaced by one explicit table per
//! family, populated once at startup. Registration order is
//! insignificant; registering the same opcode twice is a configuration
//! bug and panics.

use std::sync::OnceLock;

use crate::bits::BitReader;
use crate::error::CodecError;
use crate::framing::{PacketFlags, PacketType};
use crate::packet::{PacketFamily, PacketFrame, ProtocolPacket};
use crate::packets::control::{self, ControlOpcode, ControlPacket};
use crate::packets::crypto::{self, CryptoOpcode, CryptoPacket};
use crate::packets::game::{self, GameOpcode, GamePacket};
use crate::Decode;

/// Decodes a game-packet body; the stream starts right after the opcode.
pub type GameDecoder = fn(&mut BitReader<'_>) -> Result<GamePacket, CodecError>;
/// Decodes a control-packet body.
pub type ControlDecoder = fn(&mut BitReader<'_>) -> Result<ControlPacket, CodecError>;
/// Decodes a crypto-packet body.
pub type CryptoDecoder = fn(&mut BitReader<'_>) -> Result<CryptoPacket, CodecError>;

/// Decode dispatch for all three packet families.
///
/// A registry is immutable once populated and decoding only ever takes
/// `&self`, so one instance serves every session thread. Most callers
/// want [`ProtocolRegistry::global`]; build on [`ProtocolRegistry::new`]
/// or [`ProtocolRegistry::standard`] to serve a custom catalogue.
pub struct ProtocolRegistry {
    game: [Option<GameDecoder>; 256],
    control: [Option<ControlDecoder>; 256],
    crypto: [Option<CryptoDecoder>; 256],
}

impl ProtocolRegistry {
    /// An empty registry: every opcode is unknown.
    pub fn new() -> Self {
        Self {
            game: [None; 256],
            control: [None; 256],
            crypto: [None; 256],
        }
    }

    /// A registry holding the built-in packet catalogue.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        game::register_standard(&mut registry);
        control::register_standard(&mut registry);
        crypto::register_standard(&mut registry);
        registry
    }

    /// The shared standard registry backing
    /// [`decode_packet`](crate::decode_packet).
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<ProtocolRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::standard)
    }

    /// Registers a decoder for a game opcode.
    ///
    /// # Panics
    ///
    /// Panics if the opcode already has a decoder.
    pub fn register_game_opcode(&mut self, opcode: GameOpcode, decoder: GameDecoder) {
        let slot = &mut self.game[opcode as usize];
        assert!(slot.is_none(), "game opcode {opcode:?} registered twice");
        *slot = Some(decoder);
    }

    /// Registers a decoder for a control opcode.
    ///
    /// # Panics
    ///
    /// Panics if the opcode already has a decoder, or on the
    /// [`HandleGamePacket`](ControlOpcode::HandleGamePacket) sentinel,
    /// which is the family marker rather than a packet.
    pub fn register_control_opcode(&mut self, opcode: ControlOpcode, decoder: ControlDecoder) {
        assert!(
            opcode != ControlOpcode::HandleGamePacket,
            "the control marker is not a packet"
        );
        let slot = &mut self.control[opcode as usize];
        assert!(slot.is_none(), "control opcode {opcode:?} registered twice");
        *slot = Some(decoder);
    }

    /// Registers a decoder for a crypto opcode.
    ///
    /// # Panics
    ///
    /// Panics if the opcode already has a decoder.
    pub fn register_crypto_opcode(&mut self, opcode: CryptoOpcode, decoder: CryptoDecoder) {
        let slot = &mut self.crypto[opcode as usize];
        assert!(slot.is_none(), "crypto opcode {opcode:?} registered twice");
        *slot = Some(decoder);
    }

    /// Decodes one frame: the flags header, then family and opcode
    /// dispatch.
    ///
    /// The crypto packet type hands the remainder to the crypto family.
    /// Anything else peeks the next byte: the zero marker selects the
    /// control family, any other value the game family. Up to seven
    /// trailing padding bits are tolerated; a whole unread byte is an
    /// error.
    pub fn decode_packet(&self, bytes: &[u8]) -> Result<PacketFrame, CodecError> {
        let mut r = BitReader::new(bytes);
        let flags = PacketFlags::decode(&mut r)?;

        let packet = if flags.packet_type == PacketType::Crypto {
            ProtocolPacket::Crypto(self.decode_crypto(&mut r)?)
        } else if r.peek_u8()? == control::MARKER {
            ProtocolPacket::Control(self.decode_control(&mut r)?)
        } else {
            ProtocolPacket::Game(self.decode_game(&mut r)?)
        };

        if r.remaining() >= 8 {
            return Err(CodecError::invalid(
                format!("{} unread bits after the packet body", r.remaining()),
                r.position(),
            ));
        }

        Ok(PacketFrame { flags, packet })
    }

    fn decode_game(&self, r: &mut BitReader<'_>) -> Result<GamePacket, CodecError> {
        let offset = r.position();
        let opcode = r.read_u8()?;
        match self.game[usize::from(opcode)] {
            Some(decode) => decode(r),
            None => Err(CodecError::UnknownOpcode {
                family: PacketFamily::Game,
                opcode,
                offset,
            }),
        }
    }

    fn decode_control(&self, r: &mut BitReader<'_>) -> Result<ControlPacket, CodecError> {
        r.expect_constant_le(8, u32::from(control::MARKER))?;
        let offset = r.position();
        let opcode = r.read_u8()?;
        match self.control[usize::from(opcode)] {
            Some(decode) => decode(r),
            None => Err(CodecError::UnknownOpcode {
                family: PacketFamily::Control,
                opcode,
                offset,
            }),
        }
    }

    fn decode_crypto(&self, r: &mut BitReader<'_>) -> Result<CryptoPacket, CodecError> {
        let offset = r.position();
        let opcode = r.read_u8()?;
        match self.crypto[usize::from(opcode)] {
            Some(decode) => decode(r),
            None => Err(CodecError::UnknownOpcode {
                family: PacketFamily::Crypto,
                opcode,
                offset,
            }),
        }
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{decode_packet, encode_packet};
    use crate::packets::crypto::ServerFinished;
    use crate::packets::game::{ChatMessageType, ChatMsg, KeepAliveMessage};

    fn frame_round_trip(frame: PacketFrame) -> Vec<u8> {
        let bytes = encode_packet(&frame).unwrap();
        assert_eq!(decode_packet(&bytes).unwrap(), frame);
        assert_eq!(encode_packet(&decode_packet(&bytes).unwrap()).unwrap(), bytes);
        bytes
    }

    #[test]
    fn game_frame_round_trips() {
        let bytes = frame_round_trip(PacketFrame::new(
            GamePacket::KeepAlive(KeepAliveMessage { code: 0x1234 }),
            false,
        ));
        assert_eq!(bytes, [0x42, 0xba, 0x34, 0x12]);
    }

    #[test]
    fn control_frame_round_trips() {
        let bytes = frame_round_trip(PacketFrame::new(
            ControlPacket::ControlSyncResp(crate::packets::control::ControlSyncResp {
                time_diff: 2,
                server_tick: 3,
                field1: 4,
                field2: 5,
            }),
            false,
        ));
        assert_eq!(bytes[1], 0x00);
        assert_eq!(bytes[2], ControlOpcode::ControlSyncResp as u8);
    }

    #[test]
    fn crypto_frame_round_trips() {
        let bytes = frame_round_trip(PacketFrame::new(
            CryptoPacket::ServerFinished(ServerFinished {
                challenge_result: vec![0x11; 12],
            }),
            false,
        ));
        // Crypto, unsecured.
        assert_eq!(bytes[0], 0x32);
        assert_eq!(bytes[1], CryptoOpcode::ServerFinished as u8);
    }

    #[test]
    fn secured_flag_is_carried_through() {
        let frame = PacketFrame::new(
            GamePacket::Chat(ChatMsg {
                channel: ChatMessageType::Say,
                wide_contents: true,
                recipient: String::new(),
                contents: "ping".into(),
            }),
            true,
        );
        let bytes = encode_packet(&frame).unwrap();
        assert_eq!(bytes[0], 0x46);
        assert!(decode_packet(&bytes).unwrap().flags.secured);
    }

    #[test]
    fn reset_sequence_and_unknown2_round_trip() {
        for packet_type in [PacketType::ResetSequence, PacketType::Unknown2] {
            let frame = PacketFrame {
                flags: PacketFlags {
                    packet_type,
                    secured: false,
                },
                packet: ProtocolPacket::Game(GamePacket::KeepAlive(KeepAliveMessage {
                    code: 7,
                })),
            };
            frame_round_trip(frame);
        }
    }

    #[test]
    fn unknown_game_opcode_reports_offset_8() {
        let err = decode_packet(&[0x42, 0xff]).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownOpcode {
                family: PacketFamily::Game,
                opcode: 0xff,
                offset: 8,
            }
        );
        assert_eq!(err.to_string(), "unknown game opcode 0xff at offset 8");
    }

    #[test]
    fn unknown_control_opcode_reports_offset_16() {
        let err = decode_packet(&[0x42, 0x00, 0x7f]).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownOpcode {
                family: PacketFamily::Control,
                opcode: 0x7f,
                offset: 16,
            }
        );
    }

    #[test]
    fn unknown_crypto_opcode_is_its_own_namespace() {
        // 0xba is a registered game opcode but no crypto opcode.
        let err = decode_packet(&[0x32, 0xba]).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownOpcode {
                family: PacketFamily::Crypto,
                opcode: 0xba,
                offset: 8,
            }
        );
    }

    #[test]
    fn empty_registry_knows_nothing() {
        let registry = ProtocolRegistry::new();
        let err = registry.decode_packet(&[0x42, 0xba, 0x34, 0x12]).unwrap_err();
        assert!(matches!(err, CodecError::UnknownOpcode { .. }));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let err = decode_packet(&[0x42, 0xba, 0x34, 0x12, 0x00]).unwrap_err();
        assert!(matches!(err, CodecError::InvalidFormat { offset: 32, .. }));
    }

    #[test]
    fn truncated_frame_fails_cleanly() {
        assert!(matches!(
            decode_packet(&[0x42]).unwrap_err(),
            CodecError::EndOfStream { .. }
        ));
    }

    #[test]
    fn mismatched_family_and_packet_type_fail_encode() {
        let mut frame = PacketFrame::new(
            GamePacket::KeepAlive(KeepAliveMessage { code: 1 }),
            false,
        );
        frame.flags.packet_type = PacketType::Crypto;
        assert!(matches!(
            encode_packet(&frame).unwrap_err(),
            CodecError::InvalidFormat { .. }
        ));

        let mut frame = PacketFrame::new(
            CryptoPacket::ServerFinished(ServerFinished {
                challenge_result: vec![],
            }),
            false,
        );
        frame.flags.packet_type = PacketType::Normal;
        assert!(matches!(
            encode_packet(&frame).unwrap_err(),
            CodecError::InvalidFormat { .. }
        ));
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_panics() {
        let mut registry = ProtocolRegistry::standard();
        registry.register_game_opcode(GameOpcode::KeepAliveMessage, |r| {
            KeepAliveMessage::decode(r).map(GamePacket::KeepAlive)
        });
    }

    #[test]
    #[should_panic(expected = "not a packet")]
    fn registering_the_control_marker_panics() {
        let mut registry = ProtocolRegistry::new();
        registry.register_control_opcode(ControlOpcode::HandleGamePacket, |_| {
            Ok(ControlPacket::ConnectionClose)
        });
    }
}
