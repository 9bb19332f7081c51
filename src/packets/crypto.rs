//! Crypto-family packets: the key exchange that bootstraps a session.
//!
//! These arrive behind the crypto packet type in the flags header and
//! are never themselves encrypted. Key material is carried as opaque
//! length-prefixed blobs; the math happens a layer up. The scattered
//! one-byte constants are expected verbatim by the client.

use num_derive::FromPrimitive;

use crate::bits::{BitReader, BitWriter};
use crate::error::CodecError;
use crate::registry::ProtocolRegistry;
use crate::{Decode, Encode};

/// Crypto-family opcodes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, FromPrimitive)]
pub enum CryptoOpcode {
    ClientChallengeXchg = 0x01,
    ServerChallengeXchg = 0x02,
    ClientFinished = 0x03,
    ServerFinished = 0x04,
}

/// A decoded crypto-family packet.
#[derive(Clone, PartialEq, Debug)]
pub enum CryptoPacket {
    ClientChallengeXchg(ClientChallengeXchg),
    ServerChallengeXchg(ServerChallengeXchg),
    ClientFinished(ClientFinished),
    ServerFinished(ServerFinished),
}

impl CryptoPacket {
    pub fn opcode(&self) -> CryptoOpcode {
        match self {
            CryptoPacket::ClientChallengeXchg(_) => CryptoOpcode::ClientChallengeXchg,
            CryptoPacket::ServerChallengeXchg(_) => CryptoOpcode::ServerChallengeXchg,
            CryptoPacket::ClientFinished(_) => CryptoOpcode::ClientFinished,
            CryptoPacket::ServerFinished(_) => CryptoOpcode::ServerFinished,
        }
    }
}

impl Encode for CryptoPacket {
    /// Writes the opcode byte followed by the packet body.
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u8(self.opcode() as u8);
        match self {
            CryptoPacket::ClientChallengeXchg(p) => p.encode(w),
            CryptoPacket::ServerChallengeXchg(p) => p.encode(w),
            CryptoPacket::ClientFinished(p) => p.encode(w),
            CryptoPacket::ServerFinished(p) => p.encode(w),
        }
    }
}

/// Bytes in every challenge field.
pub const CHALLENGE_WIDTH: usize = 12;

fn read_blob(r: &mut BitReader<'_>) -> Result<Vec<u8>, CodecError> {
    let len = r.read_u16_le()?;
    r.read_bytes(usize::from(len))
}

fn write_blob(w: &mut BitWriter, bytes: &[u8]) -> Result<(), CodecError> {
    if bytes.len() > usize::from(u16::MAX) {
        return Err(CodecError::ValueOutOfRange {
            value: bytes.len() as u64,
            width: 16,
            offset: w.bit_len(),
        });
    }
    w.write_u16_le(bytes.len() as u16);
    w.write_bytes(bytes);
    Ok(())
}

/// Client's opening move: its challenge plus the Diffie-Hellman group.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ClientChallengeXchg {
    pub client_time: u32,
    pub challenge: [u8; CHALLENGE_WIDTH],
    pub p: Vec<u8>,
    pub g: Vec<u8>,
}

impl Decode for ClientChallengeXchg {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        r.expect_constant_le(8, 1)?;
        r.expect_constant_le(8, 2)?;
        let client_time = r.read_u32_le()?;
        let challenge = r.read_byte_array()?;
        r.expect_constant_le(8, 0)?;
        r.expect_constant_le(16, 1)?;
        Ok(Self {
            client_time,
            challenge,
            p: read_blob(r)?,
            g: read_blob(r)?,
        })
    }
}

impl Encode for ClientChallengeXchg {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u8(1);
        w.write_u8(2);
        w.write_u32_le(self.client_time);
        w.write_bytes(&self.challenge);
        w.write_u8(0);
        w.write_u16_le(1);
        write_blob(w, &self.p)?;
        write_blob(w, &self.g)
    }
}

/// Server's reply: its own challenge and Diffie-Hellman public key.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ServerChallengeXchg {
    pub server_time: u32,
    pub challenge: [u8; CHALLENGE_WIDTH],
    pub pub_key: Vec<u8>,
}

impl Decode for ServerChallengeXchg {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        r.expect_constant_le(8, 2)?;
        r.expect_constant_le(8, 1)?;
        let server_time = r.read_u32_le()?;
        let challenge = r.read_byte_array()?;
        r.expect_constant_le(8, 0)?;
        Ok(Self {
            server_time,
            challenge,
            pub_key: read_blob(r)?,
        })
    }
}

impl Encode for ServerChallengeXchg {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u8(2);
        w.write_u8(1);
        w.write_u32_le(self.server_time);
        w.write_bytes(&self.challenge);
        w.write_u8(0);
        write_blob(w, &self.pub_key)
    }
}

/// Client's public key and proof over both challenges.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ClientFinished {
    pub pub_key: Vec<u8>,
    pub challenge_result: Vec<u8>,
}

impl Decode for ClientFinished {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        r.expect_constant_le(8, 0x10)?;
        let pub_key = read_blob(r)?;
        r.expect_constant_le(8, 1)?;
        Ok(Self {
            pub_key,
            challenge_result: read_blob(r)?,
        })
    }
}

impl Encode for ClientFinished {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u8(0x10);
        write_blob(w, &self.pub_key)?;
        w.write_u8(1);
        write_blob(w, &self.challenge_result)
    }
}

/// Server's proof; after this the session switches to encrypted frames.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ServerFinished {
    pub challenge_result: Vec<u8>,
}

impl Decode for ServerFinished {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        r.expect_constant_le(8, 0x14)?;
        Ok(Self {
            challenge_result: read_blob(r)?,
        })
    }
}

impl Encode for ServerFinished {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u8(0x14);
        write_blob(w, &self.challenge_result)
    }
}

pub(crate) fn register_standard(registry: &mut ProtocolRegistry) {
    registry.register_crypto_opcode(CryptoOpcode::ClientChallengeXchg, |r| {
        ClientChallengeXchg::decode(r).map(CryptoPacket::ClientChallengeXchg)
    });
    registry.register_crypto_opcode(CryptoOpcode::ServerChallengeXchg, |r| {
        ServerChallengeXchg::decode(r).map(CryptoPacket::ServerChallengeXchg)
    });
    registry.register_crypto_opcode(CryptoOpcode::ClientFinished, |r| {
        ClientFinished::decode(r).map(CryptoPacket::ClientFinished)
    });
    registry.register_crypto_opcode(CryptoOpcode::ServerFinished, |r| {
        ServerFinished::decode(r).map(CryptoPacket::ServerFinished)
    });
}
