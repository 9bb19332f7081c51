//! World-list advertisement sent while the client sits at the server
//! selection screen.

use num_derive::FromPrimitive;

use crate::bits::{BitReader, BitWriter};
use crate::error::CodecError;
use crate::strings::{read_string, read_wide_string, write_string, write_wide_string};
use crate::wire_enum::{read_enum, wire_enum, write_enum};
use crate::{Decode, Encode};

#[derive(Copy, Clone, PartialEq, Eq, Debug, FromPrimitive)]
pub enum WorldStatus {
    Up = 1,
    Down = 2,
    Locked = 3,
    Full = 4,
}

wire_enum!(WorldStatus, width = 8, ids = 1..=4);

#[derive(Copy, Clone, PartialEq, Eq, Debug, FromPrimitive)]
pub enum ServerType {
    Development = 1,
    Beta = 2,
    Released = 3,
}

wire_enum!(ServerType, width = 8, ids = 1..=3);

#[derive(Clone, PartialEq, Debug)]
pub struct WorldInfo {
    pub name: String,
    pub status: WorldStatus,
    pub server_type: ServerType,
}

impl Decode for WorldInfo {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            name: read_string(r)?,
            status: read_enum(r)?,
            server_type: read_enum(r)?,
        })
    }
}

impl Encode for WorldInfo {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        write_string(w, &self.name)?;
        write_enum(w, self.status)?;
        write_enum(w, self.server_type)
    }
}

/// The welcome banner plus one record per advertised world.
#[derive(Clone, PartialEq, Debug)]
pub struct VnlWorldStatusMessage {
    pub welcome_message: String,
    pub worlds: Vec<WorldInfo>,
}

impl Decode for VnlWorldStatusMessage {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        let welcome_message = read_wide_string(r)?;

        let count = r.read_u8()?;
        let mut worlds = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            worlds.push(WorldInfo::decode(r)?);
        }

        Ok(Self {
            welcome_message,
            worlds,
        })
    }
}

impl Encode for VnlWorldStatusMessage {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        write_wide_string(w, &self.welcome_message)?;

        let count = self.worlds.len();
        if count > usize::from(u8::MAX) {
            return Err(CodecError::ValueOutOfRange {
                value: count as u64,
                width: 8,
                offset: w.bit_len(),
            });
        }
        w.write_u8(count as u8);
        for world in &self.worlds {
            world.encode(w)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_list_round_trips() {
        let msg = VnlWorldStatusMessage {
            welcome_message: "Welcome to PlanetSide! ".into(),
            worlds: vec![
                WorldInfo {
                    name: "gemini".into(),
                    status: WorldStatus::Up,
                    server_type: ServerType::Released,
                },
                WorldInfo {
                    name: "emerald".into(),
                    status: WorldStatus::Locked,
                    server_type: ServerType::Beta,
                },
            ],
        };

        let mut w = BitWriter::new();
        msg.encode(&mut w).unwrap();
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        assert_eq!(VnlWorldStatusMessage::decode(&mut r).unwrap(), msg);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn empty_world_list_round_trips() {
        let msg = VnlWorldStatusMessage {
            welcome_message: String::new(),
            worlds: vec![],
        };

        let mut w = BitWriter::new();
        msg.encode(&mut w).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes, [0x00, 0x00]);

        let mut r = BitReader::new(&bytes);
        assert_eq!(VnlWorldStatusMessage::decode(&mut r).unwrap(), msg);
    }

    #[test]
    fn truncated_world_record_fails_cleanly() {
        let msg = VnlWorldStatusMessage {
            welcome_message: String::new(),
            worlds: vec![WorldInfo {
                name: "gemini".into(),
                status: WorldStatus::Up,
                server_type: ServerType::Released,
            }],
        };

        let mut w = BitWriter::new();
        msg.encode(&mut w).unwrap();
        let mut bytes = w.into_bytes();
        bytes.truncate(bytes.len() - 1);

        let mut r = BitReader::new(&bytes);
        assert!(matches!(
            VnlWorldStatusMessage::decode(&mut r),
            Err(CodecError::EndOfStream { .. })
        ));
    }
}
