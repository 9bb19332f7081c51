//! The login exchange: version handshake, credentials, and the
//! world-selection handoff.

use num_derive::FromPrimitive;

use crate::bits::{BitReader, BitWriter};
use crate::error::CodecError;
use crate::strings::{
    read_padded_string, read_string, read_string_aligned, write_padded_string, write_string,
    write_string_aligned,
};
use crate::wire_enum::{read_enum, wire_enum, write_enum};
use crate::{Decode, Encode};

/// Byte width of the NUL-padded session token fields.
pub const TOKEN_WIDTH: usize = 32;

/// First packet the client sends after the crypto exchange.
#[derive(Clone, PartialEq, Debug)]
pub struct LoginMessage {
    pub major_version: u32,
    pub minor_version: u32,
    pub revision: u32,
    pub build_date: String,
    pub credentials: LoginCredentials,
}

/// Either a fresh username/password pair or a session token from a
/// previous login.
///
/// Both forms start one bit past a byte boundary (the form tag), so the
/// first string after the tag re-aligns with seven pad bits.
#[derive(Clone, PartialEq, Debug)]
pub enum LoginCredentials {
    Password { username: String, password: String },
    Token { token: String, username: String },
}

impl Decode for LoginMessage {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        let major_version = r.read_u32_le()?;
        let minor_version = r.read_u32_le()?;
        let revision = r.read_u32_le()?;
        let build_date = read_string(r)?;

        let credentials = if r.read_bool()? {
            let token = read_padded_string(r, TOKEN_WIDTH)?;
            let username = read_string_aligned(r, 7)?;
            LoginCredentials::Token { token, username }
        } else {
            let username = read_string_aligned(r, 7)?;
            let password = read_string(r)?;
            LoginCredentials::Password { username, password }
        };

        Ok(Self {
            major_version,
            minor_version,
            revision,
            build_date,
            credentials,
        })
    }
}

impl Encode for LoginMessage {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u32_le(self.major_version);
        w.write_u32_le(self.minor_version);
        w.write_u32_le(self.revision);
        write_string(w, &self.build_date)?;

        match &self.credentials {
            LoginCredentials::Password { username, password } => {
                w.write_bool(false);
                write_string_aligned(w, username, 7)?;
                write_string(w, password)?;
            }
            LoginCredentials::Token { token, username } => {
                w.write_bool(true);
                write_padded_string(w, token, TOKEN_WIDTH)?;
                write_string_aligned(w, username, 7)?;
            }
        }
        Ok(())
    }
}

/// Login result codes.
#[derive(Copy, Clone, PartialEq, Eq, Debug, FromPrimitive)]
pub enum LoginError {
    Success = 0,
    ServerError = 1,
    BadUsernameOrPassword = 2,
    AccountLocked = 3,
    BadVersion = 4,
}

wire_enum!(LoginError, width = 32, ids = 0..=4);

/// Station account standing.
#[derive(Copy, Clone, PartialEq, Eq, Debug, FromPrimitive)]
pub enum StationError {
    AccountActive = 1,
    AccountClosed = 2,
    MissingProfile = 3,
}

wire_enum!(StationError, width = 32, ids = 1..=3);

/// Station subscription standing.
#[derive(Copy, Clone, PartialEq, Eq, Debug, FromPrimitive)]
pub enum StationSubscriptionStatus {
    Unknown = 1,
    None = 2,
    Active = 3,
    Closed = 4,
    Trial = 5,
}

wire_enum!(StationSubscriptionStatus, width = 32, ids = 1..=5);

/// The server's answer to [`LoginMessage`].
#[derive(Clone, PartialEq, Debug)]
pub struct LoginRespMessage {
    pub token: String,
    pub error: LoginError,
    pub station_error: StationError,
    pub subscription_status: StationSubscriptionStatus,
    pub privilege: u32,
    pub username: String,
}

impl Decode for LoginRespMessage {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            token: read_padded_string(r, TOKEN_WIDTH)?,
            error: read_enum(r)?,
            station_error: read_enum(r)?,
            subscription_status: read_enum(r)?,
            privilege: r.read_u32_le()?,
            username: read_string(r)?,
        })
    }
}

impl Encode for LoginRespMessage {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        write_padded_string(w, &self.token, TOKEN_WIDTH)?;
        write_enum(w, self.error)?;
        write_enum(w, self.station_error)?;
        write_enum(w, self.subscription_status)?;
        w.write_u32_le(self.privilege);
        write_string(w, &self.username)
    }
}

/// Hands the client off to a world server.
#[derive(Clone, PartialEq, Debug)]
pub struct ConnectToWorldMessage {
    pub server_name: String,
    pub host: String,
    pub port: u16,
}

impl Decode for ConnectToWorldMessage {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            server_name: read_string(r)?,
            host: read_string(r)?,
            port: r.read_u16_le()?,
        })
    }
}

impl Encode for ConnectToWorldMessage {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        write_string(w, &self.server_name)?;
        write_string(w, &self.host)?;
        w.write_u16_le(self.port);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::{BitReader, BitWriter};

    fn round_trip<T: Decode + Encode + PartialEq + std::fmt::Debug>(value: &T) -> Vec<u8> {
        let mut w = BitWriter::new();
        value.encode(&mut w).unwrap();
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        assert_eq!(&T::decode(&mut r).unwrap(), value);
        assert!(r.remaining() < 8);
        bytes
    }

    #[test]
    fn password_login_round_trips() {
        round_trip(&LoginMessage {
            major_version: 3,
            minor_version: 15,
            revision: 260,
            build_date: "Dec  2 2009".into(),
            credentials: LoginCredentials::Password {
                username: "vanu-hunter".into(),
                password: "hunter2".into(),
            },
        });
    }

    #[test]
    fn token_login_round_trips() {
        round_trip(&LoginMessage {
            major_version: 3,
            minor_version: 15,
            revision: 260,
            build_date: "Dec  2 2009".into(),
            credentials: LoginCredentials::Token {
                token: "AAAABBBBCCCCDDDDEEEEFFFFGGGGHHHH".into(),
                username: "vanu-hunter".into(),
            },
        });
    }

    #[test]
    fn aligned_username_keeps_characters_on_byte_boundaries() {
        let mut w = BitWriter::new();
        LoginMessage {
            major_version: 0,
            minor_version: 0,
            revision: 0,
            build_date: String::new(),
            credentials: LoginCredentials::Password {
                username: "AB".into(),
                password: String::new(),
            },
        }
        .encode(&mut w)
        .unwrap();
        let bytes = w.into_bytes();

        // Three version words, an empty date string, the form tag, and
        // the re-aligned size prefix put 'A' at a whole-byte offset.
        assert_eq!(&bytes[15..17], b"AB");
    }

    #[test]
    fn login_resp_round_trips() {
        round_trip(&LoginRespMessage {
            token: "THISTOKENISLONGENOUGHTOFILLFIELD".into(),
            error: LoginError::Success,
            station_error: StationError::AccountActive,
            subscription_status: StationSubscriptionStatus::Active,
            privilege: 10001,
            username: "vanu-hunter".into(),
        });
    }

    #[test]
    fn connect_to_world_round_trips() {
        round_trip(&ConnectToWorldMessage {
            server_name: "gemini".into(),
            host: "64.37.158.81".into(),
            port: 51000,
        });
    }
}
