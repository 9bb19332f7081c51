use num_derive::FromPrimitive;

use crate::bits::{BitReader, BitWriter};
use crate::error::CodecError;
use crate::strings::{
    read_string, read_wide_string, read_wide_string_aligned, write_string, write_wide_string,
    write_wide_string_aligned,
};
use crate::wire_enum::{read_enum, wire_enum, write_enum};
use crate::{Decode, Encode};

#[derive(Copy, Clone, PartialEq, Eq, Debug, FromPrimitive)]
pub enum ChatMessageType {
    Say = 1,
    Tell = 2,
    Broadcast = 3,
    Squad = 4,
    Outfit = 5,
    Note = 6,
}

wire_enum!(ChatMessageType, width = 8, ids = 1..=6);

/// A chat line in either direction.
///
/// The recipient only matters for tells; other channels carry it empty.
/// The contents ride wide or narrow as the `wide_contents` bit says, and
/// the recipient re-aligns with seven pad bits because that bit sits
/// between the channel byte and the recipient's size prefix.
#[derive(Clone, PartialEq, Debug)]
pub struct ChatMsg {
    pub channel: ChatMessageType,
    pub wide_contents: bool,
    pub recipient: String,
    pub contents: String,
}

impl Decode for ChatMsg {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        let channel = read_enum(r)?;
        let wide_contents = r.read_bool()?;
        let recipient = read_wide_string_aligned(r, 7)?;
        let contents = if wide_contents {
            read_wide_string(r)?
        } else {
            read_string(r)?
        };

        Ok(Self {
            channel,
            wide_contents,
            recipient,
            contents,
        })
    }
}

impl Encode for ChatMsg {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        write_enum(w, self.channel)?;
        w.write_bool(self.wide_contents);
        write_wide_string_aligned(w, &self.recipient, 7)?;
        if self.wide_contents {
            write_wide_string(w, &self.contents)
        } else {
            write_string(w, &self.contents)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(msg: &ChatMsg) -> Vec<u8> {
        let mut w = BitWriter::new();
        msg.encode(&mut w).unwrap();
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        assert_eq!(&ChatMsg::decode(&mut r).unwrap(), msg);
        assert!(r.remaining() < 8);
        bytes
    }

    #[test]
    fn tell_round_trips() {
        round_trip(&ChatMsg {
            channel: ChatMessageType::Tell,
            wide_contents: true,
            recipient: "OpoloTR".into(),
            contents: "incoming at the north gate".into(),
        });
    }

    #[test]
    fn narrow_contents_round_trip() {
        round_trip(&ChatMsg {
            channel: ChatMessageType::Broadcast,
            wide_contents: false,
            recipient: String::new(),
            contents: "/who".into(),
        });
    }

    #[test]
    fn contents_survive_non_ascii_when_wide() {
        round_trip(&ChatMsg {
            channel: ChatMessageType::Say,
            wide_contents: true,
            recipient: String::new(),
            contents: "\u{30d7}\u{30e9}\u{30cd}\u{30c3}\u{30c8}".into(),
        });
    }

    #[test]
    fn channel_byte_out_of_range_fails() {
        let mut w = BitWriter::new();
        w.write_u8(0x2a);
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        let err = ChatMsg::decode(&mut r).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected ChatMessageType with ID between [1, 6], but got 42 at bit 0"
        );
    }
}
