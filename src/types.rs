use std::fmt;

use crate::bits::{BitReader, BitWriter};
use crate::error::CodecError;
use crate::{Decode, Encode};

/// The 16-bit handle naming a live game object.
///
/// On the wire it is a little-endian `u16`. The codec layer treats it as
/// opaque; which object it names is the server's business.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Guid(pub u16);

impl Decode for Guid {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        r.read_u16_le().map(Guid)
    }
}

impl Encode for Guid {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u16_le(self.0);
        Ok(())
    }
}

impl From<u16> for Guid {
    fn from(value: u16) -> Self {
        Guid(value)
    }
}

impl From<Guid> for u16 {
    fn from(guid: Guid) -> Self {
        guid.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
