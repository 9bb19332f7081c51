use crate::bits::{BitReader, BitWriter};
use crate::error::CodecError;
use crate::{Decode, Encode};

/// Session liveness ping; the code is echoed back verbatim.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct KeepAliveMessage {
    pub code: u16,
}

impl Decode for KeepAliveMessage {
    fn decode(r: &mut BitReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            code: r.read_u16_le()?,
        })
    }
}

impl Encode for KeepAliveMessage {
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u16_le(self.code);
        Ok(())
    }
}
