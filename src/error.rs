use thiserror::Error;

use crate::packet::PacketFamily;

/// Any failure produced while decoding or encoding the wire format.
///
/// Every variant carries the bit offset at which the failure occurred:
/// for decode errors the position in the input stream, for encode errors
/// the length of the output written so far. Errors are ordinary values;
/// a malformed packet never aborts the process and is reported up to the
/// session layer, which decides what to do with the connection.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum CodecError {
    /// Fewer bits remained in the stream than the field needed.
    #[error("end of stream at bit {offset}: needed {needed} bits, {remaining} remaining")]
    EndOfStream {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A reserved or constant field held an unexpected value.
    #[error("constant mismatch at bit {offset}: expected {expected:#x}, got {actual:#x}")]
    ConstantMismatch {
        offset: usize,
        expected: u32,
        actual: u32,
    },

    /// A numeric value does not map to any enumerator.
    #[error("Expected {name} with ID between [{first}, {last}], but got {value} at bit {offset}")]
    EnumOutOfRange {
        name: &'static str,
        first: u32,
        last: u32,
        value: u32,
        offset: usize,
    },

    /// An encoder received a value exceeding its declared bit width.
    #[error("value {value} does not fit in {width} bits at bit {offset}")]
    ValueOutOfRange {
        value: u64,
        width: u32,
        offset: usize,
    },

    /// A size-prefixed region's declared size disagrees with what the
    /// inner codec consumed or produced. Sizes are in bits.
    #[error("size mismatch at bit {offset}: declared {declared} bits, got {actual}")]
    SizeMismatch {
        declared: u32,
        actual: u32,
        offset: usize,
    },

    /// The dispatcher has no registration for the observed opcode.
    #[error("unknown {family} opcode 0x{opcode:02x} at offset {offset}")]
    UnknownOpcode {
        family: PacketFamily,
        opcode: u8,
        offset: usize,
    },

    /// A domain-level predicate rejected the value.
    #[error("{message} at bit {offset}")]
    InvalidFormat { message: String, offset: usize },
}

impl CodecError {
    /// The bit offset the error was reported at.
    pub fn offset(&self) -> usize {
        match *self {
            CodecError::EndOfStream { offset, .. }
            | CodecError::ConstantMismatch { offset, .. }
            | CodecError::EnumOutOfRange { offset, .. }
            | CodecError::ValueOutOfRange { offset, .. }
            | CodecError::SizeMismatch { offset, .. }
            | CodecError::UnknownOpcode { offset, .. }
            | CodecError::InvalidFormat { offset, .. } => offset,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>, offset: usize) -> Self {
        CodecError::InvalidFormat {
            message: message.into(),
            offset,
        }
    }
}
