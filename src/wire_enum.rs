//! Numeric enumerations with a declared wire representation.

use num_traits::FromPrimitive;

use crate::bits::{BitReader, BitWriter};
use crate::error::CodecError;

/// A protocol enumeration with a fixed storage width and id range.
///
/// Implementations come from the crate-internal `wire_enum!` macro,
/// which also asserts at compile time that the largest id fits the
/// storage width.
pub trait WireEnum: FromPrimitive + Copy {
    /// Name used in diagnostics.
    const NAME: &'static str;
    /// Storage width in bits.
    const WIDTH: u32;
    /// Smallest valid id.
    const FIRST_ID: u32;
    /// Largest valid id.
    const LAST_ID: u32;

    /// The enumerator's numeric id on the wire.
    fn wire_id(self) -> u32;
}

/// Reads a `WIDTH`-bit little-endian id and maps it to an enumerator.
///
/// Ids outside `FIRST_ID..=LAST_ID` fail with
/// [`CodecError::EnumOutOfRange`] at the field's starting offset.
pub fn read_enum<E: WireEnum>(r: &mut BitReader<'_>) -> Result<E, CodecError> {
    let offset = r.position();
    let value = r.read_uint_le(E::WIDTH)?;
    E::from_u32(value).ok_or(CodecError::EnumOutOfRange {
        name: E::NAME,
        first: E::FIRST_ID,
        last: E::LAST_ID,
        value,
        offset,
    })
}

/// Writes an enumerator's id in its declared width.
pub fn write_enum<E: WireEnum>(w: &mut BitWriter, value: E) -> Result<(), CodecError> {
    w.write_uint_le(value.wire_id(), E::WIDTH)
}

/// Implements [`WireEnum`] for a fieldless enum whose discriminants are
/// its wire ids.
macro_rules! wire_enum {
    ($ty:ident, width = $width:literal, ids = $first:literal ..= $last:literal) => {
        impl $crate::wire_enum::WireEnum for $ty {
            const NAME: &'static str = stringify!($ty);
            const WIDTH: u32 = $width;
            const FIRST_ID: u32 = $first;
            const LAST_ID: u32 = $last;

            fn wire_id(self) -> u32 {
                self as u32
            }
        }

        // The catalogue must fit its storage width.
        const _: () = assert!(($last as u64) < (1u64 << $width));
    };
}

pub(crate) use wire_enum;

#[cfg(test)]
mod tests {
    use num_derive::FromPrimitive;

    use super::*;
    use crate::bits::{BitReader, BitWriter};

    #[derive(Copy, Clone, PartialEq, Eq, Debug, FromPrimitive)]
    enum Flavor {
        Sweet = 1,
        Sour = 2,
        Bitter = 3,
    }

    wire_enum!(Flavor, width = 3, ids = 1..=3);

    #[test]
    fn every_enumerator_round_trips() {
        for flavor in [Flavor::Sweet, Flavor::Sour, Flavor::Bitter] {
            let mut w = BitWriter::new();
            write_enum(&mut w, flavor).unwrap();
            let bytes = w.into_bytes();

            let mut r = BitReader::new(&bytes);
            assert_eq!(read_enum::<Flavor>(&mut r).unwrap(), flavor);
            assert_eq!(r.position(), 3);
        }
    }

    #[test]
    fn out_of_range_ids_fail_with_the_documented_message() {
        for id in [0u32, 4, 7] {
            let mut w = BitWriter::new();
            w.write_uint_le(id, 3).unwrap();
            let bytes = w.into_bytes();

            let mut r = BitReader::new(&bytes);
            let err = read_enum::<Flavor>(&mut r).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Expected Flavor with ID between [1, 3], but got {id} at bit 0")
            );
        }
    }
}
