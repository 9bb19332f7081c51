//! Length-prefixed string codecs.
//!
//! Strings carry a self-describing size prefix: one tag bit selects
//! between a 7-bit length (0..=127, one byte total) and a 15-bit length
//! (128..=32767, two bytes total). The encoder always picks the short
//! form when the length allows it, so every length has exactly one wire
//! representation.
//!
//! Narrow strings are ASCII, one byte per symbol. Wide strings are
//! UTF-16LE, two bytes per symbol, and their size prefix counts symbols
//! rather than bytes. The `_aligned` variants insert `pad_bits` zero bits
//! between the size prefix and the character data; the client does this
//! wherever the prefix would otherwise end off a byte boundary.

use byteorder::{ByteOrder, LittleEndian};

use crate::bits::{BitReader, BitWriter};
use crate::error::CodecError;

/// Longest encodable string length (in prefix units): the ceiling of the
/// 15-bit long form.
pub const MAX_STRING_LEN: usize = 32767;

/// Reads the 7/15-bit size prefix.
pub fn read_string_size(r: &mut BitReader<'_>) -> Result<usize, CodecError> {
    let long = r.read_bool()?;
    let size = if long {
        r.read_uint_le(15)?
    } else {
        r.read_uint_le(7)?
    };
    Ok(size as usize)
}

/// Writes the size prefix, choosing the short form iff `size <= 127`.
pub fn write_string_size(w: &mut BitWriter, size: usize) -> Result<(), CodecError> {
    if size <= 127 {
        w.write_bool(false);
        w.write_uint_le(size as u32, 7)
    } else if size <= MAX_STRING_LEN {
        w.write_bool(true);
        w.write_uint_le(size as u32, 15)
    } else {
        Err(CodecError::ValueOutOfRange {
            value: size as u64,
            width: 15,
            offset: w.bit_len(),
        })
    }
}

/// Reads a size-prefixed ASCII string.
pub fn read_string(r: &mut BitReader<'_>) -> Result<String, CodecError> {
    read_string_aligned(r, 0)
}

/// Reads a size-prefixed ASCII string with `pad_bits` zero bits between
/// the prefix and the characters.
pub fn read_string_aligned(r: &mut BitReader<'_>, pad_bits: u32) -> Result<String, CodecError> {
    assert!(pad_bits <= 7, "invalid string padding {pad_bits}");
    let size = read_string_size(r)?;
    r.skip(pad_bits as usize)?;

    let offset = r.position();
    let bytes = r.read_bytes(size)?;
    if !bytes.is_ascii() {
        return Err(CodecError::invalid("string is not ASCII", offset));
    }
    Ok(bytes.iter().map(|&b| char::from(b)).collect())
}

/// Writes a size-prefixed ASCII string.
pub fn write_string(w: &mut BitWriter, s: &str) -> Result<(), CodecError> {
    write_string_aligned(w, s, 0)
}

/// Writes a size-prefixed ASCII string with `pad_bits` zero bits between
/// the prefix and the characters.
pub fn write_string_aligned(w: &mut BitWriter, s: &str, pad_bits: u32) -> Result<(), CodecError> {
    assert!(pad_bits <= 7, "invalid string padding {pad_bits}");
    if !s.is_ascii() {
        return Err(CodecError::invalid("string is not ASCII", w.bit_len()));
    }
    write_string_size(w, s.len())?;
    w.write_zeros(pad_bits as usize);
    w.write_bytes(s.as_bytes());
    Ok(())
}

/// Reads a size-prefixed UTF-16LE string. The prefix counts symbols, so
/// the character region is twice that many bytes.
pub fn read_wide_string(r: &mut BitReader<'_>) -> Result<String, CodecError> {
    read_wide_string_aligned(r, 0)
}

/// Reads a size-prefixed UTF-16LE string with `pad_bits` zero bits
/// between the prefix and the characters.
pub fn read_wide_string_aligned(
    r: &mut BitReader<'_>,
    pad_bits: u32,
) -> Result<String, CodecError> {
    assert!(pad_bits <= 7, "invalid string padding {pad_bits}");
    let symbols = read_string_size(r)?;
    r.skip(pad_bits as usize)?;

    let offset = r.position();
    let bytes = r.read_bytes(symbols * 2)?;
    let mut units = vec![0u16; symbols];
    LittleEndian::read_u16_into(&bytes, &mut units);

    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|_| CodecError::invalid("string is not valid UTF-16", offset))
}

/// Writes a size-prefixed UTF-16LE string.
pub fn write_wide_string(w: &mut BitWriter, s: &str) -> Result<(), CodecError> {
    write_wide_string_aligned(w, s, 0)
}

/// Writes a size-prefixed UTF-16LE string with `pad_bits` zero bits
/// between the prefix and the characters.
pub fn write_wide_string_aligned(
    w: &mut BitWriter,
    s: &str,
    pad_bits: u32,
) -> Result<(), CodecError> {
    assert!(pad_bits <= 7, "invalid string padding {pad_bits}");
    let units: Vec<u16> = s.encode_utf16().collect();
    write_string_size(w, units.len())?;
    w.write_zeros(pad_bits as usize);

    let mut bytes = vec![0u8; units.len() * 2];
    LittleEndian::write_u16_into(&units, &mut bytes);
    w.write_bytes(&bytes);
    Ok(())
}

/// Reads a fixed `width`-byte ASCII field, NUL-padded on the wire.
pub fn read_padded_string(r: &mut BitReader<'_>, width: usize) -> Result<String, CodecError> {
    let offset = r.position();
    let mut bytes = r.read_bytes(width)?;
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    if !bytes.is_ascii() {
        return Err(CodecError::invalid("string is not ASCII", offset));
    }
    Ok(bytes.iter().map(|&b| char::from(b)).collect())
}

/// Writes a fixed `width`-byte ASCII field, NUL-padding the tail.
pub fn write_padded_string(w: &mut BitWriter, s: &str, width: usize) -> Result<(), CodecError> {
    if !s.is_ascii() {
        return Err(CodecError::invalid("string is not ASCII", w.bit_len()));
    }
    if s.len() > width {
        return Err(CodecError::invalid(
            format!("string of {} bytes exceeds its {width}-byte field", s.len()),
            w.bit_len(),
        ));
    }
    w.write_bytes(s.as_bytes());
    w.write_zeros((width - s.len()) * 8);
    Ok(())
}
