//! Bit-granular reading and writing over byte-backed buffers.
//!
//! The wire format is bit-aligned: fields start at arbitrary bit positions
//! and integer fields carry an explicit width between 1 and 32 bits. Two
//! layouts exist on the wire:
//!
//! * **Big-endian**: the `n` bits of the value, most significant first.
//! * **Little-endian**: for a width `n = 8k + r`, the low `r` bits of the
//!   value first (that group MSB-first), followed by `value >> r` as `k`
//!   bytes in little-endian byte order. For `r == 0` this is ordinary
//!   little-endian; for `n <= 8` it coincides with big-endian.
//!
//! The split little-endian layout is what keeps a long string-size prefix
//! byte-aligned: the 1-bit tag plus the low 7 bits fill the first byte and
//! the remaining 8 bits fill the second.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::CodecError;

/// The widest integer field the wire format uses.
pub const MAX_FIELD_WIDTH: u32 = 32;

/// A read cursor over a borrowed byte buffer, positioned in bits.
///
/// The reader is `Copy`, so a cheap snapshot doubles as a peek: copy the
/// reader, read from the copy, and the original is untouched.
#[derive(Copy, Clone, Debug)]
pub struct BitReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current position in bits from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bits left unread.
    pub fn remaining(&self) -> usize {
        self.buf.len() * 8 - self.pos
    }

    fn require(&self, needed: usize) -> Result<(), CodecError> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(CodecError::EndOfStream {
                offset: self.pos,
                needed,
                remaining,
            });
        }
        Ok(())
    }

    fn read_bit_unchecked(&mut self) -> bool {
        let byte = self.buf[self.pos / 8];
        let bit = byte >> (7 - self.pos % 8) & 1;
        self.pos += 1;
        bit != 0
    }

    // Caller has checked availability.
    fn read_bits_be(&mut self, width: u32) -> u32 {
        if self.pos % 8 == 0 && width == 8 {
            let byte = self.buf[self.pos / 8];
            self.pos += 8;
            return u32::from(byte);
        }

        let mut value = 0;
        for _ in 0..width {
            value = value << 1 | u32::from(self.read_bit_unchecked());
        }
        value
    }

    /// Reads one bit as a boolean.
    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        self.require(1)?;
        Ok(self.read_bit_unchecked())
    }

    /// Advances the cursor without interpreting the skipped bits.
    pub fn skip(&mut self, bits: usize) -> Result<(), CodecError> {
        self.require(bits)?;
        self.pos += bits;
        Ok(())
    }

    /// Reads a `width`-bit unsigned integer, MSB first.
    pub fn read_uint_be(&mut self, width: u32) -> Result<u32, CodecError> {
        assert!(
            (1..=MAX_FIELD_WIDTH).contains(&width),
            "invalid field width {width}"
        );
        self.require(width as usize)?;
        Ok(self.read_bits_be(width))
    }

    /// Reads a `width`-bit unsigned integer in the split little-endian
    /// layout described in the module docs.
    pub fn read_uint_le(&mut self, width: u32) -> Result<u32, CodecError> {
        assert!(
            (1..=MAX_FIELD_WIDTH).contains(&width),
            "invalid field width {width}"
        );
        self.require(width as usize)?;

        let tail = width % 8;
        let low = if tail > 0 { self.read_bits_be(tail) } else { 0 };

        let bytes = width / 8;
        let mut high = 0u64;
        if self.pos % 8 == 0 && bytes > 0 {
            let start = self.pos / 8;
            high = LittleEndian::read_uint(&self.buf[start..], bytes as usize);
            self.pos += bytes as usize * 8;
        } else {
            for i in 0..bytes {
                high |= u64::from(self.read_bits_be(8)) << (8 * i);
            }
        }

        Ok((high << tail) as u32 | low)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        self.read_uint_le(8).map(|v| v as u8)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, CodecError> {
        self.read_uint_le(16).map(|v| v as u16)
    }

    pub fn read_u16_be(&mut self) -> Result<u16, CodecError> {
        self.read_uint_be(16).map(|v| v as u16)
    }

    pub fn read_u32_le(&mut self) -> Result<u32, CodecError> {
        self.read_uint_le(32)
    }

    /// Reads `n` whole bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, CodecError> {
        self.require(n * 8)?;
        if self.pos % 8 == 0 {
            let start = self.pos / 8;
            self.pos += n * 8;
            Ok(self.buf[start..start + n].to_vec())
        } else {
            Ok((0..n).map(|_| self.read_bits_be(8) as u8).collect())
        }
    }

    /// Reads an `N`-byte array.
    pub fn read_byte_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0; N];
        self.require(N * 8)?;
        for slot in &mut out {
            *slot = self.read_bits_be(8) as u8;
        }
        Ok(out)
    }

    /// Returns the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8, CodecError> {
        let mut copy = *self;
        copy.read_u8()
    }

    /// Reads a `width`-bit little-endian constant, failing with
    /// [`CodecError::ConstantMismatch`] at the field's starting offset if
    /// the wire carries any other value.
    pub fn expect_constant_le(&mut self, width: u32, expected: u32) -> Result<(), CodecError> {
        let offset = self.pos;
        let actual = self.read_uint_le(width)?;
        if actual != expected {
            return Err(CodecError::ConstantMismatch {
                offset,
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Big-endian counterpart of [`expect_constant_le`](Self::expect_constant_le).
    pub fn expect_constant_be(&mut self, width: u32, expected: u32) -> Result<(), CodecError> {
        let offset = self.pos;
        let actual = self.read_uint_be(width)?;
        if actual != expected {
            return Err(CodecError::ConstantMismatch {
                offset,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

/// An append-only bit buffer.
///
/// Writes grow the buffer a bit at a time; [`into_bytes`](Self::into_bytes)
/// hands back the backing bytes with the final partial byte zero-padded,
/// which is how frames are padded on the wire.
#[derive(Clone, Debug, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits written so far.
    pub fn bit_len(&self) -> usize {
        self.len
    }

    fn push_bit(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.buf.push(0);
        }
        if bit {
            let last = self.buf.len() - 1;
            self.buf[last] |= 1 << (7 - self.len % 8);
        }
        self.len += 1;
    }

    fn push_bits_be(&mut self, value: u32, width: u32) {
        for i in (0..width).rev() {
            self.push_bit(value >> i & 1 == 1);
        }
    }

    pub fn write_bool(&mut self, bit: bool) {
        self.push_bit(bit);
    }

    /// Appends `n` zero bits.
    pub fn write_zeros(&mut self, n: usize) {
        for _ in 0..n {
            self.push_bit(false);
        }
    }

    fn check_range(&self, value: u32, width: u32) -> Result<(), CodecError> {
        assert!(
            (1..=MAX_FIELD_WIDTH).contains(&width),
            "invalid field width {width}"
        );
        if width < 32 && value >> width != 0 {
            return Err(CodecError::ValueOutOfRange {
                value: u64::from(value),
                width,
                offset: self.len,
            });
        }
        Ok(())
    }

    /// Appends a `width`-bit unsigned integer, MSB first.
    pub fn write_uint_be(&mut self, value: u32, width: u32) -> Result<(), CodecError> {
        self.check_range(value, width)?;
        self.push_bits_be(value, width);
        Ok(())
    }

    /// Appends a `width`-bit unsigned integer in the split little-endian
    /// layout described in the module docs.
    pub fn write_uint_le(&mut self, value: u32, width: u32) -> Result<(), CodecError> {
        self.check_range(value, width)?;

        let tail = width % 8;
        if tail > 0 {
            self.push_bits_be(value & ((1 << tail) - 1), tail);
        }

        let high = if tail > 0 { value >> tail } else { value };
        for i in 0..width / 8 {
            self.push_bits_be(high >> (8 * i) & 0xff, 8);
        }
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) {
        self.push_bits_be(u32::from(value), 8);
    }

    pub fn write_u16_le(&mut self, value: u16) {
        // Infallible: a u16 always fits its own width.
        let _ = self.write_uint_le(u32::from(value), 16);
    }

    pub fn write_u16_be(&mut self, value: u16) {
        let _ = self.write_uint_be(u32::from(value), 16);
    }

    pub fn write_u32_le(&mut self, value: u32) {
        let _ = self.write_uint_le(value, 32);
    }

    /// Appends whole bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.len % 8 == 0 {
            self.buf.extend_from_slice(bytes);
            self.len += bytes.len() * 8;
        } else {
            for &byte in bytes {
                self.push_bits_be(u32::from(byte), 8);
            }
        }
    }

    /// Consumes the writer, zero-padding the final partial byte.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use rand::{thread_rng, Rng};

    use super::*;

    #[test]
    fn be_reads_msb_first() {
        let mut r = BitReader::new(&[0b1011_0001]);
        assert_eq!(r.read_uint_be(3).unwrap(), 0b101);
        assert_eq!(r.read_uint_be(5).unwrap(), 0b10001);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn le_multibyte_is_ordinary_little_endian() {
        let mut r = BitReader::new(&[0x34, 0x12, 0x78, 0x56, 0x34, 0x12]);
        assert_eq!(r.read_u16_le().unwrap(), 0x1234);
        assert_eq!(r.read_u32_le().unwrap(), 0x12345678);
    }

    #[test]
    fn le_split_layout_low_bits_first() {
        // 15-bit 0x1234: low 7 bits (0x34) first, then the byte 0x24.
        let mut w = BitWriter::new();
        w.write_uint_le(0x1234, 15).unwrap();
        w.write_bool(true);
        let bytes = w.into_bytes();
        assert_eq!(bytes, vec![0b0110100_0, 0b0100100_1]);

        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_uint_le(15).unwrap(), 0x1234);
        assert!(r.read_bool().unwrap());
    }

    #[test]
    fn le_sub_byte_matches_be() {
        let mut w = BitWriter::new();
        w.write_uint_le(0b0100, 4).unwrap();
        w.write_uint_be(0b0100, 4).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes, vec![0b0100_0100]);
    }

    #[test]
    fn eleven_bit_class_id_round_trips() {
        let mut w = BitWriter::new();
        w.write_uint_le(728, 11).unwrap();
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_uint_le(11).unwrap(), 728);
        assert_eq!(r.remaining(), 5);
    }

    #[test]
    fn end_of_stream_reports_offset() {
        let mut r = BitReader::new(&[0xff]);
        r.skip(3).unwrap();
        let err = r.read_uint_le(8).unwrap_err();
        assert_eq!(
            err,
            CodecError::EndOfStream {
                offset: 3,
                needed: 8,
                remaining: 5
            }
        );
    }

    #[test]
    fn writer_rejects_out_of_range_values() {
        let mut w = BitWriter::new();
        assert!(matches!(
            w.write_uint_le(16, 4),
            Err(CodecError::ValueOutOfRange {
                value: 16,
                width: 4,
                ..
            })
        ));
        // Nothing was written.
        assert_eq!(w.bit_len(), 0);
    }

    #[test]
    fn constants_verify_at_field_start() {
        let mut r = BitReader::new(&[0b1111_0000]);
        r.skip(2).unwrap();
        let err = r.expect_constant_be(4, 0b1101).unwrap_err();
        assert_eq!(
            err,
            CodecError::ConstantMismatch {
                offset: 2,
                expected: 0b1101,
                actual: 0b1100
            }
        );
    }

    #[test]
    fn final_byte_is_zero_padded() {
        let mut w = BitWriter::new();
        w.write_bool(true);
        w.write_uint_be(0b10, 2).unwrap();
        assert_eq!(w.into_bytes(), vec![0b110_00000]);
    }

    #[test]
    fn unaligned_bytes_round_trip() {
        let mut w = BitWriter::new();
        w.write_bool(true);
        w.write_bytes(b"ps");
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_bytes(2).unwrap(), b"ps");
    }

    #[test]
    fn random_uints_round_trip_at_every_width() {
        let mut rng = thread_rng();

        for _ in 0..10_000 {
            let width = rng.gen_range(1..=32);
            let value = if width == 32 {
                rng.gen()
            } else {
                rng.gen_range(0..1u32 << width)
            };
            let lead = rng.gen_range(0..8usize);

            let mut w = BitWriter::new();
            w.write_zeros(lead);
            w.write_uint_le(value, width).unwrap();
            w.write_uint_be(value, width).unwrap();
            let bytes = w.into_bytes();

            let mut r = BitReader::new(&bytes);
            r.skip(lead).unwrap();
            assert_eq!(r.read_uint_le(width).unwrap(), value, "le width {width}");
            assert_eq!(r.read_uint_be(width).unwrap(), value, "be width {width}");
        }
    }
}
