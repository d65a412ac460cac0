//! Fixed-width bit-packed index arrays.
//!
//! Dense slice bodies store one palette index per voxel, packed to the
//! smallest width that can represent every index. Packing is LSB-first
//! within each byte; the final partial byte is zero-padded.

use crate::error::{MatterError, MatterResult};

/// Number of bits needed to represent indices `0..n`.
///
/// `ceil(log2(n))`, with a floor of 1 bit so a single-entry table still
/// occupies one bit per voxel.
#[must_use]
pub fn bit_width(n: u64) -> u32 {
    if n <= 2 {
        1
    } else {
        64 - (n - 1).leading_zeros() as u32
    }
}

/// Packs fixed-width indices into a byte buffer.
#[derive(Debug)]
pub struct BitWriter {
    bits: u32,
    buf: Vec<u8>,
    acc: u64,
    filled: u32,
}

impl BitWriter {
    /// Creates a writer emitting `bits`-wide values (1..=32).
    #[must_use]
    pub fn new(bits: u32) -> Self {
        debug_assert!((1..=32).contains(&bits));
        Self {
            bits,
            buf: Vec::new(),
            acc: 0,
            filled: 0,
        }
    }

    /// Appends one index.
    pub fn push(&mut self, value: u32) {
        debug_assert!(self.bits == 32 || u64::from(value) < (1u64 << self.bits));
        self.acc |= u64::from(value) << self.filled;
        self.filled += self.bits;
        while self.filled >= 8 {
            self.buf.push((self.acc & 0xff) as u8);
            self.acc >>= 8;
            self.filled -= 8;
        }
    }

    /// Flushes the trailing partial byte and returns the packed buffer.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.buf.push((self.acc & 0xff) as u8);
        }
        self.buf
    }
}

/// Unpacks fixed-width indices from a byte buffer.
#[derive(Debug)]
pub struct BitReader<'a> {
    bits: u32,
    bytes: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a reader over `bytes` yielding `bits`-wide values.
    #[must_use]
    pub fn new(bytes: &'a [u8], bits: u32) -> Self {
        debug_assert!((1..=32).contains(&bits));
        Self {
            bits,
            bytes,
            bit_pos: 0,
        }
    }

    /// Reads the next index, failing if the buffer is exhausted.
    pub fn read(&mut self) -> MatterResult<u32> {
        let end = self.bit_pos + self.bits as usize;
        if end > self.bytes.len() * 8 {
            return Err(MatterError::CorruptData(
                "packed index array is truncated".into(),
            ));
        }
        let mut value = 0u64;
        let mut got = 0u32;
        let mut pos = self.bit_pos;
        while got < self.bits {
            let byte = self.bytes[pos / 8];
            let offset = (pos % 8) as u32;
            let take = (8 - offset).min(self.bits - got);
            let chunk = u64::from(byte >> offset) & ((1u64 << take) - 1);
            value |= chunk << got;
            got += take;
            pos += take as usize;
        }
        self.bit_pos = end;
        Ok(value as u32)
    }
}

/// Exact packed size in bytes for `count` values of `bits` width.
#[must_use]
pub fn packed_len(count: usize, bits: u32) -> usize {
    (count * bits as usize).div_ceil(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_width() {
        assert_eq!(bit_width(0), 1);
        assert_eq!(bit_width(1), 1);
        assert_eq!(bit_width(2), 1);
        assert_eq!(bit_width(3), 2);
        assert_eq!(bit_width(4), 2);
        assert_eq!(bit_width(5), 3);
        assert_eq!(bit_width(256), 8);
        assert_eq!(bit_width(257), 9);
    }

    #[test]
    fn test_pack_unpack_roundtrip() {
        for bits in 1..=17 {
            let max = if bits >= 32 { u32::MAX } else { (1u32 << bits) - 1 };
            let values: Vec<u32> = (0..100u32).map(|i| (i * 7 + 3) % (max + 1)).collect();
            let mut writer = BitWriter::new(bits);
            for &v in &values {
                writer.push(v);
            }
            let packed = writer.finish();
            assert_eq!(packed.len(), packed_len(values.len(), bits));

            let mut reader = BitReader::new(&packed, bits);
            for &v in &values {
                assert_eq!(reader.read().expect("read failed"), v, "bits={bits}");
            }
        }
    }

    #[test]
    fn test_truncated_read_fails() {
        let mut writer = BitWriter::new(5);
        writer.push(9);
        let packed = writer.finish();
        let mut reader = BitReader::new(&packed, 5);
        reader.read().expect("first read failed");
        assert!(reader.read().is_err());
    }

    #[test]
    fn test_single_entry_palette_uses_one_bit() {
        let mut writer = BitWriter::new(bit_width(1));
        for _ in 0..16 {
            writer.push(0);
        }
        assert_eq!(writer.finish().len(), 2);
    }
}
