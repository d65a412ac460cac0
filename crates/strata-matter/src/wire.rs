//! Primitive read/write helpers for the matter wire format.
//!
//! All multi-byte integers are little-endian. Variable-length integers use
//! unsigned LEB128. Strings are varint-length-prefixed UTF-8. Truncated
//! input surfaces as [`MatterError::CorruptData`] rather than a bare IO
//! error so decode failures are distinguishable from stream failures.

use crate::error::{MatterError, MatterResult};
use std::io::{Read, Write};

/// Upper bound on decoded string length, to stop a corrupt length prefix
/// from driving a huge allocation.
const MAX_STRING_LEN: u64 = 1 << 20;

fn read_exact(input: &mut dyn Read, buf: &mut [u8]) -> MatterResult<()> {
    input.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            MatterError::CorruptData("unexpected end of stream".into())
        } else {
            MatterError::Io(e)
        }
    })
}

/// Writes a single byte.
pub fn write_u8(out: &mut dyn Write, value: u8) -> MatterResult<()> {
    out.write_all(&[value])?;
    Ok(())
}

/// Reads a single byte.
pub fn read_u8(input: &mut dyn Read) -> MatterResult<u8> {
    let mut buf = [0u8; 1];
    read_exact(input, &mut buf)?;
    Ok(buf[0])
}

/// Writes a little-endian u16.
pub fn write_u16(out: &mut dyn Write, value: u16) -> MatterResult<()> {
    out.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Reads a little-endian u16.
pub fn read_u16(input: &mut dyn Read) -> MatterResult<u16> {
    let mut buf = [0u8; 2];
    read_exact(input, &mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Writes a little-endian u32.
pub fn write_u32(out: &mut dyn Write, value: u32) -> MatterResult<()> {
    out.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Reads a little-endian u32.
pub fn read_u32(input: &mut dyn Read) -> MatterResult<u32> {
    let mut buf = [0u8; 4];
    read_exact(input, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Writes a little-endian u64.
pub fn write_u64(out: &mut dyn Write, value: u64) -> MatterResult<()> {
    out.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Reads a little-endian u64.
pub fn read_u64(input: &mut dyn Read) -> MatterResult<u64> {
    let mut buf = [0u8; 8];
    read_exact(input, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Writes an unsigned LEB128 varint.
pub fn write_varint(out: &mut dyn Write, mut value: u64) -> MatterResult<()> {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.write_all(&[byte])?;
        if value == 0 {
            return Ok(());
        }
    }
}

/// Reads an unsigned LEB128 varint.
pub fn read_varint(input: &mut dyn Read) -> MatterResult<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = read_u8(input)?;
        if shift == 63 && byte > 1 {
            return Err(MatterError::CorruptData("varint overflows u64".into()));
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift > 63 {
            return Err(MatterError::CorruptData("varint too long".into()));
        }
    }
}

/// Writes a varint-length-prefixed UTF-8 string.
pub fn write_str(out: &mut dyn Write, value: &str) -> MatterResult<()> {
    write_varint(out, value.len() as u64)?;
    out.write_all(value.as_bytes())?;
    Ok(())
}

/// Reads a varint-length-prefixed UTF-8 string.
pub fn read_str(input: &mut dyn Read) -> MatterResult<String> {
    let len = read_varint(input)?;
    if len > MAX_STRING_LEN {
        return Err(MatterError::CorruptData(format!(
            "string length {len} exceeds limit"
        )));
    }
    let mut buf = vec![0u8; len as usize];
    read_exact(input, &mut buf)?;
    String::from_utf8(buf)
        .map_err(|_| MatterError::CorruptData("string is not valid UTF-8".into()))
}

/// Reads exactly `len` bytes into a new buffer.
///
/// Grows the buffer as bytes arrive instead of trusting `len` for the
/// allocation, so a corrupt length prefix fails on the short read rather
/// than on an oversized allocation.
pub fn read_bytes(input: &mut dyn Read, len: usize) -> MatterResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(1 << 16));
    let read = input.take(len as u64).read_to_end(&mut buf)?;
    if read != len {
        return Err(MatterError::CorruptData("unexpected end of stream".into()));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_roundtrip() {
        for value in [0u64, 1, 127, 128, 300, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            let mut buf = Vec::new();
            write_varint(&mut buf, value).expect("write failed");
            let decoded = read_varint(&mut buf.as_slice()).expect("read failed");
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_varint_compactness() {
        let mut buf = Vec::new();
        write_varint(&mut buf, 5).expect("write failed");
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_string_roundtrip() {
        let mut buf = Vec::new();
        write_str(&mut buf, "core:marker").expect("write failed");
        write_str(&mut buf, "").expect("write failed");
        let mut cursor = buf.as_slice();
        assert_eq!(read_str(&mut cursor).expect("read failed"), "core:marker");
        assert_eq!(read_str(&mut cursor).expect("read failed"), "");
    }

    #[test]
    fn test_truncated_input_is_corrupt() {
        let err = read_u32(&mut [1u8, 2].as_slice()).expect_err("should fail");
        assert!(matches!(err, MatterError::CorruptData(_)));
    }

    #[test]
    fn test_invalid_utf8_is_corrupt() {
        let buf = [2u8, 0xff, 0xfe];
        let err = read_str(&mut buf.as_slice()).expect_err("should fail");
        assert!(matches!(err, MatterError::CorruptData(_)));
    }
}
