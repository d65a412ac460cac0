//! Compound metadata values.
//!
//! A [`Compound`] is a string-keyed tree of typed values, the shape used
//! for per-voxel metadata records (tile entity data, marker payloads).
//! Keys are kept sorted so encoding is deterministic and equality is
//! structural regardless of insertion order.

use crate::error::{MatterError, MatterResult};
use crate::value::MatterValue;
use crate::wire;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};

/// Maximum nesting depth accepted when decoding, to bound recursion on
/// corrupt input.
const MAX_DEPTH: u32 = 64;

/// Maximum element count accepted for a decoded list or array.
const MAX_SEQ_LEN: u64 = 1 << 24;

/// One typed metadata value inside a [`Compound`].
#[derive(Debug, Clone)]
pub enum Value {
    /// Signed 8-bit integer
    Byte(i8),
    /// Signed 16-bit integer
    Short(i16),
    /// Signed 32-bit integer
    Int(i32),
    /// Signed 64-bit integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Raw byte array
    ByteArray(Vec<u8>),
    /// 32-bit integer array
    IntArray(Vec<i32>),
    /// Ordered list of values
    List(Vec<Value>),
    /// Nested compound
    Compound(Compound),
}

// Floats compare and hash by bit pattern so compounds can serve as palette
// keys; NaN payloads round-trip through the codec unchanged.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::ByteArray(a), Self::ByteArray(b)) => a == b,
            (Self::IntArray(a), Self::IntArray(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Compound(a), Self::Compound(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Byte(v) => v.hash(state),
            Self::Short(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Long(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Double(v) => v.to_bits().hash(state),
            Self::String(v) => v.hash(state),
            Self::ByteArray(v) => v.hash(state),
            Self::IntArray(v) => v.hash(state),
            Self::List(v) => v.hash(state),
            Self::Compound(v) => v.hash(state),
        }
    }
}

impl Value {
    const TAG_BYTE: u8 = 1;
    const TAG_SHORT: u8 = 2;
    const TAG_INT: u8 = 3;
    const TAG_LONG: u8 = 4;
    const TAG_FLOAT: u8 = 5;
    const TAG_DOUBLE: u8 = 6;
    const TAG_STRING: u8 = 7;
    const TAG_BYTE_ARRAY: u8 = 8;
    const TAG_INT_ARRAY: u8 = 9;
    const TAG_LIST: u8 = 10;
    const TAG_COMPOUND: u8 = 11;

    fn write(&self, out: &mut dyn Write) -> MatterResult<()> {
        match self {
            Self::Byte(v) => {
                wire::write_u8(out, Self::TAG_BYTE)?;
                wire::write_u8(out, *v as u8)
            }
            Self::Short(v) => {
                wire::write_u8(out, Self::TAG_SHORT)?;
                wire::write_u16(out, *v as u16)
            }
            Self::Int(v) => {
                wire::write_u8(out, Self::TAG_INT)?;
                wire::write_u32(out, *v as u32)
            }
            Self::Long(v) => {
                wire::write_u8(out, Self::TAG_LONG)?;
                wire::write_u64(out, *v as u64)
            }
            Self::Float(v) => {
                wire::write_u8(out, Self::TAG_FLOAT)?;
                wire::write_u32(out, v.to_bits())
            }
            Self::Double(v) => {
                wire::write_u8(out, Self::TAG_DOUBLE)?;
                wire::write_u64(out, v.to_bits())
            }
            Self::String(v) => {
                wire::write_u8(out, Self::TAG_STRING)?;
                wire::write_str(out, v)
            }
            Self::ByteArray(v) => {
                wire::write_u8(out, Self::TAG_BYTE_ARRAY)?;
                wire::write_varint(out, v.len() as u64)?;
                out.write_all(v)?;
                Ok(())
            }
            Self::IntArray(v) => {
                wire::write_u8(out, Self::TAG_INT_ARRAY)?;
                wire::write_varint(out, v.len() as u64)?;
                for item in v {
                    wire::write_u32(out, *item as u32)?;
                }
                Ok(())
            }
            Self::List(v) => {
                wire::write_u8(out, Self::TAG_LIST)?;
                wire::write_varint(out, v.len() as u64)?;
                for item in v {
                    item.write(out)?;
                }
                Ok(())
            }
            Self::Compound(v) => {
                wire::write_u8(out, Self::TAG_COMPOUND)?;
                v.write(out)
            }
        }
    }

    fn read(input: &mut dyn Read, depth: u32) -> MatterResult<Self> {
        if depth > MAX_DEPTH {
            return Err(MatterError::CorruptData(
                "compound nesting exceeds depth limit".into(),
            ));
        }
        let tag = wire::read_u8(input)?;
        match tag {
            Self::TAG_BYTE => Ok(Self::Byte(wire::read_u8(input)? as i8)),
            Self::TAG_SHORT => Ok(Self::Short(wire::read_u16(input)? as i16)),
            Self::TAG_INT => Ok(Self::Int(wire::read_u32(input)? as i32)),
            Self::TAG_LONG => Ok(Self::Long(wire::read_u64(input)? as i64)),
            Self::TAG_FLOAT => Ok(Self::Float(f32::from_bits(wire::read_u32(input)?))),
            Self::TAG_DOUBLE => Ok(Self::Double(f64::from_bits(wire::read_u64(input)?))),
            Self::TAG_STRING => Ok(Self::String(wire::read_str(input)?)),
            Self::TAG_BYTE_ARRAY => {
                let len = read_seq_len(input)?;
                Ok(Self::ByteArray(wire::read_bytes(input, len)?))
            }
            Self::TAG_INT_ARRAY => {
                let len = read_seq_len(input)?;
                let mut items = Vec::with_capacity(len.min(4096));
                for _ in 0..len {
                    items.push(wire::read_u32(input)? as i32);
                }
                Ok(Self::IntArray(items))
            }
            Self::TAG_LIST => {
                let len = read_seq_len(input)?;
                let mut items = Vec::with_capacity(len.min(4096));
                for _ in 0..len {
                    items.push(Self::read(input, depth + 1)?);
                }
                Ok(Self::List(items))
            }
            Self::TAG_COMPOUND => Ok(Self::Compound(Compound::read_at_depth(input, depth + 1)?)),
            other => Err(MatterError::CorruptData(format!(
                "unknown compound value tag {other}"
            ))),
        }
    }
}

fn read_seq_len(input: &mut dyn Read) -> MatterResult<usize> {
    let len = wire::read_varint(input)?;
    if len > MAX_SEQ_LEN {
        return Err(MatterError::CorruptData(format!(
            "sequence length {len} exceeds limit"
        )));
    }
    Ok(len as usize)
}

/// A string-keyed tree of typed metadata values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Compound {
    entries: BTreeMap<String, Value>,
}

impl Compound {
    /// Creates an empty compound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one if the key was bound.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Looks up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Removes a value by key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the compound has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn write(&self, out: &mut dyn Write) -> MatterResult<()> {
        wire::write_varint(out, self.entries.len() as u64)?;
        for (key, value) in &self.entries {
            wire::write_str(out, key)?;
            value.write(out)?;
        }
        Ok(())
    }

    fn read_at_depth(input: &mut dyn Read, depth: u32) -> MatterResult<Self> {
        if depth > MAX_DEPTH {
            return Err(MatterError::CorruptData(
                "compound nesting exceeds depth limit".into(),
            ));
        }
        let len = read_seq_len(input)?;
        let mut entries = BTreeMap::new();
        for _ in 0..len {
            let key = wire::read_str(input)?;
            let value = Value::read(input, depth)?;
            entries.insert(key, value);
        }
        Ok(Self { entries })
    }
}

impl MatterValue for Compound {
    fn encode(&self, out: &mut dyn Write) -> MatterResult<()> {
        self.write(out)
    }

    fn decode(input: &mut dyn Read) -> MatterResult<Self> {
        Self::read_at_depth(input, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Compound {
        let mut inner = Compound::new();
        inner.insert("power", Value::Byte(15));
        let mut c = Compound::new();
        c.insert("name", Value::String("marker".into()));
        c.insert("pos", Value::IntArray(vec![1, -2, 3]));
        c.insert("weight", Value::Double(0.25));
        c.insert(
            "tags",
            Value::List(vec![Value::String("a".into()), Value::String("b".into())]),
        );
        c.insert("inner", Value::Compound(inner));
        c
    }

    #[test]
    fn test_compound_roundtrip() {
        let compound = sample();
        let mut buf = Vec::new();
        compound.encode(&mut buf).expect("encode failed");
        let decoded = Compound::decode(&mut buf.as_slice()).expect("decode failed");
        assert_eq!(decoded, compound);
    }

    #[test]
    fn test_structural_equality_ignores_insertion_order() {
        let mut a = Compound::new();
        a.insert("x", Value::Int(1));
        a.insert("y", Value::Int(2));
        let mut b = Compound::new();
        b.insert("y", Value::Int(2));
        b.insert("x", Value::Int(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_float_bit_equality() {
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_ne!(Value::Double(0.0), Value::Double(-0.0));
    }

    #[test]
    fn test_unknown_tag_is_corrupt() {
        // One entry whose value carries tag byte 200.
        let mut buf = Vec::new();
        wire::write_varint(&mut buf, 1).expect("write failed");
        wire::write_str(&mut buf, "k").expect("write failed");
        wire::write_u8(&mut buf, 200).expect("write failed");
        assert!(matches!(
            Compound::decode(&mut buf.as_slice()),
            Err(MatterError::CorruptData(_))
        ));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let mut value = Value::Compound(Compound::new());
        for _ in 0..100 {
            let mut c = Compound::new();
            c.insert("n", value);
            value = Value::Compound(c);
        }
        let mut root = Compound::new();
        root.insert("n", value);
        let mut buf = Vec::new();
        root.encode(&mut buf).expect("encode failed");
        assert!(matches!(
            Compound::decode(&mut buf.as_slice()),
            Err(MatterError::CorruptData(_))
        ));
    }
}
