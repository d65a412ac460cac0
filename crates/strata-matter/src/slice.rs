//! One attribute layer covering the full extent of a container.
//!
//! A [`Slice`] stores an `Option<T>` per voxel; `None` means "never set"
//! and is distinct from any legitimate value of `T`, including a type's
//! own empty representative.
//!
//! The wire body comes in two shapes, selected by the attribute kind at
//! registration time rather than by runtime occupancy:
//!
//! - **Dense** (kinds with a global palette, e.g. block states): an
//!   inline table of the distinct values present, then one bit-packed
//!   table index per voxel. Index 0 is reserved for absent cells; value
//!   ids start at 1.
//! - **Sparse** (kinds without one, e.g. structure references): a record
//!   count followed by `(x, y, z, value)` records; unlisted voxels are
//!   absent.

use crate::bitpack::{bit_width, packed_len, BitReader, BitWriter};
use crate::error::{MatterError, MatterResult};
use crate::palette::{GlobalPalette, LocalPalette};
use crate::value::MatterValue;
use crate::wire;
use std::any::Any;
use std::fmt::Debug;
use std::io::{Read, Write};
use std::sync::Arc;
use strata_common::{Extent, VoxelPos};

/// One attribute layer of a matter container.
#[derive(Debug)]
pub struct Slice<T: MatterValue> {
    extent: Extent,
    cells: Vec<Option<T>>,
    palette: Option<Arc<GlobalPalette<T>>>,
    occupied: usize,
}

impl<T: MatterValue> Slice<T> {
    /// Creates an empty slice covering `extent`.
    ///
    /// A `Some` palette selects the dense wire encoding and canonicalizes
    /// written values through the shared table; `None` selects the sparse
    /// encoding with directly node-encoded values.
    #[must_use]
    pub fn new(extent: Extent, palette: Option<Arc<GlobalPalette<T>>>) -> Self {
        Self {
            extent,
            cells: vec![None; extent.volume()],
            palette,
            occupied: 0,
        }
    }

    /// The extent this slice covers.
    #[must_use]
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// The shared palette, if this kind declares one.
    #[must_use]
    pub fn palette(&self) -> Option<&Arc<GlobalPalette<T>>> {
        self.palette.as_ref()
    }

    /// Number of voxels holding a value.
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.occupied
    }

    fn index_of(&self, pos: VoxelPos) -> MatterResult<usize> {
        if !self.extent.contains(pos) {
            return Err(MatterError::OutOfBounds {
                x: pos.x,
                y: pos.y,
                z: pos.z,
                width: self.extent.width,
                height: self.extent.height,
                depth: self.extent.depth,
            });
        }
        Ok(self.extent.index_of(pos))
    }

    /// Reads the value at `pos`.
    pub fn get(&self, pos: VoxelPos) -> MatterResult<Option<&T>> {
        let index = self.index_of(pos)?;
        Ok(self.cells[index].as_ref())
    }

    /// Writes a value at `pos`, returning the previous one.
    ///
    /// Kinds with a closed global vocabulary reject values outside it
    /// here, before anything reaches storage.
    pub fn set(&mut self, pos: VoxelPos, value: T) -> MatterResult<Option<T>> {
        let index = self.index_of(pos)?;
        let value = match &self.palette {
            Some(palette) => palette.canonicalize(value)?,
            None => value,
        };
        let previous = self.cells[index].replace(value);
        if previous.is_none() {
            self.occupied += 1;
        }
        Ok(previous)
    }

    /// Removes the value at `pos`, returning it.
    pub fn clear(&mut self, pos: VoxelPos) -> MatterResult<Option<T>> {
        let index = self.index_of(pos)?;
        let previous = self.cells[index].take();
        if previous.is_some() {
            self.occupied -= 1;
        }
        Ok(previous)
    }

    /// Iterates present cells in linear storage order.
    pub fn iter_present(&self) -> impl Iterator<Item = (VoxelPos, &T)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.as_ref().map(|v| (self.extent.pos_at(i), v)))
    }

    /// Encodes the slice body (without tag or length framing).
    pub fn encode_body(&self, out: &mut dyn Write) -> MatterResult<()> {
        if self.palette.is_some() {
            self.encode_dense(out)
        } else {
            self.encode_sparse(out)
        }
    }

    fn encode_dense(&self, out: &mut dyn Write) -> MatterResult<()> {
        let mut table = LocalPalette::new();
        let mut indices = Vec::with_capacity(self.cells.len());
        for cell in &self.cells {
            indices.push(match cell {
                None => 0,
                Some(value) => table.id_for(value) + 1,
            });
        }

        wire::write_varint(out, table.len() as u64)?;
        for value in table.values() {
            value.encode(out)?;
        }

        let bits = bit_width(table.len() as u64 + 1);
        let mut writer = BitWriter::new(bits);
        for index in indices {
            writer.push(index);
        }
        out.write_all(&writer.finish())?;
        Ok(())
    }

    fn encode_sparse(&self, out: &mut dyn Write) -> MatterResult<()> {
        wire::write_varint(out, self.occupied as u64)?;
        for (pos, value) in self.iter_present() {
            wire::write_u16(out, pos.x)?;
            wire::write_u16(out, pos.y)?;
            wire::write_u16(out, pos.z)?;
            value.encode(out)?;
        }
        Ok(())
    }

    /// Decodes a slice body previously produced by [`Slice::encode_body`]
    /// for the same attribute kind and extent.
    pub fn decode_body(
        extent: Extent,
        palette: Option<Arc<GlobalPalette<T>>>,
        input: &mut dyn Read,
    ) -> MatterResult<Self> {
        if palette.is_some() {
            Self::decode_dense(extent, palette, input)
        } else {
            Self::decode_sparse(extent, input)
        }
    }

    fn decode_dense(
        extent: Extent,
        palette: Option<Arc<GlobalPalette<T>>>,
        input: &mut dyn Read,
    ) -> MatterResult<Self> {
        let volume = extent.volume();
        let table_len = wire::read_varint(input)?;
        if table_len > volume as u64 {
            return Err(MatterError::CorruptData(format!(
                "palette table of {table_len} entries exceeds volume {volume}"
            )));
        }
        let mut values = Vec::with_capacity(table_len as usize);
        for _ in 0..table_len {
            let value = T::decode(input)?;
            // Intern through the shared table so equal values decoded from
            // different containers share one canonical instance.
            let value = match &palette {
                Some(p) => p.canonicalize(value)?,
                None => value,
            };
            values.push(value);
        }

        let bits = bit_width(table_len + 1);
        let packed = wire::read_bytes(input, packed_len(volume, bits))?;
        let mut reader = BitReader::new(&packed, bits);
        let mut cells = Vec::with_capacity(volume);
        let mut occupied = 0;
        for _ in 0..volume {
            let index = reader.read()?;
            if index == 0 {
                cells.push(None);
            } else if (index as usize) <= values.len() {
                cells.push(Some(values[index as usize - 1].clone()));
                occupied += 1;
            } else {
                return Err(MatterError::CorruptData(format!(
                    "palette index {index} exceeds table of {} entries",
                    values.len()
                )));
            }
        }

        Ok(Self {
            extent,
            cells,
            palette,
            occupied,
        })
    }

    fn decode_sparse(extent: Extent, input: &mut dyn Read) -> MatterResult<Self> {
        let volume = extent.volume();
        let count = wire::read_varint(input)?;
        if count > volume as u64 {
            return Err(MatterError::CorruptData(format!(
                "{count} sparse records exceed volume {volume}"
            )));
        }
        let mut slice = Self::new(extent, None);
        for _ in 0..count {
            let pos = VoxelPos::new(
                wire::read_u16(input)?,
                wire::read_u16(input)?,
                wire::read_u16(input)?,
            );
            if !extent.contains(pos) {
                return Err(MatterError::CorruptData(format!(
                    "sparse record at ({}, {}, {}) is outside extent {}x{}x{}",
                    pos.x, pos.y, pos.z, extent.width, extent.height, extent.depth
                )));
            }
            let value = T::decode(input)?;
            if slice.set(pos, value)?.is_some() {
                return Err(MatterError::CorruptData(format!(
                    "duplicate sparse record at ({}, {}, {})",
                    pos.x, pos.y, pos.z
                )));
            }
        }
        Ok(slice)
    }
}

/// Type-erased slice, letting one container hold heterogeneous layers.
pub trait ErasedSlice: Any + Send + Sync + Debug {
    /// The extent the slice covers.
    fn extent(&self) -> Extent;

    /// Number of voxels holding a value.
    fn present_count(&self) -> usize;

    /// Encodes the slice body.
    fn encode_body(&self, out: &mut dyn Write) -> MatterResult<()>;

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: MatterValue> ErasedSlice for Slice<T> {
    fn extent(&self) -> Extent {
        self.extent
    }

    fn present_count(&self) -> usize {
        self.occupied
    }

    fn encode_body(&self, out: &mut dyn Write) -> MatterResult<()> {
        Slice::encode_body(self, out)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::BlockState;
    use crate::palette::PaletteMode;
    use strata_common::Identifier;

    fn block_palette() -> Arc<GlobalPalette<BlockState>> {
        Arc::new(GlobalPalette::new(
            BlockState::from("air"),
            PaletteMode::Open,
        ))
    }

    fn fill_pattern(slice: &mut Slice<BlockState>) {
        let extent = slice.extent();
        for y in 0..extent.height {
            for z in 0..extent.depth {
                for x in 0..extent.width {
                    if (x + y + z) % 3 == 0 {
                        let name = if x % 2 == 0 { "stone" } else { "dirt" };
                        slice
                            .set(VoxelPos::new(x, y, z), BlockState::from(name))
                            .expect("set failed");
                    }
                }
            }
        }
    }

    #[test]
    fn test_dense_roundtrip() {
        let extent = Extent::new(8, 4, 8);
        let palette = block_palette();
        let mut slice = Slice::new(extent, Some(Arc::clone(&palette)));
        fill_pattern(&mut slice);

        let mut buf = Vec::new();
        slice.encode_body(&mut buf).expect("encode failed");
        let decoded =
            Slice::decode_body(extent, Some(palette), &mut buf.as_slice()).expect("decode failed");

        assert_eq!(decoded.present_count(), slice.present_count());
        for (pos, value) in slice.iter_present() {
            assert_eq!(decoded.get(pos).expect("get failed"), Some(value));
        }
        assert_eq!(decoded.get(VoxelPos::new(1, 0, 0)).expect("get failed"), None);
    }

    #[test]
    fn test_sparse_roundtrip() {
        let extent = Extent::new(16, 16, 16);
        let mut slice: Slice<Identifier> = Slice::new(extent, None);
        slice
            .set(VoxelPos::new(0, 0, 0), Identifier::new("core", "marker"))
            .expect("set failed");
        slice
            .set(VoxelPos::new(15, 15, 15), Identifier::new("core", "anchor"))
            .expect("set failed");

        let mut buf = Vec::new();
        slice.encode_body(&mut buf).expect("encode failed");
        let decoded: Slice<Identifier> =
            Slice::decode_body(extent, None, &mut buf.as_slice()).expect("decode failed");

        assert_eq!(decoded.present_count(), 2);
        assert_eq!(
            decoded.get(VoxelPos::new(0, 0, 0)).expect("get failed"),
            Some(&Identifier::new("core", "marker"))
        );
        assert_eq!(decoded.get(VoxelPos::new(1, 0, 0)).expect("get failed"), None);
    }

    #[test]
    fn test_absent_distinct_from_empty_value() {
        let extent = Extent::new(2, 2, 2);
        let palette = block_palette();
        let mut slice = Slice::new(extent, Some(Arc::clone(&palette)));
        // Explicitly store the palette's own empty representative.
        slice
            .set(VoxelPos::new(0, 0, 0), BlockState::from("air"))
            .expect("set failed");

        let mut buf = Vec::new();
        slice.encode_body(&mut buf).expect("encode failed");
        let decoded =
            Slice::decode_body(extent, Some(palette), &mut buf.as_slice()).expect("decode failed");

        assert_eq!(
            decoded.get(VoxelPos::new(0, 0, 0)).expect("get failed"),
            Some(&BlockState::from("air"))
        );
        assert_eq!(decoded.get(VoxelPos::new(1, 0, 0)).expect("get failed"), None);
    }

    #[test]
    fn test_clear_restores_absence() {
        let extent = Extent::new(2, 2, 2);
        let mut slice: Slice<Identifier> = Slice::new(extent, None);
        let pos = VoxelPos::new(1, 1, 1);
        slice
            .set(pos, Identifier::new("core", "marker"))
            .expect("set failed");
        assert_eq!(slice.present_count(), 1);
        let removed = slice.clear(pos).expect("clear failed");
        assert_eq!(removed, Some(Identifier::new("core", "marker")));
        assert_eq!(slice.present_count(), 0);
        assert_eq!(slice.get(pos).expect("get failed"), None);
    }

    #[test]
    fn test_out_of_bounds_access() {
        let extent = Extent::new(4, 4, 4);
        let mut slice: Slice<Identifier> = Slice::new(extent, None);
        assert!(matches!(
            slice.get(VoxelPos::new(4, 0, 0)),
            Err(MatterError::OutOfBounds { x: 4, .. })
        ));
        assert!(matches!(
            slice.set(VoxelPos::new(0, 4, 0), Identifier::new("a", "b")),
            Err(MatterError::OutOfBounds { y: 4, .. })
        ));
        assert!(slice.get(VoxelPos::new(3, 3, 3)).is_ok());
    }

    #[test]
    fn test_corrupt_sparse_coordinate() {
        let extent = Extent::new(2, 2, 2);
        let mut buf = Vec::new();
        wire::write_varint(&mut buf, 1).expect("write failed");
        wire::write_u16(&mut buf, 9).expect("write failed");
        wire::write_u16(&mut buf, 0).expect("write failed");
        wire::write_u16(&mut buf, 0).expect("write failed");
        Identifier::new("a", "b").encode(&mut buf).expect("encode failed");

        let result: MatterResult<Slice<Identifier>> =
            Slice::decode_body(extent, None, &mut buf.as_slice());
        assert!(matches!(result, Err(MatterError::CorruptData(_))));
    }

    #[test]
    fn test_corrupt_dense_palette_index() {
        let extent = Extent::new(2, 1, 1);
        // Table length larger than the slice volume.
        let mut buf = Vec::new();
        wire::write_varint(&mut buf, 64).expect("write failed");
        let result = Slice::<BlockState>::decode_body(
            extent,
            Some(block_palette()),
            &mut buf.as_slice(),
        );
        assert!(matches!(result, Err(MatterError::CorruptData(_))));
    }

    #[test]
    fn test_closed_vocabulary_rejected_at_set() {
        let extent = Extent::new(2, 2, 2);
        let palette = Arc::new(GlobalPalette::with_values(
            BlockState::from("air"),
            [BlockState::from("stone")],
            PaletteMode::Closed,
        ));
        let mut slice = Slice::new(extent, Some(palette));
        assert!(slice
            .set(VoxelPos::new(0, 0, 0), BlockState::from("stone"))
            .is_ok());
        assert!(matches!(
            slice.set(VoxelPos::new(0, 0, 0), BlockState::from("lava")),
            Err(MatterError::UnknownPaletteValue(_))
        ));
    }
}
