//! The matter container: a fixed-extent aggregate of attribute slices.

use crate::error::{MatterError, MatterResult};
use crate::registry::SliceRegistry;
use crate::slice::{ErasedSlice, Slice};
use crate::value::MatterValue;
use crate::wire;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::Arc;
use strata_common::{Extent, VoxelPos};
use tracing::{debug, warn};

/// Current container wire format version.
pub const MATTER_FORMAT_VERSION: u8 = 1;

/// How unknown slice tags are treated during deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Skip slice records with unregistered tags, using their declared
    /// body length, and keep reading. Skips are logged.
    #[default]
    Lenient,
    /// Fail the whole load on the first unregistered tag.
    Strict,
}

/// A bounded 3D region aggregating all allocated attribute slices for one
/// storage unit.
///
/// Containers hold no internal locks. Concurrent reads of an unmutated
/// container are safe; one writer at a time is the caller's contract.
#[derive(Debug)]
pub struct MatterContainer {
    extent: Extent,
    registry: Arc<SliceRegistry>,
    // Tag-sorted so serialization is byte-reproducible for equal content.
    slices: BTreeMap<String, Box<dyn ErasedSlice>>,
}

impl MatterContainer {
    /// Creates an empty container with the given dimensions.
    pub fn new(
        registry: Arc<SliceRegistry>,
        width: u16,
        height: u16,
        depth: u16,
    ) -> MatterResult<Self> {
        let extent = Extent::new(width, height, depth);
        if extent.is_degenerate() {
            return Err(MatterError::InvalidDimension {
                width,
                height,
                depth,
            });
        }
        Ok(Self {
            extent,
            registry,
            slices: BTreeMap::new(),
        })
    }

    /// The container's fixed extent.
    #[must_use]
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// The registry this container allocates and decodes slices through.
    #[must_use]
    pub fn registry(&self) -> &Arc<SliceRegistry> {
        &self.registry
    }

    /// Returns whether a slice has been allocated for `tag`.
    #[must_use]
    pub fn has_slice(&self, tag: &str) -> bool {
        self.slices.contains_key(tag)
    }

    /// Tags of allocated slices, in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    /// Typed read access to a slice; `None` if never allocated.
    #[must_use]
    pub fn slice<T: MatterValue>(&self, tag: &str) -> Option<&Slice<T>> {
        self.slices
            .get(tag)
            .and_then(|s| s.as_any().downcast_ref::<Slice<T>>())
    }

    /// Typed mutable access to a slice; `None` if never allocated.
    pub fn slice_mut<T: MatterValue>(&mut self, tag: &str) -> Option<&mut Slice<T>> {
        self.slices
            .get_mut(tag)
            .and_then(|s| s.as_any_mut().downcast_mut::<Slice<T>>())
    }

    /// Typed access to a slice, allocating it through the registry on
    /// first use.
    pub fn slice_or_create<T: MatterValue>(&mut self, tag: &str) -> MatterResult<&mut Slice<T>> {
        if !self.slices.contains_key(tag) {
            let slice = self.registry.create(tag, self.extent)?;
            self.slices.insert(tag.to_owned(), slice);
        }
        let erased = self
            .slices
            .get_mut(tag)
            .ok_or_else(|| MatterError::UnknownTag(tag.to_owned()))?;
        erased
            .as_any_mut()
            .downcast_mut::<Slice<T>>()
            .ok_or_else(|| MatterError::SliceTypeMismatch(tag.to_owned()))
    }

    fn check_bounds(&self, pos: VoxelPos) -> MatterResult<()> {
        if self.extent.contains(pos) {
            Ok(())
        } else {
            Err(MatterError::OutOfBounds {
                x: pos.x,
                y: pos.y,
                z: pos.z,
                width: self.extent.width,
                height: self.extent.height,
                depth: self.extent.depth,
            })
        }
    }

    /// Reads the value at a position, without allocating the slice.
    pub fn get<T: MatterValue>(&self, tag: &str, pos: VoxelPos) -> MatterResult<Option<&T>> {
        self.check_bounds(pos)?;
        match self.slices.get(tag) {
            None => Ok(None),
            Some(erased) => erased
                .as_any()
                .downcast_ref::<Slice<T>>()
                .ok_or_else(|| MatterError::SliceTypeMismatch(tag.to_owned()))?
                .get(pos),
        }
    }

    /// Writes a value at a position, allocating the slice on first write.
    pub fn set<T: MatterValue>(&mut self, tag: &str, pos: VoxelPos, value: T) -> MatterResult<()> {
        self.check_bounds(pos)?;
        self.slice_or_create(tag)?.set(pos, value)?;
        Ok(())
    }

    /// Removes the value at a position, returning it.
    pub fn clear<T: MatterValue>(&mut self, tag: &str, pos: VoxelPos) -> MatterResult<Option<T>> {
        self.check_bounds(pos)?;
        match self.slice_mut::<T>(tag) {
            None => Ok(None),
            Some(slice) => slice.clear(pos),
        }
    }

    /// Serializes the container to a stream.
    ///
    /// Only slices with at least one present cell are written, in tag
    /// order, so identical logical content always yields identical bytes.
    pub fn write_to(&self, out: &mut impl Write) -> MatterResult<()> {
        let written: Vec<(&str, &dyn ErasedSlice)> = self
            .slices
            .iter()
            .filter(|(_, slice)| slice.present_count() > 0)
            .map(|(tag, slice)| (tag.as_str(), slice.as_ref()))
            .collect();
        let count = u16::try_from(written.len())
            .map_err(|_| MatterError::Serialization("more than 65535 slices".into()))?;

        wire::write_u16(out, self.extent.width)?;
        wire::write_u16(out, self.extent.height)?;
        wire::write_u16(out, self.extent.depth)?;
        wire::write_u8(out, MATTER_FORMAT_VERSION)?;
        wire::write_u16(out, count)?;

        for (tag, slice) in written {
            let mut body = Vec::new();
            slice.encode_body(&mut body)?;
            let body_len = u32::try_from(body.len())
                .map_err(|_| MatterError::Serialization(format!("slice {tag:?} body too large")))?;
            wire::write_str(out, tag)?;
            wire::write_u32(out, body_len)?;
            out.write_all(&body)?;
        }

        debug!(
            slices = count,
            width = self.extent.width,
            height = self.extent.height,
            depth = self.extent.depth,
            "encoded matter container"
        );
        Ok(())
    }

    /// Serializes the container to a byte vector.
    pub fn to_bytes(&self) -> MatterResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Deserializes a container from a stream.
    ///
    /// Decode failures abort the whole load; the container never
    /// substitutes defaults for corrupt input.
    pub fn read_from(
        registry: Arc<SliceRegistry>,
        input: &mut impl Read,
        mode: ReadMode,
    ) -> MatterResult<Self> {
        let width = wire::read_u16(input)?;
        let height = wire::read_u16(input)?;
        let depth = wire::read_u16(input)?;
        let version = wire::read_u8(input)?;
        if version != MATTER_FORMAT_VERSION {
            return Err(MatterError::VersionMismatch {
                expected: MATTER_FORMAT_VERSION.to_string(),
                actual: version.to_string(),
            });
        }
        let count = wire::read_u16(input)?;
        let mut container = Self::new(registry, width, height, depth)?;

        for _ in 0..count {
            let tag = wire::read_str(input)?;
            let body_len = wire::read_u32(input)? as usize;
            if container.slices.contains_key(&tag) {
                return Err(MatterError::CorruptData(format!(
                    "duplicate slice record for tag {tag:?}"
                )));
            }
            if !container.registry.contains(&tag) {
                match mode {
                    ReadMode::Strict => return Err(MatterError::UnknownTag(tag)),
                    ReadMode::Lenient => {
                        warn!(tag = %tag, body_len, "skipping slice with unknown tag");
                        wire::read_bytes(input, body_len)?;
                        continue;
                    }
                }
            }
            let body = wire::read_bytes(input, body_len)?;
            let mut cursor = body.as_slice();
            let slice = container.registry.decode(&tag, container.extent, &mut cursor)?;
            if !cursor.is_empty() {
                return Err(MatterError::CorruptData(format!(
                    "slice {tag:?} body has {} trailing bytes",
                    cursor.len()
                )));
            }
            container.slices.insert(tag, slice);
        }

        debug!(
            slices = count,
            width, height, depth, "decoded matter container"
        );
        Ok(container)
    }

    /// Deserializes a container from a byte buffer.
    pub fn from_bytes(
        registry: Arc<SliceRegistry>,
        bytes: &[u8],
        mode: ReadMode,
    ) -> MatterResult<Self> {
        Self::read_from(registry, &mut &bytes[..], mode)
    }
}
