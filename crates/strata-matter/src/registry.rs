//! Tag-to-slice-kind registry.
//!
//! Each attribute kind is bound to a stable string tag along with the
//! machinery to construct and decode slices of that kind. Registration
//! happens once at startup; the registry is then shared immutably (an
//! `Arc<SliceRegistry>` injected into every container), so tests can
//! substitute isolated registries instead of touching process globals.

use crate::error::{MatterError, MatterResult};
use crate::palette::GlobalPalette;
use crate::slice::{ErasedSlice, Slice};
use crate::value::MatterValue;
use ahash::AHashMap;
use std::io::Read;
use std::sync::Arc;
use strata_common::Extent;

/// How slices of one attribute kind are stored and encoded.
///
/// This declaration is the single switch selecting the wire encoding:
/// kinds with a shared vocabulary carry a global palette and encode
/// densely; kinds without one encode sparsely via their node codec. The
/// two are mutually exclusive per kind.
pub enum SliceKind<T: MatterValue> {
    /// Dense, bit-packed encoding backed by a shared vocabulary.
    Dense {
        /// The process-wide palette for this kind.
        palette: Arc<GlobalPalette<T>>,
    },
    /// Sparse coordinate-keyed encoding with directly encoded values.
    Sparse,
}

type CreateFn = dyn Fn(Extent) -> Box<dyn ErasedSlice> + Send + Sync;
type DecodeFn = dyn Fn(Extent, &mut dyn Read) -> MatterResult<Box<dyn ErasedSlice>> + Send + Sync;

struct Entry {
    create: Box<CreateFn>,
    decode: Box<DecodeFn>,
}

/// Maps slice tags to factories for the matching slice and codec.
#[derive(Default)]
pub struct SliceRegistry {
    entries: AHashMap<String, Entry>,
}

impl SliceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a tag to an attribute kind.
    ///
    /// Fails with [`MatterError::DuplicateTag`] if the tag is already
    /// bound; the first registration stays authoritative.
    pub fn register<T: MatterValue>(
        &mut self,
        tag: &str,
        kind: SliceKind<T>,
    ) -> MatterResult<()> {
        if self.entries.contains_key(tag) {
            return Err(MatterError::DuplicateTag(tag.to_owned()));
        }
        let palette = match kind {
            SliceKind::Dense { palette } => Some(palette),
            SliceKind::Sparse => None,
        };
        let create_palette = palette.clone();
        let entry = Entry {
            create: Box::new(move |extent| {
                Box::new(Slice::<T>::new(extent, create_palette.clone()))
            }),
            decode: Box::new(move |extent, input| {
                let slice = Slice::<T>::decode_body(extent, palette.clone(), input)?;
                Ok(Box::new(slice) as Box<dyn ErasedSlice>)
            }),
        };
        self.entries.insert(tag.to_owned(), entry);
        Ok(())
    }

    /// Returns whether a tag is registered.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Registered tags, in no particular order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Constructs an empty slice for a tag.
    pub fn create(&self, tag: &str, extent: Extent) -> MatterResult<Box<dyn ErasedSlice>> {
        let entry = self
            .entries
            .get(tag)
            .ok_or_else(|| MatterError::UnknownTag(tag.to_owned()))?;
        Ok((entry.create)(extent))
    }

    /// Decodes a slice body for a tag.
    pub fn decode(
        &self,
        tag: &str,
        extent: Extent,
        input: &mut dyn Read,
    ) -> MatterResult<Box<dyn ErasedSlice>> {
        let entry = self
            .entries
            .get(tag)
            .ok_or_else(|| MatterError::UnknownTag(tag.to_owned()))?;
        (entry.decode)(extent, input)
    }
}

impl std::fmt::Debug for SliceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&str> = self.tags().collect();
        tags.sort_unstable();
        f.debug_struct("SliceRegistry").field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::BlockState;
    use crate::palette::PaletteMode;
    use strata_common::Identifier;

    #[test]
    fn test_duplicate_tag_rejected() {
        let mut registry = SliceRegistry::new();
        registry
            .register::<Identifier>("id", SliceKind::Sparse)
            .expect("first registration failed");
        let err = registry
            .register::<BlockState>(
                "id",
                SliceKind::Dense {
                    palette: Arc::new(GlobalPalette::new(
                        BlockState::from("air"),
                        PaletteMode::Open,
                    )),
                },
            )
            .expect_err("second registration should fail");
        assert!(matches!(err, MatterError::DuplicateTag(tag) if tag == "id"));

        // First registration stays authoritative: creating still yields an
        // identifier slice.
        let slice = registry
            .create("id", Extent::new(2, 2, 2))
            .expect("create failed");
        assert!(slice.as_any().is::<crate::slice::Slice<Identifier>>());
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let registry = SliceRegistry::new();
        assert!(matches!(
            registry.create("nope", Extent::new(1, 1, 1)),
            Err(MatterError::UnknownTag(tag)) if tag == "nope"
        ));
    }
}
