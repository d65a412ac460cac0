//! Built-in attribute kinds and their default registrations.
//!
//! New kinds are added by implementing [`MatterValue`] and registering a
//! tag; nothing in the container needs to change.

use crate::compound::Compound;
use crate::error::{MatterError, MatterResult};
use crate::palette::{GlobalPalette, PaletteMode};
use crate::registry::{SliceKind, SliceRegistry};
use crate::value::MatterValue;
use crate::wire;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::sync::Arc;
use strata_common::Identifier;

/// Tag for the block state layer.
pub const BLOCK_TAG: &str = "block";
/// Tag for the biome id layer.
pub const BIOME_TAG: &str = "biome";
/// Tag for the opaque identifier layer.
pub const IDENTIFIER_TAG: &str = "id";
/// Tag for the compound metadata layer.
pub const COMPOUND_TAG: &str = "compound";
/// Tag for the structure piece reference layer.
pub const JIGSAW_TAG: &str = "jigsaw";

/// A block state, named like `stone` or `oak_stairs[facing=east]`.
///
/// The canonical empty representative is [`BlockState::AIR`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockState(String);

impl BlockState {
    /// The canonical empty block state.
    pub const AIR: &'static str = "air";

    /// Creates a block state from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The state's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns whether this is the canonical empty state.
    #[must_use]
    pub fn is_air(&self) -> bool {
        self.0 == Self::AIR
    }
}

impl From<&str> for BlockState {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl std::fmt::Display for BlockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl MatterValue for BlockState {
    fn encode(&self, out: &mut dyn Write) -> MatterResult<()> {
        wire::write_str(out, &self.0)
    }

    fn decode(input: &mut dyn Read) -> MatterResult<Self> {
        Ok(Self(wire::read_str(input)?))
    }
}

/// A biome id, resolved against an external biome table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BiomeId(u16);

impl BiomeId {
    /// The canonical empty biome (id 0).
    pub const VOID: Self = Self(0);

    /// Creates a biome id from a raw value.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl MatterValue for BiomeId {
    fn encode(&self, out: &mut dyn Write) -> MatterResult<()> {
        wire::write_u16(out, self.0)
    }

    fn decode(input: &mut dyn Read) -> MatterResult<Self> {
        Ok(Self(wire::read_u16(input)?))
    }
}

impl MatterValue for Identifier {
    fn encode(&self, out: &mut dyn Write) -> MatterResult<()> {
        wire::write_str(out, &self.to_string())
    }

    fn decode(input: &mut dyn Read) -> MatterResult<Self> {
        let raw = wire::read_str(input)?;
        Identifier::parse(&raw)
            .map_err(|e| MatterError::CorruptData(format!("bad identifier: {e}")))
    }
}

/// A reference to a structure piece by its load key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JigsawPiece(String);

impl JigsawPiece {
    /// Creates a reference from a load key.
    #[must_use]
    pub fn new(load_key: impl Into<String>) -> Self {
        Self(load_key.into())
    }

    /// The load key resolving this piece.
    #[must_use]
    pub fn load_key(&self) -> &str {
        &self.0
    }
}

impl MatterValue for JigsawPiece {
    fn encode(&self, out: &mut dyn Write) -> MatterResult<()> {
        wire::write_str(out, &self.0)
    }

    fn decode(input: &mut dyn Read) -> MatterResult<Self> {
        Ok(Self(wire::read_str(input)?))
    }
}

impl SliceRegistry {
    /// Builds a registry with the built-in attribute kinds bound to their
    /// default tags.
    ///
    /// Block states and biome ids encode densely against fresh open
    /// vocabularies; identifiers, compounds, and structure references
    /// encode sparsely. Each call creates independent palettes, so two
    /// registries never share mutable state.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        // The tags below are distinct constants, so registration cannot
        // collide; a failure here is a programmer error.
        registry
            .register(
                BLOCK_TAG,
                SliceKind::Dense {
                    palette: Arc::new(GlobalPalette::new(
                        BlockState::new(BlockState::AIR),
                        PaletteMode::Open,
                    )),
                },
            )
            .expect("builtin tag registration");
        registry
            .register(
                BIOME_TAG,
                SliceKind::Dense {
                    palette: Arc::new(GlobalPalette::new(BiomeId::VOID, PaletteMode::Open)),
                },
            )
            .expect("builtin tag registration");
        registry
            .register::<Identifier>(IDENTIFIER_TAG, SliceKind::Sparse)
            .expect("builtin tag registration");
        registry
            .register::<Compound>(COMPOUND_TAG, SliceKind::Sparse)
            .expect("builtin tag registration");
        registry
            .register::<JigsawPiece>(JIGSAW_TAG, SliceKind::Sparse)
            .expect("builtin tag registration");
        registry
    }
}
