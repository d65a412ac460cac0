//! # Strata Matter
//!
//! The matter container: a generic, multi-attribute volumetric store for
//! chunk-sized regions.
//!
//! This crate handles:
//! - Per-voxel attribute layers ("slices") over a fixed 3D extent
//! - Palette-based value deduplication, local and process-wide
//! - Dense bit-packed and sparse coordinate-keyed wire encodings
//! - A registry-driven, pluggable set of attribute kinds
//! - Compact, forward-compatible binary serialization
//!
//! What values get written is someone else's job: generation, placement,
//! and front-ends sit outside this crate and talk to it through typed
//! accessors.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod bitpack;
pub mod compound;
pub mod container;
pub mod error;
pub mod kinds;
pub mod palette;
pub mod persist;
pub mod registry;
pub mod slice;
pub mod value;
pub mod wire;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::compound::{Compound, Value};
    pub use crate::container::{MatterContainer, ReadMode, MATTER_FORMAT_VERSION};
    pub use crate::error::{MatterError, MatterResult};
    pub use crate::kinds::*;
    pub use crate::palette::{GlobalPalette, LocalPalette, PaletteMode};
    pub use crate::registry::{SliceKind, SliceRegistry};
    pub use crate::slice::Slice;
    pub use crate::value::MatterValue;
}

pub use prelude::*;
