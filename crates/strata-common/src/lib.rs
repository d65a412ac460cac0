//! # Strata Common
//!
//! Common types, utilities, and shared abstractions for Project Strata.
//!
//! This crate provides foundational types used across all Strata subsystems:
//! - Coordinate and extent types for volumetric containers
//! - Namespaced identifiers
//! - Version information for schemas

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;
