//! Coordinate and extent types for volumetric containers.

use serde::{Deserialize, Serialize};

/// A voxel position local to one container (0-based on every axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoxelPos {
    /// X coordinate within the container
    pub x: u16,
    /// Y coordinate within the container
    pub y: u16,
    /// Z coordinate within the container
    pub z: u16,
}

impl VoxelPos {
    /// Creates a new voxel position.
    #[must_use]
    pub const fn new(x: u16, y: u16, z: u16) -> Self {
        Self { x, y, z }
    }
}

/// The fixed dimensions of a volumetric container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// Width (X axis)
    pub width: u16,
    /// Height (Y axis)
    pub height: u16,
    /// Depth (Z axis)
    pub depth: u16,
}

impl Extent {
    /// Creates a new extent.
    #[must_use]
    pub const fn new(width: u16, height: u16, depth: u16) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Returns whether any axis is zero-sized.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0 || self.depth == 0
    }

    /// Total number of voxels covered by this extent.
    #[must_use]
    pub const fn volume(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    /// Returns whether the position lies inside this extent.
    #[must_use]
    pub const fn contains(&self, pos: VoxelPos) -> bool {
        pos.x < self.width && pos.y < self.height && pos.z < self.depth
    }

    /// Converts a position to its linear storage index.
    ///
    /// The linearization is `x + z * width + y * width * depth`; it must
    /// stay consistent between write and read paths.
    #[must_use]
    pub const fn index_of(&self, pos: VoxelPos) -> usize {
        pos.x as usize
            + pos.z as usize * self.width as usize
            + pos.y as usize * self.width as usize * self.depth as usize
    }

    /// Converts a linear storage index back to a position.
    #[must_use]
    pub const fn pos_at(&self, index: usize) -> VoxelPos {
        let w = self.width as usize;
        let d = self.depth as usize;
        VoxelPos {
            x: (index % w) as u16,
            z: ((index / w) % d) as u16,
            y: (index / (w * d)) as u16,
        }
    }
}
