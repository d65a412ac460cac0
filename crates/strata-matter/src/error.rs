//! Error types for matter container operations.

use thiserror::Error;

/// Matter container errors.
#[derive(Debug, Error)]
pub enum MatterError {
    /// Container constructed with a zero-sized axis
    #[error("invalid dimensions {width}x{height}x{depth}: all axes must be non-zero")]
    InvalidDimension {
        /// Width (X axis)
        width: u16,
        /// Height (Y axis)
        height: u16,
        /// Depth (Z axis)
        depth: u16,
    },

    /// Coordinate access outside the container extent
    #[error("position ({x}, {y}, {z}) is outside extent {width}x{height}x{depth}")]
    OutOfBounds {
        /// X coordinate
        x: u16,
        /// Y coordinate
        y: u16,
        /// Z coordinate
        z: u16,
        /// Container width
        width: u16,
        /// Container height
        height: u16,
        /// Container depth
        depth: u16,
    },

    /// Slice tag not present in the registry
    #[error("unknown slice tag {0:?}")]
    UnknownTag(String),

    /// Slice tag registered twice
    #[error("slice tag {0:?} is already registered")]
    DuplicateTag(String),

    /// Typed slice access with a value type other than the registered one
    #[error("slice tag {0:?} holds a different value type")]
    SliceTypeMismatch(String),

    /// Malformed or out-of-range encoded data
    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// Palette lookup with an id past the end of the table
    #[error("palette id {id} out of range (palette has {len} entries)")]
    PaletteIdOutOfRange {
        /// Requested id
        id: u32,
        /// Palette size
        len: u32,
    },

    /// Value missing from a closed palette vocabulary
    #[error("value {0} is not part of the closed palette vocabulary")]
    UnknownPaletteValue(String),

    /// Format version this build cannot read
    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version
        actual: String,
    },

    /// Serialization failed
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Compression or decompression failed
    #[error("compression failed: {0}")]
    Compression(String),

    /// IO error from the underlying stream
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for matter operations.
pub type MatterResult<T> = Result<T, MatterError>;
