//! Persisted matter file wrapper.
//!
//! Wraps the container wire format in a versioned, compressed envelope
//! for storage at rest: a bincode header identifying the format, then the
//! lz4-compressed container body. Region-archive packing lives elsewhere;
//! this layer only produces and consumes one container's bytes.

use crate::container::{MatterContainer, ReadMode};
use crate::error::{MatterError, MatterResult};
use crate::registry::SliceRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strata_common::{MagicBytes, SchemaVersion};

/// Header for a persisted matter file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MatterFileHeader {
    magic: [u8; 4],
    version: SchemaVersion,
}

impl MatterFileHeader {
    fn new() -> Self {
        Self {
            magic: MagicBytes::MATTER.0,
            version: SchemaVersion::MATTER_FILE,
        }
    }

    fn validate(&self) -> MatterResult<()> {
        if self.magic != MagicBytes::MATTER.0 {
            return Err(MatterError::CorruptData("invalid matter file magic".into()));
        }
        if !SchemaVersion::MATTER_FILE.can_read(&self.version) {
            return Err(MatterError::VersionMismatch {
                expected: SchemaVersion::MATTER_FILE.to_string(),
                actual: self.version.to_string(),
            });
        }
        Ok(())
    }
}

/// Serializes a container into a compressed, versioned byte envelope.
pub fn save_to_bytes(container: &MatterContainer) -> MatterResult<Vec<u8>> {
    let header_bytes = bincode::serialize(&MatterFileHeader::new())
        .map_err(|e| MatterError::Serialization(e.to_string()))?;

    let body = container.to_bytes()?;
    let compressed = lz4_flex::compress_prepend_size(&body);

    let mut result = Vec::with_capacity(4 + header_bytes.len() + compressed.len());
    result.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&compressed);
    Ok(result)
}

/// Deserializes a container from a compressed envelope produced by
/// [`save_to_bytes`].
pub fn load_from_bytes(
    registry: Arc<SliceRegistry>,
    bytes: &[u8],
    mode: ReadMode,
) -> MatterResult<MatterContainer> {
    if bytes.len() < 4 {
        return Err(MatterError::CorruptData("matter file too short".into()));
    }

    let header_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if bytes.len() < 4 + header_len {
        return Err(MatterError::CorruptData(
            "matter file header length mismatch".into(),
        ));
    }

    let header: MatterFileHeader = bincode::deserialize(&bytes[4..4 + header_len])
        .map_err(|e| MatterError::CorruptData(e.to_string()))?;
    header.validate()?;

    let body = lz4_flex::decompress_size_prepended(&bytes[4 + header_len..])
        .map_err(|e| MatterError::Compression(e.to_string()))?;

    MatterContainer::from_bytes(registry, &body, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{BlockState, BLOCK_TAG};
    use strata_common::VoxelPos;

    #[test]
    fn test_persisted_roundtrip() {
        let registry = Arc::new(SliceRegistry::with_defaults());
        let mut container =
            MatterContainer::new(Arc::clone(&registry), 8, 8, 8).expect("create failed");
        for x in 0..8 {
            container
                .set(BLOCK_TAG, VoxelPos::new(x, 0, 0), BlockState::from("stone"))
                .expect("set failed");
        }

        let bytes = save_to_bytes(&container).expect("save failed");
        let loaded = load_from_bytes(registry, &bytes, ReadMode::Lenient).expect("load failed");
        assert_eq!(
            loaded
                .get::<BlockState>(BLOCK_TAG, VoxelPos::new(3, 0, 0))
                .expect("get failed"),
            Some(&BlockState::from("stone"))
        );
    }

    #[test]
    fn test_bad_magic_rejected() {
        let registry = Arc::new(SliceRegistry::with_defaults());
        let container =
            MatterContainer::new(Arc::clone(&registry), 2, 2, 2).expect("create failed");
        let mut bytes = save_to_bytes(&container).expect("save failed");
        // Header magic starts right after the u32 length prefix.
        bytes[4] = b'X';
        assert!(matches!(
            load_from_bytes(registry, &bytes, ReadMode::Lenient),
            Err(MatterError::CorruptData(_))
        ));
    }

    #[test]
    fn test_truncated_file_rejected() {
        let registry = Arc::new(SliceRegistry::with_defaults());
        assert!(matches!(
            load_from_bytes(registry, &[1, 2], ReadMode::Lenient),
            Err(MatterError::CorruptData(_))
        ));
    }
}
