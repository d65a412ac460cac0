//! The per-attribute-type value contract.

use crate::error::MatterResult;
use std::fmt::Debug;
use std::hash::Hash;
use std::io::{Read, Write};

/// A value storable in a matter slice.
///
/// Implementations provide the node codec for their type: `encode` and
/// `decode` must form a pure, deterministic bijection over the type's
/// serializable domain, with no dependence on container or global state.
///
/// The `Eq + Hash` bounds drive palette deduplication; they must be
/// structural, so two separately built values with identical contents
/// always map to the same palette id.
pub trait MatterValue: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Encodes this value to the stream.
    fn encode(&self, out: &mut dyn Write) -> MatterResult<()>;

    /// Decodes one value from the stream.
    fn decode(input: &mut dyn Read) -> MatterResult<Self>
    where
        Self: Sized;
}
