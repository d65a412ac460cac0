//! Value-to-id palettes for attribute deduplication.
//!
//! Two flavors exist. A [`LocalPalette`] is built per slice from the values
//! actually present and is embedded in the slice's wire body. A
//! [`GlobalPalette`] is a process-wide shared vocabulary for attribute
//! kinds whose values repeat across many containers; it canonicalizes
//! decoded values so equal values share one table entry everywhere.

use crate::error::{MatterError, MatterResult};
use crate::value::MatterValue;
use ahash::AHashMap;
use parking_lot::RwLock;

/// A per-slice palette with insertion-order ids starting at 0.
#[derive(Debug, Clone)]
pub struct LocalPalette<T> {
    values: Vec<T>,
    lookup: AHashMap<T, u32>,
}

impl<T: MatterValue> LocalPalette<T> {
    /// Creates an empty palette.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            lookup: AHashMap::new(),
        }
    }

    /// Rebuilds a palette from a decoded value table.
    #[must_use]
    pub fn from_values(values: Vec<T>) -> Self {
        let mut palette = Self::new();
        for value in values {
            palette.id_for(&value);
        }
        palette
    }

    /// Returns the id for a value, inserting it on first occurrence.
    pub fn id_for(&mut self, value: &T) -> u32 {
        if let Some(&id) = self.lookup.get(value) {
            return id;
        }
        let id = self.values.len() as u32;
        self.values.push(value.clone());
        self.lookup.insert(value.clone(), id);
        id
    }

    /// Returns the value for an id.
    pub fn value_for(&self, id: u32) -> MatterResult<&T> {
        self.values
            .get(id as usize)
            .ok_or(MatterError::PaletteIdOutOfRange {
                id,
                len: self.values.len() as u32,
            })
    }

    /// Number of distinct values in the palette.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the palette is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values in id order.
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }
}

impl<T: MatterValue> Default for LocalPalette<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a global palette accepts values outside its seeded vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteMode {
    /// Unknown values are appended to the shared table.
    Open,
    /// Unknown values fail with [`MatterError::UnknownPaletteValue`].
    Closed,
}

#[derive(Debug)]
struct PaletteTable<T> {
    values: Vec<T>,
    lookup: AHashMap<T, u32>,
}

/// A process-wide shared vocabulary for one attribute kind.
///
/// The table is seeded with the kind's canonical "empty" representative at
/// id 0 and shared between every container of that kind, typically behind
/// an `Arc`. Mutation is internally locked; consistency across bulk
/// operations is still the caller's responsibility.
#[derive(Debug)]
pub struct GlobalPalette<T> {
    mode: PaletteMode,
    table: RwLock<PaletteTable<T>>,
}

impl<T: MatterValue> GlobalPalette<T> {
    /// Creates a palette seeded with the canonical empty representative.
    #[must_use]
    pub fn new(empty: T, mode: PaletteMode) -> Self {
        Self::with_values(empty, std::iter::empty(), mode)
    }

    /// Creates a palette seeded with the empty representative plus an
    /// initial vocabulary.
    #[must_use]
    pub fn with_values(empty: T, vocabulary: impl IntoIterator<Item = T>, mode: PaletteMode) -> Self {
        let mut table = PaletteTable {
            values: Vec::new(),
            lookup: AHashMap::new(),
        };
        for value in std::iter::once(empty).chain(vocabulary) {
            if !table.lookup.contains_key(&value) {
                let id = table.values.len() as u32;
                table.lookup.insert(value.clone(), id);
                table.values.push(value);
            }
        }
        Self {
            mode,
            table: RwLock::new(table),
        }
    }

    /// Returns the id for a value.
    ///
    /// Open palettes append unknown values; closed palettes reject them.
    pub fn id_for(&self, value: &T) -> MatterResult<u32> {
        if let Some(&id) = self.table.read().lookup.get(value) {
            return Ok(id);
        }
        match self.mode {
            PaletteMode::Closed => Err(MatterError::UnknownPaletteValue(format!("{value:?}"))),
            PaletteMode::Open => {
                let mut table = self.table.write();
                // Re-check under the write lock; another thread may have
                // inserted the value between the read and write sections.
                if let Some(&id) = table.lookup.get(value) {
                    return Ok(id);
                }
                let id = table.values.len() as u32;
                table.lookup.insert(value.clone(), id);
                table.values.push(value.clone());
                Ok(id)
            }
        }
    }

    /// Returns the value for an id.
    pub fn value_for(&self, id: u32) -> MatterResult<T> {
        let table = self.table.read();
        table
            .values
            .get(id as usize)
            .cloned()
            .ok_or(MatterError::PaletteIdOutOfRange {
                id,
                len: table.values.len() as u32,
            })
    }

    /// Maps a value through the shared table, returning the canonical
    /// instance for it (interning decoded values).
    pub fn canonicalize(&self, value: T) -> MatterResult<T> {
        let id = self.id_for(&value)?;
        self.value_for(id)
    }

    /// The canonical empty representative (id 0).
    pub fn empty_value(&self) -> T {
        // Seeded at construction, so index 0 always exists.
        self.table.read().values[0].clone()
    }

    /// Number of values in the shared table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().values.len()
    }

    /// Returns whether the table is empty (never true; kept for API shape).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The palette's vocabulary mode.
    #[must_use]
    pub fn mode(&self) -> PaletteMode {
        self.mode
    }
}
