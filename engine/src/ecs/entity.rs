use std::fmt;

/// An entity identifier. Entities carry no data of their own; an entity exists
/// only as a key present in zero or more per-type component sets.
///
/// Identifiers are assigned monotonically by the component storage and are
/// never reused within a world's lifetime, so a deleted entity's id stays dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u32);

impl Entity {
    /// Construct an entity from a raw id value.
    #[inline]
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw identifier value.
    #[inline]
    pub const fn id(&self) -> u32 {
        self.0
    }

    /// Get the index of this entity if it were to live in indexable storage.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Entity {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity({})", self.0)
    }
}
