//! Identifiers for declared classes.

use std::fmt;

/// Index of a class inside a [`SymbolTable`](super::SymbolTable).
///
/// Ids are assigned sequentially as classes are declared and are only
/// meaningful for the table that produced them.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    #[inline]
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}
