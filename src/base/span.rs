//! Source locations attached to declarations and diagnostics.

use std::fmt;

pub use text_size::TextRange;
pub use text_size::TextSize;

use super::FileId;

/// A byte range inside one compilation unit.
///
/// Locations are supplied by the parser collaborator and passed through
/// untouched; line/column conversion belongs to whoever renders diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Location {
    pub file: FileId,
    pub range: TextRange,
}

impl Location {
    /// Create a location from a file and byte offsets.
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self {
            file,
            range: TextRange::new(TextSize::from(start), TextSize::from(end)),
        }
    }

    /// A location for synthesized items that have no source text.
    pub fn detached() -> Self {
        Self {
            file: FileId::default(),
            range: TextRange::empty(TextSize::from(0)),
        }
    }

    /// Check whether this location points at real source text.
    pub fn is_detached(&self) -> bool {
        self.range.is_empty() && self.range.start() == TextSize::from(0)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::detached()
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{}..{}",
            self.file,
            u32::from(self.range.start()),
            u32::from(self.range.end())
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}..{}",
            self.file,
            u32::from(self.range.start()),
            u32::from(self.range.end())
        )
    }
}
