//! Identifier interning.
//!
//! Class names in the checked language are ASCII case-insensitive while
//! constant names are case-sensitive, so the interner offers both an exact
//! and a case-folded entry point over the same storage.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;

/// An interned identifier name.
///
/// `Name` is a lightweight handle (just a u32) into an [`Interner`].
/// Equality is O(1), so the symbol table keys every map by `Name`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Name(u32);

impl Name {
    #[inline]
    pub(crate) const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

/// String interner shared by the declaration phase and the check phase.
///
/// Thread-safe via internal locking. Only the declaration phase inserts;
/// checks go through [`Interner::find`] which never grows the table.
#[derive(Default)]
pub struct Interner {
    inner: RwLock<InternerInner>,
}

#[derive(Default)]
struct InternerInner {
    map: FxHashMap<SmolStr, u32>,
    strings: Vec<SmolStr>,
}

impl Interner {
    /// Create a new empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string exactly as written.
    pub fn intern(&self, s: &str) -> Name {
        {
            let inner = self.inner.read();
            if let Some(&index) = inner.map.get(s) {
                return Name::from_raw(index);
            }
        }

        let mut inner = self.inner.write();

        // Another writer may have won the race.
        if let Some(&index) = inner.map.get(s) {
            return Name::from_raw(index);
        }

        let smol = SmolStr::new(s);
        let index = inner.strings.len() as u32;
        inner.strings.push(smol.clone());
        inner.map.insert(smol, index);

        Name::from_raw(index)
    }

    /// Intern the ASCII-lowercased form of `s`.
    pub fn intern_folded(&self, s: &str) -> Name {
        self.intern(&fold(s))
    }

    /// Find an already-interned string without inserting it.
    pub fn find(&self, s: &str) -> Option<Name> {
        self.inner.read().map.get(s).copied().map(Name::from_raw)
    }

    /// Find the ASCII-lowercased form of `s` without inserting it.
    pub fn find_folded(&self, s: &str) -> Option<Name> {
        self.find(&fold(s))
    }

    /// Look up the string for a `Name`.
    ///
    /// Returns `None` if the `Name` was created by a different interner.
    pub fn lookup(&self, name: Name) -> Option<SmolStr> {
        self.inner.read().strings.get(name.0 as usize).cloned()
    }

    /// Get the number of interned strings.
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Check if the interner is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Interner")
            .field("count", &inner.strings.len())
            .finish()
    }
}

fn fold(s: &str) -> SmolStr {
    if s.bytes().any(|b| b.is_ascii_uppercase()) {
        SmolStr::new(s.to_ascii_lowercase())
    } else {
        SmolStr::new(s)
    }
}
