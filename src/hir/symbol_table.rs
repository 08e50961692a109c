//! Symbol table: classes, constants and type aliases of one compilation
//! unit set.
//!
//! The table is filled during the declaration phase (`&mut self`) and is
//! read-only afterwards. Everything the check phase needs goes through
//! `&self` methods, so a finished table can be shared across threads.
//!
//! ## Namespaces
//!
//! - Class, interface and type alias names share one case-insensitive namespace.
//! - Constant names are case-sensitive and scoped to their class.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::base::{Interner, Location, Name};
use super::diagnostics::DiagnosticCollector;
use super::error::{CheckError, CheckResult};
use super::ids::ClassId;
use super::symbols::{ClassDecl, ConstDecl};
use super::types::Ty;

// ============================================================================
// ENTRIES
// ============================================================================

#[derive(Debug)]
struct ClassEntry {
    decl: ClassDecl,
    /// Constant name → index into `decl.constants` (first declaration wins).
    constants: FxHashMap<Name, usize>,
}

/// A `type Name = ...;` declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeAlias {
    pub name: SmolStr,
    pub ty: Ty,
    pub location: Location,
}

#[derive(Clone, Copy, Debug)]
enum TypeName {
    Class(ClassId),
    Alias(usize),
}

/// A constant found by [`SymbolTable::lookup_constant`].
#[derive(Clone, Copy, Debug)]
pub struct ConstLookup<'a> {
    /// The class that declares the constant (may be an ancestor).
    pub class: ClassId,
    pub decl: &'a ConstDecl,
}

// ============================================================================
// SYMBOL TABLE
// ============================================================================

/// All declarations visible to the checker.
#[derive(Debug, Default)]
pub struct SymbolTable {
    interner: Interner,
    classes: Vec<ClassEntry>,
    aliases: Vec<TypeAlias>,
    by_name: FxHashMap<Name, TypeName>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // DECLARATION PHASE
    // ========================================================================

    /// Register a class or interface.
    ///
    /// Fails without registering anything if the name is already bound or if
    /// the class declares the same constant twice.
    pub fn declare_class(&mut self, decl: ClassDecl) -> CheckResult<ClassId> {
        self.check_name_free(&decl.name)?;
        let (constants, mut duplicates) = self.index_constants(&decl);
        if !duplicates.is_empty() {
            return Err(duplicates.swap_remove(0).1);
        }
        Ok(self.insert_class(decl, constants))
    }

    /// Register a batch of declarations, reporting problems instead of
    /// failing.
    ///
    /// A class whose name is already bound is skipped. A class with
    /// duplicate constants is still registered; the first declaration of each
    /// constant is the one lookups see.
    pub fn declare_classes(
        &mut self,
        decls: impl IntoIterator<Item = ClassDecl>,
        collector: &mut DiagnosticCollector,
    ) -> Vec<ClassId> {
        let mut ids = Vec::new();
        for decl in decls {
            if let Err(err) = self.check_name_free(&decl.name) {
                collector.report(&err, decl.location);
                continue;
            }
            let (constants, duplicates) = self.index_constants(&decl);
            for (idx, err) in &duplicates {
                collector.report(err, decl.constants[*idx].location);
            }
            ids.push(self.insert_class(decl, constants));
        }
        ids
    }

    /// Register a type alias such as `type MyShape = shape(...)`.
    pub fn declare_type_alias(
        &mut self,
        name: &str,
        ty: Ty,
        location: Location,
    ) -> CheckResult<()> {
        self.check_name_free(name)?;
        let key = self.interner.intern_folded(name);
        let idx = self.aliases.len();
        self.aliases.push(TypeAlias {
            name: SmolStr::new(name),
            ty,
            location,
        });
        self.by_name.insert(key, TypeName::Alias(idx));
        debug!(alias = name, "declared type alias");
        Ok(())
    }

    fn check_name_free(&self, name: &str) -> CheckResult<()> {
        let existing = self
            .interner
            .find_folded(name)
            .and_then(|key| self.by_name.get(&key));
        match existing {
            None => Ok(()),
            Some(TypeName::Class(id)) => Err(CheckError::DuplicateClass {
                name: SmolStr::new(name),
                previous: self.class(*id).location,
            }),
            Some(TypeName::Alias(idx)) => Err(CheckError::DuplicateClass {
                name: SmolStr::new(name),
                previous: self.aliases[*idx].location,
            }),
        }
    }

    /// Index constants by name. Returns the first-occurrence map plus one
    /// error per repeated declaration (with the repeat's index).
    fn index_constants(
        &self,
        decl: &ClassDecl,
    ) -> (FxHashMap<Name, usize>, Vec<(usize, CheckError)>) {
        let mut constants: FxHashMap<Name, usize> = FxHashMap::default();
        let mut duplicates = Vec::new();
        for (idx, constant) in decl.constants.iter().enumerate() {
            let key = self.interner.intern(&constant.name);
            match constants.get(&key) {
                Some(&first) => {
                    duplicates.push((
                        idx,
                        CheckError::DuplicateConstant {
                            class: decl.name.clone(),
                            name: constant.name.clone(),
                            previous: decl.constants[first].location,
                        },
                    ));
                }
                None => {
                    constants.insert(key, idx);
                }
            }
        }
        (constants, duplicates)
    }

    fn insert_class(&mut self, decl: ClassDecl, constants: FxHashMap<Name, usize>) -> ClassId {
        let id = ClassId::new(self.classes.len() as u32);
        let key = self.interner.intern_folded(&decl.name);
        debug!(
            class = %decl.name,
            kind = decl.kind.display(),
            constants = decl.constants.len(),
            ?id,
            "declared class"
        );
        self.by_name.insert(key, TypeName::Class(id));
        self.classes.push(ClassEntry { decl, constants });
        id
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Look up a class or interface by name (case-insensitive).
    pub fn lookup_class(&self, name: &str) -> CheckResult<ClassId> {
        let found = self
            .interner
            .find_folded(name)
            .and_then(|key| self.by_name.get(&key));
        match found {
            Some(TypeName::Class(id)) => Ok(*id),
            _ => Err(CheckError::UnknownClass {
                name: SmolStr::new(name),
            }),
        }
    }

    /// Get the declaration for a class id.
    ///
    /// # Panics
    /// Panics if `id` was produced by a different table.
    pub fn class(&self, id: ClassId) -> &ClassDecl {
        &self.entry(id).decl
    }

    fn entry(&self, id: ClassId) -> &ClassEntry {
        self.classes
            .get(id.0 as usize)
            .unwrap_or_else(|| panic!("{:?} does not belong to this symbol table", id))
    }

    /// Resolve the declared parent of a class, if it has one.
    pub fn parent_of(&self, id: ClassId) -> CheckResult<Option<ClassId>> {
        match &self.class(id).parent {
            Some(parent) => self.lookup_class(parent).map(Some),
            None => Ok(None),
        }
    }

    /// Look up a type alias by name (case-insensitive).
    pub fn lookup_type_alias(&self, name: &str) -> Option<&TypeAlias> {
        let key = self.interner.find_folded(name)?;
        match self.by_name.get(&key)? {
            TypeName::Alias(idx) => self.aliases.get(*idx),
            TypeName::Class(_) => None,
        }
    }

    /// Find a constant visible from `class`.
    ///
    /// Search order: the class's own constants, then the parent chain, then
    /// the declared interfaces, depth-first in declaration order. The first
    /// concrete constant wins; an abstract constant is only returned when no
    /// concrete one with the same name is reachable.
    pub fn lookup_constant(&self, class: ClassId, name: &str) -> CheckResult<ConstLookup<'_>> {
        let unknown = || CheckError::UnknownConstant {
            class: self.class(class).name.clone(),
            name: SmolStr::new(name),
        };
        let Some(key) = self.interner.find(name) else {
            return Err(unknown());
        };

        let mut abstract_hit: Option<ConstLookup<'_>> = None;
        let mut visited = FxHashSet::default();
        let mut stack = vec![class];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let entry = self.entry(current);
            if let Some(&idx) = entry.constants.get(&key) {
                let decl = &entry.decl.constants[idx];
                let hit = ConstLookup { class: current, decl };
                trace!(
                    constant = name,
                    declared_in = %entry.decl.name,
                    abstract_ = decl.is_abstract(),
                    "constant candidate"
                );
                if !decl.is_abstract() {
                    return Ok(hit);
                }
                abstract_hit.get_or_insert(hit);
            }

            // Pushed in reverse so the parent is searched before interfaces.
            // Undeclared ancestors are reported at declaration, not here.
            let ancestors = entry.decl.parent.iter().chain(entry.decl.interfaces.iter());
            let resolved: Vec<ClassId> = ancestors
                .filter_map(|name| self.lookup_class(name).ok())
                .collect();
            stack.extend(resolved.into_iter().rev());
        }

        abstract_hit.ok_or_else(unknown)
    }

    /// Check whether `sub` is `sup` or inherits from it through parents or
    /// interfaces. Undeclared ancestors are ignored.
    pub fn is_subclass_of(&self, sub: ClassId, sup: ClassId) -> bool {
        let mut visited = FxHashSet::default();
        let mut stack = vec![sub];
        while let Some(current) = stack.pop() {
            if current == sup {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            let decl = self.class(current);
            let ancestors = decl.parent.iter().chain(decl.interfaces.iter());
            stack.extend(ancestors.filter_map(|name| self.lookup_class(name).ok()));
        }
        false
    }

    /// Expand a `Ty::Named` head through type aliases.
    ///
    /// Class names become `Ty::Class` with the declared spelling. Other
    /// types are returned unchanged.
    pub fn expand(&self, ty: &Ty) -> CheckResult<Ty> {
        let mut current = ty.clone();
        let mut seen: Vec<SmolStr> = Vec::new();
        while let Ty::Named(name) = &current {
            if seen.iter().any(|s| s.eq_ignore_ascii_case(name)) {
                return Err(CheckError::UnknownType { name: name.clone() });
            }
            seen.push(name.clone());

            if let Some(alias) = self.lookup_type_alias(name) {
                current = alias.ty.clone();
            } else if let Ok(id) = self.lookup_class(name) {
                current = Ty::Class(self.class(id).name.clone());
            } else {
                return Err(CheckError::UnknownType { name: name.clone() });
            }
        }
        Ok(current)
    }

    /// Iterate over all declared classes.
    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassDecl)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(idx, entry)| (ClassId::new(idx as u32), &entry.decl))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
