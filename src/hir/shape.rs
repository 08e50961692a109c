//! Shape types: structural records keyed by resolved compile-time constants.
//!
//! A shape field key is written either as a literal (`'id1'`, `3`) or as a
//! class constant (`Foo::KEY_NAME`, `self::KEY_NAME`). Keys are always
//! resolved to a [`ShapeKey`] before they are stored or compared, so two
//! spellings that resolve to the same value are the same key.

use std::fmt;

use indexmap::IndexMap;
use indexmap::map::Entry;
use smol_str::SmolStr;

use crate::base::Location;
use super::error::{CheckError, CheckResult};
use super::resolve::{ConstResolver, ResolutionContext};
use super::symbol_table::SymbolTable;
use super::symbols::ConstRef;
use super::types::Ty;

// ============================================================================
// KEYS
// ============================================================================

/// A resolved shape key. `1` and `'1'` are different keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKey {
    Int(i64),
    Str(SmolStr),
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKey::Int(i) => write!(f, "{}", i),
            ShapeKey::Str(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<&str> for ShapeKey {
    fn from(value: &str) -> Self {
        ShapeKey::Str(SmolStr::new(value))
    }
}

impl From<i64> for ShapeKey {
    fn from(value: i64) -> Self {
        ShapeKey::Int(value)
    }
}

// ============================================================================
// FIELDS
// ============================================================================

/// One `key => type` entry as written in a shape type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: ConstRef,
    pub ty: Ty,
    pub required: bool,
    pub location: Location,
}

impl FieldSpec {
    pub fn required(key: ConstRef, ty: Ty) -> Self {
        Self {
            key,
            ty,
            required: true,
            location: Location::detached(),
        }
    }

    /// `?key => type`
    pub fn optional(key: ConstRef, ty: Ty) -> Self {
        Self {
            required: false,
            ..Self::required(key, ty)
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

/// A field of a built shape type.
#[derive(Clone, Debug)]
pub struct ShapeField {
    pub key: ShapeKey,
    /// The key as written, for messages.
    pub written: ConstRef,
    pub ty: Ty,
    pub required: bool,
    /// 1-based position among the written field specs.
    pub position: usize,
    pub location: Location,
}

// ============================================================================
// SHAPE TYPE
// ============================================================================

/// A shape type: resolved keys mapped to field types.
///
/// Field order is kept for display and diagnostics but is irrelevant to
/// equality.
#[derive(Clone, Debug, Default)]
pub struct ShapeType {
    fields: IndexMap<ShapeKey, ShapeField>,
    open: bool,
}

impl ShapeType {
    pub fn new(open: bool) -> Self {
        Self {
            fields: IndexMap::new(),
            open,
        }
    }

    pub fn closed() -> Self {
        Self::new(false)
    }

    /// A shape that permits keys it does not list (`shape(..., ...)`).
    pub fn open() -> Self {
        Self::new(true)
    }

    /// Add a field with an already-resolved key.
    ///
    /// Fails with `DuplicateShapeKey` if the key is already present.
    pub fn with_field(mut self, key: ShapeKey, ty: Ty, required: bool) -> CheckResult<Self> {
        let written = match &key {
            ShapeKey::Int(i) => ConstRef::int(*i),
            ShapeKey::Str(s) => ConstRef::string(s),
        };
        let field = ShapeField {
            key,
            written,
            ty,
            required,
            position: self.fields.len() + 1,
            location: Location::detached(),
        };
        self.insert(field)?;
        Ok(self)
    }

    /// Insert a field, failing if its key is already present.
    fn insert(&mut self, field: ShapeField) -> CheckResult<()> {
        match self.fields.entry(field.key.clone()) {
            Entry::Occupied(existing) => Err(CheckError::DuplicateShapeKey {
                key: field.key,
                index: field.position,
                previous_index: existing.get().position,
                previous: existing.get().location,
            }),
            Entry::Vacant(slot) => {
                slot.insert(field);
                Ok(())
            }
        }
    }

    /// Look up a field by resolved key.
    pub fn field(&self, key: &ShapeKey) -> Option<&ShapeField> {
        self.fields.get(key)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &ShapeField> {
        self.fields.values()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &ShapeField> {
        self.fields.values().filter(|f| f.required)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PartialEq for ShapeType {
    fn eq(&self, other: &Self) -> bool {
        self.open == other.open
            && self.fields.len() == other.fields.len()
            && self.fields.iter().all(|(key, field)| {
                other
                    .fields
                    .get(key)
                    .is_some_and(|o| o.required == field.required && o.ty == field.ty)
            })
    }
}

impl Eq for ShapeType {}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("shape(")?;
        for (i, field) in self.fields.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if !field.required {
                f.write_str("?")?;
            }
            write!(f, "{} => {}", field.key, field.ty)?;
        }
        if self.open {
            if !self.fields.is_empty() {
                f.write_str(", ")?;
            }
            f.write_str("...")?;
        }
        f.write_str(")")
    }
}

// ============================================================================
// BUILDING
// ============================================================================

/// Build a shape type from written field specs, resolving every key in
/// `context`.
///
/// Specs are processed in declaration order; the first failure is returned.
pub fn build_shape_type(
    table: &SymbolTable,
    specs: &[FieldSpec],
    open: bool,
    context: ResolutionContext,
) -> CheckResult<ShapeType> {
    let (shape, mut errors) = build_shape_type_lossy(table, specs, open, context);
    if errors.is_empty() {
        Ok(shape)
    } else {
        Err(errors.swap_remove(0).1)
    }
}

/// Build as much of a shape type as possible.
///
/// Returns the shape made of every field that resolved, plus each failure
/// with the index of the spec that caused it, in declaration order.
pub(crate) fn build_shape_type_lossy(
    table: &SymbolTable,
    specs: &[FieldSpec],
    open: bool,
    context: ResolutionContext,
) -> (ShapeType, Vec<(usize, CheckError)>) {
    let resolver = ConstResolver::new(table);
    let mut shape = ShapeType::new(open);
    let mut errors = Vec::new();

    for (idx, spec) in specs.iter().enumerate() {
        let key = match resolver.resolve_key(&spec.key, context) {
            Ok(key) => key,
            Err(err) => {
                errors.push((idx, err));
                continue;
            }
        };
        let field = ShapeField {
            key,
            written: spec.key.clone(),
            ty: spec.ty.clone(),
            required: spec.required,
            position: idx + 1,
            location: spec.location,
        };
        if let Err(err) = shape.insert(field) {
            errors.push((idx, err));
        }
    }

    (shape, errors)
}
