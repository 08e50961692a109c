//! Field types and the subtype relation used by shape checks.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use super::shape::ShapeType;
use super::symbol_table::SymbolTable;

/// The static type of a shape field or an expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ty {
    Int,
    String,
    Bool,
    Float,
    Null,
    /// The top type; also what reading an undeclared key of an open shape yields.
    Mixed,
    Nullable(Box<Ty>),
    /// A class or interface, by declared name.
    Class(SmolStr),
    /// A name not yet expanded through the symbol table (alias or class).
    Named(SmolStr),
    Shape(Arc<ShapeType>),
    /// Placeholder substituted after a reported error. Compatible with
    /// every type so one mistake yields one diagnostic.
    Error,
}

impl Ty {
    /// `?T`, collapsing types that already admit null.
    pub fn nullable(ty: Ty) -> Ty {
        match ty {
            Ty::Null | Ty::Mixed | Ty::Error | Ty::Nullable(_) => ty,
            other => Ty::Nullable(Box::new(other)),
        }
    }

    pub fn shape(shape: ShapeType) -> Ty {
        Ty::Shape(Arc::new(shape))
    }

    pub fn named(name: &str) -> Ty {
        Ty::Named(SmolStr::new(name))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Ty::Error)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => f.write_str("int"),
            Ty::String => f.write_str("string"),
            Ty::Bool => f.write_str("bool"),
            Ty::Float => f.write_str("float"),
            Ty::Null => f.write_str("null"),
            Ty::Mixed => f.write_str("mixed"),
            Ty::Nullable(inner) => write!(f, "?{}", inner),
            Ty::Class(name) | Ty::Named(name) => f.write_str(name),
            Ty::Shape(shape) => write!(f, "{}", shape),
            Ty::Error => f.write_str("_"),
        }
    }
}

// ============================================================================
// SUBTYPING
// ============================================================================

/// Nesting bound for recursive alias expansion inside shapes.
const MAX_SUBTYPE_DEPTH: usize = 64;

/// Check whether a value of type `sub` may be used where `sup` is expected.
///
/// Names that fail to expand are treated like [`Ty::Error`]: the failure is
/// reported where the name is written, not at every use.
pub fn is_subtype(table: &SymbolTable, sub: &Ty, sup: &Ty) -> bool {
    is_subtype_at(table, sub, sup, 0)
}

fn is_subtype_at(table: &SymbolTable, sub: &Ty, sup: &Ty, depth: usize) -> bool {
    if sub == sup {
        return true;
    }
    if depth > MAX_SUBTYPE_DEPTH {
        return false;
    }
    let (Ok(sub), Ok(sup)) = (table.expand(sub), table.expand(sup)) else {
        return true;
    };
    let depth = depth + 1;

    match (&sub, &sup) {
        _ if sub == sup => true,
        (Ty::Error, _) | (_, Ty::Error) => true,
        (_, Ty::Mixed) => true,
        (Ty::Nullable(a), Ty::Nullable(b)) => is_subtype_at(table, a, b, depth),
        (Ty::Null, Ty::Nullable(_)) => true,
        (_, Ty::Nullable(b)) => is_subtype_at(table, &sub, b, depth),
        (Ty::Class(a), Ty::Class(b)) => match (table.lookup_class(a), table.lookup_class(b)) {
            (Ok(a), Ok(b)) => table.is_subclass_of(a, b),
            _ => a.eq_ignore_ascii_case(b),
        },
        (Ty::Shape(a), Ty::Shape(b)) => is_shape_subtype(table, a, b, depth),
        _ => false,
    }
}

/// Structural shape subtyping: every field of `sup` must be matched by a
/// compatible field of `sub`, required fields must stay required, and
/// fields `sup` does not list are only allowed when `sup` is open.
fn is_shape_subtype(table: &SymbolTable, sub: &ShapeType, sup: &ShapeType, depth: usize) -> bool {
    if sub.is_open() && !sup.is_open() {
        return false;
    }
    for expected in sup.fields() {
        match sub.field(&expected.key) {
            Some(actual) => {
                if expected.required && !actual.required {
                    return false;
                }
                if !is_subtype_at(table, &actual.ty, &expected.ty, depth) {
                    return false;
                }
            }
            None => {
                if expected.required {
                    return false;
                }
                // An open sub may carry the key with any type.
                if sub.is_open() && expected.ty != Ty::Mixed {
                    return false;
                }
            }
        }
    }
    sup.is_open() || sub.fields().all(|actual| sup.field(&actual.key).is_some())
}
