//! High-level IR: class declarations, constant resolution and shape types.
//!
//! - [`SymbolTable`] - Classes, interfaces, constants and type aliases
//! - [`ConstResolver`] - `self::K`, `parent::K`, `Foo::K` to literal values
//! - [`ShapeType`], [`Ty`] - Shape types keyed by resolved constants
//! - [`ShapeChecker`] - Field access, `Shapes::idx` and shape literal checks
//! - [`Diagnostic`], [`DiagnosticCollector`] - Error reporting
//!
//! The table is built once and then only read, so every check may run
//! concurrently against a shared reference (see [`check_batch`]).

mod check;
mod diagnostics;
mod error;
mod ids;
mod resolve;
mod shape;
mod symbol_table;
mod symbols;
mod types;

pub use check::{
    check_batch, check_field_access, CheckOptions, CheckOutcome, CheckRequest, LiteralField,
    OptionalFieldAccess, ShapeChecker,
};
pub use diagnostics::{codes, Diagnostic, DiagnosticCollector, RelatedInfo, Severity};
pub use error::{CheckError, CheckResult};
pub use ids::ClassId;
pub use resolve::{resolve_constant, ConstResolver, ResolutionContext};
pub use shape::{build_shape_type, FieldSpec, ShapeField, ShapeKey, ShapeType};
pub use symbol_table::{ConstLookup, SymbolTable, TypeAlias};
pub use symbols::{ClassDecl, ClassKind, ClassRef, ConstDecl, ConstInit, ConstRef, Literal};
pub use types::{is_subtype, Ty};
