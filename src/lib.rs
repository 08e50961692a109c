//! # shapeck-base
//!
//! Core library for shape-type checking and class-constant resolution.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! hir     → Symbol table, constant resolution, shape types, checker
//!   ↓
//! base    → Primitives (FileId, Location, Name interning)
//! ```
//!
//! ## Example
//!
//! ```
//! use shapeck::hir::{
//!     check_field_access, build_shape_type, ClassDecl, ConstDecl, ConstRef, FieldSpec,
//!     ResolutionContext, SymbolTable, Ty,
//! };
//!
//! let mut table = SymbolTable::new();
//! let foo = table
//!     .declare_class(
//!         ClassDecl::new("Foo")
//!             .abstract_class()
//!             .with_constant(ConstDecl::string("KEY_NAME", "id1")),
//!     )
//!     .unwrap();
//!
//! // type MyShape = shape(Foo::KEY_NAME => int);
//! let shape = build_shape_type(
//!     &table,
//!     &[FieldSpec::required(ConstRef::class_const("Foo", "KEY_NAME"), Ty::Int)],
//!     false,
//!     ResolutionContext::top_level(),
//! )
//! .unwrap();
//!
//! // $shape[self::KEY_NAME] inside Foo
//! let ty = check_field_access(
//!     &table,
//!     &shape,
//!     &ConstRef::self_const("KEY_NAME"),
//!     ResolutionContext::in_class(foo),
//! );
//! assert_eq!(ty.unwrap(), Ty::Int);
//! ```

/// Foundation types: FileId, Location, Name interning
pub mod base;

/// High-level IR: declarations, resolution, shape types, checking
pub mod hir;

// Re-export foundation types
pub use base::{FileId, Interner, Location, Name, TextRange, TextSize};
