//! Foundation types for the shapeck checker.
//!
//! This module provides fundamental types used throughout the checker:
//! - [`FileId`] - Identifier of the compilation unit a declaration came from
//! - [`TextRange`], [`TextSize`], [`Location`] - Source positions for diagnostics
//! - [`Name`], [`Interner`] - Identifier interning with optional case folding
//!
//! This module has NO dependencies on other shapeck modules.

mod file_id;
mod intern;
mod span;

pub use file_id::FileId;
pub use intern::{Interner, Name};
pub use span::{Location, TextRange, TextSize};

// Re-export text-size types for convenience
pub use text_size;
