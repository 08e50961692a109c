//! Error taxonomy for resolution and shape checking.

use smol_str::SmolStr;

use crate::base::Location;
use super::diagnostics::codes;
use super::shape::ShapeKey;
use super::symbols::Literal;

/// Result alias used by the pure (non-recovering) operations.
pub type CheckResult<T> = Result<T, CheckError>;

/// Every user-facing failure the checker can report.
///
/// The pure operations return these directly; [`ShapeChecker`](super::ShapeChecker)
/// turns them into [`Diagnostic`](super::Diagnostic)s and recovers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("unknown class `{name}`")]
    UnknownClass { name: SmolStr },

    #[error("class `{class}` has no constant `{name}`")]
    UnknownConstant { class: SmolStr, name: SmolStr },

    #[error("`parent` used {}", scope_description(.class))]
    NoParent { class: Option<SmolStr> },

    #[error("`{keyword}` used outside of a class")]
    NoEnclosingClass { keyword: &'static str },

    #[error("name `{name}` is already declared")]
    DuplicateClass { name: SmolStr, previous: Location },

    #[error("constant `{name}` is declared twice in `{class}`")]
    DuplicateConstant {
        class: SmolStr,
        name: SmolStr,
        previous: Location,
    },

    #[error("constant `{class}::{name}` is abstract and has no value")]
    AbstractConstant { class: SmolStr, name: SmolStr },

    #[error("constant `{class}::{name}` depends on itself")]
    CyclicConstant { class: SmolStr, name: SmolStr },

    #[error("shape key `{key}` resolves to {value}, expected an int or string")]
    InvalidShapeKey { key: SmolStr, value: Literal },

    #[error("shape field #{index} repeats key {key} already used by field #{previous_index}")]
    DuplicateShapeKey {
        key: ShapeKey,
        index: usize,
        previous_index: usize,
        previous: Location,
    },

    #[error("the field {key} is not defined in this shape type")]
    UnknownShapeField { key: ShapeKey },

    #[error("the required field {key} is missing")]
    MissingRequiredField { key: ShapeKey },

    #[error("the field {key} expects `{expected}`, found `{found}`")]
    FieldTypeMismatch {
        key: ShapeKey,
        expected: String,
        found: String,
    },

    #[error("unknown type `{name}`")]
    UnknownType { name: SmolStr },

    #[error("`{ty}` is not a shape and cannot be indexed by a shape key")]
    NotAShape { ty: String },
}

fn scope_description(class: &Option<SmolStr>) -> String {
    match class {
        Some(class) => format!("in class `{}` which has no parent", class),
        None => "outside of a class".to_string(),
    }
}

impl CheckError {
    /// Stable diagnostic code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            CheckError::UnknownClass { .. } => codes::UNKNOWN_CLASS,
            CheckError::UnknownConstant { .. } => codes::UNKNOWN_CONSTANT,
            CheckError::NoParent { .. } => codes::NO_PARENT,
            CheckError::NoEnclosingClass { .. } => codes::NO_ENCLOSING_CLASS,
            CheckError::DuplicateClass { .. } => codes::DUPLICATE_CLASS,
            CheckError::DuplicateConstant { .. } => codes::DUPLICATE_CONSTANT,
            CheckError::AbstractConstant { .. } => codes::ABSTRACT_CONSTANT,
            CheckError::CyclicConstant { .. } => codes::CYCLIC_CONSTANT,
            CheckError::InvalidShapeKey { .. } => codes::INVALID_SHAPE_KEY,
            CheckError::DuplicateShapeKey { .. } => codes::DUPLICATE_SHAPE_KEY,
            CheckError::UnknownShapeField { .. } => codes::UNKNOWN_SHAPE_FIELD,
            CheckError::MissingRequiredField { .. } => codes::MISSING_REQUIRED_FIELD,
            CheckError::FieldTypeMismatch { .. } => codes::FIELD_TYPE_MISMATCH,
            CheckError::UnknownType { .. } => codes::UNKNOWN_TYPE,
            CheckError::NotAShape { .. } => codes::NOT_A_SHAPE,
        }
    }

    /// The earlier declaration a duplicate collides with, if any.
    pub fn previous_location(&self) -> Option<(Location, String)> {
        match self {
            CheckError::DuplicateClass { name, previous } => {
                Some((*previous, format!("previous declaration of `{}`", name)))
            }
            CheckError::DuplicateConstant { name, previous, .. } => {
                Some((*previous, format!("previous declaration of `{}`", name)))
            }
            CheckError::DuplicateShapeKey {
                key,
                previous_index,
                previous,
                ..
            } => Some((
                *previous,
                format!("field #{} already uses key {}", previous_index, key),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_parent_messages() {
        let inside = CheckError::NoParent {
            class: Some(SmolStr::new("Foo")),
        };
        let outside = CheckError::NoParent { class: None };

        assert_eq!(inside.to_string(), "`parent` used in class `Foo` which has no parent");
        assert_eq!(outside.to_string(), "`parent` used outside of a class");
    }

    #[test]
    fn test_duplicate_shape_key_message() {
        let err = CheckError::DuplicateShapeKey {
            key: ShapeKey::Str(SmolStr::new("id1")),
            index: 2,
            previous_index: 1,
            previous: Location::detached(),
        };

        assert_eq!(
            err.to_string(),
            "shape field #2 repeats key 'id1' already used by field #1"
        );
        assert!(err.previous_location().is_some());
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            CheckError::UnknownClass { name: "A".into() },
            CheckError::UnknownConstant { class: "A".into(), name: "B".into() },
            CheckError::NoParent { class: None },
            CheckError::NoEnclosingClass { keyword: "self" },
            CheckError::UnknownShapeField { key: ShapeKey::Int(1) },
            CheckError::MissingRequiredField { key: ShapeKey::Int(1) },
        ];
        let mut seen: Vec<_> = errors.iter().map(CheckError::code).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), errors.len());
    }
}
