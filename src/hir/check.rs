//! Shape field checking: typing `$shape[KEY]`, `Shapes::idx($shape, KEY)`
//! and shape construction expressions.
//!
//! Two layers:
//!
//! - [`check_field_access`] is the pure contract: resolve the key, look it
//!   up, return the field type or the first error.
//! - [`ShapeChecker`] wraps the same logic with error recovery. Every failure
//!   becomes one [`Diagnostic`] and the expression is typed as [`Ty::Error`]
//!   so checking can continue.
//!
//! [`check_batch`] fans independent requests out over rayon against a shared
//! read-only table.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::base::Location;
use super::diagnostics::{codes, Diagnostic, DiagnosticCollector};
use super::error::{CheckError, CheckResult};
use super::resolve::{ConstResolver, ResolutionContext};
use super::shape::{build_shape_type_lossy, FieldSpec, ShapeField, ShapeKey, ShapeType};
use super::symbol_table::SymbolTable;
use super::symbols::ConstRef;
use super::types::{is_subtype, Ty};

// ============================================================================
// OPTIONS
// ============================================================================

/// How direct access to an optional field is treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptionalFieldAccess {
    /// Access is allowed silently.
    #[default]
    Allow,
    /// Access is allowed but a warning suggests `Shapes::idx`.
    Warn,
}

/// Checker configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckOptions {
    pub optional_field_access: OptionalFieldAccess,
}

// ============================================================================
// PURE CONTRACT
// ============================================================================

/// Type `$shape[key]`.
///
/// Declared keys yield their field type whether required or optional.
/// Undeclared keys yield `mixed` on an open shape and fail on a closed one.
pub fn check_field_access(
    table: &SymbolTable,
    shape: &ShapeType,
    key: &ConstRef,
    context: ResolutionContext,
) -> CheckResult<Ty> {
    let key = ConstResolver::new(table).resolve_key(key, context)?;
    Ok(lookup_field(shape, &key)?.map_or(Ty::Mixed, |field| field.ty.clone()))
}

/// `Ok(None)` means the key is absent from an open shape.
fn lookup_field<'s>(shape: &'s ShapeType, key: &ShapeKey) -> CheckResult<Option<&'s ShapeField>> {
    match shape.field(key) {
        Some(field) => Ok(Some(field)),
        None if shape.is_open() => Ok(None),
        None => Err(CheckError::UnknownShapeField { key: key.clone() }),
    }
}

/// Expand an indexed receiver type to the shape it denotes.
///
/// `Ok(None)` means the receiver is already the error type.
fn receiver_shape(table: &SymbolTable, receiver: &Ty) -> CheckResult<Option<Arc<ShapeType>>> {
    match table.expand(receiver)? {
        Ty::Shape(shape) => Ok(Some(shape)),
        Ty::Error => Ok(None),
        other => Err(CheckError::NotAShape {
            ty: other.to_string(),
        }),
    }
}

// ============================================================================
// SHAPE CHECKER
// ============================================================================

/// One `key => value` entry of a shape construction expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiteralField {
    pub key: ConstRef,
    /// Static type of the value expression.
    pub ty: Ty,
    pub location: Location,
}

impl LiteralField {
    pub fn new(key: ConstRef, ty: Ty) -> Self {
        Self {
            key,
            ty,
            location: Location::detached(),
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

/// Recovering checker: reports diagnostics and keeps going.
pub struct ShapeChecker<'a> {
    table: &'a SymbolTable,
    options: CheckOptions,
    collector: DiagnosticCollector,
}

impl<'a> ShapeChecker<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self {
            table,
            options: CheckOptions::default(),
            collector: DiagnosticCollector::new(),
        }
    }

    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    fn report(&mut self, error: &CheckError, location: Location) -> Ty {
        self.collector.report(error, location);
        Ty::Error
    }

    /// Build a shape type, reporting each bad field at its own location and
    /// keeping the rest.
    pub fn build_shape(
        &mut self,
        specs: &[FieldSpec],
        open: bool,
        context: ResolutionContext,
    ) -> ShapeType {
        let (shape, errors) = build_shape_type_lossy(self.table, specs, open, context);
        for (idx, err) in &errors {
            self.collector.report(err, specs[*idx].location);
        }
        shape
    }

    /// Type `$shape[key]` against a known shape type.
    pub fn check_field_access(
        &mut self,
        shape: &ShapeType,
        key: &ConstRef,
        context: ResolutionContext,
        location: Location,
    ) -> Ty {
        let resolved = match ConstResolver::new(self.table).resolve_key(key, context) {
            Ok(resolved) => resolved,
            Err(err) => return self.report(&err, location),
        };
        match lookup_field(shape, &resolved) {
            Ok(Some(field)) => {
                let warn = self.options.optional_field_access == OptionalFieldAccess::Warn;
                if !field.required && warn {
                    self.collector.add(
                        Diagnostic::warning(
                            location,
                            format!(
                                "the field {} is optional and may not be present; read it with Shapes::idx",
                                resolved
                            ),
                        )
                        .with_code(codes::OPTIONAL_FIELD_ACCESS),
                    );
                }
                field.ty.clone()
            }
            Ok(None) => Ty::Mixed,
            Err(err) => self.report(&err, location),
        }
    }

    /// Type `$receiver[key]` where the receiver type may be an alias.
    pub fn check_index(
        &mut self,
        receiver: &Ty,
        key: &ConstRef,
        context: ResolutionContext,
        location: Location,
    ) -> Ty {
        match receiver_shape(self.table, receiver) {
            Ok(Some(shape)) => self.check_field_access(&shape, key, context, location),
            Ok(None) => Ty::Error,
            Err(err) => self.report(&err, location),
        }
    }

    /// Type `Shapes::idx($shape, key)` or `Shapes::idx($shape, key, $default)`.
    ///
    /// Without a default a declared field reads as `?T`. With a default the
    /// result is the wider of `T` and the default type (`?T` for a null
    /// default), or `mixed` when the two are unrelated.
    pub fn check_idx(
        &mut self,
        receiver: &Ty,
        key: &ConstRef,
        default: Option<&Ty>,
        context: ResolutionContext,
        location: Location,
    ) -> Ty {
        let shape = match receiver_shape(self.table, receiver) {
            Ok(Some(shape)) => shape,
            Ok(None) => return Ty::Error,
            Err(err) => return self.report(&err, location),
        };
        let resolved = match ConstResolver::new(self.table).resolve_key(key, context) {
            Ok(resolved) => resolved,
            Err(err) => return self.report(&err, location),
        };
        let field_ty = match lookup_field(&shape, &resolved) {
            Ok(Some(field)) => field.ty.clone(),
            Ok(None) => return Ty::Mixed,
            Err(err) => return self.report(&err, location),
        };

        match default {
            None => Ty::nullable(field_ty),
            Some(default) if is_subtype(self.table, default, &field_ty) => field_ty,
            Some(default) if is_subtype(self.table, &field_ty, default) => default.clone(),
            Some(Ty::Null) => Ty::nullable(field_ty),
            Some(_) => Ty::Mixed,
        }
    }

    /// Check `shape(key => value, ...)` against an expected shape type.
    ///
    /// Reports repeated keys, keys a closed shape does not declare, value
    /// types that do not fit the declared field, and required fields that
    /// are missing. Returns the expected type when everything checks.
    pub fn check_shape_literal(
        &mut self,
        expected: &Ty,
        fields: &[LiteralField],
        context: ResolutionContext,
        location: Location,
    ) -> Ty {
        let shape = match receiver_shape(self.table, expected) {
            Ok(Some(shape)) => shape,
            Ok(None) => return Ty::Error,
            Err(err) => return self.report(&err, location),
        };

        let resolver = ConstResolver::new(self.table);
        let errors_before = self.collector.error_count();
        let mut unresolved = false;
        let mut seen: Vec<(ShapeKey, usize, Location)> = Vec::with_capacity(fields.len());

        for (idx, field) in fields.iter().enumerate() {
            let key = match resolver.resolve_key(&field.key, context) {
                Ok(key) => key,
                Err(err) => {
                    unresolved = true;
                    self.report(&err, field.location);
                    continue;
                }
            };
            if let Some((_, previous_index, previous)) = seen.iter().find(|(k, _, _)| *k == key) {
                let err = CheckError::DuplicateShapeKey {
                    key,
                    index: idx + 1,
                    previous_index: *previous_index,
                    previous: *previous,
                };
                self.report(&err, field.location);
                continue;
            }

            match shape.field(&key) {
                Some(declared) => {
                    if !is_subtype(self.table, &field.ty, &declared.ty) {
                        let err = CheckError::FieldTypeMismatch {
                            key: key.clone(),
                            expected: declared.ty.to_string(),
                            found: field.ty.to_string(),
                        };
                        self.report(&err, field.location);
                    }
                }
                None if shape.is_open() => {}
                None => {
                    let err = CheckError::UnknownShapeField { key: key.clone() };
                    self.report(&err, field.location);
                }
            }
            seen.push((key, idx + 1, field.location));
        }

        // A key that failed to resolve may be the "missing" one.
        if !unresolved {
            for required in shape.required_fields() {
                if !seen.iter().any(|(k, _, _)| *k == required.key) {
                    let err = CheckError::MissingRequiredField {
                        key: required.key.clone(),
                    };
                    self.report(&err, location);
                }
            }
        }

        if self.collector.error_count() > errors_before {
            Ty::Error
        } else {
            Ty::Shape(shape)
        }
    }

    /// Check one batched request.
    pub fn check_request(&mut self, request: &CheckRequest) -> Ty {
        match request {
            CheckRequest::FieldAccess {
                receiver,
                key,
                context,
                location,
            } => self.check_index(receiver, key, *context, *location),
            CheckRequest::Idx {
                receiver,
                key,
                default,
                context,
                location,
            } => self.check_idx(receiver, key, default.as_ref(), *context, *location),
            CheckRequest::ShapeLiteral {
                expected,
                fields,
                context,
                location,
            } => self.check_shape_literal(expected, fields, *context, *location),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.collector.diagnostics()
    }

    /// Get the collected diagnostics.
    pub fn finish(mut self) -> Vec<Diagnostic> {
        self.collector.take()
    }
}

// ============================================================================
// BATCH CHECKING
// ============================================================================

/// An independent expression to check.
#[derive(Clone, Debug)]
pub enum CheckRequest {
    /// `$receiver[key]`
    FieldAccess {
        receiver: Ty,
        key: ConstRef,
        context: ResolutionContext,
        location: Location,
    },
    /// `Shapes::idx($receiver, key[, default])`
    Idx {
        receiver: Ty,
        key: ConstRef,
        default: Option<Ty>,
        context: ResolutionContext,
        location: Location,
    },
    /// `shape(...)` where a value of type `expected` is required
    ShapeLiteral {
        expected: Ty,
        fields: Vec<LiteralField>,
        context: ResolutionContext,
        location: Location,
    },
}

/// The type and diagnostics of one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckOutcome {
    pub ty: Ty,
    pub diagnostics: Vec<Diagnostic>,
}

/// Check many requests in parallel. Outcomes are returned in request order.
pub fn check_batch(
    table: &SymbolTable,
    options: CheckOptions,
    requests: &[CheckRequest],
) -> Vec<CheckOutcome> {
    debug!(requests = requests.len(), "checking batch");
    requests
        .par_iter()
        .map(|request| {
            let mut checker = ShapeChecker::new(table).with_options(options);
            let ty = checker.check_request(request);
            CheckOutcome {
                ty,
                diagnostics: checker.finish(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileId;
    use crate::hir::symbols::{ClassDecl, ConstDecl};

    fn setup() -> (SymbolTable, ResolutionContext) {
        let mut table = SymbolTable::new();
        let foo = table
            .declare_class(
                ClassDecl::new("Foo")
                    .abstract_class()
                    .with_constant(ConstDecl::string("KEY_NAME", "id1"))
                    .with_constant(ConstDecl::string("OTHER", "other")),
            )
            .unwrap();
        (table, ResolutionContext::in_class(foo))
    }

    fn my_shape(table: &SymbolTable, open: bool) -> ShapeType {
        crate::hir::build_shape_type(
            table,
            &[
                FieldSpec::required(ConstRef::class_const("Foo", "KEY_NAME"), Ty::Int),
                FieldSpec::optional(ConstRef::string("note"), Ty::String),
            ],
            open,
            ResolutionContext::top_level(),
        )
        .unwrap()
    }

    fn loc(start: u32) -> Location {
        Location::new(FileId::new(0), start, start + 1)
    }

    #[test]
    fn test_pure_access_via_self() {
        let (table, ctx) = setup();
        let shape = my_shape(&table, false);

        assert_eq!(
            check_field_access(&table, &shape, &ConstRef::self_const("KEY_NAME"), ctx),
            Ok(Ty::Int)
        );
    }

    #[test]
    fn test_pure_access_closed_vs_open() {
        let (table, ctx) = setup();
        let key = ConstRef::self_const("OTHER");

        assert!(matches!(
            check_field_access(&table, &my_shape(&table, false), &key, ctx),
            Err(CheckError::UnknownShapeField { .. })
        ));
        assert_eq!(
            check_field_access(&table, &my_shape(&table, true), &key, ctx),
            Ok(Ty::Mixed)
        );
    }

    #[test]
    fn test_optional_field_access_allowed() {
        let (table, ctx) = setup();
        let shape = my_shape(&table, false);
        let mut checker = ShapeChecker::new(&table);

        let ty = checker.check_field_access(&shape, &ConstRef::string("note"), ctx, loc(0));
        assert_eq!(ty, Ty::String);
        assert!(checker.diagnostics().is_empty());
    }

    #[test]
    fn test_optional_field_access_warns_when_configured() {
        let (table, ctx) = setup();
        let shape = my_shape(&table, false);
        let mut checker = ShapeChecker::new(&table).with_options(CheckOptions {
            optional_field_access: OptionalFieldAccess::Warn,
        });

        let ty = checker.check_field_access(&shape, &ConstRef::string("note"), ctx, loc(0));
        assert_eq!(ty, Ty::String);
        let diags = checker.finish();
        assert_eq!(diags.len(), 1);
        assert!(!diags[0].is_error());
        assert_eq!(diags[0].code.as_deref(), Some(codes::OPTIONAL_FIELD_ACCESS));
    }

    #[test]
    fn test_checker_recovers_with_error_type() {
        let (table, ctx) = setup();
        let shape = my_shape(&table, false);
        let mut checker = ShapeChecker::new(&table);

        let a = checker.check_field_access(&shape, &ConstRef::self_const("MISSING"), ctx, loc(1));
        let b =
            checker.check_field_access(&shape, &ConstRef::parent_const("KEY_NAME"), ctx, loc(2));
        let c = checker.check_field_access(&shape, &ConstRef::self_const("KEY_NAME"), ctx, loc(3));

        assert_eq!(a, Ty::Error);
        assert_eq!(b, Ty::Error);
        assert_eq!(c, Ty::Int);
        let diags = checker.finish();
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].code.as_deref(), Some(codes::UNKNOWN_CONSTANT));
        assert_eq!(diags[0].location, loc(1));
        assert_eq!(diags[1].code.as_deref(), Some(codes::NO_PARENT));
    }

    #[test]
    fn test_build_shape_reports_each_field() {
        let (table, ctx) = setup();
        let mut checker = ShapeChecker::new(&table);

        let shape = checker.build_shape(
            &[
                FieldSpec::required(ConstRef::self_const("KEY_NAME"), Ty::Int).at(loc(10)),
                FieldSpec::required(ConstRef::string("id1"), Ty::Int).at(loc(20)),
                FieldSpec::required(ConstRef::class_const("Nope", "K"), Ty::Int).at(loc(30)),
            ],
            false,
            ctx,
        );

        assert_eq!(shape.len(), 1);
        let diags = checker.finish();
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].code.as_deref(), Some(codes::DUPLICATE_SHAPE_KEY));
        assert_eq!(diags[0].location, loc(20));
        assert_eq!(diags[0].related[0].location, loc(10));
        assert_eq!(diags[1].code.as_deref(), Some(codes::UNKNOWN_CLASS));
    }

    #[test]
    fn test_check_index_through_alias() {
        let (mut table, _) = setup();
        let shape = my_shape(&table, false);
        table
            .declare_type_alias("MyShape", Ty::shape(shape), Location::detached())
            .unwrap();
        let foo = table.lookup_class("Foo").unwrap();
        let mut checker = ShapeChecker::new(&table);

        let ty = checker.check_index(
            &Ty::named("MyShape"),
            &ConstRef::self_const("KEY_NAME"),
            ResolutionContext::in_class(foo),
            loc(0),
        );
        assert_eq!(ty, Ty::Int);

        let not_shape = checker.check_index(
            &Ty::Int,
            &ConstRef::string("x"),
            ResolutionContext::top_level(),
            loc(5),
        );
        assert_eq!(not_shape, Ty::Error);
        assert_eq!(checker.diagnostics()[0].code.as_deref(), Some(codes::NOT_A_SHAPE));
    }

    #[test]
    fn test_index_on_error_type_is_silent() {
        let (table, ctx) = setup();
        let mut checker = ShapeChecker::new(&table);

        assert_eq!(checker.check_index(&Ty::Error, &ConstRef::string("x"), ctx, loc(0)), Ty::Error);
        assert!(checker.diagnostics().is_empty());
    }

    #[test]
    fn test_idx_access() {
        let (table, ctx) = setup();
        let shape = Ty::shape(my_shape(&table, true));
        let mut checker = ShapeChecker::new(&table);

        let key = ConstRef::self_const("KEY_NAME");
        assert_eq!(checker.check_idx(&shape, &key, None, ctx, loc(0)), Ty::nullable(Ty::Int));
        assert_eq!(checker.check_idx(&shape, &key, Some(&Ty::Int), ctx, loc(0)), Ty::Int);
        assert_eq!(
            checker.check_idx(&shape, &key, Some(&Ty::Null), ctx, loc(0)),
            Ty::nullable(Ty::Int)
        );
        assert_eq!(checker.check_idx(&shape, &key, Some(&Ty::String), ctx, loc(0)), Ty::Mixed);
        assert_eq!(
            checker.check_idx(&shape, &ConstRef::string("undeclared"), None, ctx, loc(0)),
            Ty::Mixed
        );
        assert!(checker.diagnostics().is_empty());
    }

    #[test]
    fn test_shape_literal_ok() {
        let (table, ctx) = setup();
        let expected = Ty::shape(my_shape(&table, false));
        let mut checker = ShapeChecker::new(&table);

        let ty = checker.check_shape_literal(
            &expected,
            &[LiteralField::new(ConstRef::self_const("KEY_NAME"), Ty::Int)],
            ctx,
            loc(0),
        );
        assert_eq!(ty, expected);
        assert!(checker.diagnostics().is_empty());
    }

    #[test]
    fn test_shape_literal_errors() {
        let (table, ctx) = setup();
        let expected = Ty::shape(my_shape(&table, false));
        let mut checker = ShapeChecker::new(&table);

        let ty = checker.check_shape_literal(
            &expected,
            &[
                LiteralField::new(ConstRef::string("note"), Ty::Int).at(loc(1)),
                LiteralField::new(ConstRef::self_const("OTHER"), Ty::Int).at(loc(2)),
                LiteralField::new(ConstRef::string("note"), Ty::String).at(loc(3)),
            ],
            ctx,
            loc(0),
        );

        assert_eq!(ty, Ty::Error);
        let codes_seen: Vec<_> = checker
            .diagnostics()
            .iter()
            .map(|d| d.code.as_deref().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            codes_seen,
            vec![
                codes::FIELD_TYPE_MISMATCH,
                codes::UNKNOWN_SHAPE_FIELD,
                codes::DUPLICATE_SHAPE_KEY,
                codes::MISSING_REQUIRED_FIELD,
            ]
        );
        assert_eq!(checker.diagnostics()[3].location, loc(0));
    }

    #[test]
    fn test_shape_literal_skips_missing_after_unresolved_key() {
        let (table, ctx) = setup();
        let expected = Ty::shape(my_shape(&table, false));
        let mut checker = ShapeChecker::new(&table);

        checker.check_shape_literal(
            &expected,
            &[LiteralField::new(ConstRef::self_const("TYPO"), Ty::Int)],
            ctx,
            loc(0),
        );

        let diags = checker.finish();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code.as_deref(), Some(codes::UNKNOWN_CONSTANT));
    }

    #[test]
    fn test_check_batch_preserves_order() {
        let (table, ctx) = setup();
        let shape = Ty::shape(my_shape(&table, false));
        let requests: Vec<_> = (0..32)
            .map(|i| CheckRequest::FieldAccess {
                receiver: shape.clone(),
                key: if i % 2 == 0 {
                    ConstRef::self_const("KEY_NAME")
                } else {
                    ConstRef::string("missing")
                },
                context: ctx,
                location: loc(i),
            })
            .collect();

        let outcomes = check_batch(&table, CheckOptions::default(), &requests);

        assert_eq!(outcomes.len(), 32);
        for (i, outcome) in outcomes.iter().enumerate() {
            if i % 2 == 0 {
                assert_eq!(outcome.ty, Ty::Int);
                assert!(outcome.diagnostics.is_empty());
            } else {
                assert_eq!(outcome.ty, Ty::Error);
                assert_eq!(outcome.diagnostics[0].location, loc(i as u32));
            }
        }
    }
}
