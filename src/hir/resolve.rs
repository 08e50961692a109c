//! Constant resolution: turning `self::NAME`, `parent::NAME` and
//! `Class::NAME` into compile-time literals.
//!
//! Resolution is a pure read of the [`SymbolTable`]:
//!
//! 1. **Class** - `self` / `parent` are taken relative to the
//!    [`ResolutionContext`]; explicit names go through the table.
//! 2. **Constant** - looked up from that class along the inheritance chain.
//! 3. **Value** - literal initializers are returned as-is; initializers that
//!    reference another constant are resolved in the *declaring* class, with
//!    a stack of in-progress constants to catch cycles.

use smol_str::SmolStr;
use tracing::trace;

use super::error::{CheckError, CheckResult};
use super::ids::ClassId;
use super::shape::ShapeKey;
use super::symbol_table::SymbolTable;
use super::symbols::{ClassRef, ConstInit, ConstRef, Literal};

// ============================================================================
// RESOLUTION CONTEXT
// ============================================================================

/// Lexical position a reference is resolved from.
///
/// Only the enclosing class matters; its parent is found through the table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    enclosing: Option<ClassId>,
}

impl ResolutionContext {
    /// Outside any class (e.g. a top-level `type` alias).
    pub fn top_level() -> Self {
        Self { enclosing: None }
    }

    /// Inside the body of `class`.
    pub fn in_class(class: ClassId) -> Self {
        Self {
            enclosing: Some(class),
        }
    }

    pub fn enclosing(&self) -> Option<ClassId> {
        self.enclosing
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolver for constant references against a finished symbol table.
#[derive(Clone, Copy, Debug)]
pub struct ConstResolver<'a> {
    table: &'a SymbolTable,
}

impl<'a> ConstResolver<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// Resolve a reference to its literal value.
    #[tracing::instrument(level = "trace", skip(self, reference), fields(reference = %reference))]
    pub fn resolve(
        &self,
        reference: &ConstRef,
        context: ResolutionContext,
    ) -> CheckResult<Literal> {
        let mut in_progress = Vec::new();
        self.resolve_in(reference, context, &mut in_progress)
    }

    /// Resolve a reference used as a shape key.
    ///
    /// Only int and string values are keys.
    pub fn resolve_key(
        &self,
        reference: &ConstRef,
        context: ResolutionContext,
    ) -> CheckResult<ShapeKey> {
        match self.resolve(reference, context)? {
            Literal::Int(i) => Ok(ShapeKey::Int(i)),
            Literal::Str(s) => Ok(ShapeKey::Str(s)),
            value @ Literal::Bool(_) => Err(CheckError::InvalidShapeKey {
                key: SmolStr::new(reference.to_string()),
                value,
            }),
        }
    }

    /// Resolve the class part of a `X::NAME` reference.
    pub fn resolve_class(
        &self,
        class: &ClassRef,
        context: ResolutionContext,
    ) -> CheckResult<ClassId> {
        match class {
            ClassRef::Self_ => context
                .enclosing
                .ok_or(CheckError::NoEnclosingClass { keyword: "self" }),
            ClassRef::Parent => {
                let Some(enclosing) = context.enclosing else {
                    return Err(CheckError::NoParent { class: None });
                };
                self.table
                    .parent_of(enclosing)?
                    .ok_or_else(|| CheckError::NoParent {
                        class: Some(self.table.class(enclosing).name.clone()),
                    })
            }
            ClassRef::Named(name) => self.table.lookup_class(name),
        }
    }

    fn resolve_in(
        &self,
        reference: &ConstRef,
        context: ResolutionContext,
        in_progress: &mut Vec<(ClassId, SmolStr)>,
    ) -> CheckResult<Literal> {
        let (class, name) = match reference {
            ConstRef::Literal(lit) => return Ok(lit.clone()),
            ConstRef::ClassConst { class, name } => (class, name),
        };

        let class_id = self.resolve_class(class, context)?;
        let found = self.table.lookup_constant(class_id, name)?;
        let declaring = &self.table.class(found.class).name;
        trace!(%reference, declared_in = %declaring, "found constant");

        match &found.decl.init {
            ConstInit::Literal(lit) => Ok(lit.clone()),
            ConstInit::Abstract => Err(CheckError::AbstractConstant {
                class: declaring.clone(),
                name: name.clone(),
            }),
            ConstInit::Ref(target) => {
                let key = (found.class, found.decl.name.clone());
                if in_progress.contains(&key) {
                    return Err(CheckError::CyclicConstant {
                        class: declaring.clone(),
                        name: name.clone(),
                    });
                }
                in_progress.push(key);
                let declaring_context = ResolutionContext::in_class(found.class);
                let value = self.resolve_in(target, declaring_context, in_progress);
                in_progress.pop();
                value
            }
        }
    }
}

/// Resolve a constant reference in `context`.
pub fn resolve_constant(
    table: &SymbolTable,
    reference: &ConstRef,
    context: ResolutionContext,
) -> CheckResult<Literal> {
    ConstResolver::new(table).resolve(reference, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::symbols::{ClassDecl, ConstDecl};

    fn table(decls: Vec<ClassDecl>) -> SymbolTable {
        let mut table = SymbolTable::new();
        for decl in decls {
            table.declare_class(decl).unwrap();
        }
        table
    }

    #[test]
    fn test_literal_resolves_to_itself() {
        let table = SymbolTable::new();
        let resolver = ConstResolver::new(&table);

        assert_eq!(
            resolver.resolve(&ConstRef::int(5), ResolutionContext::top_level()),
            Ok(Literal::Int(5))
        );
    }

    #[test]
    fn test_self_and_named_agree() {
        let table = table(vec![
            ClassDecl::new("Foo")
                .abstract_class()
                .with_constant(ConstDecl::string("KEY_NAME", "id1")),
        ]);
        let foo = table.lookup_class("Foo").unwrap();
        let resolver = ConstResolver::new(&table);

        let via_self =
            resolver.resolve(&ConstRef::self_const("KEY_NAME"), ResolutionContext::in_class(foo));
        let via_name = resolver.resolve(
            &ConstRef::class_const("Foo", "KEY_NAME"),
            ResolutionContext::top_level(),
        );

        assert_eq!(via_self, Ok(Literal::from("id1")));
        assert_eq!(via_self, via_name);
    }

    #[test]
    fn test_parent_reference() {
        let table = table(vec![
            ClassDecl::new("Base").with_constant(ConstDecl::string("K", "base")),
            ClassDecl::new("Child")
                .with_parent("Base")
                .with_constant(ConstDecl::string("K", "child")),
        ]);
        let child = table.lookup_class("Child").unwrap();
        let ctx = ResolutionContext::in_class(child);
        let resolver = ConstResolver::new(&table);

        assert_eq!(resolver.resolve(&ConstRef::self_const("K"), ctx), Ok(Literal::from("child")));
        assert_eq!(resolver.resolve(&ConstRef::parent_const("K"), ctx), Ok(Literal::from("base")));
    }

    #[test]
    fn test_parent_without_parent() {
        let table = table(vec![ClassDecl::new("Foo").with_constant(ConstDecl::int("K", 1))]);
        let foo = table.lookup_class("Foo").unwrap();
        let resolver = ConstResolver::new(&table);

        assert_eq!(
            resolver.resolve(&ConstRef::parent_const("K"), ResolutionContext::in_class(foo)),
            Err(CheckError::NoParent {
                class: Some(SmolStr::new("Foo"))
            })
        );
        assert_eq!(
            resolver.resolve(&ConstRef::parent_const("K"), ResolutionContext::top_level()),
            Err(CheckError::NoParent { class: None })
        );
    }

    #[test]
    fn test_undeclared_interface_keeps_inherited_constants() {
        let table = table(vec![
            ClassDecl::new("Base").with_constant(ConstDecl::string("K", "base")),
            ClassDecl::new("Child").with_parent("Base").with_interface("Gone"),
        ]);
        let ctx = ResolutionContext::in_class(table.lookup_class("Child").unwrap());

        assert_eq!(
            resolve_constant(&table, &ConstRef::self_const("K"), ctx),
            Ok(Literal::from("base"))
        );
    }

    #[test]
    fn test_self_outside_class() {
        let table = SymbolTable::new();
        assert_eq!(
            resolve_constant(&table, &ConstRef::self_const("K"), ResolutionContext::top_level()),
            Err(CheckError::NoEnclosingClass { keyword: "self" })
        );
    }

    #[test]
    fn test_reference_initializer_uses_declaring_class() {
        // Base::ALIAS = self::TARGET must read Base::TARGET even through Child.
        let table = table(vec![
            ClassDecl::new("Base")
                .with_constant(ConstDecl::string("TARGET", "base"))
                .with_constant(ConstDecl::reference("ALIAS", ConstRef::self_const("TARGET"))),
            ClassDecl::new("Child")
                .with_parent("Base")
                .with_constant(ConstDecl::string("TARGET", "child")),
        ]);

        assert_eq!(
            resolve_constant(
                &table,
                &ConstRef::class_const("Child", "ALIAS"),
                ResolutionContext::top_level()
            ),
            Ok(Literal::from("base"))
        );
    }

    #[test]
    fn test_cyclic_constants() {
        let table = table(vec![
            ClassDecl::new("A")
                .with_constant(ConstDecl::reference("X", ConstRef::class_const("B", "Y"))),
            ClassDecl::new("B")
                .with_constant(ConstDecl::reference("Y", ConstRef::class_const("A", "X"))),
        ]);

        let err = resolve_constant(
            &table,
            &ConstRef::class_const("A", "X"),
            ResolutionContext::top_level(),
        )
        .unwrap_err();
        assert!(matches!(err, CheckError::CyclicConstant { .. }));
    }

    #[test]
    fn test_abstract_constant_has_no_value() {
        let table = table(vec![
            ClassDecl::new("Foo")
                .abstract_class()
                .with_constant(ConstDecl::abstract_const("K")),
        ]);
        let foo = table.lookup_class("Foo").unwrap();

        assert_eq!(
            resolve_constant(&table, &ConstRef::self_const("K"), ResolutionContext::in_class(foo)),
            Err(CheckError::AbstractConstant {
                class: SmolStr::new("Foo"),
                name: SmolStr::new("K"),
            })
        );
    }

    #[test]
    fn test_unknown_class_and_constant() {
        let table = table(vec![ClassDecl::new("Foo").with_constant(ConstDecl::int("K", 1))]);
        let resolver = ConstResolver::new(&table);
        let ctx = ResolutionContext::top_level();

        assert!(matches!(
            resolver.resolve(&ConstRef::class_const("Bar", "K"), ctx),
            Err(CheckError::UnknownClass { .. })
        ));
        assert!(matches!(
            resolver.resolve(&ConstRef::class_const("Foo", "NOPE"), ctx),
            Err(CheckError::UnknownConstant { .. })
        ));
    }

    #[test]
    fn test_resolve_key_rejects_bool() {
        let table =
            table(vec![ClassDecl::new("Foo").with_constant(ConstDecl::bool("FLAG", false))]);
        let resolver = ConstResolver::new(&table);

        let err = resolver
            .resolve_key(&ConstRef::class_const("Foo", "FLAG"), ResolutionContext::top_level())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "shape key `Foo::FLAG` resolves to false, expected an int or string"
        );
    }
}
