//! Declaration records fed to the symbol table.
//!
//! These are the already-parsed class and constant declarations handed over
//! by the front end. They are plain data: the symbol table validates and
//! indexes them, the resolver interprets them.

use std::fmt;

use smol_str::SmolStr;

use crate::base::Location;

// ============================================================================
// LITERALS & CONSTANT REFERENCES
// ============================================================================

/// A compile-time scalar value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Int(i64),
    Str(SmolStr),
    Bool(bool),
}

impl Literal {
    /// Short name of the literal's type, for messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Int(_) => "int",
            Literal::Str(_) => "string",
            Literal::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Str(s) => write!(f, "'{}'", s),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(SmolStr::new(value))
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

/// The class part of a `X::NAME` reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassRef {
    /// `self::`
    Self_,
    /// `parent::`
    Parent,
    /// `ClassName::`
    Named(SmolStr),
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassRef::Self_ => f.write_str("self"),
            ClassRef::Parent => f.write_str("parent"),
            ClassRef::Named(name) => f.write_str(name),
        }
    }
}

/// A value position that may be a literal or a class constant.
///
/// Shape keys and constant initializers are written this way; they are
/// resolved to a [`Literal`] before anything compares them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstRef {
    Literal(Literal),
    ClassConst { class: ClassRef, name: SmolStr },
}

impl ConstRef {
    pub fn int(value: i64) -> Self {
        ConstRef::Literal(Literal::Int(value))
    }

    pub fn string(value: &str) -> Self {
        ConstRef::Literal(Literal::from(value))
    }

    /// `self::NAME`
    pub fn self_const(name: &str) -> Self {
        ConstRef::ClassConst {
            class: ClassRef::Self_,
            name: SmolStr::new(name),
        }
    }

    /// `parent::NAME`
    pub fn parent_const(name: &str) -> Self {
        ConstRef::ClassConst {
            class: ClassRef::Parent,
            name: SmolStr::new(name),
        }
    }

    /// `Class::NAME`
    pub fn class_const(class: &str, name: &str) -> Self {
        ConstRef::ClassConst {
            class: ClassRef::Named(SmolStr::new(class)),
            name: SmolStr::new(name),
        }
    }

    /// Check if this reference needs no symbol lookup.
    pub fn is_literal(&self) -> bool {
        matches!(self, ConstRef::Literal(_))
    }
}

impl fmt::Display for ConstRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstRef::Literal(lit) => write!(f, "{}", lit),
            ConstRef::ClassConst { class, name } => write!(f, "{}::{}", class, name),
        }
    }
}

// ============================================================================
// CONSTANT DECLARATIONS
// ============================================================================

/// The right-hand side of a constant declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstInit {
    Literal(Literal),
    /// `const string B = self::A;`
    Ref(ConstRef),
    /// `abstract const string A;`
    Abstract,
}

/// A class constant declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstDecl {
    pub name: SmolStr,
    pub init: ConstInit,
    pub location: Location,
}

impl ConstDecl {
    pub fn new(name: &str, init: ConstInit) -> Self {
        Self {
            name: SmolStr::new(name),
            init,
            location: Location::detached(),
        }
    }

    pub fn string(name: &str, value: &str) -> Self {
        Self::new(name, ConstInit::Literal(Literal::from(value)))
    }

    pub fn int(name: &str, value: i64) -> Self {
        Self::new(name, ConstInit::Literal(Literal::Int(value)))
    }

    pub fn bool(name: &str, value: bool) -> Self {
        Self::new(name, ConstInit::Literal(Literal::Bool(value)))
    }

    pub fn reference(name: &str, target: ConstRef) -> Self {
        Self::new(name, ConstInit::Ref(target))
    }

    pub fn abstract_const(name: &str) -> Self {
        Self::new(name, ConstInit::Abstract)
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.init, ConstInit::Abstract)
    }
}

// ============================================================================
// CLASS DECLARATIONS
// ============================================================================

/// Whether a declaration is a class or an interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
}

impl ClassKind {
    pub fn display(&self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
        }
    }
}

/// A class or interface declaration.
///
/// For interfaces, `interfaces` holds the `extends` list; for classes it
/// holds the `implements` list. `parent` is only meaningful for classes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: SmolStr,
    pub kind: ClassKind,
    pub is_abstract: bool,
    pub parent: Option<SmolStr>,
    pub interfaces: Vec<SmolStr>,
    /// Constants in declaration order.
    pub constants: Vec<ConstDecl>,
    pub location: Location,
}

impl ClassDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            kind: ClassKind::Class,
            is_abstract: false,
            parent: None,
            interfaces: Vec::new(),
            constants: Vec::new(),
            location: Location::detached(),
        }
    }

    pub fn interface(name: &str) -> Self {
        Self {
            kind: ClassKind::Interface,
            ..Self::new(name)
        }
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(SmolStr::new(parent));
        self
    }

    pub fn with_interface(mut self, interface: &str) -> Self {
        self.interfaces.push(SmolStr::new(interface));
        self
    }

    pub fn with_constant(mut self, constant: ConstDecl) -> Self {
        self.constants.push(constant);
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Find a constant declared directly on this class.
    pub fn own_constant(&self, name: &str) -> Option<&ConstDecl> {
        self.constants.iter().find(|c| c.name == name)
    }
}
