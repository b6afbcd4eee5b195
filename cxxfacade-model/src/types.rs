//! Type references and classification.
//!
//! This module contains [`TypeRef`], the structural identity of a referenced
//! type, together with the small closed enums used to classify types,
//! storage kinds, and member specifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a referenced type.
///
/// Two `TypeRef`s are equal iff namespace, name, enclosing chain, and
/// generic arity/arguments match structurally. The same logical type may be
/// represented by independently constructed instances from different call
/// sites, so equality and hashing are never identity-based.
///
/// `Ord` is derived so that every set of references the engine iterates for
/// visible output has a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeRef {
    /// Namespace of the type (dot-separated, possibly empty).
    pub namespace: String,
    /// Simple name of the type.
    pub name: String,
    /// Enclosing type, for nested types.
    pub declaring: Option<Box<TypeRef>>,
    /// Ordered generic arguments or parameters.
    pub generics: Vec<TypeRef>,
    /// Whether the generic list is unbound parameters, bound arguments, or
    /// absent.
    pub generic_kind: GenericKind,
}

impl TypeRef {
    /// Creates a non-generic, non-nested type reference.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            declaring: None,
            generics: Vec::new(),
            generic_kind: GenericKind::None,
        }
    }

    /// Creates a generic template reference with unbound parameter names.
    #[must_use]
    pub fn generic_template(
        namespace: impl Into<String>,
        name: impl Into<String>,
        params: &[&str],
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            declaring: None,
            generics: params.iter().map(|p| TypeRef::new("", *p)).collect(),
            generic_kind: GenericKind::Template,
        }
    }

    /// Creates a generic instantiation reference with bound arguments.
    #[must_use]
    pub fn instantiation(
        namespace: impl Into<String>,
        name: impl Into<String>,
        args: Vec<TypeRef>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            declaring: None,
            generics: args,
            generic_kind: GenericKind::Instantiation,
        }
    }

    /// Returns this reference nested inside the given declaring type.
    #[must_use]
    pub fn with_declaring(mut self, declaring: TypeRef) -> Self {
        self.declaring = Some(Box::new(declaring));
        self
    }

    /// The reference for `System.Void`.
    #[must_use]
    pub fn void() -> Self {
        Self::new("System", "Void")
    }

    /// Returns true if this reference is `System.Void`.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.namespace == "System" && self.name == "Void" && self.declaring.is_none()
    }

    /// Returns true if this reference carries any generic list.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.generic_kind != GenericKind::None
    }

    /// Returns true if this is a generic template (unbound parameters).
    #[must_use]
    pub fn is_generic_template(&self) -> bool {
        self.generic_kind == GenericKind::Template
    }

    /// Returns true if this is a generic instantiation (bound arguments).
    #[must_use]
    pub fn is_generic_instantiation(&self) -> bool {
        self.generic_kind == GenericKind::Instantiation
    }

    /// Walks the enclosing-type chain from outermost to innermost,
    /// excluding `self`.
    #[must_use]
    pub fn declaring_chain(&self) -> Vec<&TypeRef> {
        let mut chain = Vec::new();
        let mut cur = self.declaring.as_deref();
        while let Some(d) = cur {
            chain.push(d);
            cur = d.declaring.as_deref();
        }
        chain.reverse();
        chain
    }

    /// Namespace of the outermost enclosing type, or of `self` when not
    /// nested.
    #[must_use]
    pub fn root_namespace(&self) -> &str {
        self.declaring_chain()
            .first()
            .map_or(self.namespace.as_str(), |d| d.namespace.as_str())
    }

    /// The original, dot-separated qualified name, with `/` separating
    /// nested type names (e.g. `System.Collections.Outer/Inner`).
    #[must_use]
    pub fn qualified_name(&self) -> String {
        let mut s = String::new();
        let ns = self.root_namespace();
        if !ns.is_empty() {
            s.push_str(ns);
            s.push('.');
        }
        for d in self.declaring_chain() {
            s.push_str(&d.name);
            s.push('/');
        }
        s.push_str(&self.name);
        if self.is_generic() {
            s.push('<');
            for (i, g) in self.generics.iter().enumerate() {
                if i != 0 {
                    s.push_str(", ");
                }
                s.push_str(&g.qualified_name());
            }
            s.push('>');
        }
        s
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Flavor of a generic list on a [`TypeRef`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum GenericKind {
    /// No generic list.
    #[default]
    None,
    /// Unbound generic parameters (a template).
    Template,
    /// Bound generic arguments (an instantiation).
    Instantiation,
}

/// Kind of an abstract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// Reference type with single inheritance.
    Class,
    /// Value type.
    Struct,
    /// Interface type; never emitted as a definition unit.
    Interface,
    /// Enumeration; modeled as a value type.
    Enum,
}

impl TypeKind {
    /// The C++ keyword used when declaring a type of this kind.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Class | Self::Interface => "class",
            Self::Struct | Self::Enum => "struct",
        }
    }

    /// Returns true if instances have value semantics (layout matters at
    /// every use site).
    #[must_use]
    pub const fn is_value_kind(&self) -> bool {
        matches!(self, Self::Struct | Self::Enum)
    }
}

/// Storage classification of a type reference at a particular use site.
///
/// Drives the need-as policy: value-kind use sites force a full definition
/// of the referenced type, every other kind is satisfied by a forward
/// declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StorageKind {
    /// Stored inline; the full layout of the type is required.
    #[default]
    Value,
    /// Reference to a heap object; rendered as a pointer.
    Reference,
    /// Raw pointer-like storage.
    Pointer,
    /// An unbound generic parameter of the enclosing template.
    GenericParam,
}

impl StorageKind {
    /// Returns true if a use site with this storage needs the referenced
    /// type's full definition.
    #[must_use]
    pub const fn needs_definition(&self) -> bool {
        matches!(self, Self::Value)
    }

    /// Returns true if the rendered C++ type carries a trailing `*`.
    #[must_use]
    pub const fn is_indirect(&self) -> bool {
        matches!(self, Self::Reference | Self::Pointer)
    }
}

/// A raw specifier token attached to a type or member (`public`, `static`,
/// `sealed`, ...). Kept as free text; only a few tokens are meaningful to
/// the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Specifier(pub String);

impl Specifier {
    /// Creates a specifier from a token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns true if this is the `static` specifier.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.0 == "static"
    }

    /// Returns true if this is the `const` specifier.
    #[must_use]
    pub fn is_const(&self) -> bool {
        self.0 == "const"
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An attribute attached to a type or member, kept for traceability
/// comments only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name as found by the front end.
    pub name: String,
}

impl Attribute {
    /// Creates an attribute.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Returns true for the specifier list convention used by front ends.
#[must_use]
pub fn is_static(specifiers: &[Specifier]) -> bool {
    specifiers.iter().any(Specifier::is_static)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_structural_equality() {
        let a = TypeRef::new("System", "Object");
        let b = TypeRef::new("System", "Object");
        assert_eq!(a, b);

        let c = TypeRef::new("Game", "Object");
        assert_ne!(a, c);
    }

    #[test]
    fn test_type_ref_generic_equality() {
        let a = TypeRef::instantiation("System", "List", vec![TypeRef::new("System", "Int32")]);
        let b = TypeRef::instantiation("System", "List", vec![TypeRef::new("System", "Int32")]);
        let c = TypeRef::instantiation("System", "List", vec![TypeRef::new("System", "Int64")]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_declaring_chain() {
        let outer = TypeRef::new("Game", "Outer");
        let mid = TypeRef::new("Game", "Mid").with_declaring(outer.clone());
        let inner = TypeRef::new("Game", "Inner").with_declaring(mid.clone());

        let chain = inner.declaring_chain();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].name, "Outer");
        assert_eq!(chain[1].name, "Mid");
        assert_eq!(inner.root_namespace(), "Game");
    }

    #[test]
    fn test_qualified_name() {
        let outer = TypeRef::new("Game", "Outer");
        let inner = TypeRef::new("Game", "Inner").with_declaring(outer);
        assert_eq!(inner.qualified_name(), "Game.Outer/Inner");

        let list = TypeRef::generic_template("System", "List", &["T"]);
        assert_eq!(list.qualified_name(), "System.List<T>");
    }

    #[test]
    fn test_void() {
        assert!(TypeRef::void().is_void());
        assert!(!TypeRef::new("System", "Int32").is_void());
    }

    #[test]
    fn test_storage_kind_policy() {
        assert!(StorageKind::Value.needs_definition());
        assert!(!StorageKind::Reference.needs_definition());
        assert!(!StorageKind::GenericParam.needs_definition());
        assert!(StorageKind::Reference.is_indirect());
        assert!(!StorageKind::Value.is_indirect());
    }

    #[test]
    fn test_type_kind_keyword() {
        assert_eq!(TypeKind::Class.keyword(), "class");
        assert_eq!(TypeKind::Struct.keyword(), "struct");
        assert_eq!(TypeKind::Enum.keyword(), "struct");
        assert!(TypeKind::Enum.is_value_kind());
        assert!(!TypeKind::Class.is_value_kind());
    }

    #[test]
    fn test_specifiers() {
        let specs = vec![Specifier::new("public"), Specifier::new("static")];
        assert!(is_static(&specs));
        assert!(!is_static(&[Specifier::new("public")]));
    }
}
