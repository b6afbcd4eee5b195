//! The frozen type universe.
//!
//! [`TypeCollection`] is the global map from type reference to type record.
//! It is built once, in a single write phase, by
//! [`TypeCollectionBuilder`]; after `build` it is immutable. The
//! serialization engine treats it as read-only throughout resolution and
//! emission.

use crate::data::TypeData;
use crate::error::ModelError;
use crate::types::TypeRef;
use std::collections::BTreeMap;

/// Erased lookup key: root namespace, nested name path, generic arity.
///
/// A generic instantiation resolves to the record of its template through
/// this key, since the instantiation's bound arguments never match the
/// template's unbound parameters structurally.
fn erased_key(ty: &TypeRef) -> (String, String, usize) {
    let mut path = String::new();
    for d in ty.declaring_chain() {
        path.push_str(&d.name);
        path.push('/');
    }
    path.push_str(&ty.name);
    (ty.root_namespace().to_string(), path, ty.generics.len())
}

/// Immutable collection of all known types.
#[derive(Debug, Clone, Default)]
pub struct TypeCollection {
    types: Vec<TypeData>,
    index: BTreeMap<TypeRef, usize>,
    erased: BTreeMap<(String, String, usize), usize>,
}

impl TypeCollection {
    /// Resolves a reference to its type record.
    ///
    /// Exact structural matches win; a generic instantiation falls back to
    /// the record of the matching template.
    #[must_use]
    pub fn resolve(&self, ty: &TypeRef) -> Option<&TypeData> {
        if let Some(&idx) = self.index.get(ty) {
            return Some(&self.types[idx]);
        }
        if ty.is_generic_instantiation() {
            if let Some(&idx) = self.erased.get(&erased_key(ty)) {
                return Some(&self.types[idx]);
            }
        }
        None
    }

    /// Returns true if the reference resolves to a registered type.
    #[must_use]
    pub fn contains(&self, ty: &TypeRef) -> bool {
        self.resolve(ty).is_some()
    }

    /// All registered types, in registration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeData> {
        self.types.iter()
    }

    /// All registered top-level (non-nested) types, in registration order.
    pub fn top_level(&self) -> impl Iterator<Item = &TypeData> {
        self.types.iter().filter(|t| !t.is_nested())
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Single-phase builder for a [`TypeCollection`].
#[derive(Debug, Default)]
pub struct TypeCollectionBuilder {
    collection: TypeCollection,
}

impl TypeCollectionBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type record.
    ///
    /// # Errors
    /// Returns `ModelError::DuplicateType` if a record with the same
    /// reference is already registered.
    pub fn add_type(&mut self, data: TypeData) -> Result<(), ModelError> {
        if self.collection.index.contains_key(&data.this) {
            return Err(ModelError::duplicate(data.this.qualified_name()));
        }
        let idx = self.collection.types.len();
        self.collection.index.insert(data.this.clone(), idx);
        self.collection.erased.insert(erased_key(&data.this), idx);
        self.collection.types.push(data);
        Ok(())
    }

    /// Registers a type record, consuming the builder fluently.
    ///
    /// # Errors
    /// Returns `ModelError::DuplicateType` on duplicate registration.
    pub fn with_type(mut self, data: TypeData) -> Result<Self, ModelError> {
        self.add_type(data)?;
        Ok(self)
    }

    /// Freezes the collection.
    ///
    /// Validates the nested-type relation: every nested reference must be
    /// registered and must name its declaring type.
    ///
    /// # Errors
    /// Returns `ModelError` if a nested reference is unknown or a nested
    /// record is missing its declaring back-reference.
    pub fn build(self) -> Result<TypeCollection, ModelError> {
        for data in &self.collection.types {
            for nested in &data.nested {
                let Some(child) = self.collection.resolve(nested) else {
                    return Err(ModelError::UnknownNested {
                        declaring: data.this.qualified_name(),
                        nested: nested.qualified_name(),
                    });
                };
                if child.declaring.as_ref() != Some(&data.this) {
                    return Err(ModelError::MissingDeclaring {
                        declaring: data.this.qualified_name(),
                        nested: child.this.qualified_name(),
                    });
                }
            }
        }
        Ok(self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TypeKind, TypeRef};

    #[test]
    fn test_register_and_resolve() {
        let mut builder = TypeCollectionBuilder::new();
        builder
            .add_type(TypeData::new(
                TypeRef::new("Game", "Player"),
                TypeKind::Class,
            ))
            .expect("register");
        let collection = builder.build().expect("build");

        assert!(collection.contains(&TypeRef::new("Game", "Player")));
        assert!(!collection.contains(&TypeRef::new("Game", "Enemy")));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut builder = TypeCollectionBuilder::new();
        builder
            .add_type(TypeData::new(
                TypeRef::new("Game", "Player"),
                TypeKind::Class,
            ))
            .expect("register");
        let err = builder
            .add_type(TypeData::new(
                TypeRef::new("Game", "Player"),
                TypeKind::Class,
            ))
            .expect_err("duplicate must fail");
        assert!(matches!(err, ModelError::DuplicateType { .. }));
    }

    #[test]
    fn test_instantiation_resolves_to_template() {
        let mut builder = TypeCollectionBuilder::new();
        builder
            .add_type(TypeData::new(
                TypeRef::generic_template("System", "List", &["T"]),
                TypeKind::Class,
            ))
            .expect("register");
        let collection = builder.build().expect("build");

        let inst = TypeRef::instantiation("System", "List", vec![TypeRef::new("System", "Int32")]);
        let resolved = collection.resolve(&inst).expect("template lookup");
        assert!(resolved.this.is_generic_template());
    }

    #[test]
    fn test_unknown_nested_fails_build() {
        let mut builder = TypeCollectionBuilder::new();
        builder
            .add_type(
                TypeData::new(TypeRef::new("Game", "Outer"), TypeKind::Class)
                    .with_nested(TypeRef::new("Game", "Inner")),
            )
            .expect("register");
        let err = builder.build().expect_err("unknown nested must fail");
        assert!(matches!(err, ModelError::UnknownNested { .. }));
    }

    #[test]
    fn test_nested_requires_declaring_back_reference() {
        let outer = TypeRef::new("Game", "Outer");
        let inner = TypeRef::new("Game", "Inner").with_declaring(outer.clone());

        let mut builder = TypeCollectionBuilder::new();
        builder
            .add_type(TypeData::new(outer.clone(), TypeKind::Class).with_nested(inner.clone()))
            .expect("register outer");
        // Inner registered without its declaring back-reference.
        builder
            .add_type(TypeData::new(inner.clone(), TypeKind::Struct))
            .expect("register inner");
        let err = builder.build().expect_err("missing declaring must fail");
        assert!(matches!(err, ModelError::MissingDeclaring { .. }));
    }
}
