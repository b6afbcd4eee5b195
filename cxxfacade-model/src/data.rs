//! Abstract type records.
//!
//! [`TypeData`] is the front-end-produced record for one
//! class/struct/interface/enum. Records are created once at load time and
//! never mutated by the engine. Nested types are modeled as references into
//! the owning [`crate::collection::TypeCollection`] rather than as owned
//! children, so the declaring-type relation never forms an ownership cycle.

use crate::members::{Field, Method, Property};
use crate::types::{Attribute, Specifier, TypeKind, TypeRef};
use serde::{Deserialize, Serialize};

/// The abstract record for one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeData {
    /// This type's own reference.
    pub this: TypeRef,
    /// Kind of the type.
    pub kind: TypeKind,
    /// Parent type, if any. Single inheritance only.
    pub parent: Option<TypeRef>,
    /// Implemented interfaces.
    pub interfaces: Vec<TypeRef>,
    /// Attributes, kept for traceability comments.
    pub attributes: Vec<Attribute>,
    /// Raw specifiers (`public`, `static`, `sealed`, ...).
    pub specifiers: Vec<Specifier>,
    /// Fields, in declaration order.
    pub fields: Vec<Field>,
    /// Properties, in declaration order.
    pub properties: Vec<Property>,
    /// Methods, in declaration order.
    pub methods: Vec<Method>,
    /// References to nested types, in declaration order. Each must be
    /// registered in the same collection.
    pub nested: Vec<TypeRef>,
    /// Declaring type, for nested types.
    pub declaring: Option<TypeRef>,
    /// Index of the type definition in the source image, for traceability.
    pub type_def_index: i64,
}

impl TypeData {
    /// Creates an empty type record.
    #[must_use]
    pub fn new(this: TypeRef, kind: TypeKind) -> Self {
        Self {
            this,
            kind,
            parent: None,
            interfaces: Vec::new(),
            attributes: Vec::new(),
            specifiers: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
            declaring: None,
            type_def_index: -1,
        }
    }

    /// Sets the parent type.
    #[must_use]
    pub fn with_parent(mut self, parent: TypeRef) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Adds an implemented interface.
    #[must_use]
    pub fn with_interface(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds a method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Records a nested type reference. The referenced record must carry
    /// this type in its `declaring` slot.
    #[must_use]
    pub fn with_nested(mut self, nested: TypeRef) -> Self {
        self.nested.push(nested);
        self
    }

    /// Adds specifiers.
    #[must_use]
    pub fn with_specifiers(mut self, specifiers: &[&str]) -> Self {
        self.specifiers
            .extend(specifiers.iter().map(|s| Specifier::new(*s)));
        self
    }

    /// Returns true if this record describes a nested type.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.declaring.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKind;

    #[test]
    fn test_type_data_builder() {
        let data = TypeData::new(TypeRef::new("Game", "Player"), TypeKind::Class)
            .with_parent(TypeRef::new("System", "Object"))
            .with_interface(TypeRef::new("Game", "IUpdatable"))
            .with_specifiers(&["public", "sealed"]);

        assert_eq!(data.this.name, "Player");
        assert!(data.parent.is_some());
        assert_eq!(data.interfaces.len(), 1);
        assert!(!data.is_nested());
    }
}
