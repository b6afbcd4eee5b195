//! Member definitions: fields, properties, and methods.
//!
//! Each member carries enough classification (storage kind, specifiers,
//! byte offset) for the serialization engine to decide need-as policy and
//! to emit traceability comments.

use crate::types::{Attribute, Specifier, StorageKind, TypeRef, is_static};
use serde::{Deserialize, Serialize};

/// A field of a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Referenced field type.
    pub ty: TypeRef,
    /// Storage classification of the field type at this use site.
    pub storage: StorageKind,
    /// Byte offset within the object layout, for traceability comments.
    pub offset: u32,
    /// Raw specifiers (`public`, `static`, ...).
    pub specifiers: Vec<Specifier>,
    /// Attributes, kept for traceability comments.
    pub attributes: Vec<Attribute>,
}

impl Field {
    /// Creates a field.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef, storage: StorageKind, offset: u32) -> Self {
        Self {
            name: name.into(),
            ty,
            storage,
            offset,
            specifiers: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Adds specifiers to the field.
    #[must_use]
    pub fn with_specifiers(mut self, specifiers: &[&str]) -> Self {
        self.specifiers
            .extend(specifiers.iter().map(|s| Specifier::new(*s)));
        self
    }

    /// Returns true if this is a static field.
    #[must_use]
    pub fn is_static(&self) -> bool {
        is_static(&self.specifiers)
    }
}

/// A property of a type.
///
/// Properties surface in the output only as traceability comments; their
/// accessors already exist as methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Referenced property type.
    pub ty: TypeRef,
    /// Storage classification of the property type.
    pub storage: StorageKind,
    /// Whether the property has a getter.
    pub has_get: bool,
    /// Whether the property has a setter.
    pub has_set: bool,
    /// Raw specifiers.
    pub specifiers: Vec<Specifier>,
}

impl Property {
    /// Creates a property.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        ty: TypeRef,
        storage: StorageKind,
        has_get: bool,
        has_set: bool,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            storage,
            has_get,
            has_set,
            specifiers: Vec::new(),
        }
    }
}

/// Flags on a method parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParamFlags {
    /// Plain by-value parameter.
    #[default]
    None,
    /// By-reference parameter.
    Ref,
    /// Output parameter.
    Out,
    /// Variadic parameter pack.
    Params,
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Referenced parameter type.
    pub ty: TypeRef,
    /// Storage classification of the parameter type.
    pub storage: StorageKind,
    /// Parameter flags.
    pub flags: ParamFlags,
}

impl Param {
    /// Creates a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef, storage: StorageKind) -> Self {
        Self {
            name: name.into(),
            ty,
            storage,
            flags: ParamFlags::None,
        }
    }
}

/// A method of a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    /// Method name as found by the front end (may contain `.` or `<>`).
    pub name: String,
    /// Referenced return type.
    pub return_ty: TypeRef,
    /// Storage classification of the return type.
    pub return_storage: StorageKind,
    /// Ordered parameters.
    pub params: Vec<Param>,
    /// Raw specifiers.
    pub specifiers: Vec<Specifier>,
    /// Byte offset of the method body in the runtime image.
    pub offset: u64,
    /// Whether the method itself has unbound generic parameters.
    pub generic: bool,
    /// Interface slot this method implements, if any.
    pub implemented_from: Option<TypeRef>,
    /// Whether the method hides or overrides a base declaration.
    pub hides_base: bool,
}

impl Method {
    /// Creates a method.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        return_ty: TypeRef,
        return_storage: StorageKind,
        offset: u64,
    ) -> Self {
        Self {
            name: name.into(),
            return_ty,
            return_storage,
            params: Vec::new(),
            specifiers: Vec::new(),
            offset,
            generic: false,
            implemented_from: None,
            hides_base: false,
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Adds specifiers.
    #[must_use]
    pub fn with_specifiers(mut self, specifiers: &[&str]) -> Self {
        self.specifiers
            .extend(specifiers.iter().map(|s| Specifier::new(*s)));
        self
    }

    /// Returns true if this is a static method.
    #[must_use]
    pub fn is_static(&self) -> bool {
        is_static(&self.specifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StorageKind;

    #[test]
    fn test_field_static() {
        let f = Field::new(
            "counter",
            TypeRef::new("System", "Int32"),
            StorageKind::Value,
            0x10,
        )
        .with_specifiers(&["public", "static"]);
        assert!(f.is_static());

        let g = Field::new(
            "value",
            TypeRef::new("System", "Int32"),
            StorageKind::Value,
            0x14,
        );
        assert!(!g.is_static());
    }

    #[test]
    fn test_method_builder() {
        let m = Method::new("Update", TypeRef::void(), StorageKind::Value, 0x1234)
            .with_param(Param::new(
                "delta",
                TypeRef::new("System", "Single"),
                StorageKind::Value,
            ))
            .with_specifiers(&["public"]);
        assert_eq!(m.params.len(), 1);
        assert!(!m.is_static());
        assert!(m.return_ty.is_void());
    }
}
