//! Error types for model construction.

use thiserror::Error;

/// Error type for building a type collection.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A type with the same reference was registered twice.
    #[error("duplicate type registration: '{name}'")]
    DuplicateType {
        /// Qualified name of the duplicate.
        name: String,
    },

    /// A nested-type reference does not resolve to a registered type.
    #[error("type '{declaring}' declares unknown nested type '{nested}'")]
    UnknownNested {
        /// Qualified name of the declaring type.
        declaring: String,
        /// Qualified name of the missing nested reference.
        nested: String,
    },

    /// A nested type does not name its declaring type.
    #[error("nested type '{nested}' is missing its declaring reference to '{declaring}'")]
    MissingDeclaring {
        /// Qualified name of the declaring type.
        declaring: String,
        /// Qualified name of the nested type.
        nested: String,
    },
}

impl ModelError {
    /// Creates a duplicate-type error.
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateType { name: name.into() }
    }
}
