//! Error types for context resolution and unit emission.

use cxxfacade_model::{ModelError, TypeRef};
use thiserror::Error;

/// Error type for context resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A type reference has no corresponding record in the known universe.
    #[error("unresolved type reference: '{missing}' referenced by '{referencer}'")]
    UnresolvedType {
        /// Type whose resolution required the missing reference.
        referencer: TypeRef,
        /// The reference that could not be resolved.
        missing: TypeRef,
    },

    /// A type record exists but no context was registered for it before
    /// resolution began.
    #[error("type '{name}' is not registered in the context map")]
    NotRegistered {
        /// The unregistered type.
        name: TypeRef,
    },

    /// Resolution re-entered a (context, view) pair that is already in
    /// progress.
    #[error("resolution re-entered for '{name}' while already in progress")]
    ResolutionInProgress {
        /// The type whose resolution was re-entered.
        name: TypeRef,
    },
}

/// Error type for unit emission.
#[derive(Debug, Error)]
pub enum EmitError {
    /// A forward-declaration target is a nested type whose declaring type
    /// is not reachable in the current unit's nested hierarchy.
    #[error(
        "nested type '{nested}' cannot be forward declared by '{unit}': its declaring type is not defined in this unit"
    )]
    InvalidNestedDeclaration {
        /// Type of the unit being emitted.
        unit: TypeRef,
        /// The offending nested reference.
        nested: TypeRef,
    },

    /// An output path was written twice.
    #[error("duplicate emission: output path '{path}' is already populated")]
    DuplicateEmission {
        /// The offending path.
        path: String,
    },

    /// A unit was emitted before its context was resolved for the
    /// required view.
    #[error("unit for '{name}' emitted before resolution for the {view} view")]
    MissingResolution {
        /// Type of the unit.
        name: TypeRef,
        /// View that was not resolved.
        view: String,
    },

    /// IO error while writing output files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error type for the generation engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Model construction error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Context resolution error.
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Unit emission error.
    #[error("emit error: {0}")]
    Emit(#[from] EmitError),
}

impl Error {
    /// Returns the inner resolution error, if this is one.
    #[must_use]
    pub fn as_resolve(&self) -> Option<&ResolveError> {
        match self {
            Self::Resolve(e) => Some(e),
            _ => None,
        }
    }
}
