//! # cxxfacade-model
//!
//! Language-agnostic model of object-oriented types for the cxxfacade
//! code generator.
//!
//! This crate provides:
//! - Structural type references ([`TypeRef`]) usable as map keys
//! - Abstract type records ([`TypeData`]) with fields, properties, methods,
//!   generics, nesting, and single inheritance
//! - The frozen type universe ([`TypeCollection`]) built in a single
//!   construction phase
//!
//! Front ends (assembly readers, dump parsers) live outside this workspace;
//! they all produce the same model defined here.

pub mod collection;
pub mod data;
pub mod error;
pub mod members;
pub mod types;

pub use collection::{TypeCollection, TypeCollectionBuilder};
pub use data::TypeData;
pub use error::ModelError;
pub use members::{Field, Method, Param, ParamFlags, Property};
pub use types::{Attribute, GenericKind, Specifier, StorageKind, TypeKind, TypeRef};
