//! Convenience re-exports for common usage.

pub use cxxfacade_codegen::{
    CycleEvent, EmitError, Error, GenConfig, Generator, Output, OutputStyle, ResolveError,
    UnresolvedPolicy, generate,
};
pub use cxxfacade_model::{
    Attribute, Field, GenericKind, Method, ModelError, Param, ParamFlags, Property, Specifier,
    StorageKind, TypeCollection, TypeCollectionBuilder, TypeData, TypeKind, TypeRef,
};
