//! # cxxfacade
//!
//! Generates C++ typed facades over a dynamic runtime from a
//! language-agnostic model of object-oriented types.
//!
//! Given a frozen universe of classes, structs, interfaces, and enums —
//! with fields, properties, methods, generics, nesting, and single
//! inheritance — cxxfacade emits one declaration unit (`.hpp`) per type
//! and one definition unit (`.cpp`) per concrete type with methods, while
//! respecting the one-definition rule: every unit includes exactly the
//! headers it needs, forward-declares everything else, and circular
//! definition requirements are broken with pointer indirection instead of
//! include cycles.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cxxfacade::prelude::*;
//!
//! let mut builder = TypeCollectionBuilder::new();
//! builder.add_type(
//!     TypeData::new(TypeRef::new("Game", "Player"), TypeKind::Class)
//!         .with_method(Method::new(
//!             "GetScore",
//!             TypeRef::new("System", "Int32"),
//!             StorageKind::Value,
//!             0x1234,
//!         )),
//! )?;
//! let collection = builder.build()?;
//!
//! let output = generate(&collection, GenConfig::default())?;
//! output.write_to_disk(std::path::Path::new("out"))?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`model`] - Type references, abstract type records, the frozen
//!   collection
//! - [`codegen`] - Context resolution, member serializers, unit emitters

pub mod prelude;

/// Abstract type model.
pub mod model {
    pub use cxxfacade_model::*;
}

/// C++ generation engine.
pub mod codegen {
    pub use cxxfacade_codegen::*;
}
