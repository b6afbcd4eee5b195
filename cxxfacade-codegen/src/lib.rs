//! # cxxfacade-codegen
//!
//! C++ header/source generation over a language-agnostic type model.
//!
//! This crate provides:
//! - The context resolution engine deciding, per type, which other types
//!   need full definitions, which need only forward declarations, and how
//!   to break circular definition requirements
//! - Member serializers for fields, static fields, and methods, emitting
//!   typed facades over a dynamic-invocation runtime
//! - Declaration (`.hpp`) and definition (`.cpp`) unit emitters with
//!   byte-stable output and exactly-once file semantics
//!
//! ## Quick Start
//!
//! ```ignore
//! use cxxfacade_codegen::{GenConfig, generate};
//! use cxxfacade_model::TypeCollectionBuilder;
//!
//! let mut builder = TypeCollectionBuilder::new();
//! // ... register types produced by a front end ...
//! let collection = builder.build()?;
//! let output = generate(&collection, GenConfig::default())?;
//! output.write_to_disk(std::path::Path::new("out"))?;
//! ```

pub mod config;
pub mod context;
pub mod cpp;
pub mod error;
pub mod generator;
pub mod name;
pub mod resolver;
pub mod writer;

pub use config::{GenConfig, OutputStyle, UnresolvedHandling, UnresolvedPolicy};
pub use context::{ContextId, ContextMap, NeedAs, TypeContext, View};
pub use error::{EmitError, Error, ResolveError};
pub use generator::{Generator, Output, generate};
pub use name::{NameMap, ResolvedName};
pub use resolver::{CycleEvent, CycleObserver, ResolutionResult, Resolver};
pub use writer::CppWriter;
