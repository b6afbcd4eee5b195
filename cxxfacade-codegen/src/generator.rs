//! Generation orchestration.
//!
//! [`Generator`] drives the whole run: build contexts over a frozen
//! collection, resolve every top-level context for both views, then emit
//! declaration and definition units into an [`Output`] collector that
//! refuses to populate the same path twice.

use crate::config::{GenConfig, UnresolvedPolicy};
use crate::context::{ContextId, View};
use crate::cpp::header::HeaderEmitter;
use crate::cpp::source::SourceEmitter;
use crate::cpp::write_error_block;
use crate::error::{EmitError, Error, ResolveError};
use crate::resolver::{CycleObserver, Resolver};
use crate::writer::CppWriter;
use cxxfacade_model::TypeCollection;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fs;
use std::path::Path;
use tracing::{error, warn};

/// Generated artifacts, keyed by output-relative path.
///
/// Every path is written exactly once; a second write to the same path is
/// an explicit error, never a silent overwrite.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Output {
    files: BTreeMap<String, String>,
}

impl Output {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one artifact.
    ///
    /// # Errors
    /// Returns `EmitError::DuplicateEmission` if the path is already
    /// populated.
    pub fn insert(&mut self, path: String, contents: String) -> Result<(), EmitError> {
        match self.files.entry(path) {
            Entry::Occupied(e) => Err(EmitError::DuplicateEmission {
                path: e.key().clone(),
            }),
            Entry::Vacant(v) => {
                v.insert(contents);
                Ok(())
            }
        }
    }

    /// Contents at a path, if emitted.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// All artifacts in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// All paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes every artifact under `root`, creating directories as
    /// needed.
    ///
    /// # Errors
    /// Returns `EmitError::DuplicateEmission` if a target file already
    /// exists on disk, and `EmitError::Io` on filesystem failures. Nothing
    /// is ever overwritten.
    pub fn write_to_disk(&self, root: &Path) -> Result<(), EmitError> {
        for (path, contents) in &self.files {
            let full = root.join(path);
            if full.exists() {
                return Err(EmitError::DuplicateEmission {
                    path: full.display().to_string(),
                });
            }
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&full, contents)?;
        }
        Ok(())
    }
}

/// Drives resolution and emission for a frozen type collection.
pub struct Generator<'a> {
    resolver: Resolver<'a>,
}

impl<'a> Generator<'a> {
    /// Builds the generator: registers one context per type and assigns
    /// output names and file paths.
    ///
    /// # Errors
    /// Returns a resolution error if the collection's nested-type relation
    /// references unknown types.
    pub fn new(collection: &'a TypeCollection, config: GenConfig) -> Result<Self, Error> {
        Ok(Self {
            resolver: Resolver::new(collection, config)?,
        })
    }

    /// Registers a configuration-time duplicate-definition cycle
    /// observer.
    #[must_use]
    pub fn with_cycle_observer(mut self, observer: CycleObserver) -> Self {
        self.resolver = self.resolver.with_cycle_observer(observer);
        self
    }

    /// The underlying resolver, for inspection after a run.
    #[must_use]
    pub fn resolver(&self) -> &Resolver<'a> {
        &self.resolver
    }

    /// Resolves every top-level context for both views and emits all
    /// units.
    ///
    /// # Errors
    /// Under the escalate policy, the first unresolved reference aborts
    /// the run. Duplicate emission is always fatal.
    pub fn generate(mut self) -> Result<Output, Error> {
        let config = self.resolver.config().clone();
        let ids = self.resolver.contexts().top_level_ids();
        let mut failed: BTreeMap<ContextId, ResolveError> = BTreeMap::new();

        for &id in &ids {
            for view in [View::Header, View::Source] {
                if failed.contains_key(&id) {
                    continue;
                }
                match self.resolver.resolve(id, view) {
                    Ok(()) => {}
                    Err(Error::Resolve(e)) => {
                        if config.unresolved.types == UnresolvedPolicy::Escalate {
                            return Err(e.into());
                        }
                        warn!(
                            unit = %self.resolver.context(id).type_ref,
                            error = %e,
                            "unit resolution failed"
                        );
                        failed.insert(id, e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let mut output = Output::new();
        let header = HeaderEmitter::new(&self.resolver, &config);
        for &id in &ids {
            if let Some(err) = failed.get(&id) {
                if config.unresolved.types == UnresolvedPolicy::Annotate {
                    let ctx = self.resolver.context(id);
                    output.insert(
                        format!("include/{}", ctx.header_file),
                        stub_header(&config, err),
                    )?;
                }
                continue;
            }
            match header.emit(id) {
                Ok(Some((path, contents))) => output.insert(path, contents)?,
                Ok(None) => {}
                Err(Error::Emit(EmitError::InvalidNestedDeclaration { unit, nested })) => {
                    // Model error; abort only this unit.
                    error!(%unit, %nested, "invalid nested declaration, unit aborted");
                }
                Err(e) => return Err(e),
            }
        }
        let source = SourceEmitter::new(&self.resolver, &config);
        for &id in &ids {
            if failed.contains_key(&id) {
                continue;
            }
            match source.emit(id) {
                Ok(Some((path, contents))) => output.insert(path, contents)?,
                Ok(None) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(output)
    }
}

/// Header placeholder for a unit whose resolution failed under the
/// annotate policy.
fn stub_header(config: &GenConfig, err: &ResolveError) -> String {
    let mut w = CppWriter::new();
    w.write_comment(&format!("Autogenerated by {}", config.provenance_tag));
    w.write_comment("=========================================================================");
    w.write_line("#pragma once");
    write_error_block(&mut w, err);
    w.into_string()
}

/// Generates all units for a collection with the given configuration.
///
/// # Errors
/// See [`Generator::generate`].
pub fn generate(collection: &TypeCollection, config: GenConfig) -> Result<Output, Error> {
    Generator::new(collection, config)?.generate()
}
