//! Definition unit emission.
//!
//! A `.cpp` artifact exists only for non-generic, non-interface types with
//! at least one method. It includes the unit's own declaration header plus
//! the headers of every type the declaration unit merely forward-declared,
//! then emits static-field accessor bodies and method definition bodies,
//! including those of in-place nested types.

use crate::config::GenConfig;
use crate::context::{ContextId, View};
use crate::cpp::{RUNTIME_INCLUDE, fields, methods};
use crate::error::{EmitError, Error};
use crate::resolver::Resolver;
use crate::writer::CppWriter;
use cxxfacade_model::TypeKind;
use std::collections::BTreeSet;

/// Emitter for definition units.
pub struct SourceEmitter<'r, 'a> {
    resolver: &'r Resolver<'a>,
    config: &'r GenConfig,
}

impl<'r, 'a> SourceEmitter<'r, 'a> {
    /// Creates an emitter over a resolver whose contexts are already
    /// resolved for the source view.
    #[must_use]
    pub fn new(resolver: &'r Resolver<'a>, config: &'r GenConfig) -> Self {
        Self { resolver, config }
    }

    /// Returns true if the context produces a definition unit at all.
    #[must_use]
    pub fn is_emittable(&self, id: ContextId) -> bool {
        let ctx = self.resolver.context(id);
        if ctx.kind == TypeKind::Interface || ctx.type_ref.is_generic() {
            return false;
        }
        self.has_methods(id)
    }

    fn has_methods(&self, id: ContextId) -> bool {
        if self.resolver.state(id).is_some_and(|s| !s.methods.is_empty()) {
            return true;
        }
        self.resolver
            .context(id)
            .nested
            .iter()
            .any(|&n| self.has_methods(n))
    }

    /// Emits the definition unit for a top-level context. Returns
    /// `Ok(None)` for contexts that produce no definition unit.
    ///
    /// # Errors
    /// Propagates unresolved references under the escalate policy.
    pub fn emit(&self, id: ContextId) -> Result<Option<(String, String)>, Error> {
        if !self.is_emittable(id) {
            return Ok(None);
        }
        let ctx = self.resolver.context(id);
        let Some(res) = self.resolver.result(id, View::Source) else {
            return Err(EmitError::MissingResolution {
                name: ctx.type_ref.clone(),
                view: View::Source.to_string(),
            }
            .into());
        };
        let path = format!("src/{}", ctx.source_file);
        let mut w = CppWriter::new();
        w.write_comment(&format!("Autogenerated by {}", self.config.provenance_tag));
        w.write_comment("=========================================================================");
        w.write_comment("Includes");
        let mut written: BTreeSet<String> = BTreeSet::new();
        w.write_include(&ctx.header_file);
        written.insert(ctx.header_file.clone());
        if self.config.output_style == crate::config::OutputStyle::Normal {
            w.write_include("<optional>");
        }
        w.write_include(RUNTIME_INCLUDE);
        let mut includes: Vec<String> = res
            .includes
            .iter()
            .map(|&inc| self.resolver.context(inc).header_file.clone())
            .collect();
        includes.sort();
        for file in includes {
            if written.insert(file.clone()) {
                w.write_include(&file);
            }
        }
        w.write_comment("End Includes");
        self.write_definitions(&mut w, id)?;
        Ok(Some((path, w.into_string())))
    }

    /// Writes static-field accessors and method bodies for a context and
    /// its in-place nested contexts.
    fn write_definitions(&self, w: &mut CppWriter, id: ContextId) -> Result<(), Error> {
        let ctx = self.resolver.context(id);
        let ty = ctx.type_ref.clone();
        if let Some(state) = self.resolver.state(id) {
            // Header-only nested templates keep their bodies inline.
            if !state.need_def_in_header {
                fields::write_static_field_definitions(w, state, &ty, self.config)?;
                methods::write_method_definitions(w, state, &ty, self.config)?;
            }
        }
        for &n in &ctx.nested {
            if self.resolver.context(n).in_place {
                self.write_definitions(w, n)?;
            }
        }
        Ok(())
    }
}
