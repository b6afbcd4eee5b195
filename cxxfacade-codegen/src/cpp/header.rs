//! Declaration unit emission.
//!
//! For one resolved top-level context this writes the `.hpp` artifact:
//! provenance header, include guard pragmas, include block, forward-declare
//! block, namespace + template + type body (nested declares, in-place
//! nested bodies, fields, method declarations), template aliases for
//! nested generics, and the type registration macro lines binding every
//! emitted name to its original namespace-qualified name.

use crate::config::{GenConfig, UnresolvedPolicy};
use crate::context::{ContextId, View};
use crate::cpp::type_state::template_line_for;
use crate::cpp::{RUNTIME_INCLUDE, TYPEDEFS_INCLUDE, fields, methods, original_parts, write_error_block};
use crate::error::{EmitError, Error, ResolveError};
use crate::name::cpp_namespace;
use crate::resolver::{ResolutionResult, Resolver};
use crate::writer::CppWriter;
use cxxfacade_model::{TypeData, TypeRef};
use std::collections::BTreeSet;

/// Emitter for declaration units.
pub struct HeaderEmitter<'r, 'a> {
    resolver: &'r Resolver<'a>,
    config: &'r GenConfig,
}

impl<'r, 'a> HeaderEmitter<'r, 'a> {
    /// Creates an emitter over a resolver whose contexts are already
    /// resolved for the header view.
    #[must_use]
    pub fn new(resolver: &'r Resolver<'a>, config: &'r GenConfig) -> Self {
        Self { resolver, config }
    }

    /// Emits the declaration unit for a top-level context.
    ///
    /// Returns `Ok(None)` when the unit is dropped by the configured
    /// unresolved policy.
    ///
    /// # Errors
    /// Propagates unresolved references under the escalate policy and
    /// invalid nested declarations unconditionally.
    pub fn emit(&self, id: ContextId) -> Result<Option<(String, String)>, Error> {
        let ctx = self.resolver.context(id);
        let path = format!("include/{}", ctx.header_file);
        let mut w = CppWriter::new();
        w.write_comment(&format!("Autogenerated by {}", self.config.provenance_tag));
        w.write_comment("=========================================================================");
        w.write_line("#pragma once");
        w.write_line("#pragma pack(push, 8)");
        match self.write_unit_body(&mut w, id) {
            Ok(()) => {}
            Err(Error::Resolve(e)) => match self.config.unresolved.types {
                UnresolvedPolicy::Annotate => write_error_block(&mut w, &e),
                UnresolvedPolicy::Skip => return Ok(None),
                UnresolvedPolicy::Escalate => return Err(Error::Resolve(e)),
            },
            Err(e) => return Err(e),
        }
        self.write_registrations(&mut w, id);
        w.write_line("#pragma pack(pop)");
        Ok(Some((path, w.into_string())))
    }

    fn write_unit_body(&self, w: &mut CppWriter, id: ContextId) -> Result<(), Error> {
        let ctx = self.resolver.context(id);
        let Some(res) = self.resolver.result(id, View::Header) else {
            return Err(EmitError::MissingResolution {
                name: ctx.type_ref.clone(),
                view: View::Header.to_string(),
            }
            .into());
        };
        self.write_includes(w, res);
        self.write_declarations(w, id, res)?;
        let Some(state) = self.resolver.state(id) else {
            return Err(EmitError::MissingResolution {
                name: ctx.type_ref.clone(),
                view: View::Header.to_string(),
            }
            .into());
        };
        w.write_comment(&format!(
            "Type namespace: {}",
            ctx.type_ref.root_namespace()
        ));
        w.open_definition(&format!("namespace {}", state.cpp_namespace));
        self.write_type_body(w, id)?;
        self.write_template_aliases(w, id);
        w.close_definition();
        Ok(())
    }

    fn write_includes(&self, w: &mut CppWriter, res: &ResolutionResult) {
        w.write_comment("Begin includes");
        let mut written: BTreeSet<String> = BTreeSet::new();
        w.write_include(TYPEDEFS_INCLUDE);
        written.insert(TYPEDEFS_INCLUDE.to_string());
        if self.config.output_style == crate::config::OutputStyle::Normal {
            w.write_include("<optional>");
        }
        let mut includes: Vec<(String, String)> = res
            .includes
            .iter()
            .map(|&inc| {
                let c = self.resolver.context(inc);
                (c.header_file.clone(), c.type_ref.qualified_name())
            })
            .collect();
        includes.sort();
        for (file, display) in includes {
            w.write_comment(&format!("Including type: {display}"));
            if written.insert(file.clone()) {
                w.write_include(&file);
            } else {
                w.write_comment(&format!("Already included the same file: {file}"));
            }
        }
        w.write_include(RUNTIME_INCLUDE);
        w.write_comment("Completed includes");
    }

    fn write_declarations(
        &self,
        w: &mut CppWriter,
        id: ContextId,
        res: &ResolutionResult,
    ) -> Result<(), Error> {
        let ctx = self.resolver.context(id);
        w.write_comment("Begin forward declares");
        for (ns, group) in &res.forward_declares {
            w.write_comment(&format!("Forward declaring namespace: {ns}"));
            w.open_definition(&format!("namespace {ns}"));
            for t in group {
                let Some(data) = self.resolver.collection().resolve(t) else {
                    return Err(ResolveError::UnresolvedType {
                        referencer: ctx.type_ref.clone(),
                        missing: t.clone(),
                    }
                    .into());
                };
                let canonical = &data.this;
                if canonical != &ctx.type_ref && ctx.definitions.contains(canonical) {
                    w.write_comment(&format!(
                        "Skipping declaration of {}: already defined in this unit",
                        canonical.name
                    ));
                    continue;
                }
                if canonical.declaring.is_some() {
                    let Some(owner) = self.resolver.contexts().id_of(canonical) else {
                        return Err(ResolveError::NotRegistered {
                            name: canonical.clone(),
                        }
                        .into());
                    };
                    if !self.resolver.contexts().in_hierarchy(id, owner) {
                        // Nested types must be declared inside their
                        // declaring type's scope, never at namespace level.
                        return Err(EmitError::InvalidNestedDeclaration {
                            unit: ctx.type_ref.clone(),
                            nested: canonical.clone(),
                        }
                        .into());
                    }
                    continue;
                }
                self.write_forward_declaration(w, data);
            }
            w.close_definition();
        }
        w.write_comment("Completed forward declares");
        Ok(())
    }

    fn write_forward_declaration(&self, w: &mut CppWriter, data: &TypeData) {
        let ty = &data.this;
        let name = self.resolver.display_name(ty);
        if ty.is_generic_template() {
            let params: Vec<&str> = ty.generics.iter().map(|g| g.name.as_str()).collect();
            w.write_comment(&format!("Forward declaring type: {name}<{}>", params.join(", ")));
            if let Some(line) = template_line_for(ty) {
                w.write_line(&line);
            }
        } else {
            w.write_comment(&format!("Forward declaring type: {name}"));
        }
        w.write_declaration(&format!("{} {name}", data.kind.keyword()));
    }

    fn write_type_body(&self, w: &mut CppWriter, id: ContextId) -> Result<(), Error> {
        let ctx = self.resolver.context(id);
        let ty = ctx.type_ref.clone();
        let Some(state) = self.resolver.state(id) else {
            return Err(EmitError::MissingResolution {
                name: ty,
                view: View::Header.to_string(),
            }
            .into());
        };
        w.write_comment(&format!(
            "Autogenerated type: {}{}",
            state.specifiers,
            ty.qualified_name()
        ));
        if !state.interfaces.is_empty() {
            w.write_comment(&format!(
                "Implementing interfaces: {}",
                state.interfaces.join(", ")
            ));
        }
        if let Some(missing) = &state.parent_unresolved {
            let err = ResolveError::UnresolvedType {
                referencer: ty.clone(),
                missing: missing.clone(),
            };
            match self.config.unresolved.types {
                UnresolvedPolicy::Annotate => write_error_block(w, &err),
                UnresolvedPolicy::Skip => {}
                UnresolvedPolicy::Escalate => return Err(err.into()),
            }
        }
        if let Some(line) = &state.template_line {
            w.write_line(line);
        }
        let head = format!("{} {}", ctx.kind.keyword(), state.type_name);
        let mut open = head.clone();
        if let Some(parent) = &state.parent_name {
            open.push_str(" : public ");
            open.push_str(parent);
        }
        w.open_definition(&open);
        for &n in &ctx.nested {
            self.write_nested_declare(w, n);
        }
        for &n in &ctx.nested {
            if self.resolver.context(n).in_place {
                self.write_type_body(w, n)?;
            }
        }
        fields::write_field_declarations(w, state, &ty, self.config)?;
        methods::write_method_declarations(w, state, &ty, self.config)?;
        w.close_type_definition(&head);
        Ok(())
    }

    fn write_nested_declare(&self, w: &mut CppWriter, id: ContextId) {
        let ctx = self.resolver.context(id);
        let ty = &ctx.type_ref;
        w.write_comment(&format!("Nested type: {}", ty.qualified_name()));
        if let Some(line) = template_line_for(ty) {
            w.write_line(&line);
        }
        w.write_declaration(&format!(
            "{} {}",
            ctx.kind.keyword(),
            self.resolver.display_name(ty)
        ));
    }

    /// Scoped name of a nested type from namespace level, without
    /// namespace (`Container::Box<T>`).
    fn scoped_name(&self, ty: &TypeRef) -> String {
        let mut s = String::new();
        for d in ty.declaring_chain() {
            s.push_str(&self.resolver.display_name(d));
            s.push_str("::");
        }
        s.push_str(&self.resolver.display_name(ty));
        if ty.is_generic_template() {
            let params: Vec<&str> = ty.generics.iter().map(|g| g.name.as_str()).collect();
            s.push('<');
            s.push_str(&params.join(", "));
            s.push('>');
        }
        s
    }

    /// Flat alias for a nested type (`Container_Box`).
    fn alias_name(&self, ty: &TypeRef) -> String {
        let mut parts: Vec<String> = ty
            .declaring_chain()
            .iter()
            .map(|d| self.resolver.display_name(d))
            .collect();
        parts.push(self.resolver.display_name(ty));
        parts.join("_")
    }

    /// Generic template types nested in place cannot be named directly by
    /// the registration macros; alias each one at namespace level with its
    /// template parameter list.
    fn write_template_aliases(&self, w: &mut CppWriter, id: ContextId) {
        for &n in &self.resolver.context(id).nested {
            let nctx = self.resolver.context(n);
            if nctx.in_place && nctx.type_ref.is_generic_template() {
                if let Some(line) = template_line_for(&nctx.type_ref) {
                    w.write_line(&line);
                }
                w.write_line(&format!(
                    "using {} = typename {};",
                    self.alias_name(&nctx.type_ref),
                    self.scoped_name(&nctx.type_ref)
                ));
            }
            self.write_template_aliases(w, n);
        }
    }

    /// One registration line per type defined by this unit, binding the
    /// emitted name to the original namespace-qualified name.
    fn write_registrations(&self, w: &mut CppWriter, id: ContextId) {
        let ctx = self.resolver.context(id);
        let ty = &ctx.type_ref;
        let (ons, oname) = original_parts(ty);
        if !ty.is_generic() {
            let full = self.resolver.qualified_display(ty);
            w.write_line(&format!(
                "FACADE_DEFINE_ARG_TYPE({full}, \"{ons}\", \"{oname}\");"
            ));
        } else {
            let template_name = if ty.declaring.is_some() {
                self.alias_name(ty)
            } else {
                format!(
                    "{}::{}",
                    cpp_namespace(ty.root_namespace()),
                    self.resolver.display_name(ty)
                )
            };
            let suffix = if ctx.kind.is_value_kind() {
                "STRUCT"
            } else {
                "CLASS"
            };
            w.write_line(&format!(
                "FACADE_DEFINE_ARG_TYPE_GENERIC_{suffix}({template_name}, \"{ons}\", \"{oname}\");"
            ));
        }
        for &n in &ctx.nested {
            if self.resolver.context(n).in_place {
                self.write_registrations(w, n);
            }
        }
    }
}
