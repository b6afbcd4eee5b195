//! The context resolution engine.
//!
//! For every type context and target view (declaration unit or definition
//! unit) the resolver computes the set of other units to pull in by full
//! inclusion and the set of types to forward-declare, without ever letting
//! a unit's transitive include set require re-defining the unit itself.
//!
//! Resolution is memoized per (context, view) and mutates a context only
//! during its own single pass; afterwards the context and the cached
//! [`ResolutionResult`] are read-only for emission. The global
//! type-to-context map is built once at construction, before any
//! resolution starts; resolving a type that was never registered fails
//! fast instead of returning a partial result.

use crate::config::GenConfig;
use crate::context::{ContextId, ContextMap, NeedAs, TypeContext, View};
use crate::cpp::type_state::{
    FieldState, IGNORED_METHODS, MethodState, ParamState, TypeState, format_specifiers,
    sanitize_method_name, template_line_for,
};
use crate::cpp::primitive_cpp;
use crate::error::{Error, ResolveError};
use crate::name::{NameMap, cpp_namespace, namespace_path, sanitize_identifier};
use cxxfacade_model::{StorageKind, TypeCollection, TypeData, TypeKind, TypeRef};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// A repaired duplicate-definition cycle.
///
/// Never an error: the offending include is evicted, the triggering
/// members are downgraded, and the event is reported to every configured
/// observer.
#[derive(Debug, Clone)]
pub struct CycleEvent {
    /// Type whose resolution detected the cycle.
    pub context: TypeRef,
    /// Type whose inclusion would have re-defined `context`.
    pub offending: TypeRef,
}

/// Observer callback for duplicate-definition cycle events.
pub type CycleObserver = Box<dyn Fn(&CycleEvent)>;

/// Cached resolution for one (context, view) pair.
#[derive(Debug, Clone, Default)]
pub struct ResolutionResult {
    /// Units to include, by context id.
    pub includes: BTreeSet<ContextId>,
    /// Forward declarations, stratified by C++ namespace.
    pub forward_declares: BTreeMap<String, BTreeSet<TypeRef>>,
}

/// The resolution engine.
pub struct Resolver<'a> {
    collection: &'a TypeCollection,
    config: GenConfig,
    pub(crate) contexts: ContextMap,
    pub(crate) names: NameMap,
    pub(crate) states: BTreeMap<ContextId, TypeState>,
    results: BTreeMap<(ContextId, View), ResolutionResult>,
    needs_collected: BTreeSet<ContextId>,
    in_flight: BTreeSet<(ContextId, View)>,
    observers: Vec<CycleObserver>,
    events: Vec<CycleEvent>,
}

impl<'a> Resolver<'a> {
    /// Builds the resolver over a frozen collection: registers one context
    /// per type (nested types in place, under their declaring context) and
    /// assigns every unit its output file names.
    ///
    /// # Errors
    /// Returns `ResolveError::UnresolvedType` if a nested reference cannot
    /// be resolved in the collection.
    pub fn new(collection: &'a TypeCollection, config: GenConfig) -> Result<Self, Error> {
        let mut resolver = Self {
            collection,
            config,
            contexts: ContextMap::new(),
            names: NameMap::new(),
            states: BTreeMap::new(),
            results: BTreeMap::new(),
            needs_collected: BTreeSet::new(),
            in_flight: BTreeSet::new(),
            observers: Vec::new(),
            events: Vec::new(),
        };
        let top_level: Vec<&TypeData> = collection.top_level().collect();
        for data in top_level {
            resolver.register(data, None)?;
        }
        for id in resolver.contexts.top_level_ids() {
            let ty = resolver.contexts.get(id).type_ref.clone();
            let literal = resolver.names.resolve(&ty);
            let ns = namespace_path(ty.root_namespace());
            let header = format!("{ns}/{literal}.hpp");
            let source = format!("{ns}/{literal}.cpp");
            resolver.assign_files(id, &header, &source);
        }
        Ok(resolver)
    }

    /// Registers a configuration-time cycle observer. Observers are called
    /// once per repaired duplicate-definition cycle; the memoized resolve
    /// never re-fires them for an already-resolved (context, view).
    #[must_use]
    pub fn with_cycle_observer(mut self, observer: CycleObserver) -> Self {
        self.observers.push(observer);
        self
    }

    /// The generation configuration.
    #[must_use]
    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    /// The frozen type collection.
    #[must_use]
    pub fn collection(&self) -> &TypeCollection {
        self.collection
    }

    /// The context arena.
    #[must_use]
    pub fn contexts(&self) -> &ContextMap {
        &self.contexts
    }

    /// Borrows one context.
    #[must_use]
    pub fn context(&self, id: ContextId) -> &TypeContext {
        self.contexts.get(id)
    }

    /// The member render state for a context, once resolution has run.
    #[must_use]
    pub fn state(&self, id: ContextId) -> Option<&TypeState> {
        self.states.get(&id)
    }

    /// The cached resolution for a (context, view), if resolved.
    #[must_use]
    pub fn result(&self, id: ContextId, view: View) -> Option<&ResolutionResult> {
        self.results.get(&(id, view))
    }

    /// All repaired duplicate-definition cycles, in detection order.
    #[must_use]
    pub fn events(&self) -> &[CycleEvent] {
        &self.events
    }

    /// The unit-owning root of a context: the lowest non-in-place
    /// enclosing context.
    #[must_use]
    pub fn root_of(&self, id: ContextId) -> ContextId {
        let mut cur = id;
        loop {
            let ctx = self.contexts.get(cur);
            match (ctx.in_place, ctx.declaring) {
                (true, Some(parent)) => cur = parent,
                _ => return cur,
            }
        }
    }

    /// Resolves a context for one view. Idempotent: an already-resolved
    /// (context, view) returns immediately from the cache without side
    /// effects. In-place contexts resolve as part of their unit root.
    ///
    /// # Errors
    /// Returns `ResolveError::UnresolvedType` when a required type has no
    /// record, `NotRegistered` when a record has no context, and
    /// `ResolutionInProgress` on re-entrant resolution of the same pair.
    pub fn resolve(&mut self, id: ContextId, view: View) -> Result<(), Error> {
        let root = self.root_of(id);
        if self.results.contains_key(&(root, view)) {
            return Ok(());
        }
        if !self.in_flight.insert((root, view)) {
            return Err(ResolveError::ResolutionInProgress {
                name: self.contexts.get(root).type_ref.clone(),
            }
            .into());
        }
        let out = self.resolve_root(root, view);
        self.in_flight.remove(&(root, view));
        out
    }

    fn resolve_root(&mut self, id: ContextId, view: View) -> Result<(), Error> {
        debug!(unit = %self.contexts.get(id).type_ref, %view, "resolving context");
        self.collect_needs(id)?;
        match view {
            View::Header => self.resolve_header(id),
            View::Source => {
                // The definition unit includes its own declaration unit;
                // its resolution builds on the header-resolved sets.
                if !self.results.contains_key(&(id, View::Header)) {
                    self.resolve_header(id)?;
                }
                self.resolve_source(id)
            }
        }
    }

    /// Runs the member pre-pass for a context and all nested contexts,
    /// then folds the in-place nested requirements into the parent.
    fn collect_needs(&mut self, id: ContextId) -> Result<(), Error> {
        if self.needs_collected.contains(&id) {
            return Ok(());
        }
        self.ensure_state(id)?;
        let nested = self.contexts.get(id).nested.clone();
        for n in &nested {
            self.collect_needs(*n)?;
        }
        self.absorb_in_place_needs(id);
        self.needs_collected.insert(id);
        Ok(())
    }

    /// Folds every in-place nested context's requirements into `id`: the
    /// nested definitions become part of this unit's text, their pending
    /// needs propagate upward.
    fn absorb_in_place_needs(&mut self, id: ContextId) {
        let nested = self.contexts.get(id).nested.clone();
        for n in nested {
            if !self.contexts.get(n).in_place {
                continue;
            }
            let (defs, to_get, decls) = {
                let c = self.contexts.get(n);
                (
                    c.definitions.iter().cloned().collect::<Vec<_>>(),
                    c.definitions_to_get.iter().cloned().collect::<Vec<_>>(),
                    c.declarations_to_make.iter().cloned().collect::<Vec<_>>(),
                )
            };
            let parent = self.contexts.get_mut(id);
            for d in defs {
                parent.definitions.insert(d);
            }
            for d in to_get {
                parent.request(d, NeedAs::Definition);
            }
            for d in decls {
                parent.request(d, NeedAs::Declaration);
            }
        }
        let parent = self.contexts.get_mut(id);
        let defs = parent.definitions.clone();
        parent.definitions_to_get.retain(|t| !defs.contains(t));
        parent.declarations_to_make.retain(|t| !defs.contains(t));
    }

    fn resolve_header(&mut self, id: ContextId) -> Result<(), Error> {
        let self_ref = self.contexts.get(id).type_ref.clone();
        let to_get: Vec<TypeRef> = self
            .contexts
            .get(id)
            .definitions_to_get
            .iter()
            .cloned()
            .collect();
        let mut includes: BTreeSet<ContextId> = BTreeSet::new();
        let mut evicted: BTreeSet<ContextId> = BTreeSet::new();
        for td in to_get {
            if self.contexts.get(id).definitions.contains(&td) {
                continue;
            }
            let owner = self.owning_unit(id, &td)?;
            if owner == id || evicted.contains(&owner) {
                continue;
            }
            let owner_defs: Vec<TypeRef> = self
                .contexts
                .get(owner)
                .definitions
                .iter()
                .cloned()
                .collect();
            if owner_defs.contains(&self_ref) {
                // Including this unit would (indirectly) re-define us.
                self.repair_cycle(id, owner);
                evicted.insert(owner);
                includes.remove(&owner);
                continue;
            }
            includes.insert(owner);
            let ctx = self.contexts.get_mut(id);
            for d in owner_defs {
                ctx.definitions.insert(d);
            }
        }
        let ctx = self.contexts.get_mut(id);
        ctx.declarations_to_make.remove(&self_ref);
        let defs = ctx.definitions.clone();
        ctx.declarations_to_make.retain(|t| !defs.contains(t));
        let forward_declares = stratify(&ctx.declarations_to_make);
        self.results.insert(
            (id, View::Header),
            ResolutionResult {
                includes,
                forward_declares,
            },
        );
        Ok(())
    }

    fn resolve_source(&mut self, id: ContextId) -> Result<(), Error> {
        // Work on copies so the header-view truth is never polluted for
        // future includers of this unit.
        let (mut defs, to_get) = {
            let ctx = self.contexts.get(id);
            let mut to_get: BTreeSet<TypeRef> = ctx.declarations_to_make.clone();
            to_get.extend(ctx.declarations.iter().cloned());
            (ctx.definitions.clone(), to_get)
        };
        let mut includes: BTreeSet<ContextId> = BTreeSet::new();
        includes.insert(id);
        for td in to_get {
            if defs.contains(&td) {
                continue;
            }
            let owner = self.owning_unit(id, &td)?;
            if owner == id {
                continue;
            }
            includes.insert(owner);
            for d in self.contexts.get(owner).definitions.iter() {
                defs.insert(d.clone());
            }
        }
        self.results.insert(
            (id, View::Source),
            ResolutionResult {
                includes,
                forward_declares: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Resolves a reference to the context of the unit that defines it
    /// (the root of the owning context).
    fn owning_unit(&self, id: ContextId, ty: &TypeRef) -> Result<ContextId, ResolveError> {
        let Some(data) = self.collection.resolve(ty) else {
            return Err(ResolveError::UnresolvedType {
                referencer: self.contexts.get(id).type_ref.clone(),
                missing: ty.clone(),
            });
        };
        let Some(owner) = self.contexts.id_of(&data.this) else {
            return Err(ResolveError::NotRegistered {
                name: data.this.clone(),
            });
        };
        Ok(self.root_of(owner))
    }

    /// Repairs a duplicate-definition cycle: evicts the offending unit
    /// from the include set, moves every requirement it would have
    /// satisfied back to the forward-declare set, downgrades the
    /// triggering members, and reports the event. No global
    /// re-optimization pass runs afterwards; the local fix is accepted.
    fn repair_cycle(&mut self, id: ContextId, offender: ContextId) {
        let offending = self.contexts.get(offender).type_ref.clone();
        let self_ref = self.contexts.get(id).type_ref.clone();
        let member_refs: Vec<TypeRef> = self
            .contexts
            .get(id)
            .definitions_to_get
            .iter()
            .cloned()
            .filter(|t| self.owning_unit(id, t).is_ok_and(|o| o == offender))
            .collect();
        {
            let ctx = self.contexts.get_mut(id);
            for r in &member_refs {
                ctx.definitions_to_get.remove(r);
                ctx.definitions.remove(r);
                ctx.declarations_to_make.insert(r.clone());
            }
        }
        if let Some(state) = self.states.get_mut(&id) {
            for r in &member_refs {
                state.downgrade(r);
            }
        }
        let event = CycleEvent {
            context: self_ref,
            offending,
        };
        warn!(
            context = %event.context,
            offending = %event.offending,
            "duplicate-definition cycle repaired; include evicted"
        );
        for obs in &self.observers {
            obs(&event);
        }
        self.events.push(event);
    }

    fn register(&mut self, data: &TypeData, declaring: Option<ContextId>) -> Result<ContextId, Error> {
        let mut ctx = TypeContext::new(data.this.clone(), data.kind);
        ctx.declaring = declaring;
        ctx.in_place = declaring.is_some();
        let id = self.contexts.insert(ctx);
        let collection = self.collection;
        for nref in &data.nested {
            let Some(child) = collection.resolve(nref) else {
                return Err(ResolveError::UnresolvedType {
                    referencer: data.this.clone(),
                    missing: nref.clone(),
                }
                .into());
            };
            let cid = self.register(child, Some(id))?;
            self.contexts.get_mut(id).nested.push(cid);
        }
        Ok(id)
    }

    fn assign_files(&mut self, id: ContextId, header: &str, source: &str) {
        let ctx = self.contexts.get_mut(id);
        ctx.header_file = header.to_string();
        ctx.source_file = source.to_string();
        let nested = ctx.nested.clone();
        for n in nested {
            self.assign_files(n, header, source);
        }
    }

    /// Runs the member pre-pass once per context: resolves field, method,
    /// parent, and interface references against the context, recording
    /// need-as requirements and render snapshots.
    fn ensure_state(&mut self, id: ContextId) -> Result<(), Error> {
        if self.states.contains_key(&id) {
            return Ok(());
        }
        let type_ref = self.contexts.get(id).type_ref.clone();
        let collection = self.collection;
        let Some(data) = collection.resolve(&type_ref) else {
            return Err(ResolveError::NotRegistered { name: type_ref }.into());
        };

        let is_interface = data.kind == TypeKind::Interface;
        let pure_virtual = is_interface && !data.this.is_generic();
        let need_def_in_header = data.this.is_generic_template();
        let type_name = self.names.resolve(&data.this);
        let qualified_name = self.qualified_literal(&data.this);
        let specifiers = format_specifiers(&data.specifiers);

        let mut parent_name = None;
        let mut parent_unresolved = None;
        if let Some(parent) = &data.parent {
            // Inheritance always needs the parent's full definition.
            match self.cpp_name(id, parent, StorageKind::Value, NeedAs::Definition) {
                Some(n) => parent_name = Some(n),
                None => parent_unresolved = Some(parent.clone()),
            }
        }
        let mut interfaces = Vec::new();
        for iface in &data.interfaces {
            // Interfaces appear only in the inheritance comment, but they
            // still feed the forward-declare set.
            let _ = self.cpp_name(id, iface, StorageKind::Value, NeedAs::Declaration);
            interfaces.push(iface.qualified_name());
        }

        let mut fields = Vec::new();
        for f in &data.fields {
            let need = if f.storage.needs_definition() {
                NeedAs::Definition
            } else {
                NeedAs::Declaration
            };
            let cpp_ty = self.cpp_name(id, &f.ty, f.storage, need);
            let canonical = collection.resolve(&f.ty).map(|d| d.this.clone());
            let comment = format!(
                "{}{} {}",
                format_specifiers(&f.specifiers),
                f.ty.qualified_name(),
                f.name
            );
            fields.push(FieldState {
                name: sanitize_identifier(&f.name),
                ty: f.ty.clone(),
                canonical,
                cpp_ty,
                storage: f.storage,
                offset: f.offset,
                is_static: f.is_static(),
                comment,
                downgraded: false,
            });
        }

        let mut property_comments = Vec::new();
        for p in &data.properties {
            let mut accessors = Vec::new();
            if p.has_get {
                accessors.push("get");
            }
            if p.has_set {
                accessors.push("set");
            }
            property_comments.push(format!(
                "property: {}{} {} {{ {} }}",
                format_specifiers(&p.specifiers),
                p.ty.qualified_name(),
                p.name,
                accessors.join("; ")
            ));
        }

        let mut methods = Vec::new();
        let mut signatures: BTreeSet<String> = BTreeSet::new();
        for m in &data.methods {
            let comment = format!(
                "{}{} {}({})",
                format_specifiers(&m.specifiers),
                m.return_ty.qualified_name(),
                m.name,
                m.params
                    .iter()
                    .map(|p| format!("{} {}", p.ty.qualified_name(), p.name))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            if m.generic {
                // Methods with unbound generic parameters are not
                // representable without a method-level template.
                methods.push(MethodState {
                    name: m.name.clone(),
                    cpp_name: sanitize_method_name(&m.name),
                    ret: None,
                    ret_ty: m.return_ty.clone(),
                    params: Vec::new(),
                    is_static: m.is_static(),
                    offset: m.offset,
                    comment,
                    implemented_from: m.implemented_from.clone(),
                    skipped: true,
                    suppressed: false,
                    aborted: false,
                });
                continue;
            }
            let suppressed = IGNORED_METHODS.contains(&m.name.as_str())
                || self.config.blacklist_methods.contains(&m.name);
            let ret_need = if need_def_in_header {
                NeedAs::BestMatch
            } else if pure_virtual && m.hides_base {
                // An overriding virtual must not narrow to an incomplete
                // return type.
                NeedAs::Definition
            } else {
                NeedAs::Declaration
            };
            let param_need = if need_def_in_header {
                NeedAs::BestMatch
            } else {
                NeedAs::Declaration
            };
            let ret = self.cpp_name(id, &m.return_ty, m.return_storage, ret_need);
            let mut params = Vec::new();
            for p in &m.params {
                let cpp_ty = self.cpp_name(id, &p.ty, p.storage, param_need);
                params.push(ParamState {
                    name: sanitize_identifier(&p.name),
                    ty: p.ty.clone(),
                    cpp_ty,
                });
            }
            let cpp_method_name = sanitize_method_name(&m.name);
            let resolved_ok = ret.is_some() && params.iter().all(|p| p.cpp_ty.is_some());
            let mut aborted = false;
            if resolved_ok && !suppressed {
                let sig = format!(
                    "{}({})",
                    cpp_method_name,
                    params
                        .iter()
                        .map(|p| p.cpp_ty.as_deref().unwrap_or(""))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                if !signatures.insert(sig) {
                    aborted = true;
                }
            }
            methods.push(MethodState {
                name: m.name.clone(),
                cpp_name: cpp_method_name,
                ret,
                ret_ty: m.return_ty.clone(),
                params,
                is_static: m.is_static(),
                offset: m.offset,
                comment,
                implemented_from: m.implemented_from.clone(),
                skipped: false,
                suppressed,
                aborted,
            });
        }

        self.states.insert(
            id,
            TypeState {
                type_name,
                qualified_name,
                cpp_namespace: cpp_namespace(data.this.root_namespace()),
                specifiers,
                parent_name,
                parent_unresolved,
                interfaces,
                is_interface,
                pure_virtual,
                template_line: template_line_for(&data.this),
                need_def_in_header,
                fields,
                property_comments,
                methods,
                downgraded: BTreeSet::new(),
            },
        );
        Ok(())
    }

    /// Renders a reference as a fully qualified C++ type name, recording
    /// the need-as requirement against the context. Returns `None` when
    /// the reference cannot be resolved; the caller records the failure
    /// per member instead of aborting siblings.
    pub(crate) fn cpp_name(
        &mut self,
        id: ContextId,
        ty: &TypeRef,
        storage: StorageKind,
        need: NeedAs,
    ) -> Option<String> {
        if storage == StorageKind::GenericParam || is_bare_parameter(self.collection, ty) {
            return Some(ty.name.clone());
        }
        if let Some(p) = primitive_cpp(ty) {
            let mut s = p.to_string();
            if storage.is_indirect() {
                s.push('*');
            }
            return Some(s);
        }
        let canonical = self.collection.resolve(ty).map(|d| d.this.clone())?;
        self.contexts.get_mut(id).request(canonical.clone(), need);

        let mut s = cpp_namespace(canonical.root_namespace());
        s.push_str("::");
        for d in canonical.declaring_chain() {
            let d = d.clone();
            s.push_str(&self.names.resolve(&d));
            s.push_str("::");
        }
        s.push_str(&self.names.resolve(&canonical));
        if ty.is_generic_instantiation() {
            s.push('<');
            let args: Vec<TypeRef> = ty.generics.clone();
            for (i, arg) in args.iter().enumerate() {
                if i != 0 {
                    s.push_str(", ");
                }
                let arg_storage = self.argument_storage(arg);
                let rendered = self.cpp_name(id, arg, arg_storage, NeedAs::Declaration)?;
                s.push_str(&rendered);
            }
            s.push('>');
        } else if ty.is_generic_template() {
            s.push('<');
            for (i, g) in ty.generics.iter().enumerate() {
                if i != 0 {
                    s.push_str(", ");
                }
                s.push_str(&g.name);
            }
            s.push('>');
        }
        if storage.is_indirect() {
            s.push('*');
        }
        Some(s)
    }

    /// Storage classification of a generic argument: value kinds stay
    /// inline, reference kinds render as pointers.
    fn argument_storage(&self, arg: &TypeRef) -> StorageKind {
        if primitive_cpp(arg).is_some() {
            return StorageKind::Value;
        }
        match self.collection.resolve(arg) {
            Some(d) if d.kind.is_value_kind() => StorageKind::Value,
            Some(_) => StorageKind::Reference,
            None => StorageKind::Value,
        }
    }

    /// Fully qualified C++ name without generic arguments, using assigned
    /// output names.
    fn qualified_literal(&mut self, ty: &TypeRef) -> String {
        let mut s = cpp_namespace(ty.root_namespace());
        s.push_str("::");
        for d in ty.declaring_chain() {
            let d = d.clone();
            s.push_str(&self.names.resolve(&d));
            s.push_str("::");
        }
        let ty = ty.clone();
        s.push_str(&self.names.resolve(&ty));
        s
    }

    /// Display name for an already-resolved reference. Falls back to the
    /// sanitized simple name for references that never went through name
    /// resolution.
    #[must_use]
    pub(crate) fn display_name(&self, ty: &TypeRef) -> String {
        self.names
            .resolved(ty)
            .map_or_else(|| sanitize_identifier(&ty.name), |n| n.rendered())
    }

    /// Immutable variant of [`Self::qualified_literal`] for emission.
    #[must_use]
    pub(crate) fn qualified_display(&self, ty: &TypeRef) -> String {
        let mut s = cpp_namespace(ty.root_namespace());
        s.push_str("::");
        for d in ty.declaring_chain() {
            s.push_str(&self.display_name(d));
            s.push_str("::");
        }
        s.push_str(&self.display_name(ty));
        s
    }
}

/// True for the bare, unresolvable references used to model unbound
/// generic parameter names.
fn is_bare_parameter(collection: &TypeCollection, ty: &TypeRef) -> bool {
    ty.namespace.is_empty()
        && ty.declaring.is_none()
        && ty.generics.is_empty()
        && !collection.contains(ty)
}

/// Stratifies a forward-declare set by C++ namespace so declarations in
/// the same generated namespace block are grouped together.
fn stratify(declarations: &BTreeSet<TypeRef>) -> BTreeMap<String, BTreeSet<TypeRef>> {
    let mut groups: BTreeMap<String, BTreeSet<TypeRef>> = BTreeMap::new();
    for td in declarations {
        groups
            .entry(cpp_namespace(td.root_namespace()))
            .or_default()
            .insert(td.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxfacade_model::{Field, TypeCollectionBuilder, TypeData, TypeKind};
    use std::cell::Cell;
    use std::rc::Rc;

    fn value_field(name: &str, ty: TypeRef) -> Field {
        Field::new(name, ty, StorageKind::Value, 0x10)
    }

    fn reference_field(name: &str, ty: TypeRef) -> Field {
        Field::new(name, ty, StorageKind::Reference, 0x10)
    }

    fn two_type_universe(a_field: Field, b_field: Field) -> TypeCollection {
        let mut builder = TypeCollectionBuilder::new();
        builder
            .add_type(
                TypeData::new(TypeRef::new("Game", "A"), TypeKind::Struct).with_field(a_field),
            )
            .expect("register A");
        builder
            .add_type(
                TypeData::new(TypeRef::new("Game", "B"), TypeKind::Struct).with_field(b_field),
            )
            .expect("register B");
        builder.build().expect("build")
    }

    #[test]
    fn test_value_cycle_is_repaired_and_reported() {
        let collection = two_type_universe(
            value_field("b", TypeRef::new("Game", "B")),
            value_field("a", TypeRef::new("Game", "A")),
        );
        let fired = Rc::new(Cell::new(0usize));
        let fired_in_obs = Rc::clone(&fired);
        let mut resolver = Resolver::new(&collection, GenConfig::default())
            .expect("resolver")
            .with_cycle_observer(Box::new(move |_event| {
                fired_in_obs.set(fired_in_obs.get() + 1);
            }));

        let ids = resolver.contexts().top_level_ids();
        for &id in &ids {
            resolver.resolve(id, View::Header).expect("resolve");
        }

        // Exactly one of the pair completes the cycle and repairs it.
        assert_eq!(resolver.events().len(), 1);
        assert_eq!(fired.get(), 1);
        let event = &resolver.events()[0];
        let repaired = resolver
            .contexts()
            .id_of(&event.context)
            .expect("repaired context");

        // The offending type moved to the forward-declare set and the
        // triggering field was downgraded to pointer storage.
        let ctx = resolver.context(repaired);
        assert!(ctx.declarations_to_make.contains(&event.offending));
        assert!(!ctx.definitions.contains(&event.offending));
        let state = resolver.state(repaired).expect("state");
        assert!(state.fields[0].downgraded);

        // No unit includes something that includes it back.
        for &id in &ids {
            let res = resolver.result(id, View::Header).expect("result");
            for &inc in &res.includes {
                let inc_res = resolver.result(inc, View::Header);
                if let Some(inc_res) = inc_res {
                    assert!(!inc_res.includes.contains(&id), "include cycle survived");
                }
            }
        }
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let collection = two_type_universe(
            value_field("b", TypeRef::new("Game", "B")),
            value_field("a", TypeRef::new("Game", "A")),
        );
        let fired = Rc::new(Cell::new(0usize));
        let fired_in_obs = Rc::clone(&fired);
        let mut resolver = Resolver::new(&collection, GenConfig::default())
            .expect("resolver")
            .with_cycle_observer(Box::new(move |_| {
                fired_in_obs.set(fired_in_obs.get() + 1);
            }));
        let ids = resolver.contexts().top_level_ids();
        for &id in &ids {
            resolver.resolve(id, View::Header).expect("resolve");
        }
        let before = fired.get();
        for &id in &ids {
            resolver.resolve(id, View::Header).expect("re-resolve");
        }
        assert_eq!(fired.get(), before, "observer re-fired on cached resolve");
    }

    #[test]
    fn test_sets_disjoint_after_resolution() {
        let collection = two_type_universe(
            value_field("b", TypeRef::new("Game", "B")),
            reference_field("a", TypeRef::new("Game", "A")),
        );
        let mut resolver = Resolver::new(&collection, GenConfig::default()).expect("resolver");
        for id in resolver.contexts().top_level_ids() {
            resolver.resolve(id, View::Header).expect("resolve");
            let ctx = resolver.context(id);
            assert!(ctx.sets_disjoint(), "definitions overlap declarations");
            assert!(!ctx.declarations_to_make.contains(&ctx.type_ref));
        }
    }

    #[test]
    fn test_reference_field_needs_only_declaration() {
        let collection = two_type_universe(
            reference_field("b", TypeRef::new("Game", "B")),
            value_field("x", TypeRef::new("System", "Int32")),
        );
        let mut resolver = Resolver::new(&collection, GenConfig::default()).expect("resolver");
        let a = resolver
            .contexts()
            .id_of(&TypeRef::new("Game", "A"))
            .expect("A context");
        resolver.resolve(a, View::Header).expect("resolve");

        let res = resolver.result(a, View::Header).expect("result");
        assert!(res.includes.is_empty(), "declaration-only need included");
        let game = res.forward_declares.get("Game").expect("namespace group");
        assert!(game.contains(&TypeRef::new("Game", "B")));
    }

    #[test]
    fn test_source_view_includes_declared_types() {
        let collection = two_type_universe(
            reference_field("b", TypeRef::new("Game", "B")),
            value_field("x", TypeRef::new("System", "Int32")),
        );
        let mut resolver = Resolver::new(&collection, GenConfig::default()).expect("resolver");
        let a = resolver
            .contexts()
            .id_of(&TypeRef::new("Game", "A"))
            .expect("A context");
        let b = resolver
            .contexts()
            .id_of(&TypeRef::new("Game", "B"))
            .expect("B context");
        resolver.resolve(a, View::Source).expect("resolve");

        let res = resolver.result(a, View::Source).expect("result");
        assert!(res.includes.contains(&a), "source must include own header");
        assert!(res.includes.contains(&b), "source widens declarations");
        assert!(res.forward_declares.is_empty());

        // The header-view truth was not polluted by the source pass.
        let header = resolver.result(a, View::Header).expect("header result");
        assert!(!header.includes.contains(&b));
    }

    #[test]
    fn test_unresolved_reference_is_reported() {
        let mut builder = TypeCollectionBuilder::new();
        builder
            .add_type(
                TypeData::new(TypeRef::new("Game", "A"), TypeKind::Struct)
                    .with_field(value_field("m", TypeRef::new("Missing", "M"))),
            )
            .expect("register");
        let collection = builder.build().expect("build");
        let mut resolver = Resolver::new(&collection, GenConfig::default()).expect("resolver");
        let a = resolver
            .contexts()
            .id_of(&TypeRef::new("Game", "A"))
            .expect("A context");
        resolver.resolve(a, View::Header).expect("resolve");

        // The field itself carries the failure; siblings are unaffected.
        let state = resolver.state(a).expect("state");
        assert!(state.fields[0].cpp_ty.is_none());
    }

    #[test]
    fn test_nested_needs_propagate_to_parent() {
        let outer_ref = TypeRef::new("Game", "Outer");
        let inner_ref = TypeRef::new("Game", "Inner").with_declaring(outer_ref.clone());
        let mut builder = TypeCollectionBuilder::new();
        builder
            .add_type(
                TypeData::new(outer_ref.clone(), TypeKind::Class).with_nested(inner_ref.clone()),
            )
            .expect("register outer");
        let mut inner = TypeData::new(inner_ref.clone(), TypeKind::Struct)
            .with_field(value_field("p", TypeRef::new("Game", "Payload")));
        inner.declaring = Some(outer_ref.clone());
        builder.add_type(inner).expect("register inner");
        builder
            .add_type(TypeData::new(
                TypeRef::new("Game", "Payload"),
                TypeKind::Struct,
            ))
            .expect("register payload");
        let collection = builder.build().expect("build");

        let mut resolver = Resolver::new(&collection, GenConfig::default()).expect("resolver");
        let outer = resolver.contexts().id_of(&outer_ref).expect("outer");
        resolver.resolve(outer, View::Header).expect("resolve");

        let payload = resolver
            .contexts()
            .id_of(&TypeRef::new("Game", "Payload"))
            .expect("payload context");
        let res = resolver.result(outer, View::Header).expect("result");
        assert!(
            res.includes.contains(&payload),
            "nested value-field requirement must reach the parent unit"
        );
        // The nested definition itself is satisfied in place, not included.
        assert!(resolver.context(outer).definitions.contains(&inner_ref));
    }

    #[test]
    fn test_overload_collision_aborts_second() {
        let int32 = TypeRef::new("System", "Int32");
        let mut builder = TypeCollectionBuilder::new();
        builder
            .add_type(
                TypeData::new(TypeRef::new("Game", "A"), TypeKind::Class)
                    .with_method(
                        cxxfacade_model::Method::new("Frob", TypeRef::void(), StorageKind::Value, 0x10)
                            .with_param(cxxfacade_model::Param::new(
                                "x",
                                int32.clone(),
                                StorageKind::Value,
                            )),
                    )
                    .with_method(
                        cxxfacade_model::Method::new("Frob", TypeRef::void(), StorageKind::Value, 0x20)
                            .with_param(cxxfacade_model::Param::new(
                                "y",
                                int32.clone(),
                                StorageKind::Value,
                            )),
                    ),
            )
            .expect("register");
        let collection = builder.build().expect("build");
        let mut resolver = Resolver::new(&collection, GenConfig::default()).expect("resolver");
        let a = resolver
            .contexts()
            .id_of(&TypeRef::new("Game", "A"))
            .expect("A context");
        resolver.resolve(a, View::Header).expect("resolve");

        let state = resolver.state(a).expect("state");
        assert!(!state.methods[0].aborted);
        assert!(state.methods[1].aborted, "second identical signature must abort");
    }

    #[test]
    fn test_generic_method_skipped() {
        let mut builder = TypeCollectionBuilder::new();
        let mut method =
            cxxfacade_model::Method::new("Make", TypeRef::void(), StorageKind::Value, 0x30);
        method.generic = true;
        builder
            .add_type(TypeData::new(TypeRef::new("Game", "A"), TypeKind::Class).with_method(method))
            .expect("register");
        let collection = builder.build().expect("build");
        let mut resolver = Resolver::new(&collection, GenConfig::default()).expect("resolver");
        let a = resolver
            .contexts()
            .id_of(&TypeRef::new("Game", "A"))
            .expect("A context");
        resolver.resolve(a, View::Header).expect("resolve");
        assert!(resolver.state(a).expect("state").methods[0].skipped);
    }

    #[test]
    fn test_names_are_deterministic_across_runs() {
        let build = || {
            let collection = two_type_universe(
                value_field("b", TypeRef::new("Game", "B")),
                reference_field("a", TypeRef::new("Game", "A")),
            );
            let mut resolver = Resolver::new(&collection, GenConfig::default()).expect("resolver");
            for id in resolver.contexts().top_level_ids() {
                resolver.resolve(id, View::Header).expect("resolve");
            }
            resolver
                .contexts()
                .top_level_ids()
                .iter()
                .map(|&id| resolver.context(id).header_file.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(build(), build());
    }
}
