//! Per-type member serializer state.
//!
//! The pre-serialization pass snapshots, for every member of a type, the
//! rendered C++ type names and enough bookkeeping to later emit either a
//! declaration or a definition line. Unresolved references are recorded as
//! `None` render slots and surfaced at emission time according to the
//! configured policy; they never abort sibling members here.

use cxxfacade_model::{Specifier, StorageKind, TypeRef};
use std::collections::BTreeSet;

/// Method names that are never emitted (conversion operators have no
/// faithful rendering over the dynamic-invocation protocol).
pub(crate) const IGNORED_METHODS: [&str; 2] = ["op_Implicit", "op_Explicit"];

/// Render state for one field.
#[derive(Debug, Clone)]
pub struct FieldState {
    /// Sanitized field name.
    pub name: String,
    /// Raw reference as found in the model.
    pub ty: TypeRef,
    /// Canonical reference, when the type resolved.
    pub canonical: Option<TypeRef>,
    /// Rendered C++ type; `None` when the reference is unresolved.
    pub cpp_ty: Option<String>,
    /// Storage classification.
    pub storage: StorageKind,
    /// Byte offset for the traceability comment.
    pub offset: u32,
    /// True for static fields (emitted as accessor pairs).
    pub is_static: bool,
    /// Traceability comment text (specifiers, original type, name).
    pub comment: String,
    /// True when a duplicate-definition cycle forced pointer storage.
    pub downgraded: bool,
}

impl FieldState {
    /// The rendered C++ type, with the cycle downgrade applied.
    #[must_use]
    pub fn rendered_ty(&self) -> Option<String> {
        let base = self.cpp_ty.clone()?;
        if self.downgraded {
            Some(format!("{base}*"))
        } else {
            Some(base)
        }
    }
}

/// Render state for one method parameter.
#[derive(Debug, Clone)]
pub struct ParamState {
    /// Parameter name.
    pub name: String,
    /// Raw reference as found in the model.
    pub ty: TypeRef,
    /// Rendered C++ type; `None` when unresolved.
    pub cpp_ty: Option<String>,
}

/// Render state for one method.
#[derive(Debug, Clone)]
pub struct MethodState {
    /// Original method name.
    pub name: String,
    /// Sanitized C++ method name.
    pub cpp_name: String,
    /// Rendered return type; `None` when unresolved.
    pub ret: Option<String>,
    /// Raw return reference.
    pub ret_ty: TypeRef,
    /// Parameters in order.
    pub params: Vec<ParamState>,
    /// True for static methods.
    pub is_static: bool,
    /// Byte offset for the traceability comment.
    pub offset: u64,
    /// Traceability comment text (specifiers, original signature).
    pub comment: String,
    /// Interface slot the method implements, if any.
    pub implemented_from: Option<TypeRef>,
    /// True when the method has unbound generic parameters and was never
    /// pre-processed.
    pub skipped: bool,
    /// True for ignored or blacklisted names: pre-processed, never
    /// emitted.
    pub suppressed: bool,
    /// True when the signature collided with an earlier method of the
    /// same type; surfaces only as a comment.
    pub aborted: bool,
}

impl MethodState {
    /// First unresolved reference of the method, if any.
    #[must_use]
    pub fn unresolved_ref(&self) -> Option<&TypeRef> {
        if self.ret.is_none() {
            return Some(&self.ret_ty);
        }
        self.params
            .iter()
            .find(|p| p.cpp_ty.is_none())
            .map(|p| &p.ty)
    }

    /// True when every referenced type rendered successfully.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.unresolved_ref().is_none()
    }
}

/// Snapshot of one type's member render state.
#[derive(Debug)]
pub struct TypeState {
    /// Resolved literal type name (unqualified).
    pub type_name: String,
    /// Fully qualified C++ name (`Ns::Outer::Name`).
    pub qualified_name: String,
    /// C++ namespace of the unit.
    pub cpp_namespace: String,
    /// Joined specifier text for the type comment.
    pub specifiers: String,
    /// Rendered parent type name, when resolved.
    pub parent_name: Option<String>,
    /// Unresolved parent reference, when resolution failed.
    pub parent_unresolved: Option<TypeRef>,
    /// Implemented interfaces, original names, for the type comment.
    pub interfaces: Vec<String>,
    /// True when the type is an interface.
    pub is_interface: bool,
    /// True when methods are emitted as pure-virtual declarations.
    pub pure_virtual: bool,
    /// `template<...>` line for generic templates.
    pub template_line: Option<String>,
    /// True when the whole unit is header-only and method bodies are
    /// defined inline.
    pub need_def_in_header: bool,
    /// Field render states, in declaration order.
    pub fields: Vec<FieldState>,
    /// Property traceability comments, in declaration order.
    pub property_comments: Vec<String>,
    /// Method render states, in declaration order.
    pub methods: Vec<MethodState>,
    /// Types whose members were downgraded by duplicate-definition
    /// repair.
    pub downgraded: BTreeSet<TypeRef>,
}

impl TypeState {
    /// Downgrades every member that required `offending` as a full
    /// definition to pointer indirection, so the emitted unit compiles
    /// against a forward declaration.
    pub fn downgrade(&mut self, offending: &TypeRef) {
        self.downgraded.insert(offending.clone());
        for f in &mut self.fields {
            if f.canonical.as_ref() == Some(offending) && f.storage.needs_definition() {
                f.downgraded = true;
            }
        }
    }
}

/// Sanitizes a method name for C++ emission: angle brackets become `$`,
/// dots become `_` (handles `.ctor` and compiler-generated names).
#[must_use]
pub(crate) fn sanitize_method_name(name: &str) -> String {
    name.replace(['<', '>'], "$").replace('.', "_")
}

/// Joins specifiers into comment text with a trailing space, or an empty
/// string when there are none.
#[must_use]
pub(crate) fn format_specifiers(specifiers: &[Specifier]) -> String {
    let mut s = String::new();
    for spec in specifiers {
        s.push_str(&spec.0);
        s.push(' ');
    }
    s
}

/// Builds the `template<typename A, typename B>` line for a generic
/// template reference.
#[must_use]
pub(crate) fn template_line_for(ty: &TypeRef) -> Option<String> {
    if !ty.is_generic_template() {
        return None;
    }
    let params: Vec<String> = ty
        .generics
        .iter()
        .map(|g| format!("typename {}", g.name))
        .collect();
    Some(format!("template<{}>", params.join(", ")))
}
