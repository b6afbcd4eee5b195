//! Output-name resolution and uniquification.
//!
//! Every [`TypeRef`] resolved to output text receives a [`ResolvedName`]:
//! its sanitized simple name plus a disambiguation suffix (0 = none). The
//! assignment is lazy and monotonic: a reference is named the first time it
//! is resolved, the name is never reassigned, and a rendered name is never
//! reused for a different reference.

use cxxfacade_model::TypeRef;
use std::collections::{BTreeSet, HashMap};

/// A sanitized output name with its disambiguation suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    /// Sanitized base name.
    pub base: String,
    /// Disambiguation suffix; 0 means the base name is used as-is.
    pub suffix: u32,
}

impl ResolvedName {
    /// Renders the final output name.
    #[must_use]
    pub fn rendered(&self) -> String {
        if self.suffix == 0 {
            self.base.clone()
        } else {
            format!("{}_{}", self.base, self.suffix)
        }
    }
}

/// Lazy, monotonic map from type reference to output name.
#[derive(Debug, Default)]
pub struct NameMap {
    assigned: HashMap<TypeRef, ResolvedName>,
    used: BTreeSet<String>,
}

impl NameMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a reference to its unique output name, assigning one on
    /// first use. Collisions increment the suffix until the rendered name
    /// is unused.
    pub fn resolve(&mut self, ty: &TypeRef) -> String {
        if let Some(existing) = self.assigned.get(ty) {
            return existing.rendered();
        }
        let base = sanitize_identifier(&ty.name);
        let mut candidate = ResolvedName {
            base: base.clone(),
            suffix: 0,
        };
        while self.used.contains(&candidate.rendered()) {
            candidate.suffix += 1;
        }
        let rendered = candidate.rendered();
        self.used.insert(rendered.clone());
        self.assigned.insert(ty.clone(), candidate);
        rendered
    }

    /// Returns the already-assigned name for a reference, if any.
    #[must_use]
    pub fn resolved(&self, ty: &TypeRef) -> Option<&ResolvedName> {
        self.assigned.get(ty)
    }

    /// Number of assigned names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// Returns true if no names are assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// Replaces every character that is not valid in a C++ identifier with an
/// underscore, prefixing one when the name starts with a digit.
#[must_use]
pub fn sanitize_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if i == 0 && c.is_ascii_digit() {
                out.push('_');
            }
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

/// The C++ namespace for an input namespace: dots become `::`, the empty
/// namespace maps to `GlobalNamespace`.
#[must_use]
pub fn cpp_namespace(ns: &str) -> String {
    if ns.is_empty() {
        "GlobalNamespace".to_string()
    } else {
        ns.replace('.', "::")
    }
}

/// The directory path for an input namespace: dots become `/`, the empty
/// namespace maps to `GlobalNamespace`.
#[must_use]
pub fn namespace_path(ns: &str) -> String {
    if ns.is_empty() {
        "GlobalNamespace".to_string()
    } else {
        ns.replace('.', "/")
    }
}
