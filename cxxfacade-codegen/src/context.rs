//! Per-type resolution state.
//!
//! One [`TypeContext`] exists per abstract type. Contexts are stored in a
//! [`ContextMap`] arena and addressed by [`ContextId`]; the declaring-type
//! back edge is an id relation, never an owning pointer, so the
//! parent/nested relation cannot form an ownership cycle. Ownership of
//! nested contexts flows strictly parent to child through the `nested`
//! list.

use cxxfacade_model::{TypeKind, TypeRef};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

/// Which unit a resolution targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum View {
    /// The declaration unit (`.hpp`).
    Header,
    /// The definition unit (`.cpp`).
    Source,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Header => "header",
            Self::Source => "source",
        })
    }
}

/// The visibility a use site requires of a referenced type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeedAs {
    /// The full definition must be textually available.
    Definition,
    /// A forward declaration suffices.
    Declaration,
    /// Prefer the definition; used when the whole unit is header-only.
    BestMatch,
}

impl NeedAs {
    /// Returns true if this need pulls in the full definition.
    #[must_use]
    pub const fn wants_definition(&self) -> bool {
        matches!(self, Self::Definition | Self::BestMatch)
    }
}

/// Handle to a context in a [`ContextMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(usize);

/// Per-type mutable resolution state.
///
/// Mutated only during the single resolution pass for its own type, then
/// read-only for emission.
#[derive(Debug)]
pub struct TypeContext {
    /// Canonical reference of the local type.
    pub type_ref: TypeRef,
    /// Kind of the local type.
    pub kind: TypeKind,
    /// Types whose full definition this unit textually contains (itself,
    /// in-place nested types, and everything obtained through includes).
    pub definitions: BTreeSet<TypeRef>,
    /// Types needed as full definitions that must be obtained via
    /// includes.
    pub definitions_to_get: BTreeSet<TypeRef>,
    /// Types this unit forward-declares.
    pub declarations_to_make: BTreeSet<TypeRef>,
    /// Declarations inherited from included units.
    pub declarations: BTreeSet<TypeRef>,
    /// Contexts of nested types, in declaration order.
    pub nested: Vec<ContextId>,
    /// Declaring context, for nested types. Non-owning.
    pub declaring: Option<ContextId>,
    /// True when this type is emitted textually inside its declaring
    /// unit rather than as an independent unit.
    pub in_place: bool,
    /// Header file of the unit that defines this type, relative to the
    /// include root. For in-place types this is the enclosing unit's file.
    pub header_file: String,
    /// Source file for the definition unit, relative to the source root.
    pub source_file: String,
}

impl TypeContext {
    /// Creates a context for a type; `definitions` is seeded with the
    /// type's own reference.
    #[must_use]
    pub fn new(type_ref: TypeRef, kind: TypeKind) -> Self {
        let mut definitions = BTreeSet::new();
        definitions.insert(type_ref.clone());
        Self {
            type_ref,
            kind,
            definitions,
            definitions_to_get: BTreeSet::new(),
            declarations_to_make: BTreeSet::new(),
            declarations: BTreeSet::new(),
            nested: Vec::new(),
            declaring: None,
            in_place: false,
            header_file: String::new(),
            source_file: String::new(),
        }
    }

    /// Records that a use site needs `ty` with the given visibility.
    ///
    /// A definition need supersedes an earlier declaration need; a
    /// declaration need is ignored when the definition is already present
    /// or pending.
    pub fn request(&mut self, ty: TypeRef, need: NeedAs) {
        if ty == self.type_ref {
            return;
        }
        if need.wants_definition() {
            if !self.definitions.contains(&ty) {
                self.declarations_to_make.remove(&ty);
                self.definitions_to_get.insert(ty);
            }
        } else if !self.definitions.contains(&ty) && !self.definitions_to_get.contains(&ty) {
            self.declarations_to_make.insert(ty);
        }
    }

    /// Returns true if `definitions` and `declarations_to_make` are
    /// disjoint.
    #[must_use]
    pub fn sets_disjoint(&self) -> bool {
        self.definitions.is_disjoint(&self.declarations_to_make)
    }
}

/// Arena of contexts with a reference index.
#[derive(Debug, Default)]
pub struct ContextMap {
    contexts: Vec<TypeContext>,
    index: BTreeMap<TypeRef, ContextId>,
}

impl ContextMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a context, indexing it by its canonical reference.
    pub fn insert(&mut self, context: TypeContext) -> ContextId {
        let id = ContextId(self.contexts.len());
        self.index.insert(context.type_ref.clone(), id);
        self.contexts.push(context);
        id
    }

    /// Borrows a context. Ids are only minted by [`Self::insert`], so
    /// every id is valid for the map that produced it.
    #[must_use]
    pub fn get(&self, id: ContextId) -> &TypeContext {
        &self.contexts[id.0]
    }

    /// Mutably borrows a context.
    #[must_use]
    pub fn get_mut(&mut self, id: ContextId) -> &mut TypeContext {
        &mut self.contexts[id.0]
    }

    /// Looks up the context for a canonical reference.
    #[must_use]
    pub fn id_of(&self, ty: &TypeRef) -> Option<ContextId> {
        self.index.get(ty).copied()
    }

    /// Iterates contexts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ContextId, &TypeContext)> {
        self.contexts
            .iter()
            .enumerate()
            .map(|(i, c)| (ContextId(i), c))
    }

    /// Ids of all top-level (non-in-place) contexts, in insertion order.
    #[must_use]
    pub fn top_level_ids(&self) -> Vec<ContextId> {
        self.iter()
            .filter(|(_, c)| !c.in_place)
            .map(|(id, _)| id)
            .collect()
    }

    /// Returns true if `node` is `ancestor` or lies in `ancestor`'s nested
    /// hierarchy.
    #[must_use]
    pub fn in_hierarchy(&self, ancestor: ContextId, node: ContextId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.get(id).declaring;
        }
        false
    }

    /// Number of contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Returns true if the map holds no contexts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
