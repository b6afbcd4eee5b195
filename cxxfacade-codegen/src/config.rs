//! Generation configuration.
//!
//! Carries the output style, the per-member-kind unresolved-reference
//! policies, and the method-name blacklist. Loading configuration from
//! files is a front-end concern and lives outside this crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Shape of generated call sites and accessor return types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputStyle {
    /// Non-void results surface as `std::optional<T>`.
    #[default]
    Normal,
    /// Non-void results surface as plain `T`, unwrapped through the
    /// runtime's `CRASH_UNLESS` macro.
    CrashUnless,
}

/// What to do when a member or unit refers to a type outside the known
/// universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnresolvedPolicy {
    /// Render the failure as an inline comment block at the point of
    /// failure.
    #[default]
    Annotate,
    /// Drop the member or unit from the output.
    Skip,
    /// Propagate the failure to the caller.
    Escalate,
}

/// Per-member-kind unresolved-reference policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnresolvedHandling {
    /// Policy for failures tied to a whole type unit.
    pub types: UnresolvedPolicy,
    /// Policy for failures tied to a single field.
    pub fields: UnresolvedPolicy,
    /// Policy for failures tied to a single method.
    pub methods: UnresolvedPolicy,
}

/// Configuration for one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenConfig {
    /// Output style for generated call sites.
    pub output_style: OutputStyle,
    /// Unresolved-reference policies.
    pub unresolved: UnresolvedHandling,
    /// Method names that are never emitted.
    pub blacklist_methods: BTreeSet<String>,
    /// Tag written into provenance comments at the top of every unit.
    /// Fixed text, never a timestamp: output must be byte-stable.
    pub provenance_tag: String,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            output_style: OutputStyle::Normal,
            unresolved: UnresolvedHandling::default(),
            blacklist_methods: BTreeSet::new(),
            provenance_tag: "cxxfacade".to_string(),
        }
    }
}

impl GenConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output style.
    #[must_use]
    pub fn with_output_style(mut self, style: OutputStyle) -> Self {
        self.output_style = style;
        self
    }

    /// Applies one policy to all unresolved-reference handling.
    #[must_use]
    pub fn with_unresolved_policy(mut self, policy: UnresolvedPolicy) -> Self {
        self.unresolved = UnresolvedHandling {
            types: policy,
            fields: policy,
            methods: policy,
        };
        self
    }

    /// Adds a method name to the blacklist.
    #[must_use]
    pub fn with_blacklisted_method(mut self, name: impl Into<String>) -> Self {
        self.blacklist_methods.insert(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GenConfig::default();
        assert_eq!(config.output_style, OutputStyle::Normal);
        assert_eq!(config.unresolved.fields, UnresolvedPolicy::Annotate);
        assert!(config.blacklist_methods.is_empty());
    }

    #[test]
    fn test_builder_style() {
        let config = GenConfig::new()
            .with_output_style(OutputStyle::CrashUnless)
            .with_unresolved_policy(UnresolvedPolicy::Escalate)
            .with_blacklisted_method("Finalize");
        assert_eq!(config.output_style, OutputStyle::CrashUnless);
        assert_eq!(config.unresolved.types, UnresolvedPolicy::Escalate);
        assert!(config.blacklist_methods.contains("Finalize"));
    }
}
