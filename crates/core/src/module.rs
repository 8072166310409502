//! Module descriptors - explicit factory discovery
//!
//! A module (a crate or a feature area of one) publishes a static
//! [`ModuleDescriptor`] listing the factories it declares. Loading the
//! descriptor into a [`Context`](crate::Context) makes it part of the set the
//! startup scan walks.
//!
//! # Example
//!
//! ```ignore
//! use objbridge_core::{ModuleDescriptor, ObjectFactory};
//!
//! #[derive(ObjectFactory)]
//! #[object(base = "objbridge_core::Component", category = "Gameplay")]
//! pub struct Rotator { /* ... */ }
//!
//! pub static GAMEPLAY: ModuleDescriptor =
//!     ModuleDescriptor::new("gameplay", &[Rotator::FACTORY]);
//!
//! context.load_module(&GAMEPLAY);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{TypeInfo, TypeInfoFn};

/// One factory-eligible declaration: a type plus its category
#[derive(Clone, Copy)]
pub struct FactoryDeclaration {
    type_info: TypeInfoFn,
    category: &'static str,
}

impl FactoryDeclaration {
    pub const fn new(type_info: TypeInfoFn, category: &'static str) -> Self {
        Self {
            type_info,
            category,
        }
    }

    pub fn type_info(&self) -> &'static TypeInfo {
        (self.type_info)()
    }

    pub fn category(&self) -> &'static str {
        self.category
    }
}

impl std::fmt::Debug for FactoryDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryDeclaration")
            .field("type", &self.type_info().declared_name())
            .field("category", &self.category)
            .finish()
    }
}

/// Static table of the factories a module declares
#[derive(Debug)]
pub struct ModuleDescriptor {
    name: &'static str,
    internal: bool,
    declarations: &'static [FactoryDeclaration],
}

impl ModuleDescriptor {
    pub const fn new(name: &'static str, declarations: &'static [FactoryDeclaration]) -> Self {
        Self {
            name,
            internal: false,
            declarations,
        }
    }

    /// Mark the module as internal; the startup scan always skips it
    pub const fn internal(self) -> Self {
        Self {
            internal: true,
            ..self
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }

    pub fn declarations(&self) -> &'static [FactoryDeclaration] {
        self.declarations
    }
}

/// Which modules the startup scan skips
///
/// A module is excluded when it is marked internal, when its name starts
/// with any of `prefixes`, or when it equals any of `names`. Matching is
/// case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionPolicy {
    pub prefixes: Vec<String>,
    pub names: Vec<String>,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self {
            prefixes: vec!["system.".to_string()],
            names: vec!["hidden_scope".to_string()],
        }
    }
}

impl ExclusionPolicy {
    /// Policy that only skips internal modules
    pub fn none() -> Self {
        Self {
            prefixes: Vec::new(),
            names: Vec::new(),
        }
    }

    pub fn is_excluded(&self, module: &ModuleDescriptor) -> bool {
        let name = module.name();
        module.is_internal()
            || self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
            || self.names.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Component, StaticType};

    static EMPTY: ModuleDescriptor = ModuleDescriptor::new("gameplay", &[]);
    static SYSTEM: ModuleDescriptor = ModuleDescriptor::new("system.collections", &[]);
    static HIDDEN: ModuleDescriptor = ModuleDescriptor::new("hidden_scope", &[]);
    static INTERNAL: ModuleDescriptor = ModuleDescriptor::new("engine_glue", &[]).internal();
    static DECLARING: ModuleDescriptor = ModuleDescriptor::new(
        "declaring",
        &[FactoryDeclaration::new(<Component as StaticType>::type_info, "Core")],
    );

    #[test]
    fn test_default_exclusion() {
        let policy = ExclusionPolicy::default();
        assert!(!policy.is_excluded(&EMPTY));
        assert!(policy.is_excluded(&SYSTEM));
        assert!(policy.is_excluded(&HIDDEN));
        assert!(policy.is_excluded(&INTERNAL));
    }

    #[test]
    fn test_exclusion_is_case_sensitive() {
        static UPPER: ModuleDescriptor = ModuleDescriptor::new("System.Linq", &[]);
        assert!(!ExclusionPolicy::default().is_excluded(&UPPER));
    }

    #[test]
    fn test_none_policy_still_skips_internal() {
        let policy = ExclusionPolicy::none();
        assert!(!policy.is_excluded(&SYSTEM));
        assert!(policy.is_excluded(&INTERNAL));
    }

    #[test]
    fn test_declarations() {
        let decl = DECLARING.declarations()[0];
        assert_eq!(decl.category(), "Core");
        assert_eq!(decl.type_info().declared_name(), "Component");
    }

    #[test]
    fn test_policy_from_toml() {
        let policy: ExclusionPolicy = toml::from_str("prefixes = [\"tools.\"]").unwrap();
        assert_eq!(policy.prefixes, ["tools."]);
        // Missing keys fall back to defaults
        assert_eq!(policy.names, ["hidden_scope"]);
    }
}
