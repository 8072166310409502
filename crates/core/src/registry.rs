//! Factory registry - type identifier to constructor map
//!
//! The registry is a dumb, total map. It never validates what it stores:
//! base-kind checks, naming and category handling live in the bridge
//! (`Context::add_factory_reflection`). It has no internal locking; the
//! owning [`Context`](crate::Context) serializes access.

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::Context;
use crate::hash::TypeHash;
use crate::types::{ConstructionError, Constructor, Object, TypeInfo};

/// A registered factory
#[derive(Clone)]
pub struct TypeRegistration {
    /// Registry key
    pub type_hash: TypeHash,

    /// Declaring type metadata
    pub type_info: &'static TypeInfo,

    /// Constructor descriptor
    pub constructor: Constructor,

    /// Editor/tooling category, may be empty
    pub category: String,
}

impl TypeRegistration {
    pub fn new(
        type_hash: TypeHash,
        type_info: &'static TypeInfo,
        constructor: Constructor,
        category: impl Into<String>,
    ) -> Self {
        Self {
            type_hash,
            type_info,
            constructor,
            category: category.into(),
        }
    }

    /// Name published to the native registry
    pub fn type_name(&self) -> &'static str {
        self.type_info.type_name()
    }

    /// Whether this entry was registered for `type_info`
    pub fn is_for(&self, type_info: &TypeInfo) -> bool {
        std::ptr::eq(self.type_info, type_info)
    }

    /// Run the constructor
    pub fn construct(&self, context: &Arc<Context>) -> Result<Box<dyn Object>, ConstructionError> {
        (self.constructor)(context)
    }
}

impl std::fmt::Debug for TypeRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistration")
            .field("type_hash", &self.type_hash)
            .field("type", &self.type_info.declared_name())
            .field("category", &self.category)
            .finish()
    }
}

/// Map from type identifier to registration
#[derive(Debug, Default)]
pub struct FactoryRegistry {
    entries: HashMap<TypeHash, TypeRegistration>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the entry for `type_hash`
    ///
    /// Returns the replaced entry. Overwriting is not an error.
    pub fn register(&mut self, registration: TypeRegistration) -> Option<TypeRegistration> {
        self.entries.insert(registration.type_hash, registration)
    }

    /// Remove the entry for `type_hash`, if any
    pub fn unregister(&mut self, type_hash: TypeHash) -> Option<TypeRegistration> {
        self.entries.remove(&type_hash)
    }

    pub fn resolve(&self, type_hash: TypeHash) -> Option<&TypeRegistration> {
        self.entries.get(&type_hash)
    }

    pub fn is_registered(&self, type_hash: TypeHash) -> bool {
        self.entries.contains_key(&type_hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
