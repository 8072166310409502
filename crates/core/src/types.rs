//! Static type descriptors
//!
//! Every bridged type publishes a `'static` [`TypeInfo`] describing its name,
//! its base type, its capabilities and how to construct it. Descriptors are
//! plain data built in `static` initializers (usually by
//! `#[derive(ObjectFactory)]`), so no runtime reflection is involved.
//!
//! # Hierarchy
//!
//! ```text
//! BaseObject            creatable root kind, abstract on the native side
//!   └─ Serializable     BOUNDARY | SERIALIZABLE
//!        └─ Component   BOUNDARY
//!             └─ user types ...
//! ```
//!
//! A type is creatable when its base chain reaches [`BaseObject`]. Its
//! *wrapper base* is the nearest ancestor flagged [`TypeFlags::BOUNDARY`]:
//! the native class the engine instantiates before calling back into Rust.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::attributes::{AttributeError, AttributeRegistrar};
use crate::context::Context;
use crate::hash::TypeHash;

bitflags! {
    /// Capabilities of a bridged type
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u32 {
        /// Recognized by the native registry (has a native director class)
        const BOUNDARY = 1 << 0;
        /// Exposes serializable attributes through `register_attributes`
        const SERIALIZABLE = 1 << 1;
    }
}

/// Error raised by a type's own constructor
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ConstructionError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ConstructionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Constructor descriptor: builds a live instance owned by `context`
pub type Constructor = fn(&Arc<Context>) -> Result<Box<dyn Object>, ConstructionError>;

/// Accessor returning a type's canonical static name
pub type StaticNameFn = fn() -> &'static str;

/// Accessor returning a type's descriptor (used for lazy base links)
pub type TypeInfoFn = fn() -> &'static TypeInfo;

/// Static descriptor of a bridged type
pub struct TypeInfo {
    name: &'static str,
    static_name: Option<StaticNameFn>,
    base: Option<TypeInfoFn>,
    flags: TypeFlags,
    constructor: Option<Constructor>,
}

impl TypeInfo {
    /// Create a descriptor for a type with the given declared name
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            static_name: None,
            base: None,
            flags: TypeFlags::empty(),
            constructor: None,
        }
    }

    /// Set the base type
    pub const fn with_base(self, base: TypeInfoFn) -> Self {
        Self {
            base: Some(base),
            ..self
        }
    }

    /// Set a static-name accessor overriding the declared name
    pub const fn with_static_name(self, static_name: StaticNameFn) -> Self {
        Self {
            static_name: Some(static_name),
            ..self
        }
    }

    /// Add capability flags
    pub const fn with_flags(self, flags: TypeFlags) -> Self {
        Self {
            flags: self.flags.union(flags),
            ..self
        }
    }

    /// Set the constructor
    pub const fn with_constructor(self, constructor: Constructor) -> Self {
        Self {
            constructor: Some(constructor),
            ..self
        }
    }

    /// The name the type was declared with
    pub fn declared_name(&self) -> &'static str {
        self.name
    }

    /// Canonical name used for the type identifier
    ///
    /// The static-name accessor wins when present, otherwise the declared
    /// name is used. Two types with the same declared name and no accessor
    /// therefore share an identifier.
    pub fn type_name(&self) -> &'static str {
        match self.static_name {
            Some(accessor) => accessor(),
            None => self.name,
        }
    }

    /// Cross-boundary identifier of this type
    pub fn type_hash(&self) -> TypeHash {
        TypeHash::from_name(self.type_name())
    }

    pub fn base(&self) -> Option<&'static TypeInfo> {
        self.base.map(|base| base())
    }

    /// Flags declared on this type only (not inherited)
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    pub fn constructor(&self) -> Option<Constructor> {
        self.constructor
    }

    /// Iterate the base chain, nearest ancestor first (excludes `self`)
    pub fn ancestors(&self) -> Ancestors {
        Ancestors { next: self.base() }
    }

    /// Whether `other` is a strict ancestor of this type
    pub fn is_subclass_of(&self, other: &TypeInfo) -> bool {
        self.ancestors().any(|ancestor| std::ptr::eq(ancestor, other))
    }

    /// Whether this type is `other` or derives from it
    pub fn is_a(&self, other: &TypeInfo) -> bool {
        std::ptr::eq(self, other) || self.is_subclass_of(other)
    }

    /// Whether this type or any ancestor declares `flags`
    pub fn has_capability(&self, flags: TypeFlags) -> bool {
        self.flags.contains(flags) || self.ancestors().any(|t| t.flags.contains(flags))
    }

    /// Nearest ancestor recognized by the native registry
    pub fn wrapper_base(&self) -> Option<&'static TypeInfo> {
        self.ancestors()
            .find(|ancestor| ancestor.flags.contains(TypeFlags::BOUNDARY))
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("type_name", &self.type_name())
            .field("base", &self.base().map(|b| b.declared_name()))
            .field("flags", &self.flags)
            .field("constructible", &self.constructor.is_some())
            .finish()
    }
}

/// Iterator over a type's ancestors
pub struct Ancestors {
    next: Option<&'static TypeInfo>,
}

impl Iterator for Ancestors {
    type Item = &'static TypeInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.base();
        Some(current)
    }
}

/// Types with a static descriptor
pub trait StaticType: 'static {
    fn type_info() -> &'static TypeInfo;

    fn type_hash() -> TypeHash {
        Self::type_info().type_hash()
    }
}

/// A live bridged instance
///
/// Implemented by `#[derive(ObjectFactory)]`.
pub trait Object: Any + Send + Sync {
    /// Descriptor of the concrete type
    fn object_type(&self) -> &'static TypeInfo;

    fn as_any(&self) -> &dyn Any;

    /// Attribute registration hook, called once on a throwaway instance of
    /// every serializable type when its factory is added
    fn register_attributes(
        &self,
        _attributes: &mut AttributeRegistrar,
    ) -> Result<(), AttributeError> {
        Ok(())
    }
}

/// User-implemented construction protocol
///
/// The owning context is the sole constructor argument.
pub trait Creatable: Sized + Send + Sync + 'static {
    fn create(context: &Arc<Context>) -> Result<Self, ConstructionError>;

    fn register_attributes(
        &self,
        _attributes: &mut AttributeRegistrar,
    ) -> Result<(), AttributeError> {
        Ok(())
    }
}

/// Generic [`Constructor`] for any creatable object type
pub fn construct<T>(context: &Arc<Context>) -> Result<Box<dyn Object>, ConstructionError>
where
    T: Creatable + Object,
{
    T::create(context).map(|object| Box::new(object) as Box<dyn Object>)
}

/// Creatable root kind
///
/// Abstract on the native side, so it is not a wrapper base itself.
pub struct BaseObject;

/// Native `Serializable`: first wrapper base, carries the attribute capability
pub struct Serializable;

/// Native `Component`
pub struct Component;

static BASE_OBJECT_INFO: TypeInfo = TypeInfo::new("Object");

static SERIALIZABLE_INFO: TypeInfo = TypeInfo::new("Serializable")
    .with_base(<BaseObject as StaticType>::type_info)
    .with_flags(TypeFlags::BOUNDARY.union(TypeFlags::SERIALIZABLE));

static COMPONENT_INFO: TypeInfo = TypeInfo::new("Component")
    .with_base(<Serializable as StaticType>::type_info)
    .with_flags(TypeFlags::BOUNDARY);

impl StaticType for BaseObject {
    fn type_info() -> &'static TypeInfo {
        &BASE_OBJECT_INFO
    }
}

impl StaticType for Serializable {
    fn type_info() -> &'static TypeInfo {
        &SERIALIZABLE_INFO
    }
}

impl StaticType for Component {
    fn type_info() -> &'static TypeInfo {
        &COMPONENT_INFO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ORPHAN: TypeInfo = TypeInfo::new("Orphan");
    static DIRECT: TypeInfo = TypeInfo::new("Direct").with_base(<BaseObject as StaticType>::type_info);

    fn custom_name() -> &'static str {
        "CustomName"
    }

    static RENAMED: TypeInfo = TypeInfo::new("Renamed")
        .with_base(<Component as StaticType>::type_info)
        .with_static_name(custom_name);

    #[test]
    fn test_ancestors_order() {
        let names: Vec<_> = RENAMED.ancestors().map(|t| t.declared_name()).collect();
        assert_eq!(names, ["Component", "Serializable", "Object"]);
    }

    #[test]
    fn test_is_subclass_of() {
        let root = BaseObject::type_info();
        assert!(RENAMED.is_subclass_of(root));
        assert!(DIRECT.is_subclass_of(root));
        assert!(!ORPHAN.is_subclass_of(root));
        // Strict: a type is not its own subclass
        assert!(!root.is_subclass_of(root));
        assert!(root.is_a(root));
    }

    #[test]
    fn test_wrapper_base() {
        assert!(std::ptr::eq(
            RENAMED.wrapper_base().unwrap(),
            Component::type_info()
        ));
        assert!(std::ptr::eq(
            Component::type_info().wrapper_base().unwrap(),
            Serializable::type_info()
        ));
        assert!(DIRECT.wrapper_base().is_none());
    }

    #[test]
    fn test_static_name_overrides_declared_name() {
        assert_eq!(RENAMED.declared_name(), "Renamed");
        assert_eq!(RENAMED.type_name(), "CustomName");
        assert_eq!(RENAMED.type_hash(), TypeHash::from_name("CustomName"));
        assert_eq!(DIRECT.type_hash(), TypeHash::from_name("Direct"));
    }

    #[test]
    fn test_capabilities_are_inherited() {
        assert!(RENAMED.has_capability(TypeFlags::SERIALIZABLE));
        assert!(!RENAMED.flags().contains(TypeFlags::SERIALIZABLE));
        assert!(!DIRECT.has_capability(TypeFlags::SERIALIZABLE));
    }

    #[test]
    fn test_construction_error_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing asset");
        let err = ConstructionError::with_source("could not load", io);
        assert_eq!(err.to_string(), "could not load");
        assert!(std::error::Error::source(&err).is_some());
    }
}
