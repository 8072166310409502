//! Object factory bridge
//!
//! Registration, removal and creation of bridged types, as methods on
//! [`Context`].
//!
//! # Registration
//!
//! ```text
//! add_factory_reflection(type, category)
//!   1. validate      derives from Object, has a constructor
//!   2. identify      TypeHash of the static name, else the declared name;
//!                    name and category must be free of NUL bytes
//!   3. wrapper base  nearest BOUNDARY ancestor
//!   4. strict check  optional, rejects a different type under the same hash
//!   5. attributes    throwaway instance, serializable types only
//!   6. commit        registry, attributes, native registry
//! ```
//!
//! Nothing is mutated before step 6, so a failed registration leaves the
//! registry exactly as it was. Re-registering a hash overwrites the previous
//! entry (last writer wins) unless `strict_type_names` is set.
//!
//! A scan remembers the entries it overwrote, and
//! [`Context::unregister_modules`] puts them back.

use std::collections::HashSet;
use std::sync::Arc;

use objbridge_sdk::DIRECTOR_PREFIX;

use crate::attributes::{AttributeInfo, AttributeRegistrar};
use crate::context::{BridgeState, Context};
use crate::error::BridgeError;
use crate::handles::{Handle, ObjectHandle};
use crate::hash::TypeHash;
use crate::module::ModuleDescriptor;
use crate::registry::TypeRegistration;
use crate::types::{BaseObject, Constructor, StaticType, TypeFlags, TypeInfo};

/// Identifier the native registry knows a wrapper base by
pub fn director_type_hash(wrapper_base: &TypeInfo) -> TypeHash {
    let name = format!("{}{}", DIRECTOR_PREFIX, wrapper_base.type_name());
    TypeHash::from_name(&name)
}

/// One declaration the scan could not register
#[derive(Debug)]
pub struct ScanFailure {
    pub module: &'static str,
    pub type_name: &'static str,
    pub error: BridgeError,
}

/// A registration that existed before a scan overwrote it
#[derive(Debug, Clone)]
pub struct ReplacedFactory {
    pub registration: TypeRegistration,
    pub attributes: Option<Vec<AttributeInfo>>,
}

/// Outcome of a module scan
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Factories registered
    pub registered: usize,

    /// Modules skipped by the exclusion policy
    pub excluded: Vec<&'static str>,

    pub failures: Vec<ScanFailure>,

    /// Pre-scan entries overwritten by the scan, at most one per identifier
    pub replaced: Vec<ReplacedFactory>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Context {
    /// Register every factory declared by the given modules
    ///
    /// Modules matched by the configured exclusion policy are skipped. A
    /// failing declaration is logged and recorded; scanning continues with
    /// the next one.
    #[tracing::instrument(skip_all, fields(modules = modules.len()))]
    pub fn scan_and_register(self: &Arc<Self>, modules: &[&'static ModuleDescriptor]) -> ScanReport {
        let mut report = ScanReport::default();
        let mut touched = HashSet::new();

        for module in modules {
            if self.config().exclusion.is_excluded(module) {
                tracing::debug!("Skipping excluded module {}", module.name());
                report.excluded.push(module.name());
                continue;
            }

            for declaration in module.declarations() {
                let type_info = declaration.type_info();
                let previous = self.snapshot(type_info.type_hash());
                match self.add_factory_reflection(type_info, declaration.category()) {
                    Ok(type_hash) => {
                        report.registered += 1;
                        // Only the first overwrite of an identifier saw its pre-scan entry
                        if touched.insert(type_hash) {
                            report.replaced.extend(previous);
                        }
                    }
                    Err(error) => {
                        tracing::error!(
                            "Failed to register factory {} from {}: {}",
                            type_info.declared_name(),
                            module.name(),
                            error
                        );
                        report.failures.push(ScanFailure {
                            module: module.name(),
                            type_name: type_info.declared_name(),
                            error,
                        });
                    }
                }
            }
        }

        tracing::info!(
            "Registered {} factories ({} failed, {} modules excluded)",
            report.registered,
            report.failures.len(),
            report.excluded.len()
        );
        report
    }

    /// Mirror of [`Context::scan_and_register`]: remove every factory the
    /// given modules declare, then reinstate the entries the scan replaced
    ///
    /// Returns how many registrations were removed.
    pub fn unregister_modules(
        &self,
        modules: &[&'static ModuleDescriptor],
        report: &ScanReport,
    ) -> usize {
        let removed = modules
            .iter()
            .filter(|module| !self.config().exclusion.is_excluded(module))
            .map(|module| self.remove_factories(module))
            .sum();

        for replaced in &report.replaced {
            self.restore(replaced);
        }
        removed
    }

    /// Current entry for `type_hash` with its attributes
    fn snapshot(&self, type_hash: TypeHash) -> Option<ReplacedFactory> {
        let registration = self.registration(type_hash)?;
        Some(ReplacedFactory {
            registration,
            attributes: self.attributes(type_hash),
        })
    }

    /// Reinstate a replaced entry unless its identifier was taken again
    fn restore(&self, replaced: &ReplacedFactory) {
        let registration = &replaced.registration;
        if self.is_reflected_hash(registration.type_hash) {
            tracing::debug!(
                "Not restoring {}: identifier in use",
                registration.type_name()
            );
            return;
        }
        let Some(wrapper_base) = registration.type_info.wrapper_base() else {
            return;
        };

        self.commit(
            registration.clone(),
            replaced.attributes.clone(),
            wrapper_base,
        );
        tracing::debug!("Restored factory {}", registration.type_name());
    }

    /// Register one module's factories, stopping at the first failure
    ///
    /// The exclusion policy does not apply to explicit registration.
    pub fn register_factories(
        self: &Arc<Self>,
        module: &'static ModuleDescriptor,
    ) -> Result<usize, BridgeError> {
        for declaration in module.declarations() {
            self.add_factory_reflection(declaration.type_info(), declaration.category())?;
        }
        Ok(module.declarations().len())
    }

    /// Remove one module's factories
    ///
    /// Returns how many registrations were removed.
    pub fn remove_factories(&self, module: &ModuleDescriptor) -> usize {
        module
            .declarations()
            .iter()
            .filter(|declaration| self.remove_reflection(declaration.type_info()))
            .count()
    }

    /// Register a factory for `T`
    pub fn add_factory<T: StaticType>(self: &Arc<Self>, category: &str) -> Result<TypeHash, BridgeError> {
        self.add_factory_reflection(T::type_info(), category)
    }

    /// Register a factory for a bridged type
    ///
    /// # Errors
    /// - [`BridgeError::InvalidArgument`] if the type does not derive from
    ///   [`BaseObject`] or has no constructor
    /// - [`BridgeError::UnregisterableType`] if no ancestor is known to the
    ///   native registry
    /// - [`BridgeError::DuplicateType`] in strict mode, if a different type
    ///   owns the identifier
    /// - [`BridgeError::Construction`] / [`BridgeError::Attributes`] if the
    ///   attribute hook of a serializable type fails
    #[tracing::instrument(skip(self, type_info), fields(type_name = type_info.type_name()))]
    pub fn add_factory_reflection(
        self: &Arc<Self>,
        type_info: &'static TypeInfo,
        category: &str,
    ) -> Result<TypeHash, BridgeError> {
        let declared = type_info.declared_name();
        if !type_info.is_subclass_of(BaseObject::type_info()) {
            return Err(BridgeError::invalid(declared, "does not derive from Object"));
        }
        let Some(constructor) = type_info.constructor() else {
            return Err(BridgeError::invalid(declared, "has no constructor"));
        };

        let type_name = type_info.type_name();
        let type_hash = type_info.type_hash();

        // Both strings cross the boundary as C strings
        if type_name.contains('\0') {
            return Err(BridgeError::invalid(declared, "name contains a NUL byte"));
        }
        if category.contains('\0') {
            return Err(BridgeError::invalid(declared, "category contains a NUL byte"));
        }

        let wrapper_base = type_info
            .wrapper_base()
            .ok_or_else(|| BridgeError::UnregisterableType {
                type_name: type_name.to_string(),
            })?;

        if self.config().strict_type_names {
            if let Some(existing) = self.registry.read().resolve(type_hash) {
                if !existing.is_for(type_info) {
                    return Err(BridgeError::DuplicateType {
                        type_name: type_name.to_string(),
                        existing: existing.type_info.declared_name().to_string(),
                    });
                }
            }
        }

        let attributes = if type_info.has_capability(TypeFlags::SERIALIZABLE) {
            Some(self.collect_attributes(type_info, constructor)?)
        } else {
            None
        };

        let registration = TypeRegistration::new(type_hash, type_info, constructor, category);
        if let Some(previous) = self.commit(registration, attributes, wrapper_base) {
            if !previous.is_for(type_info) {
                tracing::warn!(
                    "Factory {} ({}) replaced by another type",
                    type_name,
                    type_hash
                );
            }
        }

        tracing::debug!(
            "Registered factory {} ({}) with base {} in {:?}",
            type_name,
            type_hash,
            wrapper_base.type_name(),
            category
        );
        Ok(type_hash)
    }

    /// Install a validated registration in the registry, the attribute
    /// store and the native registry
    ///
    /// Returns the entry it replaced.
    fn commit(
        &self,
        registration: TypeRegistration,
        attributes: Option<Vec<AttributeInfo>>,
        wrapper_base: &TypeInfo,
    ) -> Option<TypeRegistration> {
        let type_hash = registration.type_hash;
        let type_name = registration.type_name();
        let category = registration.category.clone();
        let replaced = self.registry.write().register(registration);

        {
            let mut store = self.attributes.write();
            match attributes {
                Some(attributes) => {
                    store.insert(type_hash, attributes);
                }
                None => {
                    store.remove(&type_hash);
                }
            }
        }

        self.native
            .register_factory(type_name, director_type_hash(wrapper_base), &category);
        replaced
    }

    /// Run the attribute hook on a throwaway instance
    ///
    /// The instance is dropped before the result is inspected, so it never
    /// outlives this call.
    fn collect_attributes(
        self: &Arc<Self>,
        type_info: &'static TypeInfo,
        constructor: Constructor,
    ) -> Result<Vec<AttributeInfo>, BridgeError> {
        let type_name = type_info.type_name();
        let instance = constructor(self).map_err(|source| BridgeError::Construction {
            type_name: type_name.to_string(),
            source,
        })?;

        let mut registrar = AttributeRegistrar::new();
        let result = instance.register_attributes(&mut registrar);
        drop(instance);

        result.map_err(|source| BridgeError::Attributes {
            type_name: type_name.to_string(),
            source,
        })?;
        Ok(registrar.into_attributes())
    }

    /// Remove the factory registered for `type_info`
    ///
    /// An entry registered under the same identifier by a different type is
    /// left alone. Returns `true` if an entry was removed.
    pub fn remove_reflection(&self, type_info: &'static TypeInfo) -> bool {
        let type_hash = type_info.type_hash();
        let removed = {
            let mut registry = self.registry.write();
            match registry.resolve(type_hash) {
                Some(entry) if entry.is_for(type_info) => registry.unregister(type_hash),
                _ => None,
            }
        };

        let Some(entry) = removed else {
            return false;
        };

        self.attributes.write().remove(&type_hash);
        self.native.remove_factory(entry.type_name());
        tracing::debug!("Removed factory {} ({})", entry.type_name(), type_hash);
        true
    }

    /// Whether a factory is registered for exactly this type
    pub fn is_reflected(&self, type_info: &TypeInfo) -> bool {
        self.registry
            .read()
            .resolve(type_info.type_hash())
            .is_some_and(|entry| entry.is_for(type_info))
    }

    /// Whether any factory is registered under `type_hash`
    pub fn is_reflected_hash(&self, type_hash: TypeHash) -> bool {
        self.registry.read().is_registered(type_hash)
    }

    /// Snapshot of the registration for `type_hash`
    pub fn registration(&self, type_hash: TypeHash) -> Option<TypeRegistration> {
        self.registry.read().resolve(type_hash).cloned()
    }

    pub fn factory_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Instantiate a registered type
    ///
    /// Returns [`ObjectHandle::EMPTY`] when nothing is registered under
    /// `type_hash`.
    ///
    /// # Errors
    /// [`BridgeError::Construction`] with the constructor's own error.
    #[tracing::instrument(skip(self))]
    pub fn create_object(self: &Arc<Self>, type_hash: TypeHash) -> Result<ObjectHandle, BridgeError> {
        let Some(registration) = self.registration(type_hash) else {
            tracing::debug!("No factory registered for {}", type_hash);
            return Ok(ObjectHandle::EMPTY);
        };

        let instance = registration
            .construct(self)
            .map_err(|source| BridgeError::Construction {
                type_name: registration.type_name().to_string(),
                source,
            })?;

        let handle = self
            .objects
            .write()
            .insert(Arc::from(instance), type_hash);
        tracing::trace!("Created {} as {:?}", registration.type_name(), handle);
        Ok(handle)
    }

    /// Typed convenience over [`Context::create_object`]
    pub fn create<T: StaticType>(self: &Arc<Self>) -> Result<Handle<T>, BridgeError> {
        self.create_object(T::type_hash()).map(ObjectHandle::typed::<T>)
    }

    /// Startup scan, run on the first `EngineInitialized` event
    pub(crate) fn on_engine_initialized(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            if *state != BridgeState::ScanPending {
                tracing::warn!("Engine initialized again while {:?}, ignoring", *state);
                return;
            }
            *state = BridgeState::Scanning;
        }

        let modules = self.loaded_modules();
        let report = self.scan_and_register(&modules);
        if !report.is_clean() {
            tracing::error!("{} factories failed to register", report.failures.len());
        }

        *self.state.lock() = BridgeState::Ready;
        tracing::info!("Object factory bridge ready");
    }
}
