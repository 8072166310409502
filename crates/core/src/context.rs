//! Bridge context
//!
//! A [`Context`] owns everything the bridge knows: the factory registry, the
//! arena of live objects, the subsystem map, the event bus and the set of
//! loaded modules. One context is installed process-wide at a time and is
//! reachable through [`Context::instance`].
//!
//! # Lifecycle
//!
//! ```text
//! Context::new ──► ScanPending ──EngineInitialized──► Scanning ──► Ready
//! ```
//!
//! The startup scan runs exactly once, on the first `EngineInitialized`
//! event. Calls made before `Ready` see whatever the registry holds at that
//! moment.
//!
//! # Locking
//!
//! Internal maps sit behind `parking_lot` locks. No lock is held while user
//! code runs (constructors, attribute hooks, `with_object` closures, event
//! callbacks), so user code may call back into the context freely.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Weak};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use crate::attributes::AttributeInfo;
use crate::config::CoreConfig;
use crate::error::BridgeError;
use crate::events::{EventArgs, EventBus, ENGINE_INITIALIZED};
use crate::handles::{Handle, HandleError, NativePtr, ObjectArena, ObjectHandle};
use crate::hash::TypeHash;
use crate::module::ModuleDescriptor;
use crate::native::NativeRegistry;
use crate::registry::FactoryRegistry;
use crate::tasks::WorkQueue;
use crate::types::Object;

/// Installed process-wide context
static INSTANCE: LazyLock<RwLock<Weak<Context>>> = LazyLock::new(|| RwLock::new(Weak::new()));

/// A named service stored in the context
pub trait Subsystem: Any + Send + Sync {
    /// Name the subsystem is registered under
    const TYPE_NAME: &'static str;

    fn type_hash() -> TypeHash {
        TypeHash::from_name(Self::TYPE_NAME)
    }
}

/// Startup state of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeState {
    /// Being built, no subscriptions yet
    Constructed,
    /// Waiting for the engine to finish initializing
    ScanPending,
    /// Startup scan in progress
    Scanning,
    /// Startup scan done
    Ready,
}

/// Owner of the factory registry and every bridged object
pub struct Context {
    config: CoreConfig,
    pub(crate) registry: RwLock<FactoryRegistry>,
    pub(crate) objects: RwLock<ObjectArena>,
    pub(crate) attributes: RwLock<HashMap<TypeHash, Vec<AttributeInfo>>>,
    pub(crate) native: Box<dyn NativeRegistry>,
    pub(crate) state: Mutex<BridgeState>,
    subsystems: DashMap<TypeHash, Arc<dyn Any + Send + Sync>>,
    modules: RwLock<Vec<&'static ModuleDescriptor>>,
    events: EventBus,
}

impl Context {
    /// Create a context and install it as the process-wide instance
    ///
    /// # Panics
    /// If another context is still installed.
    pub fn new(config: CoreConfig, native: Box<dyn NativeRegistry>) -> Arc<Self> {
        let context = Self::new_detached(config, native);

        let mut instance = INSTANCE.write();
        if instance.strong_count() > 0 {
            drop(instance);
            panic!("A Context is already installed; drop it before creating another");
        }
        *instance = Arc::downgrade(&context);
        drop(instance);

        tracing::info!("Context installed");
        context
    }

    /// Create a context without installing it as the process-wide instance
    pub fn new_detached(config: CoreConfig, native: Box<dyn NativeRegistry>) -> Arc<Self> {
        let context = Arc::new_cyclic(|weak: &Weak<Context>| {
            let events = EventBus::new();

            let startup = weak.clone();
            events.subscribe(ENGINE_INITIALIZED, move |_, _| {
                if let Some(context) = startup.upgrade() {
                    context.on_engine_initialized();
                }
            });

            Self {
                config,
                registry: RwLock::new(FactoryRegistry::new()),
                objects: RwLock::new(ObjectArena::default()),
                attributes: RwLock::new(HashMap::new()),
                native,
                state: Mutex::new(BridgeState::Constructed),
                subsystems: DashMap::new(),
                modules: RwLock::new(Vec::new()),
                events,
            }
        });

        let queue = WorkQueue::new(
            context.config.work_queue_capacity,
            context.config.max_tasks_per_update,
        );
        let queue = match objbridge_engine::try_engine() {
            Some(engine) => queue.with_main_thread(engine.main_thread_id),
            None => queue,
        };
        context.register_subsystem(queue);

        *context.state.lock() = BridgeState::ScanPending;
        context
    }

    /// The installed context, if any
    pub fn instance() -> Option<Arc<Context>> {
        INSTANCE.read().upgrade()
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn state(&self) -> BridgeState {
        *self.state.lock()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Send an event to this context's listeners
    pub fn send_event(&self, event: TypeHash, args: &EventArgs) -> usize {
        self.events.send(event, args)
    }

    // ---- Subsystems ----

    /// Register (or replace) a subsystem
    pub fn register_subsystem<T: Subsystem>(&self, subsystem: T) -> Arc<T> {
        let subsystem = Arc::new(subsystem);
        let erased: Arc<dyn Any + Send + Sync> = subsystem.clone();
        if self.subsystems.insert(T::type_hash(), erased).is_some() {
            tracing::warn!("Subsystem {} replaced", T::TYPE_NAME);
        } else {
            tracing::debug!("Subsystem {} registered", T::TYPE_NAME);
        }
        subsystem
    }

    /// Look up a subsystem by type
    ///
    /// # Errors
    /// [`BridgeError::SubsystemNotFound`] if none is registered.
    pub fn get_subsystem<T: Subsystem>(&self) -> Result<Arc<T>, BridgeError> {
        self.subsystems
            .get(&T::type_hash())
            .map(|entry| Arc::clone(entry.value()))
            .and_then(|subsystem| subsystem.downcast::<T>().ok())
            .ok_or(BridgeError::SubsystemNotFound { name: T::TYPE_NAME })
    }

    pub fn has_subsystem<T: Subsystem>(&self) -> bool {
        self.subsystems.contains_key(&T::type_hash())
    }

    /// Remove a subsystem; returns `true` if it was registered
    pub fn remove_subsystem<T: Subsystem>(&self) -> bool {
        let removed = self.subsystems.remove(&T::type_hash());
        if removed.is_some() {
            tracing::debug!("Subsystem {} removed", T::TYPE_NAME);
        }
        removed.is_some()
    }

    /// Run queued main thread tasks
    ///
    /// Called by the engine once per frame on the main thread.
    pub fn process_main_thread_tasks(&self) -> usize {
        match self.get_subsystem::<WorkQueue>() {
            Ok(queue) => queue.process_main_thread_tasks(),
            Err(_) => 0,
        }
    }

    // ---- Modules ----

    /// Add a module to the set the startup scan walks
    ///
    /// Returns `false` if a module with the same name is already loaded.
    /// Loading after the scan does not register anything; use
    /// [`Context::register_factories`] for that.
    pub fn load_module(&self, module: &'static ModuleDescriptor) -> bool {
        let mut modules = self.modules.write();
        if modules.iter().any(|m| m.name() == module.name()) {
            tracing::warn!("Module {} already loaded", module.name());
            return false;
        }
        modules.push(module);
        tracing::debug!("Loaded module {}", module.name());
        true
    }

    /// Forget a module and remove the factories it declared
    pub fn unload_module(&self, name: &str) -> bool {
        let module = {
            let mut modules = self.modules.write();
            match modules.iter().position(|m| m.name() == name) {
                Some(index) => modules.remove(index),
                None => return false,
            }
        };

        let removed = self.remove_factories(module);
        tracing::debug!("Unloaded module {} ({} factories removed)", name, removed);
        true
    }

    /// Loaded modules in load order
    pub fn loaded_modules(&self) -> Vec<&'static ModuleDescriptor> {
        self.modules.read().clone()
    }

    /// Attribute metadata collected for a registered type
    pub fn attributes(&self, type_hash: TypeHash) -> Option<Vec<AttributeInfo>> {
        self.attributes.read().get(&type_hash).cloned()
    }

    // ---- Objects ----

    /// Release a bridged object on behalf of the native side
    ///
    /// The instance is dropped immediately unless a `with_object` closure is
    /// running on it, in which case it drops when that closure returns.
    #[tracing::instrument(skip(self))]
    pub fn release_object(&self, handle: ObjectHandle) -> bool {
        let instance = self.objects.write().remove(handle);
        match instance {
            Some(instance) => {
                tracing::trace!("Released {}", instance.object_type().type_name());
                drop(instance);
                true
            }
            None => false,
        }
    }

    /// Pair a live object with its native counterpart
    pub fn bind_native(&self, handle: ObjectHandle, native: NativePtr) -> Result<(), HandleError> {
        self.objects.write().get_mut(handle)?.native = Some(native);
        Ok(())
    }

    /// Native counterpart of a live object, if bound
    pub fn native_object(&self, handle: ObjectHandle) -> Result<Option<NativePtr>, HandleError> {
        Ok(self.objects.read().get(handle)?.native)
    }

    /// Type identifier of a live object
    pub fn object_type_hash(&self, handle: ObjectHandle) -> Result<TypeHash, HandleError> {
        Ok(self.objects.read().get(handle)?.type_hash)
    }

    /// Checked dereference of a typed handle
    ///
    /// # Errors
    /// - [`HandleError::Empty`] for the empty handle
    /// - [`HandleError::Released`] if the native side released the object
    /// - [`HandleError::TypeMismatch`] if the object is not a `T`
    pub fn with_object<T, R>(&self, handle: Handle<T>, f: impl FnOnce(&T) -> R) -> Result<R, HandleError>
    where
        T: Object,
    {
        let instance = self.live_instance(handle.untyped())?;
        match instance.as_any().downcast_ref::<T>() {
            Some(object) => Ok(f(object)),
            None => Err(HandleError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                actual: instance.object_type().type_name(),
            }),
        }
    }

    /// Dereference without a static type
    pub fn with_dyn_object<R>(
        &self,
        handle: ObjectHandle,
        f: impl FnOnce(&dyn Object) -> R,
    ) -> Result<R, HandleError> {
        let instance = self.live_instance(handle)?;
        Ok(f(instance.as_ref()))
    }

    pub fn is_alive(&self, handle: ObjectHandle) -> bool {
        self.objects.read().get(handle).is_ok()
    }

    pub fn live_objects(&self) -> usize {
        self.objects.read().len()
    }

    fn live_instance(&self, handle: ObjectHandle) -> Result<Arc<dyn Object>, HandleError> {
        Ok(Arc::clone(&self.objects.read().get(handle)?.instance))
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        {
            let mut instance = INSTANCE.write();
            if std::ptr::eq(instance.as_ptr(), self) {
                *instance = Weak::new();
                tracing::info!("Context uninstalled");
            }
        }

        let objects = self.objects.get_mut().drain();
        if !objects.is_empty() {
            tracing::debug!("Disposing {} live objects", objects.len());
        }
        drop(objects);
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("state", &self.state())
            .field("factories", &self.registry.read().len())
            .field("objects", &self.objects.read().len())
            .field("subsystems", &self.subsystems.len())
            .finish()
    }
}
