//! Global native API storage
//!
//! The native function table is acquired during bridge load and stored here
//! until the bridge unloads. A later load installs the new engine's table.

use std::ffi::CString;
use std::ptr::NonNull;
use std::sync::Arc;
use std::thread::ThreadId;

use parking_lot::RwLock;

use objbridge_sdk::{NativeContext, RegisterFactoryFn, RemoveFactoryFn};

use crate::error::ApiError;

/// Global engine state containing the validated native API
pub struct EngineGlobals {
    /// Native context all factory registrations are made against
    pub context: NonNull<NativeContext>,

    /// `RegisterFactory` entry point
    register_factory: RegisterFactoryFn,

    /// `RemoveFactory` entry point
    remove_factory: RemoveFactoryFn,

    /// Main engine thread ID for thread safety checks
    pub main_thread_id: ThreadId,
}

// SAFETY: The context pointer and function pointers live for as long as the
// bridge is loaded, and are dropped from the slot on unload. The native side
// serializes calls through its main thread.
unsafe impl Send for EngineGlobals {}
unsafe impl Sync for EngineGlobals {}

/// Global engine state storage, empty while no engine is attached
static ENGINE: RwLock<Option<Arc<EngineGlobals>>> = RwLock::new(None);

/// Initialize engine globals
///
/// Called during bridge load. Returns error if a table is already installed;
/// [`shutdown_engine`] must run first.
pub fn init_engine(globals: EngineGlobals) -> Result<(), ApiError> {
    let mut slot = ENGINE.write();
    if slot.is_some() {
        return Err(ApiError::AlreadyInitialized);
    }
    *slot = Some(Arc::new(globals));
    Ok(())
}

/// Drop the installed engine globals
///
/// Called during bridge unload. Returns `false` if nothing was installed.
pub fn shutdown_engine() -> bool {
    ENGINE.write().take().is_some()
}

/// Try to get engine globals
pub fn try_engine() -> Option<Arc<EngineGlobals>> {
    ENGINE.read().clone()
}

/// Check if engine is initialized
pub fn is_engine_initialized() -> bool {
    ENGINE.read().is_some()
}

/// Check if current thread is the main engine thread
pub fn is_main_thread() -> bool {
    ENGINE
        .read()
        .as_ref()
        .map(|g| std::thread::current().id() == g.main_thread_id)
        .unwrap_or(false)
}

impl EngineGlobals {
    /// Create new EngineGlobals
    ///
    /// The calling thread is recorded as the main thread.
    pub fn new(
        context: NonNull<NativeContext>,
        register_factory: RegisterFactoryFn,
        remove_factory: RemoveFactoryFn,
    ) -> Self {
        Self {
            context,
            register_factory,
            remove_factory,
            main_thread_id: std::thread::current().id(),
        }
    }

    /// Get native context pointer
    pub fn context_ptr(&self) -> *mut NativeContext {
        self.context.as_ptr()
    }

    /// Publish a factory mapping to the native registry
    ///
    /// Strings containing interior NUL bytes cannot cross the boundary and are
    /// logged and skipped. The bridge rejects such names before committing.
    pub fn register_factory(&self, type_name: &str, base_type_hash: u32, category: &str) {
        let (Ok(name), Ok(category)) = (CString::new(type_name), CString::new(category)) else {
            tracing::error!("Cannot register factory {:?}: interior NUL byte", type_name);
            return;
        };

        // SAFETY: function pointer and context were validated by the loader,
        // strings outlive the call.
        unsafe {
            (self.register_factory)(
                self.context_ptr(),
                name.as_ptr(),
                base_type_hash,
                category.as_ptr(),
            );
        }
    }

    /// Withdraw a factory mapping from the native registry
    pub fn remove_factory(&self, type_name: &str) {
        let Ok(name) = CString::new(type_name) else {
            tracing::error!("Cannot remove factory {:?}: interior NUL byte", type_name);
            return;
        };

        // SAFETY: see register_factory
        unsafe {
            (self.remove_factory)(self.context_ptr(), name.as_ptr());
        }
    }
}
