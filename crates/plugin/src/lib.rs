//! objbridge Plugin - FFI Layer
//!
//! This crate provides the FFI boundary between the native engine and the
//! Rust object factory bridge. It compiles to a cdylib (.so/.dll); the
//! rlib output lets host crates link their modules into the same library.
//!
//! # Lifecycle
//!
//! ```text
//! objbridge_load                  validate function table, create Context
//! objbridge_on_engine_initialized startup factory scan
//! objbridge_create_object         native side instantiates by type hash
//! objbridge_update                run main thread tasks, once per frame
//! objbridge_unload                drop Context and every live object
//! ```

pub mod ffi;

use std::sync::Arc;

use objbridge_core::{Context, ModuleDescriptor};

/// The loaded bridge context, if any
pub fn context() -> Option<Arc<Context>> {
    Context::instance()
}

/// Add a module to the loaded bridge
///
/// Modules loaded before `objbridge_on_engine_initialized` are picked up by
/// the startup scan. Returns `false` if the bridge is not loaded or the
/// module already is.
pub fn load_module(module: &'static ModuleDescriptor) -> bool {
    match context() {
        Some(context) => context.load_module(module),
        None => {
            tracing::warn!("Bridge not loaded, module {} ignored", module.name());
            false
        }
    }
}
