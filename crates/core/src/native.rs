//! Native registry sink
//!
//! Every factory the bridge commits is published to the engine's own object
//! registry so native code can instantiate it by name. The [`NativeRegistry`]
//! trait is that seam: [`EngineRegistry`] forwards to the function table the
//! engine handed over at load time, [`NullRegistry`] discards everything.

use crate::hash::TypeHash;

/// Receiver of factory registrations on the native side
pub trait NativeRegistry: Send + Sync {
    /// Publish `type_name` as a factory whose native wrapper class is
    /// identified by `base_type_hash`
    fn register_factory(&self, type_name: &str, base_type_hash: TypeHash, category: &str);

    /// Withdraw a factory published under `type_name`
    fn remove_factory(&self, type_name: &str);
}

/// Forwards to the native function table stored in the engine globals
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineRegistry;

impl NativeRegistry for EngineRegistry {
    fn register_factory(&self, type_name: &str, base_type_hash: TypeHash, category: &str) {
        match objbridge_engine::try_engine() {
            Some(engine) => engine.register_factory(type_name, base_type_hash.value(), category),
            None => tracing::warn!(
                "Native API not loaded, factory {} not published",
                type_name
            ),
        }
    }

    fn remove_factory(&self, type_name: &str) {
        match objbridge_engine::try_engine() {
            Some(engine) => engine.remove_factory(type_name),
            None => tracing::warn!("Native API not loaded, factory {} not withdrawn", type_name),
        }
    }
}

/// Discards all registrations
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRegistry;

impl NativeRegistry for NullRegistry {
    fn register_factory(&self, _type_name: &str, _base_type_hash: TypeHash, _category: &str) {}

    fn remove_factory(&self, _type_name: &str) {}
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    /// Call observed by [`RecordingRegistry`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum NativeCall {
        Register {
            type_name: String,
            base_type_hash: TypeHash,
            category: String,
        },
        Remove {
            type_name: String,
        },
    }

    /// Records every call for assertions; clones share the log
    #[derive(Debug, Default, Clone)]
    pub struct RecordingRegistry {
        calls: Arc<Mutex<Vec<NativeCall>>>,
    }

    impl RecordingRegistry {
        pub fn calls(&self) -> Vec<NativeCall> {
            self.calls.lock().clone()
        }
    }

    impl NativeRegistry for RecordingRegistry {
        fn register_factory(&self, type_name: &str, base_type_hash: TypeHash, category: &str) {
            self.calls.lock().push(NativeCall::Register {
                type_name: type_name.to_string(),
                base_type_hash,
                category: category.to_string(),
            });
        }

        fn remove_factory(&self, type_name: &str) {
            self.calls.lock().push(NativeCall::Remove {
                type_name: type_name.to_string(),
            });
        }
    }
}
