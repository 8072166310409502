//! objbridge core - cross-boundary object factory bridge
//!
//! This crate maps Rust object types to the native engine's object factory
//! system: types are described by static descriptors, registered by a
//! 32-bit name hash, instantiated on request from either side of the
//! boundary and tracked through arena handles until the native side
//! releases them.
//!
//! # Re-exports
//!
//! This crate re-exports the SDK and engine crates for convenience:
//! - [`sdk`] - `#[repr(C)]` boundary types and version constants
//! - [`engine`] - native function table loading and globals
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use objbridge_core::{
//!     Component, ConstructionError, Context, Creatable, ModuleDescriptor, ObjectFactory,
//! };
//!
//! #[derive(ObjectFactory)]
//! #[object(base = "Component", category = "Gameplay")]
//! pub struct Rotator {
//!     speed: f32,
//! }
//!
//! impl Creatable for Rotator {
//!     fn create(_context: &Arc<Context>) -> Result<Self, ConstructionError> {
//!         Ok(Rotator { speed: 90.0 })
//!     }
//! }
//!
//! pub static GAMEPLAY: ModuleDescriptor =
//!     ModuleDescriptor::new("gameplay", &[Rotator::FACTORY]);
//! ```

// Allow the crate to refer to itself as `objbridge_core` for proc macro compatibility
extern crate self as objbridge_core;

// Re-export SDK and engine crates
pub use objbridge_engine as engine;
pub use objbridge_sdk as sdk;

pub mod attributes;
pub mod bridge;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod handles;
pub mod hash;
pub mod module;
pub mod native;
pub mod registry;
pub mod tasks;
pub mod types;

pub use attributes::{AttributeError, AttributeInfo, AttributeRegistrar};
pub use bridge::{director_type_hash, ReplacedFactory, ScanFailure, ScanReport};
pub use config::{ConfigError, ConfigResult, CoreConfig};
pub use context::{BridgeState, Context, Subsystem};
pub use dispatch::{pending_op, Completion, MainThreadOp};
pub use error::BridgeError;
pub use events::{EventArgs, EventBus, ListenerKey, ENGINE_INITIALIZED};
pub use handles::{Handle, HandleError, NativePtr, ObjectHandle};
pub use hash::TypeHash;
pub use module::{ExclusionPolicy, FactoryDeclaration, ModuleDescriptor};
pub use native::{EngineRegistry, NativeRegistry, NullRegistry};
pub use registry::{FactoryRegistry, TypeRegistration};
pub use tasks::{TaskQueueError, WorkQueue};
pub use types::{
    construct, BaseObject, Component, ConstructionError, Constructor, Creatable, Object,
    Serializable, StaticType, TypeFlags, TypeInfo,
};

// Re-export macros
pub use objbridge_macros::ObjectFactory;
