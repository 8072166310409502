//! objbridge Engine - Native Function Table Loading and Global Storage
//!
//! This crate handles:
//! - Validating the function table the native engine hands over at load time
//! - Storing it in a thread-safe global slot until the bridge unloads
//! - Recording the main engine thread for runtime checks
//!
//! # Architecture
//!
//! The table is validated once during load via [`loader::load_api`] and
//! stored in [`globals::EngineGlobals`]. Access is provided via
//! [`try_engine()`].
//!
//! # Thread Safety
//!
//! The native context and function pointers are valid for the lifetime of the
//! loaded bridge. The main thread ID is stored for runtime checks via
//! [`is_main_thread()`].

pub mod error;
pub mod globals;
pub mod loader;

pub use error::ApiError;
pub use globals::{
    init_engine, is_engine_initialized, is_main_thread, shutdown_engine, try_engine, EngineGlobals,
};
pub use loader::load_api;
