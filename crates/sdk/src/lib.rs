//! objbridge SDK - Native Boundary Type Definitions
//!
//! This crate contains the `#[repr(C)]` types shared between the native engine
//! and the Rust side of the object factory bridge. It has no dependencies and
//! compiles quickly, allowing parallel compilation of dependent crates.
//!
//! # Modules
//!
//! - [`interfaces`] - Opaque native types and the native function table
//! - [`versions`] - ABI version constants checked at load time

pub mod interfaces;
pub mod versions;

pub use interfaces::*;
pub use versions::{API_VERSION, DIRECTOR_PREFIX};
