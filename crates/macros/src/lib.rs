//! objbridge Proc Macros
//!
//! This crate provides the derive macro for bridged object types:
//!
//! - `#[derive(ObjectFactory)]` - Generate the static type descriptor, the
//!   `Object` implementation and a factory declaration
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use objbridge_core::{Context, ConstructionError, Creatable, ObjectFactory};
//!
//! #[derive(ObjectFactory)]
//! #[object(category = "Gameplay")]
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
//! // Generated:
//! // - impl StaticType for Rotator
//! // - impl Object for Rotator
//! // - Rotator::FACTORY, for use in a ModuleDescriptor
//! ```
//!
//! # Attributes
//!
//! - `#[object(base = "path::To::Base")]` - Base type (default: `Component`).
//! - `#[object(name = "Name")]` - Static name used for the type identifier.
//! - `#[object(category = "Category")]` - Editor category of the factory.
//! - `#[object(boundary)]` - The native registry has a wrapper class for it.
//! - `#[object(serializable)]` - The type exposes serializable attributes.
//! - `#[object(no_factory)]` - Abstract type: no constructor, no `FACTORY`.

mod object_factory;
mod parse;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive macro for bridged object types
///
/// Non-abstract types must implement `Creatable`; the generated
/// constructor and attribute hook forward to it.
#[proc_macro_derive(ObjectFactory, attributes(object))]
pub fn derive_object_factory(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    object_factory::derive_object_factory(input).into()
}
