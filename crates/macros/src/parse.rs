//! Attribute parsing for the ObjectFactory derive macro

use darling::FromDeriveInput;
use syn::{DeriveInput, Generics, Ident, Path};

/// Parsed #[object(...)] attributes on the type
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(object), supports(struct_any, enum_any))]
pub struct ObjectFactoryArgs {
    /// Type identifier
    pub ident: Ident,

    pub generics: Generics,

    /// Base type path (defaults to `objbridge_core::Component`)
    #[darling(default)]
    pub base: Option<Path>,

    /// Static name overriding the declared name
    #[darling(default)]
    pub name: Option<String>,

    /// Editor category published with the factory
    #[darling(default)]
    pub category: String,

    /// The native registry has a wrapper class for this type
    #[darling(default)]
    pub boundary: bool,

    /// The type exposes serializable attributes
    #[darling(default)]
    pub serializable: bool,

    /// Abstract type: no constructor and no `FACTORY` declaration
    #[darling(default)]
    pub no_factory: bool,
}

/// Parse a DeriveInput into ObjectFactoryArgs
pub fn parse_object_factory(input: &DeriveInput) -> darling::Result<ObjectFactoryArgs> {
    let args = ObjectFactoryArgs::from_derive_input(input)?;

    if !args.generics.params.is_empty() {
        return Err(darling::Error::custom(
            "ObjectFactory cannot be derived for generic types",
        )
        .with_span(&args.generics));
    }
    if matches!(&args.name, Some(name) if name.is_empty()) {
        return Err(darling::Error::custom("object name must not be empty"));
    }

    Ok(args)
}
