//! ObjectFactory derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::parse::{parse_object_factory, ObjectFactoryArgs};

/// Generate the ObjectFactory implementation
pub fn derive_object_factory(input: DeriveInput) -> TokenStream {
    match parse_object_factory(&input) {
        Ok(args) => generate_impl(&args),
        Err(e) => e.write_errors(),
    }
}

fn generate_impl(args: &ObjectFactoryArgs) -> TokenStream {
    let ident = &args.ident;
    let declared_name = ident.to_string();
    let category = &args.category;

    let base = match &args.base {
        Some(path) => quote! { #path },
        None => quote! { ::objbridge_core::Component },
    };

    let flags = match (args.boundary, args.serializable) {
        (false, false) => quote! { ::objbridge_core::TypeFlags::empty() },
        (true, false) => quote! { ::objbridge_core::TypeFlags::BOUNDARY },
        (false, true) => quote! { ::objbridge_core::TypeFlags::SERIALIZABLE },
        (true, true) => quote! {
            ::objbridge_core::TypeFlags::BOUNDARY
                .union(::objbridge_core::TypeFlags::SERIALIZABLE)
        },
    };

    let (static_name_fn, with_static_name) = match &args.name {
        Some(name) => (
            quote! {
                fn static_name() -> &'static str {
                    #name
                }
            },
            quote! { .with_static_name(static_name) },
        ),
        None => (quote! {}, quote! {}),
    };

    let with_constructor = if args.no_factory {
        quote! {}
    } else {
        quote! { .with_constructor(::objbridge_core::construct::<#ident>) }
    };

    let static_type_impl = quote! {
        impl ::objbridge_core::StaticType for #ident {
            fn type_info() -> &'static ::objbridge_core::TypeInfo {
                #static_name_fn

                static INFO: ::objbridge_core::TypeInfo = ::objbridge_core::TypeInfo::new(#declared_name)
                    .with_base(<#base as ::objbridge_core::StaticType>::type_info)
                    .with_flags(#flags)
                    #with_static_name
                    #with_constructor;

                &INFO
            }
        }
    };

    // Creatable types forward their attribute hook; abstract types keep the default
    let register_attributes = if args.no_factory {
        quote! {}
    } else {
        quote! {
            fn register_attributes(
                &self,
                attributes: &mut ::objbridge_core::AttributeRegistrar,
            ) -> ::std::result::Result<(), ::objbridge_core::AttributeError> {
                <Self as ::objbridge_core::Creatable>::register_attributes(self, attributes)
            }
        }
    };

    let object_impl = quote! {
        impl ::objbridge_core::Object for #ident {
            fn object_type(&self) -> &'static ::objbridge_core::TypeInfo {
                <Self as ::objbridge_core::StaticType>::type_info()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            #register_attributes
        }
    };

    let factory_decl = if args.no_factory {
        quote! {}
    } else {
        quote! {
            impl #ident {
                /// Factory declaration for module descriptors
                pub const FACTORY: ::objbridge_core::FactoryDeclaration =
                    ::objbridge_core::FactoryDeclaration::new(
                        <Self as ::objbridge_core::StaticType>::type_info,
                        #category,
                    );
            }
        }
    };

    quote! {
        #static_type_impl
        #object_impl
        #factory_decl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand(input: DeriveInput) -> String {
        derive_object_factory(input).to_string().replace(' ', "")
    }

    #[test]
    fn test_default_base_and_constructor() {
        let out = expand(parse_quote! {
            #[object(category = "Gameplay")]
            pub struct Foo;
        });

        assert!(out.contains("impl::objbridge_core::StaticTypeforFoo"));
        assert!(out.contains("<::objbridge_core::Componentas::objbridge_core::StaticType>"));
        assert!(out.contains("construct::<Foo>"));
        assert!(out.contains("\"Gameplay\""));
        assert!(out.contains("FACTORY"));
    }

    #[test]
    fn test_static_name() {
        let out = expand(parse_quote! {
            #[object(name = "CustomName")]
            pub struct Renamed;
        });

        assert!(out.contains("\"CustomName\""));
        assert!(out.contains("with_static_name"));
    }

    #[test]
    fn test_no_factory() {
        let out = expand(parse_quote! {
            #[object(base = "objbridge_core::BaseObject", boundary, no_factory)]
            pub struct Actor;
        });

        assert!(!out.contains("with_constructor"));
        assert!(!out.contains("FACTORY"));
        assert!(out.contains("BOUNDARY"));
    }

    #[test]
    fn test_generic_type_is_an_error() {
        let out = expand(parse_quote! {
            pub struct Holder<T>(T);
        });
        assert!(out.contains("compile_error"));
    }
}
