//! Derive macro for error types.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations.
//! Replacement for `thiserror` crate.
//!
//! # Usage
//!
//! ```ignore
//! use graphene_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum CodecError {
//!     #[error("invalid object id: {0}")]
//!     InvalidObjectId(String),
//!
//!     #[error("object type mismatch: expected {expected}, got {got}")]
//!     TypeMismatch { expected: u8, got: u8 },
//!
//!     #[error(transparent)]
//!     Decode(DecodeError),
//! }
//! ```
//!
//! # Supported Features
//!
//! - Unit variants: `#[error("message")]`
//! - Tuple variants with positional args: `#[error("error: {0}")]`
//! - Struct variants with named args: `#[error("expected {expected}")]`
//! - Single-field tuple variants marked `#[error(transparent)]`, which forward
//!   `Display` to the wrapped error and report it as `source()`

use proc_macro::TokenStream;
use quote::{ToTokens, quote};
use syn::{Data, DeriveInput, Fields, Lit, Meta, parse_macro_input};

/// Message attached to a variant or struct.
enum ErrorMessage {
    Format(String),
    Transparent,
}

/// Derives `Display` and `Error` for an enum or struct.
pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_error_derive(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_error_derive(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    match &input.data {
        Data::Enum(data_enum) => {
            let mut display_arms = Vec::with_capacity(data_enum.variants.len());
            let mut source_arms = Vec::new();

            for variant in &data_enum.variants {
                let variant_name = &variant.ident;
                let message = extract_error_message(
                    &variant.attrs,
                    &variant.ident,
                    &format!("variant `{}`", variant.ident),
                )?;

                let arm = match (&variant.fields, message) {
                    (Fields::Unnamed(fields), ErrorMessage::Transparent) => {
                        if fields.unnamed.len() != 1 {
                            return Err(syn::Error::new_spanned(
                                variant,
                                "#[error(transparent)] requires exactly one field",
                            ));
                        }
                        source_arms.push(quote! {
                            Self::#variant_name(inner) => Some(inner),
                        });
                        quote! {
                            Self::#variant_name(inner) => ::std::fmt::Display::fmt(inner, f),
                        }
                    }
                    (_, ErrorMessage::Transparent) => {
                        return Err(syn::Error::new_spanned(
                            variant,
                            "#[error(transparent)] is only supported on tuple variants",
                        ));
                    }
                    (Fields::Unit, ErrorMessage::Format(msg)) => quote! {
                        Self::#variant_name => write!(f, #msg),
                    },
                    (Fields::Unnamed(fields), ErrorMessage::Format(msg)) => {
                        let field_names: Vec<_> = (0..fields.unnamed.len())
                            .map(|i| quote::format_ident!("f{}", i))
                            .collect();
                        let format_str = convert_positional_to_named(&msg, fields.unnamed.len());
                        quote! {
                            #[allow(unused_variables)]
                            Self::#variant_name(#(#field_names),*) => write!(f, #format_str),
                        }
                    }
                    (Fields::Named(fields), ErrorMessage::Format(msg)) => {
                        let field_names: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
                        quote! {
                            #[allow(unused_variables)]
                            Self::#variant_name { #(#field_names),* } => write!(f, #msg),
                        }
                    }
                };
                display_arms.push(arm);
            }

            let source_fn = if source_arms.is_empty() {
                quote! {}
            } else {
                quote! {
                    fn source(&self) -> ::std::option::Option<&(dyn ::std::error::Error + 'static)> {
                        match self {
                            #(#source_arms)*
                            #[allow(unreachable_patterns)]
                            _ => None,
                        }
                    }
                }
            };

            Ok(quote! {
                impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
                    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                        match self {
                            #(#display_arms)*
                        }
                    }
                }

                impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {
                    #source_fn
                }
            })
        }
        Data::Struct(data_struct) => {
            let msg = match extract_error_message(
                &input.attrs,
                &input.ident,
                &format!("type `{}`", input.ident),
            )? {
                ErrorMessage::Format(msg) => msg,
                ErrorMessage::Transparent => {
                    return Err(syn::Error::new_spanned(
                        input,
                        "#[error(transparent)] is only supported on enum variants",
                    ));
                }
            };

            let display_body = match &data_struct.fields {
                Fields::Unit => quote! { write!(f, #msg) },
                Fields::Named(fields) => {
                    let field_names: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
                    quote! {
                        let Self { #(#field_names),* } = self;
                        write!(f, #msg)
                    }
                }
                Fields::Unnamed(fields) => {
                    let field_idents: Vec<_> = (0..fields.unnamed.len())
                        .map(|i| quote::format_ident!("f{}", i))
                        .collect();
                    let format_str = convert_positional_to_named(&msg, fields.unnamed.len());
                    quote! {
                        let Self(#(#field_idents),*) = self;
                        write!(f, #format_str)
                    }
                }
            };

            Ok(quote! {
                impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
                    #[allow(unused_variables)]
                    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                        #display_body
                    }
                }

                impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
            })
        }
        Data::Union(_) => Err(syn::Error::new_spanned(
            input,
            "Error derive does not support unions",
        )),
    }
}

/// Reads the `#[error(...)]` attribute: a string literal or `transparent`.
fn extract_error_message<T: ToTokens>(
    attrs: &[syn::Attribute],
    target: &T,
    target_desc: &str,
) -> syn::Result<ErrorMessage> {
    for attr in attrs {
        if !attr.path().is_ident("error") {
            continue;
        }
        let Meta::List(meta_list) = &attr.meta else {
            return Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute; use #[error(\"message\")] or #[error(transparent)]",
            ));
        };

        if let Ok(ident) = syn::parse2::<syn::Ident>(meta_list.tokens.clone()) {
            if ident == "transparent" {
                return Ok(ErrorMessage::Transparent);
            }
        }

        return match syn::parse2::<Lit>(meta_list.tokens.clone()) {
            Ok(Lit::Str(lit_str)) => Ok(ErrorMessage::Format(lit_str.value())),
            _ => Err(syn::Error::new_spanned(
                &attr.meta,
                "#[error] expects a string literal like #[error(\"invalid vote id: {0}\")]",
            )),
        };
    }

    Err(syn::Error::new_spanned(
        target,
        format!(
            "missing #[error(\"...\")] attribute on {}; every error variant must declare a display message",
            target_desc
        ),
    ))
}

/// Converts positional format args `{0}`, `{1:?}` to named args `{f0}`, `{f1:?}`.
fn convert_positional_to_named(format_str: &str, field_count: usize) -> String {
    let mut result = format_str.to_string();
    for i in (0..field_count).rev() {
        result = result
            .replace(&format!("{{{}}}", i), &format!("{{f{}}}", i))
            .replace(&format!("{{{}:", i), &format!("{{f{}:", i));
    }
    result
}
