//! Derive macro for Graphene wire serialization.
//!
//! Generates `Encode` and `Decode` implementations for structs and enums.
//!
//! # Supported Types
//!
//! - **Named structs**: `struct Memo { from: PublicKey, nonce: u64 }`
//! - **Tuple structs**: `struct Amount(i64, Id)`
//! - **Unit structs**: `struct Marker`
//! - **Enums**: encoded as a static variant
//!
//! Unions are not supported.
//!
//! # Binary Format
//!
//! Fields are serialized in declaration order with no framing of their own;
//! each field type decides its own layout (varint length prefixes for
//! sequences, fixed-width little-endian integers, ...).
//!
//! Enums follow the static variant layout: `varint(tag) || fields`, where the
//! tag is the variant's discriminant (explicit `Variant = 5` values are
//! honoured, otherwise the previous tag plus one).
//!
//! A field annotated with `#[binary_codec(skip)]` is not written, and is
//! rebuilt with `Default::default()` on decode.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DataEnum, DeriveInput, Field, Fields, parse_macro_input};

/// Derives `Encode` and `Decode` for a type.
///
/// # Example
///
/// ```ignore
/// use graphene_derive::BinaryCodec;
///
/// #[derive(BinaryCodec)]
/// pub struct Transfer {
///     pub from: ObjectId,
///     pub to: ObjectId,
///     pub amount: i64,
/// }
/// ```
pub fn derive_binary_codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    if let Err(err) = check_attributes(&input.data) {
        return TokenStream::from(err.to_compile_error());
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = match &input.data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields) => {
                let names: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
                let encode_fields = fields.named.iter().filter(|f| !is_skipped(f)).map(|f| {
                    let ident = &f.ident;
                    quote! { crate::types::encoding::Encode::encode(&self.#ident, out); }
                });
                let decode_fields = fields.named.iter().zip(names.iter()).map(|(f, ident)| {
                    if is_skipped(f) {
                        quote! { #ident: ::std::default::Default::default(), }
                    } else {
                        quote! { #ident: crate::types::encoding::Decode::decode(input)?, }
                    }
                });

                let body = quote! { Ok(Self { #(#decode_fields)* }) };
                codec_impl(name, &impl_generics, &ty_generics, where_clause, quote! { #(#encode_fields)* }, body)
            }
            Fields::Unnamed(fields) => {
                let encode_fields = fields
                    .unnamed
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| !is_skipped(f))
                    .map(|(i, _)| {
                        let idx = syn::Index::from(i);
                        quote! { crate::types::encoding::Encode::encode(&self.#idx, out); }
                    });
                let decode_fields = fields.unnamed.iter().map(|f| {
                    if is_skipped(f) {
                        quote! { ::std::default::Default::default(), }
                    } else {
                        quote! { crate::types::encoding::Decode::decode(input)?, }
                    }
                });

                let body = quote! { Ok(Self( #(#decode_fields)* )) };
                codec_impl(name, &impl_generics, &ty_generics, where_clause, quote! { #(#encode_fields)* }, body)
            }
            Fields::Unit => codec_impl(
                name,
                &impl_generics,
                &ty_generics,
                where_clause,
                quote! { let _ = out; },
                quote! { let _ = input; Ok(Self) },
            ),
        },
        Data::Enum(data_enum) => {
            generate_enum_impl(name, &impl_generics, &ty_generics, where_clause, data_enum)
        }
        Data::Union(_) => {
            syn::Error::new_spanned(&input, "BinaryCodec derive does not support unions")
                .to_compile_error()
        }
    };

    TokenStream::from(expanded)
}

/// Wraps encode statements and a decode body into the two trait impls.
fn codec_impl(
    name: &syn::Ident,
    impl_generics: &syn::ImplGenerics,
    ty_generics: &syn::TypeGenerics,
    where_clause: Option<&syn::WhereClause>,
    encode_body: proc_macro2::TokenStream,
    decode_body: proc_macro2::TokenStream,
) -> proc_macro2::TokenStream {
    quote! {
        impl #impl_generics crate::types::encoding::Encode for #name #ty_generics #where_clause {
            fn encode<S: crate::types::encoding::EncodeSink>(&self, out: &mut S) {
                #encode_body
            }
        }

        impl #impl_generics crate::types::encoding::Decode for #name #ty_generics #where_clause {
            fn decode(input: &mut &[u8]) -> ::std::result::Result<Self, crate::types::encoding::DecodeError> {
                #decode_body
            }
        }
    }
}

/// Rejects `#[binary_codec(...)]` keys other than `skip`.
fn check_attributes(data: &Data) -> syn::Result<()> {
    let fields: Vec<&Field> = match data {
        Data::Struct(data_struct) => data_struct.fields.iter().collect(),
        Data::Enum(data_enum) => data_enum.variants.iter().flat_map(|v| v.fields.iter()).collect(),
        Data::Union(_) => Vec::new(),
    };

    for field in fields {
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("binary_codec")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    Ok(())
                } else {
                    Err(meta.error("unknown binary_codec attribute, expected `skip`"))
                }
            })?;
        }
    }
    Ok(())
}

/// Returns true if the field carries `#[binary_codec(skip)]`.
///
/// Attributes are validated by [`check_attributes`] before this runs.
fn is_skipped(field: &Field) -> bool {
    field.attrs.iter().any(|attr| {
        if !attr.path().is_ident("binary_codec") {
            return false;
        }
        let mut skip = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
            }
            Ok(())
        });
        skip
    })
}

/// Generates `Encode` and `Decode` for enums using the static variant layout.
fn generate_enum_impl(
    name: &syn::Ident,
    impl_generics: &syn::ImplGenerics,
    ty_generics: &syn::TypeGenerics,
    where_clause: Option<&syn::WhereClause>,
    data_enum: &DataEnum,
) -> proc_macro2::TokenStream {
    let discriminants = match compute_discriminants(data_enum) {
        Ok(d) => d,
        Err(err) => return err.to_compile_error(),
    };

    let encode_arms = data_enum.variants.iter().zip(discriminants.iter()).map(|(variant, &tag)| {
        let variant_name = &variant.ident;
        let write_tag = quote! { crate::types::varint::encode_varint(#tag, out); };

        match &variant.fields {
            Fields::Unit => quote! {
                Self::#variant_name => { #write_tag }
            },
            Fields::Unnamed(fields) => {
                let bindings: Vec<_> = (0..fields.unnamed.len())
                    .map(|i| quote::format_ident!("f{}", i))
                    .collect();
                let encode_fields = fields.unnamed.iter().zip(bindings.iter()).filter(|(f, _)| !is_skipped(f)).map(|(_, b)| {
                    quote! { crate::types::encoding::Encode::encode(#b, out); }
                });
                quote! {
                    Self::#variant_name(#(#bindings),*) => {
                        #write_tag
                        #(#encode_fields)*
                    }
                }
            }
            Fields::Named(fields) => {
                let bindings: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
                let encode_fields = fields.named.iter().filter(|f| !is_skipped(f)).map(|f| {
                    let ident = &f.ident;
                    quote! { crate::types::encoding::Encode::encode(#ident, out); }
                });
                quote! {
                    Self::#variant_name { #(#bindings),* } => {
                        #write_tag
                        #(#encode_fields)*
                    }
                }
            }
        }
    });

    let decode_arms = data_enum.variants.iter().zip(discriminants.iter()).map(|(variant, &tag)| {
        let variant_name = &variant.ident;

        match &variant.fields {
            Fields::Unit => quote! {
                #tag => Ok(Self::#variant_name),
            },
            Fields::Unnamed(fields) => {
                let decode_fields = fields.unnamed.iter().map(|f| {
                    if is_skipped(f) {
                        quote! { ::std::default::Default::default(), }
                    } else {
                        quote! { crate::types::encoding::Decode::decode(input)?, }
                    }
                });
                quote! {
                    #tag => Ok(Self::#variant_name(#(#decode_fields)*)),
                }
            }
            Fields::Named(fields) => {
                let decode_fields = fields.named.iter().map(|f| {
                    let ident = &f.ident;
                    if is_skipped(f) {
                        quote! { #ident: ::std::default::Default::default(), }
                    } else {
                        quote! { #ident: crate::types::encoding::Decode::decode(input)?, }
                    }
                });
                quote! {
                    #tag => Ok(Self::#variant_name { #(#decode_fields)* }),
                }
            }
        }
    });

    quote! {
        impl #impl_generics crate::types::encoding::Encode for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn encode<S: crate::types::encoding::EncodeSink>(&self, out: &mut S) {
                match self {
                    #(#encode_arms)*
                }
            }
        }

        impl #impl_generics crate::types::encoding::Decode for #name #ty_generics #where_clause {
            fn decode(input: &mut &[u8]) -> ::std::result::Result<Self, crate::types::encoding::DecodeError> {
                let tag = crate::types::varint::decode_varint_from(input)?;
                match tag {
                    #(#decode_arms)*
                    _ => Err(crate::types::encoding::DecodeError::InvalidValue),
                }
            }
        }
    }
}

/// Computes the tag of every variant.
///
/// Explicit discriminants are used as-is; otherwise the tag is the previous
/// one plus one, starting from 0.
fn compute_discriminants(data_enum: &DataEnum) -> syn::Result<Vec<u64>> {
    let mut discriminants = Vec::with_capacity(data_enum.variants.len());
    let mut next: u64 = 0;

    for variant in &data_enum.variants {
        let tag = match &variant.discriminant {
            Some((_, expr)) => parse_discriminant_expr(expr)?,
            None => next,
        };
        discriminants.push(tag);
        next = tag.checked_add(1).ok_or_else(|| {
            syn::Error::new_spanned(&variant.ident, "variant tag overflows u64")
        })?;
    }

    Ok(discriminants)
}

/// Parses an integer literal discriminant.
fn parse_discriminant_expr(expr: &syn::Expr) -> syn::Result<u64> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(lit_int),
            ..
        }) => lit_int.base10_parse::<u64>(),
        _ => Err(syn::Error::new_spanned(
            expr,
            "variant tag must be a plain integer literal",
        )),
    }
}
