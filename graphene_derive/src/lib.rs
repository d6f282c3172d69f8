//! Derive macros for the graphene-core crate.
//!
//! Provides:
//! - `#[derive(BinaryCodec)]` - Graphene wire serialization (`Encode` + `Decode`)
//! - `#[derive(Error)]` - error type boilerplate (thiserror replacement)

mod binary_codec;
mod error;

use proc_macro::TokenStream;

/// Implements `Encode` and `Decode` using the Graphene wire layout.
///
/// Fields marked `#[binary_codec(skip)]` are left off the wire and decoded
/// as `Default::default()`.
#[proc_macro_derive(BinaryCodec, attributes(binary_codec))]
pub fn derive_binary_codec(input: TokenStream) -> TokenStream {
    binary_codec::derive_binary_codec(input)
}

/// Automatically implements `Display` and `Error` traits for error types.
#[proc_macro_derive(Error, attributes(error))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
