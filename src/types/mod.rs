//! Graphene wire codecs.
//!
//! - `varint`, `encoding`, `primitives`: scalar layouts
//! - `composite`: arrays, optionals, static variants and maps
//! - `ids`: object and vote identifiers
//! - `value`: the closed set of encodable values
//! - `buffer`, `hash`: signing payload assembly and digests

pub mod buffer;
pub mod composite;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod ids;
pub mod primitives;
pub mod value;
pub mod varint;
