//! Container codecs: ordered sequences, optional values, static variants
//! and ordered maps.

use crate::types::encoding::{Decode, DecodeError, Describe, Encode, EncodeSink, read_length};
use crate::types::error::CodecError;
use crate::types::varint::{decode_varint_from, encode_varint};
use serde_json::Value as JsonValue;
use std::fmt;

/// Ordered sequence: `varint(count) || elements`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Array<T>(pub Vec<T>);

/// Sets share the array layout; uniqueness and ordering are the caller's job.
pub type Set<T> = Array<T>;

impl<T> Array<T> {
    pub fn new(items: Vec<T>) -> Self {
        Array(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T> From<Vec<T>> for Array<T> {
    fn from(items: Vec<T>) -> Self {
        Array(items)
    }
}

impl<T> FromIterator<T> for Array<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Array(iter.into_iter().collect())
    }
}

impl<T: Encode> Encode for Array<T> {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.0.encode(out);
    }
}

impl<T: Decode> Decode for Array<T> {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        Vec::<T>::decode(input).map(Array)
    }
}

impl<T: Describe> Describe for Array<T> {
    fn describe(&self) -> JsonValue {
        JsonValue::Array(self.0.iter().map(Describe::describe).collect())
    }
}

impl<T: Describe> fmt::Display for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe_text())
    }
}

/// Optional value.
///
/// Encodes as `0x00` when absent and `0x01 || value` when present, except that
/// a present value whose own encoding is empty collapses to `0x00` as well.
/// Nodes treat such a field as unset, so this keeps digests in agreement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Optional<T>(pub Option<T>);

impl<T> Optional<T> {
    pub fn some(value: T) -> Self {
        Optional(Some(value))
    }

    pub fn none() -> Self {
        Optional(None)
    }

    pub fn as_option(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl<T: Encode> Optional<T> {
    /// True if the value is absent or encodes to zero bytes.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            None => true,
            Some(value) => value.encoded_len() == 0,
        }
    }
}

impl<T> From<Option<T>> for Optional<T> {
    fn from(value: Option<T>) -> Self {
        Optional(value)
    }
}

impl<T: Encode> Encode for Optional<T> {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        match &self.0 {
            Some(value) if value.encoded_len() > 0 => {
                true.encode(out);
                value.encode(out);
            }
            _ => false.encode(out),
        }
    }
}

impl<T: Decode> Decode for Optional<T> {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        if bool::decode(input)? {
            Ok(Optional(Some(T::decode(input)?)))
        } else {
            Ok(Optional(None))
        }
    }
}

impl<T: Describe> Describe for Optional<T> {
    fn describe(&self) -> JsonValue {
        match &self.0 {
            Some(value) => value.describe(),
            None => JsonValue::Null,
        }
    }
}

/// Tagged union member: `varint(type_id) || payload`.
///
/// `type_id` is the position of the payload's type in the union declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StaticVariant<T> {
    pub type_id: u64,
    pub payload: T,
}

impl<T> StaticVariant<T> {
    pub fn new(type_id: u64, payload: T) -> Self {
        Self { type_id, payload }
    }
}

impl<T: Decode> StaticVariant<T> {
    /// Decodes a variant whose tag must equal `expected`.
    pub fn decode_expecting(input: &mut &[u8], expected: u64) -> Result<Self, DecodeError> {
        let type_id = decode_varint_from(input)?;
        if type_id != expected {
            return Err(DecodeError::UnexpectedVariant {
                expected,
                got: type_id,
            });
        }
        Ok(Self {
            type_id,
            payload: T::decode(input)?,
        })
    }
}

impl<T: Encode> Encode for StaticVariant<T> {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        encode_varint(self.type_id, out);
        self.payload.encode(out);
    }
}

impl<T: Decode> Decode for StaticVariant<T> {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let type_id = decode_varint_from(input)?;
        Ok(Self {
            type_id,
            payload: T::decode(input)?,
        })
    }
}

impl<T: Describe> Describe for StaticVariant<T> {
    fn describe(&self) -> JsonValue {
        JsonValue::Array(vec![JsonValue::from(self.type_id), self.payload.describe()])
    }
}

/// Ordered key-value sequence: `varint(count) || (key || value)*`.
///
/// Pairs are written in the order given; no sorting or deduplication happens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Map<K, V>(pub Vec<(K, V)>);

impl<K, V> Map<K, V> {
    pub fn new(pairs: Vec<(K, V)>) -> Self {
        Map(pairs)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> From<Vec<(K, V)>> for Map<K, V> {
    fn from(pairs: Vec<(K, V)>) -> Self {
        Map(pairs)
    }
}

impl<K: Encode, V: Encode> Encode for Map<K, V> {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        encode_varint(self.0.len() as u64, out);
        for (key, value) in &self.0 {
            key.encode(out);
            value.encode(out);
        }
    }
}

impl<K: Decode, V: Decode> Decode for Map<K, V> {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let len = read_length(input)?;
        let mut pairs = Vec::with_capacity(len.min(input.len()));
        for _ in 0..len {
            pairs.push((K::decode(input)?, V::decode(input)?));
        }
        Ok(Map(pairs))
    }
}

impl<K: Describe, V: Describe> Describe for Map<K, V> {
    fn describe(&self) -> JsonValue {
        JsonValue::Array(
            self.0
                .iter()
                .map(|(k, v)| JsonValue::Array(vec![k.describe(), v.describe()]))
                .collect(),
        )
    }
}

/// Fixed-length array codec.
///
/// Graphene has no wire layout for this type that clients need; it cannot be
/// constructed. Use [`Array`] and check the length before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedArray {}

impl FixedArray {
    pub fn try_new<T>(_items: Vec<T>, _len: usize) -> Result<Self, CodecError> {
        Err(CodecError::NotImplemented("fixed_array"))
    }
}
