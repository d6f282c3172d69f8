//! Closed set of encodable values.
//!
//! Operation builders assemble a tree of [`Value`]s and hand it to a
//! [`SerializationBuffer`](crate::types::buffer::SerializationBuffer); every
//! variant dispatches to the codec of the wrapped type.

use crate::crypto::key_pair::PublicKey;
use crate::crypto::signature::Signature;
use crate::types::composite::{Array, FixedArray, Map, Optional, StaticVariant};
use crate::types::encoding::{Describe, Encode, EncodeSink};
use crate::types::ids::{Id, ObjectId, VoteId};
use crate::types::primitives::{RawBytes, Text, Timestamp, Void};
use crate::types::varint::VarInt;
use serde_json::Value as JsonValue;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Int16(i16),
    Int64(i64),
    VarInt(VarInt),
    Bool(bool),
    Text(Text),
    RawBytes(RawBytes),
    Void(Void),
    Timestamp(Timestamp),
    Signature(Signature),
    PublicKey(PublicKey),
    Array(Array<Value>),
    Set(Array<Value>),
    Optional(Optional<Box<Value>>),
    StaticVariant(StaticVariant<Box<Value>>),
    Map(Map<Value, Value>),
    Id(Id),
    ObjectId(ObjectId),
    VoteId(VoteId),
    FixedArray(FixedArray),
}

impl Value {
    /// Codec name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::UInt8(_) => "uint8",
            Value::UInt16(_) => "uint16",
            Value::UInt32(_) => "uint32",
            Value::UInt64(_) => "uint64",
            Value::Int16(_) => "int16",
            Value::Int64(_) => "int64",
            Value::VarInt(_) => "varint32",
            Value::Bool(_) => "bool",
            Value::Text(_) => "string",
            Value::RawBytes(_) => "bytes",
            Value::Void(_) => "void",
            Value::Timestamp(_) => "time_point_sec",
            Value::Signature(_) => "signature",
            Value::PublicKey(_) => "public_key",
            Value::Array(_) => "array",
            Value::Set(_) => "set",
            Value::Optional(_) => "optional",
            Value::StaticVariant(_) => "static_variant",
            Value::Map(_) => "map",
            Value::Id(_) => "id",
            Value::ObjectId(_) => "object_id",
            Value::VoteId(_) => "vote_id",
            Value::FixedArray(never) => match *never {},
        }
    }

    pub fn optional(value: Option<Value>) -> Value {
        Value::Optional(Optional(value.map(Box::new)))
    }

    pub fn variant(type_id: u64, payload: Value) -> Value {
        Value::StaticVariant(StaticVariant::new(type_id, Box::new(payload)))
    }
}

impl Encode for Value {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        match self {
            Value::UInt8(v) => v.encode(out),
            Value::UInt16(v) => v.encode(out),
            Value::UInt32(v) => v.encode(out),
            Value::UInt64(v) => v.encode(out),
            Value::Int16(v) => v.encode(out),
            Value::Int64(v) => v.encode(out),
            Value::VarInt(v) => v.encode(out),
            Value::Bool(v) => v.encode(out),
            Value::Text(v) => v.encode(out),
            Value::RawBytes(v) => v.encode(out),
            Value::Void(v) => v.encode(out),
            Value::Timestamp(v) => v.encode(out),
            Value::Signature(v) => v.encode(out),
            Value::PublicKey(v) => v.encode(out),
            Value::Array(v) | Value::Set(v) => v.encode(out),
            Value::Optional(v) => v.encode(out),
            Value::StaticVariant(v) => v.encode(out),
            Value::Map(v) => v.encode(out),
            Value::Id(v) => v.encode(out),
            Value::ObjectId(v) => v.encode(out),
            Value::VoteId(v) => v.encode(out),
            Value::FixedArray(never) => match *never {},
        }
    }
}

impl Describe for Value {
    fn describe(&self) -> JsonValue {
        match self {
            Value::UInt8(v) => v.describe(),
            Value::UInt16(v) => v.describe(),
            Value::UInt32(v) => v.describe(),
            Value::UInt64(v) => v.describe(),
            Value::Int16(v) => v.describe(),
            Value::Int64(v) => v.describe(),
            Value::VarInt(v) => v.describe(),
            Value::Bool(v) => v.describe(),
            Value::Text(v) => v.describe(),
            Value::RawBytes(v) => v.describe(),
            Value::Void(v) => v.describe(),
            Value::Timestamp(v) => v.describe(),
            Value::Signature(v) => v.describe(),
            Value::PublicKey(v) => v.describe(),
            Value::Array(v) | Value::Set(v) => v.describe(),
            Value::Optional(v) => v.describe(),
            Value::StaticVariant(v) => v.describe(),
            Value::Map(v) => v.describe(),
            Value::Id(v) => v.describe(),
            Value::ObjectId(v) => v.describe(),
            Value::VoteId(v) => v.describe(),
            Value::FixedArray(never) => match *never {},
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe_text())
    }
}

macro_rules! impl_from {
    ($($variant:ident($t:ty)),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from!(
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Int16(i16),
    Int64(i64),
    VarInt(VarInt),
    Bool(bool),
    Text(Text),
    RawBytes(RawBytes),
    Timestamp(Timestamp),
    Signature(Signature),
    PublicKey(PublicKey),
    Id(Id),
    ObjectId(ObjectId),
    VoteId(VoteId),
);

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::buffer::SerializationBuffer;

    fn transfer() -> Value {
        // fee, from, to, amount, memo, extensions
        Value::Array(Array(vec![
            Value::Int64(100),
            Value::ObjectId("1.2.15".parse().unwrap()),
            Value::ObjectId("1.2.16".parse().unwrap()),
            Value::Int64(5000),
            Value::optional(None),
            Value::Set(Array(vec![])),
        ]))
    }

    #[test]
    fn tree_encodes_as_concatenation() {
        let mut expected = vec![0x06];
        expected.extend(100i64.to_le_bytes());
        expected.push(15);
        expected.push(16);
        expected.extend(5000i64.to_le_bytes());
        expected.push(0x00);
        expected.push(0x00);
        assert_eq!(transfer().to_bytes(), expected);
    }

    #[test]
    fn describe_renders_json_like() {
        assert_eq!(
            transfer().to_string(),
            r#"[100,"1.2.15","1.2.16",5000,null,[]]"#
        );
    }

    #[test]
    fn buffer_push_matches_value_encoding() {
        let value = Value::variant(0, Value::Text(Text::new("Foobar")));
        let mut buffer = SerializationBuffer::new();
        buffer.push(&value);
        assert_eq!(buffer.as_bytes(), value.to_bytes().as_slice());
        assert_eq!(buffer.as_bytes()[..2], [0x00, 0x06]);
    }

    #[test]
    fn optional_of_void_collapses() {
        let value = Value::optional(Some(Value::Void(Void)));
        assert_eq!(value.to_bytes(), [0x00]);
    }

    #[test]
    fn map_of_values() {
        let map = Value::Map(Map(vec![(
            Value::Text(Text::new("k")),
            Value::VoteId("1:5".parse().unwrap()),
        )]));
        assert_eq!(map.to_bytes(), [0x01, 0x01, b'k', 0x01, 0x05, 0x00, 0x00]);
        assert_eq!(map.to_string(), r#"[["k","1:5"]]"#);
    }

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(7u16), Value::UInt16(7));
        assert_eq!(Value::from(true).kind(), "bool");
        assert_eq!(Value::from(vec![Value::from(1u8)]).to_bytes(), [0x01, 0x01]);
    }
}
