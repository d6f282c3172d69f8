//! Scalar codecs that need more than a plain integer: text, hex byte
//! strings, timestamps and the empty value.

use crate::types::encoding::{
    Decode, DecodeError, Describe, Encode, EncodeSink, read_bytes, read_length,
};
use crate::types::error::CodecError;
use crate::types::varint::encode_varint;
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// Format of timestamps in operations and the JSON-RPC API (always UTC).
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Length-prefixed text.
///
/// [`Text::new`] replaces every non-ASCII character with its closest ASCII
/// spelling, so each character takes one byte on the wire. [`Text::utf8`]
/// keeps the string as literal UTF-8 for nodes that accept it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Text(String);

impl Text {
    pub fn new(s: &str) -> Self {
        Text(deunicode::deunicode(s))
    }

    /// Builds a text value without transliteration.
    pub fn utf8(s: impl Into<String>) -> Self {
        Text(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Encode for Text {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.0.as_str().encode(out);
    }
}

impl Decode for Text {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        String::decode(input).map(Text)
    }
}

impl Describe for Text {
    fn describe(&self) -> JsonValue {
        JsonValue::String(self.0.clone())
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Text::new(s)
    }
}

/// Variable-length byte string, supplied and displayed as hex.
///
/// The declared length is informational only: it is shown by callers that
/// want to surface the schema's expected size, but never enforced on encode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawBytes {
    data: Vec<u8>,
    declared_len: usize,
}

impl RawBytes {
    /// Parses a hex string; the declared length defaults to the decoded length.
    pub fn from_hex(hex_str: &str, declared_len: Option<usize>) -> Result<Self, CodecError> {
        let data = hex::decode(hex_str).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        let declared_len = declared_len.unwrap_or(data.len());
        Ok(Self { data, declared_len })
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        let declared_len = data.len();
        Self { data, declared_len }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn declared_len(&self) -> usize {
        self.declared_len
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.data)
    }
}

impl Encode for RawBytes {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        encode_varint(self.data.len() as u64, out);
        out.write(&self.data);
    }
}

impl Decode for RawBytes {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let len = read_length(input)?;
        Ok(RawBytes::from_vec(read_bytes(input, len)?.to_vec()))
    }
}

impl Describe for RawBytes {
    fn describe(&self) -> JsonValue {
        JsonValue::String(self.to_hex())
    }
}

impl FromStr for RawBytes {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RawBytes::from_hex(s, None)
    }
}

/// Point in time with second precision, 32-bit Unix time on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u32);

impl Timestamp {
    /// Parses `%Y-%m-%dT%H:%M:%S` as UTC.
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        let parsed = NaiveDateTime::parse_from_str(s, TIME_FORMAT)
            .map_err(|e| CodecError::InvalidTimestamp(format!("{s}: {e}")))?;
        let secs = parsed.and_utc().timestamp();
        u32::try_from(secs)
            .map(Timestamp)
            .map_err(|_| CodecError::InvalidTimestamp(format!("{s}: outside 32-bit unix time")))
    }

    pub fn from_unix(secs: u32) -> Self {
        Timestamp(secs)
    }

    pub fn unix(&self) -> u32 {
        self.0
    }
}

impl Encode for Timestamp {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.0.encode(out);
    }
}

impl Decode for Timestamp {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        u32::decode(input).map(Timestamp)
    }
}

impl Describe for Timestamp {
    fn describe(&self) -> JsonValue {
        JsonValue::String(self.to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::from_timestamp(i64::from(self.0), 0) {
            Some(dt) => write!(f, "{}", dt.format(TIME_FORMAT)),
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for Timestamp {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::parse(s)
    }
}

/// The empty value: encodes to nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Void;

impl Encode for Void {
    fn encode<S: EncodeSink>(&self, _out: &mut S) {}
}

impl Decode for Void {
    fn decode(_input: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Void)
    }
}

impl Describe for Void {
    fn describe(&self) -> JsonValue {
        JsonValue::String(String::new())
    }
}
