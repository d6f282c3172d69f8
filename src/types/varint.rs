//! Variable-length unsigned integers.
//!
//! Every length prefix, object instance and static variant tag on the
//! Graphene wire uses this encoding: 7 payload bits per byte, least
//! significant group first, with the high bit (0x80) set on every byte but
//! the last.

use crate::types::encoding::{Decode, DecodeError, Describe, Encode, EncodeSink};
use serde_json::Value as JsonValue;
use std::fmt;

/// Longest possible encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Writes `n` as a varint.
pub fn encode_varint<S: EncodeSink + ?Sized>(mut n: u64, out: &mut S) {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let mut len = 0;
    while n >= 0x80 {
        buf[len] = (n as u8 & 0x7f) | 0x80;
        n >>= 7;
        len += 1;
    }
    buf[len] = n as u8;
    out.write(&buf[..=len]);
}

/// Decodes a varint from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed. Decoding stops at the
/// first byte without the continuation bit.
pub fn decode_varint(bytes: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut result: u64 = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        if i == MAX_VARINT_LEN {
            return Err(DecodeError::Overflow);
        }
        let group = u64::from(byte & 0x7f);
        let shift = 7 * i as u32;
        // The tenth byte may only contribute the single remaining bit.
        if shift == 63 && group > 1 {
            return Err(DecodeError::Overflow);
        }
        result |= group << shift;
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }
    Err(DecodeError::Truncated)
}

/// Decodes a varint and advances `input` past it.
pub fn decode_varint_from(input: &mut &[u8]) -> Result<u64, DecodeError> {
    let (value, consumed) = decode_varint(input)?;
    *input = &input[consumed..];
    Ok(value)
}

/// Unsigned integer carried as a varint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarInt(pub u64);

impl Encode for VarInt {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        encode_varint(self.0, out);
    }
}

impl Decode for VarInt {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        decode_varint_from(input).map(VarInt)
    }
}

impl Describe for VarInt {
    fn describe(&self) -> JsonValue {
        JsonValue::from(self.0)
    }
}

impl fmt::Display for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VarInt {
    fn from(n: u64) -> Self {
        VarInt(n)
    }
}

impl From<u32> for VarInt {
    fn from(n: u32) -> Self {
        VarInt(u64::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_300() {
        assert_eq!(VarInt(300).to_bytes(), [0xAC, 0x02]);
        assert_eq!(decode_varint(&[0xAC, 0x02]).unwrap(), (300, 2));
    }

    #[test]
    fn single_byte_values() {
        assert_eq!(VarInt(0).to_bytes(), [0x00]);
        assert_eq!(VarInt(1).to_bytes(), [0x01]);
        assert_eq!(VarInt(127).to_bytes(), [0x7F]);
        assert_eq!(VarInt(128).to_bytes(), [0x80, 0x01]);
    }

    #[test]
    fn max_value_uses_ten_bytes() {
        let bytes = VarInt(u64::MAX).to_bytes();
        assert_eq!(bytes.len(), MAX_VARINT_LEN);
        assert_eq!(bytes[9], 0x01);
        assert_eq!(decode_varint(&bytes).unwrap(), (u64::MAX, MAX_VARINT_LEN));
    }

    #[test]
    fn decode_stops_at_first_terminal_byte() {
        let (value, consumed) = decode_varint(&[0x05, 0xFF, 0xFF]).unwrap();
        assert_eq!(value, 5);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn decode_truncated() {
        assert_eq!(decode_varint(&[]), Err(DecodeError::Truncated));
        assert_eq!(decode_varint(&[0x80, 0x80]), Err(DecodeError::Truncated));
    }

    #[test]
    fn decode_overflow() {
        let mut too_wide = vec![0xFF; 9];
        too_wide.push(0x02);
        assert_eq!(decode_varint(&too_wide), Err(DecodeError::Overflow));

        let eleven = [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00];
        assert_eq!(decode_varint(&eleven), Err(DecodeError::Overflow));
    }

    #[test]
    fn decode_from_advances_input() {
        let mut input: &[u8] = &[0xAC, 0x02, 0x07];
        assert_eq!(decode_varint_from(&mut input).unwrap(), 300);
        assert_eq!(input, &[0x07]);
    }

    #[test]
    fn describes_as_number() {
        assert_eq!(VarInt(69585).describe_text(), "69585");
        assert_eq!(VarInt(69585).to_string(), "69585");
    }
}
