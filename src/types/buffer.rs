//! Append-only byte buffer that assembles the signing payload.

use crate::types::encoding::{Encode, EncodeSink};
use crate::types::hash::{Digest, DigestScheme};

/// Accumulates encoded values in push order.
///
/// Bytes are only ever appended, so the buffer after a sequence of pushes is
/// exactly the concatenation of each value's encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializationBuffer {
    bytes: Vec<u8>,
}

impl SerializationBuffer {
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Appends the encoding of `value`.
    pub fn push<T: Encode + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.encode(&mut self.bytes);
        self
    }

    /// Appends raw bytes as they are.
    pub fn push_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Digest of the accumulated bytes under `scheme`.
    pub fn digest(&self, scheme: &DigestScheme) -> Digest {
        scheme.digest(&self.bytes)
    }
}

impl EncodeSink for SerializationBuffer {
    fn write(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ids::ObjectId;
    use crate::types::primitives::Text;
    use crate::types::varint::VarInt;

    #[test]
    fn push_concatenates_encodings() {
        let id: ObjectId = "1.2.69585".parse().unwrap();
        let mut buffer = SerializationBuffer::new();
        buffer.push(&5u16).push(&Text::new("hi")).push(&id);

        let mut expected = 5u16.to_bytes();
        expected.extend(Text::new("hi").to_bytes());
        expected.extend(VarInt(69585).to_bytes());
        assert_eq!(buffer.as_bytes(), expected.as_slice());
        assert_eq!(buffer.len(), expected.len());
    }

    #[test]
    fn empty_buffer() {
        let buffer = SerializationBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.to_hex(), "");
    }

    #[test]
    fn digest_uses_scheme_domain() {
        let mut buffer = SerializationBuffer::with_capacity(4);
        buffer.push_raw(b"c");
        let scheme = DigestScheme::new(Default::default(), b"ab".to_vec());
        assert_eq!(buffer.digest(&scheme), Digest::sha256(b"abc"));
        assert_eq!(buffer.into_bytes(), b"c");
    }

    #[test]
    fn usable_as_encode_sink() {
        let mut buffer = SerializationBuffer::new();
        VarInt(300).encode(&mut buffer);
        assert_eq!(buffer.as_bytes(), &[0xAC, 0x02]);
    }
}
