//! 32-byte digests over encoded values.

use crate::types::encoding::{Decode, DecodeError, Describe, Encode, EncodeSink, read_bytes};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sha2::{Digest as _, Sha256};
use sha3::Sha3_256;
use std::fmt;

/// Digest length in bytes.
pub const DIGEST_LEN: usize = 32;

/// Fixed-size 32-byte digest, the message that gets signed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash, Ord, PartialOrd)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl Digest {
    pub fn zero() -> Digest {
        Digest([0u8; DIGEST_LEN])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// SHA-256 of `data`, no domain prefix.
    pub fn sha256(data: &[u8]) -> Digest {
        Digest(Sha256::digest(data).into())
    }

    pub fn from_hex(s: &str) -> Option<Digest> {
        let bytes = hex::decode(s).ok()?;
        bytes.try_into().ok().map(Digest)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Encode for Digest {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(&self.0);
    }
}

impl Decode for Digest {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let mut buf = [0u8; DIGEST_LEN];
        buf.copy_from_slice(read_bytes(input, DIGEST_LEN)?);
        Ok(Digest(buf))
    }
}

impl Describe for Digest {
    fn describe(&self) -> JsonValue {
        JsonValue::String(self.to_string())
    }
}

/// Hash function used to build signing digests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// What Graphene nodes use.
    #[default]
    Sha256,
    Sha3_256,
}

impl HashAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha3_256 => "sha3_256",
        }
    }

    pub fn parse(s: &str) -> Option<HashAlgorithm> {
        match s {
            "sha256" => Some(HashAlgorithm::Sha256),
            "sha3_256" => Some(HashAlgorithm::Sha3_256),
            _ => None,
        }
    }
}

/// How a digest is computed: `algorithm(domain || bytes)`.
///
/// For transactions the domain is the chain id, which binds a signature to
/// one network. Plain messages use an empty domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestScheme {
    pub algorithm: HashAlgorithm,
    pub domain: Vec<u8>,
}

impl DigestScheme {
    pub fn new(algorithm: HashAlgorithm, domain: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm,
            domain: domain.into(),
        }
    }

    /// SHA-256 without a domain.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Starts an incremental digest with the domain already absorbed.
    pub fn builder(&self) -> DigestBuilder {
        let mut builder = DigestBuilder::new(self.algorithm);
        builder.update(&self.domain);
        builder
    }

    pub fn digest(&self, bytes: &[u8]) -> Digest {
        let mut builder = self.builder();
        builder.update(bytes);
        builder.finalize()
    }

    /// Digest of an encodable value without materializing its bytes.
    pub fn digest_value<T: Encode + ?Sized>(&self, value: &T) -> Digest {
        let mut builder = self.builder();
        value.encode(&mut builder);
        builder.finalize()
    }
}

enum Hasher {
    Sha256(Sha256),
    Sha3_256(Sha3_256),
}

/// Incremental hash builder.
///
/// Implements [`EncodeSink`] so encodable types can be hashed directly
/// without intermediate byte buffers.
pub struct DigestBuilder {
    hasher: Hasher,
}

impl DigestBuilder {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let hasher = match algorithm {
            HashAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            HashAlgorithm::Sha3_256 => Hasher::Sha3_256(Sha3_256::new()),
        };
        Self { hasher }
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.hasher {
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha3_256(h) => h.update(data),
        }
    }

    pub fn finalize(self) -> Digest {
        match self.hasher {
            Hasher::Sha256(h) => Digest(h.finalize().into()),
            Hasher::Sha3_256(h) => Digest(h.finalize().into()),
        }
    }
}

impl EncodeSink for DigestBuilder {
    fn write(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}
