//! secp256k1 key pairs and their Graphene text forms.
//!
//! Private keys travel as Base58Check WIF strings. Public keys render as a
//! network prefix followed by base58 of the compressed point and a 4-byte
//! RIPEMD-160 checksum; the prefix comes from the caller's [`NetworkContext`].

use crate::config::NetworkContext;
use crate::types::encoding::{Decode, DecodeError, Describe, Encode, EncodeSink};
use graphene_derive::Error;
use k256::ecdsa::{SigningKey, VerifyingKey};
use rand_core::OsRng;
use ripemd::{Digest, Ripemd160};
use serde_json::Value as JsonValue;
use std::fmt;
use zeroize::Zeroizing;

/// Version byte of WIF private keys.
pub const WIF_VERSION: u8 = 0x80;

/// Length of a compressed SEC1 point.
pub const COMPRESSED_KEY_LEN: usize = 33;

const PUBLIC_KEY_CHECKSUM_LEN: usize = 4;

/// Errors from parsing or constructing keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// WIF string is not valid base58, has the wrong version or length.
    #[error("invalid WIF private key: {0}")]
    InvalidWifKey(String),
    /// Bytes do not describe a valid secp256k1 scalar or point.
    #[error("invalid curve point or scalar")]
    CurvePointError,
    /// Public key string does not start with the network's prefix.
    #[error("public key prefix mismatch: expected {expected}")]
    PrefixMismatch { expected: String },
    /// Embedded checksum does not match the payload.
    #[error("key checksum mismatch")]
    InvalidChecksum,
}

/// Private key for signing transactions and decrypting memos.
///
/// Never serialized on the wire. Only leaves the process as a WIF string
/// when the caller asks for one.
#[derive(Clone)]
pub struct PrivateKey {
    key: SigningKey,
}

/// Public key for signature verification, recovery and memo encryption.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    key: VerifyingKey,
}

impl PrivateKey {
    /// Generates a new random private key using OS-provided entropy.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::random(&mut OsRng),
        }
    }

    /// Creates a private key from a raw 32-byte scalar.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, KeyError> {
        SigningKey::from_slice(bytes)
            .map(|key| Self { key })
            .map_err(|_| KeyError::CurvePointError)
    }

    /// Returns the raw scalar.
    ///
    /// **Security**: the returned buffer is wiped on drop; do not copy it out.
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.key.to_bytes().into())
    }

    /// Parses a Base58Check WIF string (version 0x80).
    ///
    /// Both the plain 33-byte payload and the 34-byte payload carrying the
    /// compressed-key flag are accepted.
    pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
        let payload = Zeroizing::new(
            bs58::decode(wif)
                .with_check(Some(WIF_VERSION))
                .into_vec()
                .map_err(|e| match e {
                    bs58::decode::Error::InvalidChecksum { .. } => KeyError::InvalidChecksum,
                    other => KeyError::InvalidWifKey(other.to_string()),
                })?,
        );

        let scalar = match payload.len() {
            33 => &payload[1..],
            34 if payload[33] == 0x01 => &payload[1..33],
            n => {
                return Err(KeyError::InvalidWifKey(format!(
                    "unexpected payload length {n}"
                )));
            }
        };

        let mut bytes = Zeroizing::new([0u8; 32]);
        bytes.copy_from_slice(scalar);
        Self::from_bytes(&bytes)
    }

    /// Encodes the key as an uncompressed-form WIF string.
    pub fn to_wif(&self) -> Zeroizing<String> {
        let bytes = self.to_bytes();
        Zeroizing::new(
            bs58::encode(&bytes[..])
                .with_check_version(WIF_VERSION)
                .into_string(),
        )
    }

    /// Derives the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            key: *self.key.verifying_key(),
        }
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    /// X coordinate of `self * other`, the raw ECDH shared point.
    pub(crate) fn shared_x(&self, other: &PublicKey) -> Zeroizing<[u8; 32]> {
        let shared = k256::ecdh::diffie_hellman(self.key.as_nonzero_scalar(), other.key.as_affine());
        Zeroizing::new((*shared.raw_secret_bytes()).into())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PrivateKey {}

impl PublicKey {
    /// Parses a SEC1 point, compressed or not.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(|key| Self { key })
            .map_err(|_| KeyError::CurvePointError)
    }

    pub(crate) fn from_verifying_key(key: VerifyingKey) -> Self {
        Self { key }
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.key
    }

    /// 33-byte compressed SEC1 encoding, the wire form.
    pub fn to_compressed(&self) -> [u8; COMPRESSED_KEY_LEN] {
        let point = self.key.to_encoded_point(true);
        let mut out = [0u8; COMPRESSED_KEY_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Text form `prefix || base58(compressed || ripemd160(compressed)[..4])`.
    pub fn to_base58(&self, ctx: &NetworkContext) -> String {
        let compressed = self.to_compressed();
        let mut payload = Vec::with_capacity(COMPRESSED_KEY_LEN + PUBLIC_KEY_CHECKSUM_LEN);
        payload.extend_from_slice(&compressed);
        payload.extend_from_slice(&key_checksum(&compressed));
        format!("{}{}", ctx.prefix, bs58::encode(payload).into_string())
    }

    /// Parses the text form produced by [`PublicKey::to_base58`].
    pub fn from_base58(s: &str, ctx: &NetworkContext) -> Result<Self, KeyError> {
        let body = s
            .strip_prefix(ctx.prefix.as_str())
            .ok_or_else(|| KeyError::PrefixMismatch {
                expected: ctx.prefix.clone(),
            })?;

        let payload = bs58::decode(body)
            .into_vec()
            .map_err(|_| KeyError::CurvePointError)?;
        if payload.len() != COMPRESSED_KEY_LEN + PUBLIC_KEY_CHECKSUM_LEN {
            return Err(KeyError::CurvePointError);
        }

        let (compressed, checksum) = payload.split_at(COMPRESSED_KEY_LEN);
        if key_checksum(compressed)[..] != *checksum {
            return Err(KeyError::InvalidChecksum);
        }

        Self::from_sec1_bytes(compressed)
    }
}

fn key_checksum(compressed: &[u8]) -> [u8; PUBLIC_KEY_CHECKSUM_LEN] {
    let hash = Ripemd160::digest(compressed);
    let mut out = [0u8; PUBLIC_KEY_CHECKSUM_LEN];
    out.copy_from_slice(&hash[..PUBLIC_KEY_CHECKSUM_LEN]);
    out
}

impl Encode for PublicKey {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(&self.to_compressed());
    }
}

impl Decode for PublicKey {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let bytes = <[u8; COMPRESSED_KEY_LEN]>::decode(input)?;
        Self::from_sec1_bytes(&bytes).map_err(|_| DecodeError::InvalidValue)
    }
}

impl Describe for PublicKey {
    /// Hex of the compressed point; the prefixed form needs a network context.
    fn describe(&self) -> JsonValue {
        JsonValue::String(hex::encode(self.to_compressed()))
    }
}

/// A private key together with its public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPair {
    pub private: PrivateKey,
    pub public: PublicKey,
}

impl KeyPair {
    pub fn new(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    pub fn generate() -> Self {
        Self::new(PrivateKey::generate())
    }

    pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
        PrivateKey::from_wif(wif).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Bitcoin wiki WIF example.
    const WIF: &str = "5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ";
    const WIF_HEX: &str = "0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d";
    const WIF_PUBLIC_COMPRESSED: &str =
        "02d0de0aaeaefad02b8bdc8a01a1b8b11c696bd3d66a2c5f10780d95b7df42645c";

    #[test]
    fn wif_decodes_to_known_scalar() {
        let key = PrivateKey::from_wif(WIF).unwrap();
        assert_eq!(hex::encode(*key.to_bytes()), WIF_HEX);
        assert_eq!(
            hex::encode(key.public_key().to_compressed()),
            WIF_PUBLIC_COMPRESSED
        );
    }

    #[test]
    fn wif_roundtrip() {
        let key = PrivateKey::from_wif(WIF).unwrap();
        assert_eq!(key.to_wif().as_str(), WIF);

        let generated = PrivateKey::generate();
        assert_eq!(PrivateKey::from_wif(&generated.to_wif()).unwrap(), generated);
    }

    #[test]
    fn wif_bad_checksum() {
        // Last character changed.
        let tampered = "5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTK";
        assert_eq!(PrivateKey::from_wif(tampered), Err(KeyError::InvalidChecksum));
    }

    #[test]
    fn wif_garbage() {
        assert!(matches!(
            PrivateKey::from_wif("not-base58!"),
            Err(KeyError::InvalidWifKey(_))
        ));
        assert!(PrivateKey::from_wif("").is_err());
    }

    #[test]
    fn wif_wrong_version() {
        let bytes = PrivateKey::from_wif(WIF).unwrap().to_bytes();
        let testnet = bs58::encode(&bytes[..])
            .with_check_version(0xef)
            .into_string();
        assert!(matches!(
            PrivateKey::from_wif(&testnet),
            Err(KeyError::InvalidWifKey(_))
        ));
    }

    #[test]
    fn zero_scalar_rejected() {
        assert_eq!(
            PrivateKey::from_bytes(&[0u8; 32]),
            Err(KeyError::CurvePointError)
        );
    }

    #[test]
    fn public_key_string_roundtrip_per_prefix() {
        let public = PrivateKey::from_wif(WIF).unwrap().public_key();
        for prefix in ["GPH", "BTS", "TEST"] {
            let ctx = NetworkContext::with_prefix(prefix);
            let text = public.to_base58(&ctx);
            assert!(text.starts_with(prefix));
            assert_eq!(PublicKey::from_base58(&text, &ctx).unwrap(), public);
        }
    }

    #[test]
    fn public_key_prefix_mismatch() {
        let public = PrivateKey::from_wif(WIF).unwrap().public_key();
        let text = public.to_base58(&NetworkContext::with_prefix("BTS"));
        assert_eq!(
            PublicKey::from_base58(&text, &NetworkContext::with_prefix("GPH")),
            Err(KeyError::PrefixMismatch {
                expected: "GPH".to_string()
            })
        );
    }

    #[test]
    fn public_key_checksum_mismatch() {
        let ctx = NetworkContext::default();
        let public = PrivateKey::from_wif(WIF).unwrap().public_key();
        let mut payload = public.to_compressed().to_vec();
        payload.extend_from_slice(&[0, 0, 0, 0]);
        let text = format!("GPH{}", bs58::encode(payload).into_string());
        assert_eq!(
            PublicKey::from_base58(&text, &ctx),
            Err(KeyError::InvalidChecksum)
        );
    }

    #[test]
    fn public_key_wire_form() {
        let public = PrivateKey::from_wif(WIF).unwrap().public_key();
        let bytes = public.to_bytes();
        assert_eq!(bytes.len(), COMPRESSED_KEY_LEN);
        assert_eq!(PublicKey::from_bytes(&bytes).unwrap(), public);

        let mut bad = bytes.clone();
        bad[0] = 0x05;
        assert_eq!(PublicKey::from_bytes(&bad), Err(DecodeError::InvalidValue));
    }

    #[test]
    fn key_pair_from_wif() {
        let pair = KeyPair::from_wif(WIF).unwrap();
        assert_eq!(pair.public, pair.private.public_key());
    }

    #[test]
    fn debug_hides_scalar() {
        let key = PrivateKey::from_wif(WIF).unwrap();
        assert!(!format!("{key:?}").contains(WIF_HEX));
    }
}
