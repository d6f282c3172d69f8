//! Canonical, publicly recoverable ECDSA signatures.
//!
//! Graphene nodes identify the signer of a transaction by recovering the
//! public key from the signature, and only accept signatures whose `r` and `s`
//! both occupy exactly 32 significant bytes with the high bit clear. Signing
//! therefore retries with fresh deterministic nonces until a candidate passes
//! both checks.

use crate::config::NetworkContext;
use crate::crypto::key_pair::{PrivateKey, PublicKey};
use crate::types::encoding::{Decode, DecodeError, Describe, Encode, EncodeSink, read_bytes};
use crate::types::hash::{Digest, DigestScheme};
use crate::warn;
use ecdsa::hazmat::SignPrimitive;
use graphene_derive::Error;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use k256::{FieldBytes, Scalar, Secp256k1};
use serde_json::Value as JsonValue;
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

/// Encoded signature length: header byte, `r`, `s`.
pub const SIGNATURE_LEN: usize = 65;

/// Header base for compact signatures over compressed keys (`27 + 4`).
const COMPACT_HEADER_COMPRESSED: u8 = 31;

/// Lowest header accepted on decode (`27`, uncompressed form).
const COMPACT_HEADER_MIN: u8 = 27;

/// Highest valid recovery id.
const MAX_RECOVERY_ID: u8 = 3;

/// Errors from producing or parsing signatures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No canonical, recoverable candidate was found within the attempt bound.
    #[error("no canonical recoverable signature after {attempts} attempts")]
    SignatureRecoveryFailure { attempts: u32 },
    /// The curve library refused to sign.
    #[error("signing failed: {0}")]
    SigningFailure(String),
    /// Signature bytes or text are not a valid compact signature.
    #[error("malformed signature: {0}")]
    Malformed(String),
}

/// Compact recoverable signature `(recovery_id, r, s)`.
///
/// The recovery id is always in `0..=3`, so the header byte and the 65-byte
/// form can always be produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    recovery_id: u8,
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    pub fn new(recovery_id: u8, r: [u8; 32], s: [u8; 32]) -> Result<Self, SignatureError> {
        if recovery_id > MAX_RECOVERY_ID {
            return Err(SignatureError::Malformed(format!(
                "recovery id {recovery_id} out of range"
            )));
        }
        Ok(Self { recovery_id, r, s })
    }

    pub fn recovery_id(&self) -> u8 {
        self.recovery_id
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// Compact header byte: `27 + 4 + recovery_id`.
    pub fn header(&self) -> u8 {
        COMPACT_HEADER_COMPRESSED + self.recovery_id
    }

    /// True if both `r` and `s` satisfy the Graphene canonical form.
    pub fn is_canonical(&self) -> bool {
        is_canonical_half(&self.r) && is_canonical_half(&self.s)
    }

    /// 65-byte compact form.
    pub fn to_array(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[0] = self.header();
        out[1..33].copy_from_slice(&self.r);
        out[33..].copy_from_slice(&self.s);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_array())
    }

    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(s).map_err(|e| SignatureError::Malformed(e.to_string()))?;
        Self::from_bytes(&bytes).map_err(|e| SignatureError::Malformed(e.to_string()))
    }

    fn from_parts(recovery_id: RecoveryId, signature: &EcdsaSignature) -> Self {
        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self {
            recovery_id: recovery_id.to_byte(),
            r,
            s,
        }
    }

    fn to_ecdsa(self) -> Option<(RecoveryId, EcdsaSignature)> {
        let recovery_id = RecoveryId::from_byte(self.recovery_id)?;
        let signature = EcdsaSignature::from_scalars(self.r, self.s).ok()?;
        Some((recovery_id, signature))
    }
}

/// Graphene canonical check on one 32-byte half: high bit clear, and no
/// redundant leading zero byte.
fn is_canonical_half(half: &[u8; 32]) -> bool {
    half[0] & 0x80 == 0 && !(half[0] == 0 && half[1] & 0x80 == 0)
}

impl Encode for Signature {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(&self.to_array());
    }
}

impl Decode for Signature {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let bytes = read_bytes(input, SIGNATURE_LEN)?;
        let header = bytes[0];
        if !(COMPACT_HEADER_MIN..COMPACT_HEADER_MIN + 8).contains(&header) {
            return Err(DecodeError::InvalidValue);
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[1..33]);
        s.copy_from_slice(&bytes[33..]);
        Ok(Self {
            recovery_id: (header - COMPACT_HEADER_MIN) & 3,
            r,
            s,
        })
    }
}

impl Describe for Signature {
    fn describe(&self) -> JsonValue {
        JsonValue::String(self.to_hex())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Signature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Signature::from_hex(s)
    }
}

/// Signs and verifies digests under one digest scheme.
#[derive(Debug, Clone)]
pub struct SignatureEngine {
    scheme: DigestScheme,
    max_attempts: u32,
}

impl SignatureEngine {
    pub fn new(scheme: DigestScheme, max_attempts: u32) -> Self {
        Self {
            scheme,
            max_attempts,
        }
    }

    /// Engine for transactions on `ctx`'s chain.
    pub fn from_context(ctx: &NetworkContext) -> Self {
        Self::new(ctx.transaction_scheme(), ctx.max_signing_attempts)
    }

    /// Engine for free-form messages: no chain id domain.
    pub fn for_messages(ctx: &NetworkContext) -> Self {
        Self::new(ctx.message_scheme(), ctx.max_signing_attempts)
    }

    pub fn scheme(&self) -> &DigestScheme {
        &self.scheme
    }

    pub fn digest(&self, bytes: &[u8]) -> Digest {
        self.scheme.digest(bytes)
    }

    /// Hashes `bytes` under the engine's scheme and signs the digest.
    pub fn sign(&self, bytes: &[u8], key: &PrivateKey) -> Result<Signature, SignatureError> {
        self.sign_digest(&self.digest(bytes), key)
    }

    /// Produces a canonical signature whose recovery id yields `key`'s
    /// public key. The candidate sequence depends only on the key and digest.
    pub fn sign_digest(
        &self,
        digest: &Digest,
        key: &PrivateKey,
    ) -> Result<Signature, SignatureError> {
        let z = FieldBytes::from(digest.0);
        let scalar: &Scalar = key.signing_key().as_nonzero_scalar();
        let expected = key.public_key();

        for attempt in 0..self.max_attempts {
            let candidate = sign_candidate(scalar, &z, attempt)?;

            if let Some(signature) = find_recoverable(digest, &candidate, &expected) {
                if signature.is_canonical() {
                    return Ok(signature);
                }
            }
        }

        warn!(
            "Signing gave up after {} attempts on digest {}",
            self.max_attempts, digest
        );
        Err(SignatureError::SignatureRecoveryFailure {
            attempts: self.max_attempts,
        })
    }

    /// Recovers the signer's public key from a digest and signature.
    pub fn recover_digest(
        &self,
        digest: &Digest,
        signature: &Signature,
    ) -> Result<PublicKey, SignatureError> {
        let (recovery_id, sig) = signature
            .to_ecdsa()
            .ok_or_else(|| SignatureError::Malformed("invalid r, s or recovery id".into()))?;
        VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
            .map(PublicKey::from_verifying_key)
            .map_err(|e| SignatureError::Malformed(e.to_string()))
    }

    pub fn recover(&self, bytes: &[u8], signature: &Signature) -> Result<PublicKey, SignatureError> {
        self.recover_digest(&self.digest(bytes), signature)
    }

    /// True only if the embedded recovery id yields `expected` and plain
    /// ECDSA verification against `expected` passes.
    pub fn verify_digest(&self, digest: &Digest, signature: &Signature, expected: &PublicKey) -> bool {
        let Some((_, sig)) = signature.to_ecdsa() else {
            return false;
        };
        let recovered = match self.recover_digest(digest, signature) {
            Ok(key) => key,
            Err(_) => return false,
        };

        recovered == *expected
            && expected
                .verifying_key()
                .verify_prehash(digest.as_slice(), &sig)
                .is_ok()
    }

    pub fn verify(&self, bytes: &[u8], signature: &Signature, expected: &PublicKey) -> bool {
        self.verify_digest(&self.digest(bytes), signature, expected)
    }
}

/// Deterministic low-s candidate for one attempt. Attempt 0 is plain
/// RFC 6979; later attempts pass the counter as additional data.
#[allow(deprecated)]
fn sign_candidate(
    scalar: &Scalar,
    z: &FieldBytes,
    attempt: u32,
) -> Result<EcdsaSignature, SignatureError> {
    let extra = if attempt == 0 {
        Vec::new()
    } else {
        attempt.to_be_bytes().to_vec()
    };
    let (candidate, _) =
        SignPrimitive::<Secp256k1>::try_sign_prehashed_rfc6979::<Sha256>(scalar, z, &extra)
            .map_err(|e| SignatureError::SigningFailure(e.to_string()))?;
    Ok(candidate.normalize_s().unwrap_or(candidate))
}

fn find_recoverable(
    digest: &Digest,
    candidate: &EcdsaSignature,
    expected: &PublicKey,
) -> Option<Signature> {
    (0u8..4).find_map(|id| {
        let recovery_id = RecoveryId::from_byte(id)?;
        let recovered =
            VerifyingKey::recover_from_prehash(digest.as_slice(), candidate, recovery_id).ok()?;
        (recovered == *expected.verifying_key()).then(|| Signature::from_parts(recovery_id, candidate))
    })
}

/// Signs a UTF-8 message: SHA-256 over the message bytes, no chain id.
pub fn sign_message(
    message: &str,
    key: &PrivateKey,
    ctx: &NetworkContext,
) -> Result<Signature, SignatureError> {
    SignatureEngine::for_messages(ctx).sign(message.as_bytes(), key)
}

/// Verifies a signature produced by [`sign_message`].
pub fn verify_message(
    message: &str,
    signature: &Signature,
    expected: &PublicKey,
    ctx: &NetworkContext,
) -> bool {
    SignatureEngine::for_messages(ctx).verify(message.as_bytes(), signature, expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIF: &str = "5J4KCbg1G3my9b9hCaQXnHSm6vrwW9xQTJS6ZciW2Kek7cCkCEk";

    fn key() -> PrivateKey {
        PrivateKey::from_wif(WIF).unwrap()
    }

    fn engine() -> SignatureEngine {
        SignatureEngine::from_context(&NetworkContext::bitshares())
    }

    #[test]
    fn sign_verify_message() {
        let ctx = NetworkContext::default();
        let key = key();
        let signature = sign_message("Foobar", &key, &ctx).unwrap();
        assert!(verify_message("Foobar", &signature, &key.public_key(), &ctx));
        assert!(!verify_message("Foobat", &signature, &key.public_key(), &ctx));
    }

    #[test]
    fn signatures_are_canonical_and_recoverable() {
        let key = key();
        let engine = engine();
        for i in 0u32..16 {
            let digest = Digest::sha256(&i.to_le_bytes());
            let signature = engine.sign_digest(&digest, &key).unwrap();
            assert!(signature.is_canonical());
            assert!(signature.recovery_id() < 4);
            assert_eq!(signature.header(), 31 + signature.recovery_id());
            assert_eq!(
                engine.recover_digest(&digest, &signature).unwrap(),
                key.public_key()
            );
        }
    }

    #[test]
    fn signing_is_deterministic() {
        let key = key();
        let digest = Digest::sha256(b"deterministic");
        let a = engine().sign_digest(&digest, &key).unwrap();
        let b = engine().sign_digest(&digest, &key).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn flipped_digest_bit_fails() {
        let key = key();
        let engine = engine();
        let digest = Digest::sha256(b"transfer");
        let signature = engine.sign_digest(&digest, &key).unwrap();
        assert!(engine.verify_digest(&digest, &signature, &key.public_key()));

        for bit in [0usize, 7, 100, 255] {
            let mut flipped = digest;
            flipped.0[bit / 8] ^= 1 << (bit % 8);
            assert!(!engine.verify_digest(&flipped, &signature, &key.public_key()));
        }
    }

    #[test]
    fn wrong_key_fails() {
        let engine = engine();
        let signature = engine.sign(b"payload", &key()).unwrap();
        let other = PrivateKey::generate().public_key();
        assert!(!engine.verify(b"payload", &signature, &other));
    }

    #[test]
    fn chain_id_binds_signature() {
        let key = key();
        let bitshares = engine();
        let other = SignatureEngine::from_context(&NetworkContext::default());
        let signature = bitshares.sign(b"tx", &key).unwrap();
        assert!(bitshares.verify(b"tx", &signature, &key.public_key()));
        assert!(!other.verify(b"tx", &signature, &key.public_key()));
    }

    #[test]
    fn wrong_recovery_id_fails() {
        let key = key();
        let engine = engine();
        let signed = engine.sign(b"payload", &key).unwrap();
        let signature =
            Signature::new(signed.recovery_id() ^ 1, *signed.r(), *signed.s()).unwrap();
        assert!(!engine.verify(b"payload", &signature, &key.public_key()));
    }

    #[test]
    fn malformed_signature_is_false_not_panic() {
        let key = key();
        let engine = engine();
        let zero = Signature::new(0, [0u8; 32], [0u8; 32]).unwrap();
        assert!(!engine.verify(b"payload", &zero, &key.public_key()));
        assert!(matches!(
            engine.recover(b"payload", &zero),
            Err(SignatureError::Malformed(_))
        ));

        let signed = engine.sign(b"payload", &key).unwrap();
        let wrong_r = Signature::new(signed.recovery_id(), [0xFFu8; 32], *signed.s()).unwrap();
        assert!(!engine.verify(b"payload", &wrong_r, &key.public_key()));
    }

    #[test]
    fn recovery_id_out_of_range_is_rejected() {
        for id in [4u8, 5, 9, 224, 230, 255] {
            assert!(matches!(
                Signature::new(id, [1u8; 32], [1u8; 32]),
                Err(SignatureError::Malformed(_))
            ));
        }
        for id in 0u8..4 {
            let signature = Signature::new(id, [1u8; 32], [1u8; 32]).unwrap();
            assert_eq!(signature.header(), 31 + id);
            assert_eq!(Signature::from_bytes(&signature.to_bytes()).unwrap(), signature);
        }
    }

    #[test]
    fn zero_attempts_fail() {
        let engine = SignatureEngine::new(DigestScheme::plain(), 0);
        assert_eq!(
            engine.sign(b"x", &key()),
            Err(SignatureError::SignatureRecoveryFailure { attempts: 0 })
        );
    }

    #[test]
    fn wire_and_hex_forms() {
        let signature = engine().sign(b"payload", &key()).unwrap();
        let bytes = signature.to_bytes();
        assert_eq!(bytes.len(), SIGNATURE_LEN);
        assert_eq!(bytes[0], signature.header());
        assert_eq!(Signature::from_bytes(&bytes).unwrap(), signature);

        let text = signature.to_string();
        assert_eq!(text.len(), 130);
        assert_eq!(text, text.to_lowercase());
        assert_eq!(text.parse::<Signature>().unwrap(), signature);
        assert_eq!(signature.describe_text(), text);
    }

    #[test]
    fn decode_rejects_bad_header() {
        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[0] = 0x01;
        assert_eq!(Signature::from_bytes(&bytes), Err(DecodeError::InvalidValue));
        assert!(matches!(
            "zz".parse::<Signature>(),
            Err(SignatureError::Malformed(_))
        ));
    }

    #[test]
    fn canonical_check() {
        let mut half = [0x01u8; 32];
        assert!(is_canonical_half(&half));
        half[0] = 0x80;
        assert!(!is_canonical_half(&half));
        half[0] = 0x00;
        half[1] = 0x7f;
        assert!(!is_canonical_half(&half));
        half[1] = 0x80;
        assert!(is_canonical_half(&half));
    }
}
