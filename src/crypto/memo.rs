//! Transfer memo encryption.
//!
//! Sender and receiver derive the same secret from ECDH on their keys. The
//! AES-256-CBC key and IV come from hashing that secret together with a
//! per-memo nonce, and a 4-byte SHA-256 checksum of the plaintext is
//! encrypted in front of it so the receiver can tell a good decryption from
//! garbage.

use crate::config::NetworkContext;
use crate::crypto::key_pair::{KeyError, PrivateKey, PublicKey};
use crate::warn;
use aes::Aes256;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use graphene_derive::{BinaryCodec, Error};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Length of the plaintext checksum carried inside the ciphertext.
pub const CHECKSUM_LEN: usize = 4;

/// Errors from encrypting or decrypting memos.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoError {
    /// Decryption produced a payload whose checksum does not match.
    #[error("memo checksum mismatch")]
    MemoChecksumMismatch,
    /// Ciphertext could not be decrypted or unpadded.
    #[error("memo could not be decrypted")]
    MemoDecryptFailure,
    /// Decrypted payload is intact but not UTF-8 text.
    #[error("memo plaintext is not valid UTF-8")]
    InvalidUtf8,
    /// JSON memo record has a malformed field.
    #[error("invalid memo record: {0}")]
    InvalidRecord(String),
    #[error(transparent)]
    Key(KeyError),
}

impl MemoError {
    /// True for "not addressed to this key, or corrupted": the errors a
    /// scanner should render as a placeholder instead of aborting on.
    pub fn is_undecryptable(&self) -> bool {
        matches!(
            self,
            MemoError::MemoChecksumMismatch | MemoError::MemoDecryptFailure
        )
    }
}

impl From<KeyError> for MemoError {
    fn from(err: KeyError) -> Self {
        MemoError::Key(err)
    }
}

/// Encrypted memo payload and the checksum of its plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoCiphertext {
    pub ciphertext: Vec<u8>,
    pub checksum: u32,
}

/// `SHA-512(x(priv * pub))`. Symmetric in the two parties.
pub fn shared_secret(private: &PrivateKey, public: &PublicKey) -> Zeroizing<[u8; 64]> {
    let x = private.shared_x(public);
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&Sha512::digest(x.as_slice()));
    out
}

/// `SHA-512(decimal(nonce) || hex(shared))` split into a 32-byte key and a
/// 16-byte IV.
fn derive_key_iv(shared: &[u8; 64], nonce: u64) -> (Zeroizing<[u8; 32]>, [u8; 16]) {
    let mut hasher = Sha512::new();
    hasher.update(nonce.to_string().as_bytes());
    hasher.update(Zeroizing::new(hex::encode(shared)).as_bytes());
    let seed = Zeroizing::new(hasher.finalize().to_vec());

    let mut key = Zeroizing::new([0u8; 32]);
    let mut iv = [0u8; 16];
    key.copy_from_slice(&seed[..32]);
    iv.copy_from_slice(&seed[32..48]);
    (key, iv)
}

fn plaintext_checksum(plaintext: &[u8]) -> [u8; CHECKSUM_LEN] {
    let hash = Sha256::digest(plaintext);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&hash[..CHECKSUM_LEN]);
    out
}

/// Encrypts `plaintext` from `sender` to `receiver`.
pub fn encode_memo(
    sender: &PrivateKey,
    receiver: &PublicKey,
    nonce: u64,
    plaintext: &[u8],
) -> Result<MemoCiphertext, MemoError> {
    let shared = shared_secret(sender, receiver);
    let (key, iv) = derive_key_iv(&shared, nonce);

    let checksum = plaintext_checksum(plaintext);
    let mut payload = Zeroizing::new(Vec::with_capacity(CHECKSUM_LEN + plaintext.len()));
    payload.extend_from_slice(&checksum);
    payload.extend_from_slice(plaintext);

    let cipher = Aes256CbcEnc::new(&(*key).into(), &iv.into());
    Ok(MemoCiphertext {
        ciphertext: cipher.encrypt_padded_vec_mut::<Pkcs7>(&payload),
        checksum: u32::from_le_bytes(checksum),
    })
}

/// Decrypts a memo to raw bytes and checks its checksum.
pub fn decode_memo_bytes(
    receiver: &PrivateKey,
    sender: &PublicKey,
    nonce: u64,
    ciphertext: &[u8],
) -> Result<Vec<u8>, MemoError> {
    let shared = shared_secret(receiver, sender);
    let (key, iv) = derive_key_iv(&shared, nonce);

    let cipher = Aes256CbcDec::new(&(*key).into(), &iv.into());
    let payload = Zeroizing::new(
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| MemoError::MemoDecryptFailure)?,
    );
    if payload.len() < CHECKSUM_LEN {
        return Err(MemoError::MemoDecryptFailure);
    }

    let (checksum, plaintext) = payload.split_at(CHECKSUM_LEN);
    if plaintext_checksum(plaintext)[..] != *checksum {
        warn!("Memo checksum mismatch (nonce {nonce})");
        return Err(MemoError::MemoChecksumMismatch);
    }

    Ok(plaintext.to_vec())
}

/// Decrypts a memo to text.
pub fn decode_memo(
    receiver: &PrivateKey,
    sender: &PublicKey,
    nonce: u64,
    ciphertext: &[u8],
) -> Result<String, MemoError> {
    let bytes = decode_memo_bytes(receiver, sender, nonce, ciphertext)?;
    String::from_utf8(bytes).map_err(|_| MemoError::InvalidUtf8)
}

/// Fresh random memo nonce.
pub fn generate_nonce() -> u64 {
    OsRng.next_u64()
}

/// Memo as attached to a transfer operation.
///
/// Wire form: `from || to || u64 nonce || varint(len) || message`. The
/// checksum travels inside `message` and is kept here for callers only.
#[derive(Debug, Clone, PartialEq, Eq, BinaryCodec)]
pub struct Memo {
    pub from: PublicKey,
    pub to: PublicKey,
    pub nonce: u64,
    pub message: Vec<u8>,
    #[binary_codec(skip)]
    pub checksum: u32,
}

impl Memo {
    /// Encrypts `plaintext` from `sender` to `to` under `nonce`.
    pub fn encrypt(
        sender: &PrivateKey,
        to: &PublicKey,
        nonce: u64,
        plaintext: &str,
    ) -> Result<Self, MemoError> {
        let encrypted = encode_memo(sender, to, nonce, plaintext.as_bytes())?;
        Ok(Self {
            from: sender.public_key(),
            to: *to,
            nonce,
            message: encrypted.ciphertext,
            checksum: encrypted.checksum,
        })
    }

    /// Decrypts with either party's key.
    ///
    /// The receiver pairs its key with `from`; the sender pairs its key with
    /// `to`. Any other key is tried against `from` and fails the checksum.
    pub fn decrypt(&self, key: &PrivateKey) -> Result<String, MemoError> {
        let counterparty = if key.public_key() == self.from {
            &self.to
        } else {
            &self.from
        };
        decode_memo(key, counterparty, self.nonce, &self.message)
    }

    pub fn to_record(&self, ctx: &NetworkContext) -> MemoRecord {
        MemoRecord {
            from: self.from.to_base58(ctx),
            to: self.to.to_base58(ctx),
            nonce: self.nonce,
            message: hex::encode(&self.message),
            checksum: self.checksum,
        }
    }

    pub fn from_record(record: &MemoRecord, ctx: &NetworkContext) -> Result<Self, MemoError> {
        Ok(Self {
            from: PublicKey::from_base58(&record.from, ctx)?,
            to: PublicKey::from_base58(&record.to, ctx)?,
            nonce: record.nonce,
            message: hex::decode(&record.message)
                .map_err(|e| MemoError::InvalidRecord(format!("message: {e}")))?,
            checksum: record.checksum,
        })
    }
}

/// JSON shape of a memo in operations returned by the node API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoRecord {
    pub from: String,
    pub to: String,
    /// Nodes emit large nonces as decimal strings.
    #[serde(deserialize_with = "nonce_from_number_or_string")]
    pub nonce: u64,
    /// Ciphertext as hex.
    pub message: String,
    #[serde(default)]
    pub checksum: u32,
}

fn nonce_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Nonce {
        Number(u64),
        Text(String),
    }

    match Nonce::deserialize(deserializer)? {
        Nonce::Number(n) => Ok(n),
        Nonce::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
