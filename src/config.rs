//! Network context: address prefix, chain id and signing parameters.
//!
//! Nothing in the crate reads a global prefix or chain id. Every key
//! rendering and signing call takes a [`NetworkContext`], which can be built
//! from defaults, a preset, TOML or environment variables.

use crate::info;
use crate::types::hash::{DigestScheme, HashAlgorithm};
use graphene_derive::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Chain id length in bytes.
pub const CHAIN_ID_LEN: usize = 32;

/// Upper bound accepted for `max_signing_attempts`.
pub const MAX_SIGNING_ATTEMPTS_LIMIT: u32 = 1_000_000;

pub const ENV_PREFIX: &str = "GRAPHENE_PREFIX";
pub const ENV_CHAIN_ID: &str = "GRAPHENE_CHAIN_ID";
pub const ENV_HASH: &str = "GRAPHENE_HASH";
pub const ENV_MAX_SIGNING_ATTEMPTS: &str = "GRAPHENE_MAX_SIGNING_ATTEMPTS";

const BITSHARES_CHAIN_ID: &str = "4018d7844c78f6a6c41c6a552b898022310fc5dec06da467ee7905a8dad512c8";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("config i/o error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Parameters that tie keys and signatures to one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkContext {
    /// Public key prefix, e.g. `BTS`.
    pub prefix: String,
    /// Chain id, prepended to every transaction before hashing.
    #[serde(with = "chain_id_hex")]
    pub chain_id: [u8; CHAIN_ID_LEN],
    /// Hash used for signing digests.
    pub hash: HashAlgorithm,
    /// How many nonces to try before giving up on a canonical signature.
    pub max_signing_attempts: u32,
}

impl Default for NetworkContext {
    fn default() -> Self {
        Self {
            prefix: "GPH".to_string(),
            chain_id: [0u8; CHAIN_ID_LEN],
            hash: HashAlgorithm::Sha256,
            max_signing_attempts: 256,
        }
    }
}

impl NetworkContext {
    /// BitShares mainnet.
    pub fn bitshares() -> Self {
        let mut chain_id = [0u8; CHAIN_ID_LEN];
        // Constant is well-formed hex of the right length.
        if let Ok(bytes) = hex::decode(BITSHARES_CHAIN_ID) {
            chain_id.copy_from_slice(&bytes);
        }
        Self {
            prefix: "BTS".to_string(),
            chain_id,
            ..Self::default()
        }
    }

    /// Default context with a different key prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Loads a context from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let ctx = Self::from_toml(&content)?;
        info!(
            "Loaded network context from {} (prefix {})",
            path.display(),
            ctx.prefix
        );
        Ok(ctx)
    }

    /// Parses a context from TOML text; missing fields keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Writes the context as TOML.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml()?)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))
    }

    /// Default context with `GRAPHENE_*` environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut ctx = Self::default();
        ctx.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(ctx)
    }

    /// Applies `GRAPHENE_*` overrides read through `lookup`.
    ///
    /// Unset variables leave the field untouched; set but unparsable ones
    /// fail with [`ConfigError::Parse`].
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup(ENV_PREFIX) {
            self.prefix = prefix;
        }

        if let Some(chain_id) = lookup(ENV_CHAIN_ID) {
            self.chain_id = chain_id_hex::parse(&chain_id)
                .map_err(|e| ConfigError::Parse(format!("{ENV_CHAIN_ID}: {e}")))?;
        }

        if let Some(hash) = lookup(ENV_HASH) {
            self.hash = HashAlgorithm::parse(&hash)
                .ok_or_else(|| ConfigError::Parse(format!("{ENV_HASH}: unknown hash {hash}")))?;
        }

        if let Some(attempts) = lookup(ENV_MAX_SIGNING_ATTEMPTS) {
            self.max_signing_attempts = attempts
                .parse()
                .map_err(|e| ConfigError::Parse(format!("{ENV_MAX_SIGNING_ATTEMPTS}: {e}")))?;
        }

        Ok(())
    }

    /// Checks the context for values no network would accept.
    ///
    /// Returns a list of problems. Empty list means the context is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.prefix.is_empty() {
            errors.push("Key prefix cannot be empty".to_string());
        } else if !self.prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            errors.push(format!(
                "Key prefix must be ASCII alphanumeric, got {:?}",
                self.prefix
            ));
        }

        if self.max_signing_attempts == 0 {
            errors.push("Max signing attempts must be greater than 0".to_string());
        } else if self.max_signing_attempts > MAX_SIGNING_ATTEMPTS_LIMIT {
            errors.push(format!(
                "Max signing attempts {} exceeds limit {MAX_SIGNING_ATTEMPTS_LIMIT}",
                self.max_signing_attempts
            ));
        }

        errors
    }

    pub fn validate_strict(&self) -> Result<(), ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors.join("; ")))
        }
    }

    pub fn chain_id_hex(&self) -> String {
        hex::encode(self.chain_id)
    }

    /// Digest scheme for transactions: chain id as the domain.
    pub fn transaction_scheme(&self) -> DigestScheme {
        DigestScheme::new(self.hash, self.chain_id.to_vec())
    }

    /// Digest scheme for free-form messages: no domain.
    pub fn message_scheme(&self) -> DigestScheme {
        DigestScheme::new(self.hash, Vec::new())
    }
}

mod chain_id_hex {
    use super::CHAIN_ID_LEN;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(s: &str) -> Result<[u8; CHAIN_ID_LEN], String> {
        let bytes = hex::decode(s).map_err(|e| e.to_string())?;
        bytes
            .try_into()
            .map_err(|b: Vec<u8>| format!("chain id must be {CHAIN_ID_LEN} bytes, got {}", b.len()))
    }

    pub fn serialize<S>(chain_id: &[u8; CHAIN_ID_LEN], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(chain_id))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; CHAIN_ID_LEN], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_context_validates() {
        let ctx = NetworkContext::default();
        assert!(ctx.validate().is_empty());
        assert_eq!(ctx.prefix, "GPH");
        assert_eq!(ctx.chain_id, [0u8; 32]);
        assert_eq!(ctx.max_signing_attempts, 256);
    }

    #[test]
    fn bitshares_preset() {
        let ctx = NetworkContext::bitshares();
        assert_eq!(ctx.prefix, "BTS");
        assert_eq!(ctx.chain_id_hex(), BITSHARES_CHAIN_ID);
        assert!(ctx.validate_strict().is_ok());
    }

    #[test]
    fn toml_partial_keeps_defaults() {
        let ctx = NetworkContext::from_toml(
            r#"
            prefix = "TEST"
            hash = "sha3_256"
            "#,
        )
        .unwrap();
        assert_eq!(ctx.prefix, "TEST");
        assert_eq!(ctx.hash, HashAlgorithm::Sha3_256);
        assert_eq!(ctx.max_signing_attempts, 256);
    }

    #[test]
    fn toml_roundtrip() {
        let ctx = NetworkContext::bitshares();
        let parsed = NetworkContext::from_toml(&ctx.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, ctx);
    }

    #[test]
    fn toml_bad_chain_id() {
        let result = NetworkContext::from_toml(r#"chain_id = "abcd""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        let result = NetworkContext::from_toml(r#"hash = "md5""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_PREFIX, "BTS"),
            (ENV_CHAIN_ID, BITSHARES_CHAIN_ID),
            (ENV_MAX_SIGNING_ATTEMPTS, "16"),
        ]
        .into_iter()
        .collect();

        let mut ctx = NetworkContext::default();
        ctx.apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(ctx.prefix, "BTS");
        assert_eq!(ctx.chain_id, NetworkContext::bitshares().chain_id);
        assert_eq!(ctx.max_signing_attempts, 16);
        assert_eq!(ctx.hash, HashAlgorithm::Sha256);
    }

    #[test]
    fn override_parse_failure() {
        let mut ctx = NetworkContext::default();
        let result = ctx.apply_overrides(|k| {
            (k == ENV_MAX_SIGNING_ATTEMPTS).then(|| "many".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn validation_reports_problems() {
        let mut ctx = NetworkContext::with_prefix("");
        ctx.max_signing_attempts = 0;
        let errors = ctx.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("cannot be empty")));
        assert!(errors.iter().any(|e| e.contains("greater than 0")));
        assert!(matches!(ctx.validate_strict(), Err(ConfigError::Invalid(_))));

        let ctx = NetworkContext::with_prefix("B-S");
        assert!(ctx.validate()[0].contains("alphanumeric"));
    }

    #[test]
    fn schemes_use_chain_id_only_for_transactions() {
        let ctx = NetworkContext::bitshares();
        assert_eq!(ctx.transaction_scheme().domain, ctx.chain_id.to_vec());
        assert!(ctx.message_scheme().domain.is_empty());
    }
}
