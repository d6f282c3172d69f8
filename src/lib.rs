//! Graphene blockchain core.
//!
//! Canonical wire codecs, recoverable secp256k1 signatures and memo
//! encryption for BitShares-family chains.
//!
//! ```
//! use graphene_core::config::NetworkContext;
//! use graphene_core::crypto::key_pair::PrivateKey;
//! use graphene_core::crypto::signature::{sign_message, verify_message};
//!
//! let ctx = NetworkContext::default();
//! let key = PrivateKey::from_wif("5J4KCbg1G3my9b9hCaQXnHSm6vrwW9xQTJS6ZciW2Kek7cCkCEk").unwrap();
//! let signature = sign_message("Foobar", &key, &ctx).unwrap();
//! assert!(verify_message("Foobar", &signature, &key.public_key(), &ctx));
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod fetch;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
