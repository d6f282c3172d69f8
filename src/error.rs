//! Crate-level error wrapping every module's error type.

use crate::config::ConfigError;
use crate::crypto::key_pair::KeyError;
use crate::crypto::memo::MemoError;
use crate::crypto::signature::SignatureError;
use crate::fetch::FetchError;
use crate::types::encoding::DecodeError;
use crate::types::error::CodecError;
use graphene_derive::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(DecodeError),
    #[error(transparent)]
    Codec(CodecError),
    #[error(transparent)]
    Key(KeyError),
    #[error(transparent)]
    Signature(SignatureError),
    #[error(transparent)]
    Memo(MemoError),
    #[error(transparent)]
    Config(ConfigError),
    #[error(transparent)]
    Fetch(FetchError),
}

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! impl_from {
    ($($variant:ident($t:ty)),* $(,)?) => {
        $(
            impl From<$t> for Error {
                fn from(err: $t) -> Self {
                    Error::$variant(err)
                }
            }
        )*
    };
}

impl_from!(
    Decode(DecodeError),
    Codec(CodecError),
    Key(KeyError),
    Signature(SignatureError),
    Memo(MemoError),
    Config(ConfigError),
    Fetch(FetchError),
);
