use crate::types::encoding::DecodeError;
use graphene_derive::Error;

/// Errors raised while building or parsing codec values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Object id is not of the form `space.type.instance`.
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),
    /// Symbolic object type name is not known.
    #[error("unknown object type: {0}")]
    UnknownObjectType(String),
    /// Object id belongs to a different object type than requested.
    #[error("object id does not match object type: expected {expected}, got {got}")]
    TypeMismatch { expected: u8, got: u8 },
    /// Vote id is not of the form `type:instance`.
    #[error("invalid vote id: {0}")]
    InvalidVoteId(String),
    /// Timestamp is not of the form `%Y-%m-%dT%H:%M:%S` or out of range.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Byte string is not valid hex.
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    /// Codec exists in the type system but has no wire implementation.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    #[error(transparent)]
    Decode(DecodeError),
}

impl From<DecodeError> for CodecError {
    fn from(err: DecodeError) -> Self {
        CodecError::Decode(err)
    }
}
