//! Object and vote identifiers.
//!
//! Objects are addressed as `space.type.instance` in the API, but only the
//! instance goes on the wire: the schema of the surrounding operation already
//! fixes which space and type a field refers to.

use crate::types::encoding::{Decode, DecodeError, Describe, Encode, EncodeSink, read_bytes};
use crate::types::error::CodecError;
use crate::types::varint::{decode_varint_from, encode_varint};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// Protocol object types and their numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    DynamicGlobalProperty,
    Reserved0,
    Account,
    Asset,
    ForceSettlement,
    CommitteeMember,
    Witness,
    LimitOrder,
    CallOrder,
    Custom,
    Proposal,
    OperationHistory,
    WithdrawPermission,
    VestingBalance,
    Worker,
    Balance,
}

impl ObjectType {
    const ALL: [ObjectType; 16] = [
        ObjectType::DynamicGlobalProperty,
        ObjectType::Reserved0,
        ObjectType::Account,
        ObjectType::Asset,
        ObjectType::ForceSettlement,
        ObjectType::CommitteeMember,
        ObjectType::Witness,
        ObjectType::LimitOrder,
        ObjectType::CallOrder,
        ObjectType::Custom,
        ObjectType::Proposal,
        ObjectType::OperationHistory,
        ObjectType::WithdrawPermission,
        ObjectType::VestingBalance,
        ObjectType::Worker,
        ObjectType::Balance,
    ];

    /// Numeric type code as it appears in the middle of an object id.
    pub const fn code(self) -> u8 {
        match self {
            ObjectType::DynamicGlobalProperty | ObjectType::Reserved0 => 0,
            ObjectType::Account => 2,
            ObjectType::Asset => 3,
            ObjectType::ForceSettlement => 4,
            ObjectType::CommitteeMember => 5,
            ObjectType::Witness => 6,
            ObjectType::LimitOrder => 7,
            ObjectType::CallOrder => 8,
            ObjectType::Custom => 9,
            ObjectType::Proposal => 10,
            ObjectType::OperationHistory => 11,
            ObjectType::WithdrawPermission => 12,
            ObjectType::VestingBalance => 13,
            ObjectType::Worker => 14,
            ObjectType::Balance => 15,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ObjectType::DynamicGlobalProperty => "dynamic_global_property",
            ObjectType::Reserved0 => "reserved0",
            ObjectType::Account => "account",
            ObjectType::Asset => "asset",
            ObjectType::ForceSettlement => "force_settlement",
            ObjectType::CommitteeMember => "committee_member",
            ObjectType::Witness => "witness",
            ObjectType::LimitOrder => "limit_order",
            ObjectType::CallOrder => "call_order",
            ObjectType::Custom => "custom",
            ObjectType::Proposal => "proposal",
            ObjectType::OperationHistory => "operation_history",
            ObjectType::WithdrawPermission => "withdraw_permission",
            ObjectType::VestingBalance => "vesting_balance",
            ObjectType::Worker => "worker",
            ObjectType::Balance => "balance",
        }
    }
}

impl FromStr for ObjectType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| CodecError::UnknownObjectType(s.to_string()))
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bare object instance number, encoded as a varint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(pub u64);

impl Encode for Id {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        encode_varint(self.0, out);
    }
}

impl Decode for Id {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        decode_varint_from(input).map(Id)
    }
}

impl Describe for Id {
    fn describe(&self) -> JsonValue {
        JsonValue::from(self.0)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Object identifier `space.type.instance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId {
    pub space: u8,
    pub type_id: u8,
    pub instance: Id,
}

impl ObjectId {
    pub fn new(space: u8, type_id: u8, instance: u64) -> Self {
        Self {
            space,
            type_id,
            instance: Id(instance),
        }
    }

    /// Parses `space.type.instance`.
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        let invalid = || CodecError::InvalidObjectId(s.to_string());

        let parts: Vec<&str> = s.split('.').collect();
        let [space, type_id, instance] = parts.as_slice() else {
            return Err(invalid());
        };

        Ok(Self {
            space: space.parse().map_err(|_| invalid())?,
            type_id: type_id.parse().map_err(|_| invalid())?,
            instance: Id(instance.parse().map_err(|_| invalid())?),
        })
    }

    /// Parses `s` and checks that its type matches `expected`.
    pub fn parse_typed(s: &str, expected: ObjectType) -> Result<Self, CodecError> {
        let id = Self::parse(s)?;
        id.expect_type(expected)?;
        Ok(id)
    }

    /// Fails with `TypeMismatch` unless the id's type code is `expected`'s.
    pub fn expect_type(&self, expected: ObjectType) -> Result<(), CodecError> {
        if self.type_id != expected.code() {
            return Err(CodecError::TypeMismatch {
                expected: expected.code(),
                got: self.type_id,
            });
        }
        Ok(())
    }

    /// Rebuilds an id from its wire instance, with space and type known
    /// from context.
    pub fn decode_with(space: u8, type_id: u8, input: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            space,
            type_id,
            instance: Id::decode(input)?,
        })
    }
}

impl Encode for ObjectId {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.instance.encode(out);
    }
}

impl Describe for ObjectId {
    fn describe(&self) -> JsonValue {
        JsonValue::String(self.to_string())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.space, self.type_id, self.instance)
    }
}

impl FromStr for ObjectId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse(s)
    }
}

/// Largest vote instance that fits next to the type byte.
pub const MAX_VOTE_INSTANCE: u32 = 0x00FF_FFFF;

/// Vote identifier `type:instance`, packed into 32 bits on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoteId {
    pub vote_type: u8,
    pub instance: u32,
}

impl VoteId {
    pub fn new(vote_type: u8, instance: u32) -> Result<Self, CodecError> {
        if instance > MAX_VOTE_INSTANCE {
            return Err(CodecError::InvalidVoteId(format!("{vote_type}:{instance}")));
        }
        Ok(Self {
            vote_type,
            instance,
        })
    }

    /// Parses `type:instance`.
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        let invalid = || CodecError::InvalidVoteId(s.to_string());

        let (vote_type, instance) = s.split_once(':').ok_or_else(invalid)?;
        let vote_type: u8 = vote_type.parse().map_err(|_| invalid())?;
        let instance: u32 = instance.parse().map_err(|_| invalid())?;
        Self::new(vote_type, instance).map_err(|_| invalid())
    }

    fn packed(&self) -> u32 {
        u32::from(self.vote_type) | (self.instance << 8)
    }
}

impl Encode for VoteId {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.packed().encode(out);
    }
}

impl Decode for VoteId {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(read_bytes(input, 4)?);
        let packed = u32::from_le_bytes(buf);
        Ok(Self {
            vote_type: (packed & 0xff) as u8,
            instance: packed >> 8,
        })
    }
}

impl Describe for VoteId {
    fn describe(&self) -> JsonValue {
        JsonValue::String(self.to_string())
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vote_type, self.instance)
    }
}

impl FromStr for VoteId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VoteId::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::varint::VarInt;

    #[test]
    fn object_type_codes() {
        assert_eq!("account".parse::<ObjectType>().unwrap(), ObjectType::Account);
        assert_eq!(ObjectType::Account.code(), 2);
        assert_eq!(ObjectType::OperationHistory.code(), 11);
        assert_eq!(ObjectType::Reserved0.code(), 0);
        assert_eq!(
            "wallet".parse::<ObjectType>(),
            Err(CodecError::UnknownObjectType("wallet".to_string()))
        );
    }

    #[test]
    fn object_type_names_roundtrip() {
        for t in ObjectType::ALL {
            assert_eq!(t.name().parse::<ObjectType>().unwrap(), t);
        }
    }

    #[test]
    fn object_id_typed_parse_encodes_instance() {
        let id = ObjectId::parse_typed("1.2.69585", ObjectType::Account).unwrap();
        assert_eq!(id.space, 1);
        assert_eq!(id.type_id, 2);
        assert_eq!(id.to_bytes(), VarInt(69585).to_bytes());
        assert_eq!(id.to_string(), "1.2.69585");
    }

    #[test]
    fn object_id_type_mismatch() {
        assert_eq!(
            ObjectId::parse_typed("1.2.69585", ObjectType::Asset),
            Err(CodecError::TypeMismatch {
                expected: 3,
                got: 2
            })
        );
    }

    #[test]
    fn object_id_rejects_malformed() {
        for bad in ["1.2", "1.2.3.4", "1.2.x", "1.2.-5", "", "a.b.c", "1..3"] {
            assert!(
                matches!(ObjectId::parse(bad), Err(CodecError::InvalidObjectId(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn object_id_decode_with_context() {
        let id: ObjectId = "1.3.121".parse().unwrap();
        let bytes = id.to_bytes();
        let mut input = bytes.as_slice();
        let decoded = ObjectId::decode_with(1, 3, &mut input).unwrap();
        assert_eq!(decoded, id);
        assert!(input.is_empty());
    }

    #[test]
    fn object_id_describes_as_string() {
        let id: ObjectId = "2.6.69585".parse().unwrap();
        assert_eq!(id.describe(), JsonValue::String("2.6.69585".to_string()));
    }

    #[test]
    fn vote_id_packing() {
        let vote = VoteId::parse("1:5").unwrap();
        assert_eq!(vote.to_bytes(), [0x01, 0x05, 0x00, 0x00]);

        let decoded = VoteId::from_bytes(&vote.to_bytes()).unwrap();
        assert_eq!(decoded.to_string(), "1:5");
        assert_eq!(VoteId::parse(&decoded.to_string()).unwrap(), vote);
    }

    #[test]
    fn vote_id_large_instance() {
        let vote = VoteId::parse("2:70000").unwrap();
        let packed = 2u32 | (70000 << 8);
        assert_eq!(vote.to_bytes(), packed.to_le_bytes());
        assert_eq!(VoteId::from_bytes(&vote.to_bytes()).unwrap(), vote);
    }

    #[test]
    fn vote_id_rejects_malformed() {
        for bad in ["1", "1:2:3", "a:1", "1:b", "256:1", "1:16777216", ""] {
            assert!(
                matches!(VoteId::parse(bad), Err(CodecError::InvalidVoteId(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn id_is_varint() {
        assert_eq!(Id(300).to_bytes(), [0xAC, 0x02]);
        assert_eq!(Id::from_bytes(&[0xAC, 0x02]).unwrap(), Id(300));
    }
}
