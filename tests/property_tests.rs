//! Property-based tests for the wire codecs and signing.

#![allow(clippy::unwrap_used)]

use graphene_core::config::NetworkContext;
use graphene_core::crypto::key_pair::PrivateKey;
use graphene_core::crypto::signature::SignatureEngine;
use graphene_core::types::composite::{Array, Optional};
use graphene_core::types::encoding::{Decode, Encode};
use graphene_core::types::hash::Digest;
use graphene_core::types::ids::{ObjectId, VoteId};
use graphene_core::types::primitives::Text;
use graphene_core::types::varint::{VarInt, decode_varint};
use proptest::prelude::*;

// Property: varint decode inverts encode and consumes every byte
proptest! {
    #[test]
    fn prop_varint_roundtrip(n in any::<u64>()) {
        let bytes = VarInt(n).to_bytes();
        prop_assert_eq!(decode_varint(&bytes).unwrap(), (n, bytes.len()));
    }
}

// Property: varint encoding is minimal
proptest! {
    #[test]
    fn prop_varint_minimal(n in any::<u64>()) {
        let bytes = VarInt(n).to_bytes();
        let bits = 64 - n.leading_zeros() as usize;
        prop_assert_eq!(bytes.len(), bits.div_ceil(7).max(1));
        prop_assert_eq!(bytes[bytes.len() - 1] & 0x80, 0);
        for byte in &bytes[..bytes.len() - 1] {
            prop_assert_eq!(byte & 0x80, 0x80);
        }
    }
}

// Property: object ids encode only their instance
proptest! {
    #[test]
    fn prop_object_id_wire_is_instance(space in 0u8..3, type_id in 0u8..16, instance in any::<u64>()) {
        let text = format!("{space}.{type_id}.{instance}");
        let id: ObjectId = text.parse().unwrap();
        prop_assert_eq!(id.to_string(), text);
        prop_assert_eq!(id.to_bytes(), VarInt(instance).to_bytes());
    }
}

// Property: vote ids pack type and instance into four bytes
proptest! {
    #[test]
    fn prop_vote_id_packing(vote_type in any::<u8>(), instance in 0u32..=0x00FF_FFFF) {
        let vote = VoteId::parse(&format!("{vote_type}:{instance}")).unwrap();
        let bytes = vote.to_bytes();
        prop_assert_eq!(bytes.clone(), (u32::from(vote_type) | (instance << 8)).to_le_bytes().to_vec());
        prop_assert_eq!(VoteId::from_bytes(&bytes).unwrap(), vote);
    }
}

// Property: arrays are a varint count followed by the element encodings
proptest! {
    #[test]
    fn prop_array_layout(items in prop::collection::vec(any::<u16>(), 0..300)) {
        let array = Array::new(items.clone());
        let mut expected = VarInt(items.len() as u64).to_bytes();
        for item in &items {
            expected.extend(item.to_le_bytes());
        }
        prop_assert_eq!(array.to_bytes(), expected);
        prop_assert_eq!(Array::<u16>::from_bytes(&array.to_bytes()).unwrap(), array);
    }
}

// Property: text is one byte per character and survives encode and decode
proptest! {
    #[test]
    fn prop_text_roundtrip(s in ".{0,200}") {
        let text = Text::new(&s);
        prop_assert!(text.as_str().is_ascii());
        let bytes = text.to_bytes();
        prop_assert_eq!(&bytes[bytes.len() - text.as_str().len()..], text.as_str().as_bytes());
        prop_assert_eq!(Text::from_bytes(&bytes).unwrap(), text);
    }
}

// Property: a present, non-empty optional is flag byte plus payload
proptest! {
    #[test]
    fn prop_optional_layout(value in proptest::option::of(any::<u32>())) {
        let optional = Optional(value);
        let bytes = optional.to_bytes();
        match value {
            Some(v) => {
                prop_assert_eq!(bytes[0], 0x01);
                prop_assert_eq!(&bytes[1..], &v.to_le_bytes()[..]);
            }
            None => {
                prop_assert_eq!(bytes, vec![0x00]);
            }
        }
    }
}

// Property: sign then verify holds, and a flipped digest bit fails
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn prop_sign_verify(data in prop::collection::vec(any::<u8>(), 0..256), bit in 0usize..256) {
        let key = PrivateKey::from_wif("5J4KCbg1G3my9b9hCaQXnHSm6vrwW9xQTJS6ZciW2Kek7cCkCEk").unwrap();
        let engine = SignatureEngine::from_context(&NetworkContext::bitshares());
        let digest = Digest::sha256(&data);

        let signature = engine.sign_digest(&digest, &key).unwrap();
        prop_assert!(signature.is_canonical());
        prop_assert!(engine.verify_digest(&digest, &signature, &key.public_key()));

        let mut flipped = digest;
        flipped.0[bit / 8] ^= 1 << (bit % 8);
        prop_assert!(!engine.verify_digest(&flipped, &signature, &key.public_key()));
    }
}
