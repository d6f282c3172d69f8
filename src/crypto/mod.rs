//! Keys, recoverable signatures and memo encryption on secp256k1.

pub mod key_pair;
pub mod memo;
pub mod signature;
