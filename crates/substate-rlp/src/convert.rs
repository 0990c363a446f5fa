//! `U256` values that must survive as fixed-length 32-byte wire fields
//! (so a nil-tag sentinel never collides with a genuine zero) are
//! round-tripped through [`substate_primitives::Hash`] instead of
//! RLP's own trimmed big-integer encoding.

use ethereum_types::U256;
use substate_primitives::Hash;

pub(crate) fn u256_to_hash(v: U256) -> Hash {
    let mut bytes = [0u8; 32];
    v.to_big_endian(&mut bytes);
    Hash::from_slice(&bytes)
}

pub(crate) fn hash_to_u256(h: Hash) -> U256 {
    U256::from_big_endian(h.as_bytes())
}
