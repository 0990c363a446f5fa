//! On-disk key schema. All multi-byte integers are big-endian so that
//! lexicographic byte order equals numeric order.

pub const CODE_PREFIX: &[u8] = b"1c";
pub const SUBSTATE_PREFIX: &[u8] = b"1s";
pub const UPDATE_SET_PREFIX: &[u8] = b"2s";
pub const DESTROYED_PREFIX: &[u8] = b"da";
pub const METADATA_INTERVAL_KEY: &[u8] = b"mdusin";
pub const METADATA_SIZE_KEY: &[u8] = b"mdussi";

pub const SUBSTATE_KEY_LEN: usize = 2 + 8 + 8;
pub const DESTROYED_KEY_LEN: usize = 2 + 8 + 4;

use substate_primitives::Hash;

pub fn code_key(hash: &Hash) -> Vec<u8> {
    let mut k = Vec::with_capacity(CODE_PREFIX.len() + Hash::LEN);
    k.extend_from_slice(CODE_PREFIX);
    k.extend_from_slice(hash.as_bytes());
    k
}

/// `tx` is logically 32-bit but is encoded in 64 bits for forward
/// compatibility.
pub fn substate_key(block: u64, tx: u32) -> Vec<u8> {
    let mut k = Vec::with_capacity(SUBSTATE_KEY_LEN);
    k.extend_from_slice(SUBSTATE_PREFIX);
    k.extend_from_slice(&block.to_be_bytes());
    k.extend_from_slice(&(tx as u64).to_be_bytes());
    k
}

pub fn substate_block_prefix(block: u64) -> Vec<u8> {
    let mut k = Vec::with_capacity(SUBSTATE_PREFIX.len() + 8);
    k.extend_from_slice(SUBSTATE_PREFIX);
    k.extend_from_slice(&block.to_be_bytes());
    k
}

pub fn update_set_key(block: u64) -> Vec<u8> {
    let mut k = Vec::with_capacity(UPDATE_SET_PREFIX.len() + 8);
    k.extend_from_slice(UPDATE_SET_PREFIX);
    k.extend_from_slice(&block.to_be_bytes());
    k
}

pub fn destroyed_key(block: u64, tx: u32) -> Vec<u8> {
    let mut k = Vec::with_capacity(DESTROYED_KEY_LEN);
    k.extend_from_slice(DESTROYED_PREFIX);
    k.extend_from_slice(&block.to_be_bytes());
    k.extend_from_slice(&tx.to_be_bytes());
    k
}

/// Splits a substate key's 16-byte suffix into `(block, tx)`, rejecting
/// keys with the wrong prefix or length.
pub fn parse_substate_key(key: &[u8]) -> substate_primitives::Result<(u64, u32)> {
    if key.len() != SUBSTATE_KEY_LEN || &key[..2] != SUBSTATE_PREFIX {
        return Err(substate_primitives::Error::KeyFormat(format!(
            "not a substate key: {key:?}"
        )));
    }
    let block = u64::from_be_bytes(key[2..10].try_into().unwrap());
    let tx_wide = u64::from_be_bytes(key[10..18].try_into().unwrap());
    let tx = u32::try_from(tx_wide).map_err(|_| {
        substate_primitives::Error::Corruption(format!("substate key tx overflows u32: {tx_wide}"))
    })?;
    Ok((block, tx))
}

pub fn parse_update_set_key(key: &[u8]) -> substate_primitives::Result<u64> {
    if key.len() != UPDATE_SET_PREFIX.len() + 8 || &key[..2] != UPDATE_SET_PREFIX {
        return Err(substate_primitives::Error::KeyFormat(format!(
            "not an update-set key: {key:?}"
        )));
    }
    Ok(u64::from_be_bytes(key[2..10].try_into().unwrap()))
}

pub fn parse_destroyed_key(key: &[u8]) -> substate_primitives::Result<(u64, u32)> {
    if key.len() != DESTROYED_KEY_LEN || &key[..2] != DESTROYED_PREFIX {
        return Err(substate_primitives::Error::KeyFormat(format!(
            "not a destroyed-account key: {key:?}"
        )));
    }
    let block = u64::from_be_bytes(key[2..10].try_into().unwrap());
    let tx = u32::from_be_bytes(key[10..14].try_into().unwrap());
    Ok((block, tx))
}
