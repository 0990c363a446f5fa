//! Wire shapes for `Env`. Legacy and Berlin substates share a 6-field
//! shape with no fee fields at all; London and Cancun substates share
//! an 8-field shape where `base_fee` and `blob_base_fee` are each
//! independently nil-taggable — the two hard forks are, at the wire
//! level, the same struct, distinguished only by which optional fields
//! happen to be populated — Cancun is an extension of London here,
//! not a fifth shape.

use std::collections::BTreeMap;

use ethereum_types::{H256, U256};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use substate_primitives::{Address, Env, Hash};

use crate::convert::{hash_to_u256, u256_to_hash};
use crate::optional::{append_opt, decode_opt};

fn block_hashes_to_pairs(m: &BTreeMap<u64, Hash>) -> Vec<(Hash, Hash)> {
    m.iter()
        .map(|(num, hash)| (Hash::from(H256::from_low_u64_be(*num)), *hash))
        .collect()
}

fn pairs_to_block_hashes(pairs: &[(Hash, Hash)]) -> substate_primitives::Result<BTreeMap<u64, Hash>> {
    let mut out = BTreeMap::new();
    for (num_hash, hash) in pairs {
        let bytes = num_hash.as_bytes();
        if !bytes[..24].iter().all(|&b| b == 0) {
            return Err(substate_primitives::Error::Corruption(
                "block_hashes entry's block number overflows u64".into(),
            ));
        }
        let num = u64::from_be_bytes(bytes[24..32].try_into().unwrap());
        out.insert(num, *hash);
    }
    Ok(out)
}

fn encode_block_hashes(s: &mut RlpStream, pairs: &[(Hash, Hash)]) {
    s.begin_list(pairs.len());
    for (num, hash) in pairs {
        s.begin_list(2);
        s.append(num);
        s.append(hash);
    }
}

fn decode_block_hashes(rlp: &Rlp) -> Result<Vec<(Hash, Hash)>, DecoderError> {
    let mut out = Vec::with_capacity(rlp.item_count()?);
    for pair in rlp.iter() {
        if pair.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        out.push((pair.val_at(0)?, pair.val_at(1)?));
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct WireEnvLegacy {
    pub coinbase: Address,
    pub difficulty: U256,
    pub gas_limit: u64,
    pub number: u64,
    pub timestamp: u64,
    pub block_hashes: Vec<(Hash, Hash)>,
}

impl Encodable for WireEnvLegacy {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(6);
        s.append(&self.coinbase);
        s.append(&self.difficulty);
        s.append(&self.gas_limit);
        s.append(&self.number);
        s.append(&self.timestamp);
        encode_block_hashes(s, &self.block_hashes);
    }
}

impl Decodable for WireEnvLegacy {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 6 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(WireEnvLegacy {
            coinbase: rlp.val_at(0)?,
            difficulty: rlp.val_at(1)?,
            gas_limit: rlp.val_at(2)?,
            number: rlp.val_at(3)?,
            timestamp: rlp.val_at(4)?,
            block_hashes: decode_block_hashes(&rlp.at(5)?)?,
        })
    }
}

impl From<&Env> for WireEnvLegacy {
    fn from(env: &Env) -> Self {
        WireEnvLegacy {
            coinbase: env.coinbase,
            difficulty: env.difficulty,
            gas_limit: env.gas_limit,
            number: env.number,
            timestamp: env.timestamp,
            block_hashes: block_hashes_to_pairs(&env.block_hashes),
        }
    }
}

impl WireEnvLegacy {
    pub(crate) fn into_domain(self) -> substate_primitives::Result<Env> {
        Ok(Env {
            coinbase: self.coinbase,
            difficulty: self.difficulty,
            gas_limit: self.gas_limit,
            number: self.number,
            timestamp: self.timestamp,
            block_hashes: pairs_to_block_hashes(&self.block_hashes)?,
            base_fee: None,
            blob_base_fee: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct WireEnvModern {
    pub coinbase: Address,
    pub difficulty: U256,
    pub gas_limit: u64,
    pub number: u64,
    pub timestamp: u64,
    pub block_hashes: Vec<(Hash, Hash)>,
    /// Missing in records written before EIP-1559 support landed, even
    /// within the London range.
    pub base_fee: Option<Hash>,
    /// Missing before Cancun.
    pub blob_base_fee: Option<Hash>,
}

impl Encodable for WireEnvModern {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(8);
        s.append(&self.coinbase);
        s.append(&self.difficulty);
        s.append(&self.gas_limit);
        s.append(&self.number);
        s.append(&self.timestamp);
        encode_block_hashes(s, &self.block_hashes);
        append_opt(s, &self.base_fee);
        append_opt(s, &self.blob_base_fee);
    }
}

impl Decodable for WireEnvModern {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 8 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(WireEnvModern {
            coinbase: rlp.val_at(0)?,
            difficulty: rlp.val_at(1)?,
            gas_limit: rlp.val_at(2)?,
            number: rlp.val_at(3)?,
            timestamp: rlp.val_at(4)?,
            block_hashes: decode_block_hashes(&rlp.at(5)?)?,
            base_fee: decode_opt(&rlp.at(6)?)?,
            blob_base_fee: decode_opt(&rlp.at(7)?)?,
        })
    }
}

impl From<&Env> for WireEnvModern {
    fn from(env: &Env) -> Self {
        WireEnvModern {
            coinbase: env.coinbase,
            difficulty: env.difficulty,
            gas_limit: env.gas_limit,
            number: env.number,
            timestamp: env.timestamp,
            block_hashes: block_hashes_to_pairs(&env.block_hashes),
            base_fee: env.base_fee.map(u256_to_hash),
            blob_base_fee: env.blob_base_fee.map(u256_to_hash),
        }
    }
}

impl WireEnvModern {
    pub(crate) fn into_domain(self) -> substate_primitives::Result<Env> {
        Ok(Env {
            coinbase: self.coinbase,
            difficulty: self.difficulty,
            gas_limit: self.gas_limit,
            number: self.number,
            timestamp: self.timestamp,
            block_hashes: pairs_to_block_hashes(&self.block_hashes)?,
            base_fee: self.base_fee.map(hash_to_u256),
            blob_base_fee: self.blob_base_fee.map(hash_to_u256),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_env() -> Env {
        let mut block_hashes = BTreeMap::new();
        block_hashes.insert(41, Hash::keccak256(b"forty-one"));
        block_hashes.insert(42, Hash::keccak256(b"forty-two"));
        Env {
            coinbase: Address::from_slice(&[7; 20]),
            difficulty: U256::from(1_000_000u64),
            gas_limit: 30_000_000,
            number: 42,
            timestamp: 1_700_000_000,
            block_hashes,
            base_fee: Some(U256::from(7u64)),
            blob_base_fee: None,
        }
    }

    #[test]
    fn modern_env_round_trips_with_one_optional_field_absent() {
        let env = sample_env();
        let wire = WireEnvModern::from(&env);
        let bytes = rlp::encode(&wire);
        let decoded: WireEnvModern = Rlp::new(&bytes).as_val().unwrap();
        assert_eq!(decoded.clone().into_domain().unwrap(), env);
        assert!(decoded.blob_base_fee.is_none());
    }

    #[test]
    fn legacy_env_has_no_fee_fields_on_the_wire() {
        let env = sample_env();
        let wire = WireEnvLegacy::from(&env);
        let back = wire.into_domain().unwrap();
        assert!(back.base_fee.is_none());
        assert!(back.blob_base_fee.is_none());
        assert_eq!(back.block_hashes, env.block_hashes);
    }
}
