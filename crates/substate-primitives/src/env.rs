//! Block-level execution environment.

use std::collections::BTreeMap;

use ethereum_types::U256;

use crate::hash::{Address, Hash};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Env {
    pub coinbase: Address,
    pub difficulty: U256,
    pub gas_limit: u64,
    pub number: u64,
    pub timestamp: u64,
    pub block_hashes: BTreeMap<u64, Hash>,
    /// Absent pre-London (EIP-1559).
    pub base_fee: Option<U256>,
    /// Absent pre-Cancun (EIP-4844).
    pub blob_base_fee: Option<U256>,
}

impl Env {
    pub fn is_london_or_later(&self) -> bool {
        self.base_fee.is_some()
    }

    pub fn is_cancun_or_later(&self) -> bool {
        self.blob_base_fee.is_some()
    }
}
