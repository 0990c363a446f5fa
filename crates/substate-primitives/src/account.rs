//! Account: `{nonce, balance, storage, code}`, keyed by [`Address`] inside
//! a [`crate::WorldState`].

use std::collections::BTreeMap;

use ethereum_types::U256;

use crate::hash::{Hash, KECCAK_EMPTY};

/// An account as read or written by a transaction.
///
/// Storage is a `BTreeMap` rather than a `HashMap` so that equality and
/// iteration order are both deterministic — the RLP codec relies on
/// exactly this ordering to sort `storage` entries ascending by key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Account {
    pub nonce: u64,
    pub balance: U256,
    pub storage: BTreeMap<Hash, Hash>,
    pub code: Vec<u8>,
}

impl Account {
    pub fn new(nonce: u64, balance: U256, storage: BTreeMap<Hash, Hash>, code: Vec<u8>) -> Self {
        Account {
            nonce,
            balance,
            storage,
            code,
        }
    }

    /// `keccak256(code)`, or the well-known empty-code hash when `code`
    /// is empty.
    pub fn code_hash(&self) -> Hash {
        if self.code.is_empty() {
            KECCAK_EMPTY
        } else {
            Hash::keccak256(&self.code)
        }
    }

    /// `true` if this account has no deployed bytecode — used by the
    /// task pool's `skip_transfer`/`skip_call` filters.
    pub fn is_contract(&self) -> bool {
        !self.code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_code_hashes_to_the_well_known_constant() {
        let acc = Account::default();
        assert_eq!(acc.code_hash(), KECCAK_EMPTY);
        assert!(!acc.is_contract());
    }

    #[test]
    fn nonempty_code_hashes_via_keccak() {
        let acc = Account {
            code: vec![0x60, 0x01],
            ..Default::default()
        };
        assert_eq!(acc.code_hash(), Hash::keccak256(&[0x60, 0x01]));
        assert!(acc.is_contract());
    }
}
