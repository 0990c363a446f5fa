//! WorldState: the subset of accounts touched by a transaction or block.
//!
//! Grounded on `PodState`/`pod_account::diff_pod` (`crates/ethcore/src/
//! pod_state.rs`, `pod_account.rs`): a `BTreeMap` newtype with a free
//! `diff` function walking the merged key set via `Itertools::merge`.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::account::Account;
use crate::hash::Address;

const ADDRESS_SIZE: usize = 20;
const HASH_SIZE: usize = 32;
const NONCE_SIZE: usize = 8;
/// Upper bound for an RLP-encoded `U256` balance.
const BALANCE_SIZE: usize = 32;
/// Two hashes per storage slot (key, value).
const STORAGE_SLOT_SIZE: usize = 2 * HASH_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorldState(BTreeMap<Address, Account>);

impl WorldState {
    pub fn new() -> Self {
        WorldState(BTreeMap::new())
    }

    pub fn from_map(m: BTreeMap<Address, Account>) -> Self {
        WorldState(m)
    }

    pub fn get(&self) -> &BTreeMap<Address, Account> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<Address, Account> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn add(&mut self, address: Address, account: Account) {
        self.0.insert(address, account);
    }

    /// Merge `other` into `self`. `other` wins on any conflicting
    /// account field; storage entries are unioned per account, with
    /// `other`'s value winning on a colliding storage key.
    pub fn merge(&mut self, other: &WorldState) {
        for (addr, other_acc) in other.0.iter() {
            match self.0.get_mut(addr) {
                Some(acc) => {
                    acc.nonce = other_acc.nonce;
                    acc.balance = other_acc.balance;
                    acc.code = other_acc.code.clone();
                    for (k, v) in other_acc.storage.iter() {
                        acc.storage.insert(*k, *v);
                    }
                }
                None => {
                    self.0.insert(*addr, other_acc.clone());
                }
            }
        }
    }

    /// Set difference between `self` and `other`, with "zero value ≡
    /// absent" semantics for storage slots: an address present in
    /// `self` but absent from `other` is kept
    /// wholesale; an address present in both is kept only if it
    /// differs, and if kept, only the storage slots that differ (or
    /// that are zero in `other` while non-zero in `self`) are kept.
    pub fn diff(&self, other: &WorldState) -> WorldState {
        let mut out = BTreeMap::new();
        for addr in self.0.keys().merge(other.0.keys()).dedup() {
            match (self.0.get(addr), other.0.get(addr)) {
                (Some(a), None) => {
                    out.insert(*addr, a.clone());
                }
                (Some(a), Some(b)) => {
                    if a == b {
                        continue;
                    }
                    let mut storage = BTreeMap::new();
                    for (k, v) in a.storage.iter() {
                        let other_v = b.storage.get(k).copied().unwrap_or_default();
                        if *v != other_v {
                            storage.insert(*k, *v);
                        }
                    }
                    out.insert(
                        *addr,
                        Account {
                            nonce: a.nonce,
                            balance: a.balance,
                            storage,
                            code: a.code.clone(),
                        },
                    );
                }
                (None, _) => {}
            }
        }
        WorldState(out)
    }

    /// Byte-count upper bound for the accounts/slots that are new or
    /// changed between `self` and `other`, used to budget periodic
    /// update-set snapshots.
    pub fn estimate_incremental_size(&self, other: &WorldState) -> usize {
        let mut total = 0usize;
        for (addr, other_acc) in other.0.iter() {
            let changed_slots = match self.0.get(addr) {
                Some(acc) if acc == other_acc => continue,
                Some(acc) => other_acc
                    .storage
                    .iter()
                    .filter(|(k, v)| acc.storage.get(k) != Some(*v))
                    .count(),
                None => other_acc.storage.len(),
            };
            total += ADDRESS_SIZE + HASH_SIZE + NONCE_SIZE + BALANCE_SIZE;
            total += changed_slots * STORAGE_SLOT_SIZE;
        }
        total
    }
}

impl FromIterator<(Address, Account)> for WorldState {
    fn from_iter<T: IntoIterator<Item = (Address, Account)>>(iter: T) -> Self {
        WorldState(iter.into_iter().collect())
    }
}

impl IntoIterator for WorldState {
    type Item = (Address, Account);
    type IntoIter = std::collections::btree_map::IntoIter<Address, Account>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Hash;
    use ethereum_types::U256;

    fn addr(n: u8) -> Address {
        Address::from_slice(&[n; 20])
    }

    #[test]
    fn diff_of_identical_states_is_empty() {
        let mut ws = WorldState::new();
        ws.add(
            addr(1),
            Account {
                balance: 69.into(),
                ..Default::default()
            },
        );
        assert!(ws.diff(&ws.clone()).is_empty());
    }

    #[test]
    fn diff_keeps_accounts_absent_from_other() {
        let mut a = WorldState::new();
        a.add(
            addr(1),
            Account {
                balance: U256::from(69),
                ..Default::default()
            },
        );
        let b = WorldState::new();
        let d = a.diff(&b);
        assert_eq!(d.get().len(), 1);
        assert_eq!(d.get()[&addr(1)].balance, U256::from(69));
    }

    #[test]
    fn diff_treats_absent_slot_as_zero() {
        let mut a = WorldState::new();
        let mut storage = std::collections::BTreeMap::new();
        storage.insert(Hash::default(), Hash::keccak256(b"x"));
        a.add(
            addr(1),
            Account {
                nonce: 1,
                storage,
                ..Default::default()
            },
        );
        let mut b = WorldState::new();
        b.add(
            addr(1),
            Account {
                nonce: 1,
                ..Default::default()
            },
        );
        let d = a.diff(&b);
        assert_eq!(d.get()[&addr(1)].storage.len(), 1);
    }

    #[test]
    fn merge_lets_other_win_on_conflicting_fields() {
        let mut a = WorldState::new();
        a.add(
            addr(1),
            Account {
                nonce: 1,
                ..Default::default()
            },
        );
        let mut b = WorldState::new();
        b.add(
            addr(1),
            Account {
                nonce: 2,
                ..Default::default()
            },
        );
        a.merge(&b);
        assert_eq!(a.get()[&addr(1)].nonce, 2);
    }
}
