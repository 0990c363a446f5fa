//! Wire shapes for `Account` and `WorldState` — parallel
//! `addresses`/`accounts` arrays, not a list of pairs. Identical
//! across every codec version; the version split only affects `Env`
//! and `Message`.

use ethereum_types::U256;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use substate_primitives::{Account, Address, Hash, WorldState, KECCAK_EMPTY};

use crate::traits::{CodeSink, CodeSource};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct WireAccount {
    pub nonce: u64,
    pub balance: U256,
    pub code_hash: Hash,
    pub storage: Vec<(Hash, Hash)>,
}

impl Encodable for WireAccount {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        s.append(&self.nonce);
        s.append(&self.balance);
        s.append(&self.code_hash);
        s.begin_list(self.storage.len());
        for (k, v) in &self.storage {
            s.begin_list(2);
            s.append(k);
            s.append(v);
        }
    }
}

impl Decodable for WireAccount {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let storage_rlp = rlp.at(3)?;
        let mut storage = Vec::with_capacity(storage_rlp.item_count()?);
        for pair in storage_rlp.iter() {
            if pair.item_count()? != 2 {
                return Err(DecoderError::RlpIncorrectListLen);
            }
            storage.push((pair.val_at(0)?, pair.val_at(1)?));
        }
        Ok(WireAccount {
            nonce: rlp.val_at(0)?,
            balance: rlp.val_at(1)?,
            code_hash: rlp.val_at(2)?,
            storage,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct WireWorldState {
    pub addresses: Vec<Address>,
    pub accounts: Vec<WireAccount>,
}

impl Encodable for WireWorldState {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append_list(&self.addresses);
        s.append_list(&self.accounts);
    }
}

impl Decodable for WireWorldState {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let addresses: Vec<Address> = rlp.list_at(0)?;
        let accounts: Vec<WireAccount> = rlp.list_at(1)?;
        if addresses.len() != accounts.len() {
            return Err(DecoderError::Custom(
                "world-state addresses/accounts length mismatch",
            ));
        }
        Ok(WireWorldState {
            addresses,
            accounts,
        })
    }
}

/// Externalises every account's code to `sink` and returns the wire
/// form. Empty code is never
/// written — it already hashes to the well-known
/// [`substate_primitives::KECCAK_EMPTY`] constant, so there is nothing
/// to look up on the way back in either.
pub(crate) fn to_wire<S: CodeSink>(
    ws: &WorldState,
    sink: &mut S,
) -> substate_primitives::Result<WireWorldState> {
    let mut addresses = Vec::with_capacity(ws.len());
    let mut accounts = Vec::with_capacity(ws.len());
    for (addr, acc) in ws.get() {
        let code_hash = if acc.code.is_empty() {
            KECCAK_EMPTY
        } else {
            sink.put_code(&acc.code)?
        };
        addresses.push(*addr);
        accounts.push(WireAccount {
            nonce: acc.nonce,
            balance: acc.balance,
            code_hash,
            storage: acc.storage.iter().map(|(k, v)| (*k, *v)).collect(),
        });
    }
    Ok(WireWorldState {
        addresses,
        accounts,
    })
}

/// Rehydrates account code from `source`. `tolerate_missing_code`
/// selects between the Substate store's policy (absent code ⇒ empty)
/// and the Update-set store's policy (absent code ⇒ `CodeLookup`
/// error).
pub(crate) fn from_wire<S: CodeSource>(
    wire: &WireWorldState,
    tolerate_missing_code: bool,
    source: &mut S,
) -> substate_primitives::Result<WorldState> {
    let mut out = WorldState::new();
    for (addr, wacc) in wire.addresses.iter().zip(wire.accounts.iter()) {
        let code = if wacc.code_hash == KECCAK_EMPTY {
            Vec::new()
        } else {
            match source.get_code(wacc.code_hash)? {
                Some(c) => c,
                None if tolerate_missing_code => Vec::new(),
                None => return Err(substate_primitives::Error::CodeLookup(wacc.code_hash)),
            }
        };
        out.add(
            *addr,
            Account::new(
                wacc.nonce,
                wacc.balance,
                wacc.storage.iter().copied().collect(),
                code,
            ),
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct MapCodeStore(BTreeMap<Hash, Vec<u8>>);

    impl CodeSink for MapCodeStore {
        fn put_code(&mut self, code: &[u8]) -> substate_primitives::Result<Hash> {
            let h = Hash::keccak256(code);
            self.0.insert(h, code.to_vec());
            Ok(h)
        }
    }

    impl CodeSource for MapCodeStore {
        fn get_code(&mut self, hash: Hash) -> substate_primitives::Result<Option<Vec<u8>>> {
            Ok(self.0.get(&hash).cloned())
        }
    }

    #[test]
    fn round_trips_world_state_through_code_externalisation() {
        let mut ws = WorldState::new();
        ws.add(
            Address::from_slice(&[1; 20]),
            Account::new(1, 100.into(), BTreeMap::new(), vec![0x60, 0x01]),
        );
        ws.add(
            Address::from_slice(&[2; 20]),
            Account::new(0, 0.into(), BTreeMap::new(), Vec::new()),
        );

        let mut store = MapCodeStore(BTreeMap::new());
        let wire = to_wire(&ws, &mut store).unwrap();
        assert_eq!(store.0.len(), 1);

        let back = from_wire(&wire, false, &mut store).unwrap();
        assert_eq!(back, ws);
    }

    #[test]
    fn missing_code_errors_unless_tolerated() {
        let mut ws = WorldState::new();
        ws.add(
            Address::from_slice(&[1; 20]),
            Account::new(1, 0.into(), BTreeMap::new(), vec![0x01]),
        );
        let mut store = MapCodeStore(BTreeMap::new());
        let wire = to_wire(&ws, &mut store).unwrap();

        let mut empty_store = MapCodeStore(BTreeMap::new());
        assert!(from_wire(&wire, false, &mut empty_store).is_err());
        let tolerated = from_wire(&wire, true, &mut empty_store).unwrap();
        assert!(tolerated.get().values().next().unwrap().code.is_empty());
    }
}
