//! Substate store: builds on the Code store.

use std::collections::BTreeMap;
use std::sync::Arc;

use substate_kvdb::StoreBackend;
use substate_primitives::{Error, Result, ResultExt, Substate};

use crate::code::CodeStore;
use crate::keys::{parse_substate_key, substate_block_prefix, substate_key, SUBSTATE_PREFIX};
use crate::last_block::find_last_key_tail;

#[derive(Clone)]
pub struct SubstateStore {
    backend: Arc<dyn StoreBackend>,
    code: CodeStore,
}

impl SubstateStore {
    pub fn new(backend: Arc<dyn StoreBackend>, code: CodeStore) -> Self {
        SubstateStore { backend, code }
    }

    /// 1. Externalises every account's code in input/output state.
    /// 2. Externalises contract-creation init code.
    /// 3. RLP-encodes the remainder and writes under the composite key.
    pub fn put_substate(&self, substate: &Substate) -> Result<()> {
        let mut code = self.code.clone();
        let bytes = substate_rlp::encode_substate(substate, &mut code)
            .context(format!("cannot put substate block={} tx={}", substate.block, substate.tx))?;
        self.backend
            .put(&substate_key(substate.block, substate.tx), &bytes)
            .context(format!("cannot put substate block={} tx={}", substate.block, substate.tx))
    }

    pub fn get_substate(&self, block: u64, tx: u32) -> Result<Option<Substate>> {
        let key = substate_key(block, tx);
        let Some(bytes) = self.backend.get(&key)? else {
            return Ok(None);
        };
        let mut code = self.code.clone();
        let (_version, substate) = substate_rlp::decode_substate(&bytes, block, tx, &mut code)
            .context(format!("cannot get substate block={block} tx={tx}"))?;
        Ok(Some(substate))
    }

    pub fn has_substate(&self, block: u64, tx: u32) -> Result<bool> {
        self.backend.has(&substate_key(block, tx))
    }

    pub fn delete_substate(&self, block: u64, tx: u32) -> Result<()> {
        self.backend.delete(&substate_key(block, tx))
    }

    /// Scans the block prefix, returning `tx → Substate`. Fails if any
    /// iterated key does not belong to `block` (corruption signal).
    pub fn get_block_substates(&self, block: u64) -> Result<BTreeMap<u32, Substate>> {
        let prefix = substate_block_prefix(block);
        let mut out = BTreeMap::new();
        for (key, value) in self.backend.new_iterator(&prefix, &[]) {
            let (key_block, tx) = parse_substate_key(&key)?;
            if key_block != block {
                return Err(Error::Corruption(format!(
                    "substate iterator for block {block} yielded key from block {key_block}"
                )));
            }
            let mut code = self.code.clone();
            let (_version, substate) = substate_rlp::decode_substate(&value, key_block, tx, &mut code)
                .context(format!("cannot get substate block={block} tx={tx}"))?;
            out.insert(tx, substate);
        }
        Ok(out)
    }

    pub fn get_first_substate(&self) -> Result<Option<Substate>> {
        let Some((key, value)) = self
            .backend
            .new_iterator(SUBSTATE_PREFIX, &[])
            .next()
        else {
            return Ok(None);
        };
        let (block, tx) = parse_substate_key(&key)?;
        let mut code = self.code.clone();
        let (_version, substate) = substate_rlp::decode_substate(&value, block, tx, &mut code)
            .context(format!("cannot get substate block={block} tx={tx}"))?;
        Ok(Some(substate))
    }

    /// Finds the highest block via the binary probe search, fetches
    /// all of its substates, and returns the one with the largest tx
    /// index.
    pub fn get_last_substate(&self) -> Result<Substate> {
        let block = self.get_last_block()?;
        let txs = self.get_block_substates(block)?;
        let (_tx, substate) = txs
            .into_iter()
            .next_back()
            .ok_or_else(|| Error::Corruption(format!("no substates found at last block {block}")))?;
        Ok(substate)
    }

    /// Highest stored block number, found by an 8-byte binary probe
    /// over the KV backend's ranged iterator, with no
    /// full scan.
    pub fn get_last_block(&self) -> Result<u64> {
        let tail = find_last_key_tail(self.backend.as_ref(), SUBSTATE_PREFIX, 8)?
            .ok_or_else(|| Error::Corruption("substate store is empty".into()))?;
        Ok(u64::from_be_bytes(tail.try_into().unwrap()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use substate_primitives::{Account, Address, Env, ExecutionResult, Message, WorldState};

    fn new_store() -> SubstateStore {
        let backend = substate_kvdb::open_in_memory();
        let code = CodeStore::new(backend.clone());
        SubstateStore::new(backend, code)
    }

    fn sample_substate(block: u64, tx: u32) -> Substate {
        let mut input = WorldState::new();
        input.add(
            Address::from_slice(&[1; 20]),
            Account {
                nonce: 1,
                ..Default::default()
            },
        );
        let mut output = WorldState::new();
        output.add(
            Address::from_slice(&[1; 20]),
            Account {
                nonce: 2,
                ..Default::default()
            },
        );
        Substate {
            input_state: input,
            output_state: output,
            env: Env::default(),
            message: Message {
                to: None,
                data: vec![0x01],
                ..Default::default()
            },
            result: ExecutionResult::default(),
            block,
            tx,
        }
    }

    #[test]
    fn put_then_get_round_trips_and_recovers_creation_data() {
        let store = new_store();
        let s = sample_substate(37_534_834, 1);
        store.put_substate(&s).unwrap();
        assert!(store.has_substate(37_534_834, 1).unwrap());
        let got = store.get_substate(37_534_834, 1).unwrap().unwrap();
        assert_eq!(got, s);
    }

    #[test]
    fn block_prefix_scan_returns_exactly_that_blocks_txs() {
        let store = new_store();
        store.put_substate(&sample_substate(1, 0)).unwrap();
        store.put_substate(&sample_substate(1, 1)).unwrap();
        store.put_substate(&sample_substate(2, 0)).unwrap();

        let txs = store.get_block_substates(1).unwrap();
        assert_eq!(txs.len(), 2);
        assert!(txs.contains_key(&0));
        assert!(txs.contains_key(&1));
    }

    #[test]
    fn last_substate_picks_highest_block_then_highest_tx() {
        let store = new_store();
        store.put_substate(&sample_substate(1, 0)).unwrap();
        store.put_substate(&sample_substate(2, 0)).unwrap();
        store.put_substate(&sample_substate(2, 5)).unwrap();

        assert_eq!(store.get_last_block().unwrap(), 2);
        let last = store.get_last_substate().unwrap();
        assert_eq!(last.block, 2);
        assert_eq!(last.tx, 5);
    }
}
