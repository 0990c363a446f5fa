//! Update-set store: one world-state delta per block.

use std::sync::Arc;

use substate_kvdb::StoreBackend;
use substate_primitives::{Error, Result, ResultExt, UpdateSet};

use crate::code::CodeStore;
use crate::keys::{parse_update_set_key, update_set_key, UPDATE_SET_PREFIX};
use crate::last_block::find_last_key_tail;

#[derive(Clone)]
pub struct UpdateSetStore {
    backend: Arc<dyn StoreBackend>,
    code: CodeStore,
}

impl UpdateSetStore {
    pub fn new(backend: Arc<dyn StoreBackend>, code: CodeStore) -> Self {
        UpdateSetStore { backend, code }
    }

    pub fn put_update_set(&self, update_set: &UpdateSet) -> Result<()> {
        let mut code = self.code.clone();
        let bytes = substate_rlp::encode_update_set(update_set, &mut code)
            .context(format!("cannot put update-set block={}", update_set.block))?;
        self.backend
            .put(&update_set_key(update_set.block), &bytes)
            .context(format!("cannot put update-set block={}", update_set.block))
    }

    pub fn get_update_set(&self, block: u64) -> Result<Option<UpdateSet>> {
        let Some(bytes) = self.backend.get(&update_set_key(block))? else {
            return Ok(None);
        };
        let mut code = self.code.clone();
        let update_set = substate_rlp::decode_update_set(&bytes, block, &mut code)
            .context(format!("cannot get update-set block={block}"))?;
        Ok(Some(update_set))
    }

    pub fn has_update_set(&self, block: u64) -> Result<bool> {
        self.backend.has(&update_set_key(block))
    }

    pub fn delete_update_set(&self, block: u64) -> Result<()> {
        self.backend.delete(&update_set_key(block))
    }

    pub fn get_first_key(&self) -> Result<u64> {
        let (key, _) = self
            .backend
            .new_iterator(UPDATE_SET_PREFIX, &[])
            .next()
            .ok_or_else(|| Error::Corruption("no update-set stored".into()))?;
        parse_update_set_key(&key)
    }

    pub fn get_last_key(&self) -> Result<u64> {
        let tail = find_last_key_tail(self.backend.as_ref(), UPDATE_SET_PREFIX, 8)?
            .ok_or_else(|| Error::Corruption("no update-set stored".into()))?;
        Ok(u64::from_be_bytes(tail.try_into().unwrap()))
    }

    /// Decodes update-sets as they arrive straight off the backend's
    /// ranged iterator, terminating cleanly once a key's block exceeds
    /// `end` so the caller never pays to decode data it will discard.
    pub fn iter_range(&self, start: u64, end: u64) -> UpdateSetRangeIter<'_> {
        let start_suffix = start.to_be_bytes();
        let inner = self.backend.new_iterator(UPDATE_SET_PREFIX, &start_suffix);
        UpdateSetRangeIter {
            code: self.code.clone(),
            inner,
            end,
            done: false,
        }
    }
}

pub struct UpdateSetRangeIter<'a> {
    code: CodeStore,
    inner: Box<dyn Iterator<Item = (Box<[u8]>, Box<[u8]>)> + 'a>,
    end: u64,
    done: bool,
}

impl Iterator for UpdateSetRangeIter<'_> {
    type Item = Result<UpdateSet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (key, value) = self.inner.next()?;
        let block = match parse_update_set_key(&key) {
            Ok(b) => b,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if block > self.end {
            self.done = true;
            return None;
        }
        Some(
            substate_rlp::decode_update_set(&value, block, &mut self.code)
                .context(format!("cannot get update-set block={block}")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use substate_primitives::{Account, Address, WorldState};

    fn new_store() -> UpdateSetStore {
        let backend = substate_kvdb::open_in_memory();
        let code = CodeStore::new(backend.clone());
        UpdateSetStore::new(backend, code)
    }

    fn sample(block: u64) -> UpdateSet {
        let mut ws = WorldState::new();
        ws.add(
            Address::from_slice(&[2; 20]),
            Account {
                nonce: block,
                ..Default::default()
            },
        );
        UpdateSet {
            world_state: ws,
            block,
            deleted_accounts: vec![Address::from_slice(&[9; 20])],
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = new_store();
        let u = sample(10);
        store.put_update_set(&u).unwrap();
        assert!(store.has_update_set(10).unwrap());
        assert_eq!(store.get_update_set(10).unwrap().unwrap(), u);
    }

    #[test]
    fn first_and_last_key_span_the_stored_blocks() {
        let store = new_store();
        store.put_update_set(&sample(5)).unwrap();
        store.put_update_set(&sample(8)).unwrap();
        store.put_update_set(&sample(20)).unwrap();

        assert_eq!(store.get_first_key().unwrap(), 5);
        assert_eq!(store.get_last_key().unwrap(), 20);
    }

    #[test]
    fn range_iterator_stops_cleanly_past_end() {
        let store = new_store();
        for block in [5u64, 8, 20] {
            store.put_update_set(&sample(block)).unwrap();
        }
        let got: Vec<_> = store
            .iter_range(0, 8)
            .map(|r| r.unwrap().block)
            .collect();
        assert_eq!(got, vec![5, 8]);
    }

    #[test]
    fn empty_store_reports_no_update_set() {
        let store = new_store();
        assert!(matches!(store.get_first_key(), Err(Error::Corruption(_))));
        assert!(matches!(store.get_last_key(), Err(Error::Corruption(_))));
    }
}
