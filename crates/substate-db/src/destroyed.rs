//! Destroyed-account store.

use std::collections::BTreeMap;
use std::sync::Arc;

use rlp::{Rlp, RlpStream};
use substate_kvdb::StoreBackend;
use substate_primitives::{Address, DestroyedAccountRecord, Error, Result, ResultExt};

use crate::keys::{destroyed_key, parse_destroyed_key, DESTROYED_PREFIX};

#[derive(Clone)]
pub struct DestroyedAccountStore {
    backend: Arc<dyn StoreBackend>,
}

fn encode_record(record: &DestroyedAccountRecord) -> Vec<u8> {
    let mut s = RlpStream::new();
    s.begin_list(2);
    s.begin_list(record.destroyed.len());
    for a in &record.destroyed {
        s.append(a);
    }
    s.begin_list(record.resurrected.len());
    for a in &record.resurrected {
        s.append(a);
    }
    s.out().to_vec()
}

fn decode_record(bytes: &[u8]) -> Result<DestroyedAccountRecord> {
    let rlp = Rlp::new(bytes);
    if rlp.item_count().map_err(|e| Error::Decode(e.to_string()))? != 2 {
        return Err(Error::Decode(
            "destroyed-account record must have exactly 2 items".into(),
        ));
    }
    let destroyed = rlp
        .at(0)
        .and_then(|r| r.as_list())
        .map_err(|e| Error::Decode(e.to_string()))?;
    let resurrected = rlp
        .at(1)
        .and_then(|r| r.as_list())
        .map_err(|e| Error::Decode(e.to_string()))?;
    Ok(DestroyedAccountRecord {
        destroyed,
        resurrected,
    })
}

impl DestroyedAccountStore {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        DestroyedAccountStore { backend }
    }

    pub fn set(
        &self,
        block: u64,
        tx: u32,
        destroyed: Vec<Address>,
        resurrected: Vec<Address>,
    ) -> Result<()> {
        let record = DestroyedAccountRecord {
            destroyed,
            resurrected,
        };
        self.backend
            .put(&destroyed_key(block, tx), &encode_record(&record))
            .context(format!("cannot set destroyed accounts block={block} tx={tx}"))
    }

    pub fn get(&self, block: u64, tx: u32) -> Result<Option<DestroyedAccountRecord>> {
        let Some(bytes) = self.backend.get(&destroyed_key(block, tx))? else {
            return Ok(None);
        };
        decode_record(&bytes)
            .context(format!("cannot get destroyed accounts block={block} tx={tx}"))
            .map(Some)
    }

    pub fn get_first_key(&self) -> Result<(u64, u32)> {
        let (key, _) = self
            .backend
            .new_iterator(DESTROYED_PREFIX, &[])
            .next()
            .ok_or_else(|| Error::Corruption("no destroyed-account record stored".into()))?;
        parse_destroyed_key(&key)
    }

    pub fn get_last_key(&self) -> Result<(u64, u32)> {
        let tail = crate::last_block::find_last_key_tail(self.backend.as_ref(), DESTROYED_PREFIX, 12)?
            .ok_or_else(|| Error::Corruption("no destroyed-account record stored".into()))?;
        let block = u64::from_be_bytes(tail[..8].try_into().unwrap());
        let tx = u32::from_be_bytes(tail[8..12].try_into().unwrap());
        Ok((block, tx))
    }

    /// Scans `[from, to]` inclusive; destroyed addresses are marked
    /// `true`, resurrected addresses are marked `false` (overwriting),
    /// last write wins. Returns the addresses still marked `true`.
    pub fn get_accounts_destroyed_in_range(&self, from: u64, to: u64) -> Result<Vec<Address>> {
        let start = from.to_be_bytes();
        let mut state: BTreeMap<Address, bool> = BTreeMap::new();
        for (key, value) in self.backend.new_iterator(DESTROYED_PREFIX, &start) {
            let (block, _tx) = parse_destroyed_key(&key)?;
            if block > to {
                break;
            }
            let record = decode_record(&value)?;
            for addr in record.destroyed {
                state.insert(addr, true);
            }
            for addr in record.resurrected {
                state.insert(addr, false);
            }
        }
        Ok(state
            .into_iter()
            .filter_map(|(addr, alive)| alive.then_some(addr))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_store() -> DestroyedAccountStore {
        DestroyedAccountStore::new(substate_kvdb::open_in_memory())
    }

    fn addr(n: u8) -> Address {
        Address::from_slice(&[n; 20])
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = new_store();
        store.set(10, 0, vec![addr(1)], vec![]).unwrap();
        let record = store.get(10, 0).unwrap().unwrap();
        assert_eq!(record.destroyed, vec![addr(1)]);
        assert!(record.resurrected.is_empty());
    }

    #[test]
    fn range_reduction_is_last_write_wins() {
        let store = new_store();
        store.set(10, 0, vec![addr(1)], vec![]).unwrap();
        store.set(12, 0, vec![], vec![addr(1)]).unwrap();
        store.set(13, 0, vec![addr(2)], vec![]).unwrap();

        assert_eq!(
            store.get_accounts_destroyed_in_range(10, 13).unwrap(),
            vec![addr(2)]
        );
        assert_eq!(
            store.get_accounts_destroyed_in_range(10, 11).unwrap(),
            vec![addr(1)]
        );
    }

    #[test]
    fn first_and_last_key_span_the_stored_records() {
        let store = new_store();
        store.set(10, 0, vec![addr(1)], vec![]).unwrap();
        store.set(13, 2, vec![addr(2)], vec![]).unwrap();

        assert_eq!(store.get_first_key().unwrap(), (10, 0));
        assert_eq!(store.get_last_key().unwrap(), (13, 2));
    }
}
