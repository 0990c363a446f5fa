//! Ephemeral in-memory store, via `kvdb-memorydb`.

use std::sync::RwLock;

use kvdb::{DBTransaction, KeyValueDB};
use substate_primitives::{Error, Result};

use crate::backend::{Batch, PendingOps, StoreBackend};

const COL: u32 = 0;

pub struct MemoryBackend {
    db: RwLock<kvdb_memorydb::InMemory>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            db: RwLock::new(kvdb_memorydb::create(1)),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBackend for MemoryBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db
            .read()
            .unwrap()
            .get(COL, key)
            .map(|opt| opt.map(|v| v.to_vec()))
            .map_err(|e| Error::Backend(e.to_string()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut txn = DBTransaction::new();
        txn.put(COL, key, value);
        self.db
            .write()
            .unwrap()
            .write(txn)
            .map_err(|e| Error::Backend(e.to_string()))
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        let mut txn = DBTransaction::new();
        txn.delete(COL, key);
        self.db
            .write()
            .unwrap()
            .write(txn)
            .map_err(|e| Error::Backend(e.to_string()))
    }

    fn new_batch(&self) -> Box<dyn Batch + '_> {
        Box::new(MemoryBatch {
            backend: self,
            pending: PendingOps::default(),
        })
    }

    fn new_iterator<'a>(
        &'a self,
        prefix: &[u8],
        start: &[u8],
    ) -> Box<dyn Iterator<Item = (Box<[u8]>, Box<[u8]>)> + 'a> {
        let mut seek = prefix.to_vec();
        seek.extend_from_slice(start);
        let items: Vec<_> = self
            .db
            .read()
            .unwrap()
            .iter_with_prefix(COL, prefix)
            .filter(|(k, _)| k.as_ref() >= seek.as_slice())
            .collect();
        Box::new(items.into_iter())
    }

    fn stat(&self, _property: &str) -> Result<String> {
        Ok(String::new())
    }

    fn compact(&self, _start: Option<&[u8]>, _limit: Option<&[u8]>) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct MemoryBatch<'a> {
    backend: &'a MemoryBackend,
    pending: PendingOps,
}

impl Batch for MemoryBatch<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.pending.put(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.pending.delete(key);
    }

    fn size(&self) -> usize {
        self.pending.size
    }

    fn write(&mut self) -> Result<()> {
        let mut txn = DBTransaction::new();
        for (key, value) in &self.pending.ops {
            match value {
                Some(v) => txn.put(COL, key, v),
                None => txn.delete(COL, key),
            }
        }
        self.backend
            .db
            .write()
            .unwrap()
            .write(txn)
            .map_err(|e| Error::Backend(e.to_string()))
    }

    fn reset(&mut self) {
        self.pending.reset();
    }

    fn replay(&self, writer: &dyn StoreBackend) -> Result<()> {
        self.pending.replay(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete_round_trip() {
        let db = MemoryBackend::new();
        db.put(b"1sk", b"v").unwrap();
        assert_eq!(db.get(b"1sk").unwrap(), Some(b"v".to_vec()));
        assert!(db.has(b"1sk").unwrap());
        db.delete(b"1sk").unwrap();
        assert_eq!(db.get(b"1sk").unwrap(), None);
    }

    #[test]
    fn batch_accumulates_until_written() {
        let db = MemoryBackend::new();
        let mut batch = db.new_batch();
        batch.put(b"a", b"1");
        batch.put(b"b", b"2");
        batch.delete(b"a");
        assert!(batch.size() > 0);
        assert_eq!(db.get(b"a").unwrap(), None);
        batch.write().unwrap();
        assert_eq!(db.get(b"a").unwrap(), None);
        assert_eq!(db.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn batch_replays_into_another_writer() {
        let src = MemoryBackend::new();
        let mut batch = src.new_batch();
        batch.put(b"x", b"1");
        batch.put(b"y", b"2");

        let dest = MemoryBackend::new();
        batch.replay(&dest).unwrap();
        assert_eq!(dest.get(b"x").unwrap(), Some(b"1".to_vec()));
        assert_eq!(dest.get(b"y").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn iterator_respects_prefix_and_start() {
        let db = MemoryBackend::new();
        db.put(b"1s\x00\x00\x00\x00\x00\x00\x00\x01", b"a").unwrap();
        db.put(b"1s\x00\x00\x00\x00\x00\x00\x00\x02", b"b").unwrap();
        db.put(b"2s\x00\x00\x00\x00\x00\x00\x00\x01", b"c").unwrap();

        let items: Vec<_> = db
            .new_iterator(b"1s", b"\x00\x00\x00\x00\x00\x00\x00\x02")
            .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(&*items[0].1, b"b");
    }
}
