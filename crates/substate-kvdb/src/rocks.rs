//! RocksDB-backed store, via `kvdb-rocksdb`.

use std::path::Path;

use kvdb::{DBTransaction, KeyValueDB};
use kvdb_rocksdb::{Database, DatabaseConfig};
use substate_primitives::{Error, Result};

use crate::backend::{Batch, PendingOps, StoreBackend};

const COL: u32 = 0;

pub struct RocksBackend {
    db: Database,
    read_only: bool,
}

impl RocksBackend {
    pub fn open(path: &Path, read_only: bool) -> Result<Self> {
        let config = DatabaseConfig::with_columns(1);
        let db = Database::open(&config, &path.to_string_lossy())
            .map_err(|e| Error::Backend(e.to_string()))?;
        Ok(RocksBackend { db, read_only })
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        Ok(())
    }
}

impl StoreBackend for RocksBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db
            .get(COL, key)
            .map(|opt| opt.map(|v| v.to_vec()))
            .map_err(|e| Error::Backend(e.to_string()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_writable()?;
        let mut txn = DBTransaction::new();
        txn.put(COL, key, value);
        self.db.write(txn).map_err(|e| Error::Backend(e.to_string()))
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.check_writable()?;
        let mut txn = DBTransaction::new();
        txn.delete(COL, key);
        self.db.write(txn).map_err(|e| Error::Backend(e.to_string()))
    }

    fn new_batch(&self) -> Box<dyn Batch + '_> {
        Box::new(RocksBatch {
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
        Box::new(
            self.db
                .iter_with_prefix(COL, prefix)
                .skip_while(move |(k, _)| k.as_ref() < seek.as_slice()),
        )
    }

    fn stat(&self, property: &str) -> Result<String> {
        Ok(self
            .db
            .get_property_value(property)
            .map_err(|e| Error::Backend(e.to_string()))?
            .unwrap_or_default())
    }

    fn compact(&self, start: Option<&[u8]>, limit: Option<&[u8]>) -> Result<()> {
        self.db
            .compact_range(start, limit)
            .map_err(|e| Error::Backend(e.to_string()))
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct RocksBatch<'a> {
    backend: &'a RocksBackend,
    pending: PendingOps,
}

impl Batch for RocksBatch<'_> {
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
        self.backend.check_writable()?;
        let mut txn = DBTransaction::new();
        for (key, value) in &self.pending.ops {
            match value {
                Some(v) => txn.put(COL, key, v),
                None => txn.delete(COL, key),
            }
        }
        self.backend
            .db
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
        let dir = tempfile::tempdir().unwrap();
        let db = RocksBackend::open(dir.path(), false).unwrap();
        db.put(b"1sk", b"v").unwrap();
        assert_eq!(db.get(b"1sk").unwrap(), Some(b"v".to_vec()));
        db.delete(b"1sk").unwrap();
        assert_eq!(db.get(b"1sk").unwrap(), None);
    }

    #[test]
    fn read_only_backend_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = RocksBackend::open(dir.path(), false).unwrap();
            db.put(b"k", b"v").unwrap();
        }
        let db = RocksBackend::open(dir.path(), true).unwrap();
        assert_eq!(db.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(matches!(db.put(b"k2", b"v2"), Err(Error::ReadOnly)));
    }

    #[test]
    fn iterator_honours_prefix_and_start() {
        let dir = tempfile::tempdir().unwrap();
        let db = RocksBackend::open(dir.path(), false).unwrap();
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
