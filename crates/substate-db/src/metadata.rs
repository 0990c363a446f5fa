//! Metadata sidecar: two fixed keys holding
//! big-endian `u64` values. Corruption (missing/short value) is a
//! hard error — metadata is consulted before any iteration starts, so
//! there is no "absent is fine" fallback as there is for substates.

use std::sync::Arc;

use substate_kvdb::StoreBackend;
use substate_primitives::{Error, Result};

use crate::keys::{METADATA_INTERVAL_KEY, METADATA_SIZE_KEY};

#[derive(Clone)]
pub struct MetadataStore {
    backend: Arc<dyn StoreBackend>,
}

fn decode_u64(key: &[u8], bytes: &[u8]) -> Result<u64> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| {
        Error::Corruption(format!(
            "metadata key {:?} has a value of length {} (expected 8)",
            String::from_utf8_lossy(key),
            bytes.len()
        ))
    })?;
    Ok(u64::from_be_bytes(arr))
}

impl MetadataStore {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        MetadataStore { backend }
    }

    pub fn get_update_set_interval(&self) -> Result<Option<u64>> {
        match self.backend.get(METADATA_INTERVAL_KEY)? {
            Some(bytes) => Ok(Some(decode_u64(METADATA_INTERVAL_KEY, &bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set_update_set_interval(&self, value: u64) -> Result<()> {
        self.backend.put(METADATA_INTERVAL_KEY, &value.to_be_bytes())
    }

    pub fn get_update_set_size(&self) -> Result<Option<u64>> {
        match self.backend.get(METADATA_SIZE_KEY)? {
            Some(bytes) => Ok(Some(decode_u64(METADATA_SIZE_KEY, &bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set_update_set_size(&self, value: u64) -> Result<()> {
        self.backend.put(METADATA_SIZE_KEY, &value.to_be_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_metadata_is_none_not_an_error() {
        let store = MetadataStore::new(substate_kvdb::open_in_memory());
        assert_eq!(store.get_update_set_interval().unwrap(), None);
        assert_eq!(store.get_update_set_size().unwrap(), None);
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = MetadataStore::new(substate_kvdb::open_in_memory());
        store.set_update_set_interval(1000).unwrap();
        store.set_update_set_size(64 * 1024 * 1024).unwrap();
        assert_eq!(store.get_update_set_interval().unwrap(), Some(1000));
        assert_eq!(store.get_update_set_size().unwrap(), Some(64 * 1024 * 1024));
    }

    #[test]
    fn short_value_is_corruption() {
        let backend = substate_kvdb::open_in_memory();
        backend.put(METADATA_INTERVAL_KEY, b"\x01\x02").unwrap();
        let store = MetadataStore::new(backend);
        assert!(matches!(
            store.get_update_set_interval(),
            Err(Error::Corruption(_))
        ));
    }
}
