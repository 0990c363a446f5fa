//! Content-addressed blob store.

use std::sync::Arc;

use substate_kvdb::StoreBackend;
use substate_primitives::{Error, Hash, Result, KECCAK_EMPTY};
use substate_rlp::{CodeSink, CodeSource};

use crate::keys::code_key;

#[derive(Clone)]
pub struct CodeStore {
    backend: Arc<dyn StoreBackend>,
}

impl CodeStore {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        CodeStore { backend }
    }

    /// Computes `h = keccak256(code)` and writes `"1c" ∥ h → code`.
    /// Putting the empty hash's code is a no-op; put is idempotent.
    pub fn put_code(&self, code: &[u8]) -> Result<Hash> {
        let hash = Hash::keccak256(code);
        if hash == KECCAK_EMPTY {
            return Ok(hash);
        }
        self.backend.put(&code_key(&hash), code)?;
        Ok(hash)
    }

    pub fn get_code(&self, hash: &Hash) -> Result<Option<Vec<u8>>> {
        if hash.is_zero() {
            return Err(Error::EmptyHash);
        }
        if *hash == KECCAK_EMPTY {
            return Ok(Some(Vec::new()));
        }
        self.backend.get(&code_key(hash))
    }

    pub fn has_code(&self, hash: &Hash) -> Result<bool> {
        if hash.is_zero() {
            return Err(Error::EmptyHash);
        }
        if *hash == KECCAK_EMPTY {
            return Ok(true);
        }
        self.backend.has(&code_key(hash))
    }

    pub fn delete_code(&self, hash: &Hash) -> Result<()> {
        if hash.is_zero() {
            return Err(Error::EmptyHash);
        }
        self.backend.delete(&code_key(hash))
    }
}

/// Bridges the generic codec traits in `substate_rlp` to this concrete
/// store, so `encode_substate`/`decode_substate` can externalise and
/// rehydrate code without the codec crate depending on a backend.
impl CodeSink for CodeStore {
    fn put_code(&mut self, code: &[u8]) -> Result<Hash> {
        CodeStore::put_code(self, code)
    }
}

impl CodeSource for CodeStore {
    fn get_code(&mut self, hash: Hash) -> Result<Option<Vec<u8>>> {
        CodeStore::get_code(self, &hash)
    }
}
