//! Code / Substate / Update-set / Destroyed-account stores plus the
//! metadata sidecar, all sharing one [`substate_kvdb::StoreBackend`]
//! handle — grounded on `ArchiveDB::new(backing: Arc<dyn KeyValueDB>,
//! ...)` taking a single shared backend.
//!
//! `Drop` is not relied on for correctness: each sub-store and every
//! iterator holds its own `Arc<dyn StoreBackend>` clone rather than a
//! borrow, so the top-level [`Store`] can be dropped while an iterator
//! outlives it. Calling [`Store::close`] while an iterator is still
//! live remains undefined, exactly as the KV backend contract states;
//! that ordering is a caller obligation, not something the type system
//! enforces.

mod code;
mod destroyed;
mod keys;
mod last_block;
mod metadata;
mod substate;
mod update_set;

pub use code::CodeStore;
pub use destroyed::DestroyedAccountStore;
pub use metadata::MetadataStore;
pub use substate::SubstateStore;
pub use update_set::{UpdateSetRangeIter, UpdateSetStore};

use std::path::Path;
use std::sync::Arc;

use substate_kvdb::StoreBackend;
use substate_primitives::Result;

/// Owns the one shared backend handle and hands out the five
/// sub-stores built on top of it.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn StoreBackend>,
    code: CodeStore,
    substates: SubstateStore,
    update_sets: UpdateSetStore,
    destroyed_accounts: DestroyedAccountStore,
    metadata: MetadataStore,
}

impl Store {
    fn from_backend(backend: Arc<dyn StoreBackend>) -> Self {
        let code = CodeStore::new(backend.clone());
        let substates = SubstateStore::new(backend.clone(), code.clone());
        let update_sets = UpdateSetStore::new(backend.clone(), code.clone());
        let destroyed_accounts = DestroyedAccountStore::new(backend.clone());
        let metadata = MetadataStore::new(backend.clone());
        Store {
            backend,
            code,
            substates,
            update_sets,
            destroyed_accounts,
            metadata,
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_backend(substate_kvdb::open(path)?))
    }

    pub fn open_read_only(path: &Path) -> Result<Self> {
        Ok(Self::from_backend(substate_kvdb::open_read_only(path)?))
    }

    pub fn open_in_memory() -> Self {
        Self::from_backend(substate_kvdb::open_in_memory())
    }

    pub fn code(&self) -> &CodeStore {
        &self.code
    }

    pub fn substates(&self) -> &SubstateStore {
        &self.substates
    }

    pub fn update_sets(&self) -> &UpdateSetStore {
        &self.update_sets
    }

    pub fn destroyed_accounts(&self) -> &DestroyedAccountStore {
        &self.destroyed_accounts
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn backend(&self) -> &Arc<dyn StoreBackend> {
        &self.backend
    }

    pub fn compact(&self, start: Option<&[u8]>, limit: Option<&[u8]>) -> Result<()> {
        self.backend.compact(start, limit)
    }

    pub fn stat(&self, property: &str) -> Result<String> {
        self.backend.stat(property)
    }

    pub fn close(&self) -> Result<()> {
        self.backend.close()
    }
}
