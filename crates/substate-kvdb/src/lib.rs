//! Thin uniform surface over an ordered byte-key store, wrapping the
//! `kvdb` / `kvdb-rocksdb` / `kvdb-memorydb` crates the
//! way `ArchiveDB` wraps `Arc<dyn ethcore_db::KeyValueDB>`.
//!
//! Unlike `ethcore_db::KeyValueDB`'s multi-column API, the store above
//! this crate already partitions its keyspace with 2-byte ASCII
//! prefixes (`"1c"`, `"1s"`, `"2s"`, `"da"`, `"md"`), so [`StoreBackend`]
//! takes no column argument — every backend here keeps everything in
//! RocksDB/`kvdb-memorydb` column 0, closer to the plain `BaseDB`
//! interface the original store was built on.

mod backend;
mod memory;
mod rocks;

pub use backend::{Batch, StoreBackend};
pub use memory::MemoryBackend;
pub use rocks::RocksBackend;

use std::path::Path;
use std::sync::Arc;

use substate_primitives::Result;

/// Opens (creating if absent) a RocksDB-backed store at `path`.
pub fn open(path: &Path) -> Result<Arc<dyn StoreBackend>> {
    Ok(Arc::new(RocksBackend::open(path, false)?))
}

/// Opens an existing RocksDB-backed store at `path` read-only; any
/// write through the returned handle fails with `Error::ReadOnly`.
pub fn open_read_only(path: &Path) -> Result<Arc<dyn StoreBackend>> {
    Ok(Arc::new(RocksBackend::open(path, true)?))
}

/// An ephemeral in-memory store, for tests and short-lived tools.
pub fn open_in_memory() -> Arc<dyn StoreBackend> {
    Arc::new(MemoryBackend::new())
}
