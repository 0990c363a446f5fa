//! The backend-agnostic traits every concrete store implements.

use substate_primitives::Result;

/// An ordered byte-key store: point get/put/delete, prefix+start
/// ranged iteration, atomic batched writes, compaction, and a
/// human-readable stat surface.
pub trait StoreBackend: Send + Sync {
    /// `None` on a missing key is success, not an error.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    fn delete(&self, key: &[u8]) -> Result<()>;

    fn new_batch(&self) -> Box<dyn Batch + '_>;

    /// Walks `[prefix ∥ start, prefix ∥ 0xFF…]` ascending. `start` is
    /// appended to `prefix`, never substituted for it.
    fn new_iterator<'a>(
        &'a self,
        prefix: &[u8],
        start: &[u8],
    ) -> Box<dyn Iterator<Item = (Box<[u8]>, Box<[u8]>)> + 'a>;

    fn stat(&self, property: &str) -> Result<String>;

    fn compact(&self, start: Option<&[u8]>, limit: Option<&[u8]>) -> Result<()>;

    fn close(&self) -> Result<()>;
}

/// Accumulates `put`/`delete` operations in memory; `write` commits
/// them atomically.
pub trait Batch {
    fn put(&mut self, key: &[u8], value: &[u8]);

    fn delete(&mut self, key: &[u8]);

    /// Running byte-size of the accumulated operations, used by
    /// callers to decide when to flush.
    fn size(&self) -> usize;

    fn write(&mut self) -> Result<()>;

    fn reset(&mut self);

    /// Replays every accumulated operation into `writer`, in the order
    /// they were accumulated, stopping on and surfacing the first
    /// failure.
    fn replay(&self, writer: &dyn StoreBackend) -> Result<()>;
}

/// The operations accumulated by a generic, backend-agnostic batch —
/// shared by [`crate::rocks::RocksBackend`] and
/// [`crate::memory::MemoryBackend`] so `replay`/`size` need be written
/// only once.
#[derive(Default)]
pub(crate) struct PendingOps {
    pub ops: Vec<(Vec<u8>, Option<Vec<u8>>)>,
    pub size: usize,
}

impl PendingOps {
    pub(crate) fn put(&mut self, key: &[u8], value: &[u8]) {
        self.size += key.len() + value.len();
        self.ops.push((key.to_vec(), Some(value.to_vec())));
    }

    pub(crate) fn delete(&mut self, key: &[u8]) {
        self.size += key.len();
        self.ops.push((key.to_vec(), None));
    }

    pub(crate) fn reset(&mut self) {
        self.ops.clear();
        self.size = 0;
    }

    pub(crate) fn replay(&self, writer: &dyn StoreBackend) -> Result<()> {
        for (key, value) in &self.ops {
            match value {
                Some(v) => writer.put(key, v)?,
                None => writer.delete(key)?,
            }
        }
        Ok(())
    }
}
