//! Externalised-code hooks the codec calls into.
//!
//! The codec never inlines account code or contract-creation init data
//! on the wire; instead it calls back into whatever
//! store owns the code blobs. Keeping these as traits rather than a
//! concrete dependency on `substate-db` means `substate-rlp` has no
//! knowledge of how or where code is kept.

use substate_primitives::{Hash, Result};

/// Looks up a previously externalised code/init-data blob by hash.
pub trait CodeSource {
    fn get_code(&mut self, hash: Hash) -> Result<Option<Vec<u8>>>;
}

/// Stores a code/init-data blob, returning the hash it was stored
/// under.
pub trait CodeSink {
    fn put_code(&mut self, code: &[u8]) -> Result<Hash>;
}
