//! Multi-version RLP codec for stored substates and update-sets.
//!
//! The on-disk shape evolved across Ethereum hard forks. Readers accept
//! every historical shape (Legacy, Berlin, London, a Cancun extension
//! of London); writers always emit the newest shape, with the fields a
//! given record doesn't populate nil-tagged absent. Code and
//! contract-creation init data are never inlined in the wire form —
//! callers supply a [`CodeSink`]/[`CodeSource`] the codec externalises
//! through, so this crate has no dependency on any particular
//! key-value backend.

mod account;
mod codec;
mod convert;
mod env;
mod message;
mod optional;
mod result;
mod traits;

pub use codec::{decode_substate, decode_update_set, encode_substate, encode_update_set, Version};
pub use traits::{CodeSink, CodeSource};
