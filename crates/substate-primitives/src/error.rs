//! Crate-wide error type shared by every layer of the substate store.
//!
//! `NotFound` is deliberately absent: a missing value is represented as
//! `Option::None` at every API boundary where "absent is not an
//! error" (`get_code`, `get_substate`, `get_update_set`).

use std::fmt;

use crate::Hash;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A real hash was required but the caller passed the zero hash.
    #[error("empty hash passed where a real hash was required")]
    EmptyHash,

    /// A stored key has the wrong length or an unrecognised prefix.
    #[error("malformed key: {0}")]
    KeyFormat(String),

    /// RLP decoding failed against every supported wire version.
    #[error("rlp decode failed against all known substate versions: {0}")]
    Decode(String),

    /// Code referenced by hash could not be found while rehydrating an
    /// update-set (fatal there; substate decoding instead tolerates this
    /// and yields empty code).
    #[error("code for hash {0} not found in code store")]
    CodeLookup(Hash),

    /// An iterator yielded data outside the range it was asked to cover,
    /// or a fixed-size metadata value had the wrong length.
    #[error("corrupted store: {0}")]
    Corruption(String),

    /// Propagated from the underlying key-value backend.
    #[error("key-value backend error: {0}")]
    Backend(String),

    /// A write was attempted against a store opened read-only.
    #[error("store was opened read-only")]
    ReadOnly,

    /// An iterator or task pool was released/aborted before completion.
    #[error("cancelled")]
    Cancelled,

    /// A worker or decoder task propagated an error with added context.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap `self` with a human-readable description of what the caller
    /// was trying to do, e.g.
    /// `"cannot get substate block=%v tx=%v: <cause>"`.
    pub fn context(self, context: impl fmt::Display) -> Error {
        Error::Context {
            context: context.to_string(),
            source: Box::new(self),
        }
    }
}

pub trait ResultExt<T> {
    fn context(self, context: impl fmt::Display) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl fmt::Display) -> Result<T> {
        self.map_err(|e| e.context(context))
    }
}
