//! Nil-tag optional field helpers.
//!
//! Mirrors the original encoding's `rlp:"nil"` struct tag: `None` is
//! the RLP empty string, `Some(v)` is `v`'s ordinary encoding. Sound
//! for any `T` whose valid encodings are never the empty string
//! themselves — true of [`substate_primitives::Hash`] and
//! [`substate_primitives::Address`], which always encode as
//! fixed-length byte strings, never as RLP's zero-length sentinel.

use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

pub(crate) fn append_opt<T: Encodable>(s: &mut RlpStream, v: &Option<T>) {
    match v {
        Some(x) => x.rlp_append(s),
        None => {
            s.append_empty_data();
        }
    }
}

pub(crate) fn decode_opt<T: Decodable>(rlp: &Rlp) -> Result<Option<T>, DecoderError> {
    if rlp.is_empty() {
        Ok(None)
    } else {
        Ok(Some(T::decode(rlp)?))
    }
}

/// `blob_hashes` has no fixed-length encoding to fall back on for a
/// nil sentinel, so absence is instead modeled as an outer zero- or
/// one-item list: `None` encodes as `[]`, `Some(items)` as `[items]`.
/// This leaves `None` distinguishable from `Some(vec![])`, which a
/// bare nil-string sentinel could not.
pub(crate) fn append_opt_list<T: Encodable>(s: &mut RlpStream, v: &Option<Vec<T>>) {
    match v {
        Some(items) => {
            s.begin_list(1);
            s.append_list(items);
        }
        None => {
            s.begin_list(0);
        }
    }
}

pub(crate) fn decode_opt_list<T: Decodable>(rlp: &Rlp) -> Result<Option<Vec<T>>, DecoderError> {
    if rlp.item_count()? == 0 {
        Ok(None)
    } else {
        Ok(Some(rlp.at(0)?.as_list()?))
    }
}
