//! Byte-at-a-time binary probe for the highest stored block, without
//! a full scan: `O(width · log 256)` ranged-iterator probes.
//!
//! Unlike the two-phase original (a leading-zero-byte scan followed by
//! per-byte bisection), this collapses both phases into one uniform
//! per-byte bisection — the first byte's bisection naturally lands on
//! `0` when the stored block numbers are small, so the leading-zero
//! detection pass is redundant. Same probe bound, same result.

use substate_kvdb::StoreBackend;
use substate_primitives::Result;

fn has_entry_at(backend: &dyn StoreBackend, prefix: &[u8], start: &[u8]) -> Result<bool> {
    Ok(backend.new_iterator(prefix, start).next().is_some())
}

/// Resolves the `width`-byte big-endian tail (immediately following
/// `prefix`) belonging to the lexicographically largest key under
/// `prefix`, or `None` if no key exists under `prefix` at all.
pub fn find_last_key_tail(
    backend: &dyn StoreBackend,
    prefix: &[u8],
    width: usize,
) -> Result<Option<Vec<u8>>> {
    if !has_entry_at(backend, prefix, &[])? {
        return Ok(None);
    }

    let mut found = Vec::with_capacity(width);
    for _ in 0..width {
        let mut lo: u16 = 0;
        let mut hi: u16 = 255;
        let mut best: u8 = 0;
        while lo <= hi {
            let mid = ((lo + hi) / 2) as u8;
            let mut start = found.clone();
            start.push(mid);
            if has_entry_at(backend, prefix, &start)? {
                best = mid;
                if mid == 255 {
                    break;
                }
                lo = mid as u16 + 1;
            } else {
                if mid == 0 {
                    break;
                }
                hi = mid as u16 - 1;
            }
        }
        found.push(best);
    }
    Ok(Some(found))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_block_key(backend: &dyn StoreBackend, block: u64) {
        let mut key = b"1s".to_vec();
        key.extend_from_slice(&block.to_be_bytes());
        backend.put(&key, b"x").unwrap();
    }

    #[test]
    fn finds_the_largest_block_with_small_values() {
        let backend = substate_kvdb::open_in_memory();
        for block in [1u64, 2, 5] {
            put_block_key(backend.as_ref(), block);
        }
        let tail = find_last_key_tail(backend.as_ref(), b"1s", 8).unwrap().unwrap();
        assert_eq!(u64::from_be_bytes(tail.try_into().unwrap()), 5);
    }

    #[test]
    fn finds_a_large_block_number() {
        let backend = substate_kvdb::open_in_memory();
        for block in [1u64, 2, 37_534_834, 37_534_835] {
            put_block_key(backend.as_ref(), block);
        }
        let tail = find_last_key_tail(backend.as_ref(), b"1s", 8).unwrap().unwrap();
        assert_eq!(u64::from_be_bytes(tail.try_into().unwrap()), 37_534_835);
    }

    #[test]
    fn empty_prefix_returns_none() {
        let backend = substate_kvdb::open_in_memory();
        assert!(find_last_key_tail(backend.as_ref(), b"1s", 8).unwrap().is_none());
    }

    #[test]
    fn ignores_a_trailing_suffix_after_the_resolved_width() {
        let backend = substate_kvdb::open_in_memory();
        let mut key = b"1s".to_vec();
        key.extend_from_slice(&7u64.to_be_bytes());
        key.extend_from_slice(&3u64.to_be_bytes());
        backend.put(&key, b"x").unwrap();

        let tail = find_last_key_tail(backend.as_ref(), b"1s", 8).unwrap().unwrap();
        assert_eq!(u64::from_be_bytes(tail.try_into().unwrap()), 7);
    }
}
