//! Hash functions for the lookup tables
//!
//! Shortcut and domain tables key their buckets by a 32-bit djb2 variant
//! (`h = h * 33 ^ c`). The hash is computed over byte ranges so the URL
//! windows can be hashed in place without allocating substrings.

/// Initial djb2 state.
const DJB2_SEED: u32 = 5381;

/// djb2 (xor variant) over a byte slice.
#[inline]
pub fn djb2_hash(data: &[u8]) -> u32 {
    data.iter()
        .fold(DJB2_SEED, |h, &c| h.wrapping_mul(33) ^ c as u32)
}

/// djb2 over `data[start..end]`.
///
/// Returns the seed for an empty or out-of-bounds range.
#[inline]
pub fn djb2_hash_between(data: &[u8], start: usize, end: usize) -> u32 {
    match data.get(start..end) {
        Some(window) => djb2_hash(window),
        None => DJB2_SEED,
    }
}

/// Hash a string.
#[inline]
pub fn djb2_hash_str(s: &str) -> u32 {
    djb2_hash(s.as_bytes())
}
