//! Hash-function helpers for keying into the bucket index.
//!
//! The cache does not hash keys itself; it calls a caller-supplied
//! [`HashFn`] every time it needs a bucket index. This module provides
//! the two step functions named in the on-disk format's glossary —
//! FNV-1a (64-bit) and DJB2 — plus ready-to-use [`HashFn`] implementations
//! built from them, so a caller who only needs "a reasonable hash" does
//! not have to write one from scratch.
//!
//! Both step functions take a running state and a chunk of bytes and
//! return the updated state; callers that need a multi-part key can
//! invoke the step function repeatedly before finishing with a modulus.

/// Initial state for [`fnv1a64_step`].
pub const FNV1A64_IV: u64 = 0xcbf2_9ce4_8422_2325;

/// Initial state for [`djb2_step`].
pub const DJB2_IV: u64 = 5381;

/// One step of the FNV-1a (64-bit) hash: XOR each byte into the state,
/// then multiply by the FNV prime.
pub fn fnv1a64_step(mut state: u64, data: &[u8]) -> u64 {
    for &byte in data {
        state ^= u64::from(byte);
        state = state.wrapping_mul(0x0000_0100_0000_01b3);
    }
    state
}

/// One step of the DJB2 hash: `state = state * 33 + byte` for each byte.
pub fn djb2_step(mut state: u64, data: &[u8]) -> u64 {
    for &byte in data {
        state = (state << 5).wrapping_add(state).wrapping_add(u64::from(byte));
    }
    state
}

/// A pluggable hash function: given key bytes and the cache's current
/// capacity, return a bucket index in `[0, capacity)`.
///
/// Implementations must be deterministic for a given `(key, capacity)`
/// pair and must not have side effects observable by the cache; the
/// access engine may call `hash` more than once for the same key during a
/// single operation (for example, once for the old bucket and once for
/// the new one during a resize).
///
/// The modulus against `capacity` is the hash function's responsibility,
/// not the cache's: [`fnv1a64_step`] and [`djb2_step`] only produce a
/// 64-bit state, they do not reduce it to a bucket index.
pub trait HashFn {
    /// Compute the bucket index for `key` given the current `capacity`.
    ///
    /// `capacity` is always greater than zero when the cache calls this
    /// method.
    fn hash(&self, key: &[u8], capacity: u32) -> u32;
}

impl<F> HashFn for F
where
    F: Fn(&[u8], u32) -> u32,
{
    fn hash(&self, key: &[u8], capacity: u32) -> u32 {
        self(key, capacity)
    }
}

/// A ready-to-use [`HashFn`] built from [`fnv1a64_step`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Fnv1a64;

impl HashFn for Fnv1a64 {
    fn hash(&self, key: &[u8], capacity: u32) -> u32 {
        let state = fnv1a64_step(FNV1A64_IV, key);
        (state % u64::from(capacity)) as u32
    }
}

/// A ready-to-use [`HashFn`] built from [`djb2_step`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Djb2;

impl HashFn for Djb2 {
    fn hash(&self, key: &[u8], capacity: u32) -> u32 {
        let state = djb2_step(DJB2_IV, key);
        (state % u64::from(capacity)) as u32
    }
}

/// A pluggable key-comparison function.
///
/// Must report equality consistently with the cache's uniqueness
/// invariant: for any two distinct used slots, `compare` must be nonzero.
pub trait CompareFn {
    /// Compare two keys of the cache's configured key size. Zero means
    /// equal.
    fn compare(&self, a: &[u8], b: &[u8]) -> i32;
}

impl<F> CompareFn for F
where
    F: Fn(&[u8], &[u8]) -> i32,
{
    fn compare(&self, a: &[u8], b: &[u8]) -> i32 {
        self(a, b)
    }
}

/// Byte-equality [`CompareFn`]: zero when the two key slices are
/// identical, one otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteEq;

impl CompareFn for ByteEq {
    fn compare(&self, a: &[u8], b: &[u8]) -> i32 {
        i32::from(a != b)
    }
}

/// A pluggable destroy callback, invoked once per evicted key before its
/// slot's bytes are reused.
///
/// Must be infallible and must not call back into the cache that invoked
/// it: the cache's lists are mid-surgery for the duration of the call.
pub trait DestroyFn {
    /// Observe the key bytes and slot index of an entry leaving the
    /// cache.
    fn destroy(&mut self, key: &[u8], slot: u32);
}

impl<F> DestroyFn for F
where
    F: FnMut(&[u8], u32),
{
    fn destroy(&mut self, key: &[u8], slot: u32) {
        self(key, slot)
    }
}

/// A [`DestroyFn`] that does nothing, for callers whose keys own no
/// resources worth releasing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDestroy;

impl DestroyFn for NoopDestroy {
    fn destroy(&mut self, _key: &[u8], _slot: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a64_matches_known_vector() {
        // "" hashes to the IV unchanged; a single zero byte moves it.
        assert_eq!(fnv1a64_step(FNV1A64_IV, &[]), FNV1A64_IV);
        assert_ne!(fnv1a64_step(FNV1A64_IV, &[0]), FNV1A64_IV);
    }

    #[test]
    fn djb2_matches_known_vector() {
        assert_eq!(djb2_step(DJB2_IV, &[]), DJB2_IV);
        assert_eq!(djb2_step(DJB2_IV, b"a"), DJB2_IV * 33 + 97);
    }

    #[test]
    fn hash_is_bounded_by_capacity() {
        let h = Fnv1a64;
        for cap in 1..32u32 {
            for b in 0..=255u8 {
                assert!(h.hash(&[b], cap) < cap);
            }
        }
    }

    #[test]
    fn byte_eq_detects_equality() {
        assert_eq!(ByteEq.compare(b"abc", b"abc"), 0);
        assert_ne!(ByteEq.compare(b"abc", b"abd"), 0);
    }

    #[test]
    fn closures_implement_the_traits() {
        let h = |key: &[u8], cap: u32| (key[0] as u32) % cap;
        assert_eq!(HashFn::hash(&h, &[5], 4), 1);

        let c = |a: &[u8], b: &[u8]| if a == b { 0 } else { 1 };
        assert_eq!(CompareFn::compare(&c, b"x", b"x"), 0);
    }
}
