//! Configuration for callers who want [`Cache`](crate::Cache) to manage
//! its own buffers via ordinary heap allocation.
//!
//! [`Cache`](crate::Cache) itself never allocates: it computes buffer
//! sizes and leaves allocation to the caller, which is what makes it
//! usable with caller-provided memory in a `no_std` context with no
//! global allocator. [`Cache::with_capacity`](crate::Cache::with_capacity)
//! is the sugar on top for the common case where `alloc` is available
//! and a caller just wants a working cache without performing the
//! two-phase resize handshake by hand.
//!
//! # Sizing guidelines
//!
//! `key_size` is the number of bytes a key actually needs; `alignment`
//! pads it up (see [`crate::arena::align_key_size`]) to a boundary that
//! keeps multi-byte key fields naturally aligned when a caller reads
//! them back as, say, a `u64`. Pick `alignment` as the size of the
//! widest field in the key, rounded up to a power of two no greater than
//! sixteen; for a key that is just opaque bytes with no internal
//! structure, `alignment = 1` (or any convenient small power of two) is
//! fine.

use core::num::NonZeroU32;

/// Capacity, key size, and alignment for a [`Cache`](crate::Cache) that
/// manages its own buffers.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Number of slots the cache should hold.
    pub capacity: NonZeroU32,
    /// Requested key size in bytes, before alignment padding.
    pub key_size: u32,
    /// Alignment to round `key_size` up to; must be a power of two no
    /// greater than sixteen.
    pub alignment: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::required_bytes;
    use crate::cache::Cache;
    use crate::hash::{ByteEq, Fnv1a64, NoopDestroy};

    #[test]
    fn with_capacity_produces_a_usable_cache() {
        let config = CacheConfig {
            capacity: NonZeroU32::new(16).unwrap(),
            key_size: 4,
            alignment: 4,
        };
        let mut cache = Cache::with_capacity(config, Fnv1a64, ByteEq, NoopDestroy).unwrap();
        assert_eq!(cache.capacity(), 16);
        assert_eq!(cache.key_size(), 4);

        let (slot, inserted) = cache.lookup_or_insert(b"abcd", true);
        assert!(inserted);
        assert_eq!(cache.lookup(b"abcd"), slot);
    }

    #[test]
    fn with_capacity_rounds_key_size_up_to_alignment() {
        let config = CacheConfig {
            capacity: NonZeroU32::new(4).unwrap(),
            key_size: 3,
            alignment: 8,
        };
        let cache = Cache::with_capacity(config, Fnv1a64, ByteEq, NoopDestroy).unwrap();
        assert_eq!(cache.key_size(), 8);
        let _ = required_bytes(cache.key_size(), cache.capacity()).unwrap();
    }
}
