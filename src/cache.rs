//! The cache itself: a bucketed hash index layered over a slot arena, with
//! two intrusive lists threaded through the arena (global recency, and
//! per-bucket collision chains) kept consistent on every access.
//!
//! # How the algorithm works
//!
//! Every slot belongs to exactly one position on the **global list**,
//! ordered least- to most-recently-used, with every never-yet-used slot
//! sitting at the LRU end. A slot additionally belongs to at most one
//! **bucket chain**: the chain of slots whose key hashes to the same
//! bucket, ordered so the chain head is always that bucket's
//! most-recently-used member.
//!
//! ```text
//!               bucket chains (local MRU -> local LRU)
//!   index[0] -> [slot 4] -> [slot 9] -> NIL
//!   index[1] -> NIL
//!   index[2] -> [slot 1] -> NIL
//!
//!               global list (LRU ---------------------> MRU)
//!   global_lru -> [slot 7(unused)] -> [slot 1] -> [slot 9] -> [slot 4] <- global_mru
//! ```
//!
//! [`Cache::lookup_or_insert`] is the only operation that mutates either
//! list. A hit promotes the found slot to the MRU end of the global list.
//! A miss-with-insert reuses the current global-LRU slot: if it is
//! already in use, its key is handed to the destroy callback and the slot
//! is removed from its old bucket chain; either way the new key is
//! written in place and the slot is threaded onto the MRU end of both the
//! global list and its new bucket chain.
//!
//! Three primitives do all the list surgery and are reused by every
//! higher-level operation: [`Cache::unlink_global`] /
//! [`Cache::append_global_mru`] (composed into
//! [`Cache::promote_global`]), and [`Cache::move_chain`], which moves a
//! slot between bucket chains or removes it from its chain entirely
//! (selected by passing `None` as the destination bucket).
//!
//! # Example
//!
//! ```
//! use cachemap::{Cache, ByteEq, NoopDestroy};
//!
//! let mut cache = Cache::new(4, |key: &[u8], cap: u32| key[0] as u32 % cap, ByteEq, NoopDestroy)
//!     .unwrap();
//! let (index_bytes, slot_bytes) = cache.set_capacity(2).unwrap();
//! cache
//!     .set_buffers(
//!         vec![0u32; index_bytes / 4].into_boxed_slice(),
//!         vec![0u8; slot_bytes].into_boxed_slice(),
//!     )
//!     .unwrap();
//!
//! let (slot, inserted) = cache.lookup_or_insert(b"key0", true);
//! assert!(inserted);
//! assert!(slot.is_some());
//!
//! let (slot2, inserted2) = cache.lookup_or_insert(b"key0", true);
//! assert_eq!(slot, slot2);
//! assert!(!inserted2);
//! ```

use alloc::boxed::Box;
use alloc::vec;

use crate::arena::{align_key_size, required_bytes, IndexTable, SlotArena, NIL};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::hash::{CompareFn, DestroyFn, HashFn};

/// A fixed-capacity, in-place LRU cache over caller-provided memory.
///
/// `H`, `C`, and `D` are the pluggable hash, compare, and destroy
/// strategies (see [`HashFn`], [`CompareFn`], and [`DestroyFn`]) — the
/// same role a [`core::hash::BuildHasher`] plays for a standard hash map,
/// generalized to three seams instead of one because this cache never
/// looks at a typed key, only at opaque, fixed-width byte runs.
///
/// A freshly [`Cache::new`]d cache has zero capacity and holds no
/// buffers. Call [`Cache::set_capacity`] followed by [`Cache::set_buffers`]
/// to give it somewhere to live; see the module documentation for why
/// this is a two-phase handshake instead of a single call.
pub struct Cache<H, C, D> {
    index: IndexTable,
    arena: SlotArena,
    key_size: u32,
    capacity: u32,
    pending_capacity: u32,
    global_lru: u32,
    global_mru: u32,
    hash: H,
    compare: C,
    destroy: D,
}

impl<H, C, D> core::fmt::Debug for Cache<H, C, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cache")
            .field("key_size", &self.key_size)
            .field("capacity", &self.capacity)
            .field("pending_capacity", &self.pending_capacity)
            .finish_non_exhaustive()
    }
}

impl<H, C, D> Cache<H, C, D>
where
    H: HashFn,
    C: CompareFn,
    D: DestroyFn,
{
    /// Create a cache with zero capacity and no buffers, for keys of
    /// `key_size` bytes (already aligned; see
    /// [`crate::arena::align_key_size`] if it isn't).
    ///
    /// Call [`Self::set_capacity`] then [`Self::set_buffers`] before
    /// using it.
    pub fn new(key_size: u32, hash: H, compare: C, destroy: D) -> Result<Self> {
        if key_size == 0 {
            return Err(CacheError::InvalidArgument);
        }
        Ok(Cache {
            index: IndexTable::empty(),
            arena: SlotArena::empty(key_size),
            key_size,
            capacity: 0,
            pending_capacity: 0,
            global_lru: NIL,
            global_mru: NIL,
            hash,
            compare,
            destroy,
        })
    }

    /// Build a cache at `config`'s capacity, allocating both buffers on
    /// the heap.
    ///
    /// Runs [`crate::arena::align_key_size`], [`Self::new`],
    /// [`Self::set_capacity`], and [`Self::set_buffers`] in sequence, so a
    /// caller who does not need custom allocation can skip the two-phase
    /// handshake entirely.
    pub fn with_capacity(config: CacheConfig, hash: H, compare: C, destroy: D) -> Result<Self> {
        let key_size = align_key_size(config.key_size, config.alignment)?;
        let mut cache = Self::new(key_size, hash, compare, destroy)?;
        let (index_bytes, slot_bytes) = cache.set_capacity(config.capacity.get())?;
        let index_buffer: Box<[u32]> = vec![0u32; index_bytes / 4].into_boxed_slice();
        let slot_buffer: Box<[u8]> = vec![0u8; slot_bytes].into_boxed_slice();
        cache.set_buffers(index_buffer, slot_buffer)?;
        Ok(cache)
    }

    /// The key size every slot was configured with at [`Self::new`].
    pub fn key_size(&self) -> u32 {
        self.key_size
    }

    /// The currently installed capacity (zero until the first
    /// `set_buffers` call completes).
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// The raw bytes of the currently installed slot buffer.
    ///
    /// Exposed so a caller growing the cache can copy the live prefix
    /// forward into the larger buffer it builds for the next
    /// [`Self::set_buffers`] call; see that method's documentation for
    /// the exact contract.
    pub fn raw_slot_bytes(&self) -> &[u8] {
        self.arena.as_bytes()
    }

    /// The raw bucket-head array of the currently installed index
    /// buffer. Unlike [`Self::raw_slot_bytes`], a grow never needs to
    /// copy this forward — `set_buffers` rebuilds every bucket head from
    /// scratch on growth — but it is exposed for symmetry and for
    /// diagnostics.
    pub fn raw_index(&self) -> &[u32] {
        self.index.as_slice()
    }

    /// Phase A of a resize: stage a new capacity and compute the byte
    /// sizes of the two buffers [`Self::set_buffers`] will need.
    ///
    /// If `new_capacity` is smaller than the current capacity, every
    /// slot that would fall outside the new range is evicted immediately
    /// (invoking the destroy callback on any that are in use) and every
    /// surviving slot is rebucketed in place, so the cache is fully
    /// usable at the smaller capacity even before `set_buffers` is
    /// called. Growing defers all work to `set_buffers`, since there is
    /// nowhere to put new slots until the caller supplies a larger
    /// buffer.
    pub fn set_capacity(&mut self, new_capacity: u32) -> Result<(usize, usize)> {
        if new_capacity == 0 {
            return Err(CacheError::InvalidArgument);
        }
        let sizes = required_bytes(self.key_size, new_capacity)?;

        if new_capacity < self.capacity {
            let old_capacity = self.capacity;

            for slot in new_capacity..old_capacity {
                if !self.arena.is_unused(slot) {
                    let bucket = self.hash.hash(self.arena.key(slot), old_capacity);
                    self.move_chain(slot, bucket, None);
                }
                self.unlink_global(slot);
            }

            // Survivors are now the entire global list; walking it
            // LRU-to-MRU and moving each one leaves every bucket's head
            // as its globally most-recent member.
            let mut slot = self.global_lru;
            while slot != NIL {
                let next = self.arena.next_global(slot);
                if !self.arena.is_unused(slot) {
                    let old_bucket = self.hash.hash(self.arena.key(slot), old_capacity);
                    let new_bucket = self.hash.hash(self.arena.key(slot), new_capacity);
                    self.move_chain(slot, old_bucket, Some(new_bucket));
                }
                slot = next;
            }

            self.capacity = new_capacity;
        }

        self.pending_capacity = new_capacity;
        Ok(sizes)
    }

    /// Phase B of a resize: install buffers sized per the last
    /// [`Self::set_capacity`] call.
    ///
    /// `index_buffer` must hold exactly `pending_capacity` `u32`s and
    /// `slot_buffer` must be exactly
    /// `required_bytes(key_size, pending_capacity).1` bytes, both
    /// verified before anything else happens, so a mismatched pair is
    /// rejected without disturbing the current buffers.
    ///
    /// When growing, the caller's `slot_buffer` must retain the prior
    /// buffer's prefix bytes unchanged (e.g. by reallocating the same
    /// allocation larger) — the cache reads old slots directly out of
    /// that prefix to decide what gets rebucketed into the new index.
    /// When shrinking, `set_capacity` already performed the shrink; this
    /// call only adopts the caller's (possibly now-smaller) buffers.
    pub fn set_buffers(&mut self, index_buffer: Box<[u32]>, slot_buffer: Box<[u8]>) -> Result<()> {
        let (index_bytes, slot_bytes) = required_bytes(self.key_size, self.pending_capacity)?;
        if index_buffer.len() != index_bytes / 4 || slot_buffer.len() != slot_bytes {
            return Err(CacheError::InvalidArgument);
        }

        let old_capacity = self.capacity;
        let new_capacity = self.pending_capacity;

        self.arena.replace_buffer(slot_buffer, new_capacity);
        self.index.replace_buffer(index_buffer);

        if new_capacity > old_capacity {
            // The freshly-installed index buffer cannot be trusted to
            // hold meaningful bucket heads; every bucket is rebuilt.
            self.index.fill_nil();

            for slot in old_capacity..new_capacity {
                self.arena.mark_unused(slot);
                self.arena.set_next_chain(slot, NIL);
                let prev = if slot == old_capacity { NIL } else { slot - 1 };
                let next = if slot + 1 == new_capacity { NIL } else { slot + 1 };
                self.arena.set_prev_global(slot, prev);
                self.arena.set_next_global(slot, next);
            }

            if old_capacity == 0 {
                self.global_mru = new_capacity - 1;
            } else {
                let old_lru = self.global_lru;
                self.arena.set_next_global(new_capacity - 1, old_lru);
                self.arena.set_prev_global(old_lru, new_capacity - 1);
            }
            self.global_lru = old_capacity;

            let mut slot = self.global_lru;
            while slot != NIL {
                let next = self.arena.next_global(slot);
                if !self.arena.is_unused(slot) {
                    let bucket = self.hash.hash(self.arena.key(slot), new_capacity);
                    self.insert_chain_head(slot, bucket);
                }
                slot = next;
            }
        }

        self.capacity = new_capacity;
        Ok(())
    }

    /// Look up `key`, promoting it to most-recently-used on a hit.
    /// Never inserts; returns `None` on a miss or when the cache has no
    /// capacity yet.
    pub fn lookup(&mut self, key: &[u8]) -> Option<u32> {
        self.lookup_or_insert(key, false).0
    }

    /// Look up `key`; on a miss, evict the global-LRU slot and insert
    /// `key` into it unless `want_put` is false.
    ///
    /// Returns the slot holding `key` (or `None` if the cache has no
    /// capacity, or `want_put` is false and there was no hit) and a flag
    /// that is `true` exactly when this call performed an insertion.
    pub fn lookup_or_insert(&mut self, key: &[u8], want_put: bool) -> (Option<u32>, bool) {
        if self.capacity == 0 {
            return (None, false);
        }

        let bucket = self.hash.hash(key, self.capacity);
        let mut slot = self.index.get(bucket);
        while slot != NIL {
            if self.compare.compare(self.arena.key(slot), key) == 0 {
                self.promote_global(slot);
                return (Some(slot), false);
            }
            slot = self.arena.prev_chain(slot);
        }

        if !want_put {
            return (None, false);
        }

        (self.put_key(key), true)
    }

    /// Evict every used slot, invoking the destroy callback on each in
    /// most-recently-used-first order. A no-op on an empty or
    /// zero-capacity cache.
    pub fn flush(&mut self) {
        if self.capacity == 0 {
            return;
        }
        let mut slot = self.global_mru;
        while slot != NIL {
            if self.arena.is_unused(slot) {
                break;
            }
            let prev = self.arena.prev_global(slot);
            let bucket = self.hash.hash(self.arena.key(slot), self.capacity);
            self.move_chain(slot, bucket, None);
            slot = prev;
        }
    }

    /// True iff every slot is currently in use (or the cache has no
    /// capacity, in which case nothing can ever be inserted either).
    pub fn is_full(&self) -> bool {
        if self.global_lru == NIL {
            true
        } else {
            !self.arena.is_unused(self.global_lru)
        }
    }

    /// The key bytes stored in `slot`, or `None` if `slot` is out of
    /// range. Does not check whether the slot is in use; callers
    /// typically only call this with a slot index returned from
    /// [`Self::lookup_or_insert`].
    pub fn slot_key(&self, slot: u32) -> Option<&[u8]> {
        if slot >= self.capacity {
            None
        } else {
            Some(self.arena.key(slot))
        }
    }

    /// A stable pointer to slot `i`'s key bytes, valid until the next
    /// mutation of that slot (a hit promoting it, an eviction overwriting
    /// it, or a resize). `None` if `i` is out of range.
    ///
    /// [`Self::slot_key`] is the safe, borrow-checked equivalent of this
    /// method and should be preferred; this exists for callers that need
    /// a raw pointer to hand to FFI or to code outside the borrow checker's
    /// reach.
    pub fn slot_pointer(&self, slot: u32) -> Option<*const u8> {
        if slot >= self.capacity {
            None
        } else {
            Some(self.arena.key_ptr(slot))
        }
    }

    fn put_key(&mut self, key: &[u8]) -> Option<u32> {
        if self.global_lru == NIL {
            return None;
        }

        let victim = self.global_lru;
        let new_bucket = self.hash.hash(key, self.capacity);
        let old_bucket = if self.arena.is_unused(victim) {
            new_bucket
        } else {
            let old_bucket = self.hash.hash(self.arena.key(victim), self.capacity);
            let evicted_key = self.arena.key(victim);
            self.destroy.destroy(evicted_key, victim);
            old_bucket
        };

        self.arena.set_key(victim, key);
        self.promote_global(victim);
        self.move_chain(victim, old_bucket, Some(new_bucket));
        Some(victim)
    }

    fn unlink_global(&mut self, slot: u32) {
        let prev = self.arena.prev_global(slot);
        let next = self.arena.next_global(slot);

        if prev != NIL {
            self.arena.set_next_global(prev, next);
        } else {
            self.global_lru = next;
        }

        if next != NIL {
            self.arena.set_prev_global(next, prev);
        } else {
            self.global_mru = prev;
        }

        self.arena.set_prev_global(slot, NIL);
        self.arena.set_next_global(slot, NIL);
    }

    fn append_global_mru(&mut self, slot: u32) {
        let old_mru = self.global_mru;
        self.arena.set_prev_global(slot, old_mru);
        self.arena.set_next_global(slot, NIL);
        if old_mru != NIL {
            self.arena.set_next_global(old_mru, slot);
        } else {
            self.global_lru = slot;
        }
        self.global_mru = slot;
    }

    /// Move `slot` to the MRU end of the global list. A no-op if it is
    /// already there.
    fn promote_global(&mut self, slot: u32) {
        if self.global_mru == slot {
            return;
        }
        self.unlink_global(slot);
        self.append_global_mru(slot);
    }

    /// Move `slot` from bucket `old_bucket` to bucket `new_bucket`, or
    /// remove it from its chain entirely when `new_bucket` is `None`
    /// (invoking the destroy callback first if the slot was in use). A
    /// no-op if `slot` is already the head of `new_bucket`.
    ///
    /// `slot` must currently be unused, or a member of `old_bucket`'s
    /// chain (which is always the case for an `old_bucket` freshly
    /// computed from the slot's own key).
    fn move_chain(&mut self, slot: u32, old_bucket: u32, new_bucket: Option<u32>) {
        if new_bucket.is_none() && !self.arena.is_unused(slot) {
            let key = self.arena.key(slot);
            self.destroy.destroy(key, slot);
        }

        if let Some(bucket) = new_bucket {
            if self.index.get(bucket) == slot {
                return;
            }
        }

        let prev_chain = self.arena.prev_chain(slot);
        let next_chain = self.arena.next_chain(slot);

        if prev_chain != slot {
            if prev_chain != NIL {
                self.arena.set_next_chain(prev_chain, next_chain);
            }
            if next_chain != NIL {
                self.arena.set_prev_chain(next_chain, prev_chain);
            } else {
                self.index.set(old_bucket, prev_chain);
            }
        }

        match new_bucket {
            None => self.arena.mark_unused(slot),
            Some(bucket) => self.insert_chain_head(slot, bucket),
        }
    }

    /// Splice `slot` onto the MRU end of `bucket`'s chain without
    /// touching whatever chain it may already be on. Used by
    /// [`Self::move_chain`]'s insert half, and directly by the grow path
    /// of [`Self::set_buffers`], which rebuilds every bucket from an
    /// empty index and so has no "old chain" to unlink from.
    fn insert_chain_head(&mut self, slot: u32, bucket: u32) {
        let old_head = self.index.get(bucket);
        self.arena.set_prev_chain(slot, old_head);
        if old_head != NIL {
            self.arena.set_next_chain(old_head, slot);
        }
        self.arena.set_next_chain(slot, NIL);
        self.index.set(bucket, slot);
    }
}
