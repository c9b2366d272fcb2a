//! The slot arena: a contiguous, caller-sized buffer of fixed-width slots,
//! each carrying four link fields and an inline key payload.
//!
//! Every "pointer" in this crate is a [`u32`] index into a single owned
//! buffer rather than a pointer into a separately-allocated node. That
//! is what lets the two intrusive lists in [`crate::cache`] live entirely
//! in safe Rust: there is no aliasing to reason about, only ordinary
//! slice indexing. [`NIL`] is the sentinel marking the absence of a link,
//! chosen as `u32::MAX` so that a fully-populated `u32` index space still
//! leaves one value free to mean "none".

use crate::error::{CacheError, Result};

/// Sentinel value marking the absence of a link.
pub const NIL: u32 = u32::MAX;

/// Number of `u32` link fields stored at the front of every slot:
/// `prev_global`, `next_global`, `prev_chain`, `next_chain`.
const LINK_FIELDS: usize = 4;

/// Byte size of a slot's link header, ahead of its inline key bytes.
pub const LINK_HEADER_BYTES: u32 = (LINK_FIELDS * 4) as u32;

const MAX_ALIGNMENT: u32 = 16;

/// Round `requested` key-byte size up to the nearest multiple of
/// `alignment`.
///
/// `alignment` must be a power of two no greater than [`MAX_ALIGNMENT`]
/// (the same bound the on-disk layout uses for its link header). Returns
/// [`CacheError::InvalidArgument`] for a zero size, a zero or non-power-
/// of-two alignment, or an alignment above the bound, and
/// [`CacheError::Overflow`] if rounding up would wrap `u32`.
pub fn align_key_size(requested: u32, alignment: u32) -> Result<u32> {
    if requested == 0
        || alignment == 0
        || !alignment.is_power_of_two()
        || alignment > MAX_ALIGNMENT
    {
        return Err(CacheError::InvalidArgument);
    }

    let mask = alignment - 1;
    let rounded = requested
        .checked_add(mask)
        .ok_or(CacheError::Overflow)?
        & !mask;

    if rounded < requested {
        return Err(CacheError::Overflow);
    }

    Ok(rounded)
}

/// Compute the exact byte sizes of the two buffers a cache of the given
/// rounded key size and capacity needs: `(index_bytes, slot_bytes)`.
///
/// Returns [`CacheError::InvalidArgument`] if `capacity` is zero, and
/// [`CacheError::Overflow`] if the sizes would overflow `usize`.
pub fn required_bytes(rounded_key_bytes: u32, capacity: u32) -> Result<(usize, usize)> {
    if capacity == 0 {
        return Err(CacheError::InvalidArgument);
    }

    let slot_stride = (LINK_HEADER_BYTES as usize)
        .checked_add(rounded_key_bytes as usize)
        .ok_or(CacheError::Overflow)?;

    let capacity = capacity as usize;

    let index_bytes = capacity.checked_mul(4).ok_or(CacheError::Overflow)?;
    let slot_bytes = capacity
        .checked_mul(slot_stride)
        .ok_or(CacheError::Overflow)?;

    Ok((index_bytes, slot_bytes))
}

/// The four link fields threaded through a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Link {
    PrevGlobal,
    NextGlobal,
    PrevChain,
    NextChain,
}

/// A caller-sized buffer of slots, addressed by index.
///
/// Owns a `Box<[u8]>` whose length must equal
/// `required_bytes(key_size, capacity).1` for the arena's `key_size` and
/// `capacity`. Every accessor is plain slice indexing into that buffer;
/// there is no `unsafe` anywhere in this type.
#[derive(Debug, Clone)]
pub(crate) struct SlotArena {
    buf: alloc::boxed::Box<[u8]>,
    key_size: u32,
    capacity: u32,
}

impl SlotArena {
    /// An arena with no buffer installed yet, used for a cache between
    /// [`crate::cache::Cache::new`] and its first `set_buffers` call.
    pub(crate) fn empty(key_size: u32) -> Self {
        SlotArena {
            buf: alloc::boxed::Box::new([]),
            key_size,
            capacity: 0,
        }
    }

    /// Wrap `buf` as an arena of `capacity` slots each holding `key_size`
    /// bytes of key payload. `buf.len()` must equal
    /// `required_bytes(key_size, capacity).1`.
    pub(crate) fn new(buf: alloc::boxed::Box<[u8]>, key_size: u32, capacity: u32) -> Self {
        debug_assert_eq!(
            buf.len(),
            required_bytes(key_size, capacity)
                .map(|(_, slot_bytes)| slot_bytes)
                .unwrap_or(usize::MAX),
        );
        SlotArena {
            buf,
            key_size,
            capacity,
        }
    }

    pub(crate) fn capacity(&self) -> u32 {
        self.capacity
    }

    pub(crate) fn key_size(&self) -> u32 {
        self.key_size
    }

    fn stride(&self) -> usize {
        LINK_HEADER_BYTES as usize + self.key_size as usize
    }

    fn slot_offset(&self, slot: u32) -> usize {
        debug_assert!(slot < self.capacity);
        slot as usize * self.stride()
    }

    fn link_offset(&self, slot: u32, link: Link) -> usize {
        let field = match link {
            Link::PrevGlobal => 0,
            Link::NextGlobal => 1,
            Link::PrevChain => 2,
            Link::NextChain => 3,
        };
        self.slot_offset(slot) + field * 4
    }

    fn get_link(&self, slot: u32, link: Link) -> u32 {
        let off = self.link_offset(slot, link);
        let bytes: [u8; 4] = self.buf[off..off + 4].try_into().expect("4-byte link slice");
        u32::from_le_bytes(bytes)
    }

    fn set_link(&mut self, slot: u32, link: Link, value: u32) {
        let off = self.link_offset(slot, link);
        self.buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn prev_global(&self, slot: u32) -> u32 {
        self.get_link(slot, Link::PrevGlobal)
    }

    pub(crate) fn set_prev_global(&mut self, slot: u32, value: u32) {
        self.set_link(slot, Link::PrevGlobal, value)
    }

    pub(crate) fn next_global(&self, slot: u32) -> u32 {
        self.get_link(slot, Link::NextGlobal)
    }

    pub(crate) fn set_next_global(&mut self, slot: u32, value: u32) {
        self.set_link(slot, Link::NextGlobal, value)
    }

    pub(crate) fn prev_chain(&self, slot: u32) -> u32 {
        self.get_link(slot, Link::PrevChain)
    }

    pub(crate) fn set_prev_chain(&mut self, slot: u32, value: u32) {
        self.set_link(slot, Link::PrevChain, value)
    }

    pub(crate) fn next_chain(&self, slot: u32) -> u32 {
        self.get_link(slot, Link::NextChain)
    }

    pub(crate) fn set_next_chain(&mut self, slot: u32, value: u32) {
        self.set_link(slot, Link::NextChain, value)
    }

    /// A slot is unused iff its `prev_chain` link points at itself.
    pub(crate) fn is_unused(&self, slot: u32) -> bool {
        self.prev_chain(slot) == slot
    }

    /// Mark `slot` unused by pointing its `prev_chain` link at itself.
    pub(crate) fn mark_unused(&mut self, slot: u32) {
        self.set_prev_chain(slot, slot);
    }

    pub(crate) fn key(&self, slot: u32) -> &[u8] {
        let off = self.slot_offset(slot) + LINK_HEADER_BYTES as usize;
        &self.buf[off..off + self.key_size as usize]
    }

    pub(crate) fn set_key(&mut self, slot: u32, bytes: &[u8]) {
        debug_assert_eq!(bytes.len(), self.key_size as usize);
        let off = self.slot_offset(slot) + LINK_HEADER_BYTES as usize;
        self.buf[off..off + self.key_size as usize].copy_from_slice(bytes);
    }

    /// Pointer to a slot's key bytes, for the public `slot_pointer` API.
    pub(crate) fn key_ptr(&self, slot: u32) -> *const u8 {
        self.key(slot).as_ptr()
    }

    /// The raw slot buffer, exposed so a caller growing the cache can
    /// copy the live prefix forward into a larger buffer before handing
    /// it back via `set_buffers`.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Replace this arena's backing buffer, adopting a new capacity.
    /// Used by Phase B of a resize once the caller has supplied a buffer
    /// of the size Phase A computed.
    pub(crate) fn replace_buffer(&mut self, buf: alloc::boxed::Box<[u8]>, capacity: u32) {
        self.buf = buf;
        self.capacity = capacity;
    }
}

/// The flat bucket-head array: one `u32` per bucket, `NIL` when empty.
#[derive(Debug, Clone)]
pub(crate) struct IndexTable {
    buf: alloc::boxed::Box<[u32]>,
}

impl IndexTable {
    /// An index table with no buffer installed yet.
    pub(crate) fn empty() -> Self {
        IndexTable {
            buf: alloc::boxed::Box::new([]),
        }
    }

    pub(crate) fn new(buf: alloc::boxed::Box<[u32]>) -> Self {
        IndexTable { buf }
    }

    pub(crate) fn len(&self) -> u32 {
        self.buf.len() as u32
    }

    pub(crate) fn get(&self, bucket: u32) -> u32 {
        self.buf[bucket as usize]
    }

    /// The raw bucket-head array, exposed for the same reason as
    /// [`SlotArena::as_bytes`].
    pub(crate) fn as_slice(&self) -> &[u32] {
        &self.buf
    }

    pub(crate) fn set(&mut self, bucket: u32, slot: u32) {
        self.buf[bucket as usize] = slot;
    }

    pub(crate) fn fill_nil(&mut self) {
        self.buf.fill(NIL);
    }

    pub(crate) fn replace_buffer(&mut self, buf: alloc::boxed::Box<[u32]>) {
        self.buf = buf;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn align_key_size_rounds_up() {
        assert_eq!(align_key_size(1, 8).unwrap(), 8);
        assert_eq!(align_key_size(8, 8).unwrap(), 8);
        assert_eq!(align_key_size(9, 8).unwrap(), 16);
        assert_eq!(align_key_size(3, 4).unwrap(), 4);
    }

    #[test]
    fn align_key_size_rejects_bad_input() {
        assert_eq!(align_key_size(0, 8), Err(CacheError::InvalidArgument));
        assert_eq!(align_key_size(4, 0), Err(CacheError::InvalidArgument));
        assert_eq!(align_key_size(4, 3), Err(CacheError::InvalidArgument));
        assert_eq!(align_key_size(4, 32), Err(CacheError::InvalidArgument));
    }

    #[test]
    fn align_key_size_detects_overflow() {
        assert_eq!(
            align_key_size(u32::MAX - 1, 16),
            Err(CacheError::Overflow)
        );
    }

    #[test]
    fn required_bytes_computes_exact_sizes() {
        let (index_bytes, slot_bytes) = required_bytes(8, 4).unwrap();
        assert_eq!(index_bytes, 16);
        assert_eq!(slot_bytes, 4 * (16 + 8));
    }

    #[test]
    fn required_bytes_rejects_zero_capacity() {
        assert_eq!(required_bytes(8, 0), Err(CacheError::InvalidArgument));
    }

    #[test]
    fn slot_links_round_trip() {
        let (_, slot_bytes) = required_bytes(4, 2).unwrap();
        let buf = vec![0u8; slot_bytes].into_boxed_slice();
        let mut arena = SlotArena::new(buf, 4, 2);

        arena.set_prev_global(0, NIL);
        arena.set_next_global(0, 1);
        arena.set_prev_global(1, 0);
        arena.set_next_global(1, NIL);

        assert_eq!(arena.prev_global(0), NIL);
        assert_eq!(arena.next_global(0), 1);
        assert_eq!(arena.prev_global(1), 0);
        assert_eq!(arena.next_global(1), NIL);
    }

    #[test]
    fn unused_marker_round_trips() {
        let (_, slot_bytes) = required_bytes(4, 2).unwrap();
        let buf = vec![0u8; slot_bytes].into_boxed_slice();
        let mut arena = SlotArena::new(buf, 4, 2);

        arena.mark_unused(0);
        assert!(arena.is_unused(0));

        arena.set_prev_chain(0, 1);
        assert!(!arena.is_unused(0));
    }

    #[test]
    fn key_bytes_round_trip() {
        let (_, slot_bytes) = required_bytes(4, 2).unwrap();
        let buf = vec![0u8; slot_bytes].into_boxed_slice();
        let mut arena = SlotArena::new(buf, 4, 2);

        arena.set_key(0, b"abcd");
        assert_eq!(arena.key(0), b"abcd");
        arena.set_key(1, b"wxyz");
        assert_eq!(arena.key(1), b"wxyz");
        assert_eq!(arena.key(0), b"abcd");
    }

    #[test]
    fn index_table_defaults_and_round_trips() {
        let buf = vec![NIL; 4].into_boxed_slice();
        let mut table = IndexTable::new(buf);
        assert_eq!(table.len(), 4);
        for b in 0..4 {
            assert_eq!(table.get(b), NIL);
        }
        table.set(2, 7);
        assert_eq!(table.get(2), 7);
        table.fill_nil();
        assert_eq!(table.get(2), NIL);
    }
}
