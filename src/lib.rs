//! A fixed-capacity, in-place LRU cache keyed by opaque byte keys.
//!
//! Unlike a typical `HashMap`-backed LRU cache, this crate never
//! allocates its own storage. A [`Cache`] is a bucketed hash index laid
//! over a flat arena of fixed-width slots, and both buffers are supplied
//! by the caller — the crate only computes how big they need to be.
//! Every link between slots is a `u32` index into that arena rather than
//! a pointer, so the two intrusive lists threaded through it (one
//! covering every slot by recency, one per hash bucket for collision
//! chains) are ordinary safe Rust: slice indexing and little-endian
//! field encoding, no raw pointers anywhere.
//!
//! ```text
//!               bucket chains (local MRU -> local LRU)
//!   index[0] -> [slot 4] -> [slot 9] -> NIL
//!   index[2] -> [slot 1] -> NIL
//!
//!               global list (LRU ---------------------> MRU)
//!   global_lru -> [slot 7(unused)] -> [slot 1] -> [slot 9] -> [slot 4] <- global_mru
//! ```
//!
//! # Quick start
//!
//! The low-level [`Cache`] API hands buffer sizing to the caller in two
//! phases ([`Cache::set_capacity`] then [`Cache::set_buffers`]), which is
//! what lets it run with no allocator at all. Most callers instead want
//! [`Cache::with_capacity`], which performs that handshake once using
//! ordinary heap allocation:
//!
//! ```rust
//! use cachemap::{CacheConfig, Cache, ByteEq, Fnv1a64, NoopDestroy};
//! use core::num::NonZeroU32;
//!
//! let config = CacheConfig {
//!     capacity: NonZeroU32::new(1024).unwrap(),
//!     key_size: 8,
//!     alignment: 8,
//! };
//! let mut cache = Cache::with_capacity(config, Fnv1a64, ByteEq, NoopDestroy).unwrap();
//!
//! let (slot, inserted) = cache.lookup_or_insert(&42u64.to_le_bytes(), true);
//! assert!(inserted);
//! assert_eq!(cache.lookup(&42u64.to_le_bytes()), slot);
//! ```
//!
//! # Modules
//!
//! - [`arena`]: the slot arena, link encoding, and buffer-sizing helpers.
//! - [`hash`]: pluggable hash/compare/destroy traits and ready-made
//!   implementations.
//! - [`cache`]: [`Cache`] itself — the access engine, resize engine, and
//!   the [`Cache::with_capacity`] convenience constructor.
//! - [`config`]: [`CacheConfig`], the plain-data configuration
//!   [`Cache::with_capacity`] takes.
//! - [`error`]: [`CacheError`], returned by every fallible entry point.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

/// The slot arena: buffer sizing, alignment, and the link/key layout of
/// a single slot.
pub mod arena;

/// The cache itself, wrapping the arena with a hash index and the
/// access/resize engines.
pub mod cache;

/// Allocating convenience layer over [`Cache`] for callers who don't
/// need to manage the two buffers themselves.
pub mod config;

/// Error type returned by fallible cache operations.
pub mod error;

/// Pluggable hash, compare, and destroy strategies, plus ready-made
/// implementations of each.
pub mod hash;

pub use cache::Cache;
pub use config::CacheConfig;
pub use error::CacheError;
pub use hash::{ByteEq, Djb2, Fnv1a64, NoopDestroy};
