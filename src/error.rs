//! Error types returned by fallible cache operations.
//!
//! Every fallible entry point in this crate returns `Result<T, CacheError>`.
//! A miss on a read-only lookup is **not** an error; it is reported as
//! `None`/a `NIL` slot index, matching the "absent" outcome described for
//! the access engine. `CacheError` is reserved for malformed calls: bad
//! sizes, bad alignments, and arithmetic overflow while sizing buffers.

use core::fmt;

/// Failure modes for the low-level cache API.
///
/// This type is `#[non_exhaustive]` so that future failure modes (for
/// example a more specific alignment error) can be added without a
/// breaking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CacheError {
    /// An argument was zero, out of range, or otherwise structurally
    /// invalid: a zero key size, a zero capacity, an unsupported
    /// alignment, or a buffer whose length does not match what
    /// [`required_bytes`](crate::arena::required_bytes) computed for it.
    InvalidArgument,
    /// A size computation overflowed the platform's address space, or a
    /// supplied buffer's base address plus its length would wrap.
    Overflow,
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidArgument => f.write_str("invalid argument"),
            CacheError::Overflow => f.write_str("size computation overflowed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CacheError {}

/// Convenience alias for results produced by this crate.
pub type Result<T> = core::result::Result<T, CacheError>;
