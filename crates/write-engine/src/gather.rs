//! [`gather`]: materialises a run of in-memory buffers into an iovec batch
//! for a single vectored-write syscall.
//!
//! This is a stateless procedure, not a type: it borrows
//! [`PendingState`](crate::pending::PendingState) for the duration of one
//! call and never outlives it.

use std::io::{self, IoSlice};

use bytes::Bytes;

use crate::item::WriteItem;
use crate::pending::PendingState;

/// The two platform constants that bound a single `writev`-style call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorLimits {
    /// Maximum number of iovecs a single syscall accepts (`IOV_MAX`).
    pub count: usize,
    /// Maximum total byte count a single syscall can report without
    /// overflowing its signed return value.
    pub bytes: usize,
}

impl VectorLimits {
    /// Reasonable, widely-supported defaults: 1024 iovecs, `i32::MAX` bytes.
    #[must_use]
    pub const fn platform_default() -> Self {
        Self {
            count: default_vector_limit_count(),
            bytes: i32::MAX as usize,
        }
    }
}

impl Default for VectorLimits {
    fn default() -> Self {
        Self::platform_default()
    }
}

#[cfg(unix)]
const fn default_vector_limit_count() -> usize {
    // `sysconf(_SC_IOV_MAX)` is the precise answer but isn't a const fn;
    // 1024 is POSIX's documented minimum-and-typical value (Linux, macOS,
    // the BSDs all report exactly this). Runtime detection lives in
    // `VectorLimits::detect`.
    1024
}

#[cfg(not(unix))]
const fn default_vector_limit_count() -> usize {
    1024
}

#[cfg(unix)]
impl VectorLimits {
    /// Queries `sysconf(_SC_IOV_MAX)` at runtime, falling back to
    /// [`VectorLimits::platform_default`] if the platform declines to
    /// answer (as some sandboxes do).
    #[must_use]
    #[allow(unsafe_code)]
    pub fn detect() -> Self {
        // SAFETY: `sysconf` with a well-known, stateless informational key
        // never touches memory we own.
        let raw = unsafe { libc::sysconf(libc::_SC_IOV_MAX) };
        let count = usize::try_from(raw).unwrap_or_else(|_| default_vector_limit_count());
        let count = if count == 0 {
            default_vector_limit_count()
        } else {
            count
        };
        Self {
            count,
            bytes: i32::MAX as usize,
        }
    }
}

/// Fills `storage` with retained clones of up to [`VectorLimits::count`]
/// leading flushed byte buffers (stopping at a file region, the natural
/// batch boundary), invokes `syscall` over the resulting iovecs, then
/// releases every retention before returning.
///
/// Returns `(attempted, result)` where `attempted` is the number of
/// leading items the caller should pass to
/// [`PendingState::did_write`](crate::pending::PendingState::did_write).
/// `attempted` is one larger than the number of items actually packed
/// whenever more flushed byte buffers existed than fit the batch, so a
/// fully-successful syscall still classifies as `WrittenPartially` rather
/// than `WrittenCompletely`.
///
/// # Panics
///
/// Panics if `state` has no flushed items; callers must check
/// [`PendingState::has_flushed_items`](crate::pending::PendingState::has_flushed_items)
/// first.
pub fn gather(
    state: &PendingState,
    storage: &mut Vec<Bytes>,
    limits: VectorLimits,
    mut syscall: impl FnMut(&[IoSlice<'_>]) -> io::Result<usize>,
) -> (usize, io::Result<usize>) {
    assert!(
        state.has_flushed_items(),
        "gather requires at least one flushed item"
    );
    storage.clear();

    let flushed = state.flushed_count();
    let n = flushed.min(limits.count);
    let mut hit_limit = flushed > limits.count;
    let mut to_write = 0usize;

    for i in 0..n {
        let item = state
            .get(i)
            .expect("index is within the flushed prefix we just bounded");

        let WriteItem::Buffer(bytes) = item else {
            // A file region is the natural batch boundary: the caller
            // re-dispatches through the single/file path on the next spin.
            hit_limit = false;
            break;
        };

        let remaining = bytes.len();
        if !storage.is_empty() && limits.bytes - to_write < remaining {
            hit_limit = true;
            break;
        }

        let take = remaining.min(limits.bytes);
        let retained = if take == remaining {
            bytes.clone()
        } else {
            bytes.slice(0..take)
        };
        storage.push(retained);
        to_write += take;
    }

    let used = storage.len();
    let iovecs: Vec<IoSlice<'_>> = storage.iter().map(|b| IoSlice::new(b)).collect();
    let result = if iovecs.is_empty() {
        Ok(0)
    } else {
        syscall(&iovecs)
    };
    storage.clear();

    (used + usize::from(hit_limit), result)
}
