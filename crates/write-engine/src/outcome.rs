//! The result categories a drain attempt can produce.

/// What a single syscall closure reported back to the engine.
///
/// Mirrors the two shapes a non-blocking stream write can return: some
/// forward progress (`Processed`), or none because the socket's send
/// buffer is full (`WouldBlock`, possibly after partial progress).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainResult {
    /// The syscall transferred `n` bytes and reported no further blocking.
    Processed(usize),
    /// The syscall would have blocked after transferring `n` bytes (`n` may
    /// be zero).
    WouldBlock(usize),
}

impl DrainResult {
    /// Bytes reported as transferred, regardless of variant.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Processed(n) | Self::WouldBlock(n) => n,
        }
    }

    /// True for `WouldBlock(0)`, the only case that short-circuits
    /// `PendingState::did_write` without consuming anything.
    #[must_use]
    pub const fn is_blocked_immediately(self) -> bool {
        matches!(self, Self::WouldBlock(0))
    }
}

/// The outcome of a single `trigger` drain attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Every item the engine attempted to write was fully consumed.
    WrittenCompletely,
    /// Some, but not all, attempted items (or bytes) were consumed.
    WrittenPartially,
    /// There was nothing flushed and queued to write.
    NothingToBeWritten,
    /// The syscall reported `WouldBlock` before any progress was made.
    WouldBlock,
    /// The engine observed its `closed` flag set and attempted no syscall.
    Closed,
}
