//! Error types surfaced by the write engine.

use std::io;

use thiserror::Error;

/// Result type returned by fallible write-engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures that can surface from [`crate::WriteEngine::trigger`].
///
/// `WouldBlock` and partial progress are not errors -- they are reported
/// through [`crate::WriteOutcome`] instead. Only the cases below unwind out
/// of `trigger`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// A syscall closure returned a fatal I/O failure (anything other than
    /// `Interrupted` or `WouldBlock`, which the engine absorbs internally).
    #[error("write engine I/O failure: {0}")]
    Io(
        #[from]
        #[source]
        io::Error,
    ),
    /// An operation was attempted on an engine that already observed
    /// `fail_all(.., close: true)`.
    #[error("write engine is closed")]
    Closed,
    /// `fail_all(.., close: true)` was called on an engine that was already closed.
    #[error("write engine was already closed")]
    AlreadyClosed,
}
