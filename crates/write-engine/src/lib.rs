#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! # Overview
//!
//! `write_engine` batches outbound bytes for a single non-blocking stream
//! socket owned by an event loop. Callers queue [`WriteItem`]s (in-memory
//! buffers or zero-copy file regions) with [`WriteEngine::add`], mark a flush
//! checkpoint once a logical message boundary is reached, and drive progress
//! by calling [`WriteEngine::trigger`] every time the loop reports the
//! socket writable. Watermark-based flow control tells the caller when to
//! stop (and later resume) accepting more bytes from upstream.
//!
//! # Design
//!
//! - [`PendingState`] is the pure queue: ordered items, a flush mark, and an
//!   aggregate byte count, with no knowledge of sockets or syscalls.
//! - [`gather::gather`] packs a run of flushed in-memory buffers into one
//!   `writev`-shaped batch, respecting both `IOV_MAX` and a byte budget, and
//!   stopping at a file region, which is always written on its own.
//! - [`WriteEngine`] ties the queue, the gather scratch buffer, and an
//!   atomic writability flag together, bounding every `trigger` call to a
//!   configurable number of drain spins so one busy connection cannot starve
//!   the rest of the loop.
//! - Completion is a caller-supplied [`Completion`] trait object attached to
//!   a queued item or a flush checkpoint; the engine fires it exactly once,
//!   with success or a shared [`FailureReason`], and never inspects it
//!   otherwise.
//!
//! # Invariants
//!
//! - The item at the front of the queue never has zero bytes remaining:
//!   [`PendingState::did_write`] always pops a fully-consumed head before
//!   returning control.
//! - `trigger` either makes forward progress or reports
//!   [`WriteOutcome::WouldBlock`]; it never loops past
//!   [`WriteEngineConfig::write_spin_count`] iterations.
//! - A syscall closure that reports more bytes transferred than the items it
//!   was offered could hold is a programming error on the caller's part and
//!   is treated as such (a panic), not a silent data-loss path.
//!
//! # Examples
//!
//! ```
//! use write_engine::{WriteEngine, WriteEngineConfig, WriteItem};
//! use bytes::Bytes;
//!
//! let mut engine = WriteEngine::new(WriteEngineConfig::default());
//! engine.add(WriteItem::Buffer(Bytes::from_static(b"hello")), None).unwrap();
//! engine.mark_flush_checkpoint(None).unwrap();
//!
//! let (outcome, _writability_changed, fired) = engine
//!     .trigger(
//!         |buf| Ok(write_engine::DrainResult::Processed(buf.len())),
//!         |iovecs| {
//!             let n = iovecs.iter().map(|s| s.len()).sum();
//!             Ok(write_engine::DrainResult::Processed(n))
//!         },
//!         |_descriptor, _reader, _end| unreachable!("no file region queued"),
//!     )
//!     .unwrap();
//! fired.succeed_all();
//! assert!(engine.is_empty());
//! ```
//!
//! # See also
//!
//! - [`bytes::Bytes`], whose reference-counted slicing is what makes
//!   retaining a partially-written buffer across a partial syscall result
//!   cheap.

mod completion;
mod config;
mod engine;
mod error;
mod gather;
mod item;
mod outcome;
mod pending;

pub use crate::completion::{Completion, CompletionList, FailureReason};
pub use crate::config::WriteEngineConfig;
pub use crate::engine::{SyscallResult, Writability, WriteEngine};
pub use crate::error::{EngineError, Result};
pub use crate::gather::VectorLimits;
pub use crate::item::{Descriptor, FileRegion, WriteItem};
pub use crate::outcome::{DrainResult, WriteOutcome};
pub use crate::pending::PendingState;
