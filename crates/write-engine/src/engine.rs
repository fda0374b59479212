//! [`WriteEngine`]: the public entry point, combining the pending-item
//! queue, the vectored-write scratch buffer and the writability flag into
//! one state machine driven by the owning event loop's `trigger` calls.

use std::io::{self, IoSlice};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::completion::{Completion, CompletionList, FailureReason};
use crate::config::WriteEngineConfig;
use crate::error::{EngineError, Result};
use crate::gather::{self, VectorLimits};
use crate::item::{Descriptor, WriteItem};
use crate::outcome::{DrainResult, WriteOutcome};
use crate::pending::PendingState;

/// A cheap, `Send + Sync` handle for querying writability from outside the
/// thread that owns the [`WriteEngine`] itself.
///
/// The engine's internal state (the queue, the scratch `Vec<Bytes>`) is only
/// ever touched by its owning loop, but other code -- a caller deciding
/// whether to keep accepting bytes from an application -- needs to read the
/// watermark flag from anywhere. Cloning is an `Arc` bump.
#[derive(Clone, Debug)]
pub struct Writability(Arc<AtomicBool>);

impl Writability {
    fn new(initial: bool) -> Self {
        Self(Arc::new(AtomicBool::new(initial)))
    }

    /// True if the engine was below its high watermark as of the last
    /// `add`/`trigger` call.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Flips `true -> false` if currently writable; a no-op otherwise.
    /// Returns whether the flip happened.
    fn flip_to_not_writable(&self) -> bool {
        self.0
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    fn set_writable(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Closure shape every syscall surface shares: attempt a transfer, report
/// bytes moved or a would-block with bytes-so-far, or fail fatally.
///
/// Transient failures (`Interrupted`) are the closure's responsibility to
/// retry or fold into a [`DrainResult`]; anything returned as `Err` unwinds
/// out of [`WriteEngine::trigger`] with the queue left untouched.
pub type SyscallResult = io::Result<DrainResult>;

/// Drains the pending queue of a non-blocking byte stream, tracking
/// writability and batching writes through caller-supplied syscalls.
///
/// # Overview
///
/// Callers push [`WriteItem`]s with [`WriteEngine::add`], occasionally mark a
/// flush checkpoint with [`WriteEngine::mark_flush_checkpoint`], and drive
/// progress by calling [`WriteEngine::trigger`] whenever the owning socket
/// reports it is ready to write. A [`Writability`] handle lets unrelated code
/// read the high/low watermark flag without touching the engine itself.
///
/// # Design
///
/// `trigger` picks a dispatch path once per call -- vectored when at least
/// two flushed items are queued and both of the first two are in-memory
/// buffers, single-item otherwise -- then spins that one path up to
/// [`WriteEngineConfig::write_spin_count`] times, continuing only while each
/// attempt reports [`WriteOutcome::WrittenPartially`]. A fully successful
/// attempt, a would-block, or spin exhaustion all return immediately, even
/// if more flushed items remain; the caller re-invokes `trigger` on the next
/// writability edge to pick those up. This bounds how long one connection
/// can hold the event loop.
pub struct WriteEngine {
    pending: PendingState,
    storage: Vec<Bytes>,
    config: WriteEngineConfig,
    writable: Writability,
    closed: bool,
}

impl WriteEngine {
    /// Builds an engine with the given configuration. Starts writable.
    #[must_use]
    pub fn new(config: WriteEngineConfig) -> Self {
        Self {
            pending: PendingState::new(),
            storage: Vec::new(),
            config,
            writable: Writability::new(true),
            closed: false,
        }
    }

    /// A cloneable, cross-thread handle for reading the writability flag.
    #[must_use]
    pub fn writability(&self) -> Writability {
        self.writable.clone()
    }

    /// True if the engine is currently reporting itself writable.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.writable.is_writable()
    }

    /// True if no items are queued at all (flushed or not).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// True if at least one item is eligible to be written on the next
    /// `trigger`.
    #[must_use]
    pub fn has_pending_flush(&self) -> bool {
        self.pending.has_flushed_items()
    }

    /// Aggregate bytes already flushed and awaiting transfer.
    #[must_use]
    pub fn flushed_bytes(&self) -> usize {
        (0..self.pending.flushed_count())
            .filter_map(|i| self.pending.get(i))
            .map(WriteItem::remaining)
            .sum()
    }

    /// Aggregate bytes queued, flushed or not.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.pending.bytes()
    }

    /// Queues `item`, attaching `handle` if given, then re-evaluates the high
    /// watermark.
    ///
    /// Returns the (possibly unchanged) writability: `false` means the
    /// caller should stop accepting more bytes from upstream until the
    /// engine reports writable again.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] without queuing anything if the
    /// engine was already closed.
    pub fn add(&mut self, item: WriteItem, handle: Option<Box<dyn Completion>>) -> Result<bool> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        self.pending.append(item, handle);
        if self.pending.bytes() > self.config.watermark_high && self.writable.flip_to_not_writable() {
            #[cfg(feature = "tracing")]
            tracing::debug!(bytes = self.pending.bytes(), "write engine no longer writable");
        }
        Ok(self.writable.is_writable())
    }

    /// Marks every item queued so far as eligible for the next `trigger`.
    ///
    /// If nothing is queued and `handle` is given, it fires immediately with
    /// success; the caller is responsible for invoking
    /// [`CompletionList::succeed_all`] on the returned list.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] if the engine was already closed.
    pub fn mark_flush_checkpoint(
        &mut self,
        handle: Option<Box<dyn Completion>>,
    ) -> Result<Option<CompletionList>> {
        if self.closed {
            return Err(EngineError::Closed);
        }
        Ok(self.pending.mark_flush_checkpoint(handle))
    }

    /// Drains the flushed prefix through one dispatch path, spinning up to
    /// the configured bound while each attempt makes partial progress.
    ///
    /// `single_op` handles a lone leading item (buffer or file region);
    /// `vector_op` drains a run of flushed in-memory buffers in one batched
    /// call; `file_op` transfers a file region. The dispatch path (single vs.
    /// vectored) is chosen once at entry and held for the whole call.
    ///
    /// Returns the terminal [`WriteOutcome`], whether the engine transitioned
    /// from not-writable to writable during this call, and the completion
    /// handles that fired -- the caller resolves them, the engine never does.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] if the engine was already closed, or
    /// propagates a fatal [`io::Error`] from any of the three closures,
    /// leaving the queue exactly as it was before the failing call.
    ///
    /// # Panics
    ///
    /// Panics if a closure reports more bytes transferred than the items it
    /// was offered actually held; this is an internal contract violation; see
    /// [`PendingState::did_write`](crate::pending::PendingState::did_write).
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub fn trigger(
        &mut self,
        mut single_op: impl FnMut(&[u8]) -> SyscallResult,
        mut vector_op: impl FnMut(&[IoSlice<'_>]) -> SyscallResult,
        mut file_op: impl FnMut(Descriptor, u64, u64) -> SyscallResult,
    ) -> Result<(WriteOutcome, bool, CompletionList)> {
        if self.closed {
            return Err(EngineError::Closed);
        }

        if !self.pending.has_flushed_items() {
            return Ok((WriteOutcome::NothingToBeWritten, false, CompletionList::new()));
        }

        let was_writable = self.writable.is_writable();
        let use_vector = self.should_use_vector_path();

        let mut all_fired = CompletionList::new();
        let mut last_outcome = WriteOutcome::NothingToBeWritten;

        for _ in 0..self.config.write_spin_count {
            if use_vector && self.closed {
                last_outcome = WriteOutcome::Closed;
                break;
            }

            let (item_count, result) = if use_vector {
                self.drain_vectored(self.config.vector_limits, &mut vector_op)?
            } else {
                self.drain_single(&mut single_op, &mut file_op)?
            };

            let (fired, outcome) = self.pending.did_write(item_count, result);
            all_fired.extend(fired);
            last_outcome = outcome;

            if !matches!(outcome, WriteOutcome::WrittenPartially) {
                break;
            }
        }

        #[cfg(feature = "tracing")]
        if matches!(last_outcome, WriteOutcome::WrittenPartially) && self.pending.has_flushed_items() {
            tracing::debug!("write engine exhausted its spin budget with work remaining");
        }

        if self.pending.bytes() < self.config.watermark_low {
            self.writable.set_writable();
        }
        let writability_changed = !was_writable && self.writable.is_writable();
        #[cfg(feature = "tracing")]
        if writability_changed {
            tracing::debug!(bytes = self.pending.bytes(), "write engine writable again");
        }

        Ok((last_outcome, writability_changed, all_fired))
    }

    /// True when the vectored path applies: at least two flushed items, the
    /// first two of which are both in-memory buffers.
    fn should_use_vector_path(&self) -> bool {
        self.pending.flushed_count() >= 2
            && self.pending.get(0).is_some_and(WriteItem::is_buffer)
            && self.pending.get(1).is_some_and(WriteItem::is_buffer)
    }

    /// One single-path spin: dispatches the head item through `single_op` or
    /// `file_op` depending on its shape.
    fn drain_single(
        &mut self,
        single_op: &mut impl FnMut(&[u8]) -> SyscallResult,
        file_op: &mut impl FnMut(Descriptor, u64, u64) -> SyscallResult,
    ) -> Result<(usize, DrainResult)> {
        let head = self
            .pending
            .get(0)
            .expect("has_flushed_items guarantees a head item");

        let result = match head {
            WriteItem::File(region) => file_op(region.descriptor(), region.reader(), region.end())?,
            WriteItem::Buffer(bytes) => single_op(bytes)?,
        };
        Ok((1, result))
    }

    /// One vector-path spin: gathers the leading run of flushed buffers and
    /// dispatches them through `vector_op` in a single batched call.
    fn drain_vectored(
        &mut self,
        limits: VectorLimits,
        vector_op: &mut impl FnMut(&[IoSlice<'_>]) -> SyscallResult,
    ) -> Result<(usize, DrainResult)> {
        let mut syscall_result: Option<SyscallResult> = None;
        let (attempted, raw) = gather::gather(&self.pending, &mut self.storage, limits, |iovecs| {
            let outcome = vector_op(iovecs);
            let bytes = match &outcome {
                Ok(drain) => Ok(drain.bytes()),
                Err(err) => Err(io::Error::new(err.kind(), err.to_string())),
            };
            syscall_result = Some(outcome);
            bytes
        });

        match syscall_result {
            Some(result) => Ok((attempted, result?)),
            None => {
                // `gather` never invokes the syscall when nothing was
                // packed; `should_use_vector_path` guarantees at least two
                // flushed buffers exist, so this is unreachable in practice.
                let _ = raw?;
                Ok((attempted, DrainResult::Processed(0)))
            }
        }
    }

    /// Fails every queued item's handles with `error`, draining the queue.
    ///
    /// If `close` is true, marks the engine closed so later `add`/`trigger`
    /// calls return [`EngineError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyClosed`] if `close` is true and the
    /// engine was already closed.
    pub fn fail_all(&mut self, error: io::Error, close: bool) -> Result<()> {
        if close && self.closed {
            return Err(EngineError::AlreadyClosed);
        }
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %error, close, "failing all pending write items");
        let reason: FailureReason = Arc::new(error);
        let fired = self.pending.fail_all();
        fired.fail_all(&reason);
        if close {
            self.closed = true;
        }
        Ok(())
    }
}
