//! [`PendingState`]: the ordered queue of write items plus their flush mark.
//!
//! This is a pure data structure -- it never touches a socket. Everything
//! here is deterministic given the sequence of calls made to it, which is
//! what makes it the natural target for the property tests in
//! `tests/properties.rs`.

use std::collections::VecDeque;

use crate::completion::{Completion, CompletionList};
use crate::item::WriteItem;
use crate::outcome::{DrainResult, WriteOutcome};

struct Entry {
    item: WriteItem,
    handles: CompletionList,
}

/// Ordered queue of [`WriteItem`]s awaiting transfer, with a movable flush
/// mark and the aggregate byte count the engine consults for watermarks.
#[derive(Default)]
pub struct PendingState {
    queue: VecDeque<Entry>,
    bytes: usize,
    flush_mark_index: Option<usize>,
}

impl PendingState {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items currently queued.
    #[must_use]
    pub fn chunks(&self) -> usize {
        self.queue.len()
    }

    /// Aggregate remaining bytes across every queued item.
    #[must_use]
    pub const fn bytes(&self) -> usize {
        self.bytes
    }

    /// True if no items are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of items included in the current flush batch (0 if no flush
    /// mark is set).
    #[must_use]
    pub fn flushed_count(&self) -> usize {
        self.flush_mark_index.map_or(0, |index| index + 1)
    }

    /// True if there is at least one item eligible to be written now.
    #[must_use]
    pub fn has_flushed_items(&self) -> bool {
        self.flush_mark_index.is_some()
    }

    /// Read-only indexed access into the queue, for the gather path.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&WriteItem> {
        self.queue.get(index).map(|entry| &entry.item)
    }

    /// Appends `item` to the tail of the queue, with an optional completion
    /// handle. Never touches the flush mark.
    pub fn append(&mut self, item: WriteItem, handle: Option<Box<dyn Completion>>) {
        self.bytes += item.remaining();
        let mut handles = CompletionList::new();
        if let Some(handle) = handle {
            handles.push(handle);
        }
        self.queue.push_back(Entry { item, handles });
    }

    /// Moves the flush mark to the current last item.
    ///
    /// Returns a handle list to fire immediately with success when the
    /// queue was empty (there is nothing left to wait for); otherwise the
    /// handle, if any, is attached to the mark's item and `None` is
    /// returned.
    pub fn mark_flush_checkpoint(
        &mut self,
        handle: Option<Box<dyn Completion>>,
    ) -> Option<CompletionList> {
        if self.queue.is_empty() {
            let mut fire_now = CompletionList::new();
            if let Some(handle) = handle {
                fire_now.push(handle);
            }
            return if fire_now.is_empty() {
                None
            } else {
                Some(fire_now)
            };
        }

        self.flush_mark_index = Some(self.queue.len() - 1);
        if let Some(handle) = handle {
            let last = self.queue.back_mut().expect("queue checked non-empty");
            last.handles.push(handle);
        }
        None
    }

    /// Removes the head item, returning its handles for the caller to fire.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty.
    fn fully_written_first(&mut self) -> CompletionList {
        let mut entry = self
            .queue
            .pop_front()
            .expect("fully_written_first requires a non-empty queue");
        self.bytes -= entry.item.remaining();

        self.flush_mark_index = match self.flush_mark_index {
            Some(0) => None,
            Some(index) => Some(index - 1),
            None => None,
        };

        entry.handles.take()
    }

    /// Advances the head item's read cursor by `n` bytes. The flush mark is
    /// unaffected.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty or `n` exceeds the head item's
    /// remaining bytes.
    fn partially_written_first(&mut self, n: usize) {
        let entry = self
            .queue
            .front_mut()
            .expect("partially_written_first requires a non-empty queue");
        entry.item.advance(n);
        self.bytes -= n;
    }

    /// The drain-consumption primitive: reconciles a syscall's reported
    /// progress against the leading `item_count` items the engine attempted
    /// to write.
    ///
    /// # Panics
    ///
    /// Panics (an internal logic violation) if `result` claims more bytes
    /// were transferred than the attempted items actually held.
    pub fn did_write(
        &mut self,
        item_count: usize,
        result: DrainResult,
    ) -> (CompletionList, WriteOutcome) {
        if result.is_blocked_immediately() {
            return (CompletionList::new(), WriteOutcome::WouldBlock);
        }

        let mut remaining = result.bytes();
        let mut fired = CompletionList::new();

        for _ in 0..item_count {
            let head_remaining = self
                .queue
                .front()
                .expect("did_write attempted more items than are queued")
                .item
                .remaining();

            if remaining >= head_remaining {
                remaining -= head_remaining;
                fired.extend(self.fully_written_first());
            } else {
                self.partially_written_first(remaining);
                return (fired, WriteOutcome::WrittenPartially);
            }
        }

        assert_eq!(
            remaining, 0,
            "did_write: syscall reported more bytes than the attempted items held"
        );
        (fired, WriteOutcome::WrittenCompletely)
    }

    /// Drains every queued item, returning all of their handles so the
    /// caller can fail them with a shared reason.
    pub fn fail_all(&mut self) -> CompletionList {
        let mut fired = CompletionList::new();
        while !self.queue.is_empty() {
            fired.extend(self.fully_written_first());
        }
        fired
    }
}
