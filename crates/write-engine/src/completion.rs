//! The completion-handle contract.
//!
//! The notification/promise primitive itself is an external collaborator
//! (out of scope per the design notes): the engine only ever calls
//! [`Completion::succeed`] or [`Completion::fail`] on a handle, exactly once,
//! and never inspects it otherwise.

use std::fmt;
use std::io;
use std::sync::Arc;

/// The error a still-pending completion handle is failed with, e.g. via
/// [`crate::WriteEngine::fail_all`].
///
/// Wrapped in an [`Arc`] so a single failure can be cloned cheaply across
/// every handle still queued when the engine fails the batch.
pub type FailureReason = Arc<io::Error>;

/// A one-shot notification attached to a write item or a flush checkpoint.
///
/// Implementors are supplied by the caller (e.g. a future/promise bridge);
/// the engine never constructs one itself. `succeed`/`fail` consume the
/// handle by value so a caller cannot observe it firing twice.
pub trait Completion: fmt::Debug + Send {
    /// Called when every byte the handle was attached to has been written.
    fn succeed(self: Box<Self>);

    /// Called when the handle's bytes will never be written, e.g. because
    /// the engine was closed with a fatal error.
    fn fail(self: Box<Self>, error: &FailureReason);
}

/// A list of handles attached to the same logical point in the stream.
///
/// A single item normally carries at most one handle, but
/// [`crate::PendingState::mark_flush_checkpoint`] cascades a new checkpoint
/// handle onto an already-handled item rather than overwriting it, so both
/// fire with the same outcome. Modeled directly as a `Vec` rather than a
/// linked "fire child when I fire" relationship, since the engine resolves
/// all of them at the same instant anyway.
#[derive(Debug, Default)]
pub struct CompletionList(Vec<Box<dyn Completion>>);

impl CompletionList {
    /// An empty handle list.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a handle, preserving cascade order.
    pub fn push(&mut self, handle: Box<dyn Completion>) {
        self.0.push(handle);
    }

    /// True if no handle is attached.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Moves every handle out, leaving this list empty.
    pub fn take(&mut self) -> Self {
        Self(std::mem::take(&mut self.0))
    }

    /// Merges `other`'s handles onto the end of this list.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Fires every handle with success, in attachment order.
    pub fn succeed_all(self) {
        for handle in self.0 {
            handle.succeed();
        }
    }

    /// Fires every handle with the same failure, in attachment order.
    pub fn fail_all(self, error: &FailureReason) {
        for handle in self.0 {
            handle.fail(error);
        }
    }
}
