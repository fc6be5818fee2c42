//! Change notification.
//!
//! Primitive operations queue descriptors while a batch is open; the batch is
//! flushed to every registered callback in a single call when the edit is
//! committed. Full reloads skip the per-entry descriptors and emit one
//! [`Change::Reload`].

use std::fmt;

use crate::entry::Entry;

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// `before` is the entry that now follows the inserted one, if any.
    Insert { entry: Entry, before: Option<Entry> },
    Remove { entry: Entry },
    Update { entry: Entry },
    Reload,
}

pub type ChangeCallback = Box<dyn FnMut(&[Change])>;

/// Token returned when registering a callback, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Batching,
    Loading,
}

pub struct ChangeTracker {
    state: TrackerState,
    pending: Vec<Change>,
    callbacks: Vec<(CallbackId, ChangeCallback)>,
    next_callback: u64,
}

impl fmt::Debug for ChangeTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("state", &self.state)
            .field("pending", &self.pending.len())
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self {
            state: TrackerState::Idle,
            pending: Vec::new(),
            callbacks: Vec::new(),
            next_callback: 0,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn add_callback<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&[Change]) + 'static,
    {
        let id = CallbackId(self.next_callback);
        self.next_callback += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Returns whether a callback was registered under `id`.
    pub fn remove_callback(&mut self, id: CallbackId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(cb_id, _)| *cb_id != id);
        self.callbacks.len() != before
    }

    pub fn queue(&mut self, change: Change) {
        self.state = TrackerState::Batching;
        self.pending.push(change);
    }

    /// Delivers everything queued since the last flush. Nothing is delivered
    /// for an empty batch.
    pub fn flush(&mut self) {
        self.state = TrackerState::Idle;
        if self.pending.is_empty() {
            return;
        }
        let changes = std::mem::take(&mut self.pending);
        self.notify(&changes);
    }

    pub fn begin_load(&mut self) {
        self.pending.clear();
        self.state = TrackerState::Loading;
    }

    pub fn finish_load(&mut self) {
        self.state = TrackerState::Idle;
        self.notify(&[Change::Reload]);
    }

    fn notify(&mut self, changes: &[Change]) {
        for (_, callback) in self.callbacks.iter_mut() {
            callback(changes);
        }
    }
}
