//! Per-connection bounded undo history.

use crate::Id;
use std::collections::VecDeque;

/// Default depth of an undo stack.
pub const DEFAULT_UNDO_DEPTH: usize = 50;

/// A reversible action taken by a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoEntry {
    /// The connection created this pin.
    Add {
        /// The created pin.
        pin_id: Id,
    },

    /// The connection merged into this pin, which had `previous_size`.
    Merge {
        /// The merge target.
        pin_id: Id,

        /// Size of the target before the merge.
        previous_size: u8,
    },
}

/// LIFO of [UndoEntry], dropping the oldest entry when full.
#[derive(Debug)]
pub struct UndoStack {
    depth: usize,
    entries: VecDeque<UndoEntry>,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_DEPTH)
    }
}

impl UndoStack {
    /// An empty stack holding at most `depth` entries.
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            entries: VecDeque::with_capacity(depth.min(DEFAULT_UNDO_DEPTH) + 1),
        }
    }

    /// Record an entry. Never refused.
    pub fn push(&mut self, entry: UndoEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.depth {
            self.entries.pop_front();
        }
    }

    /// Take the most recent entry.
    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop_back()
    }

    /// Count of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there is nothing to undo.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
