//! Single-depth undo slot with a time-boxed window.
//!
//! Only the most recent mutating action is reversible: recording a new
//! action supersedes the previous entry, and an entry past its window is
//! inert. Entries are recorded only after the backend confirmed the
//! mutation, so an undo always has a real effect to reverse.

use std::time::{Duration, Instant};

use crate::backend::{ActionKind, MutationKind};

use super::Session;

#[derive(Debug, Clone)]
pub struct UndoEntry {
    /// The action that was performed.
    pub action: ActionKind,
    /// Canonical id of the message the action was applied to.
    pub target_id: String,
    /// Mutation that reverses the action.
    pub reverse: MutationKind,
    pub recorded_at: Instant,
    pub expires_at: Instant,
}

impl UndoEntry {
    pub fn new(action: ActionKind, target_id: String, window: Duration) -> Self {
        let now = Instant::now();
        Self {
            action,
            target_id,
            reverse: action.reverse(),
            recorded_at: now,
            expires_at: now + window,
        }
    }

    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

impl Session {
    /// Record a confirmed mutation as the undoable action, superseding any
    /// previous entry.
    pub fn record_undo(&mut self, entry: UndoEntry) {
        self.undo = Some(entry);
    }

    /// The undo entry, if one exists and its window has not elapsed.
    /// An expired entry is purged lazily here.
    pub fn live_undo(&mut self, now: Instant) -> Option<&UndoEntry> {
        if let Some(entry) = &self.undo
            && !entry.is_live(now)
        {
            self.undo = None;
        }
        self.undo.as_ref()
    }

    pub fn clear_undo(&mut self) {
        self.undo = None;
    }
}
