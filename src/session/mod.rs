//! Triage session: the resolved queue, the cursor, and the state machine.
//!
//! A session is created once per triage run from the reconciler's output
//! and then mutated only by the dispatcher. The cursor moves forward via
//! [`Session::advance`] or rewinds explicitly via [`Session::jump_to`]
//! (the undo path); it is never decremented implicitly.

mod store;
pub mod undo;

pub use store::SessionStore;
pub use undo::UndoEntry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Paused,
    /// Terminal: reached by advancing past the last item or by ending the
    /// session explicitly. Only an undo within its window can reopen it.
    Completed,
}

/// One resolved queue entry. Positions are dense, unique and 0-based;
/// canonical ids are unique across a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub position: usize,
    pub canonical_id: String,
    pub subject: String,
    pub sender: String,
    pub snippet: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub account: String,
    pub status: SessionStatus,
    pub queue: Vec<QueueItem>,
    cursor: usize,
    /// Single-depth undo slot; each recorded action supersedes the last.
    pub(crate) undo: Option<UndoEntry>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: String, account: String, queue: Vec<QueueItem>) -> Self {
        debug_assert!(
            queue.iter().enumerate().all(|(i, item)| item.position == i),
            "queue positions must be dense and 0-based"
        );
        debug_assert!(
            {
                let mut ids: Vec<&str> = queue.iter().map(|i| i.canonical_id.as_str()).collect();
                ids.sort_unstable();
                ids.windows(2).all(|w| w[0] != w[1])
            },
            "canonical ids must be unique within a queue"
        );

        let now = Utc::now();
        Self {
            id,
            account,
            status: SessionStatus::Active,
            queue,
            cursor: 0,
            undo: None,
            started_at: now,
            updated_at: now,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.queue.len()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len().saturating_sub(self.cursor)
    }

    /// Items the cursor has moved past, whether acted on or skipped.
    pub fn processed(&self) -> usize {
        self.cursor
    }

    /// The item under the cursor, or `None` past the end of the queue.
    pub fn current(&self) -> Option<&QueueItem> {
        debug_assert!(self.cursor <= self.queue.len(), "cursor out of bounds");
        self.queue.get(self.cursor)
    }

    /// Move the cursor forward by one; completes the session when the end
    /// of the queue is reached. Returns the new current item.
    pub fn advance(&mut self) -> Option<&QueueItem> {
        if self.cursor < self.queue.len() {
            self.cursor += 1;
        }
        if self.cursor >= self.queue.len() && self.status != SessionStatus::Completed {
            self.status = SessionStatus::Completed;
            tracing::debug!(session = %self.id, "queue exhausted, session completed");
        }
        self.touch();
        self.queue.get(self.cursor)
    }

    /// Rewind the cursor to the given item. Undo path only; no-op if the
    /// id is not in the queue. Reopens a completed session.
    pub fn jump_to(&mut self, canonical_id: &str) {
        if let Some(position) = self
            .queue
            .iter()
            .position(|item| item.canonical_id == canonical_id)
        {
            self.cursor = position;
            if self.status == SessionStatus::Completed {
                self.status = SessionStatus::Active;
            }
            self.touch();
        }
    }

    /// Pause an active session. Issuing any further command resumes it.
    pub fn stop(&mut self) {
        if self.status == SessionStatus::Active {
            self.status = SessionStatus::Paused;
            self.touch();
        }
    }

    pub fn resume(&mut self) {
        if self.status == SessionStatus::Paused {
            self.status = SessionStatus::Active;
            self.touch();
        }
    }

    /// Force the session to its terminal state regardless of the cursor.
    pub fn end(&mut self) {
        self.status = SessionStatus::Completed;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
pub(crate) fn make_queue(n: usize) -> Vec<QueueItem> {
    (0..n)
        .map(|i| QueueItem {
            position: i,
            canonical_id: format!("m{}", i + 1),
            subject: format!("Subject {}", i + 1),
            sender: format!("sender{}@example.com", i + 1),
            snippet: format!("Snippet {}", i + 1),
        })
        .collect()
}
