//! Collaborator interfaces: the ordering source and the mail backend.
//!
//! The triage core never talks to a mailbox, a browser, or a speech layer
//! directly. It consumes these traits and awaits their results before
//! committing any session or undo state, so a collaborator failure can
//! never leave a session partially mutated.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::reconcile::{CanonicalMessage, ExternalObservation};

/// A single-message mutation understood by the backend, including the
/// reverse forms recorded for undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Archive,
    Delete,
    Star,
    Unarchive,
    Undelete,
    Unstar,
}

/// The three mutating triage actions a user can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Archive,
    Delete,
    Star,
}

impl ActionKind {
    /// The mutation this action performs.
    pub fn mutation(self) -> MutationKind {
        match self {
            ActionKind::Archive => MutationKind::Archive,
            ActionKind::Delete => MutationKind::Delete,
            ActionKind::Star => MutationKind::Star,
        }
    }

    /// The mutation that reverses this action.
    pub fn reverse(self) -> MutationKind {
        match self {
            ActionKind::Archive => MutationKind::Unarchive,
            ActionKind::Delete => MutationKind::Undelete,
            ActionKind::Star => MutationKind::Unstar,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            ActionKind::Archive => "archive",
            ActionKind::Delete => "delete",
            ActionKind::Star => "star",
        }
    }

    /// Spoken confirmation after the action succeeded.
    pub fn confirmation(self) -> &'static str {
        match self {
            ActionKind::Archive => "Archived.",
            ActionKind::Delete => "Deleted.",
            ActionKind::Star => "Starred.",
        }
    }
}

/// Full message content as returned by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageContent {
    pub body: String,
}

/// Produces the externally observed inbox ordering, e.g. a browser scrape
/// of the mailbox as the user sees it.
//
// Commands run on a single task per session; no Send bound is needed on
// the returned futures.
#[allow(async_fn_in_trait)]
pub trait OrderSource {
    async fn scrape_order(&self, account: &str) -> Result<Vec<ExternalObservation>>;
}

/// Canonical message source and mutator: the actual mail backend.
#[allow(async_fn_in_trait)]
pub trait MailBackend {
    async fn list_canonical(&self, account: &str) -> Result<Vec<CanonicalMessage>>;

    async fn fetch_content(&self, account: &str, id: &str) -> Result<MessageContent>;

    async fn mutate(&self, account: &str, kind: MutationKind, id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_reverse_pairs() {
        assert_eq!(ActionKind::Archive.reverse(), MutationKind::Unarchive);
        assert_eq!(ActionKind::Delete.reverse(), MutationKind::Undelete);
        assert_eq!(ActionKind::Star.reverse(), MutationKind::Unstar);
    }

    #[test]
    fn test_mutation_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MutationKind::Unarchive).unwrap(),
            "\"unarchive\""
        );
        assert_eq!(serde_json::to_string(&ActionKind::Star).unwrap(), "\"star\"");
    }
}
