//! Command dispatch: the only externally callable surface of the engine.
//!
//! The dispatcher composes the reconciler, the session store and the undo
//! slot with the external collaborators. Every command produces a machine
//! payload plus the sentence the voice layer should speak, and the two
//! always describe the same outcome. Collaborator failures are caught per
//! command and never leave a session partially mutated.

mod act;
mod query;
mod undo;

use std::collections::HashSet;

use serde::Serialize;
use serde_json::json;

use crate::backend::{ActionKind, MailBackend, OrderSource};
use crate::config::TriageConfig;
use crate::constants::SESSION_ID_BYTES;
use crate::error::{Result, TriageError};
use crate::reconcile::{self, Reconciliation};
use crate::session::{QueueItem, Session, SessionStatus, SessionStore};

/// Closed command set accepted over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Act(ActionKind),
    Skip,
    Undo,
    QueryRemaining,
    EndSession,
    GetCurrent,
}

impl Command {
    /// Parse a transport-facing command name. Accepts the camelCase names
    /// the voice layer sends plus snake/kebab aliases.
    pub fn parse(name: &str) -> Option<Command> {
        match name.trim() {
            "archive" => Some(Command::Act(ActionKind::Archive)),
            "delete" => Some(Command::Act(ActionKind::Delete)),
            "star" => Some(Command::Act(ActionKind::Star)),
            "skip" | "next" => Some(Command::Skip),
            "undo" => Some(Command::Undo),
            "queryRemaining" | "query-remaining" | "query_remaining" | "remaining" => {
                Some(Command::QueryRemaining)
            }
            "endSession" | "end-session" | "end_session" | "end" => Some(Command::EndSession),
            "getCurrent" | "get-current" | "get_current" | "current" | "repeat" => {
                Some(Command::GetCurrent)
            }
            _ => None,
        }
    }
}

/// Result of a single command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    pub success: bool,
    pub data: serde_json::Value,
    pub spoken_message: String,
}

impl CommandOutcome {
    fn ok(data: serde_json::Value, spoken_message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            spoken_message: spoken_message.into(),
        }
    }

    fn fail(data: serde_json::Value, spoken_message: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            spoken_message: spoken_message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartedSession {
    pub session_id: String,
    pub queue_length: usize,
    pub first_item: Option<QueueItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub status: SessionStatus,
    pub cursor: usize,
    pub total: usize,
    pub current_item: Option<QueueItem>,
}

pub(crate) const APOLOGY: &str =
    "Sorry, something went wrong with that one. Please try again.";
pub(crate) const END_OF_QUEUE: &str = "You're at the end of your queue.";
pub(crate) const ALL_DONE: &str = "That was the last one. You're all done.";

/// Spoken announcement of a queue item.
pub(crate) fn announce_item(item: &QueueItem) -> String {
    if item.snippet.is_empty() {
        format!("Next: from {}, subject {}.", item.sender, item.subject)
    } else {
        format!(
            "Next: from {}, subject {}. {}",
            item.sender, item.subject, item.snippet
        )
    }
}

pub struct Dispatcher<O, B> {
    order: O,
    backend: B,
    store: SessionStore,
    config: TriageConfig,
}

impl<O: OrderSource, B: MailBackend> Dispatcher<O, B> {
    pub fn new(order: O, backend: B, config: TriageConfig) -> Self {
        let store = SessionStore::new(config.session_capacity, config.session_tti());
        Self {
            order,
            backend,
            store,
            config,
        }
    }

    /// Build the queue for an account and open a new session on it.
    ///
    /// The scrape and the canonical listing run concurrently; the matching
    /// pass itself is synchronous and deterministic given both.
    pub async fn start_session(&self, account: &str) -> Result<StartedSession> {
        let (observations, canonical) = tokio::try_join!(
            self.order.scrape_order(account),
            self.backend.list_canonical(account),
        )?;

        let recon = reconcile::reconcile(&observations, &canonical);
        let queue = build_queue(&recon);
        tracing::info!(
            account,
            observed = observations.len(),
            matched = queue.len(),
            "reconciled scrape against canonical set"
        );

        let session = Session::new(new_session_id()?, account.to_string(), queue);
        let started = StartedSession {
            session_id: session.id.clone(),
            queue_length: session.total(),
            first_item: session.current().cloned(),
        };
        self.store.insert(session).await;
        Ok(started)
    }

    /// Execute one command against a session. Commands for the same session
    /// are serialized: the session lock is held across every await below.
    pub async fn command(&self, session_id: &str, command: Command) -> Result<CommandOutcome> {
        let handle = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| TriageError::UnknownSession(session_id.to_string()))?;
        let mut session = handle.lock().await;

        // Issuing any command against a paused session resumes it first.
        session.resume();

        // Completed is terminal for triage work: nothing left to announce,
        // mutate, or move the cursor over. The remaining count still
        // answers, ending again is idempotent, and a still-live undo entry
        // outlives the completion it caused.
        let allowed_after_end = matches!(
            command,
            Command::QueryRemaining | Command::EndSession | Command::Undo
        );
        if session.status == SessionStatus::Completed && !allowed_after_end {
            return Ok(CommandOutcome::fail(
                json!({ "status": session.status }),
                "This session has already ended. Start a new review to continue.",
            ));
        }

        tracing::debug!(session = %session.id, command = ?command, cursor = session.cursor(), "dispatching command");

        let outcome = match command {
            Command::Act(kind) => self.act(&mut session, kind).await,
            Command::Skip => self.skip(&mut session),
            Command::Undo => self.undo(&mut session).await,
            Command::QueryRemaining => self.query_remaining(&session),
            Command::EndSession => self.end_session(&mut session),
            Command::GetCurrent => self.get_current(&session).await,
        };
        Ok(outcome)
    }

    /// String-keyed entry point for transports that pass command names
    /// through verbatim.
    pub async fn command_named(&self, session_id: &str, name: &str) -> Result<CommandOutcome> {
        let command =
            Command::parse(name).ok_or_else(|| TriageError::UnknownCommand(name.to_string()))?;
        self.command(session_id, command).await
    }

    /// Pause a session so the run can be resumed later. Not part of the
    /// spoken command set; the transport calls this when the user goes
    /// silent or disconnects.
    pub async fn pause_session(&self, session_id: &str) -> Result<()> {
        let handle = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| TriageError::UnknownSession(session_id.to_string()))?;
        handle.lock().await.stop();
        Ok(())
    }

    pub async fn get_status(&self, session_id: &str) -> Result<StatusReport> {
        let handle = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| TriageError::UnknownSession(session_id.to_string()))?;
        let session = handle.lock().await;
        Ok(StatusReport {
            status: session.status,
            cursor: session.cursor(),
            total: session.total(),
            current_item: session.current().cloned(),
        })
    }
}

/// Collapse the reconciliation into the session queue: matched observations
/// in scrape order, renumbered densely. Duplicate canonical ids can each be
/// claimed during matching; the queue keeps only the first occurrence so
/// ids stay unique within a session.
fn build_queue(recon: &Reconciliation) -> Vec<QueueItem> {
    let mut seen: HashSet<&str> = HashSet::new();
    recon
        .matched_in_order()
        .into_iter()
        .filter(|msg| seen.insert(&msg.id))
        .enumerate()
        .map(|(position, msg)| QueueItem {
            position,
            canonical_id: msg.id.clone(),
            subject: msg.subject.clone(),
            sender: msg.sender.clone(),
            snippet: msg.snippet.clone(),
        })
        .collect()
}

/// Random hex session id.
fn new_session_id() -> anyhow::Result<String> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    getrandom::fill(&mut bytes).map_err(|e| anyhow::anyhow!("OS RNG unavailable: {}", e))?;
    Ok(bytes.iter().map(|b| format!("{:02x}", b)).collect())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use anyhow::{bail, Result};

    use crate::backend::{MailBackend, MessageContent, MutationKind, OrderSource};
    use crate::config::TriageConfig;
    use crate::reconcile::{CanonicalMessage, ExternalObservation};

    use super::Dispatcher;

    pub(crate) const ACCOUNT: &str = "user@example.com";

    /// Serves a fixed observation list.
    #[derive(Clone, Default)]
    pub(crate) struct MockOrder {
        pub observations: Vec<ExternalObservation>,
    }

    impl OrderSource for MockOrder {
        async fn scrape_order(&self, _account: &str) -> Result<Vec<ExternalObservation>> {
            Ok(self.observations.clone())
        }
    }

    /// Records mutations and fails on demand.
    #[derive(Clone, Default)]
    pub(crate) struct MockBackend {
        pub canonical: Vec<CanonicalMessage>,
        pub body: String,
        pub mutations: Arc<Mutex<Vec<(MutationKind, String)>>>,
        pub fail_mutations: Arc<AtomicBool>,
        pub fail_fetch: Arc<AtomicBool>,
    }

    impl MailBackend for MockBackend {
        async fn list_canonical(&self, _account: &str) -> Result<Vec<CanonicalMessage>> {
            Ok(self.canonical.clone())
        }

        async fn fetch_content(&self, _account: &str, _id: &str) -> Result<MessageContent> {
            if self.fail_fetch.load(Ordering::SeqCst) {
                bail!("content fetch unavailable");
            }
            Ok(MessageContent {
                body: self.body.clone(),
            })
        }

        async fn mutate(&self, _account: &str, kind: MutationKind, id: &str) -> Result<()> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                bail!("backend mutation rejected");
            }
            self.mutations.lock().unwrap().push((kind, id.to_string()));
            Ok(())
        }
    }

    pub(crate) fn make_canonical(n: usize) -> Vec<CanonicalMessage> {
        (0..n)
            .map(|i| CanonicalMessage {
                id: format!("m{}", i + 1),
                subject: format!("Subject {}", i + 1),
                sender: format!("Sender {}", i + 1),
                sender_address: format!("sender{}@example.com", i + 1),
                snippet: format!("Snippet {}", i + 1),
                received_at: "2026-08-01T10:30:00Z".to_string(),
            })
            .collect()
    }

    pub(crate) fn make_observations(n: usize) -> Vec<ExternalObservation> {
        (0..n)
            .map(|i| ExternalObservation {
                position: i,
                sender: format!("Sender {}", i + 1),
                subject: format!("Subject {}", i + 1),
                timestamp: "10:30 AM".to_string(),
                external_id: format!("m{}", i + 1),
                raw_text: format!("Sender {} Subject {}", i + 1, i + 1),
            })
            .collect()
    }

    /// Dispatcher over an n-message mailbox where every observation carries
    /// its backend id. Returns the backend handle for inspection.
    pub(crate) fn make_dispatcher(
        n: usize,
        config: TriageConfig,
    ) -> (Dispatcher<MockOrder, MockBackend>, MockBackend) {
        make_dispatcher_with_body(n, config, "Full message body.")
    }

    pub(crate) fn make_dispatcher_with_body(
        n: usize,
        config: TriageConfig,
        body: &str,
    ) -> (Dispatcher<MockOrder, MockBackend>, MockBackend) {
        let order = MockOrder {
            observations: make_observations(n),
        };
        let backend = MockBackend {
            canonical: make_canonical(n),
            body: body.to_string(),
            ..Default::default()
        };
        let handle = backend.clone();
        (Dispatcher::new(order, backend, config), handle)
    }
}
