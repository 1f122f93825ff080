//! Voxtriage: the stateful core behind a voice-driven email triage agent.
//!
//! An external conversational transport announces one message at a time,
//! accepts a spoken command, applies the effect against the mail backend,
//! advances, and allows a short grace period to reverse the last effect.
//! This crate owns the stateful parts: reconciling the scraped inbox
//! ordering with the canonical message set, the resumable session cursor,
//! the time-boxed undo slot, and the command dispatch that composes them.
//!
//! Credential handling, inbox scraping, the actual mailbox mutations, and
//! the speech layer are collaborators behind the traits in [`backend`].

pub mod backend;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod reconcile;
pub mod session;

pub use backend::{ActionKind, MailBackend, MessageContent, MutationKind, OrderSource};
pub use config::TriageConfig;
pub use dispatch::{Command, CommandOutcome, Dispatcher, StartedSession, StatusReport};
pub use error::{Result, TriageError};
pub use reconcile::{CanonicalMessage, ExternalObservation, MappingResult, MatchMethod};
pub use session::{QueueItem, Session, SessionStatus, SessionStore, UndoEntry};
