//! Structured errors for the dispatcher's public surface.
//!
//! Validation failures are rejected here before any session state is
//! touched. Collaborator failures during a command never surface as errors;
//! they are caught per-command and reported as a spoken apology instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    /// No session with the given id: never created, or swept after idling out.
    #[error("unknown session: {0}")]
    UnknownSession(String),

    /// Command name outside the closed command set.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A collaborator failed while building a session (scrape or canonical
    /// listing), so there is no session to run commands against.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TriageError>;
