//! Crate-wide constants for tuning and configuration
//!
//! Centralizes magic numbers to make them discoverable and configurable.

/// Grace period in seconds during which the last mutating action can be
/// reversed. After this window the action is final.
pub const UNDO_WINDOW_SECS: u64 = 15;

/// Time-to-idle in seconds before an untouched session is swept from the
/// store. A triage run that goes silent for this long is abandoned.
pub const SESSION_TTI_SECS: u64 = 1800;

/// Maximum number of concurrently retained sessions.
pub const SESSION_STORE_CAPACITY: u64 = 256;

/// Character cap for spoken content excerpts.
/// Keeps announcements short enough for a voice transport.
pub const EXCERPT_MAX_CHARS: usize = 500;

/// Minimum combined similarity score for accepting a fuzzy identity match.
/// Scores at or below this leave the observation unmatched.
pub const FUZZY_ACCEPT_THRESHOLD: f64 = 0.5;

/// Weight of subject similarity in the combined fuzzy score.
pub const SUBJECT_WEIGHT: f64 = 0.7;

/// Weight of sender similarity in the combined fuzzy score.
pub const SENDER_WEIGHT: f64 = 0.3;

/// Length in bytes of the random session id (hex-encoded to twice this).
pub const SESSION_ID_BYTES: usize = 16;
