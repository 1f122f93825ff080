//! Read-only queries and session teardown.

use serde_json::json;

use crate::backend::{MailBackend, OrderSource};
use crate::session::Session;

use super::{CommandOutcome, Dispatcher};

impl<O: OrderSource, B: MailBackend> Dispatcher<O, B> {
    /// Pure read over the queue position; mutates nothing.
    pub(super) fn query_remaining(&self, session: &Session) -> CommandOutcome {
        let remaining = session.remaining();
        let total = session.total();
        let spoken = match remaining {
            0 => format!("You've processed all {} messages. Nice work!", total),
            1 => "Just one message remaining.".to_string(),
            n => format!("{} of your {} messages remaining.", n, total),
        };
        CommandOutcome::ok(
            json!({
                "remaining": remaining,
                "total": total,
                "position": session.cursor() + 1,
            }),
            spoken,
        )
    }

    pub(super) fn end_session(&self, session: &mut Session) -> CommandOutcome {
        let processed = session.processed();
        let remaining = session.remaining();
        session.end();

        let spoken = if remaining > 0 {
            format!(
                "Ending the session. You went through {} messages; {} are still waiting for next time.",
                processed, remaining
            )
        } else {
            format!(
                "Session complete, all {} messages handled. Nice work!",
                processed
            )
        };
        CommandOutcome::ok(
            json!({
                "processed": processed,
                "remaining": remaining,
                "status": session.status,
            }),
            spoken,
        )
    }

    /// Announce the current item with its full content, falling back to the
    /// snapshot snippet if the fetch fails. Idempotent: no cursor or undo
    /// change.
    pub(super) async fn get_current(&self, session: &Session) -> CommandOutcome {
        let Some(item) = session.current() else {
            return CommandOutcome::fail(
                json!({ "remaining": 0 }),
                "You're at the end of your queue. Say end session to finish up.",
            );
        };

        let body = match self
            .backend
            .fetch_content(&session.account, &item.canonical_id)
            .await
        {
            Ok(content) => content.body,
            Err(e) => {
                tracing::warn!(
                    session = %session.id,
                    id = %item.canonical_id,
                    error = %e,
                    "content fetch failed, falling back to snippet"
                );
                item.snippet.clone()
            }
        };
        let excerpt = excerpt(&body, self.config.excerpt_chars);

        CommandOutcome::ok(
            json!({
                "email": {
                    "id": item.canonical_id,
                    "sender": item.sender,
                    "subject": item.subject,
                    "body": excerpt,
                },
                "position": item.position,
            }),
            format!("From {}, subject {}. {}", item.sender, item.subject, excerpt),
        )
    }
}

/// Cap text to `max_chars` characters without splitting a code point.
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
