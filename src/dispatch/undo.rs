//! Time-boxed single-action undo.
//!
//! Reverses the most recent mutating action while its window is open, then
//! rewinds the cursor back onto the restored message. A failed reverse
//! mutation keeps the entry alive so the undo can be retried within the
//! original window.

use std::time::Instant;

use serde_json::json;

use crate::backend::{MailBackend, OrderSource};
use crate::session::Session;

use super::{CommandOutcome, Dispatcher, APOLOGY};

const NOTHING_TO_UNDO: &str = "There's nothing to undo. The undo window may have expired.";

impl<O: OrderSource, B: MailBackend> Dispatcher<O, B> {
    pub(super) async fn undo(&self, session: &mut Session) -> CommandOutcome {
        let Some(entry) = session.live_undo(Instant::now()).cloned() else {
            return CommandOutcome::fail(json!({ "undone": false }), NOTHING_TO_UNDO);
        };

        if let Err(e) = self
            .backend
            .mutate(&session.account, entry.reverse, &entry.target_id)
            .await
        {
            tracing::warn!(
                session = %session.id,
                id = %entry.target_id,
                reverse = ?entry.reverse,
                error = %e,
                "undo mutation failed"
            );
            // Entry stays live so the undo can be retried.
            return CommandOutcome::fail(json!({ "undone": false, "kind": entry.action }), APOLOGY);
        }

        session.clear_undo();
        session.jump_to(&entry.target_id);

        CommandOutcome::ok(
            json!({
                "undone": true,
                "kind": entry.action,
                "id": entry.target_id,
                "position": session.cursor(),
            }),
            format!(
                "Okay, I've undone the {}. We're back on that message.",
                entry.action.verb()
            ),
        )
    }
}
