//! Mutating actions (archive, delete, star) and skip.

use serde_json::json;

use crate::backend::{ActionKind, MailBackend, OrderSource};
use crate::session::{Session, UndoEntry};

use super::{announce_item, CommandOutcome, Dispatcher, ALL_DONE, APOLOGY, END_OF_QUEUE};

impl<O: OrderSource, B: MailBackend> Dispatcher<O, B> {
    /// Apply a mutating action to the current item, record its reverse for
    /// undo, and advance. Nothing is committed until the backend confirms.
    pub(super) async fn act(&self, session: &mut Session, kind: ActionKind) -> CommandOutcome {
        let Some(item) = session.current().cloned() else {
            return CommandOutcome::fail(
                json!({ "remaining": 0 }),
                format!("{} There's nothing left to {}.", END_OF_QUEUE, kind.verb()),
            );
        };

        if let Err(e) = self
            .backend
            .mutate(&session.account, kind.mutation(), &item.canonical_id)
            .await
        {
            tracing::warn!(
                session = %session.id,
                id = %item.canonical_id,
                kind = ?kind,
                error = %e,
                "mutation failed"
            );
            return CommandOutcome::fail(json!({ "performed": false, "kind": kind }), APOLOGY);
        }

        session.record_undo(UndoEntry::new(
            kind,
            item.canonical_id.clone(),
            self.config.undo_window(),
        ));
        let next = session.advance().cloned();

        let spoken = match &next {
            Some(next_item) => format!("{} {}", kind.confirmation(), announce_item(next_item)),
            None => format!("{} {}", kind.confirmation(), ALL_DONE),
        };
        CommandOutcome::ok(
            json!({
                "performed": true,
                "kind": kind,
                "id": item.canonical_id,
                "remaining": session.remaining(),
                "next": next,
            }),
            spoken,
        )
    }

    /// Advance without touching the message or the undo slot.
    pub(super) fn skip(&self, session: &mut Session) -> CommandOutcome {
        let Some(item) = session.current().cloned() else {
            return CommandOutcome::fail(json!({ "remaining": 0 }), END_OF_QUEUE);
        };

        let next = session.advance().cloned();
        let spoken = match &next {
            Some(next_item) => format!("Skipped. {}", announce_item(next_item)),
            None => format!("Skipped. {}", ALL_DONE),
        };
        CommandOutcome::ok(
            json!({
                "skipped": item.canonical_id,
                "remaining": session.remaining(),
                "next": next,
            }),
            spoken,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::MutationKind;
    use crate::config::TriageConfig;
    use crate::dispatch::testing::{make_dispatcher, ACCOUNT};
    use crate::dispatch::Command;
    use crate::session::SessionStatus;

    use super::*;

    #[tokio::test]
    async fn test_archive_mutates_records_undo_and_advances() {
        let (dispatcher, backend) = make_dispatcher(3, TriageConfig::default());
        let started = dispatcher.start_session(ACCOUNT).await.unwrap();

        let outcome = dispatcher
            .command(&started.session_id, Command::Act(ActionKind::Archive))
            .await
            .unwrap();

        assert!(outcome.success);
        assert!(outcome.spoken_message.starts_with("Archived."));
        assert!(outcome.spoken_message.contains("Subject 2"));
        assert_eq!(outcome.data["id"], "m1");
        assert_eq!(outcome.data["remaining"], 2);
        assert_eq!(
            *backend.mutations.lock().unwrap(),
            vec![(MutationKind::Archive, "m1".to_string())]
        );

        let status = dispatcher.get_status(&started.session_id).await.unwrap();
        assert_eq!(status.cursor, 1);

        // The recorded reverse op is reachable: undo succeeds.
        let outcome = dispatcher
            .command(&started.session_id, Command::Undo)
            .await
            .unwrap();
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn test_act_failure_leaves_session_untouched() {
        let (dispatcher, backend) = make_dispatcher(2, TriageConfig::default());
        let started = dispatcher.start_session(ACCOUNT).await.unwrap();
        backend
            .fail_mutations
            .store(true, std::sync::atomic::Ordering::SeqCst);

        let outcome = dispatcher
            .command(&started.session_id, Command::Act(ActionKind::Delete))
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.spoken_message, APOLOGY);
        assert!(backend.mutations.lock().unwrap().is_empty());

        let status = dispatcher.get_status(&started.session_id).await.unwrap();
        assert_eq!(status.cursor, 0);

        // No undo entry was recorded for the failed attempt.
        backend
            .fail_mutations
            .store(false, std::sync::atomic::Ordering::SeqCst);
        let outcome = dispatcher
            .command(&started.session_id, Command::Undo)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.spoken_message.contains("nothing to undo"));
    }

    #[tokio::test]
    async fn test_skip_never_records_undo() {
        let (dispatcher, backend) = make_dispatcher(3, TriageConfig::default());
        let started = dispatcher.start_session(ACCOUNT).await.unwrap();

        let outcome = dispatcher
            .command(&started.session_id, Command::Skip)
            .await
            .unwrap();
        assert!(outcome.success);
        assert!(outcome.spoken_message.starts_with("Skipped."));
        assert_eq!(outcome.data["skipped"], "m1");
        assert!(backend.mutations.lock().unwrap().is_empty());

        let outcome = dispatcher
            .command(&started.session_id, Command::Undo)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.spoken_message.contains("nothing to undo"));
    }

    #[tokio::test]
    async fn test_acting_through_the_queue_completes_session() {
        let (dispatcher, _) = make_dispatcher(2, TriageConfig::default());
        let started = dispatcher.start_session(ACCOUNT).await.unwrap();

        let outcome = dispatcher
            .command(&started.session_id, Command::Act(ActionKind::Star))
            .await
            .unwrap();
        assert!(outcome.success);

        let outcome = dispatcher
            .command(&started.session_id, Command::Act(ActionKind::Archive))
            .await
            .unwrap();
        assert!(outcome.success);
        assert!(outcome.spoken_message.contains("all done"));
        assert_eq!(outcome.data["remaining"], 0);
        assert!(outcome.data["next"].is_null());

        let status = dispatcher.get_status(&started.session_id).await.unwrap();
        assert_eq!(status.status, SessionStatus::Completed);
        assert_eq!(status.cursor, 2);
    }
}
