//! Keyed session store with a TTL sweep.
//!
//! Sessions live behind per-session async mutexes; the dispatcher holds the
//! lock across a whole command, including awaited collaborator calls, so
//! commands against one session are strictly serialized even when the
//! transport retries or double-fires. Idle sessions are swept by moka's
//! time-to-idle policy rather than an explicit retention job.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::Session;

pub struct SessionStore {
    sessions: moka::future::Cache<String, Arc<Mutex<Session>>>,
}

impl SessionStore {
    pub fn new(capacity: u64, tti: Duration) -> Self {
        let sessions = moka::future::Cache::builder()
            .max_capacity(capacity)
            .time_to_idle(tti)
            .build();
        Self { sessions }
    }

    pub async fn insert(&self, session: Session) -> Arc<Mutex<Session>> {
        let id = session.id.clone();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.insert(id, Arc::clone(&handle)).await;
        handle
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.get(id).await
    }
}
