use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use hardball_core::session::Session;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// In-memory sessions, one async mutex each so a session never has two
/// turns in flight. Nothing is persisted.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
    max_age: Duration,
}

impl SessionStore {
    /// Sessions older than `max_age` are dropped the next time one is added.
    pub fn new(max_age: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_age,
        }
    }

    pub async fn insert(&self, session: Session) -> Uuid {
        let id = session.id();
        let mut sessions = self.sessions.write().await;
        let max_age = self.max_age;
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(s) => s.age() <= max_age,
            // Busy with a turn, so clearly still in use.
            Err(_) => true,
        });
        sessions.insert(id, Arc::new(Mutex::new(session)));
        tracing::debug!(session = %id, live = sessions.len(), "session stored");
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
