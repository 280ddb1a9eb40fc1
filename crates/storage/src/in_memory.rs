//! In-memory session store. Useful for tests and for runs that should
//! leave nothing on disk.

use async_trait::async_trait;
use mediscreen_core::error::SessionError;
use mediscreen_core::session::{Session, SessionId, SessionStore};
use mediscreen_core::transcript::Turn;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct StoredSession {
    session: Session,
    turns: Vec<Turn>,
}

pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, StoredSession>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn create_session(&self, session: &Session) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(SessionError::AlreadyExists(session.id.to_string()));
        }
        sessions.insert(
            session.id.clone(),
            StoredSession {
                session: session.clone(),
                turns: Vec::new(),
            },
        );
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.read().await.get(id).map(|s| s.session.clone()))
    }

    async fn append_turn(&self, id: &SessionId, turn: &Turn) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        stored.turns.push(turn.clone());
        Ok(())
    }

    async fn turns(&self, id: &SessionId) -> Result<Vec<Turn>, SessionError> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|s| s.turns.clone())
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }
}
