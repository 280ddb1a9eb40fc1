//! Intake session identity and the persistence contract behind it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::SessionError;
use crate::transcript::Turn;

/// Unique identifier for an intake session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single intake conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub app_name: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(app_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            app_name: app_name.into(),
            user_id: user_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// Where sessions and their turns are kept.
#[async_trait]
pub trait SessionStore: Send + Sync {
    fn name(&self) -> &str;

    /// Create the session. Fails with [`SessionError::AlreadyExists`] when
    /// a session with the same id is already stored.
    async fn create_session(&self, session: &Session) -> Result<(), SessionError>;

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, SessionError>;

    /// Append one transcript turn to the session.
    async fn append_turn(&self, id: &SessionId, turn: &Turn) -> Result<(), SessionError>;

    /// All turns of the session in insertion order.
    async fn turns(&self, id: &SessionId) -> Result<Vec<Turn>, SessionError>;
}
