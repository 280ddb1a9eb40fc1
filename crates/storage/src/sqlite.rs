//! SQLite session store.
//!
//! Two tables:
//! - `sessions`: one row per intake session
//! - `turns`: transcript turns, ordered by an autoincrement key

use async_trait::async_trait;
use chrono::Utc;
use mediscreen_core::error::SessionError;
use mediscreen_core::session::{Session, SessionId, SessionStore};
use mediscreen_core::transcript::{Speaker, Turn};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

const SELECT_SESSION: &str =
    "SELECT id, app_name, user_id, created_at FROM sessions WHERE id = ?1";

pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Open (and create if missing) the database at `url`,
    /// e.g. `sqlite://mediscreen.db`.
    pub async fn new(url: &str) -> Result<Self, SessionError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| SessionError::Storage(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| SessionError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite session store initialized at {url}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id          TEXT PRIMARY KEY NOT NULL,
                app_name    TEXT NOT NULL,
                user_id     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::Storage(format!("sessions table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS turns (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id  TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
                speaker     TEXT NOT NULL,
                text        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::Storage(format!("turns table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_turns_session ON turns(session_id, iid)")
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::Storage(format!("turns index: {e}")))?;

        debug!("SQLite session migrations complete");
        Ok(())
    }

    fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session, SessionError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| SessionError::Storage(format!("id column: {e}")))?;
        let app_name: String = row
            .try_get("app_name")
            .map_err(|e| SessionError::Storage(format!("app_name column: {e}")))?;
        let user_id: String = row
            .try_get("user_id")
            .map_err(|e| SessionError::Storage(format!("user_id column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| SessionError::Storage(format!("created_at column: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Session {
            id: SessionId(id),
            app_name,
            user_id,
            created_at,
        })
    }

    fn row_to_turn(row: &sqlx::sqlite::SqliteRow) -> Result<Turn, SessionError> {
        let speaker_json: String = row
            .try_get("speaker")
            .map_err(|e| SessionError::Storage(format!("speaker column: {e}")))?;
        let text: String = row
            .try_get("text")
            .map_err(|e| SessionError::Storage(format!("text column: {e}")))?;
        let speaker: Speaker = serde_json::from_str(&speaker_json)
            .map_err(|e| SessionError::Storage(format!("speaker decode: {e}")))?;
        Ok(Turn { speaker, text })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn create_session(&self, session: &Session) -> Result<(), SessionError> {
        let result = sqlx::query(
            "INSERT INTO sessions (id, app_name, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&session.id.0)
        .bind(&session.app_name)
        .bind(&session.user_id)
        .bind(session.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(SessionError::AlreadyExists(session.id.to_string()))
            }
            Err(e) => Err(SessionError::Storage(format!("INSERT session failed: {e}"))),
        }
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, SessionError> {
        let row = sqlx::query(SELECT_SESSION)
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SessionError::Storage(format!("SELECT session failed: {e}")))?;

        row.as_ref().map(Self::row_to_session).transpose()
    }

    async fn append_turn(&self, id: &SessionId, turn: &Turn) -> Result<(), SessionError> {
        let speaker = serde_json::to_string(&turn.speaker)
            .map_err(|e| SessionError::Storage(format!("speaker encode: {e}")))?;

        let result = sqlx::query(
            "INSERT INTO turns (session_id, speaker, text, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&id.0)
        .bind(speaker)
        .bind(&turn.text)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(SessionError::NotFound(id.to_string()))
            }
            Err(e) => Err(SessionError::Storage(format!("INSERT turn failed: {e}"))),
        }
    }

    async fn turns(&self, id: &SessionId) -> Result<Vec<Turn>, SessionError> {
        if self.get_session(id).await?.is_none() {
            return Err(SessionError::NotFound(id.to_string()));
        }

        let rows = sqlx::query("SELECT speaker, text FROM turns WHERE session_id = ?1 ORDER BY iid")
            .bind(&id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SessionError::Storage(format!("SELECT turns failed: {e}")))?;

        rows.iter().map(Self::row_to_turn).collect()
    }
}
