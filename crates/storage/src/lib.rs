//! Session and note persistence for MediScreen.

pub mod in_memory;
pub mod notes;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemorySessionStore;
pub use notes::FileNoteStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSessionStore;

use mediscreen_config::{SessionBackend, SessionConfig};
use mediscreen_core::error::SessionError;
use mediscreen_core::session::SessionStore;
use std::sync::Arc;

/// Open the session store selected in configuration.
pub async fn open_session_store(
    config: &SessionConfig,
) -> Result<Arc<dyn SessionStore>, SessionError> {
    match config.backend {
        SessionBackend::Memory => Ok(Arc::new(InMemorySessionStore::new())),
        #[cfg(feature = "sqlite")]
        SessionBackend::Sqlite => Ok(Arc::new(
            SqliteSessionStore::new(&config.database_url).await?,
        )),
        #[cfg(not(feature = "sqlite"))]
        SessionBackend::Sqlite => Err(SessionError::Storage(
            "SQLite support not compiled in; set session.backend = \"memory\"".into(),
        )),
    }
}
