//! Errors for the MediScreen domain.
//!
//! One enum per collaborator. [`Error`] is what an agent turn can fail
//! with; stores and tools report their own enums to the controller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures talking to a language model backend. `Clone` so scripted
/// providers can replay them.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed with status {status_code}: {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session already exists: {0}")]
    AlreadyExists(String),

    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Failed to create notes directory {path}: {reason}")]
    DirectoryFailed { path: String, reason: String },

    #[error("Failed to write note {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}
