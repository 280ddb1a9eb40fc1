//! The clinical note produced at the end of an interview.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use crate::error::NoteError;

/// A finished SOAP note. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalNote {
    subject: String,
    body: String,
    created_at: DateTime<Local>,
}

impl ClinicalNote {
    /// `subject` is the patient id, or the session user id when no patient
    /// was recognised.
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self::at(subject, body, Local::now())
    }

    pub fn at(
        subject: impl Into<String>,
        body: impl Into<String>,
        created_at: DateTime<Local>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            created_at,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// `<subject>_SOAP_Note_<YYYYMMDD_HHMMSS>.txt`
    pub fn file_name(&self) -> String {
        format!(
            "{}_SOAP_Note_{}.txt",
            self.subject,
            self.created_at.format("%Y%m%d_%H%M%S")
        )
    }
}

/// Durable destination for finished notes.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Persist the note and return where it was written.
    async fn persist(&self, note: &ClinicalNote) -> Result<String, NoteError>;
}
