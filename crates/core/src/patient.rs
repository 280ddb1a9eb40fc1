//! Patient identifiers and the session's patient context cell.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)PT-\d+").expect("patient id pattern is valid"))
}

/// A canonical (uppercase) patient identifier: `PT-` followed by digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatientId(String);

impl PatientId {
    /// Find the first identifier token anywhere in free text.
    pub fn find_in(text: &str) -> Option<Self> {
        id_pattern()
            .find(text)
            .map(|m| Self(m.as_str().to_uppercase()))
    }

    /// Parse a value that must be exactly one identifier (surrounding
    /// whitespace allowed), e.g. a tool argument.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let m = id_pattern().find(trimmed)?;
        (m.start() == 0 && m.end() == trimmed.len()).then(|| Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who the session is currently about.
///
/// Starts as the generic session user id and is replaced once a patient is
/// recognised. A recognised patient is never reverted to the placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatientContext {
    Placeholder(String),
    Identified(PatientId),
}

impl PatientContext {
    pub fn placeholder(user_id: impl Into<String>) -> Self {
        Self::Placeholder(user_id.into())
    }

    /// Record a recognised identifier. Later captures overwrite earlier ones.
    pub fn identify(&mut self, id: PatientId) {
        *self = Self::Identified(id);
    }

    pub fn patient_id(&self) -> Option<&PatientId> {
        match self {
            Self::Identified(id) => Some(id),
            Self::Placeholder(_) => None,
        }
    }

    /// The label used in hand-off messages and note file names.
    pub fn label(&self) -> &str {
        match self {
            Self::Placeholder(user_id) => user_id,
            Self::Identified(id) => id.as_str(),
        }
    }
}
