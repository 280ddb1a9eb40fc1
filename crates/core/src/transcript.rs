//! The patient-facing conversation record.
//!
//! Append-only. Insertion order is conversation order, which the controller
//! relies on when it looks back for the last patient utterance and when it
//! renders the whole record for the scribe.

use serde::{Deserialize, Serialize};
use crate::agent::AgentRole;

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "agent", rename_all = "snake_case")]
pub enum Speaker {
    Patient,
    Agent(AgentRole),
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Patient => "Patient",
            Self::Agent(role) => role.display_name(),
        }
    }
}

/// One line of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn patient(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Patient,
            text: text.into(),
        }
    }

    pub fn agent(role: AgentRole, text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent(role),
            text: text.into(),
        }
    }

    /// `<Speaker>: <text>`
    pub fn render(&self) -> String {
        format!("{}: {}", self.speaker.label(), self.text)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent patient utterance, if the patient has spoken.
    pub fn last_patient_utterance(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Patient)
            .map(|t| t.text.as_str())
    }

    /// All turns rendered in order and joined by a single space.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(Turn::render)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
