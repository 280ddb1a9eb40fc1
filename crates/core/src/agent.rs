//! The closed set of intake agents and the capability they share.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One of the three agents taking part in an intake session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    /// Receptionist: identifies the patient and routes them.
    IntakeCoordinator,
    /// Nurse practitioner: runs the structured symptom interview.
    SymptomSpecialist,
    /// Writes the SOAP note from the finished transcript.
    ClinicalScribe,
}

impl AgentRole {
    /// The name printed before the agent's replies and used in the transcript.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::IntakeCoordinator => "IntakeCoordinator",
            Self::SymptomSpecialist => "SymptomSpecialist",
            Self::ClinicalScribe => "ClinicalScribe",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A tool call the agent made while producing its reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: serde_json::Value,
    pub output: String,
    pub success: bool,
}

/// The outcome of one agent invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentReply {
    /// Final text answer. May be empty when the model only used tools.
    pub text: String,

    /// Tools invoked during the turn, in call order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_invocations: Vec<ToolInvocation>,
}

impl AgentReply {
    /// A reply with text only.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_invocations: Vec::new(),
        }
    }

    /// Whether the reply carries any visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The first invocation of the named tool, if any.
    pub fn invocation(&self, tool_name: &str) -> Option<&ToolInvocation> {
        self.tool_invocations.iter().find(|inv| inv.name == tool_name)
    }
}

/// Prompt in, text out.
///
/// Implemented by the model-backed agent runner and by scripted agents in
/// tests. The turn controller dispatches to one of these per [`AgentRole`].
#[async_trait]
pub trait Agent: Send + Sync {
    fn role(&self) -> AgentRole;

    /// Send one input to the agent and wait for its complete reply.
    async fn invoke(&self, input: &str) -> crate::Result<AgentReply>;
}
