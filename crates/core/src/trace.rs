//! Conversation trace events and the sink contract.
//!
//! Trace events are an append-only audit of what each agent was asked,
//! what it answered, and which tools it used. They are kept apart from the
//! patient-facing console and from diagnostic `tracing` output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// All events a tracer can record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent {
    /// Control is handed to an agent with the given input.
    AgentTurnStart { agent: String, input: String },

    /// The model answered on behalf of an agent.
    ModelResponse { agent: String, response: String },

    /// An agent invoked a tool.
    ToolInvocation {
        tool: String,
        arguments: serde_json::Value,
    },

    /// Something failed; the conversation carries on.
    Error { context: String, detail: String },

    /// Controller milestones: startup, session init, hand-off, note written.
    System { message: String },
}

impl TraceEvent {
    pub fn system(message: impl Into<String>) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A recorded event with its time of arrival.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    pub timestamp: DateTime<Utc>,
    pub event: TraceEvent,
}

/// Sink for trace events.
///
/// `record` is infallible by contract: implementations absorb their own
/// failures and must never surface them to the caller.
pub trait Tracer: Send + Sync {
    fn record(&self, event: TraceEvent);

    fn agent_turn_start(&self, agent: &str, input: &str) {
        self.record(TraceEvent::AgentTurnStart {
            agent: agent.into(),
            input: input.into(),
        });
    }

    fn model_response(&self, agent: &str, response: &str) {
        self.record(TraceEvent::ModelResponse {
            agent: agent.into(),
            response: response.into(),
        });
    }

    fn tool_invocation(&self, tool: &str, arguments: &serde_json::Value) {
        self.record(TraceEvent::ToolInvocation {
            tool: tool.into(),
            arguments: arguments.clone(),
        });
    }

    fn on_error(&self, context: &str, detail: &str) {
        self.record(TraceEvent::Error {
            context: context.into(),
            detail: detail.into(),
        });
    }

    fn system(&self, message: &str) {
        self.record(TraceEvent::system(message));
    }
}
