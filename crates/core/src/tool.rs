//! Capabilities an agent may call during its turn.
//!
//! The intake coordinator uses tools to look up patient history and to
//! signal a hand-off; the other agents run without tools.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::error::ToolError;
use crate::message::MessageToolCall;
use crate::provider::ToolDefinition;

/// A tool call with its arguments already parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Id assigned by the model; echoed back on the result message.
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl From<&MessageToolCall> for ToolCall {
    fn from(call: &MessageToolCall) -> Self {
        Self {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.parsed_arguments(),
        }
    }
}

/// Tool output as the model will see it. A lookup that ran but found
/// nothing is `success: false` with an explanatory `output`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model calls the tool by, e.g. `get_patient_history`.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object.
    fn parameters_schema(&self) -> serde_json::Value;

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_owned(),
            description: self.description().to_owned(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The tools one agent may call, keyed by name.
///
/// Ordered so definitions reach the model in a stable order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any tool registered under the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_owned(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        match self.tools.get(&call.name) {
            Some(tool) => tool.execute(call.arguments.clone()).await,
            None => Err(ToolError::NotFound(call.name.clone())),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
