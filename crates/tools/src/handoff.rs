//! Hand-off directive tool.
//!
//! Calling it has no side effect here. The turn controller watches for the
//! invocation and moves the conversation to the symptom specialist.

use async_trait::async_trait;
use mediscreen_core::error::ToolError;
use mediscreen_core::tool::{Tool, ToolResult};

pub const HANDOFF_TO_SPECIALIST: &str = "handoff_to_specialist";

pub struct HandoffTool;

#[async_trait]
impl Tool for HandoffTool {
    fn name(&self) -> &str {
        HANDOFF_TO_SPECIALIST
    }

    fn description(&self) -> &str {
        "Transfer the conversation to the clinical triage specialist once the patient is \
         identified and the chief complaint is known."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reason": {
                    "type": "string",
                    "description": "Short summary of the chief complaint"
                }
            }
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let output = match arguments["reason"].as_str().map(str::trim) {
            Some(reason) if !reason.is_empty() => {
                format!("Hand-off to the triage specialist scheduled. Reason: {reason}")
            }
            _ => "Hand-off to the triage specialist scheduled.".to_string(),
        };
        Ok(ToolResult::ok(output))
    }
}
