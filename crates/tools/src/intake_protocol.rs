//! Intake standard operating procedure, exposed as a tool.

use async_trait::async_trait;
use mediscreen_core::error::ToolError;
use mediscreen_core::tool::{Tool, ToolResult};

pub const GET_INTAKE_PROTOCOL: &str = "get_intake_protocol";

pub const INTAKE_PROTOCOL: &str = "1. Verify ID. 2. Get Chief Complaint. 3. Check Vitals.";

pub struct IntakeProtocolTool;

#[async_trait]
impl Tool for IntakeProtocolTool {
    fn name(&self) -> &str {
        GET_INTAKE_PROTOCOL
    }

    fn description(&self) -> &str {
        "Return the standard operating procedure for new patient intake."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        Ok(ToolResult::ok(INTAKE_PROTOCOL))
    }
}
