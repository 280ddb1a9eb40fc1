//! The seam between agents and language model backends.
//!
//! Requests are answered with one complete message. Streaming is never
//! needed: the turn controller only acts on whole replies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::Message;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub model: String,
    pub messages: Vec<Message>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tools the model may call. Empty for agents without tools.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.7
}

/// Name, description and JSON Schema of a callable tool, as advertised
/// to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub message: Message,
    pub usage: Option<Usage>,
    /// Model that answered, as reported by the backend.
    pub model: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Whether the backend is reachable with the configured credentials.
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_temperature_defaults_when_missing() {
        let json = r#"{"model": "gemini-2.5-flash-lite", "messages": []}"#;
        let req: ProviderRequest = serde_json::from_str(json).unwrap();
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(req.tools.is_empty());
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn empty_tool_list_is_not_serialized() {
        let req = ProviderRequest {
            model: "m".into(),
            messages: vec![Message::system("You are the Clinical Scribe.")],
            temperature: 0.2,
            max_tokens: Some(512),
            tools: Vec::new(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("tools").is_none());
        assert_eq!(json["max_tokens"], 512);
    }
}
