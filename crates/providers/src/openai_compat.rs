//! Chat-completions client for OpenAI-compatible endpoints.
//!
//! Gemini is reached through Google's OpenAI-compatible endpoint; OpenAI,
//! OpenRouter, Groq, Ollama, vLLM and llama.cpp speak the same protocol.
//! Requests are non-streaming and may carry tool definitions.

use async_trait::async_trait;
use mediscreen_core::error::ProviderError;
use mediscreen_core::message::{Message, MessageToolCall, Role};
use mediscreen_core::provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::with_timeout(name, base_url, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

/// Map a non-success HTTP status to a provider error.
fn classify_status(status: StatusCode, retry_after: Option<u64>, body: String) -> ProviderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::AuthenticationFailed(format!("{status}: check the API key"))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::Timeout(body),
        _ => ProviderError::ApiError {
            status_code: status.as_u16(),
            message: body,
        },
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = ChatRequest::from(&request);
        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending chat completion"
        );

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(response.headers());
            let text = response.text().await.unwrap_or_default();
            warn!(provider = %self.name, %status, body = %text, "Chat completion rejected");
            return Err(classify_status(status, retry_after, text));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| ProviderError::ApiError {
            status_code: status.as_u16(),
            message: format!("Unreadable chat completion: {e}"),
        })?;
        parsed.into_provider_response()
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport_error)?;
        Ok(response.status().is_success())
    }
}

// --- Wire format ---

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

impl<'a> From<&'a ProviderRequest> for ChatRequest<'a> {
    fn from(request: &'a ProviderRequest) -> Self {
        Self {
            model: &request.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            temperature: request.temperature,
            stream: false,
            max_tokens: request.max_tokens,
            tools: request.tools.iter().map(WireTool::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: Some(message.content.clone()),
            tool_calls: message.tool_calls.iter().map(WireToolCall::from).collect(),
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

fn function_kind() -> String {
    "function".into()
}

impl From<&MessageToolCall> for WireToolCall {
    fn from(call: &MessageToolCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: function_kind(),
            function: WireFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolDefinition,
}

impl<'a> From<&'a ToolDefinition> for WireTool<'a> {
    fn from(definition: &'a ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: definition,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
}

impl ChatResponse {
    /// The first choice as an assistant message.
    fn into_provider_response(self) -> Result<ProviderResponse, ProviderError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: StatusCode::OK.as_u16(),
                message: "Chat completion contained no choices".into(),
            })?;

        let mut message = Message::assistant(choice.message.content.unwrap_or_default());
        message.tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|call| MessageToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        Ok(ProviderResponse {
            message,
            usage: self.usage,
            model: self.model,
        })
    }
}
