//! Shared test helpers: scripted providers and agents.

use async_trait::async_trait;
use mediscreen_core::agent::{Agent, AgentReply, AgentRole};
use mediscreen_core::error::ProviderError;
use mediscreen_core::message::{Message, MessageToolCall};
use mediscreen_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays scripted provider responses in order and keeps every request.
///
/// Panics when called more often than it has responses.
pub struct SequentialMockProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::default(),
        }
    }

    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    /// One round of tool calls, then a text answer.
    pub fn tool_then_answer(tool_calls: Vec<MessageToolCall>, thought: &str, answer: &str) -> Self {
        Self::new(vec![
            make_tool_call_response(tool_calls, thought),
            make_text_response(answer),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = self.call_count() + 1;
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| {
            panic!("SequentialMockProvider: no response scripted for call #{call}")
        }))
    }
}

/// A provider whose every call fails with the given error.
pub struct FailingProvider(pub ProviderError);

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(self.0.clone())
    }
}

/// An agent that replays scripted replies and records its inputs.
pub struct ScriptedAgent {
    role: AgentRole,
    replies: Mutex<VecDeque<Result<AgentReply, ProviderError>>>,
    inputs: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    pub fn new(role: AgentRole, replies: Vec<AgentReply>) -> Self {
        Self::with_results(role, replies.into_iter().map(Ok).collect())
    }

    pub fn with_results(role: AgentRole, replies: Vec<Result<AgentReply, ProviderError>>) -> Self {
        Self {
            role,
            replies: Mutex::new(replies.into()),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(role: AgentRole, texts: &[&str]) -> Self {
        Self::new(role, texts.iter().map(|t| AgentReply::text(*t)).collect())
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn role(&self) -> AgentRole {
        self.role
    }

    async fn invoke(&self, input: &str) -> mediscreen_core::Result<AgentReply> {
        self.inputs.lock().unwrap().push(input.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(e)) => Err(e.into()),
            None => panic!("ScriptedAgent {}: no more replies", self.role),
        }
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 12,
            completion_tokens: 6,
            total_tokens: 18,
        }),
        model: "mock-model".into(),
    }
}

/// An assistant turn asking for `tool_calls`, with optional visible text.
pub fn make_tool_call_response(
    tool_calls: Vec<MessageToolCall>,
    thought: &str,
) -> ProviderResponse {
    ProviderResponse {
        message: Message {
            tool_calls,
            ..Message::assistant(thought)
        },
        usage: None,
        model: "mock-model".into(),
    }
}

pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_owned(),
        arguments: args.to_string(),
    }
}
