//! The agent turn loop: one model conversation with tool calling.
//!
//! 1. Build the request: system prompt + shared history + the new input
//! 2. Send it to the provider
//! 3. If the model asks for tools: execute them, append results, go to 2
//! 4. If the model answers in text: record the exchange and return it
//!
//! The loop stops after `max_iterations` model round-trips. Provider errors
//! are returned as-is; the runner never retries.

use async_trait::async_trait;
use mediscreen_core::agent::{Agent, AgentReply, AgentRole, ToolInvocation};
use mediscreen_core::message::Message;
use mediscreen_core::provider::{Provider, ProviderRequest};
use mediscreen_core::tool::{ToolCall, ToolRegistry};
use mediscreen_core::trace::Tracer;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::history::SharedHistory;

const MAX_ITERATIONS_REPLY: &str =
    "I'm sorry, I wasn't able to finish that step. Could you please repeat your last message?";

/// An [`Agent`] backed by a language model.
pub struct AgentRunner {
    role: AgentRole,
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: String,
    tools: Arc<ToolRegistry>,
    history: SharedHistory,
    tracer: Arc<dyn Tracer>,
    max_iterations: usize,
}

impl AgentRunner {
    pub fn new(
        role: AgentRole,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        history: SharedHistory,
        tracer: Arc<dyn Tracer>,
    ) -> Self {
        Self {
            role,
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            system_prompt: system_prompt.into(),
            tools: Arc::new(ToolRegistry::new()),
            history,
            tracer,
            max_iterations: 8,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the maximum number of model round-trips per turn (at least 1).
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn build_messages(&self, input: &str) -> Vec<Message> {
        let prior = self.history.snapshot().await;
        let mut messages = Vec::with_capacity(prior.len() + 2);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(prior);
        messages.push(Message::user(input));
        messages
    }

    async fn run_tools(
        &self,
        calls: &[mediscreen_core::message::MessageToolCall],
        messages: &mut Vec<Message>,
        invocations: &mut Vec<ToolInvocation>,
    ) {
        for call in calls.iter().map(ToolCall::from) {
            self.tracer.tool_invocation(&call.name, &call.arguments);

            let (output, success) = match self.tools.execute(&call).await {
                Ok(result) => (result.output, result.success),
                Err(e) => {
                    warn!(
                        agent = %self.role,
                        tool = %call.name,
                        error = %e,
                        "Tool execution failed"
                    );
                    // The model sees the error and may recover
                    (format!("Error: {e}"), false)
                }
            };

            messages.push(Message::tool_result(&call.id, &output));
            invocations.push(ToolInvocation {
                name: call.name,
                arguments: call.arguments,
                output,
                success,
            });
        }
    }
}

#[async_trait]
impl Agent for AgentRunner {
    fn role(&self) -> AgentRole {
        self.role
    }

    async fn invoke(&self, input: &str) -> mediscreen_core::Result<AgentReply> {
        let mut messages = self.build_messages(input).await;
        let definitions = self.tools.definitions();
        let mut invocations = Vec::new();

        info!(agent = %self.role, history = messages.len() - 2, "Invoking agent");

        for iteration in 1..=self.max_iterations {
            debug!(agent = %self.role, iteration, "Agent loop iteration");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: definitions.clone(),
            };

            let response = self.provider.complete(request).await?;

            if let Some(usage) = &response.usage {
                debug!(
                    agent = %self.role,
                    model = %response.model,
                    tokens = usage.total_tokens,
                    "Model responded"
                );
            }

            if !response.message.requests_tools() {
                let text = response.message.content;
                self.history.record_exchange(input, &text).await;
                return Ok(AgentReply {
                    text,
                    tool_invocations: invocations,
                });
            }

            debug!(
                agent = %self.role,
                tool_count = response.message.tool_calls.len(),
                "Executing tool calls"
            );
            let calls = response.message.tool_calls.clone();
            messages.push(response.message);
            self.run_tools(&calls, &mut messages, &mut invocations).await;
        }

        warn!(agent = %self.role, max = self.max_iterations, "Max tool iterations reached");
        self.history.record_exchange(input, MAX_ITERATIONS_REPLY).await;
        Ok(AgentReply {
            text: MAX_ITERATIONS_REPLY.into(),
            tool_invocations: invocations,
        })
    }
}
