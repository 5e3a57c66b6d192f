//! The function-calling conversation loop.

use fnclient_core::{FunctionRegistry, ToolDescriptor};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::conversation::Conversation;
use crate::dispatch::dispatch_all;
use crate::endpoint::{ChatEndpoint, ChatRequest, RemoteError, ToolChoice};
use crate::error::ClientError;
use crate::message::{Message, Role};

/// Per-call overrides for [`FunctionClient::send_message`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions<'a> {
    /// Tool set for this call only, instead of the client's own.
    pub functions: Option<&'a FunctionRegistry>,
    /// Tool the model must call in the first round.
    pub force_function: Option<&'a str>,
}

impl<'a> SendOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_functions(mut self, functions: &'a FunctionRegistry) -> Self {
        self.functions = Some(functions);
        self
    }

    pub fn force_function(mut self, name: &'a str) -> Self {
        self.force_function = Some(name);
        self
    }
}

/// Drives a chat endpoint through tool calls until it answers in plain text.
///
/// The client owns the conversation. Every operation that talks to the
/// endpoint takes `&mut self`, so one client runs one turn at a time.
///
/// A turn's messages are collected locally and appended to the conversation
/// when the turn ends, whether it returns an answer or an error. Dropping the
/// future of an unfinished turn leaves the conversation as it was.
pub struct FunctionClient<E> {
    endpoint: E,
    config: ClientConfig,
    functions: FunctionRegistry,
    conversation: Conversation,
}

impl<E: ChatEndpoint> FunctionClient<E> {
    pub fn builder(endpoint: E) -> FunctionClientBuilder<E> {
        FunctionClientBuilder::new(endpoint)
    }

    pub fn new(endpoint: E, config: ClientConfig) -> Result<Self, ClientError> {
        Self::builder(endpoint).config(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// The default tool set sent with every request.
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.snapshot()
    }

    /// Appends a message without contacting the endpoint.
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.conversation.append(Message::new(role, content));
    }

    /// Sends a user message with the default tool set.
    pub async fn chat(&mut self, content: impl Into<String>) -> Result<String, ClientError> {
        self.send_message(Role::User, content, SendOptions::default()).await
    }

    /// Appends `content` as a `role` message and runs the tool-call loop
    /// until the model answers in plain text.
    pub async fn send_message(
        &mut self,
        role: Role,
        content: impl Into<String>,
        options: SendOptions<'_>,
    ) -> Result<String, ClientError> {
        self.run_turn(Some(Message::new(role, content)), options).await
    }

    /// Runs the tool-call loop on the current history without adding a
    /// message first.
    pub async fn complete(&mut self, options: SendOptions<'_>) -> Result<String, ClientError> {
        self.run_turn(None, options).await
    }

    async fn run_turn(
        &mut self,
        opening: Option<Message>,
        options: SendOptions<'_>,
    ) -> Result<String, ClientError> {
        let active = options.functions.unwrap_or(&self.functions);

        if let Some(name) = options.force_function {
            if !active.contains(name) {
                return Err(ClientError::ForcedFunctionNotFound { name: name.to_owned() });
            }
        }

        let tools = active.descriptors();
        let mut staged: Vec<Message> = opening.into_iter().collect();
        let outcome = self
            .drive(active, &tools, options.force_function, &mut staged)
            .await;

        self.conversation.extend(staged);
        outcome
    }

    async fn drive(
        &self,
        active: &FunctionRegistry,
        tools: &[ToolDescriptor],
        forced: Option<&str>,
        staged: &mut Vec<Message>,
    ) -> Result<String, ClientError> {
        let limit = self.config.max_rounds;

        for round in 1..=limit {
            // Only the first round is forced.
            let tool_choice = match round {
                1 => forced.map(ToolChoice::function),
                _ => None,
            };

            let history = self.conversation.snapshot();
            let mut messages = Vec::with_capacity(history.len() + staged.len());
            messages.extend_from_slice(history);
            messages.extend(staged.iter().cloned());

            debug!(
                round,
                messages = messages.len(),
                tools = tools.len(),
                forced = tool_choice.as_ref().map(|c| c.function.name.as_str()),
                "sending chat request"
            );

            let request = ChatRequest {
                model: self.config.model.clone(),
                messages,
                tools: tools.to_vec(),
                tool_choice,
            };
            let reply = self.endpoint.send_chat(request).await?.message;

            if reply.role != Role::Assistant {
                return Err(RemoteError::InvalidResponse(format!(
                    "expected an assistant message, got role '{}'",
                    reply.role
                ))
                .into());
            }

            if !reply.requests_tools() {
                let text = reply.content.clone().ok_or(RemoteError::EmptyResponse)?;
                debug!(round, "received final answer");
                staged.push(reply);
                return Ok(text);
            }

            let calls = reply.tool_calls.clone();
            debug!(round, calls = calls.len(), "model requested tool calls");
            staged.push(reply);
            staged.extend(dispatch_all(&calls, active, self.config.parallel_tool_calls).await);
        }

        warn!(limit, "tool-call loop hit the round limit");
        Err(ClientError::LoopLimitExceeded { limit })
    }
}

// ============================================================================
// BUILDER
// ============================================================================

pub struct FunctionClientBuilder<E> {
    endpoint: E,
    config: ClientConfig,
    functions: FunctionRegistry,
    messages: Vec<Message>,
}

impl<E: ChatEndpoint> FunctionClientBuilder<E> {
    pub fn new(endpoint: E) -> Self {
        Self {
            endpoint,
            config: ClientConfig::default(),
            functions: FunctionRegistry::new(),
            messages: Vec::new(),
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.config.max_rounds = max_rounds;
        self
    }

    pub fn parallel_tool_calls(mut self, parallel: bool) -> Self {
        self.config.parallel_tool_calls = parallel;
        self
    }

    /// Default tool set for every request.
    pub fn functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.messages.push(Message::system(prompt));
        self
    }

    /// Seeds the conversation with existing history.
    pub fn messages<I>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = Message>,
    {
        self.messages.extend(messages);
        self
    }

    pub fn build(self) -> Result<FunctionClient<E>, ClientError> {
        self.config.validate()?;
        Ok(FunctionClient {
            endpoint: self.endpoint,
            config: self.config,
            functions: self.functions,
            conversation: Conversation::with_messages(self.messages),
        })
    }
}
