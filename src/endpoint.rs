//! The seam between the conversation loop and a chat-completion API.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use fnclient_core::{ToolDescriptor, ToolKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::{Message, ToolCallRequest};

/// Failures talking to the chat endpoint. Never retried by the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("chat endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid chat response: {0}")]
    InvalidResponse(String),

    #[error("assistant response has neither content nor tool calls")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolChoiceFunction {
    pub name: String,
}

/// Directive requiring the model to call one specific tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolChoice {
    #[serde(rename = "type")]
    pub kind: ToolKind,
    pub function: ToolChoiceFunction,
}

impl ToolChoice {
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            kind: ToolKind::Function,
            function: ToolChoiceFunction { name: name.into() },
        }
    }
}

/// One round's request: `{model, messages, tools?, tool_choice?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

impl ChatRequest {
    pub fn forced_function(&self) -> Option<&str> {
        self.tool_choice.as_ref().map(|choice| choice.function.name.as_str())
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(ToolDescriptor::name).collect()
    }
}

/// The assistant message an endpoint answered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: Message,
}

impl ChatResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(content),
        }
    }

    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            message: Message::assistant_tool_calls(None, calls),
        }
    }
}

impl From<Message> for ChatResponse {
    fn from(message: Message) -> Self {
        Self { message }
    }
}

#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatResponse, RemoteError>;
}

#[async_trait]
impl<E: ChatEndpoint + ?Sized> ChatEndpoint for Arc<E> {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatResponse, RemoteError> {
        (**self).send_chat(request).await
    }
}

#[async_trait]
impl<E: ChatEndpoint + ?Sized> ChatEndpoint for Box<E> {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatResponse, RemoteError> {
        (**self).send_chat(request).await
    }
}

// ============================================================================
// SCRIPTED ENDPOINT
// ============================================================================

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Result<ChatResponse, RemoteError>>,
    requests: Vec<ChatRequest>,
}

/// Offline endpoint that answers from a queue of canned replies and records
/// every request it receives.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEndpoint {
    script: Arc<Mutex<Script>>,
}

impl ScriptedEndpoint {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = ChatResponse>,
    {
        let endpoint = Self::default();
        for reply in replies {
            endpoint.push(reply);
        }
        endpoint
    }

    pub fn push(&self, reply: ChatResponse) -> &Self {
        self.lock().replies.push_back(Ok(reply));
        self
    }

    pub fn push_error(&self, error: RemoteError) -> &Self {
        self.lock().replies.push_back(Err(error));
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.lock().requests.clone()
    }

    pub fn remaining(&self) -> usize {
        self.lock().replies.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ChatEndpoint for ScriptedEndpoint {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatResponse, RemoteError> {
        let mut script = self.lock();
        script.requests.push(request);
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::InvalidResponse("no scripted replies left".into())))
    }
}
