//! Expose plain Rust functions to a chat model's function calling.
//!
//! Annotate functions with [`tool`], collect them into a
//! [`FunctionRegistry`] and hand it to a [`FunctionClient`]. The client sends
//! the conversation to a [`ChatEndpoint`], runs whatever tool calls the model
//! asks for and returns once the model answers in plain text.

extern crate self as fnclient;

pub mod client;
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod message;
pub mod prelude;

pub use client::{FunctionClient, FunctionClientBuilder, SendOptions};
pub use config::ClientConfig;
pub use conversation::Conversation;
pub use dispatch::{dispatch, dispatch_all};
pub use endpoint::{
    ChatEndpoint, ChatRequest, ChatResponse, RemoteError, ScriptedEndpoint, ToolChoice,
};
pub use error::ClientError;
pub use message::{FunctionCall, Message, Role, ToolCallRequest};

pub use fnclient_core::{
    ArgumentError, Arguments, DeclaredType, EnumValue, FunctionDescriptor, FunctionRegistry,
    FunctionSpec, IntoToolOutput, Json, JsonType, ParamSpec, ParameterDescriptor, ParsedDoc,
    ToolDescriptor, ToolError, ToolKind, ToolParam, ToolRegistration, TypeFragment,
    build_descriptor, map_type, parse_doc,
};
pub use fnclient_macros::{ToolEnum, tool};

#[doc(hidden)]
pub use fnclient_core::__private;

/// Every `#[tool]` function linked into the binary.
pub fn collect_tools() -> Result<FunctionRegistry, ToolError> {
    FunctionRegistry::collect_tools()
}
