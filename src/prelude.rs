//! Convenient re-exports for common usage patterns.
//!
//! ```rust
//! use fnclient::prelude::*;
//! ```

// Client and conversation
pub use crate::{
    ChatEndpoint, ChatRequest, ChatResponse, ClientConfig, ClientError, FunctionClient,
    Message, RemoteError, Role, SendOptions, ToolCallRequest,
};

// Tools
pub use crate::{FunctionRegistry, FunctionSpec, ParamSpec, ToolError, collect_tools};

// Macros
pub use crate::{ToolEnum, tool};

// Commonly used external types
pub use serde_json::{Value, json};
