#![deny(unsafe_code)]
//! Function introspection for LLM function calling.
//!
//! Derives tool descriptors from typed parameter lists and doc blocks, and
//! keeps the registry of invocable functions the conversation loop dispatches
//! to.

pub mod args;
pub mod doc;
pub mod error;
pub mod output;
pub mod registry;
pub mod schema;
pub mod types;

pub use args::Arguments;
pub use doc::{ParsedDoc, parse_doc};
pub use error::{ArgumentError, ToolError};
pub use output::{IntoToolOutput, Json};
pub use registry::{FunctionRegistry, ToolFunc, ToolRegistration};
pub use schema::{
    FunctionDescriptor, FunctionSpec, ParamSpec, ParameterDescriptor, ParametersSchema,
    SchemaKind, ToolDescriptor, ToolKind, build_descriptor,
};
pub use types::{DeclaredType, EnumValue, JsonType, ToolParam, TypeFragment, map_type};

// Re-exported for code generated by `fnclient_macros`.
#[doc(hidden)]
pub mod __private {
    pub use futures::future::BoxFuture;
    pub use inventory;
    pub use serde_json::Value;
}
