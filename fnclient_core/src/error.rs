//! Error types for schema derivation and tool execution.

use std::borrow::Cow;

use thiserror::Error;

/// All the ways registering or calling a tool can fail.
///
/// Registration errors (`UnsupportedType`, `DuplicateParameter`,
/// `AlreadyRegistered`) are fatal to the caller. The call-time errors
/// (`FunctionNotFound`, `Deserialize`, `Invocation`) are meant to be shown to
/// the model as a tool reply rather than propagated.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tried to call a function that was never registered.
    #[error("Function '{name}' not found")]
    FunctionNotFound { name: Cow<'static, str> },

    /// A different function is already registered under this name.
    #[error("Tool function '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// A parameter has no declared type, or one the schema cannot express.
    #[error(
        "Unsupported type for parameter '{parameter}' of function '{function}': {}",
        found.as_deref().unwrap_or("no declared type")
    )]
    UnsupportedType {
        function: String,
        parameter: String,
        found: Option<String>,
    },

    /// Two parameters of the same function share a name.
    #[error("Function '{function}' declares parameter '{parameter}' more than once")]
    DuplicateParameter { function: String, parameter: String },

    /// The model's arguments could not be bound to the function's parameters.
    #[error("Invalid arguments for '{function}': {source}")]
    Deserialize {
        function: String,
        #[source]
        source: ArgumentError,
    },

    /// The function itself failed. The message is the function's own error text.
    #[error("{0}")]
    Invocation(String),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    pub fn not_found(name: impl Into<String>) -> Self {
        ToolError::FunctionNotFound {
            name: Cow::Owned(name.into()),
        }
    }

    /// `true` for errors a model can react to within the conversation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ToolError::FunctionNotFound { .. }
                | ToolError::Deserialize { .. }
                | ToolError::Invocation(_)
        )
    }
}

/// Binding a named argument failed.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// The raw argument text is not a JSON object.
    #[error("arguments are not a JSON object: {0}")]
    Malformed(String),

    #[error("missing required argument '{0}'")]
    Missing(String),

    #[error("unexpected argument '{0}'")]
    Unexpected(String),

    #[error("argument '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

impl ArgumentError {
    pub fn invalid(name: &str, reason: impl ToString) -> Self {
        ArgumentError::Invalid {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_displays_message_verbatim() {
        let err = ToolError::Invocation("disk on fire".into());
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn unsupported_type_names_function_and_parameter() {
        let err = ToolError::UnsupportedType {
            function: "get_weather".into(),
            parameter: "lat".into(),
            found: Some("f64".into()),
        };
        let text = err.to_string();
        assert!(text.contains("get_weather"));
        assert!(text.contains("'lat'"));
        assert!(text.contains("f64"));

        let missing = ToolError::UnsupportedType {
            function: "f".into(),
            parameter: "x".into(),
            found: None,
        };
        assert!(missing.to_string().ends_with("no declared type"));
    }

    #[test]
    fn recoverable_classification() {
        assert!(ToolError::not_found("ghost").is_recoverable());
        assert!(ToolError::Invocation("boom".into()).is_recoverable());
        assert!(
            !ToolError::AlreadyRegistered {
                name: "dup".into()
            }
            .is_recoverable()
        );
    }
}
