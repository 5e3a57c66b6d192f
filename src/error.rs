use fnclient_core::ToolError;
use thiserror::Error;

use crate::endpoint::RemoteError;

/// Errors returned to the caller of a conversation operation.
///
/// Tool-level failures during a turn are not in here: they are reported to
/// the model as tool replies.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("tool-call loop exceeded {limit} rounds without a final answer")]
    LoopLimitExceeded { limit: usize },

    #[error("forced function '{name}' is not in the active function set")]
    ForcedFunctionNotFound { name: String },

    /// Registering a function failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            ClientError::LoopLimitExceeded { limit: 3 }.to_string(),
            "tool-call loop exceeded 3 rounds without a final answer"
        );
        let remote: ClientError = RemoteError::EmptyResponse.into();
        assert_eq!(remote.to_string(), RemoteError::EmptyResponse.to_string());
        let tool: ClientError = ToolError::AlreadyRegistered { name: "f".into() }.into();
        assert!(matches!(tool, ClientError::Tool(_)));
    }
}
