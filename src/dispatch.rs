//! Executing model-requested tool calls.

use fnclient_core::FunctionRegistry;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::message::{Message, ToolCallRequest};

/// Runs one tool call against `registry` and formats the outcome as a tool
/// reply.
///
/// Never fails: an unknown tool, undecodable arguments or an error raised by
/// the function all become the reply's content so the model can react.
pub async fn dispatch(call: &ToolCallRequest, registry: &FunctionRegistry) -> Message {
    let name = call.name();
    info!(tool = name, call_id = %call.id, "dispatching tool call");

    let content = match registry.call_raw(name, call.arguments()).await {
        Ok(output) => {
            debug!(tool = name, call_id = %call.id, bytes = output.len(), "tool call succeeded");
            output
        }
        Err(err) => {
            warn!(tool = name, call_id = %call.id, error = %err, "tool call failed");
            err.to_string()
        }
    };

    Message::tool(call.id.clone(), content)
}

/// Dispatches every call of one turn. Replies are returned in request order
/// whether or not the calls ran concurrently.
pub async fn dispatch_all(
    calls: &[ToolCallRequest],
    registry: &FunctionRegistry,
    parallel: bool,
) -> Vec<Message> {
    if parallel {
        return join_all(calls.iter().map(|call| dispatch(call, registry))).await;
    }

    let mut replies = Vec::with_capacity(calls.len());
    for call in calls {
        replies.push(dispatch(call, registry).await);
    }
    replies
}
