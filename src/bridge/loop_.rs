//! Multi-round loop over a raw provider.
//!
//! Each round:
//! 1. Invokes every tool call in the last response
//! 2. Adds the outcomes to the accumulated results
//! 3. Asks the provider again with the results and no tools
//!
//! Stops when a response has no tool calls or after `max_rounds` follow-ups.

use crate::error::BridgeError;
use crate::provider::Provider;
use crate::tools::Tool;
use crate::types::{LlmResponse, RequestOptions, ToolCall, ToolResults};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Run the provider loop. `offered` are the tools sent in the first request;
/// `registry` is searched for tools the model names outside that set.
pub async fn run_provider_loop(
    provider: &dyn Provider,
    registry: &[Tool],
    prompt: &str,
    offered: &[Tool],
    max_rounds: usize,
    options: &RequestOptions,
) -> Result<LlmResponse, BridgeError> {
    info!(
        "{}: starting provider loop ({} tools, max {} rounds)",
        provider.name(),
        offered.len(),
        max_rounds
    );

    let mut response = provider.generate(prompt, offered, None, options).await?;
    let mut results = ToolResults::new();
    let mut round = 0;

    while response.has_tool_calls() && round < max_rounds {
        round += 1;
        info!(
            "{}: round {} with {} tool calls",
            provider.name(),
            round,
            response.tool_calls.len()
        );

        for call in &response.tool_calls {
            let value = invoke(call, offered, registry);
            results.record(call, value);
        }

        debug!("{}: sending {} accumulated results", provider.name(), results.len());
        response = provider.generate(prompt, &[], Some(&results), options).await?;
    }

    if response.has_tool_calls() {
        warn!(
            "{}: round cap {} reached with {} tool calls outstanding",
            provider.name(),
            max_rounds,
            response.tool_calls.len()
        );
        response.truncated = true;
    }

    Ok(response)
}

/// Tool output on success, `{error, success: false}` otherwise.
fn invoke(call: &ToolCall, offered: &[Tool], registry: &[Tool]) -> Value {
    let tool = offered
        .iter()
        .chain(registry)
        .find(|t| t.name() == call.tool_name);

    let Some(tool) = tool else {
        warn!("Model requested unknown tool '{}'", call.tool_name);
        return error_result(format!("Tool '{}' not found", call.tool_name));
    };

    match tool.invoke(&call.arguments) {
        Ok(value) => value,
        Err(e) => {
            warn!("Tool '{}' failed: {}", call.tool_name, e);
            error_result(e.to_string())
        }
    }
}

fn error_result(message: String) -> Value {
    json!({ "error": message, "success": false })
}
