//! OpenAI-compatible chat-completions wire format, shared by the OpenAI and
//! Azure OpenAI providers.

use super::parse_arguments;
use crate::tools::Tool;
use crate::types::{LlmResponse, RequestOptions, ToolCall, ToolResults};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::warn;

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 800;
const DEFAULT_TOP_P: f64 = 1.0;

/// Option keys mapped explicitly; every other key is copied into the body.
const MAPPED_OPTIONS: &[&str] = &["temperature", "max_tokens", "top_p", "tool_choice"];

// -- Request types -----------------------------------------------------------

#[derive(Debug, Serialize)]
struct MessagePayload {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCallPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// An assistant `tool_calls` entry that a `tool` message answers.
#[derive(Debug, Serialize)]
struct ToolCallPayload {
    id: String,
    r#type: &'static str,
    function: FunctionCallPayload,
}

#[derive(Debug, Serialize)]
struct FunctionCallPayload {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ToolPayload {
    r#type: &'static str,
    function: Value,
}

/// `{type: "function", function: <to_dict>}` for each tool.
pub fn format_tools(tools: &[Tool]) -> Value {
    let payloads: Vec<ToolPayload> = tools
        .iter()
        .map(|t| ToolPayload {
            r#type: "function",
            function: t.to_dict(),
        })
        .collect();
    serde_json::to_value(payloads).unwrap_or_else(|_| json!([]))
}

/// The user prompt, then (when there are results) one assistant turn
/// carrying a `tool_calls` entry per result followed by the `tool` messages
/// answering them.
fn build_messages(prompt: &str, tool_results: Option<&ToolResults>) -> Vec<MessagePayload> {
    let mut messages = vec![MessagePayload {
        role: "user",
        content: Some(prompt.to_string()),
        tool_calls: None,
        tool_call_id: None,
    }];

    let Some(results) = tool_results.filter(|r| !r.is_empty()) else {
        return messages;
    };

    let calls = results
        .keys()
        .map(|key| ToolCallPayload {
            id: key.clone(),
            r#type: "function",
            function: FunctionCallPayload {
                name: results.tool_name(key).unwrap_or(key.as_str()).to_string(),
                arguments: "{}".into(),
            },
        })
        .collect();
    messages.push(MessagePayload {
        role: "assistant",
        content: None,
        tool_calls: Some(calls),
        tool_call_id: None,
    });

    for (key, result) in results {
        messages.push(MessagePayload {
            role: "tool",
            content: Some(result.to_string()),
            tool_calls: None,
            tool_call_id: Some(key.clone()),
        });
    }

    messages
}

/// Request body with defaults, tools (when offered) and pass-through options.
pub fn build_body(
    model: &str,
    prompt: &str,
    tools: &[Tool],
    tool_results: Option<&ToolResults>,
    options: &RequestOptions,
) -> Value {
    let mut body = Map::new();
    body.insert("model".into(), Value::String(model.to_string()));
    body.insert(
        "messages".into(),
        serde_json::to_value(build_messages(prompt, tool_results)).unwrap_or_else(|_| json!([])),
    );
    body.insert(
        "temperature".into(),
        options
            .get("temperature")
            .cloned()
            .unwrap_or_else(|| json!(DEFAULT_TEMPERATURE)),
    );
    body.insert(
        "max_tokens".into(),
        options
            .get("max_tokens")
            .cloned()
            .unwrap_or_else(|| json!(DEFAULT_MAX_TOKENS)),
    );
    body.insert(
        "top_p".into(),
        options
            .get("top_p")
            .cloned()
            .unwrap_or_else(|| json!(DEFAULT_TOP_P)),
    );

    if !tools.is_empty() {
        body.insert("tools".into(), format_tools(tools));
        body.insert(
            "tool_choice".into(),
            options
                .get("tool_choice")
                .cloned()
                .unwrap_or_else(|| json!("auto")),
        );
    }

    for (key, value) in options {
        if !MAPPED_OPTIONS.contains(&key.as_str()) {
            body.insert(key.clone(), value.clone());
        }
    }

    Value::Object(body)
}

/// `choices[*].message.tool_calls[*]` of type `function`.
pub fn parse_tool_calls(provider: &str, raw: &Value) -> Vec<ToolCall> {
    let mut calls = Vec::new();
    let Some(choices) = raw.get("choices").and_then(Value::as_array) else {
        return calls;
    };

    for choice in choices {
        let Some(raw_calls) = choice
            .get("message")
            .and_then(|m| m.get("tool_calls"))
            .and_then(Value::as_array)
        else {
            continue;
        };

        for raw_call in raw_calls {
            let kind = raw_call.get("type").and_then(Value::as_str).unwrap_or("function");
            if kind != "function" {
                continue;
            }
            let Some(function) = raw_call.get("function") else {
                continue;
            };
            let name = function
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if name.is_empty() {
                warn!("{}: skipping tool call without a function name", provider);
                continue;
            }

            let arguments = parse_arguments(provider, name, function.get("arguments"));
            let mut call = ToolCall::new(name, arguments);
            call.call_id = raw_call
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string);
            calls.push(call);
        }
    }

    calls
}

/// Content of the first choice plus every parsed tool call.
pub fn parse_completion(provider: &str, raw: &Value) -> LlmResponse {
    let first = raw
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|c| c.first());

    let Some(choice) = first else {
        return LlmResponse::text("No response generated");
    };

    let content = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string);

    LlmResponse {
        content,
        tool_calls: parse_tool_calls(provider, raw),
        truncated: false,
    }
}
