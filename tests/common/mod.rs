//! Scripted in-memory providers and tools shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use toolbridge::error::ProviderError;
use toolbridge::{
    Arguments, LlmResponse, ParameterDefinition, ParameterType, Provider, RequestOptions, Tool,
    ToolCall, ToolResults,
};

/// What one `generate` call received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub tool_names: Vec<String>,
    pub tool_results: Option<ToolResults>,
    pub options: RequestOptions,
}

/// Replays canned responses in order, then repeats `fallback` (or fails).
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<LlmResponse, String>>>,
    fallback: Option<LlmResponse>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Ok).collect()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns `response` on every call.
    pub fn repeating(response: LlmResponse) -> Self {
        Self {
            fallback: Some(response),
            ..Self::new(Vec::new())
        }
    }

    /// Fails on the first call with `message`.
    pub fn failing(message: &str) -> Self {
        let provider = Self::new(Vec::new());
        provider
            .script
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        provider
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        prompt: &str,
        tools: &[Tool],
        tool_results: Option<&ToolResults>,
        options: &RequestOptions,
    ) -> Result<LlmResponse, ProviderError> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            tool_names: tools.iter().map(|t| t.name().to_string()).collect(),
            tool_results: tool_results.cloned(),
            options: options.clone(),
        });

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(ProviderError::msg("scripted", message)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ProviderError::msg("scripted", "script exhausted")),
        }
    }

    fn format_tools_for_provider(&self, tools: &[Tool]) -> Value {
        Value::Array(tools.iter().map(Tool::to_dict).collect())
    }

    fn parse_tool_calls(&self, _raw_response: &Value) -> Vec<ToolCall> {
        Vec::new()
    }
}

#[derive(Deserialize)]
struct AdderArgs {
    a: i64,
    b: i64,
}

/// `adder(a, b) -> a + b`.
pub fn adder() -> Tool {
    Tool::new("adder", "Add two integers")
        .with_parameter("a", ParameterDefinition::new(ParameterType::Integer, "First"))
        .with_parameter("b", ParameterDefinition::new(ParameterType::Integer, "Second"))
        .with_typed_function(|args: AdderArgs| Ok(args.a + args.b))
}

/// A tool whose function always fails with `message`.
pub fn exploding(message: &'static str) -> Tool {
    Tool::new("explode", "Always fails")
        .with_function(move |_: &Arguments| -> anyhow::Result<Value> { anyhow::bail!(message) })
}

pub fn call(name: &str, args: Value) -> ToolCall {
    ToolCall::new(name, args.as_object().cloned().unwrap_or_default())
}

pub fn calls(calls: Vec<ToolCall>) -> LlmResponse {
    LlmResponse::with_tool_calls(calls)
}

pub fn adder_call(id: &str) -> ToolCall {
    call("adder", json!({"a": 1, "b": 2})).with_call_id(id)
}
