//! Google Gemini `generateContent` provider.
//!
//! Gemini has no call ids of its own, so calls get `"{name}-{index}"` ids and
//! the name is recovered from the id when results are sent back.

use super::{http_client, parse_arguments, send_json, Provider};
use crate::config::ProviderSettings;
use crate::error::ProviderError;
use crate::tools::Tool;
use crate::types::{LlmResponse, ProviderCapabilities, RequestOptions, ToolCall, ToolResults};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const NAME: &str = "gemini";

pub const CAPABILITIES: ProviderCapabilities = ProviderCapabilities {
    supports_tool_calling: true,
    supports_multiple_tools: true,
    supports_streaming: false,
    supports_vision: true,
    max_tokens_limit: Some(32768),
};

pub const DEFAULT_MODEL: &str = "gemini-2.0-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// How the model may use the declared functions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FunctionCallingMode {
    #[default]
    Auto,
    Any,
    None,
}

impl FunctionCallingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Any => "ANY",
            Self::None => "NONE",
        }
    }
}

impl fmt::Display for FunctionCallingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunctionCallingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AUTO" => Ok(Self::Auto),
            "ANY" => Ok(Self::Any),
            "NONE" => Ok(Self::None),
            other => bail!("Invalid function calling mode: {other} (expected AUTO, ANY or NONE)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub function_calling_mode: FunctionCallingMode,
    /// Base generation config, merged under per-request `generation_config`.
    pub generation_config: Map<String, Value>,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            function_calling_mode: FunctionCallingMode::default(),
            generation_config: Map::new(),
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout_secs: crate::config::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let api_key = settings
            .resolve_api_key(API_KEY_ENV)
            .with_context(|| format!("Gemini API key not set (set {API_KEY_ENV} or api_key)"))?;
        let mut config = Self::new(api_key);
        if let Some(model) = &settings.model {
            config.model = model.clone();
        }
        if let Some(base_url) = &settings.base_url {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(mode) = &settings.function_calling_mode {
            config.function_calling_mode = mode.parse()?;
        }
        if let Some(Value::Object(gen)) = settings.options.get("generation_config") {
            config.generation_config = gen.clone();
        }
        config.request_timeout_secs = settings.timeout_secs();
        Ok(config)
    }
}

pub struct GeminiProvider {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = http_client(config.request_timeout_secs)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn build_body(
        &self,
        prompt: &str,
        tools: &[Tool],
        tool_results: Option<&ToolResults>,
        options: &RequestOptions,
    ) -> Value {
        let mut body = Map::new();
        body.insert("contents".into(), build_contents(prompt, tool_results));

        if !tools.is_empty() {
            body.insert("tools".into(), self.format_tools_for_provider(tools));
            body.insert(
                "toolConfig".into(),
                json!({
                    "functionCallingConfig": { "mode": self.config.function_calling_mode.as_str() }
                }),
            );
        }

        let generation = generation_config(&self.config.generation_config, options);
        if !generation.is_empty() {
            body.insert("generationConfig".into(), Value::Object(generation));
        }

        Value::Object(body)
    }
}

/// Tool name encoded in a `"{name}-{index}"` result key, for results stored
/// without a tool name. Keys without a numeric suffix are taken as the name.
pub fn function_name_from_key(key: &str) -> &str {
    match key.rsplit_once('-') {
        Some((name, idx))
            if !name.is_empty() && !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()) =>
        {
            name
        }
        _ => key,
    }
}

fn build_contents(prompt: &str, tool_results: Option<&ToolResults>) -> Value {
    let mut contents = vec![json!({ "role": "user", "parts": [{ "text": prompt }] })];

    let Some(results) = tool_results else {
        return Value::Array(contents);
    };

    for (key, result) in results {
        let name = results
            .tool_name(key)
            .unwrap_or_else(|| function_name_from_key(key));
        let response = match result {
            Value::Object(_) => result.clone(),
            other => json!({ "result": other }),
        };
        contents.push(json!({
            "role": "model",
            "parts": [{ "functionCall": { "name": name, "args": {} } }]
        }));
        contents.push(json!({
            "role": "user",
            "parts": [{ "functionResponse": { "name": name, "response": response } }]
        }));
    }

    Value::Array(contents)
}

/// Base config, then common option keys, then per-request `generation_config`.
fn generation_config(base: &Map<String, Value>, options: &RequestOptions) -> Map<String, Value> {
    let mut merged = base.clone();
    for (option, field) in [
        ("temperature", "temperature"),
        ("max_tokens", "maxOutputTokens"),
        ("top_p", "topP"),
    ] {
        if let Some(value) = options.get(option) {
            merged.insert(field.into(), value.clone());
        }
    }
    if let Some(Value::Object(extra)) = options.get("generation_config") {
        for (k, v) in extra {
            merged.insert(k.clone(), v.clone());
        }
    }
    merged
}

fn declaration(tool: &Tool) -> Value {
    let schema = tool.to_dict();
    let mut properties = schema["parameters"]["properties"]
        .as_object()
        .cloned()
        .unwrap_or_default();

    // generateContent rejects `default` inside parameter schemas.
    for prop in properties.values_mut() {
        if let Value::Object(p) = prop {
            p.remove("default");
        }
    }

    let mut parameters = Map::new();
    parameters.insert("type".into(), json!("object"));
    parameters.insert("properties".into(), Value::Object(properties));
    if let Some(required) = schema["parameters"].get("required") {
        parameters.insert("required".into(), required.clone());
    }

    json!({
        "name": tool.name(),
        "description": tool.description(),
        "parameters": parameters,
    })
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn generate(
        &self,
        prompt: &str,
        tools: &[Tool],
        tool_results: Option<&ToolResults>,
        options: &RequestOptions,
    ) -> Result<LlmResponse, ProviderError> {
        let body = self.build_body(prompt, tools, tool_results, options);
        let request = self
            .http
            .post(format!(
                "{}/models/{}:generateContent",
                self.config.base_url, self.config.model
            ))
            .header("x-goog-api-key", &self.config.api_key);

        let raw = send_json(NAME, request, &body).await?;

        let text: String = candidate_parts(&raw)
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();

        Ok(LlmResponse {
            content: (!text.is_empty()).then_some(text),
            tool_calls: self.parse_tool_calls(&raw),
            truncated: false,
        })
    }

    fn format_tools_for_provider(&self, tools: &[Tool]) -> Value {
        let declarations: Vec<Value> = tools.iter().map(declaration).collect();
        json!([{ "functionDeclarations": declarations }])
    }

    fn parse_tool_calls(&self, raw_response: &Value) -> Vec<ToolCall> {
        let mut calls = Vec::new();
        let function_calls = candidate_parts(raw_response)
            .iter()
            .filter_map(|p| p.get("functionCall"));

        for (idx, call) in function_calls.enumerate() {
            let Some(name) = call.get("name").and_then(Value::as_str) else {
                warn!("gemini: skipping functionCall without a name");
                continue;
            };
            let arguments = parse_arguments(NAME, name, call.get("args"));
            calls.push(ToolCall::new(name, arguments).with_call_id(format!("{name}-{idx}")));
        }
        calls
    }
}

fn candidate_parts(raw: &Value) -> &[Value] {
    raw.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
