//! OpenAI chat-completions provider.

use super::{chat_completions, http_client, send_json, Provider};
use crate::config::ProviderSettings;
use crate::error::ProviderError;
use crate::tools::Tool;
use crate::types::{LlmResponse, ProviderCapabilities, RequestOptions, ToolCall, ToolResults};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

pub const NAME: &str = "openai";

pub const CAPABILITIES: ProviderCapabilities = ProviderCapabilities {
    supports_tool_calling: true,
    supports_multiple_tools: true,
    supports_streaming: false,
    supports_vision: true,
    max_tokens_limit: Some(8192),
};

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub organization: Option<String>,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            organization: None,
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout_secs: crate::config::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let api_key = settings
            .resolve_api_key(API_KEY_ENV)
            .with_context(|| format!("OpenAI API key not set (set {API_KEY_ENV} or api_key)"))?;
        let mut config = Self::new(api_key);
        if let Some(model) = &settings.model {
            config.model = model.clone();
        }
        if let Some(base_url) = &settings.base_url {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        config.organization = settings.organization.clone();
        config.request_timeout_secs = settings.timeout_secs();
        Ok(config)
    }
}

/// Talks to `{base_url}/chat/completions` with bearer auth.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    config: OpenAiConfig,
    http: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let http = http_client(config.request_timeout_secs)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
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
        let body =
            chat_completions::build_body(&self.config.model, prompt, tools, tool_results, options);

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key);
        if let Some(org) = &self.config.organization {
            request = request.header("OpenAI-Organization", org);
        }

        let raw = send_json(NAME, request, &body).await?;
        Ok(chat_completions::parse_completion(NAME, &raw))
    }

    fn format_tools_for_provider(&self, tools: &[Tool]) -> Value {
        chat_completions::format_tools(tools)
    }

    fn parse_tool_calls(&self, raw_response: &Value) -> Vec<ToolCall> {
        chat_completions::parse_tool_calls(NAME, raw_response)
    }
}
