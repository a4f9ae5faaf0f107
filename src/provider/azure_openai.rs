//! Azure OpenAI deployments. Same wire format as OpenAI, different routing
//! and auth.

use super::{chat_completions, http_client, send_json, Provider};
use crate::config::ProviderSettings;
use crate::error::ProviderError;
use crate::tools::Tool;
use crate::types::{LlmResponse, ProviderCapabilities, RequestOptions, ToolCall, ToolResults};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

pub const NAME: &str = "azure_openai";

pub const CAPABILITIES: ProviderCapabilities = ProviderCapabilities {
    supports_tool_calling: true,
    supports_multiple_tools: true,
    supports_streaming: false,
    supports_vision: true,
    max_tokens_limit: Some(4096),
};

pub const DEFAULT_API_VERSION: &str = "2023-12-01-preview";
pub const API_KEY_ENV: &str = "AZURE_OPENAI_API_KEY";
pub const ENDPOINT_ENV: &str = "AZURE_OPENAI_ENDPOINT";
pub const DEPLOYMENT_ENV: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";

#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    pub api_key: String,
    pub endpoint: String,
    pub deployment_name: String,
    pub api_version: String,
    pub request_timeout_secs: u64,
}

impl AzureOpenAiConfig {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        deployment_name: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            deployment_name: deployment_name.into(),
            api_version: DEFAULT_API_VERSION.into(),
            request_timeout_secs: crate::config::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let api_key = settings
            .resolve_api_key(API_KEY_ENV)
            .with_context(|| format!("Azure OpenAI API key not set (set {API_KEY_ENV} or api_key)"))?;
        let endpoint = settings
            .endpoint
            .clone()
            .or_else(|| std::env::var(ENDPOINT_ENV).ok())
            .with_context(|| format!("Azure OpenAI endpoint not set (set {ENDPOINT_ENV} or endpoint)"))?;
        let deployment = settings
            .deployment_name
            .clone()
            .or_else(|| std::env::var(DEPLOYMENT_ENV).ok())
            .with_context(|| {
                format!("Azure OpenAI deployment not set (set {DEPLOYMENT_ENV} or deployment_name)")
            })?;

        let mut config = Self::new(api_key, endpoint, deployment);
        if let Some(version) = &settings.api_version {
            config.api_version = version.clone();
        }
        config.request_timeout_secs = settings.timeout_secs();
        Ok(config)
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment_name, self.api_version
        )
    }
}

#[derive(Debug, Clone)]
pub struct AzureOpenAiProvider {
    config: AzureOpenAiConfig,
    http: reqwest::Client,
}

impl AzureOpenAiProvider {
    pub fn new(config: AzureOpenAiConfig) -> Result<Self> {
        let http = http_client(config.request_timeout_secs)?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &AzureOpenAiConfig {
        &self.config
    }
}

#[async_trait]
impl Provider for AzureOpenAiProvider {
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
        // Azure routes by deployment; the model field just echoes it.
        let body = chat_completions::build_body(
            &self.config.deployment_name,
            prompt,
            tools,
            tool_results,
            options,
        );

        let request = self
            .http
            .post(self.config.completions_url())
            .header("api-key", &self.config.api_key);

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
