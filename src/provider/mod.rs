//! Vendor generation backends behind a uniform [`Provider`] interface.
//!
//! Every provider formats tools from `Tool::to_dict`, serializes prior tool
//! results into its own conversation shape and normalizes the vendor reply
//! into [`LlmResponse`]. Any vendor failure surfaces as [`ProviderError`].

pub mod azure_openai;
pub mod chat_completions;
pub mod gemini;
pub mod openai;

pub use azure_openai::{AzureOpenAiConfig, AzureOpenAiProvider};
pub use gemini::{FunctionCallingMode, GeminiConfig, GeminiProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};

use crate::config::ProviderSettings;
use crate::error::ProviderError;
use crate::tools::Tool;
use crate::types::{
    Arguments, LlmResponse, ProviderCapabilities, RequestOptions, ToolCall, ToolResults,
    INVALID_ARGUMENTS_MARKER,
};
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// A vendor's generation endpoint.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short vendor key, e.g. `openai`.
    fn name(&self) -> &str;

    /// One round-trip to the vendor. An empty `tools` slice offers no tools.
    async fn generate(
        &self,
        prompt: &str,
        tools: &[Tool],
        tool_results: Option<&ToolResults>,
        options: &RequestOptions,
    ) -> Result<LlmResponse, ProviderError>;

    /// Vendor-specific tool list derived from `Tool::to_dict`. No side effects.
    fn format_tools_for_provider(&self, tools: &[Tool]) -> Value;

    /// Tool calls found in a raw vendor reply, in vendor order.
    ///
    /// Calls whose arguments do not parse are kept, with an error marker in
    /// place of the arguments.
    fn parse_tool_calls(&self, raw_response: &Value) -> Vec<ToolCall>;

    /// Blocking form of [`generate`](Self::generate).
    ///
    /// Runs on the ambient runtime when called from a blocking worker
    /// (`spawn_blocking`), or on a private single-thread runtime when no
    /// runtime exists. Calling it from an async task is a programming error.
    fn generate_blocking(
        &self,
        prompt: &str,
        tools: &[Tool],
        tool_results: Option<&ToolResults>,
        options: &RequestOptions,
    ) -> Result<LlmResponse, ProviderError> {
        let fut = self.generate(prompt, tools, tool_results, options);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle.block_on(fut),
            Err(_) => tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| ProviderError::new(self.name(), e))?
                .block_on(fut),
        }
    }
}

/// Normalize a vendor's tool-call arguments into a named-argument map.
///
/// Missing or empty arguments become an empty map. Anything that is not a
/// JSON object (or a string holding one) becomes the invalid-arguments marker.
pub fn parse_arguments(provider: &str, tool_name: &str, raw: Option<&Value>) -> Arguments {
    let parsed = match raw {
        None | Some(Value::Null) => return Arguments::new(),
        Some(Value::Object(map)) => return map.clone(),
        Some(Value::String(s)) if s.trim().is_empty() => return Arguments::new(),
        Some(Value::String(s)) => serde_json::from_str::<Value>(s).ok(),
        Some(_) => None,
    };
    match parsed {
        Some(Value::Object(map)) => map,
        _ => {
            warn!(
                "{}: invalid JSON in arguments for tool call '{}'",
                provider, tool_name
            );
            invalid_arguments()
        }
    }
}

fn invalid_arguments() -> Arguments {
    let mut marker = Arguments::new();
    marker.insert("error".into(), Value::String(INVALID_ARGUMENTS_MARKER.into()));
    marker
}

/// Send a JSON request and decode a JSON reply, mapping every failure to
/// [`ProviderError`].
pub(crate) async fn send_json(
    provider: &str,
    request: reqwest::RequestBuilder,
    body: &Value,
) -> Result<Value, ProviderError> {
    debug!("{} request: {}", provider, body);

    let resp = request.json(body).send().await.map_err(|e| {
        error!("Error calling {}: {}", provider, e);
        ProviderError::new(provider, e)
    })?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        error!("{} returned {}: {}", provider, status, text);
        return Err(ProviderError::msg(
            provider,
            format!("status {}: {}", status, text),
        ));
    }

    resp.json::<Value>().await.map_err(|e| {
        ProviderError::new(
            provider,
            anyhow::Error::new(e).context("Failed to parse response body"),
        )
    })
}

/// Build the reqwest client every provider uses.
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

/// Capability metadata for a bundled vendor.
pub fn builtin_capabilities(name: &str) -> Option<ProviderCapabilities> {
    match name {
        openai::NAME => Some(openai::CAPABILITIES),
        azure_openai::NAME => Some(azure_openai::CAPABILITIES),
        gemini::NAME => Some(gemini::CAPABILITIES),
        _ => None,
    }
}

/// Construct a provider by vendor key from config settings.
pub fn build_provider(name: &str, settings: &ProviderSettings) -> Result<Arc<dyn Provider>> {
    let provider: Arc<dyn Provider> = match name {
        openai::NAME => Arc::new(OpenAiProvider::new(OpenAiConfig::from_settings(settings)?)?),
        azure_openai::NAME => Arc::new(AzureOpenAiProvider::new(
            AzureOpenAiConfig::from_settings(settings)?,
        )?),
        gemini::NAME => Arc::new(GeminiProvider::new(GeminiConfig::from_settings(settings)?)?),
        other => bail!(
            "Unknown provider: {other}. Supported: {}, {}, {}",
            openai::NAME,
            azure_openai::NAME,
            gemini::NAME
        ),
    };
    Ok(provider)
}
