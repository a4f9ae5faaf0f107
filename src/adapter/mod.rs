//! Adapters wrap a provider with capability metadata and the two-round
//! tool-execution loop.
//!
//! Implementors supply the four request stages; `process_tool_call` and
//! `execute_with_tools` come with the trait and are not meant to be
//! overridden. The loop is synchronous: the bridge runs it on a blocking
//! worker when called from async code.

pub mod registry;

pub use registry::{AdapterFactory, AdapterRegistry, ProviderFactory};

use crate::error::{BridgeError, ProviderError};
use crate::provider::Provider;
use crate::tools::Tool;
use crate::types::{
    LlmResponse, ProviderCapabilities, RequestOptions, ToolCall, ToolOutcome, ToolResults,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Vendor request/response translation plus the shared orchestration loop.
pub trait Adapter: Send + Sync {
    type Request: Send;
    type Response: Send;

    fn name(&self) -> &str;

    fn get_capabilities(&self) -> ProviderCapabilities;

    /// Build a vendor request. No I/O.
    fn prepare_request(
        &self,
        prompt: &str,
        tools: Option<&[Tool]>,
        tool_results: Option<&ToolResults>,
        options: &RequestOptions,
    ) -> Result<Self::Request, ProviderError>;

    /// The only stage allowed to perform I/O.
    fn execute_request(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    fn parse_response(&self, response: Self::Response) -> Result<LlmResponse, ProviderError>;

    /// Run one tool call against `tools`. Never fails: lookup misses and
    /// function errors become failure outcomes.
    fn process_tool_call(&self, call: &ToolCall, tools: &HashMap<String, Tool>) -> ToolOutcome {
        let Some(tool) = tools.get(&call.tool_name) else {
            warn!("{}: model requested unknown tool '{}'", self.name(), call.tool_name);
            return ToolOutcome::failure(format!("Tool '{}' not found", call.tool_name));
        };

        info!("{}: invoking tool '{}'", self.name(), call.tool_name);
        match tool.invoke(&call.arguments) {
            Ok(result) => ToolOutcome::Success(result),
            Err(e) => {
                warn!("{}: tool '{}' failed: {}", self.name(), call.tool_name, e);
                ToolOutcome::failure(e.to_string())
            }
        }
    }

    /// At most two rounds: one offering `tools`, then one carrying the
    /// results of the first `max_tool_calls` calls and no tools.
    fn execute_with_tools(
        &self,
        prompt: &str,
        tools: Option<&[Tool]>,
        max_tool_calls: usize,
        options: &RequestOptions,
    ) -> Result<LlmResponse, BridgeError> {
        if max_tool_calls < 1 {
            return Err(BridgeError::InvalidMaxToolCalls(max_tool_calls));
        }

        let tool_map: HashMap<String, Tool> = tools
            .unwrap_or_default()
            .iter()
            .map(|t| (t.name().to_string(), t.clone()))
            .collect();

        let round = |tools: Option<&[Tool]>,
                     results: Option<&ToolResults>|
         -> Result<LlmResponse, ProviderError> {
            let request = self.prepare_request(prompt, tools, results, options)?;
            let response = self.execute_request(request)?;
            self.parse_response(response)
        };

        debug!("{}: round 1 with {} tools", self.name(), tool_map.len());
        let first = round(tools, None).map_err(BridgeError::ToolExecutionFailed)?;
        if !first.has_tool_calls() {
            return Ok(first);
        }

        let requested = first.tool_calls.len();
        if requested > max_tool_calls {
            warn!(
                "{}: model requested {} tool calls, processing the first {}",
                self.name(),
                requested,
                max_tool_calls
            );
        }

        let mut results = ToolResults::new();
        let mut failed = 0;
        for call in first.tool_calls.iter().take(max_tool_calls) {
            let outcome = self.process_tool_call(call, &tool_map);
            if !outcome.is_success() {
                failed += 1;
            }
            results.record(call, outcome.into());
        }

        debug!(
            "{}: round 2 with {} tool results ({} failed)",
            self.name(),
            results.len(),
            failed
        );
        let mut last = round(None, Some(&results)).map_err(BridgeError::ToolExecutionFailed)?;
        last.truncated = requested > max_tool_calls || last.has_tool_calls();
        Ok(last)
    }
}

/// Object-safe view of an [`Adapter`], for registries and the bridge.
pub trait DynAdapter: Send + Sync {
    fn adapter_name(&self) -> &str;

    fn capabilities(&self) -> ProviderCapabilities;

    fn run_with_tools(
        &self,
        prompt: &str,
        tools: Option<&[Tool]>,
        max_tool_calls: usize,
        options: &RequestOptions,
    ) -> Result<LlmResponse, BridgeError>;
}

impl<A: Adapter> DynAdapter for A {
    fn adapter_name(&self) -> &str {
        Adapter::name(self)
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.get_capabilities()
    }

    fn run_with_tools(
        &self,
        prompt: &str,
        tools: Option<&[Tool]>,
        max_tool_calls: usize,
        options: &RequestOptions,
    ) -> Result<LlmResponse, BridgeError> {
        Adapter::execute_with_tools(self, prompt, tools, max_tool_calls, options)
    }
}

// ---------------------------------------------------------------------------
// Provider-backed adapter
// ---------------------------------------------------------------------------

/// Everything one `Provider::generate` call needs, owned.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub prompt: String,
    pub tools: Vec<Tool>,
    pub tool_results: Option<ToolResults>,
    pub options: RequestOptions,
}

/// Adapter over any [`Provider`]. Responses are already normalized, so
/// `parse_response` passes them through.
#[derive(Clone)]
pub struct ProviderAdapter {
    provider: Arc<dyn Provider>,
    capabilities: ProviderCapabilities,
}

impl ProviderAdapter {
    pub fn new(provider: Arc<dyn Provider>, capabilities: ProviderCapabilities) -> Self {
        Self {
            provider,
            capabilities,
        }
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }
}

impl Adapter for ProviderAdapter {
    type Request = ProviderRequest;
    type Response = LlmResponse;

    fn name(&self) -> &str {
        self.provider.name()
    }

    fn get_capabilities(&self) -> ProviderCapabilities {
        self.capabilities
    }

    fn prepare_request(
        &self,
        prompt: &str,
        tools: Option<&[Tool]>,
        tool_results: Option<&ToolResults>,
        options: &RequestOptions,
    ) -> Result<ProviderRequest, ProviderError> {
        Ok(ProviderRequest {
            prompt: prompt.to_string(),
            tools: tools.map(<[Tool]>::to_vec).unwrap_or_default(),
            tool_results: tool_results.cloned(),
            options: options.clone(),
        })
    }

    fn execute_request(&self, request: ProviderRequest) -> Result<LlmResponse, ProviderError> {
        self.provider.generate_blocking(
            &request.prompt,
            &request.tools,
            request.tool_results.as_ref(),
            &request.options,
        )
    }

    fn parse_response(&self, response: LlmResponse) -> Result<LlmResponse, ProviderError> {
        Ok(response)
    }
}
