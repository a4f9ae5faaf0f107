//! `ToolBridge`: the entry point that owns the tool registry and runs a
//! prompt through either an adapter or a raw provider.

pub mod loop_;

use crate::adapter::DynAdapter;
use crate::config::Strategy;
use crate::error::{BridgeError, Result};
use crate::provider::Provider;
use crate::tools::Tool;
use crate::types::{LlmResponse, RequestOptions};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// What the bridge drives. Each variant carries its own iteration policy.
#[derive(Clone)]
pub enum Backend {
    /// Two-round `execute_with_tools`, run on a blocking worker.
    Adapter(Arc<dyn DynAdapter>),
    /// Multi-round loop, capped by rounds rather than calls.
    Provider(Arc<dyn Provider>),
}

impl Backend {
    pub fn name(&self) -> &str {
        match self {
            Self::Adapter(a) => a.adapter_name(),
            Self::Provider(p) => p.name(),
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Adapter(_) => Strategy::Adapter,
            Self::Provider(_) => Strategy::Provider,
        }
    }
}

/// A tool passed directly or named from the registry.
#[derive(Debug, Clone)]
pub enum ToolRef {
    Tool(Tool),
    Name(String),
}

impl ToolRef {
    /// Accepts only JSON strings (tool names).
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => Ok(Self::Name(name.clone())),
            other => Err(BridgeError::InvalidToolReference(json_type(other).into())),
        }
    }
}

impl From<Tool> for ToolRef {
    fn from(tool: Tool) -> Self {
        Self::Tool(tool)
    }
}

impl From<&str> for ToolRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ToolRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Tool registry plus backend.
///
/// Registration takes `&mut self` and execution `&self`, so tools cannot be
/// added while a run borrowed from this bridge is in flight. Share it behind
/// an `Arc` once setup is done.
#[derive(Clone)]
pub struct ToolBridge {
    backend: Backend,
    tools: Vec<Tool>,
}

impl ToolBridge {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            tools: Vec::new(),
        }
    }

    pub fn with_adapter(adapter: Arc<dyn DynAdapter>) -> Self {
        Self::new(Backend::Adapter(adapter))
    }

    pub fn with_provider(provider: Arc<dyn Provider>) -> Self {
        Self::new(Backend::Provider(provider))
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Registered tools, in registration order.
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn register_tool(&mut self, tool: Tool) -> Result<()> {
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            return Err(BridgeError::DuplicateTool(tool.name().to_string()));
        }
        debug!("Registered tool '{}'", tool.name());
        self.tools.push(tool);
        Ok(())
    }

    /// Registers in order and stops at the first duplicate. Tools registered
    /// before the failure stay registered.
    pub fn register_tools(&mut self, tools: impl IntoIterator<Item = Tool>) -> Result<()> {
        for tool in tools {
            self.register_tool(tool)?;
        }
        Ok(())
    }

    pub fn get_tool(&self, name: &str) -> Result<&Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| BridgeError::ToolNotFound(name.to_string()))
    }

    /// Concrete tools for a run. `None` means every registered tool.
    pub fn resolve_tools(&self, tools: Option<&[ToolRef]>) -> Result<Vec<Tool>> {
        let Some(refs) = tools else {
            return Ok(self.tools.clone());
        };
        refs.iter()
            .map(|r| match r {
                ToolRef::Tool(tool) => Ok(tool.clone()),
                ToolRef::Name(name) => self.get_tool(name).cloned(),
            })
            .collect()
    }

    /// Run `prompt` to completion with the selected tools.
    ///
    /// Adapter runs happen on tokio's blocking pool; provider runs are awaited
    /// in place.
    pub async fn execute(
        &self,
        prompt: &str,
        tools: Option<&[ToolRef]>,
        max_tool_calls: usize,
        options: &RequestOptions,
    ) -> Result<LlmResponse> {
        if max_tool_calls < 1 {
            return Err(BridgeError::InvalidMaxToolCalls(max_tool_calls));
        }
        let resolved = self.resolve_tools(tools)?;

        info!(
            "Executing via {} ({} strategy, {} tools)",
            self.backend.name(),
            self.backend.strategy(),
            resolved.len()
        );

        match &self.backend {
            Backend::Adapter(adapter) => {
                let adapter = Arc::clone(adapter);
                let prompt = prompt.to_string();
                let options = options.clone();
                let response = tokio::task::spawn_blocking(move || {
                    adapter.run_with_tools(&prompt, Some(&resolved), max_tool_calls, &options)
                })
                .await??;
                Ok(response)
            }
            Backend::Provider(provider) => {
                loop_::run_provider_loop(
                    provider.as_ref(),
                    &self.tools,
                    prompt,
                    &resolved,
                    max_tool_calls,
                    options,
                )
                .await
            }
        }
    }

    /// Blocking form of [`execute`](Self::execute) on a private runtime.
    ///
    /// Fails with [`BridgeError::NestedRuntime`] when called from inside a
    /// tokio runtime.
    pub fn execute_sync(
        &self,
        prompt: &str,
        tools: Option<&[ToolRef]>,
        max_tool_calls: usize,
        options: &RequestOptions,
    ) -> Result<LlmResponse> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(BridgeError::NestedRuntime);
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.execute(prompt, tools, max_tool_calls, options))
    }
}
