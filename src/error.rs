//! Error kinds surfaced by the bridge, adapters, providers and tools.

use thiserror::Error;

/// Failure invoking a single tool.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool '{name}' has no associated function")]
    Unbound { name: String },

    #[error("{0}")]
    Failed(#[source] anyhow::Error),
}

/// Uniform error for any vendor-side failure (transport, status, decode).
#[derive(Error, Debug)]
#[error("{provider} API request failed: {source}")]
pub struct ProviderError {
    pub provider: String,
    #[source]
    pub source: anyhow::Error,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            provider: provider.into(),
            source: source.into(),
        }
    }

    pub fn msg(provider: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::new(provider, anyhow::anyhow!("{message}"))
    }
}

/// Errors returned to callers of the bridge and adapter entry points.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("max_tool_calls must be at least 1 (got {0})")]
    InvalidMaxToolCalls(usize),

    #[error("Tool with name '{0}' is already registered")]
    DuplicateTool(String),

    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    #[error("Expected tool or tool name, got {0}")]
    InvalidToolReference(String),

    #[error("Adapter for provider '{0}' is already registered")]
    DuplicateAdapter(String),

    #[error("No adapter registered for provider '{0}'")]
    UnknownAdapter(String),

    #[error("Provider '{0}' is registered as an adapter only; use the adapter strategy")]
    AdapterOnly(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(#[source] ProviderError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Adapter worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("execute_sync called from inside a running async runtime; use execute().await")]
    NestedRuntime,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
