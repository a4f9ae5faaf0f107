//! Toolbridge: provider-agnostic tool calling for LLM backends.
//!
//! Register [`Tool`]s on a [`ToolBridge`], back it with an adapter or a raw
//! provider, and `execute` a prompt: the bridge offers the tools, runs the
//! calls the model makes and feeds the results back until the model answers.

pub mod adapter;
pub mod bridge;
pub mod config;
pub mod error;
pub mod provider;
pub mod tools;
pub mod types;

pub use adapter::{Adapter, AdapterRegistry, DynAdapter, ProviderAdapter, ProviderRequest};
pub use bridge::{Backend, ToolBridge, ToolRef};
pub use config::{BridgeConfig, ProviderSettings, Strategy};
pub use error::{BridgeError, ProviderError, ToolError};
pub use provider::Provider;
pub use tools::{Parameter, ParameterDefinition, ParameterType, Tool};
pub use types::{
    Arguments, LlmResponse, ProviderCapabilities, RequestOptions, ToolCall, ToolOutcome,
    ToolResults, DEFAULT_MAX_TOOL_CALLS,
};
