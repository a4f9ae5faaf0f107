//! Callable seam behind a [`Tool`](super::Tool) and its vendor-neutral schema.

use crate::types::Arguments;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Vendor-neutral tool schema, the shape produced by `Tool::to_dict`.
///
/// Vendor formatters depend on these exact field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Function bound to a tool.
///
/// Receives the model's arguments keyed by parameter name. Errors are
/// propagated to the caller of `Tool::invoke`; the orchestration layer turns
/// them into error results.
pub trait ToolFunction: Send + Sync {
    fn call(&self, arguments: &Arguments) -> Result<Value>;
}

impl<F> ToolFunction for F
where
    F: Fn(&Arguments) -> Result<Value> + Send + Sync,
{
    fn call(&self, arguments: &Arguments) -> Result<Value> {
        self(arguments)
    }
}
