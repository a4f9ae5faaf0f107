//! Shared types passed between tools, providers, adapters and the bridge.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::{btree_map, BTreeMap};
use std::ops::Index;

/// Default cap on tool calls (adapter path) or rounds (legacy path).
pub const DEFAULT_MAX_TOOL_CALLS: usize = 10;

/// Marker placed in a tool call's arguments when the vendor sent unparseable JSON.
pub const INVALID_ARGUMENTS_MARKER: &str = "Invalid JSON in arguments";

/// Named arguments for a tool invocation.
pub type Arguments = Map<String, Value>;

/// Open-ended request options (temperature, max_tokens, vendor extras).
///
/// Threaded through every layer unmodified; each provider picks the keys it
/// understands.
pub type RequestOptions = Map<String, Value>;


// ---------------------------------------------------------------------------
// Tool calls and responses
// ---------------------------------------------------------------------------

/// A tool call request parsed from model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Arguments,
    /// Vendor correlation token. Absent when the vendor has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            call_id: None,
        }
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }

    /// Key under which this call's result is stored.
    pub fn result_key(&self) -> &str {
        self.call_id.as_deref().unwrap_or(&self.tool_name)
    }
}

/// Normalized response every provider produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// Set when an orchestration loop stopped with tool work left undone.
    #[serde(default)]
    pub truncated: bool,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
            truncated: false,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tool results
// ---------------------------------------------------------------------------

/// Tool results for one orchestration run, keyed by call id or tool name.
///
/// Each entry also remembers which tool produced it, so providers can
/// rebuild the call turn their vendor expects in front of the result.
/// Serializes as the plain key → value map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolResults {
    values: BTreeMap<String, Value>,
    tool_names: BTreeMap<String, String>,
}

impl ToolResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key` with no tool name attached.
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.tool_names.remove(&key);
        self.values.insert(key, value)
    }

    /// Store the result of `call` under its result key.
    pub fn record(&mut self, call: &ToolCall, value: Value) {
        let key = call.result_key().to_string();
        self.tool_names.insert(key.clone(), call.tool_name.clone());
        self.values.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Name of the tool whose result is stored under `key`, if recorded.
    pub fn tool_name(&self, key: &str) -> Option<&str> {
        self.tool_names.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> IntoIterator for &'a ToolResults {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl Index<&str> for ToolResults {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        &self.values[key]
    }
}

impl Serialize for ToolResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Descriptive metadata about what an adapter's backend supports.
///
/// Not enforced by the orchestration loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub supports_tool_calling: bool,
    pub supports_multiple_tools: bool,
    pub supports_streaming: bool,
    pub supports_vision: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens_limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Tool outcomes
// ---------------------------------------------------------------------------

/// Outcome of processing one tool call inside the adapter loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(Value),
    Failure(String),
}

impl ToolOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Wire shape fed back to the model: `{result, success}` or `{error, success}`.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Success(result) => json!({ "result": result, "success": true }),
            Self::Failure(error) => json!({ "error": error, "success": false }),
        }
    }
}

impl From<ToolOutcome> for Value {
    fn from(outcome: ToolOutcome) -> Self {
        outcome.to_value()
    }
}
