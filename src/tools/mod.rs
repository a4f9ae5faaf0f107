pub mod builtin;
pub mod traits;

pub use traits::{ToolDefinition, ToolFunction};

use crate::error::ToolError;
use crate::types::Arguments;
use anyhow::anyhow;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// JSON Schema type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// Typed description of one tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    pub description: String,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn default_required() -> bool {
    true
}

impl ParameterDefinition {
    pub fn new(param_type: ParameterType, description: impl Into<String>) -> Self {
        Self {
            param_type,
            description: description.into(),
            enum_values: None,
            required: true,
            default: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_enum<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Property schema: every field except `required`, nulls omitted.
    fn to_schema(&self) -> Map<String, Value> {
        let mut schema = Map::new();
        schema.insert(
            "type".into(),
            serde_json::to_value(self.param_type).unwrap_or(Value::Null),
        );
        schema.insert("description".into(), Value::String(self.description.clone()));
        if let Some(values) = &self.enum_values {
            schema.insert("enum".into(), Value::Array(values.clone()));
        }
        if let Some(default) = self.default.as_ref().filter(|d| !d.is_null()) {
            schema.insert("default".into(), default.clone());
        }
        schema
    }
}

/// A parameter given either as a typed definition or as a raw schema map.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Definition(ParameterDefinition),
    Schema(Map<String, Value>),
}

impl From<ParameterDefinition> for Parameter {
    fn from(def: ParameterDefinition) -> Self {
        Self::Definition(def)
    }
}

impl From<Map<String, Value>> for Parameter {
    fn from(schema: Map<String, Value>) -> Self {
        Self::Schema(schema)
    }
}

impl Parameter {
    /// Property schema plus whether the parameter lands in `required`.
    fn to_property(&self) -> (Map<String, Value>, bool) {
        match self {
            Self::Definition(def) => (def.to_schema(), def.required),
            Self::Schema(raw) => {
                let schema: Map<String, Value> = raw
                    .iter()
                    .filter(|(k, v)| k.as_str() != "required" && !v.is_null())
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                let required = raw.get("required").map_or(true, is_truthy);
                (schema, required)
            }
        }
    }
}

/// JSON truthiness: `false`, `null`, zero, and empty strings, arrays or
/// objects are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

/// A named, described callable exposed to the model.
///
/// Built once with the `with_*` methods and treated as immutable afterwards.
/// Cloning is cheap; the bound function is shared.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    parameters: Vec<(String, Parameter)>,
    version: String,
    function: Option<Arc<dyn ToolFunction>>,
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("version", &self.version)
            .field("bound", &self.function.is_some())
            .finish()
    }
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            version: "1.0.0".into(),
            function: None,
        }
    }

    /// Add a parameter. A second parameter with the same name replaces the first.
    pub fn with_parameter(mut self, name: impl Into<String>, param: impl Into<Parameter>) -> Self {
        let name = name.into();
        let param = param.into();
        match self.parameters.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = param,
            None => self.parameters.push((name, param)),
        }
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_function<F>(mut self, function: F) -> Self
    where
        F: ToolFunction + 'static,
    {
        self.function = Some(Arc::new(function));
        self
    }

    /// Bind a function taking its arguments as a deserializable struct.
    ///
    /// Argument names map onto the struct's fields; missing or ill-typed
    /// arguments fail the invocation.
    pub fn with_typed_function<A, R, F>(self, function: F) -> Self
    where
        A: DeserializeOwned,
        R: Serialize,
        F: Fn(A) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        let tool_name = self.name.clone();
        self.with_function(move |arguments: &Arguments| -> anyhow::Result<Value> {
            let args: A = serde_json::from_value(Value::Object(arguments.clone()))
                .map_err(|e| anyhow!("Invalid arguments for tool '{tool_name}': {e}"))?;
            let output = function(args)?;
            Ok(serde_json::to_value(output)?)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn parameters(&self) -> &[(String, Parameter)] {
        &self.parameters
    }

    pub fn is_bound(&self) -> bool {
        self.function.is_some()
    }

    /// Vendor-neutral schema. `required` is omitted when no parameter is required.
    pub fn to_definition(&self) -> ToolDefinition {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for (name, param) in &self.parameters {
            let (schema, is_required) = param.to_property();
            properties.insert(name.clone(), Value::Object(schema));
            if is_required {
                required.push(Value::String(name.clone()));
            }
        }

        let mut parameters = Map::new();
        parameters.insert("type".into(), Value::String("object".into()));
        parameters.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            parameters.insert("required".into(), Value::Array(required));
        }

        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: Value::Object(parameters),
        }
    }

    /// [`to_definition`](Self::to_definition) as a JSON object.
    pub fn to_dict(&self) -> Value {
        let def = self.to_definition();
        let mut out = Map::new();
        out.insert("name".into(), Value::String(def.name));
        out.insert("description".into(), Value::String(def.description));
        out.insert("parameters".into(), def.parameters);
        Value::Object(out)
    }

    /// Call the bound function. Errors from the function are returned as-is.
    pub fn invoke(&self, arguments: &Arguments) -> Result<Value, ToolError> {
        let function = self.function.as_ref().ok_or_else(|| ToolError::Unbound {
            name: self.name.clone(),
        })?;
        function.call(arguments).map_err(ToolError::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn number(desc: &str) -> ParameterDefinition {
        ParameterDefinition::new(ParameterType::Number, desc)
    }

    fn args(v: Value) -> Arguments {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn required_lists_only_required_params() {
        let tool = Tool::new("calc", "Adds")
            .with_parameter("a", number("first"))
            .with_parameter("b", number("second").optional().with_default(0));

        let dict = tool.to_dict();
        assert_eq!(dict["parameters"]["type"], "object");
        assert_eq!(dict["parameters"]["required"], json!(["a"]));
        assert_eq!(dict["parameters"]["properties"]["b"]["default"], json!(0));
        assert!(dict["parameters"]["properties"]["a"].get("required").is_none());
    }

    #[test]
    fn all_optional_omits_required_key() {
        let tool = Tool::new("t", "d").with_parameter("x", number("x").optional());
        let dict = tool.to_dict();
        assert!(dict["parameters"].get("required").is_none());

        let empty = Tool::new("noop", "no params").to_dict();
        assert!(empty["parameters"].get("required").is_none());
        assert_eq!(empty["parameters"]["properties"], json!({}));
    }

    #[test]
    fn null_enum_never_emitted() {
        let raw = args(json!({"type": "string", "description": "s", "enum": null}));
        let tool = Tool::new("t", "d")
            .with_parameter("raw", raw)
            .with_parameter("typed", ParameterDefinition::new(ParameterType::String, "s"));

        let props = &tool.to_dict()["parameters"]["properties"];
        assert!(props["raw"].get("enum").is_none());
        assert!(props["typed"].get("enum").is_none());
        assert_eq!(props["raw"]["type"], "string");
    }

    #[test]
    fn enum_values_serialized() {
        let tool = Tool::new("t", "d").with_parameter(
            "op",
            ParameterDefinition::new(ParameterType::String, "op").with_enum(["add", "sub"]),
        );
        assert_eq!(
            tool.to_dict()["parameters"]["properties"]["op"]["enum"],
            json!(["add", "sub"])
        );
    }

    #[test]
    fn raw_schema_required_false_is_optional() {
        let tool = Tool::new("t", "d")
            .with_parameter("a", args(json!({"type": "number"})))
            .with_parameter("b", args(json!({"type": "number", "required": false})));
        assert_eq!(tool.to_dict()["parameters"]["required"], json!(["a"]));
    }

    #[test]
    fn raw_schema_falsy_required_is_optional_and_not_emitted() {
        let tool = Tool::new("t", "d")
            .with_parameter("a", args(json!({"type": "number", "required": true})))
            .with_parameter("b", args(json!({"type": "number", "required": 0})))
            .with_parameter("c", args(json!({"type": "number", "required": ""})))
            .with_parameter("d", args(json!({"type": "number", "required": null})));

        let dict = tool.to_dict();
        assert_eq!(dict["parameters"]["required"], json!(["a"]));
        for name in ["a", "b", "c", "d"] {
            let prop = &dict["parameters"]["properties"][name];
            assert!(prop.get("required").is_none());
            assert_eq!(prop["type"], "number");
        }
    }

    #[test]
    fn parameter_definition_deserializes_with_defaults() {
        let def: ParameterDefinition =
            serde_json::from_value(json!({"type": "integer", "description": "n"})).unwrap();
        assert!(def.required);
        assert_eq!(def.param_type, ParameterType::Integer);
    }

    #[test]
    fn invoke_passes_named_arguments() {
        #[derive(Deserialize)]
        struct Add {
            x: i64,
            y: i64,
        }

        let tool = Tool::new("add", "Adds").with_typed_function(|a: Add| Ok(a.x + a.y));
        let out = tool.invoke(&args(json!({"x": 5, "y": 3}))).unwrap();
        assert_eq!(out, json!(8));

        let err = tool.invoke(&args(json!({"x": 5}))).unwrap_err();
        assert!(err.to_string().contains("Invalid arguments for tool 'add'"));
    }

    #[test]
    fn invoke_unbound_fails() {
        let tool = Tool::new("ghost", "no function");
        let err = tool.invoke(&Arguments::new()).unwrap_err();
        assert!(matches!(err, ToolError::Unbound { .. }));
        assert_eq!(err.to_string(), "Tool 'ghost' has no associated function");
    }

    #[test]
    fn invoke_propagates_function_error() {
        let tool = Tool::new("fails", "always fails")
            .with_function(|_: &Arguments| -> anyhow::Result<Value> { anyhow::bail!("boom") });
        let err = tool.invoke(&Arguments::new()).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn duplicate_parameter_replaces() {
        let tool = Tool::new("t", "d")
            .with_parameter("a", number("old"))
            .with_parameter("a", number("new"));
        assert_eq!(tool.parameters().len(), 1);
        assert_eq!(tool.to_dict()["parameters"]["properties"]["a"]["description"], "new");
    }
}
