//! Demo tools shipped with the CLI.

use super::{ParameterDefinition, ParameterType, Tool};
use anyhow::{bail, Result};
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use serde_json::{json, Value};

/// All built-in tools, in registration order.
pub fn builtin_tools() -> Vec<Tool> {
    vec![calculator(), echo(), current_time()]
}

#[derive(Debug, Deserialize)]
struct CalculatorArgs {
    operation: String,
    x: f64,
    y: f64,
}

/// Basic arithmetic on two numbers.
pub fn calculator() -> Tool {
    Tool::new("calculator", "Perform basic arithmetic on two numbers.")
        .with_parameter(
            "operation",
            ParameterDefinition::new(ParameterType::String, "The operation to perform")
                .with_enum(["add", "subtract", "multiply", "divide"]),
        )
        .with_parameter(
            "x",
            ParameterDefinition::new(ParameterType::Number, "First operand"),
        )
        .with_parameter(
            "y",
            ParameterDefinition::new(ParameterType::Number, "Second operand"),
        )
        .with_typed_function(|args: CalculatorArgs| calculate(&args))
}

fn calculate(args: &CalculatorArgs) -> Result<Value> {
    let result = match args.operation.as_str() {
        "add" => args.x + args.y,
        "subtract" => args.x - args.y,
        "multiply" => args.x * args.y,
        "divide" => {
            if args.y == 0.0 {
                bail!("Division by zero");
            }
            args.x / args.y
        }
        other => bail!("Unknown operation: {other}"),
    };
    Ok(json!({
        "operation": args.operation,
        "x": args.x,
        "y": args.y,
        "result": result,
    }))
}

#[derive(Debug, Deserialize)]
struct EchoArgs {
    text: String,
    #[serde(default)]
    uppercase: bool,
}

/// Return the given text, optionally upper-cased.
pub fn echo() -> Tool {
    Tool::new("echo", "Echo text back to the caller.")
        .with_parameter(
            "text",
            ParameterDefinition::new(ParameterType::String, "Text to echo"),
        )
        .with_parameter(
            "uppercase",
            ParameterDefinition::new(ParameterType::Boolean, "Upper-case the text")
                .optional()
                .with_default(false),
        )
        .with_typed_function(|args: EchoArgs| {
            Ok(if args.uppercase {
                args.text.to_uppercase()
            } else {
                args.text
            })
        })
}

#[derive(Debug, Deserialize)]
struct TimeArgs {
    #[serde(default)]
    format: Option<String>,
}

/// Current UTC time, RFC 3339 unless a strftime format is given.
pub fn current_time() -> Tool {
    Tool::new("current_time", "Get the current UTC date and time.")
        .with_parameter(
            "format",
            ParameterDefinition::new(ParameterType::String, "Optional strftime format")
                .optional(),
        )
        .with_typed_function(|args: TimeArgs| format_now(args.format.as_deref()))
}

fn format_now(format: Option<&str>) -> Result<String> {
    let now = chrono::Utc::now();
    match format {
        Some(fmt) => {
            if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
                bail!("Invalid time format: {fmt}");
            }
            Ok(now.format(fmt).to_string())
        }
        None => Ok(now.to_rfc3339()),
    }
}
