//! Toolbridge CLI.
//!
//! Usage:
//!   toolbridge run "What is 6 times 7?"   Run a prompt with the demo tools
//!   toolbridge providers                  List registered adapters
//!   toolbridge tools                      Print demo tool schemas
//!   toolbridge init                       Write a starter config file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info};

use toolbridge::config::{self, BridgeConfig, Strategy};
use toolbridge::tools::builtin::builtin_tools;
use toolbridge::{AdapterRegistry, LlmResponse, RequestOptions, ToolBridge, ToolRef};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "toolbridge")]
#[command(version)]
#[command(about = "Provider-agnostic tool calling for LLM backends")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $TOOLBRIDGE_CONFIG, ./toolbridge.toml, ~/.toolbridge/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a prompt through the bridge with the demo tools.
    Run {
        prompt: String,

        /// Provider name (defaults to the config's default_provider).
        #[arg(long)]
        provider: Option<String>,

        /// Iteration policy: adapter (two rounds) or provider (multi-round).
        #[arg(long)]
        strategy: Option<Strategy>,

        /// Tool-call cap (adapter) or round cap (provider).
        #[arg(long)]
        max_tool_calls: Option<usize>,

        /// Offer only these tools (repeatable). Defaults to all demo tools.
        #[arg(long = "tool")]
        tools: Vec<String>,

        /// Extra request option as KEY=JSON (repeatable).
        #[arg(long = "option", value_name = "KEY=JSON")]
        options: Vec<String>,
    },

    /// List registered adapters and their capabilities.
    Providers,

    /// Print the demo tools' schemas.
    Tools,

    /// Write a starter config file.
    Init {
        /// Destination (defaults to ~/.toolbridge/config.toml).
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dotenv = dotenvy::dotenv().ok();

    let (cfg, config_path) = config::load(cli.config.as_deref())?;

    // Initialize logging
    let level = cli.log_level.clone().unwrap_or_else(|| cfg.log_level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    if let Some(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }
    match &config_path {
        Some(path) => info!("Using config {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(cfg.worker_threads.max(1))
        .build()
        .context("Failed to start tokio runtime")?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Run {
                prompt,
                provider,
                strategy,
                max_tool_calls,
                tools,
                options,
            } => {
                let args = RunArgs {
                    prompt,
                    provider,
                    strategy,
                    max_tool_calls,
                    tools,
                    options,
                };
                cmd_run(&cfg, args).await
            }
            Commands::Providers => cmd_providers(),
            Commands::Tools => cmd_tools(),
            Commands::Init { path, force } => cmd_init(path.or(cli.config), force),
        }
    })
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

struct RunArgs {
    prompt: String,
    provider: Option<String>,
    strategy: Option<Strategy>,
    max_tool_calls: Option<usize>,
    tools: Vec<String>,
    options: Vec<String>,
}

async fn cmd_run(cfg: &BridgeConfig, args: RunArgs) -> Result<()> {
    let provider_name = args
        .provider
        .unwrap_or_else(|| cfg.default_provider.clone());
    let strategy = args.strategy.unwrap_or(cfg.strategy);
    let max_tool_calls = args.max_tool_calls.unwrap_or(cfg.max_tool_calls);

    let settings = cfg.providers.get(&provider_name).cloned().unwrap_or_default();

    let mut options: RequestOptions = settings.options.clone();
    for raw in &args.options {
        let (key, value) = parse_option(raw)?;
        options.insert(key, value);
    }

    let registry = AdapterRegistry::with_builtins();
    let mut bridge = match strategy {
        Strategy::Adapter => ToolBridge::with_adapter(registry.create(&provider_name, &settings)?),
        Strategy::Provider => {
            ToolBridge::with_provider(registry.create_provider(&provider_name, &settings)?)
        }
    };
    bridge.register_tools(builtin_tools())?;

    let selected: Vec<ToolRef> = args.tools.iter().map(|n| ToolRef::from(n.as_str())).collect();
    let selected = (!selected.is_empty()).then_some(selected);

    println!(
        "{} {} via {} ({} strategy)",
        ">>>".green().bold(),
        "Running".bold(),
        provider_name,
        strategy,
    );

    let response = bridge
        .execute(&args.prompt, selected.as_deref(), max_tool_calls, &options)
        .await?;

    print_response(&response);
    Ok(())
}

fn cmd_providers() -> Result<()> {
    let registry = AdapterRegistry::with_builtins();
    println!("{}", "=== Providers ===".bold());
    for name in registry.names() {
        let Some(caps) = toolbridge::provider::builtin_capabilities(name) else {
            continue;
        };
        println!(
            "  {:<14} tools: {}  multi: {}  streaming: {}  vision: {}  max tokens: {}",
            name.bold(),
            flag(caps.supports_tool_calling),
            flag(caps.supports_multiple_tools),
            flag(caps.supports_streaming),
            flag(caps.supports_vision),
            caps.max_tokens_limit
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".into()),
        );
    }
    Ok(())
}

fn cmd_tools() -> Result<()> {
    for tool in builtin_tools() {
        println!("{}", serde_json::to_string_pretty(&tool.to_dict())?);
    }
    Ok(())
}

fn cmd_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(config::default_config_path);
    if path.exists() && !force {
        bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    config::save_config(&BridgeConfig::starter(), &path)?;
    println!("{} Wrote {}", ">>>".green().bold(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `KEY=JSON`; values that are not valid JSON are taken as strings.
fn parse_option(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Invalid option '{raw}' (expected KEY=JSON)");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Invalid option '{raw}' (empty key)");
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn print_response(response: &LlmResponse) {
    println!();
    match &response.content {
        Some(content) => println!("{}", content),
        None => println!("{}", "(no content)".dimmed()),
    }

    if response.has_tool_calls() {
        println!();
        println!("{}", "Unresolved tool calls:".yellow().bold());
        for call in &response.tool_calls {
            println!(
                "  {}({})",
                call.tool_name,
                Value::Object(call.arguments.clone())
            );
        }
    }

    if response.truncated {
        println!();
        println!(
            "{} tool-call limit reached; response may be incomplete",
            "warning:".yellow().bold()
        );
    }
}

fn flag(value: bool) -> colored::ColoredString {
    if value {
        "yes".green()
    } else {
        "no".red()
    }
}
