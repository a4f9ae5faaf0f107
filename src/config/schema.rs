//! Configuration schema for toolbridge.toml.

use crate::types::{RequestOptions, DEFAULT_MAX_TOOL_CALLS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which iteration policy `ToolBridge` runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Two rounds through an adapter.
    #[default]
    Adapter,
    /// Multi-round loop over a raw provider.
    Provider,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Adapter => "adapter",
            Self::Provider => "provider",
        })
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adapter" => Ok(Self::Adapter),
            "provider" => Ok(Self::Provider),
            other => Err(format!("unknown strategy '{other}' (expected adapter or provider)")),
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Provider used when none is named on the command line.
    pub default_provider: String,

    /// Tool-call cap (adapter) or round cap (provider).
    pub max_tool_calls: usize,

    pub strategy: Strategy,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Blocking worker threads for adapter runs.
    pub worker_threads: usize,

    /// Per-provider settings keyed by provider name.
    pub providers: BTreeMap<String, ProviderSettings>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_provider: "openai".into(),
            max_tool_calls: DEFAULT_MAX_TOOL_CALLS,
            strategy: Strategy::default(),
            log_level: "info".into(),
            worker_threads: 4,
            providers: BTreeMap::new(),
        }
    }
}

impl BridgeConfig {
    /// Config written by `toolbridge init`: one empty table per bundled vendor.
    pub fn starter() -> Self {
        let mut config = Self::default();
        for (name, key_env) in [
            ("openai", "OPENAI_API_KEY"),
            ("azure_openai", "AZURE_OPENAI_API_KEY"),
            ("gemini", "GOOGLE_API_KEY"),
        ] {
            config.providers.insert(
                name.into(),
                ProviderSettings {
                    api_key_env: Some(key_env.into()),
                    ..ProviderSettings::default()
                },
            );
        }
        config
    }
}

/// Connection settings for one vendor. Unset fields fall back to the
/// provider's defaults and environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Literal key; `${VAR}` references are expanded.
    pub api_key: Option<String>,
    /// Environment variable holding the key.
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Azure resource endpoint.
    pub endpoint: Option<String>,
    /// Azure deployment name.
    pub deployment_name: Option<String>,
    pub api_version: Option<String>,
    pub organization: Option<String>,
    /// Gemini: AUTO, ANY or NONE.
    pub function_calling_mode: Option<String>,
    pub request_timeout_secs: Option<u64>,
    /// Request options passed to every call.
    #[serde(skip_serializing_if = "RequestOptions::is_empty")]
    pub options: RequestOptions,
}

impl ProviderSettings {
    /// Explicit key, then `api_key_env`, then the vendor's default variable.
    pub fn resolve_api_key(&self, default_env: &str) -> Option<String> {
        let explicit = self.api_key.as_deref().map(|key| {
            shellexpand::env(key)
                .map(|k| k.into_owned())
                .unwrap_or_else(|_| key.to_string())
        });
        explicit
            .filter(|k| !k.is_empty())
            .or_else(|| {
                self.api_key_env
                    .as_deref()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|k| !k.is_empty())
            })
            .or_else(|| std::env::var(default_env).ok().filter(|k| !k.is_empty()))
    }

    pub fn timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .unwrap_or(super::DEFAULT_REQUEST_TIMEOUT_SECS)
    }
}
