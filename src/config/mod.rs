pub mod schema;

pub use schema::{BridgeConfig, ProviderSettings, Strategy};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Per-client HTTP timeout when a provider table does not set one.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "TOOLBRIDGE_CONFIG";

/// Config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "toolbridge.toml";

/// Default toolbridge home directory (~/.toolbridge).
pub fn default_home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".toolbridge"))
        .unwrap_or_else(|| PathBuf::from(".toolbridge"))
}

/// `~/.toolbridge/config.toml`.
pub fn default_config_path() -> PathBuf {
    default_home_dir().join("config.toml")
}

/// First existing config file: `$TOOLBRIDGE_CONFIG`, `./toolbridge.toml`,
/// then `~/.toolbridge/config.toml`.
pub fn find_config_path() -> Option<PathBuf> {
    let from_env = std::env::var(CONFIG_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .map(|p| PathBuf::from(shellexpand::tilde(&p).into_owned()));

    from_env
        .into_iter()
        .chain([PathBuf::from(CONFIG_FILE_NAME), default_config_path()])
        .find(|p| p.is_file())
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<BridgeConfig> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: BridgeConfig =
            toml::from_str(&contents).context("Failed to parse toolbridge config (TOML)")?;
        Ok(config)
    } else {
        Ok(BridgeConfig::default())
    }
}

/// Load from an explicit path, or from the search order when none is given.
/// Returns the path actually read, if any.
pub fn load(explicit: Option<&Path>) -> Result<(BridgeConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(p) => Some(PathBuf::from(
            shellexpand::tilde(&p.to_string_lossy()).into_owned(),
        )),
        None => find_config_path(),
    };
    match path {
        Some(p) => Ok((load_config(&p)?, Some(p))),
        None => Ok((BridgeConfig::default(), None)),
    }
}

/// Save config to the given path (TOML format).
pub fn save_config(config: &BridgeConfig, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).context("Failed to write config file")?;
    Ok(())
}

/// Settings table for `name`.
pub fn get_provider_settings<'a>(
    config: &'a BridgeConfig,
    name: &str,
) -> Result<&'a ProviderSettings> {
    config.providers.get(name).with_context(|| {
        format!("No configuration for provider '{name}' (add a [providers.{name}] table)")
    })
}
