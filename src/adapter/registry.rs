//! Explicit name → factory table for adapters, filled at startup.
//!
//! A name registered with [`AdapterRegistry::register_provider`] serves both
//! strategies. A name registered with [`AdapterRegistry::register`] only has
//! an adapter.

use super::{DynAdapter, ProviderAdapter};
use crate::config::ProviderSettings;
use crate::error::BridgeError;
use crate::provider::{self, azure_openai, gemini, openai, Provider};
use crate::types::ProviderCapabilities;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds an adapter from a provider's config settings.
pub type AdapterFactory =
    Arc<dyn Fn(&ProviderSettings) -> anyhow::Result<Arc<dyn DynAdapter>> + Send + Sync>;

/// Builds a raw provider from its config settings.
pub type ProviderFactory =
    Arc<dyn Fn(&ProviderSettings) -> anyhow::Result<Arc<dyn Provider>> + Send + Sync>;

#[derive(Clone)]
struct Entry {
    adapter: AdapterFactory,
    provider: Option<ProviderFactory>,
}

#[derive(Clone, Default)]
pub struct AdapterRegistry {
    entries: BTreeMap<String, Entry>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bundled `openai`, `azure_openai` and `gemini` backends.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, capabilities) in [
            (openai::NAME, openai::CAPABILITIES),
            (azure_openai::NAME, azure_openai::CAPABILITIES),
            (gemini::NAME, gemini::CAPABILITIES),
        ] {
            registry
                .entries
                .insert(name.to_string(), provider_entry(builtin_provider(name), capabilities));
        }
        registry
    }

    /// Register an adapter-only backend.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: AdapterFactory,
    ) -> Result<(), BridgeError> {
        self.insert(
            name.into(),
            Entry {
                adapter: factory,
                provider: None,
            },
        )
    }

    /// Register a provider. Its adapter wraps it in a [`ProviderAdapter`].
    pub fn register_provider(
        &mut self,
        name: impl Into<String>,
        capabilities: ProviderCapabilities,
        factory: ProviderFactory,
    ) -> Result<(), BridgeError> {
        self.insert(name.into(), provider_entry(factory, capabilities))
    }

    fn insert(&mut self, name: String, entry: Entry) -> Result<(), BridgeError> {
        if self.entries.contains_key(&name) {
            return Err(BridgeError::DuplicateAdapter(name));
        }
        debug!("Registering adapter '{}'", name);
        self.entries.insert(name, entry);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    fn entry(&self, name: &str) -> Result<&Entry, BridgeError> {
        self.entries
            .get(name)
            .ok_or_else(|| BridgeError::UnknownAdapter(name.to_string()))
    }

    pub fn create(
        &self,
        name: &str,
        settings: &ProviderSettings,
    ) -> anyhow::Result<Arc<dyn DynAdapter>> {
        let entry = self.entry(name)?;
        info!("Creating adapter '{}'", name);
        (entry.adapter)(settings)
    }

    /// Raw provider for the legacy strategy.
    pub fn create_provider(
        &self,
        name: &str,
        settings: &ProviderSettings,
    ) -> anyhow::Result<Arc<dyn Provider>> {
        let factory = self
            .entry(name)?
            .provider
            .as_ref()
            .ok_or_else(|| BridgeError::AdapterOnly(name.to_string()))?;
        info!("Creating provider '{}'", name);
        factory(settings)
    }
}

/// Factory for a bundled vendor, built through [`provider::build_provider`].
pub fn builtin_provider(name: &'static str) -> ProviderFactory {
    Arc::new(move |settings: &ProviderSettings| provider::build_provider(name, settings))
}

fn provider_entry(factory: ProviderFactory, capabilities: ProviderCapabilities) -> Entry {
    let build = factory.clone();
    let adapter: AdapterFactory = Arc::new(
        move |settings: &ProviderSettings| -> anyhow::Result<Arc<dyn DynAdapter>> {
            let provider = build(settings)?;
            let adapter: Arc<dyn DynAdapter> =
                Arc::new(ProviderAdapter::new(provider, capabilities));
            Ok(adapter)
        },
    );
    Entry {
        adapter,
        provider: Some(factory),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::tools::Tool;
    use crate::types::{LlmResponse, RequestOptions, ToolCall, ToolResults};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Canned;

    #[async_trait]
    impl Provider for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _tools: &[Tool],
            _tool_results: Option<&ToolResults>,
            _options: &RequestOptions,
        ) -> Result<LlmResponse, ProviderError> {
            Ok(LlmResponse::text("canned"))
        }

        fn format_tools_for_provider(&self, _tools: &[Tool]) -> Value {
            json!([])
        }

        fn parse_tool_calls(&self, _raw_response: &Value) -> Vec<ToolCall> {
            Vec::new()
        }
    }

    fn canned_factory() -> ProviderFactory {
        Arc::new(|_: &ProviderSettings| -> anyhow::Result<Arc<dyn Provider>> {
            Ok(Arc::new(Canned))
        })
    }

    fn unknown_name(err: &anyhow::Error) -> Option<&str> {
        match err.downcast_ref::<BridgeError>() {
            Some(BridgeError::UnknownAdapter(name)) => Some(name),
            _ => None,
        }
    }

    #[test]
    fn builtins_are_registered() {
        let registry = AdapterRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["azure_openai", "gemini", "openai"]);
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = AdapterRegistry::with_builtins();
        let err = registry
            .register_provider("openai", openai::CAPABILITIES, builtin_provider("openai"))
            .unwrap_err();
        assert!(matches!(err, BridgeError::DuplicateAdapter(name) if name == "openai"));
    }

    #[test]
    fn unknown_name_fails_the_same_for_both_lookups() {
        let registry = AdapterRegistry::with_builtins();
        let settings = ProviderSettings::default();

        let err = registry.create("mistral", &settings).err().unwrap();
        assert_eq!(unknown_name(&err), Some("mistral"));
        let err = registry.create_provider("mistral", &settings).err().unwrap();
        assert_eq!(unknown_name(&err), Some("mistral"));
    }

    #[test]
    fn registered_provider_serves_both_strategies() {
        let mut registry = AdapterRegistry::new();
        registry
            .register_provider("canned", ProviderCapabilities::default(), canned_factory())
            .unwrap();
        let settings = ProviderSettings::default();

        let provider = registry.create_provider("canned", &settings).unwrap();
        assert_eq!(provider.name(), "canned");
        let adapter = registry.create("canned", &settings).unwrap();
        assert_eq!(adapter.adapter_name(), "canned");
    }

    #[test]
    fn adapter_only_entry_has_no_raw_provider() {
        let mut registry = AdapterRegistry::new();
        let factory: AdapterFactory =
            Arc::new(|_: &ProviderSettings| -> anyhow::Result<Arc<dyn DynAdapter>> {
                Ok(Arc::new(ProviderAdapter::new(
                    Arc::new(Canned),
                    ProviderCapabilities::default(),
                )))
            });
        registry.register("custom", factory).unwrap();

        let err = registry
            .create_provider("custom", &ProviderSettings::default())
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<BridgeError>(),
            Some(BridgeError::AdapterOnly(name)) if name == "custom"
        ));
    }

    #[test]
    fn builtin_factory_carries_capabilities() {
        let registry = AdapterRegistry::with_builtins();
        let settings = ProviderSettings {
            api_key: Some("test".into()),
            ..ProviderSettings::default()
        };
        let adapter = registry.create("gemini", &settings).unwrap();
        assert_eq!(adapter.adapter_name(), "gemini");
        assert_eq!(adapter.capabilities().max_tokens_limit, Some(32768));
    }
}
