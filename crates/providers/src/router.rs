//! Provider selection from configuration.

use crate::openai_compat::OpenAiCompatProvider;
use mediscreen_config::AppConfig;
use mediscreen_core::provider::Provider;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Well-known OpenAI-compatible endpoints.
const KNOWN_ENDPOINTS: &[(&str, &str)] = &[
    ("gemini", "https://generativelanguage.googleapis.com/v1beta/openai"),
    ("google", "https://generativelanguage.googleapis.com/v1beta/openai"),
    ("openai", "https://api.openai.com/v1"),
    ("openrouter", "https://openrouter.ai/api/v1"),
    ("groq", "https://api.groq.com/openai/v1"),
    ("ollama", "http://localhost:11434/v1"),
    ("vllm", "http://localhost:8000/v1"),
    ("llamacpp", "http://localhost:8080/v1"),
];

/// Base URL for a well-known provider name.
pub fn default_base_url(provider_name: &str) -> Option<&'static str> {
    KNOWN_ENDPOINTS
        .iter()
        .find(|(name, _)| *name == provider_name)
        .map(|(_, url)| *url)
}

/// Named providers plus the one agents use by default.
pub struct ProviderRouter {
    providers: BTreeMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: BTreeMap::new(),
            default_provider: default_provider.into(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.get(&self.default_provider)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }
}

/// Register every `[providers.*]` entry, then the default provider if it
/// was not listed. Entries without an `api_url` must name a well-known
/// provider; unknown ones are skipped with a warning.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, entry) in &config.providers {
        let Some(base_url) = entry.api_url.as_deref().or_else(|| default_base_url(name)) else {
            tracing::warn!(provider = %name, "No api_url for unknown provider, skipping");
            continue;
        };
        let api_key = entry.api_key.as_ref().or(config.api_key.as_ref());
        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(
                name,
                base_url,
                api_key.map(String::as_str).unwrap_or_default(),
            )),
        );
    }

    if router.get(&config.default_provider).is_none() {
        match default_base_url(&config.default_provider) {
            Some(base_url) => router.register(
                config.default_provider.clone(),
                Arc::new(OpenAiCompatProvider::new(
                    &config.default_provider,
                    base_url,
                    config.api_key.clone().unwrap_or_default(),
                )),
            ),
            None => tracing::warn!(
                provider = %config.default_provider,
                "Default provider is neither configured nor well-known"
            ),
        }
    }

    tracing::debug!(
        providers = ?router.list(),
        default = %config.default_provider,
        "Provider router built"
    );
    router
}
