//! MediScreen configuration.
//!
//! Read from `~/.mediscreen/config.toml` or an explicit path, then
//! overlaid with environment variables and validated once at startup.
//! Every key has a default, so a missing file is not an error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shared key; a `[providers.<name>]` entry may carry its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_provider")]
    pub default_provider: String,

    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Model round-trips allowed within one agent turn.
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub agents: AgentsConfig,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-2.5-flash-lite".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_max_tool_iterations() -> usize {
    8
}
fn default_true() -> bool {
    true
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("max_tool_iterations", &self.max_tool_iterations)
            .field("session", &self.session)
            .field("paths", &self.paths)
            .field("routing", &self.routing)
            .field("agents", &self.agents)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Which session store backs the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default = "default_session_backend")]
    pub backend: SessionBackend,

    #[serde(default = "default_database_url")]
    pub database_url: String,
}

fn default_app_name() -> String {
    "mediscreen_ai".into()
}
fn default_user_id() -> String {
    "patient_cli_user".into()
}
fn default_session_backend() -> SessionBackend {
    SessionBackend::Sqlite
}
fn default_database_url() -> String {
    "sqlite://mediscreen.db".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            user_id: default_user_id(),
            backend: default_session_backend(),
            database_url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Trace logs and SOAP notes are written here.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    /// JSON object keyed by patient id.
    #[serde(default = "default_patient_data")]
    pub patient_data: PathBuf,
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}
fn default_patient_data() -> PathBuf {
    PathBuf::from("data/mock_patients.json")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            logs_dir: default_logs_dir(),
            patient_data: default_patient_data(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Prefer tool-call signals over free-text phrase matching.
    #[serde(default = "default_true")]
    pub structured_signals: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            structured_signals: true,
        }
    }
}

/// Optional model settings for a single agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentsConfig {
    #[serde(default)]
    pub intake: AgentOverride,

    #[serde(default)]
    pub specialist: AgentOverride,

    #[serde(default)]
    pub scribe: AgentOverride,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// Effective model settings for one agent after overrides are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
}

impl AppConfig {
    /// Load configuration from the default path (~/.mediscreen/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path` and apply environment variable overrides.
    ///
    /// API key lookup order:
    /// - `MEDISCREEN_API_KEY` (highest priority)
    /// - `GEMINI_API_KEY`
    /// - `GOOGLE_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file absent, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = [
                "MEDISCREEN_API_KEY",
                "GEMINI_API_KEY",
                "GOOGLE_API_KEY",
                "OPENAI_API_KEY",
            ]
            .iter()
            .find_map(|key| lookup(key).filter(|v| !v.is_empty()));
        }

        if let Some(provider) = lookup("MEDISCREEN_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("MEDISCREEN_MODEL") {
            self.default_model = model;
        }
    }

    /// `~/.mediscreen`
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".mediscreen")
    }

    /// Reject values no session could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_temperature("default_temperature", self.default_temperature)?;

        for (name, agent) in [
            ("agents.intake", &self.agents.intake),
            ("agents.specialist", &self.agents.specialist),
            ("agents.scribe", &self.agents.scribe),
        ] {
            if let Some(t) = agent.temperature {
                check_temperature(&format!("{name}.temperature"), t)?;
            }
        }

        if self.max_tool_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_tool_iterations must be at least 1".into(),
            ));
        }

        if self.session.app_name.trim().is_empty() || self.session.user_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "session.app_name and session.user_id must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Whether a key is configured globally or for the default provider.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Resolve the model and temperature for one agent.
    ///
    /// Model precedence: the agent override, then the default provider's
    /// `default_model`, then `default_model`.
    pub fn model_settings(&self, agent: &AgentOverride) -> ModelSettings {
        let provider_model = self
            .providers
            .get(&self.default_provider)
            .and_then(|p| p.default_model.clone());
        ModelSettings {
            model: agent
                .model
                .clone()
                .or(provider_model)
                .unwrap_or_else(|| self.default_model.clone()),
            temperature: agent.temperature.unwrap_or(self.default_temperature),
        }
    }

    /// The defaults rendered as TOML, as written by `mediscreen onboard`.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn check_temperature(field: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=2.0).contains(&value) {
        return Err(ConfigError::ValidationError(format!(
            "{field} must be between 0.0 and 2.0"
        )));
    }
    Ok(())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            max_tool_iterations: default_max_tool_iterations(),
            session: SessionConfig::default(),
            paths: PathsConfig::default(),
            routing: RoutingConfig::default(),
            agents: AgentsConfig::default(),
            providers: HashMap::new(),
        }
    }
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Invalid TOML in {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}
