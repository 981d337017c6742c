use crate::error::{HardballError, Result};
use crate::model::Language;
use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardballConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Fallback credential used when the operator leaves the key field blank.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable to read the fallback credential from.
    #[serde(default)]
    pub env_var: Option<String>,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            api_key: None,
            base_url: None,
            env_var: None,
            max_tokens: default_llm_max_tokens(),
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("env_var", &self.env_var)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl LlmConfig {
    /// Environment variable consulted for the fallback credential.
    pub fn credential_env_var(&self) -> &str {
        if let Some(ref var) = self.env_var {
            return var;
        }
        match self.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            "anthropic" | "claude" => "ANTHROPIC_API_KEY",
            "ollama" => "OLLAMA_API_KEY",
            _ => "GEMINI_API_KEY",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_web_port")]
    pub port: u16,
    #[serde(default = "default_web_host")]
    pub host: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            host: default_web_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Length of the negotiation countdown.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
    #[serde(default)]
    pub language: Language,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            language: Language::default(),
        }
    }
}

impl SimulationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

/// Valid LLM provider names.
pub const VALID_LLM_PROVIDERS: &[&str] = &["gemini", "openai", "anthropic", "ollama"];

/// Ten minutes, the length of a standard simulation.
pub const DEFAULT_DURATION_SECS: u64 = 600;

// -- Defaults --

fn default_llm_provider() -> String {
    "gemini".to_string()
}
fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_llm_max_tokens() -> usize {
    1024
}
fn default_web_port() -> u16 {
    8501
}
fn default_web_host() -> String {
    "127.0.0.1".to_string()
}
fn default_duration_secs() -> u64 {
    DEFAULT_DURATION_SECS
}

impl HardballConfig {
    /// Load configuration with three-layer TOML merge:
    /// 1. ~/.config/hardball/config.toml (global)
    /// 2. .hardball/config.toml (project)
    /// 3. .hardball/config.local.toml (local, gitignored)
    pub fn load(project_dir: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        if let Some(dir) = project_dir {
            let project_config = dir.join(".hardball").join("config.toml");
            if project_config.exists() {
                builder = builder.add_source(File::from(project_config).required(false));
            }

            let local_config = dir.join(".hardball").join("config.local.toml");
            if local_config.exists() {
                builder = builder.add_source(File::from(local_config).required(false));
            }
        }

        let config = builder
            .build()
            .map_err(|e| HardballError::Config(e.to_string()))?;

        let mut cfg: Self = config
            .try_deserialize()
            .map_err(|e| HardballError::Config(e.to_string()))?;

        cfg.validate();
        Ok(cfg)
    }

    /// Defaults only (no files).
    pub fn default_config() -> Self {
        Self {
            llm: LlmConfig::default(),
            web: WebConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }

    /// Validate config values, fixing out-of-range values and logging
    /// warnings rather than rejecting the config.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !VALID_LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            warnings.push(format!(
                "unknown LLM provider '{}', valid: {}",
                self.llm.provider,
                VALID_LLM_PROVIDERS.join(", ")
            ));
        }

        if self.llm.model.trim().is_empty() {
            warnings.push(format!(
                "llm.model is empty, using {}",
                default_llm_model()
            ));
            self.llm.model = default_llm_model();
        }

        if self.llm.max_tokens == 0 {
            warnings.push("llm.max_tokens = 0, setting to 256".to_string());
            self.llm.max_tokens = 256;
        }

        if self.simulation.duration_secs == 0 {
            warnings.push(format!(
                "simulation.duration_secs = 0, setting to {DEFAULT_DURATION_SECS}"
            ));
            self.simulation.duration_secs = DEFAULT_DURATION_SECS;
        }

        if self.web.port == 0 {
            warnings.push(format!(
                "web.port = 0, setting to {}",
                default_web_port()
            ));
            self.web.port = default_web_port();
        }

        for w in &warnings {
            tracing::warn!("config: {}", w);
        }

        warnings
    }
}

fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hardball").join("config.toml"))
}

/// Resolve the credential for a new session: the value the operator typed,
/// then `llm.api_key`, then the provider's environment variable. Blank
/// values count as missing.
pub fn resolve_credential(supplied: Option<&str>, config: &LlmConfig) -> Option<String> {
    if let Some(key) = supplied.map(str::trim).filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }

    if let Some(key) = config.api_key.as_deref().map(str::trim) {
        if !key.is_empty() {
            return Some(key.to_string());
        }
    }

    std::env::var(config.credential_env_var())
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}
