//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/hire.sqlite"
//!
//! [inference]
//! provider = "openai-compatible"
//! model = "llama-3.1-8b-instant"
//!
//! [server]
//! bind = "127.0.0.1:8000"
//! ```
//!
//! Only `[db].path` is required. See [`load_config`] for validation rules.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_statement_timeout_secs() -> u64 {
    10
}
fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct InferenceConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub temperature: f32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            temperature: 0.0,
        }
    }
}

impl InferenceConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}
fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Config {
    /// Defaults for commands that can run without a config file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/hire.sqlite"),
                statement_timeout_secs: default_statement_timeout_secs(),
                max_connections: default_max_connections(),
            },
            inference: InferenceConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
///
/// A file that exists but does not parse or validate is still an error.
pub fn load_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.db.statement_timeout_secs == 0 {
        anyhow::bail!("db.statement_timeout_secs must be > 0");
    }
    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be > 0");
    }

    if config.inference.timeout_secs == 0 {
        anyhow::bail!("inference.timeout_secs must be > 0");
    }
    if !(0.0..=2.0).contains(&config.inference.temperature) {
        anyhow::bail!("inference.temperature must be in [0.0, 2.0]");
    }

    match config.inference.provider.as_str() {
        "disabled" => {}
        "openai-compatible" => {
            if config.inference.model.is_none() {
                anyhow::bail!(
                    "inference.model must be specified when provider is '{}'",
                    config.inference.provider
                );
            }
            if config.inference.base_url.trim().is_empty() {
                anyhow::bail!("inference.base_url must not be empty");
            }
        }
        other => anyhow::bail!(
            "Unknown inference provider: '{}'. Must be disabled or openai-compatible.",
            other
        ),
    }

    Ok(())
}
