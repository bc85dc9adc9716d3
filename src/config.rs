//! Application configuration.
//!
//! Loading order:
//! 1. Built-in defaults.
//! 2. A TOML file, either given explicitly or found at
//!    `<config_dir>/planwise/config.toml`.
//! 3. Environment overrides:
//!    - `PLANWISE_DB`: database file path
//!    - `PLANWISE_AI_API_KEY`: bearer token for the completion endpoint
//!    - `PLANWISE_AI_BASE_URL`: endpoint base URL
//!    - `PLANWISE_AI_MODEL`: model name

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PlanError, Result};

pub const DEFAULT_AI_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_AI_MODEL: &str = "deepseek-chat";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Defaults to `<data_local_dir>/planwise/planwise.db`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Token limit and timeout for a single-day plan.
    pub day_max_tokens: u32,
    pub day_timeout_secs: u64,
    /// Token limit and timeout for a seven-day plan.
    pub week_max_tokens: u32,
    pub week_timeout_secs: u64,
    /// Token limit and timeout for report narratives.
    pub report_max_tokens: u32,
    pub report_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_AI_BASE_URL.to_string(),
            model: DEFAULT_AI_MODEL.to_string(),
            temperature: 0.7,
            day_max_tokens: 4000,
            day_timeout_secs: 60,
            week_max_tokens: 8000,
            week_timeout_secs: 120,
            report_max_tokens: 2000,
            report_timeout_secs: 60,
        }
    }
}

impl AiConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl Config {
    /// Loads defaults, then the config file, then environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(PlanError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            }
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Config::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        tracing::debug!(path = %path.display(), "Loading configuration file");
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Config> {
        toml::from_str(contents)
            .map_err(|e| PlanError::Config(format!("Invalid config file: {e}")))
    }

    fn apply_env(&mut self) {
        if let Some(db) = env_value("PLANWISE_DB") {
            self.database.path = Some(PathBuf::from(db));
        }
        if let Some(key) = env_value("PLANWISE_AI_API_KEY") {
            self.ai.api_key = Some(key);
        }
        if let Some(url) = env_value("PLANWISE_AI_BASE_URL") {
            self.ai.base_url = url;
        }
        if let Some(model) = env_value("PLANWISE_AI_MODEL") {
            self.ai.model = model;
        }
    }

    /// Resolved database path, creating the parent directory when needed.
    pub fn db_path(&self) -> Result<PathBuf> {
        let path = match &self.database.path {
            Some(p) => p.clone(),
            None => {
                let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
                p.push("planwise");
                p.push("planwise.db");
                p
            }
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}

fn default_config_path() -> Option<PathBuf> {
    let mut p = dirs::config_dir()?;
    p.push("planwise");
    p.push("config.toml");
    Some(p)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
