//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Tuning for the advice generator.
#[derive(Debug, Clone)]
pub struct AdviceConfig {
    /// Upper bound on the external completion call.
    pub timeout: Duration,
    /// LLM temperature for counselling.
    pub temperature: f32,
    /// Max tokens for the counselling response.
    pub max_tokens: u32,
    /// Maximum number of catalog entries embedded in the prompt.
    pub max_catalog_entries: usize,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            temperature: 0.4,
            max_tokens: 2048,
            max_catalog_entries: 40,
        }
    }
}

/// Process-level configuration, read from the environment in `main`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    /// `None` disables the remote advice source entirely.
    pub llm: Option<LlmConfig>,
    pub advice: AdviceConfig,
    /// Seed the built-in university catalog when the table is empty.
    pub seed_catalog: bool,
}

impl AppConfig {
    /// Build configuration from `COUNSEL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("COUNSEL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/abroad-counsel.db"));

        let port = parse_or("COUNSEL_PORT", lookup("COUNSEL_PORT"), 8080u16)?;

        let timeout_secs = parse_or(
            "COUNSEL_ADVICE_TIMEOUT_SECS",
            lookup("COUNSEL_ADVICE_TIMEOUT_SECS"),
            20u64,
        )?;

        let seed_catalog = parse_or("COUNSEL_SEED_CATALOG", lookup("COUNSEL_SEED_CATALOG"), true)?;

        let backend = match lookup("COUNSEL_LLM_BACKEND") {
            None => LlmBackend::Anthropic,
            Some(raw) => raw.parse::<LlmBackend>().map_err(|message| ConfigError::InvalidValue {
                key: "COUNSEL_LLM_BACKEND".to_string(),
                message,
            })?,
        };

        let api_key = lookup("COUNSEL_LLM_API_KEY")
            .or_else(|| lookup(backend.api_key_var()))
            .filter(|k| !k.trim().is_empty());

        let llm = api_key.map(|key| {
            let config = LlmConfig::new(backend, SecretString::from(key));
            match lookup("COUNSEL_MODEL") {
                Some(model) => config.with_model(model),
                None => config,
            }
        });

        Ok(Self {
            db_path,
            port,
            llm,
            advice: AdviceConfig {
                timeout: Duration::from_secs(timeout_secs),
                ..AdviceConfig::default()
            },
            seed_catalog,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{value}': {e}"),
        }),
    }
}
