//! Completion providers for the advice generator.
//!
//! One Anthropic or OpenAI model is configured per process. rig-core does
//! the HTTP work; `RigAdapter` turns its `CompletionModel` into an
//! `LlmProvider` that the counselling code can hold as a trait object.

pub mod provider;
mod rig_adapter;

pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::{ExposeSecret, SecretString};

use crate::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

impl LlmBackend {
    /// Provider name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o",
        }
    }

    /// Vendor variable consulted when no explicit counselling key is set.
    pub fn api_key_var(self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            _ => Err(format!("unknown backend '{s}' (expected anthropic or openai)")),
        }
    }
}

/// Which model to call and with what key.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: SecretString,
    pub model: String,
}

impl LlmConfig {
    /// Config for `backend` using its default model.
    pub fn new(backend: LlmBackend, api_key: SecretString) -> Self {
        Self {
            backend,
            api_key,
            model: backend.default_model().to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Build the advice model for `config`. Client construction does not touch
/// the network; a bad key only shows up on the first completion.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::{anthropic, openai};

    let key = config.api_key.expose_secret();
    let backend = config.backend;

    let provider: Arc<dyn LlmProvider> = match backend {
        LlmBackend::Anthropic => {
            let client: rig::client::Client<anthropic::client::AnthropicExt> =
                anthropic::Client::new(key).map_err(|e| client_error(backend, e))?;
            Arc::new(RigAdapter::new(
                client.completion_model(&config.model),
                &config.model,
                backend.name(),
            ))
        }
        LlmBackend::OpenAi => {
            let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
                openai::Client::new(key).map_err(|e| client_error(backend, e))?;
            Arc::new(RigAdapter::new(
                client.completion_model(&config.model),
                &config.model,
                backend.name(),
            ))
        }
    };

    tracing::info!(backend = backend.name(), model = %config.model, "Advice model configured");
    Ok(provider)
}

fn client_error(backend: LlmBackend, e: impl std::fmt::Display) -> LlmError {
    LlmError::RequestFailed {
        provider: backend.name().to_string(),
        reason: format!("client setup failed: {e}"),
    }
}
