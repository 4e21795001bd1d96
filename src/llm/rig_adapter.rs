//! Bridges rig's `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::agent::AgentBuilder;
use rig::completion::{CompletionModel, Prompt};

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};

/// Wraps a rig completion model. A fresh one-shot agent is built per request
/// so each call carries its own preamble and sampling options.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
    provider: &'static str,
}

impl<M> RigAdapter<M>
where
    M: CompletionModel,
{
    pub fn new(model: M, model_name: &str, provider: &'static str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            provider,
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let preamble = request.system_text();
        let prompt = request.user_text();

        let mut builder = AgentBuilder::new(self.model.clone()).preamble(&preamble);
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }
        let agent = builder.build();

        let content = agent
            .prompt(prompt.as_str())
            .await
            .map_err(|e| LlmError::Unavailable {
                provider: self.provider.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            model = %self.model_name,
            chars = content.len(),
            "Completion received"
        );
        Ok(CompletionResponse { content })
    }
}
