//! Advice generator: one decision point between the remote and canned
//! sources.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::advice::Advice;
use super::prompts::ProfileSnapshot;
use super::source::{AdviceSource, CannedAdviceSource, RemoteAdviceSource};
use crate::config::AdviceConfig;
use crate::llm::provider::LlmProvider;

/// Which source produced a piece of advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceOrigin {
    Remote,
    Canned,
}

pub struct AdviceGenerator {
    remote: Option<Arc<dyn AdviceSource>>,
    fallback: Arc<dyn AdviceSource>,
}

impl AdviceGenerator {
    pub fn new(remote: Option<Arc<dyn AdviceSource>>, fallback: Arc<dyn AdviceSource>) -> Self {
        Self { remote, fallback }
    }

    /// Remote source over `llm` when configured, canned advice otherwise.
    pub fn from_provider(llm: Option<Arc<dyn LlmProvider>>, config: AdviceConfig) -> Self {
        let remote = llm.map(|llm| {
            Arc::new(RemoteAdviceSource::new(llm, config)) as Arc<dyn AdviceSource>
        });
        Self::new(remote, Arc::new(CannedAdviceSource::new()))
    }

    /// Canned advice only.
    pub fn canned(source: CannedAdviceSource) -> Self {
        Self::new(None, Arc::new(source))
    }

    /// Produce advice. Remote failures of any kind fall through to the
    /// canned source; this never returns an error.
    pub async fn generate(&self, snapshot: &ProfileSnapshot) -> (Advice, AdviceOrigin) {
        if let Some(remote) = &self.remote {
            match remote.advise(snapshot).await {
                Ok(advice) => {
                    info!(
                        source = remote.name(),
                        actions = advice.actions.len(),
                        "Remote advice generated"
                    );
                    return (advice, AdviceOrigin::Remote);
                }
                Err(e) => {
                    warn!(
                        source = remote.name(),
                        error = %e,
                        "Remote advice failed, using canned advice"
                    );
                }
            }
        }

        match self.fallback.advise(snapshot).await {
            Ok(advice) => (advice, AdviceOrigin::Canned),
            Err(e) => {
                warn!(source = self.fallback.name(), error = %e, "Fallback advice failed");
                (
                    Advice::from_raw_text(
                        "Keep building your profile and shortlist a balanced set of universities.",
                    ),
                    AdviceOrigin::Canned,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::LlmError;
    use crate::students::{Onboarding, Stage};

    struct FailingSource;

    #[async_trait]
    impl AdviceSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn advise(&self, _snapshot: &ProfileSnapshot) -> Result<Advice, LlmError> {
            Err(LlmError::Unavailable {
                provider: "failing".into(),
                reason: "connection refused".into(),
            })
        }
    }

    struct TextSource(&'static str);

    #[async_trait]
    impl AdviceSource for TextSource {
        fn name(&self) -> &str {
            "text"
        }

        async fn advise(&self, _snapshot: &ProfileSnapshot) -> Result<Advice, LlmError> {
            Ok(Advice::from_raw_text(self.0))
        }
    }

    fn snapshot() -> ProfileSnapshot {
        ProfileSnapshot {
            student_name: "Asha".into(),
            onboarding: Onboarding::default(),
            strength: 0,
            stage: Stage::DiscoveringUniversities,
            shortlisted_count: 0,
            locked_university: None,
            candidates: Vec::new(),
        }
    }

    #[tokio::test]
    async fn remote_success_wins() {
        let remote: Arc<dyn AdviceSource> = Arc::new(TextSource("remote"));
        let generator = AdviceGenerator::new(Some(remote), Arc::new(TextSource("local")));
        let (advice, origin) = generator.generate(&snapshot()).await;
        assert_eq!(advice.message, "remote");
        assert_eq!(origin, AdviceOrigin::Remote);
    }

    #[tokio::test]
    async fn remote_failure_falls_back() {
        let remote: Arc<dyn AdviceSource> = Arc::new(FailingSource);
        let generator = AdviceGenerator::new(Some(remote), Arc::new(CannedAdviceSource::seeded(1)));
        let (advice, origin) = generator.generate(&snapshot()).await;
        assert_eq!(origin, AdviceOrigin::Canned);
        assert!(!advice.message.is_empty());
        assert_eq!(advice.actions.len(), 2);
    }

    #[tokio::test]
    async fn failing_fallback_still_yields_advice() {
        let generator = AdviceGenerator::new(None, Arc::new(FailingSource));
        let (advice, _) = generator.generate(&snapshot()).await;
        assert!(!advice.message.is_empty());
        assert!(advice.actions.is_empty());
    }
}
