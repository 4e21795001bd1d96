//! Advice sources: the remote LLM-backed source and the local canned one.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::debug;

use super::advice::{Advice, ProposedAction, parse_advice};
use super::prompts::{ProfileSnapshot, build_counsel_prompt, system_prompt};
use crate::config::AdviceConfig;
use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::tasks::{TaskPriority, TaskType};

/// Something that can turn a profile snapshot into advice.
#[async_trait]
pub trait AdviceSource: Send + Sync {
    fn name(&self) -> &str;

    async fn advise(&self, snapshot: &ProfileSnapshot) -> Result<Advice, LlmError>;
}

/// Calls an external text-generation service, bounded by a timeout.
pub struct RemoteAdviceSource {
    llm: Arc<dyn LlmProvider>,
    config: AdviceConfig,
}

impl RemoteAdviceSource {
    pub fn new(llm: Arc<dyn LlmProvider>, config: AdviceConfig) -> Self {
        Self { llm, config }
    }
}

#[async_trait]
impl AdviceSource for RemoteAdviceSource {
    fn name(&self) -> &str {
        self.llm.model_name()
    }

    async fn advise(&self, snapshot: &ProfileSnapshot) -> Result<Advice, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(system_prompt()),
            ChatMessage::user(build_counsel_prompt(snapshot)),
        ])
        .with_max_tokens(self.config.max_tokens)
        .with_temperature(self.config.temperature);

        let response = tokio::time::timeout(self.config.timeout, self.llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: self.llm.model_name().to_string(),
                timeout: self.config.timeout,
            })??;

        if response.content.trim().is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.llm.model_name().to_string(),
                reason: "empty response".to_string(),
            });
        }

        debug!(
            model = self.llm.model_name(),
            len = response.content.len(),
            "Remote advice received"
        );
        Ok(parse_advice(&response.content))
    }
}

/// Number of built-in templates.
const TEMPLATE_COUNT: usize = 2;

/// Local advice from a fixed set of templates. Never fails.
pub struct CannedAdviceSource {
    rng: Mutex<StdRng>,
}

impl CannedAdviceSource {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic template selection.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for CannedAdviceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdviceSource for CannedAdviceSource {
    fn name(&self) -> &str {
        "canned"
    }

    async fn advise(&self, _snapshot: &ProfileSnapshot) -> Result<Advice, LlmError> {
        let index = self.rng.lock().await.gen_range(0..TEMPLATE_COUNT);
        Ok(canned_template(index, Utc::now().date_naive()))
    }
}

fn task(
    title: &str,
    description: &str,
    task_type: TaskType,
    priority: TaskPriority,
    due: NaiveDate,
) -> ProposedAction {
    ProposedAction::CreateTask {
        title: title.to_string(),
        description: Some(description.to_string()),
        task_type,
        priority,
        due_date: Some(due),
        university_id: None,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Template `index` with due dates relative to `today`.
pub(crate) fn canned_template(index: usize, today: NaiveDate) -> Advice {
    let in_days = |n: u64| today + Days::new(n);
    match index % TEMPLATE_COUNT {
        0 => Advice {
            message: "Based on your profile, you have a strong foundation for studying abroad. \
                      Focus on perfecting your statement of purpose and build a balanced list \
                      with Dream, Target and Safe options."
                .to_string(),
            strengths: strings(&[
                "Strong academic background",
                "Clear career goals",
                "Budget clarity",
            ]),
            gaps: strings(&[
                "IELTS score below target",
                "Limited research on university details",
            ]),
            recommendations: strings(&[
                "Complete IELTS with 7.0 or above",
                "Research 2-3 more universities",
                "Draft an SOP focused on your career goals",
            ]),
            actions: vec![
                task(
                    "Complete IELTS Preparation",
                    "Target score: 7.0 or above",
                    TaskType::Exam,
                    TaskPriority::High,
                    in_days(60),
                ),
                task(
                    "Draft Statement of Purpose",
                    "Highlight your academic journey, career aspirations and why each program fits",
                    TaskType::Sop,
                    TaskPriority::High,
                    in_days(45),
                ),
            ],
        },
        _ => Advice {
            message: "Your profile shows good potential for selective universities. \
                      Strengthen your application narrative and favour universities that fit \
                      your budget while staying academically competitive."
                .to_string(),
            strengths: strings(&["Clear field of study", "Diverse university preferences"]),
            gaps: strings(&[
                "GRE/GMAT not completed",
                "Budget may limit options at top-ranked universities",
            ]),
            recommendations: strings(&[
                "Complete the GRE/GMAT soon",
                "Explore scholarships and funding options",
                "Build a balanced shortlist",
            ]),
            actions: vec![
                task(
                    "Schedule GRE Exam",
                    "Aim for the top 30th percentile",
                    TaskType::Exam,
                    TaskPriority::High,
                    in_days(30),
                ),
                task(
                    "Research Scholarship Opportunities",
                    "Find scholarships matching your profile",
                    TaskType::Document,
                    TaskPriority::Medium,
                    in_days(45),
                ),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::llm::provider::CompletionResponse;
    use crate::students::{Onboarding, Stage};

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

    struct FixedLlm {
        response: String,
        delay: Duration,
    }

    #[async_trait]
    impl LlmProvider for FixedLlm {
        fn model_name(&self) -> &str {
            "mock-counsel"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            tokio::time::sleep(self.delay).await;
            Ok(CompletionResponse {
                content: self.response.clone(),
            })
        }
    }

    fn remote(response: &str, delay: Duration, timeout: Duration) -> RemoteAdviceSource {
        RemoteAdviceSource::new(
            Arc::new(FixedLlm {
                response: response.into(),
                delay,
            }),
            AdviceConfig {
                timeout,
                ..AdviceConfig::default()
            },
        )
    }

    #[test]
    fn templates_use_relative_due_dates() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let first = canned_template(0, today);
        let dues: Vec<_> = first
            .actions
            .iter()
            .filter_map(|a| match a {
                ProposedAction::CreateTask { due_date, .. } => *due_date,
                _ => None,
            })
            .collect();
        assert_eq!(
            dues,
            vec![
                NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
            ]
        );

        let second = canned_template(1, today);
        assert!(second.message.contains("selective universities"));
        assert_eq!(second.actions.len(), 2);
    }

    #[tokio::test]
    async fn seeded_canned_source_is_deterministic() {
        let a = CannedAdviceSource::seeded(7);
        let b = CannedAdviceSource::seeded(7);
        for _ in 0..5 {
            let x = a.advise(&snapshot()).await.unwrap();
            let y = b.advise(&snapshot()).await.unwrap();
            assert_eq!(x.message, y.message);
            assert!(!x.message.is_empty());
        }
    }

    #[tokio::test]
    async fn remote_parses_response() {
        let source = remote(
            r#"{"message": "Apply early.", "actions": []}"#,
            Duration::ZERO,
            Duration::from_secs(5),
        );
        let advice = source.advise(&snapshot()).await.unwrap();
        assert_eq!(advice.message, "Apply early.");
    }

    #[tokio::test]
    async fn remote_times_out() {
        let source = remote("{}", Duration::from_millis(500), Duration::from_millis(20));
        let err = source.advise(&snapshot()).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout { .. }));
    }

    #[tokio::test]
    async fn remote_rejects_empty_response() {
        let source = remote("   ", Duration::ZERO, Duration::from_secs(5));
        let err = source.advise(&snapshot()).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }
}
