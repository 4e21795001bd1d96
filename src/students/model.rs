//! Student record and onboarding answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stage::{Stage, StageTrigger};
use crate::error::JourneyError;
use crate::shortlist::ShortlistCounts;

/// Academic background.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Academic {
    pub education_level: Option<String>,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
    pub gpa: Option<f64>,
}

/// What and where the student wants to study.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyGoals {
    pub intended_degree: Option<String>,
    pub field_of_study: Option<String>,
    pub intake_year: Option<i32>,
    pub preferred_countries: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    /// Yearly budget in USD.
    pub yearly_budget: Option<u64>,
    pub funding_type: Option<String>,
}

/// Exam and document readiness, as free-form statuses ("Completed",
/// "Scheduled", "Not started").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Exams {
    pub ielts: Option<String>,
    pub gre_gmat: Option<String>,
    pub sop: Option<String>,
}

/// Answers collected by the onboarding form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Onboarding {
    pub academic: Academic,
    pub study_goals: StudyGoals,
    pub budget: Budget,
    pub exams: Exams,
}

/// Derived profile data. Never set directly by clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Profile strength, 0-100.
    pub strength: u8,
    /// Materialized shortlist counts; recomputed after every ledger mutation.
    pub counts: ShortlistCounts,
}

/// A student and their journey state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub onboarding: Onboarding,
    pub profile_completed: bool,
    stage: Stage,
    pub profile: ProfileSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// A freshly registered student at stage 1.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into().trim().to_lowercase(),
            onboarding: Onboarding::default(),
            profile_completed: false,
            stage: Stage::BuildingProfile,
            profile: ProfileSummary::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate a stored record. Only the storage layer calls this.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: Uuid,
        name: String,
        email: String,
        onboarding: Onboarding,
        profile_completed: bool,
        stage: Stage,
        profile: ProfileSummary,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            onboarding,
            profile_completed,
            stage,
            profile,
            created_at,
            updated_at,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Fire a stage trigger. This is the only way the stage changes.
    pub fn transition(&mut self, trigger: StageTrigger) -> Result<Stage, JourneyError> {
        let from = self.stage;
        let to = from.apply(trigger)?;
        if from != to {
            tracing::info!(
                student_id = %self.id,
                from = from.number(),
                to = to.number(),
                trigger = ?trigger,
                "Stage transition"
            );
        }
        self.stage = to;
        self.touch();
        Ok(to)
    }

    pub fn shortlisted_total(&self) -> u32 {
        self.profile.counts.total()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
