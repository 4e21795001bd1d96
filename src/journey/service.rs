//! Journey service: the boundary operations callers use.
//!
//! Each mutating operation holds the student's lock for its whole
//! read-check-write, fires stage triggers only after the ledger accepted
//! the change, and persists recomputed shortlist counts before returning.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::locks::StudentLocks;
use crate::config::{AdviceConfig, AppConfig};
use crate::counsel::{
    ActionExecutor, Advice, AdviceGenerator, AdviceOrigin, AppliedAction, FailedAction,
    ProfileSnapshot, UniversitySummary,
};
use crate::error::{DatabaseError, JourneyError};
use crate::llm::create_provider;
use crate::shortlist::{Category, ShortlistEntry, ShortlistLedger};
use crate::store::{Database, LibSqlBackend};
use crate::students::{Onboarding, Stage, StageInfo, StageTrigger, Student, strength};
use crate::tasks::Task;
use crate::universities::{University, seed};

/// Student read model with the presented stage.
#[derive(Debug, Clone, Serialize)]
pub struct JourneyStatus {
    pub student: Student,
    pub presented_stage: Stage,
    pub stage_info: StageInfo,
    pub locked_university: Option<University>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnlockOutcome {
    pub student: Student,
    pub tasks_removed: u64,
}

/// Result of one counselling request.
#[derive(Debug, Clone, Serialize)]
pub struct CounselOutcome {
    pub advice: Advice,
    pub source: AdviceOrigin,
    pub applied: Vec<AppliedAction>,
    pub failed: Vec<FailedAction>,
}

pub struct JourneyService {
    db: Arc<dyn Database>,
    ledger: Arc<ShortlistLedger>,
    executor: ActionExecutor,
    advisor: AdviceGenerator,
    locks: StudentLocks,
    max_catalog_entries: usize,
}

impl JourneyService {
    pub fn new(db: Arc<dyn Database>, advisor: AdviceGenerator, config: &AdviceConfig) -> Self {
        let ledger = Arc::new(ShortlistLedger::new(db.clone()));
        Self {
            executor: ActionExecutor::new(db.clone(), ledger.clone()),
            db,
            ledger,
            advisor,
            locks: StudentLocks::new(),
            max_catalog_entries: config.max_catalog_entries,
        }
    }

    /// Open the database at `config.db_path`, seed the catalog when asked,
    /// and wire the advice generator to the configured provider, if any.
    pub async fn open(config: &AppConfig) -> crate::error::Result<Self> {
        let llm = config.llm.as_ref().map(create_provider).transpose()?;

        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_local(&config.db_path).await?);
        if config.seed_catalog {
            seed::seed_if_empty(db.as_ref()).await?;
        }

        info!(
            db_path = %config.db_path.display(),
            remote_advice = llm.is_some(),
            "Journey service ready"
        );
        let advisor = AdviceGenerator::from_provider(llm, config.advice.clone());
        Ok(Self::new(db, advisor, &config.advice))
    }

    // ── Students ────────────────────────────────────────────────────

    pub async fn register_student(&self, name: &str, email: &str) -> Result<Student, JourneyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JourneyError::ValidationFailed {
                reason: "name is required".to_string(),
            });
        }
        if !email.contains('@') {
            return Err(JourneyError::ValidationFailed {
                reason: format!("invalid email '{email}'"),
            });
        }

        let student = Student::new(name, email);
        if self.db.get_student_by_email(&student.email).await?.is_some() {
            return Err(JourneyError::ValidationFailed {
                reason: format!("email already registered: {}", student.email),
            });
        }
        self.db.create_student(&student).await.map_err(|e| match e {
            DatabaseError::Constraint(reason) => JourneyError::ValidationFailed { reason },
            other => other.into(),
        })?;

        info!(student_id = %student.id, "Student registered");
        Ok(student)
    }

    pub async fn get_student(&self, student_id: Uuid) -> Result<Student, JourneyError> {
        self.db
            .get_student(student_id)
            .await?
            .ok_or_else(|| JourneyError::student_not_found(student_id))
    }

    /// Store onboarding answers, rescore and fire `OnboardingCompleted`.
    pub async fn submit_onboarding(
        &self,
        student_id: Uuid,
        onboarding: Onboarding,
    ) -> Result<Student, JourneyError> {
        let _guard = self.locks.acquire(student_id).await;
        let mut student = self.get_student(student_id).await?;

        student.profile.strength = strength::score(&onboarding);
        student.onboarding = onboarding;
        student.profile_completed = true;
        student.transition(StageTrigger::OnboardingCompleted)?;
        self.db.save_student(&student).await?;

        info!(
            %student_id,
            strength = student.profile.strength,
            stage = student.stage().number(),
            "Onboarding submitted"
        );
        Ok(student)
    }

    pub async fn journey_status(&self, student_id: Uuid) -> Result<JourneyStatus, JourneyError> {
        let student = self.get_student(student_id).await?;
        let locked_university = match self.ledger.locked(student_id).await? {
            Some(entry) => self.db.get_university(entry.university_id).await?,
            None => None,
        };
        let presented_stage = student.stage().presented(student.shortlisted_total());
        Ok(JourneyStatus {
            stage_info: presented_stage.info(),
            presented_stage,
            locked_university,
            student,
        })
    }

    // ── Shortlist ───────────────────────────────────────────────────

    pub async fn shortlist(
        &self,
        student_id: Uuid,
        university_id: Uuid,
        category: Option<Category>,
    ) -> Result<ShortlistEntry, JourneyError> {
        let _guard = self.locks.acquire(student_id).await;
        let mut student = self.get_student(student_id).await?;

        let entry = self
            .ledger
            .add_or_update(student_id, university_id, category)
            .await?;
        self.persist_counts(&mut student).await?;
        Ok(entry)
    }

    /// Remove a university from the shortlist. Removing a locked entry
    /// does not unlock it, cascade, or change the stage.
    pub async fn remove_shortlist(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> Result<bool, JourneyError> {
        let _guard = self.locks.acquire(student_id).await;
        let mut student = self.get_student(student_id).await?;

        let removed = self.ledger.remove(student_id, university_id).await?;
        if removed {
            self.persist_counts(&mut student).await?;
        }
        Ok(removed)
    }

    pub async fn list_shortlist(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<ShortlistEntry>, JourneyError> {
        self.get_student(student_id).await?;
        self.ledger.entries(student_id).await
    }

    // ── Lock / unlock ───────────────────────────────────────────────

    /// Lock a shortlisted university and move to stage 4.
    pub async fn lock_university(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> Result<Student, JourneyError> {
        let _guard = self.locks.acquire(student_id).await;
        let mut student = self.get_student(student_id).await?;

        // Reject before touching the ledger.
        student.stage().apply(StageTrigger::UniversityLocked)?;
        self.ledger.lock(student_id, university_id).await?;

        student.transition(StageTrigger::UniversityLocked)?;
        self.db.save_student(&student).await?;
        Ok(student)
    }

    /// Unlock the locked university, drop its tasks and move back to
    /// stage 2.
    pub async fn unlock_university(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> Result<UnlockOutcome, JourneyError> {
        let _guard = self.locks.acquire(student_id).await;
        let mut student = self.get_student(student_id).await?;

        student.stage().apply(StageTrigger::UniversityUnlocked)?;
        let tasks_removed = self.ledger.unlock(student_id, university_id).await?;

        student.transition(StageTrigger::UniversityUnlocked)?;
        self.persist_counts(&mut student).await?;
        Ok(UnlockOutcome {
            student,
            tasks_removed,
        })
    }

    // ── Tasks and catalog ───────────────────────────────────────────

    pub async fn list_tasks(
        &self,
        student_id: Uuid,
        university_id: Option<Uuid>,
    ) -> Result<Vec<Task>, JourneyError> {
        self.get_student(student_id).await?;
        Ok(self.db.list_tasks(student_id, university_id).await?)
    }

    pub async fn list_universities(&self) -> Result<Vec<University>, JourneyError> {
        Ok(self.db.list_universities().await?)
    }

    // ── Counselling ─────────────────────────────────────────────────

    /// Generate advice and apply its actions. Advice generation never
    /// fails; per-action failures are reported in the outcome.
    pub async fn request_advice(&self, student_id: Uuid) -> Result<CounselOutcome, JourneyError> {
        let student = self.get_student(student_id).await?;
        if !student.profile_completed {
            return Err(JourneyError::InvalidState(
                "complete onboarding before requesting advice".to_string(),
            ));
        }

        // The remote call runs without holding the student's lock.
        let snapshot = self.snapshot(&student).await?;
        let (advice, source) = self.advisor.generate(&snapshot).await;

        let _guard = self.locks.acquire(student_id).await;
        let mut student = self.get_student(student_id).await?;
        let report = self.executor.apply(student_id, advice.actions.clone()).await;
        self.persist_counts(&mut student).await?;

        info!(
            %student_id,
            ?source,
            applied = report.applied.len(),
            failed = report.failed.len(),
            "Counselling request complete"
        );
        Ok(CounselOutcome {
            advice,
            source,
            applied: report.applied,
            failed: report.failed,
        })
    }

    async fn snapshot(&self, student: &Student) -> Result<ProfileSnapshot, JourneyError> {
        let entries = self.ledger.entries(student.id).await?;
        let locked_university = match entries.iter().find(|e| e.locked) {
            Some(entry) => self
                .db
                .get_university(entry.university_id)
                .await?
                .map(|u| u.name),
            None => None,
        };
        let candidates = self
            .db
            .list_universities()
            .await?
            .iter()
            .take(self.max_catalog_entries)
            .map(UniversitySummary::from)
            .collect();

        Ok(ProfileSnapshot {
            student_name: student.name.clone(),
            onboarding: student.onboarding.clone(),
            strength: student.profile.strength,
            stage: student.stage().presented(entries.len() as u32),
            shortlisted_count: entries.len() as u32,
            locked_university,
            candidates,
        })
    }

    async fn persist_counts(&self, student: &mut Student) -> Result<(), JourneyError> {
        student.profile.counts = self.ledger.recompute_counts(student.id).await?;
        student.touch();
        self.db.save_student(student).await?;
        Ok(())
    }
}
