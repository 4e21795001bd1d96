//! Action execution pipeline.
//!
//! Applies proposed actions one at a time, in order. A failing action is
//! recorded and skipped; earlier successes are never rolled back.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::advice::ProposedAction;
use crate::error::JourneyError;
use crate::shortlist::{ShortlistEntry, ShortlistLedger};
use crate::store::Database;
use crate::tasks::Task;

/// A successfully applied action.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppliedAction {
    TaskCreated { task: Task },
    Shortlisted { entry: ShortlistEntry },
}

/// An action that could not be applied, with the error kind.
#[derive(Debug, Clone, Serialize)]
pub struct FailedAction {
    pub action: ProposedAction,
    pub kind: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionReport {
    pub applied: Vec<AppliedAction>,
    pub failed: Vec<FailedAction>,
}

pub struct ActionExecutor {
    db: Arc<dyn Database>,
    ledger: Arc<ShortlistLedger>,
}

impl ActionExecutor {
    pub fn new(db: Arc<dyn Database>, ledger: Arc<ShortlistLedger>) -> Self {
        Self { db, ledger }
    }

    /// Apply `actions` for one student. Callers hold the student's lock.
    pub async fn apply(&self, student_id: Uuid, actions: Vec<ProposedAction>) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let total = actions.len();

        for action in actions {
            match self.apply_one(student_id, &action).await {
                Ok(applied) => report.applied.push(applied),
                Err(e) => {
                    warn!(
                        %student_id,
                        action = action.kind(),
                        error = %e,
                        "Skipping action"
                    );
                    report.failed.push(FailedAction {
                        kind: e.kind(),
                        reason: e.to_string(),
                        action,
                    });
                }
            }
        }

        debug!(
            %student_id,
            total,
            applied = report.applied.len(),
            failed = report.failed.len(),
            "Action batch applied"
        );
        report
    }

    async fn apply_one(
        &self,
        student_id: Uuid,
        action: &ProposedAction,
    ) -> Result<AppliedAction, JourneyError> {
        match action {
            ProposedAction::CreateTask {
                title,
                description,
                task_type,
                priority,
                due_date,
                university_id,
            } => {
                let title = title.trim();
                if title.is_empty() {
                    return Err(JourneyError::ValidationFailed {
                        reason: "task title is required".to_string(),
                    });
                }

                let mut task = Task::new(student_id, title, *task_type)
                    .with_priority(*priority)
                    .generated();
                if let Some(desc) = description.as_deref().filter(|d| !d.trim().is_empty()) {
                    task = task.with_description(desc);
                }
                if let Some(due) = due_date {
                    task = task.with_due_date(*due);
                }
                if let Some(uni) = university_id {
                    if self.db.get_university(*uni).await?.is_none() {
                        return Err(JourneyError::university_not_found(*uni));
                    }
                    task = task.for_university(*uni);
                }

                self.db.create_task(&task).await?;
                Ok(AppliedAction::TaskCreated { task })
            }
            ProposedAction::Shortlist {
                university_id,
                category,
            } => {
                let entry = self
                    .ledger
                    .add_or_update(student_id, *university_id, Some(*category))
                    .await?;
                Ok(AppliedAction::Shortlisted { entry })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortlist::Category;
    use crate::store::LibSqlBackend;
    use crate::students::Student;
    use crate::tasks::{TaskPriority, TaskType};
    use crate::universities::{Competitiveness, University};

    async fn setup() -> (ActionExecutor, Arc<dyn Database>, Uuid, Uuid) {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let student = Student::new("Asha", "asha@example.com");
        db.create_student(&student).await.unwrap();
        let uni = University::new("Toronto", "Canada", 30_000, Competitiveness::High);
        db.insert_university(&uni).await.unwrap();
        let ledger = Arc::new(ShortlistLedger::new(db.clone()));
        (ActionExecutor::new(db.clone(), ledger), db, student.id, uni.id)
    }

    fn create_task(title: &str, university_id: Option<Uuid>) -> ProposedAction {
        ProposedAction::CreateTask {
            title: title.to_string(),
            description: None,
            task_type: TaskType::Sop,
            priority: TaskPriority::High,
            due_date: None,
            university_id,
        }
    }

    #[tokio::test]
    async fn applies_tasks_and_shortlists() {
        let (executor, db, student, uni) = setup().await;
        let report = executor
            .apply(
                student,
                vec![
                    create_task("Draft SOP", Some(uni)),
                    ProposedAction::Shortlist {
                        university_id: uni,
                        category: Category::Dream,
                    },
                ],
            )
            .await;

        assert_eq!(report.applied.len(), 2);
        assert!(report.failed.is_empty());

        let tasks = db.list_tasks(student, Some(uni)).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].generated_by_ai);
        let entry = db.get_shortlist_entry(student, uni).await.unwrap().unwrap();
        assert_eq!(entry.category, Category::Dream);
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        let (executor, db, student, uni) = setup().await;
        let ghost = Uuid::new_v4();
        let report = executor
            .apply(
                student,
                vec![
                    create_task("First", None),
                    ProposedAction::Shortlist {
                        university_id: ghost,
                        category: Category::Safe,
                    },
                    create_task("   ", None),
                    create_task("Ghost form", Some(ghost)),
                    create_task("Last", Some(uni)),
                ],
            )
            .await;

        assert_eq!(report.applied.len(), 2);
        let kinds: Vec<_> = report.failed.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec!["not_found", "validation_failed", "not_found"]);

        let titles: Vec<_> = db
            .list_tasks(student, None)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["First", "Last"]);
        assert!(db.list_shortlist(student).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let (executor, _db, student, _) = setup().await;
        let report = executor.apply(student, Vec::new()).await;
        assert!(report.applied.is_empty());
        assert!(report.failed.is_empty());
    }
}
