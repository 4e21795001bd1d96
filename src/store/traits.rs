//! `Database` trait: single async interface for all persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::shortlist::{Category, ShortlistEntry};
use crate::students::Student;
use crate::tasks::Task;
use crate::universities::University;

/// Backend-agnostic database trait covering students, the university
/// catalog, shortlists and tasks.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Students ────────────────────────────────────────────────────

    async fn create_student(&self, student: &Student) -> Result<(), DatabaseError>;

    async fn get_student(&self, id: Uuid) -> Result<Option<Student>, DatabaseError>;

    /// Look up a student by (normalized) email.
    async fn get_student_by_email(&self, email: &str) -> Result<Option<Student>, DatabaseError>;

    /// Overwrite the mutable fields of an existing student.
    async fn save_student(&self, student: &Student) -> Result<(), DatabaseError>;

    // ── Universities ────────────────────────────────────────────────

    async fn insert_university(&self, university: &University) -> Result<(), DatabaseError>;

    async fn get_university(&self, id: Uuid) -> Result<Option<University>, DatabaseError>;

    /// All universities, best ranked first.
    async fn list_universities(&self) -> Result<Vec<University>, DatabaseError>;

    // ── Shortlist ───────────────────────────────────────────────────

    async fn get_shortlist_entry(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> Result<Option<ShortlistEntry>, DatabaseError>;

    /// Insert an unlocked entry, or update the category of an existing one.
    /// Never changes `locked`.
    async fn upsert_shortlist_entry(
        &self,
        student_id: Uuid,
        university_id: Uuid,
        category: Category,
    ) -> Result<ShortlistEntry, DatabaseError>;

    /// Delete an entry. Returns whether a row existed.
    async fn delete_shortlist_entry(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> Result<bool, DatabaseError>;

    async fn list_shortlist(&self, student_id: Uuid) -> Result<Vec<ShortlistEntry>, DatabaseError>;

    /// The student's locked entry, if any.
    async fn locked_entry(&self, student_id: Uuid) -> Result<Option<ShortlistEntry>, DatabaseError>;

    /// Atomically lock an entry if the student has no locked entry yet.
    /// Returns `false` when another entry won the race or is already locked.
    async fn try_lock_entry(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> Result<bool, DatabaseError>;

    /// Clear the lock flag and delete the student's tasks for that
    /// university in one transaction. Returns the number of tasks removed,
    /// or `None` if the entry was not locked.
    async fn unlock_entry_and_clear_tasks(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> Result<Option<u64>, DatabaseError>;

    // ── Tasks ───────────────────────────────────────────────────────

    async fn create_task(&self, task: &Task) -> Result<(), DatabaseError>;

    /// Tasks for a student, optionally only those scoped to one university.
    async fn list_tasks(
        &self,
        student_id: Uuid,
        university_id: Option<Uuid>,
    ) -> Result<Vec<Task>, DatabaseError>;
}
