//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases over a single shared
//! connection. Multi-statement writes take `write_gate` so that no other
//! statement interleaves with an open transaction on that connection.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::shortlist::{Category, ShortlistCounts, ShortlistEntry};
use crate::store::migrations;
use crate::store::traits::Database;
use crate::students::{Onboarding, ProfileSummary, Stage, Student};
use crate::tasks::{Task, TaskPriority, TaskType};
use crate::universities::{Competitiveness, University};

/// libSQL database backend.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    write_gate: Mutex<()>,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            write_gate: Mutex::new(()),
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

fn opt_integer(n: Option<i64>) -> libsql::Value {
    match n {
        Some(n) => libsql::Value::Integer(n),
        None => libsql::Value::Null,
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::Serialization(format!("bad uuid '{s}': {e}")))
}

fn parse_enum<T>(s: &str) -> Result<T, DatabaseError>
where
    T: std::str::FromStr<Err = String>,
{
    s.parse().map_err(DatabaseError::Serialization)
}

fn row_err(op: &str) -> impl Fn(libsql::Error) -> DatabaseError + '_ {
    move |e| DatabaseError::Query(format!("{op} row parse: {e}"))
}

fn is_unique_violation(e: &libsql::Error) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}

const STUDENT_COLUMNS: &str = "id, name, email, onboarding, profile_completed, stage, \
     profile_strength, dream_count, target_count, safe_count, created_at, updated_at";

fn row_to_student(row: &libsql::Row) -> Result<Student, DatabaseError> {
    let err = row_err("student");
    let id: String = row.get(0).map_err(&err)?;
    let onboarding: String = row.get(3).map_err(&err)?;
    let stage: i64 = row.get(5).map_err(&err)?;
    let stage = u8::try_from(stage)
        .ok()
        .and_then(Stage::from_number)
        .ok_or_else(|| DatabaseError::Serialization(format!("invalid stage {stage}")))?;
    let count = |idx: i32| -> Result<u32, DatabaseError> {
        let n: i64 = row.get(idx).map_err(&err)?;
        Ok(u32::try_from(n).unwrap_or(0))
    };
    let strength: i64 = row.get(6).map_err(&err)?;
    let created: String = row.get(10).map_err(&err)?;
    let updated: String = row.get(11).map_err(&err)?;

    Ok(Student::from_parts(
        parse_uuid(&id)?,
        row.get(1).map_err(&err)?,
        row.get(2).map_err(&err)?,
        from_json::<Onboarding>(&onboarding)?,
        row.get::<i64>(4).map_err(&err)? != 0,
        stage,
        ProfileSummary {
            strength: u8::try_from(strength.clamp(0, 100)).unwrap_or(0),
            counts: ShortlistCounts {
                dream: count(7)?,
                target: count(8)?,
                safe: count(9)?,
            },
        },
        parse_datetime(&created),
        parse_datetime(&updated),
    ))
}

const UNIVERSITY_COLUMNS: &str = "id, name, country, degree_types, avg_cost, competitiveness, \
     min_gpa, exam_requirements, description, ranking";

fn row_to_university(row: &libsql::Row) -> Result<University, DatabaseError> {
    let err = row_err("university");
    let id: String = row.get(0).map_err(&err)?;
    let degree_types: String = row.get(3).map_err(&err)?;
    let avg_cost: i64 = row.get(4).map_err(&err)?;
    let competitiveness: String = row.get(5).map_err(&err)?;
    let exams: String = row.get(7).map_err(&err)?;

    Ok(University {
        id: parse_uuid(&id)?,
        name: row.get(1).map_err(&err)?,
        country: row.get(2).map_err(&err)?,
        degree_types: from_json(&degree_types)?,
        avg_cost: u64::try_from(avg_cost).unwrap_or(0),
        competitiveness: parse_enum::<Competitiveness>(&competitiveness)?,
        min_gpa: row.get(6).map_err(&err)?,
        exam_requirements: from_json(&exams)?,
        description: row.get::<String>(8).ok(),
        ranking: row
            .get::<i64>(9)
            .ok()
            .and_then(|r| u32::try_from(r).ok()),
    })
}

const SHORTLIST_COLUMNS: &str =
    "student_id, university_id, category, locked, created_at, updated_at";

fn row_to_entry(row: &libsql::Row) -> Result<ShortlistEntry, DatabaseError> {
    let err = row_err("shortlist");
    let student_id: String = row.get(0).map_err(&err)?;
    let university_id: String = row.get(1).map_err(&err)?;
    let category: String = row.get(2).map_err(&err)?;
    let created: String = row.get(4).map_err(&err)?;
    let updated: String = row.get(5).map_err(&err)?;

    Ok(ShortlistEntry {
        student_id: parse_uuid(&student_id)?,
        university_id: parse_uuid(&university_id)?,
        category: parse_enum::<Category>(&category)?,
        locked: row.get::<i64>(3).map_err(&err)? != 0,
        created_at: parse_datetime(&created),
        updated_at: parse_datetime(&updated),
    })
}

const TASK_COLUMNS: &str = "id, student_id, university_id, title, description, task_type, \
     priority, due_date, completed, generated_by_ai, created_at, updated_at";

fn row_to_task(row: &libsql::Row) -> Result<Task, DatabaseError> {
    let err = row_err("task");
    let id: String = row.get(0).map_err(&err)?;
    let student_id: String = row.get(1).map_err(&err)?;
    let university_id = match row.get::<String>(2).ok() {
        Some(s) => Some(parse_uuid(&s)?),
        None => None,
    };
    let task_type: String = row.get(5).map_err(&err)?;
    let priority: String = row.get(6).map_err(&err)?;
    let due_date = row
        .get::<String>(7)
        .ok()
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok());
    let created: String = row.get(10).map_err(&err)?;
    let updated: String = row.get(11).map_err(&err)?;

    Ok(Task {
        id: parse_uuid(&id)?,
        student_id: parse_uuid(&student_id)?,
        university_id,
        title: row.get(3).map_err(&err)?,
        description: row.get::<String>(4).ok(),
        task_type: parse_enum::<TaskType>(&task_type)?,
        priority: parse_enum::<TaskPriority>(&priority)?,
        due_date,
        completed: row.get::<i64>(8).map_err(&err)? != 0,
        generated_by_ai: row.get::<i64>(9).map_err(&err)? != 0,
        created_at: parse_datetime(&created),
        updated_at: parse_datetime(&updated),
    })
}

impl LibSqlBackend {
    async fn query_one<T>(
        &self,
        op: &str,
        sql: &str,
        params: impl libsql::params::IntoParams,
        map: fn(&libsql::Row) -> Result<T, DatabaseError>,
    ) -> Result<Option<T>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::Query(format!("{op}: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => map(&row).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("{op}: {e}"))),
        }
    }

    async fn query_all<T>(
        &self,
        op: &str,
        sql: &str,
        params: impl libsql::params::IntoParams,
        map: fn(&libsql::Row) -> Result<T, DatabaseError>,
    ) -> Result<Vec<T>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::Query(format!("{op}: {e}")))?;

        let mut out = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => out.push(map(&row)?),
                Ok(None) => break,
                Err(e) => return Err(DatabaseError::Query(format!("{op}: {e}"))),
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Students ────────────────────────────────────────────────────

    async fn create_student(&self, student: &Student) -> Result<(), DatabaseError> {
        let _gate = self.write_gate.lock().await;
        let counts = student.profile.counts;
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO students ({STUDENT_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                params![
                    student.id.to_string(),
                    student.name.as_str(),
                    student.email.as_str(),
                    to_json(&student.onboarding)?,
                    i64::from(student.profile_completed),
                    i64::from(student.stage().number()),
                    i64::from(student.profile.strength),
                    i64::from(counts.dream),
                    i64::from(counts.target),
                    i64::from(counts.safe),
                    student.created_at.to_rfc3339(),
                    student.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DatabaseError::Constraint(format!(
                        "email already registered: {}",
                        student.email
                    ))
                } else {
                    DatabaseError::Query(format!("create_student: {e}"))
                }
            })?;

        debug!(student_id = %student.id, "Student inserted");
        Ok(())
    }

    async fn get_student(&self, id: Uuid) -> Result<Option<Student>, DatabaseError> {
        self.query_one(
            "get_student",
            &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"),
            params![id.to_string()],
            row_to_student,
        )
        .await
    }

    async fn get_student_by_email(&self, email: &str) -> Result<Option<Student>, DatabaseError> {
        self.query_one(
            "get_student_by_email",
            &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE email = ?1"),
            params![email.trim().to_lowercase()],
            row_to_student,
        )
        .await
    }

    async fn save_student(&self, student: &Student) -> Result<(), DatabaseError> {
        let _gate = self.write_gate.lock().await;
        let counts = student.profile.counts;
        let updated = self
            .conn()
            .execute(
                "UPDATE students SET name = ?1, onboarding = ?2, profile_completed = ?3, \
                 stage = ?4, profile_strength = ?5, dream_count = ?6, target_count = ?7, \
                 safe_count = ?8, updated_at = ?9 WHERE id = ?10",
                params![
                    student.name.as_str(),
                    to_json(&student.onboarding)?,
                    i64::from(student.profile_completed),
                    i64::from(student.stage().number()),
                    i64::from(student.profile.strength),
                    i64::from(counts.dream),
                    i64::from(counts.target),
                    i64::from(counts.safe),
                    student.updated_at.to_rfc3339(),
                    student.id.to_string(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_student: {e}")))?;

        if updated == 0 {
            return Err(DatabaseError::Query(format!(
                "save_student: no student with id {}",
                student.id
            )));
        }
        Ok(())
    }

    // ── Universities ────────────────────────────────────────────────

    async fn insert_university(&self, university: &University) -> Result<(), DatabaseError> {
        let _gate = self.write_gate.lock().await;
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO universities ({UNIVERSITY_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                ),
                params![
                    university.id.to_string(),
                    university.name.as_str(),
                    university.country.as_str(),
                    to_json(&university.degree_types)?,
                    i64::try_from(university.avg_cost).unwrap_or(i64::MAX),
                    university.competitiveness.as_str(),
                    university.min_gpa,
                    to_json(&university.exam_requirements)?,
                    opt_text(university.description.as_deref()),
                    opt_integer(university.ranking.map(i64::from)),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_university: {e}")))?;
        Ok(())
    }

    async fn get_university(&self, id: Uuid) -> Result<Option<University>, DatabaseError> {
        self.query_one(
            "get_university",
            &format!("SELECT {UNIVERSITY_COLUMNS} FROM universities WHERE id = ?1"),
            params![id.to_string()],
            row_to_university,
        )
        .await
    }

    async fn list_universities(&self) -> Result<Vec<University>, DatabaseError> {
        self.query_all(
            "list_universities",
            &format!(
                "SELECT {UNIVERSITY_COLUMNS} FROM universities \
                 ORDER BY ranking IS NULL, ranking, name"
            ),
            (),
            row_to_university,
        )
        .await
    }

    // ── Shortlist ───────────────────────────────────────────────────

    async fn get_shortlist_entry(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> Result<Option<ShortlistEntry>, DatabaseError> {
        self.query_one(
            "get_shortlist_entry",
            &format!(
                "SELECT {SHORTLIST_COLUMNS} FROM shortlists \
                 WHERE student_id = ?1 AND university_id = ?2"
            ),
            params![student_id.to_string(), university_id.to_string()],
            row_to_entry,
        )
        .await
    }

    async fn upsert_shortlist_entry(
        &self,
        student_id: Uuid,
        university_id: Uuid,
        category: Category,
    ) -> Result<ShortlistEntry, DatabaseError> {
        {
            let _gate = self.write_gate.lock().await;
            let now = Utc::now().to_rfc3339();
            self.conn()
                .execute(
                    "INSERT INTO shortlists (student_id, university_id, category, locked, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, 0, ?4, ?4) \
                     ON CONFLICT (student_id, university_id) \
                     DO UPDATE SET category = excluded.category, updated_at = excluded.updated_at",
                    params![
                        student_id.to_string(),
                        university_id.to_string(),
                        category.as_str(),
                        now
                    ],
                )
                .await
                .map_err(|e| DatabaseError::Query(format!("upsert_shortlist_entry: {e}")))?;
        }

        self.get_shortlist_entry(student_id, university_id)
            .await?
            .ok_or_else(|| {
                DatabaseError::Query("upsert_shortlist_entry: row missing after write".into())
            })
    }

    async fn delete_shortlist_entry(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let _gate = self.write_gate.lock().await;
        let deleted = self
            .conn()
            .execute(
                "DELETE FROM shortlists WHERE student_id = ?1 AND university_id = ?2",
                params![student_id.to_string(), university_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_shortlist_entry: {e}")))?;
        Ok(deleted > 0)
    }

    async fn list_shortlist(&self, student_id: Uuid) -> Result<Vec<ShortlistEntry>, DatabaseError> {
        self.query_all(
            "list_shortlist",
            &format!(
                "SELECT {SHORTLIST_COLUMNS} FROM shortlists \
                 WHERE student_id = ?1 ORDER BY created_at"
            ),
            params![student_id.to_string()],
            row_to_entry,
        )
        .await
    }

    async fn locked_entry(
        &self,
        student_id: Uuid,
    ) -> Result<Option<ShortlistEntry>, DatabaseError> {
        self.query_one(
            "locked_entry",
            &format!(
                "SELECT {SHORTLIST_COLUMNS} FROM shortlists \
                 WHERE student_id = ?1 AND locked = 1"
            ),
            params![student_id.to_string()],
            row_to_entry,
        )
        .await
    }

    async fn try_lock_entry(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let _gate = self.write_gate.lock().await;
        let result = self
            .conn()
            .execute(
                "UPDATE shortlists SET locked = 1, updated_at = ?3 \
                 WHERE student_id = ?1 AND university_id = ?2 AND locked = 0 \
                 AND NOT EXISTS (SELECT 1 FROM shortlists WHERE student_id = ?1 AND locked = 1)",
                params![
                    student_id.to_string(),
                    university_id.to_string(),
                    Utc::now().to_rfc3339()
                ],
            )
            .await;

        match result {
            Ok(changed) => Ok(changed == 1),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(DatabaseError::Query(format!("try_lock_entry: {e}"))),
        }
    }

    async fn unlock_entry_and_clear_tasks(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> Result<Option<u64>, DatabaseError> {
        let _gate = self.write_gate.lock().await;
        let tx = self
            .conn()
            .transaction()
            .await
            .map_err(|e| DatabaseError::Query(format!("unlock begin: {e}")))?;

        let unlocked = tx
            .execute(
                "UPDATE shortlists SET locked = 0, updated_at = ?3 \
                 WHERE student_id = ?1 AND university_id = ?2 AND locked = 1",
                params![
                    student_id.to_string(),
                    university_id.to_string(),
                    Utc::now().to_rfc3339()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("unlock entry: {e}")))?;

        if unlocked == 0 {
            tx.rollback()
                .await
                .map_err(|e| DatabaseError::Query(format!("unlock rollback: {e}")))?;
            return Ok(None);
        }

        let removed = tx
            .execute(
                "DELETE FROM tasks WHERE student_id = ?1 AND university_id = ?2",
                params![student_id.to_string(), university_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("unlock clear tasks: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Query(format!("unlock commit: {e}")))?;

        debug!(%student_id, %university_id, removed, "Entry unlocked, tasks cleared");
        Ok(Some(removed))
    }

    // ── Tasks ───────────────────────────────────────────────────────

    async fn create_task(&self, task: &Task) -> Result<(), DatabaseError> {
        let _gate = self.write_gate.lock().await;
        let university_id = task.university_id.map(|u| u.to_string());
        let due_date = task.due_date.map(|d| d.format("%Y-%m-%d").to_string());
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO tasks ({TASK_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                ),
                params![
                    task.id.to_string(),
                    task.student_id.to_string(),
                    opt_text(university_id.as_deref()),
                    task.title.as_str(),
                    opt_text(task.description.as_deref()),
                    task.task_type.as_str(),
                    task.priority.as_str(),
                    opt_text(due_date.as_deref()),
                    i64::from(task.completed),
                    i64::from(task.generated_by_ai),
                    task.created_at.to_rfc3339(),
                    task.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_task: {e}")))?;

        debug!(task_id = %task.id, student_id = %task.student_id, "Task inserted");
        Ok(())
    }

    async fn list_tasks(
        &self,
        student_id: Uuid,
        university_id: Option<Uuid>,
    ) -> Result<Vec<Task>, DatabaseError> {
        match university_id {
            Some(uni) => {
                self.query_all(
                    "list_tasks",
                    &format!(
                        "SELECT {TASK_COLUMNS} FROM tasks \
                         WHERE student_id = ?1 AND university_id = ?2 ORDER BY created_at"
                    ),
                    params![student_id.to_string(), uni.to_string()],
                    row_to_task,
                )
                .await
            }
            None => {
                self.query_all(
                    "list_tasks",
                    &format!(
                        "SELECT {TASK_COLUMNS} FROM tasks WHERE student_id = ?1 ORDER BY created_at"
                    ),
                    params![student_id.to_string()],
                    row_to_task,
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::students::StageTrigger;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn make_university(name: &str) -> University {
        University::new(name, "Canada", 30_000, Competitiveness::High)
            .with_min_gpa(3.4)
            .with_exam_requirements(&["IELTS"])
            .with_ranking(21)
    }

    async fn seeded(db: &LibSqlBackend) -> (Student, University, University) {
        let student = Student::new("Asha", "asha@example.com");
        db.create_student(&student).await.unwrap();
        let a = make_university("Toronto");
        let b = make_university("UBC");
        db.insert_university(&a).await.unwrap();
        db.insert_university(&b).await.unwrap();
        (student, a, b)
    }

    // ── Student tests ───────────────────────────────────────────────

    #[tokio::test]
    async fn student_round_trip() {
        let db = test_db().await;
        let mut student = Student::new("Asha", "Asha@Example.com");
        db.create_student(&student).await.unwrap();

        student.onboarding.academic.major = Some("Physics".into());
        student.profile_completed = true;
        student.profile.strength = 45;
        student.profile.counts.dream = 2;
        student.transition(StageTrigger::OnboardingCompleted).unwrap();
        db.save_student(&student).await.unwrap();

        let fetched = db.get_student(student.id).await.unwrap().unwrap();
        assert_eq!(fetched.stage(), Stage::DiscoveringUniversities);
        assert_eq!(fetched.onboarding.academic.major.as_deref(), Some("Physics"));
        assert!(fetched.profile_completed);
        assert_eq!(fetched.profile.strength, 45);
        assert_eq!(fetched.profile.counts.dream, 2);

        let by_email = db.get_student_by_email(" ASHA@example.com").await.unwrap();
        assert_eq!(by_email.map(|s| s.id), Some(student.id));
    }

    #[tokio::test]
    async fn duplicate_email_is_constraint_error() {
        let db = test_db().await;
        db.create_student(&Student::new("A", "a@x.io")).await.unwrap();
        let err = db
            .create_student(&Student::new("B", "a@x.io"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Constraint(_)));
    }

    #[tokio::test]
    async fn missing_student_is_none() {
        let db = test_db().await;
        assert!(db.get_student(Uuid::new_v4()).await.unwrap().is_none());
    }

    // ── University tests ────────────────────────────────────────────

    #[tokio::test]
    async fn university_round_trip() {
        let db = test_db().await;
        let uni = make_university("Toronto").with_description("Top Canadian research university");
        db.insert_university(&uni).await.unwrap();

        let fetched = db.get_university(uni.id).await.unwrap().unwrap();
        assert_eq!(fetched, uni);
    }

    #[tokio::test]
    async fn universities_listed_by_ranking() {
        let db = test_db().await;
        let low = make_university("Low").with_ranking(90);
        let top = make_university("Top").with_ranking(2);
        let mut unranked = make_university("Unranked");
        unranked.ranking = None;
        for u in [&low, &unranked, &top] {
            db.insert_university(u).await.unwrap();
        }
        let names: Vec<_> = db
            .list_universities()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["Top", "Low", "Unranked"]);
    }

    // ── Shortlist tests ─────────────────────────────────────────────

    #[tokio::test]
    async fn upsert_updates_category_and_keeps_lock() {
        let db = test_db().await;
        let (student, a, _) = seeded(&db).await;

        db.upsert_shortlist_entry(student.id, a.id, Category::Dream)
            .await
            .unwrap();
        assert!(db.try_lock_entry(student.id, a.id).await.unwrap());

        let entry = db
            .upsert_shortlist_entry(student.id, a.id, Category::Safe)
            .await
            .unwrap();
        assert_eq!(entry.category, Category::Safe);
        assert!(entry.locked);
        assert_eq!(db.list_shortlist(student.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn only_one_entry_can_be_locked() {
        let db = test_db().await;
        let (student, a, b) = seeded(&db).await;
        db.upsert_shortlist_entry(student.id, a.id, Category::Target)
            .await
            .unwrap();
        db.upsert_shortlist_entry(student.id, b.id, Category::Target)
            .await
            .unwrap();

        assert!(db.try_lock_entry(student.id, a.id).await.unwrap());
        assert!(!db.try_lock_entry(student.id, b.id).await.unwrap());
        assert!(!db.try_lock_entry(student.id, a.id).await.unwrap());

        let locked = db.locked_entry(student.id).await.unwrap().unwrap();
        assert_eq!(locked.university_id, a.id);
    }

    #[tokio::test]
    async fn lock_requires_existing_entry() {
        let db = test_db().await;
        let (student, a, _) = seeded(&db).await;
        assert!(!db.try_lock_entry(student.id, a.id).await.unwrap());
    }

    #[tokio::test]
    async fn unlock_clears_only_that_universitys_tasks() {
        let db = test_db().await;
        let (student, a, b) = seeded(&db).await;
        db.upsert_shortlist_entry(student.id, a.id, Category::Target)
            .await
            .unwrap();
        db.try_lock_entry(student.id, a.id).await.unwrap();

        for task in [
            Task::new(student.id, "SOP for A", TaskType::Sop).for_university(a.id),
            Task::new(student.id, "Form for A", TaskType::Form).for_university(a.id),
            Task::new(student.id, "Form for B", TaskType::Form).for_university(b.id),
            Task::new(student.id, "Book IELTS", TaskType::Exam),
        ] {
            db.create_task(&task).await.unwrap();
        }

        let removed = db
            .unlock_entry_and_clear_tasks(student.id, a.id)
            .await
            .unwrap();
        assert_eq!(removed, Some(2));

        let remaining = db.list_tasks(student.id, None).await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|t| t.university_id != Some(a.id)));
        assert!(db.locked_entry(student.id).await.unwrap().is_none());

        // Second unlock finds nothing locked.
        assert_eq!(
            db.unlock_entry_and_clear_tasks(student.id, a.id)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn delete_entry_reports_existence() {
        let db = test_db().await;
        let (student, a, _) = seeded(&db).await;
        db.upsert_shortlist_entry(student.id, a.id, Category::Safe)
            .await
            .unwrap();
        assert!(db.delete_shortlist_entry(student.id, a.id).await.unwrap());
        assert!(!db.delete_shortlist_entry(student.id, a.id).await.unwrap());
    }

    // ── Task tests ──────────────────────────────────────────────────

    #[tokio::test]
    async fn task_round_trip_and_filter() {
        let db = test_db().await;
        let (student, a, _) = seeded(&db).await;
        let due = NaiveDate::from_ymd_opt(2027, 3, 1).unwrap();
        let task = Task::new(student.id, "Draft SOP", TaskType::Sop)
            .with_priority(TaskPriority::High)
            .with_due_date(due)
            .for_university(a.id)
            .generated();
        db.create_task(&task).await.unwrap();
        db.create_task(&Task::new(student.id, "Passport", TaskType::Document))
            .await
            .unwrap();

        let scoped = db.list_tasks(student.id, Some(a.id)).await.unwrap();
        assert_eq!(scoped.len(), 1);
        let fetched = &scoped[0];
        assert_eq!(fetched.id, task.id);
        assert_eq!(fetched.due_date, Some(due));
        assert_eq!(fetched.priority, TaskPriority::High);
        assert!(fetched.generated_by_ai);

        assert_eq!(db.list_tasks(student.id, None).await.unwrap().len(), 2);
    }
}
