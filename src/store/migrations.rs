//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks
//! the current version and applies only the new ones sequentially.

use libsql::Connection;

use crate::error::DatabaseError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS students (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                onboarding TEXT NOT NULL DEFAULT '{}',
                profile_completed INTEGER NOT NULL DEFAULT 0,
                stage INTEGER NOT NULL DEFAULT 1,
                profile_strength INTEGER NOT NULL DEFAULT 0,
                dream_count INTEGER NOT NULL DEFAULT 0,
                target_count INTEGER NOT NULL DEFAULT 0,
                safe_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS universities (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                country TEXT NOT NULL,
                degree_types TEXT NOT NULL DEFAULT '[]',
                avg_cost INTEGER NOT NULL,
                competitiveness TEXT NOT NULL,
                min_gpa REAL NOT NULL,
                exam_requirements TEXT NOT NULL DEFAULT '[]',
                description TEXT,
                ranking INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_universities_country ON universities(country);

            CREATE TABLE IF NOT EXISTS shortlists (
                student_id TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
                university_id TEXT NOT NULL REFERENCES universities(id),
                category TEXT NOT NULL DEFAULT 'target',
                locked INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (student_id, university_id)
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_shortlists_one_locked
                ON shortlists(student_id) WHERE locked = 1;

            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                student_id TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
                university_id TEXT,
                title TEXT NOT NULL,
                description TEXT,
                task_type TEXT NOT NULL DEFAULT 'general',
                priority TEXT NOT NULL DEFAULT 'medium',
                due_date TEXT,
                completed INTEGER NOT NULL DEFAULT 0,
                generated_by_ai INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_student ON tasks(student_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_student_university
                ON tasks(student_id, university_id);
        "#,
    },
];

/// Apply all pending migrations.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to create _migrations table: {e}")))?;

    let current_version = get_current_version(conn).await?;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            conn.execute_batch(migration.sql).await.map_err(|e| {
                DatabaseError::Migration(format!(
                    "Migration V{} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;
            seed_version(conn, migration.version, migration.name).await?;
        }
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        let version = get_current_version(conn).await?;
        tracing::debug!(version, "Database migrations complete");
    }
    Ok(())
}

/// Highest applied migration version, or 0 if none.
async fn get_current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to query migration version: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read migration version: {e}")))?;

    match row {
        Some(row) => row.get::<i64>(0).map_err(|e| {
            DatabaseError::Migration(format!("Failed to parse migration version: {e}"))
        }),
        None => Ok(0),
    }
}

async fn seed_version(conn: &Connection, version: i64, name: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![version, name],
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to record migration V{version}: {e}")))?;
    Ok(())
}
