//! Schema migrations
//!
//! Versions are applied in order, each in its own transaction together with
//! its `schema_migrations` row. Databases created before versioning (a bare
//! `questions` table) are adopted: the `IF NOT EXISTS` DDL leaves them intact.

use rusqlite::{params, Connection, OptionalExtension};

use crate::storage::{StorageError, StorageResult};

/// One schema step
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "questions table",
        sql: "CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subject TEXT NOT NULL DEFAULT 'General',
                question_text TEXT NOT NULL UNIQUE,
                option_a TEXT NOT NULL DEFAULT '',
                option_b TEXT NOT NULL DEFAULT '',
                option_c TEXT NOT NULL DEFAULT '',
                option_d TEXT NOT NULL DEFAULT '',
                correct_answer TEXT NOT NULL,
                recall_score REAL NOT NULL DEFAULT 0.0,
                review_count INTEGER NOT NULL DEFAULT 0,
                last_reviewed_at TEXT
            );",
    },
    Migration {
        version: 2,
        name: "selection indexes",
        sql: "CREATE INDEX IF NOT EXISTS idx_questions_subject_progress
                ON questions(subject, review_count, recall_score);
              CREATE INDEX IF NOT EXISTS idx_questions_progress
                ON questions(review_count, recall_score);",
    },
];

/// Latest schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

const LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);";

/// Highest applied version, 0 for an unversioned database
pub fn schema_version(conn: &Connection) -> StorageResult<i32> {
    let has_ledger = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !has_ledger {
        return Ok(0);
    }

    let version = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| {
        row.get(0)
    })?;
    Ok(version)
}

/// Apply every pending migration, returning the resulting schema version
pub fn run_migrations(conn: &Connection) -> StorageResult<i32> {
    conn.execute_batch(LEDGER_DDL)
        .map_err(|e| StorageError::Migration(format!("schema_migrations: {e}")))?;

    let mut version = schema_version(conn)?;
    let start = version;
    for migration in MIGRATIONS.iter().filter(|m| m.version > start) {
        apply(conn, migration)?;
        version = migration.version;
    }

    Ok(version)
}

fn apply(conn: &Connection, migration: &Migration) -> StorageResult<()> {
    tracing::info!(version = migration.version, name = migration.name, "applying migration");

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql).map_err(|e| {
        tracing::error!(version = migration.version, error = %e, "migration failed");
        StorageError::Migration(format!("v{} ({}): {e}", migration.version, migration.name))
    })?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            > 0
    }

    #[test]
    fn test_latest_version_matches_list() {
        assert_eq!(MIGRATIONS.last().map(|m| m.version), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_fresh_database() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);
        assert_eq!(run_migrations(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
        assert!(table_exists(&conn, "questions"));
        assert!(table_exists(&conn, "idx_questions_subject_progress"));
    }

    #[test]
    fn test_second_run_applies_nothing() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), CURRENT_SCHEMA_VERSION);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_unversioned_table_is_adopted() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subject TEXT,
                question_text TEXT UNIQUE,
                option_a TEXT, option_b TEXT, option_c TEXT, option_d TEXT,
                correct_answer TEXT,
                recall_score REAL DEFAULT 0.0,
                review_count INTEGER DEFAULT 0,
                last_reviewed_at TIMESTAMP
            );
            INSERT INTO questions (subject, question_text, correct_answer) VALUES ('Law', 'Q', 'A');",
        )
        .unwrap();

        assert_eq!(run_migrations(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
        let kept: i64 = conn.query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0)).unwrap();
        assert_eq!(kept, 1);
    }
}
