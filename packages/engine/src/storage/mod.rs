//! SQLite item store and model blob storage
//!
//! - `questions` table holding ingested items and their review progress
//! - versioned schema migrations
//! - durable blob storage for the recall model

// ============================================================
// Submodules
// ============================================================

pub mod blob;
pub mod item;
pub mod migrations;
pub mod models;

// ============================================================
// Re-exports
// ============================================================

pub use blob::{FileBlobStore, MemoryBlobStore, ModelBlobStore};
pub use item::{ItemRepository, ReviewFilter};
pub use migrations::run_migrations;
pub use models::*;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

// ============================================================
// Errors
// ============================================================

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("invalid item: {0}")]
    InvalidItem(#[from] ItemError),

    #[error("failed to acquire connection lock: {0}")]
    LockError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================
// DatabaseManager
// ============================================================

/// Owns the SQLite connection shared by the repositories
pub struct DatabaseManager {
    connection: Arc<Mutex<Connection>>,
    db_path: String,
}

impl DatabaseManager {
    /// Open (creating if needed) the database file and run migrations.
    ///
    /// Enables WAL journaling; the parent directory is created when missing.
    pub fn new<P: AsRef<Path>>(db_path: P) -> StorageResult<Self> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Migration(format!("cannot create {}: {e}", parent.display())))?;
        }

        let connection = Connection::open(path)?;
        connection.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;

        Self::with_connection(connection, path.to_string_lossy().to_string())
    }

    /// In-memory database, used by tests
    pub fn in_memory() -> StorageResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::with_connection(connection, ":memory:".to_string())
    }

    fn with_connection(connection: Connection, db_path: String) -> StorageResult<Self> {
        let version = run_migrations(&connection)?;
        tracing::debug!(db_path = %db_path, version, "item store ready");

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            db_path,
        })
    }

    /// Shared handle to the connection
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.connection)
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    pub fn item_repository(&self) -> ItemRepository {
        ItemRepository::new(self.connection())
    }
}
