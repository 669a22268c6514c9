//! Item repository
//!
//! Reads candidate pools for session selection and applies review outcomes.
//! Rows are created by ingestion (`insert_items`) and never deleted here.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::storage::models::{format_datetime, AppliedReview, Item, NewItem, ReviewSnapshot};
use crate::storage::{StorageError, StorageResult};

const ITEM_COLUMNS: &str = "id, subject, question_text, option_a, option_b, option_c, option_d, \
     correct_answer, recall_score, review_count, last_reviewed_at";

/// Which items a pool query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFilter {
    /// `review_count > 0`
    Reviewed,
    /// `review_count = 0`
    Unreviewed,
    Any,
}

impl ReviewFilter {
    fn clause(&self) -> &'static str {
        match self {
            Self::Reviewed => "review_count > 0",
            Self::Unreviewed => "review_count = 0",
            Self::Any => "1 = 1",
        }
    }
}

pub struct ItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ItemRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    // ========== Ingestion side ==========

    /// Insert parsed questions, skipping prompts already stored.
    ///
    /// Returns the number of rows actually inserted.
    pub fn insert_items(&self, items: &[NewItem]) -> StorageResult<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO questions (
                    subject, question_text, option_a, option_b, option_c, option_d, correct_answer
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for item in items {
                inserted += stmt.execute(params![
                    item.subject,
                    item.prompt,
                    item.options[0],
                    item.options[1],
                    item.options[2],
                    item.options[3],
                    item.correct_answer.as_str(),
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(offered = items.len(), inserted, "items ingested");
        Ok(inserted)
    }

    // ========== Reads ==========

    pub fn get_item(&self, id: i64) -> StorageResult<Option<Item>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {ITEM_COLUMNS} FROM questions WHERE id = ?1");
        let item = conn.query_row(&sql, [id], |row| Item::from_row(row)).optional()?;
        Ok(item)
    }

    /// Number of items, optionally restricted to one subject
    pub fn count_items(&self, subject: Option<&str>) -> StorageResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM questions WHERE (?1 IS NULL OR subject = ?1)",
            params![subject],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn list_subjects(&self) -> StorageResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT subject FROM questions ORDER BY subject")?;
        let subjects = stmt
            .query_map([], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(subjects)
    }

    /// Reviewed items with the lowest recall scores, ties by ascending id
    pub fn weakest_reviewed(&self, limit: usize, subject: Option<&str>) -> StorageResult<Vec<Item>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM questions
             WHERE review_count > 0 AND (?1 IS NULL OR subject = ?1)
             ORDER BY recall_score ASC, id ASC
             LIMIT ?2"
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![subject, limit], |row| Item::from_row(row))?;
        Ok(collect_items(rows))
    }

    /// Every item matching the review filter and subject, ordered by id
    pub fn items_matching(&self, filter: ReviewFilter, subject: Option<&str>) -> StorageResult<Vec<Item>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM questions
             WHERE {} AND (?1 IS NULL OR subject = ?1)
             ORDER BY id",
            filter.clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![subject], |row| Item::from_row(row))?;
        Ok(collect_items(rows))
    }

    // ========== Progress writes ==========

    /// Read the pre-review snapshot and write the review outcome in one
    /// `IMMEDIATE` transaction.
    ///
    /// `decide` sees the snapshot before anything is written and returns the new
    /// recall score. Returns `None` when the item does not exist.
    pub fn apply_review<F>(&self, id: i64, now: DateTime<Utc>, decide: F) -> StorageResult<Option<AppliedReview>>
    where
        F: FnOnce(&ReviewSnapshot) -> f64,
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let sql = format!("SELECT {ITEM_COLUMNS} FROM questions WHERE id = ?1");
        let Some(item) = tx.query_row(&sql, [id], |row| Item::from_row(row)).optional()? else {
            return Ok(None);
        };
        let before = item.snapshot();

        let recall_score = decide(&before).clamp(0.0, 1.0);
        let after = ReviewSnapshot {
            review_count: before.review_count.saturating_add(1),
            last_reviewed_at: Some(now),
        };

        tx.execute(
            "UPDATE questions SET review_count = ?1, last_reviewed_at = ?2, recall_score = ?3 WHERE id = ?4",
            params![after.review_count, format_datetime(now), recall_score, id],
        )?;
        tx.commit()?;

        Ok(Some(AppliedReview {
            before,
            after,
            recall_score,
        }))
    }

    /// Return every item to the never-reviewed state
    pub fn reset_progress(&self) -> StorageResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE questions SET review_count = 0, last_reviewed_at = NULL, recall_score = 0.0",
            [],
        )?;
        Ok(affected)
    }
}

fn collect_items<I>(rows: I) -> Vec<Item>
where
    I: Iterator<Item = rusqlite::Result<Item>>,
{
    rows.filter_map(|r| match r {
        Ok(item) => Some(item),
        Err(e) => {
            tracing::warn!(error = %e, "skipping unreadable item row");
            None
        }
    })
    .collect()
}
