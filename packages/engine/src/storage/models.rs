//! Item records
//!
//! Typed rows of the `questions` table. Only the progress fields
//! (`recall_score`, `review_count`, `last_reviewed_at`) are ever written by the
//! scheduling engine; everything else belongs to the ingestion side.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use viva_algo::Keyed;

// ============================================================
// Errors
// ============================================================

/// Invariant violations when building an [`Item`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ItemError {
    #[error("recall score {0} outside [0, 1]")]
    RecallScoreOutOfRange(f64),

    #[error("review count {0} is negative")]
    NegativeReviewCount(i64),

    #[error("review count {0} exceeds {max}", max = u32::MAX)]
    ReviewCountTooLarge(i64),

    #[error("item has a review timestamp but review_count is 0")]
    TimestampWithoutReview,

    #[error("invalid answer letter: {0:?}")]
    InvalidAnswer(String),
}

// ============================================================
// AnswerLetter
// ============================================================

/// One of the four option letters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Position in the options array
    pub fn index(&self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }
}

impl FromStr for AnswerLetter {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            _ => Err(ItemError::InvalidAnswer(s.to_string())),
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// Item
// ============================================================

/// A stored multiple-choice question with its review progress
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: i64,
    pub subject: String,
    pub prompt: String,
    pub options: [String; 4],
    pub correct_answer: AnswerLetter,
    recall_score: f64,
    review_count: u32,
    last_reviewed_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Build an item, enforcing the progress invariants
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        subject: impl Into<String>,
        prompt: impl Into<String>,
        options: [String; 4],
        correct_answer: AnswerLetter,
        recall_score: f64,
        review_count: i64,
        last_reviewed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ItemError> {
        if !(0.0..=1.0).contains(&recall_score) {
            return Err(ItemError::RecallScoreOutOfRange(recall_score));
        }
        if review_count < 0 {
            return Err(ItemError::NegativeReviewCount(review_count));
        }
        let review_count =
            u32::try_from(review_count).map_err(|_| ItemError::ReviewCountTooLarge(review_count))?;
        if review_count == 0 && last_reviewed_at.is_some() {
            return Err(ItemError::TimestampWithoutReview);
        }

        Ok(Self {
            id,
            subject: subject.into(),
            prompt: prompt.into(),
            options,
            correct_answer,
            recall_score,
            review_count,
            last_reviewed_at,
        })
    }

    pub fn recall_score(&self) -> f64 {
        self.recall_score
    }

    pub fn review_count(&self) -> u32 {
        self.review_count
    }

    pub fn last_reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed_at
    }

    pub fn is_reviewed(&self) -> bool {
        self.review_count > 0
    }

    pub fn snapshot(&self) -> ReviewSnapshot {
        ReviewSnapshot {
            review_count: self.review_count,
            last_reviewed_at: self.last_reviewed_at,
        }
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_answer.index()]
    }

    pub fn is_correct(&self, answer: AnswerLetter) -> bool {
        self.correct_answer == answer
    }

    /// Map a `questions` row
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        let answer: String = row.get("correct_answer")?;
        let correct_answer = answer.parse::<AnswerLetter>().map_err(|e| conversion_error(7, e))?;
        let last_reviewed_at = row
            .get::<_, Option<String>>("last_reviewed_at")?
            .map(|s| parse_datetime(&s).map_err(|e| conversion_error(10, e)))
            .transpose()?;

        Self::new(
            row.get("id")?,
            row.get::<_, String>("subject")?,
            row.get::<_, String>("question_text")?,
            [
                row.get("option_a")?,
                row.get("option_b")?,
                row.get("option_c")?,
                row.get("option_d")?,
            ],
            correct_answer,
            row.get("recall_score")?,
            row.get("review_count")?,
            last_reviewed_at,
        )
        .map_err(|e| conversion_error(8, e))
    }
}

impl Keyed for Item {
    fn key(&self) -> i64 {
        self.id
    }
}

// ============================================================
// NewItem
// ============================================================

/// A parsed question as handed over by ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub subject: String,
    pub prompt: String,
    pub options: [String; 4],
    pub correct_answer: AnswerLetter,
}

impl NewItem {
    pub fn new(
        subject: impl Into<String>,
        prompt: impl Into<String>,
        options: [&str; 4],
        correct_answer: AnswerLetter,
    ) -> Self {
        Self {
            subject: subject.into(),
            prompt: prompt.into(),
            options: options.map(str::to_string),
            correct_answer,
        }
    }
}

// ============================================================
// ReviewSnapshot
// ============================================================

/// Review history of an item as it stood before a review
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewSnapshot {
    pub review_count: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

/// Result of one applied review: the state read before and written after
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedReview {
    pub before: ReviewSnapshot,
    pub after: ReviewSnapshot,
    pub recall_score: f64,
}

// ============================================================
// Helpers
// ============================================================

pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// RFC 3339, or a legacy offset-less timestamp in the host's local time
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(local_to_utc))
}

/// A local time skipped by a DST jump has no instant; read it as UTC
fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}
