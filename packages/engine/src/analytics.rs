//! Progress analytics
//!
//! Read-only summaries over the item store. Everything here returns numbers;
//! rendering belongs to the caller.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use viva_algo::MasteryBand;

use crate::storage::{Item, ItemRepository, ReviewFilter, StorageResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStats {
    pub total: usize,
    pub reviewed: usize,
    pub new: usize,
    /// Mean recall of reviewed items, as a percentage
    pub mastery_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectPerformance {
    pub subject: String,
    pub total: usize,
    pub reviewed: usize,
    /// Mean recall over every item of the subject, as a percentage
    pub recall_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasteryForecast {
    pub total: usize,
    pub mastered: usize,
    pub remaining: usize,
    /// Items mastered per day
    pub velocity: f64,
    /// `None` while nothing is being mastered
    pub days_left: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewLogEntry {
    pub item: Item,
    pub band: MasteryBand,
}

pub struct Analytics<'a> {
    items: &'a ItemRepository,
}

impl<'a> Analytics<'a> {
    pub fn new(items: &'a ItemRepository) -> Self {
        Self { items }
    }

    pub fn overall_stats(&self) -> StorageResult<OverallStats> {
        let all = self.items.items_matching(ReviewFilter::Any, None)?;
        let reviewed: Vec<f64> = all
            .iter()
            .filter(|item| item.is_reviewed())
            .map(Item::recall_score)
            .collect();

        Ok(OverallStats {
            total: all.len(),
            reviewed: reviewed.len(),
            new: all.len() - reviewed.len(),
            mastery_percent: mean(&reviewed) * 100.0,
        })
    }

    /// Per-subject totals, weakest subject first
    pub fn subject_performance(&self) -> StorageResult<Vec<SubjectPerformance>> {
        let all = self.items.items_matching(ReviewFilter::Any, None)?;

        let mut by_subject: BTreeMap<&str, (usize, usize, f64)> = BTreeMap::new();
        for item in &all {
            let entry = by_subject.entry(item.subject.as_str()).or_default();
            entry.0 += 1;
            if item.is_reviewed() {
                entry.1 += 1;
            }
            entry.2 += item.recall_score();
        }

        let mut rows: Vec<SubjectPerformance> = by_subject
            .into_iter()
            .map(|(subject, (total, reviewed, recall_sum))| SubjectPerformance {
                subject: subject.to_string(),
                total,
                reviewed,
                recall_percent: recall_sum / total as f64 * 100.0,
            })
            .collect();

        // Stable sort keeps subjects alphabetical among equal recall
        rows.sort_by(|a, b| a.recall_percent.total_cmp(&b.recall_percent));
        Ok(rows)
    }

    /// Subjects with at least one reviewed item, weakest first
    pub fn weakest_subjects(&self, limit: usize) -> StorageResult<Vec<SubjectPerformance>> {
        Ok(self
            .subject_performance()?
            .into_iter()
            .filter(|row| row.reviewed > 0)
            .take(limit)
            .collect())
    }

    /// Completion estimate from recent mastery velocity.
    ///
    /// Velocity counts mastered items reviewed in the last day; when that is
    /// zero it falls back to the last week's count spread over seven days.
    pub fn mastery_forecast(&self, now: DateTime<Utc>) -> StorageResult<MasteryForecast> {
        let all = self.items.items_matching(ReviewFilter::Any, None)?;
        let mastered: Vec<&Item> = all
            .iter()
            .filter(|item| MasteryBand::from_score(item.recall_score()) == MasteryBand::Mastered)
            .collect();

        let mastered_since = |cutoff: DateTime<Utc>| {
            mastered
                .iter()
                .filter(|item| item.last_reviewed_at().is_some_and(|at| at >= cutoff))
                .count()
        };

        let mut velocity = mastered_since(now - Duration::days(1)) as f64;
        if velocity == 0.0 {
            velocity = mastered_since(now - Duration::days(7)) as f64 / 7.0;
        }

        let remaining = all.len() - mastered.len();
        let days_left = (velocity > 0.0).then(|| remaining as f64 / velocity);

        Ok(MasteryForecast {
            total: all.len(),
            mastered: mastered.len(),
            remaining,
            velocity,
            days_left,
        })
    }

    /// Reviewed items, lowest recall first, most recently reviewed first among ties
    pub fn review_log(&self) -> StorageResult<Vec<ReviewLogEntry>> {
        let mut reviewed = self.items.items_matching(ReviewFilter::Reviewed, None)?;
        reviewed.sort_by(|a, b| {
            a.recall_score()
                .total_cmp(&b.recall_score())
                .then_with(|| newest_first(a.last_reviewed_at(), b.last_reviewed_at()))
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(reviewed
            .into_iter()
            .map(|item| ReviewLogEntry {
                band: MasteryBand::from_score(item.recall_score()),
                item,
            })
            .collect())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    b.cmp(&a)
}
