//! Review event processing
//!
//! One answer event flows through: pre-review snapshot -> features -> label ->
//! model training -> item update. The snapshot read and the item write share an
//! `IMMEDIATE` transaction, and training runs between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use viva_algo::{extract_features, label};

use crate::model::RecallModel;
use crate::storage::ItemRepository;

/// An answer reported by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvent {
    pub item_id: i64,
    pub is_correct: bool,
    pub response_time_seconds: f64,
}

impl AnswerEvent {
    pub fn new(item_id: i64, is_correct: bool, response_time_seconds: f64) -> Self {
        Self {
            item_id,
            is_correct,
            response_time_seconds,
        }
    }
}

/// What happened to one answer event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReviewOutcome {
    /// Item updated; `trained` is false when the model step could not be persisted
    Recorded { label: f64, trained: bool },
    UnknownItem,
    StoreFailed,
}

impl ReviewOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

pub struct UpdateLoop<'a> {
    items: &'a ItemRepository,
    model: &'a mut RecallModel,
}

impl<'a> UpdateLoop<'a> {
    pub fn new(items: &'a ItemRepository, model: &'a mut RecallModel) -> Self {
        Self { items, model }
    }

    /// Process one answer event at instant `now`. Never fails to the caller.
    pub fn record(&mut self, event: &AnswerEvent, now: DateTime<Utc>) -> ReviewOutcome {
        let target = label(event.is_correct, event.response_time_seconds);
        let model = &mut *self.model;
        let mut trained = false;

        let applied = self.items.apply_review(event.item_id, now, |before| {
            let features = extract_features(before.review_count, before.last_reviewed_at, now);
            match model.train(&features, target) {
                Ok(()) => trained = true,
                Err(e) => {
                    tracing::warn!(item_id = event.item_id, error = %e, "model state not persisted");
                }
            }
            target
        });

        match applied {
            Ok(Some(review)) => {
                tracing::debug!(
                    item_id = event.item_id,
                    label = target,
                    review_count = review.after.review_count,
                    trained,
                    "review recorded"
                );
                ReviewOutcome::Recorded { label: target, trained }
            }
            Ok(None) => {
                tracing::warn!(item_id = event.item_id, "answer for unknown item ignored");
                ReviewOutcome::UnknownItem
            }
            Err(e) => {
                tracing::error!(item_id = event.item_id, error = %e, "failed to record review");
                ReviewOutcome::StoreFailed
            }
        }
    }
}
