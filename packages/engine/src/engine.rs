//! Engine orchestrator
//!
//! [`RecallEngine`] owns the item store, the recall model, the session selector
//! and the clock. It is built once per process and passed around explicitly.

use crate::analytics::Analytics;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, DEFAULT_SESSION_SIZE};
use crate::error::{EngineError, EngineResult};
use crate::model::RecallModel;
use crate::selector::SessionSelector;
use crate::storage::{DatabaseManager, FileBlobStore, Item, ItemRepository};
use crate::update_loop::{AnswerEvent, ReviewOutcome, UpdateLoop};

use viva_algo::extract_features;

pub struct RecallEngine {
    db: DatabaseManager,
    items: ItemRepository,
    model: RecallModel,
    selector: SessionSelector,
    clock: Box<dyn Clock>,
    session_size: usize,
}

impl RecallEngine {
    /// Open the item store and restore the model from `config.model_dir`.
    ///
    /// This is the only fallible step; once it succeeds, selection and review
    /// recording never return errors.
    pub fn open(config: &Config) -> EngineResult<Self> {
        let db = DatabaseManager::new(&config.db_path)?;

        std::fs::create_dir_all(&config.model_dir).map_err(|source| EngineError::ModelDir {
            path: config.model_dir.clone(),
            source,
        })?;
        let model = RecallModel::load(FileBlobStore::new(&config.model_dir), config.model.clone());

        tracing::info!(
            db_path = %config.db_path.display(),
            model_dir = %config.model_dir.display(),
            warm = model.is_warm(),
            "recall engine ready"
        );

        Ok(Self::with_parts(db, model, SessionSelector::from_entropy(), SystemClock)
            .with_session_size(config.session_size))
    }

    /// Assemble an engine from already-built parts
    pub fn with_parts<C: Clock + 'static>(
        db: DatabaseManager,
        model: RecallModel,
        selector: SessionSelector,
        clock: C,
    ) -> Self {
        let items = db.item_repository();
        Self {
            db,
            items,
            model,
            selector,
            clock: Box::new(clock),
            session_size: DEFAULT_SESSION_SIZE,
        }
    }

    pub fn with_session_size(mut self, session_size: usize) -> Self {
        self.session_size = session_size;
        self
    }

    /// Configured default session length
    pub fn session_size(&self) -> usize {
        self.session_size
    }

    pub fn database(&self) -> &DatabaseManager {
        &self.db
    }

    pub fn items(&self) -> &ItemRepository {
        &self.items
    }

    pub fn model(&self) -> &RecallModel {
        &self.model
    }

    pub fn analytics(&self) -> Analytics<'_> {
        Analytics::new(&self.items)
    }

    /// Up to `count` distinct items for the next session
    pub fn select_session(&mut self, count: usize, subject: Option<&str>) -> Vec<Item> {
        self.selector.select(&self.items, count, subject)
    }

    pub fn record_response(&mut self, item_id: i64, is_correct: bool, response_time_seconds: f64) -> ReviewOutcome {
        self.record(&AnswerEvent::new(item_id, is_correct, response_time_seconds))
    }

    pub fn record(&mut self, event: &AnswerEvent) -> ReviewOutcome {
        let now = self.clock.now();
        UpdateLoop::new(&self.items, &mut self.model).record(event, now)
    }

    /// Current recall estimate for an item as it stands now
    pub fn predict_recall(&self, item: &Item) -> f64 {
        let features = extract_features(item.review_count(), item.last_reviewed_at(), self.clock.now());
        self.model.predict(&features)
    }

    /// Forget all progress: every item back to unreviewed, the model back to cold.
    ///
    /// Returns the number of items reset.
    pub fn reset_progress(&mut self) -> EngineResult<usize> {
        let reset = self.items.reset_progress()?;
        self.model.reset()?;
        tracing::info!(items = reset, "progress reset");
        Ok(reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::{AnswerLetter, MemoryBlobStore, NewItem};
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use viva_algo::RecallModelConfig;

    fn engine_with(store: MemoryBlobStore, clock: FixedClock) -> RecallEngine {
        let db = DatabaseManager::in_memory().unwrap();
        db.item_repository()
            .insert_items(&[
                NewItem::new("Law", "Q1", ["a", "b", "c", "d"], AnswerLetter::A),
                NewItem::new("Law", "Q2", ["a", "b", "c", "d"], AnswerLetter::B),
                NewItem::new("Art", "Q3", ["a", "b", "c", "d"], AnswerLetter::C),
            ])
            .unwrap();
        let model = RecallModel::load(store, RecallModelConfig::default());
        RecallEngine::with_parts(db, model, SessionSelector::new(StdRng::seed_from_u64(5)), clock)
    }

    fn clock() -> FixedClock {
        FixedClock::at(Utc.with_ymd_and_hms(2025, 4, 2, 8, 30, 0).unwrap())
    }

    #[test]
    fn test_cold_engine_predicts_half() {
        let mut engine = engine_with(MemoryBlobStore::new(), clock());
        for item in engine.select_session(10, None) {
            assert_eq!(engine.predict_recall(&item), 0.5);
        }
    }

    #[test]
    fn test_record_uses_clock() {
        let clock = clock();
        let mut engine = engine_with(MemoryBlobStore::new(), clock.clone());
        clock.advance(Duration::minutes(5));

        let outcome = engine.record_response(3, true, 12.0);
        assert_eq!(outcome, ReviewOutcome::Recorded { label: 0.7, trained: true });
        let item = engine.items().get_item(3).unwrap().unwrap();
        assert_eq!(item.last_reviewed_at(), Some(clock.now()));
    }

    #[test]
    fn test_reset_progress() {
        let store = MemoryBlobStore::new();
        let mut engine = engine_with(store.clone(), clock());
        engine.record_response(1, true, 2.0);
        engine.record_response(2, false, 2.0);
        assert!(engine.model().is_warm());

        assert_eq!(engine.reset_progress().unwrap(), 3);
        assert!(!engine.model().is_warm());
        assert!(!store.contains(crate::model::PARAMS_BLOB));
        assert_eq!(engine.analytics().overall_stats().unwrap().reviewed, 0);
    }

    #[test]
    fn test_session_size_default() {
        let engine = engine_with(MemoryBlobStore::new(), clock()).with_session_size(7);
        assert_eq!(engine.session_size(), 7);
    }
}
