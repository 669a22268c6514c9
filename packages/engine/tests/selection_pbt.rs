//! Property-based tests for session selection and the recall model
//!
//! - Plans never repeat an item
//! - Plan length is `min(N, filtered pool)`
//! - Subject filter is respected
//! - Predictions stay in [0, 1] whatever the training history

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

use viva_engine::{
    AnswerLetter, DatabaseManager, FeatureVector, MemoryBlobStore, NewItem, RecallModel, RecallModelConfig,
    SessionSelector,
};

const SUBJECTS: [&str; 3] = ["Law", "Art", "Music"];

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// (subject index, recall score if reviewed)
fn arb_pool() -> impl Strategy<Value = Vec<(usize, Option<f64>)>> {
    prop::collection::vec(
        (0usize..SUBJECTS.len(), proptest::option::of((0u32..=10u32).prop_map(|v| v as f64 / 10.0))),
        0..40,
    )
}

fn arb_subject() -> impl Strategy<Value = Option<&'static str>> {
    proptest::option::of(prop::sample::select(SUBJECTS.to_vec()))
}

fn arb_sample() -> impl Strategy<Value = (FeatureVector, f64)> {
    (0u32..50, 0.0f64..400.0, prop::sample::select(vec![0.0, 0.7, 1.0]))
        .prop_map(|(count, days, label)| (FeatureVector::new(count as f64, days), label))
}

fn build_store(pool: &[(usize, Option<f64>)]) -> DatabaseManager {
    let db = DatabaseManager::in_memory().unwrap();
    let items: Vec<NewItem> = pool
        .iter()
        .enumerate()
        .map(|(i, (s, _))| NewItem::new(SUBJECTS[*s], format!("prompt {i}"), ["a", "b", "c", "d"], AnswerLetter::D))
        .collect();
    db.item_repository().insert_items(&items).unwrap();

    let conn = db.connection();
    let conn = conn.lock().unwrap();
    let reviewed_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true);
    for (i, (_, score)) in pool.iter().enumerate() {
        if let Some(score) = score {
            conn.execute(
                "UPDATE questions SET recall_score = ?1, review_count = 1, last_reviewed_at = ?2 WHERE id = ?3",
                rusqlite::params![score, reviewed_at, i as i64 + 1],
            )
            .unwrap();
        }
    }
    drop(conn);
    db
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_plan_is_distinct_filtered_and_full(
        pool in arb_pool(),
        count in 0usize..25,
        subject in arb_subject(),
        seed in any::<u64>(),
    ) {
        let db = build_store(&pool);
        let mut selector = SessionSelector::new(ChaCha8Rng::seed_from_u64(seed));
        let plan = selector.select(&db.item_repository(), count, subject);

        let eligible = pool
            .iter()
            .filter(|(s, _)| subject.map_or(true, |wanted| SUBJECTS[*s] == wanted))
            .count();
        prop_assert_eq!(plan.len(), count.min(eligible));

        let ids: HashSet<i64> = plan.iter().map(|i| i.id).collect();
        prop_assert_eq!(ids.len(), plan.len());

        if let Some(wanted) = subject {
            prop_assert!(plan.iter().all(|i| i.subject == wanted));
        }
    }

    #[test]
    fn prop_weakest_reviewed_always_selected(
        pool in arb_pool(),
        count in 1usize..25,
        seed in any::<u64>(),
    ) {
        let db = build_store(&pool);
        let repo = db.item_repository();
        let weak_quota = count.div_ceil(2);
        let expected: Vec<i64> = repo.weakest_reviewed(weak_quota, None).unwrap().iter().map(|i| i.id).collect();

        let plan = SessionSelector::new(ChaCha8Rng::seed_from_u64(seed)).select(&repo, count, None);
        let ids: HashSet<i64> = plan.iter().map(|i| i.id).collect();
        for id in expected {
            prop_assert!(ids.contains(&id));
        }
    }

    #[test]
    fn prop_prediction_stays_in_unit_interval(
        history in prop::collection::vec(arb_sample(), 0..30),
        query in arb_sample(),
    ) {
        let mut model = RecallModel::load(MemoryBlobStore::new(), RecallModelConfig::default());
        for (x, y) in &history {
            model.train(x, *y).unwrap();
        }
        let p = model.predict(&query.0);
        prop_assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn prop_training_never_moves_prediction_away_from_label(
        history in prop::collection::vec(arb_sample(), 0..40),
        query in arb_sample(),
    ) {
        let mut up = RecallModel::load(MemoryBlobStore::new(), RecallModelConfig::default());
        let mut down = RecallModel::load(MemoryBlobStore::new(), RecallModelConfig::default());
        for (x, y) in &history {
            up.train(x, *y).unwrap();
            down.train(x, *y).unwrap();
        }
        let before = up.predict(&query.0);

        up.train(&query.0, 1.0).unwrap();
        prop_assert!(up.predict(&query.0) >= before - 1e-9);
        down.train(&query.0, 0.0).unwrap();
        prop_assert!(down.predict(&query.0) <= before + 1e-9);
    }
}
