//! Benchmark suite for viva-algo
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use viva_algo::{quota, FeatureVector, RecallEstimator, SelectionTier, SessionAssembler};

fn bench_estimator_fit(c: &mut Criterion) {
    c.bench_function("RecallEstimator::fit", |b| {
        let mut estimator = RecallEstimator::default();
        let features = FeatureVector::new(3.0, 1.5);
        b.iter(|| estimator.fit(black_box(&features), black_box(0.7)))
    });
}

fn bench_estimator_predict(c: &mut Criterion) {
    let mut estimator = RecallEstimator::default();
    for i in 0..100 {
        estimator.fit(&FeatureVector::new(i as f64 % 7.0, i as f64 * 0.3), (i % 2) as f64);
    }
    c.bench_function("RecallEstimator::predict", |b| {
        b.iter(|| estimator.predict(black_box(&FeatureVector::new(4.0, 2.0))))
    });
}

fn bench_session_assembly(c: &mut Criterion) {
    let reviewed: Vec<i64> = (0..2_000).collect();
    let fresh: Vec<i64> = (2_000..5_000).collect();
    c.bench_function("SessionAssembler 50 of 5000", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        b.iter(|| {
            let q = quota(50);
            let mut asm = SessionAssembler::new(q.total);
            asm.take_ordered(reviewed.iter().copied(), q.weak, SelectionTier::Weak);
            asm.take_random(fresh.clone(), q.new, SelectionTier::New, &mut rng);
            asm.take_random(reviewed.clone(), usize::MAX, SelectionTier::ReviewedBackfill, &mut rng);
            asm.finish(&mut rng)
        })
    });
}

criterion_group!(
    benches,
    bench_estimator_fit,
    bench_estimator_predict,
    bench_session_assembly
);
criterion_main!(benches);
