//! Session selection
//!
//! Assembles a review session from the item store in four tiers: weakest
//! reviewed items, a random share of never-reviewed items, then random backfill
//! from the reviewed and unreviewed pools. The final plan is shuffled.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use viva_algo::{quota, SelectionTier, SessionAssembler};

use crate::storage::{Item, ItemRepository, ReviewFilter, StorageResult};

pub struct SessionSelector<R: Rng = StdRng> {
    rng: R,
}

impl SessionSelector<StdRng> {
    /// Selector seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> SessionSelector<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Pick up to `count` distinct items, restricted to `subject` when given.
    ///
    /// A tier whose store read fails contributes nothing; the plan just gets
    /// shorter.
    pub fn select(&mut self, items: &ItemRepository, count: usize, subject: Option<&str>) -> Vec<Item> {
        if count == 0 {
            return Vec::new();
        }

        let quota = quota(count);
        let mut plan = SessionAssembler::new(count);

        let weakest = pool_or_empty(items.weakest_reviewed(quota.weak, subject), SelectionTier::Weak);
        plan.take_ordered(weakest, quota.weak, SelectionTier::Weak);

        // Loaded once; the new tier and its backfill draw from the same pool
        let unreviewed = pool_or_empty(
            items.items_matching(ReviewFilter::Unreviewed, subject),
            SelectionTier::New,
        );
        plan.take_random(unreviewed.clone(), quota.new, SelectionTier::New, &mut self.rng);

        if !plan.is_full() {
            let reviewed = pool_or_empty(
                items.items_matching(ReviewFilter::Reviewed, subject),
                SelectionTier::ReviewedBackfill,
            );
            let open = plan.remaining();
            plan.take_random(reviewed, open, SelectionTier::ReviewedBackfill, &mut self.rng);
        }

        if !plan.is_full() {
            let open = plan.remaining();
            plan.take_random(unreviewed, open, SelectionTier::NewBackfill, &mut self.rng);
        }

        tracing::debug!(
            requested = count,
            selected = plan.picked().len(),
            subject = subject.unwrap_or("*"),
            "session assembled"
        );

        plan.finish(&mut self.rng)
    }
}

fn pool_or_empty(result: StorageResult<Vec<Item>>, tier: SelectionTier) -> Vec<Item> {
    result.unwrap_or_else(|e| {
        tracing::warn!(tier = ?tier, error = %e, "candidate query failed, tier skipped");
        Vec::new()
    })
}
