//! Tiered session sampling
//!
//! Quotas and the deduplicating assembler behind session selection. Callers
//! feed candidate pools tier by tier; the assembler tracks chosen ids, enforces
//! the session size and shuffles the final plan.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::{SelectionTier, TierQuota};

/// Anything that can be placed in a session by id
pub trait Keyed {
    fn key(&self) -> i64;
}

impl Keyed for i64 {
    fn key(&self) -> i64 {
        *self
    }
}

/// Tier quotas for a session of `total` items.
///
/// Weak gets `ceil(0.5 * total)`, new gets `floor(0.2 * total)`.
pub fn quota(total: usize) -> TierQuota {
    TierQuota {
        total,
        weak: total.div_ceil(2),
        new: total / 5,
    }
}

/// Accumulates a session plan across tiers without duplicates
#[derive(Debug)]
pub struct SessionAssembler<T> {
    target: usize,
    chosen: HashSet<i64>,
    picked: Vec<(T, SelectionTier)>,
}

impl<T: Keyed> SessionAssembler<T> {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            chosen: HashSet::with_capacity(target),
            picked: Vec::with_capacity(target),
        }
    }

    /// Slots still open
    pub fn remaining(&self) -> usize {
        self.target.saturating_sub(self.picked.len())
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    pub fn contains(&self, key: i64) -> bool {
        self.chosen.contains(&key)
    }

    /// Take candidates in the given order, up to `limit` new entries
    pub fn take_ordered(
        &mut self,
        candidates: impl IntoIterator<Item = T>,
        limit: usize,
        tier: SelectionTier,
    ) -> usize {
        let limit = limit.min(self.remaining());
        let mut taken = 0;
        for item in candidates {
            if taken == limit {
                break;
            }
            if self.push(item, tier) {
                taken += 1;
            }
        }
        taken
    }

    /// Take up to `limit` entries drawn uniformly from the candidates not yet chosen
    pub fn take_random<R: Rng + ?Sized>(
        &mut self,
        candidates: Vec<T>,
        limit: usize,
        tier: SelectionTier,
        rng: &mut R,
    ) -> usize {
        let mut seen = HashSet::new();
        let mut pool: Vec<T> = candidates
            .into_iter()
            .filter(|item| !self.chosen.contains(&item.key()) && seen.insert(item.key()))
            .collect();

        pool.shuffle(rng);
        pool.truncate(limit.min(self.remaining()));
        self.take_ordered(pool, limit, tier)
    }

    /// Entries with the tier each came from, in selection order
    pub fn picked(&self) -> &[(T, SelectionTier)] {
        &self.picked
    }

    /// Shuffle the plan so presentation order is independent of tier priority
    pub fn finish<R: Rng + ?Sized>(self, rng: &mut R) -> Vec<T> {
        let mut plan: Vec<T> = self.picked.into_iter().map(|(item, _)| item).collect();
        plan.shuffle(rng);
        plan
    }

    fn push(&mut self, item: T, tier: SelectionTier) -> bool {
        if self.is_full() || !self.chosen.insert(item.key()) {
            return false;
        }
        self.picked.push((item, tier));
        true
    }
}
