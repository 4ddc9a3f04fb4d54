#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Budgeted horde composer.
//!
//! Given a per-round point budget and the set of affordable unit costs, the
//! composer greedily picks random affordable costs until the remaining
//! budget can no longer pay for anything, producing a `cost -> count`
//! composition. Termination is guaranteed because the remaining budget
//! strictly decreases and every cost is at least one point.

use std::collections::BTreeMap;

use horde_core::{PointCost, RoundNumber};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

const DEFAULT_POINTS_PER_ROUND: u32 = 10;

/// Configuration parameters required to construct the composer.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    points_per_round: u32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided budget growth and seed.
    #[must_use]
    pub const fn new(points_per_round: u32, rng_seed: u64) -> Self {
        Self {
            points_per_round,
            rng_seed,
        }
    }

    /// Configuration with the default ten points of budget per round.
    #[must_use]
    pub const fn with_seed(rng_seed: u64) -> Self {
        Self::new(DEFAULT_POINTS_PER_ROUND, rng_seed)
    }
}

/// Greedy knapsack-style composer exhausting a per-round point budget.
#[derive(Debug)]
pub struct BudgetComposer {
    points_per_round: u32,
    rng: ChaCha8Rng,
}

impl BudgetComposer {
    /// Creates a new composer using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            points_per_round: config.points_per_round,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Budget granted to `round`.
    #[must_use]
    pub const fn budget_for_round(&self, round: RoundNumber) -> u32 {
        round.get().saturating_mul(self.points_per_round)
    }

    /// Composes a horde for `round` out of `available_costs`.
    ///
    /// The returned map associates each chosen cost with the number of
    /// enemies of that cost to field. An empty cost set yields an empty
    /// composition.
    pub fn cook(
        &mut self,
        round: RoundNumber,
        available_costs: &[PointCost],
    ) -> BTreeMap<PointCost, u32> {
        let mut composition = BTreeMap::new();

        if available_costs.is_empty() {
            warn!(round = round.get(), "no point costs available, horde is empty");
            return composition;
        }

        let mut remaining = self.budget_for_round(round);
        loop {
            let affordable: Vec<PointCost> = available_costs
                .iter()
                .copied()
                .filter(|cost| cost.get() <= remaining)
                .collect();
            if affordable.is_empty() {
                break;
            }

            let chosen = affordable[self.rng.gen_range(0..affordable.len())];
            *composition.entry(chosen).or_insert(0) += 1;
            remaining -= chosen.get();
        }

        composition
    }
}
