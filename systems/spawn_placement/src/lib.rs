#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Distance-biased spawn position planner.
//!
//! Candidate positions are scattered around the point diametrically opposite
//! the player across the map center, keeping fresh spawns out of immediate
//! view. When a walkable-surface oracle is available each candidate is
//! snapped onto valid ground; exhausting the attempt budget degrades to the
//! player's own position rather than failing the spawn.

use std::f32::consts::TAU;

use horde_core::{Position, WalkableSurfaceOracle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Configuration parameters required to construct the placement system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    scatter_radius: f32,
    sample_tolerance: f32,
    max_attempts: u32,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration from scatter and snapping parameters.
    #[must_use]
    pub const fn new(
        scatter_radius: f32,
        sample_tolerance: f32,
        max_attempts: u32,
        rng_seed: u64,
    ) -> Self {
        Self {
            scatter_radius,
            sample_tolerance,
            max_attempts,
            rng_seed,
        }
    }

    /// Configuration using the default attempt budget.
    #[must_use]
    pub const fn with_seed(scatter_radius: f32, sample_tolerance: f32, rng_seed: u64) -> Self {
        Self::new(scatter_radius, sample_tolerance, DEFAULT_MAX_ATTEMPTS, rng_seed)
    }
}

/// Picks spawn locations biased away from the player.
#[derive(Debug)]
pub struct SpawnPlacement {
    scatter_radius: f32,
    sample_tolerance: f32,
    max_attempts: u32,
    rng: ChaCha8Rng,
}

impl SpawnPlacement {
    /// Creates a new placement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            scatter_radius: config.scatter_radius,
            sample_tolerance: config.sample_tolerance,
            max_attempts: config.max_attempts.max(1),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Picks a spawn position opposite the player across `map_center`.
    ///
    /// With an oracle, up to the configured attempt count of scattered
    /// candidates are snapped onto walkable ground; if every attempt fails
    /// the player's own position is returned as a degraded fallback.
    pub fn pick(
        &mut self,
        player: Position,
        map_center: Position,
        oracle: Option<&dyn WalkableSurfaceOracle>,
    ) -> Position {
        let anchor = player.mirrored_across(map_center);

        let Some(oracle) = oracle else {
            return self.scatter_around(anchor);
        };

        for _ in 0..self.max_attempts {
            let candidate = self.scatter_around(anchor);
            if let Some(valid) = oracle.sample_position(candidate, self.sample_tolerance) {
                return valid;
            }
        }

        warn!(
            attempts = self.max_attempts,
            "no walkable spawn position found, falling back to player position"
        );
        player
    }

    /// Uniformly random point within the scatter disc around `anchor`.
    fn scatter_around(&mut self, anchor: Position) -> Position {
        let angle = self.rng.gen::<f32>() * TAU;
        let radius = self.scatter_radius * self.rng.gen::<f32>().sqrt();
        anchor.offset_by(radius * angle.cos(), radius * angle.sin())
    }
}
