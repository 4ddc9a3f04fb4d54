#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative round lifecycle state machine.
//!
//! The director owns all mutable round state: the round counter, the
//! unlocked archetype prefix, the set of live enemy handles, and the FIFO of
//! spawns waiting for a free concurrency slot. Adapters submit [`Command`]
//! values through [`apply`]; the director mutates its state and broadcasts
//! [`Event`] values describing what happened. All computation is synchronous
//! and bounded, so a whole round transition completes within one `apply`
//! call. Failures never halt the session: a missing factory or failed
//! instantiation merely fields one fewer enemy than planned.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

use horde_core::{
    Command, DifficultyCurve, EnemyCatalog, EnemyDescriptor, EnemyFactory, EnemyId, EnemyTypeId,
    Event, PlayerLocator, Position, RoundKind, RoundNumber, RoundPlan, WalkableSurfaceOracle,
};
use horde_system_budget_composer::{BudgetComposer, Config as ComposerConfig};
use horde_system_genetic_planner::{GeneticPlanner, PlannerTuning};
use horde_system_spawn_placement::{Config as PlacementConfig, SpawnPlacement};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, warn};

const COMPOSER_SEED_SALT: u64 = 0x636f_6f6b_6564;
const PLANNER_SEED_SALT: u64 = 0x65_766f_6c76_65;
const PLACEMENT_SEED_SALT: u64 = 0x73_6361_7474_65;
const EXPANSION_SEED_SALT: u64 = 0x65_7870_616e_64;

/// Selects which composition algorithm fills procedural rounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositionStrategy {
    /// Greedy point-budget composition.
    Budget,
    /// Evolutionary search against the difficulty curve.
    Genetic,
}

/// Tuning surface of the round director.
#[derive(Clone, Copy, Debug)]
pub struct DirectorConfig {
    /// Rounds between two consecutive archetype introductions.
    pub presentation_interval: NonZeroU32,
    /// Upper bound on simultaneously live enemies.
    pub max_concurrent_enemies: NonZeroUsize,
    /// Instances of the newly unlocked archetype fielded in a presentation round.
    pub presentation_spawn_count: NonZeroU32,
    /// Delay between clearing a round and starting the next one.
    pub round_start_delay: Duration,
    /// How long the camera dwells on a newly introduced enemy.
    pub camera_focus_duration: Duration,
    /// Center of the playable map, used to mirror spawn positions.
    pub map_center: Position,
    /// Radius of the random scatter applied around the mirrored spawn anchor.
    pub scatter_radius: f32,
    /// Snapping tolerance handed to the walkable-surface oracle.
    pub sample_tolerance: f32,
    /// Composition algorithm used for procedural rounds.
    pub strategy: CompositionStrategy,
    /// Difficulty targeted per round by the genetic strategy.
    pub difficulty_curve: DifficultyCurve,
    /// Point budget granted per round to the budget strategy.
    pub points_per_round: u32,
    /// Evolutionary search parameters for the genetic strategy.
    pub planner_tuning: PlannerTuning,
    /// Seed from which every internal random stream is derived.
    pub rng_seed: u64,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            presentation_interval: NonZeroU32::new(3).expect("non-zero interval"),
            max_concurrent_enemies: NonZeroUsize::new(10).expect("non-zero cap"),
            presentation_spawn_count: NonZeroU32::new(2).expect("non-zero count"),
            round_start_delay: Duration::from_secs(3),
            camera_focus_duration: Duration::from_secs(2),
            map_center: Position::new(0.0, 0.0),
            scatter_radius: 4.0,
            sample_tolerance: 1.0,
            strategy: CompositionStrategy::Genetic,
            difficulty_curve: DifficultyCurve::default(),
            points_per_round: 10,
            planner_tuning: PlannerTuning::default(),
            rng_seed: 0,
        }
    }
}

/// Errors that can prevent a director from being constructed.
#[derive(Debug, Error)]
pub enum DirectorError {
    /// No player locator was registered; the director cannot place spawns.
    #[error("no player locator registered")]
    MissingPlayerLocator,
    /// The catalog holds no archetypes, so no round could field an enemy.
    #[error("enemy catalog is empty")]
    EmptyCatalog,
}

/// Assembles a [`RoundDirector`] from its collaborators.
///
/// The explicit builder replaces the global singleton access pattern: the
/// owner constructs the director once and passes it to whatever drives the
/// tick and death-notification callbacks.
pub struct DirectorBuilder {
    config: DirectorConfig,
    catalog: EnemyCatalog,
    factories: Vec<Box<dyn EnemyFactory>>,
    player: Option<Box<dyn PlayerLocator>>,
    oracle: Option<Box<dyn WalkableSurfaceOracle>>,
}

impl DirectorBuilder {
    /// Starts building a director over the provided catalog.
    #[must_use]
    pub fn new(config: DirectorConfig, catalog: EnemyCatalog) -> Self {
        Self {
            config,
            catalog,
            factories: Vec::new(),
            player: None,
            oracle: None,
        }
    }

    /// Registers an enemy factory. For each archetype the first factory
    /// claiming it wins; later claims are ignored.
    #[must_use]
    pub fn with_factory(mut self, factory: Box<dyn EnemyFactory>) -> Self {
        self.factories.push(factory);
        self
    }

    /// Registers the player locator. Required.
    #[must_use]
    pub fn with_player_locator(mut self, player: Box<dyn PlayerLocator>) -> Self {
        self.player = Some(player);
        self
    }

    /// Registers an optional walkable-surface oracle for spawn snapping.
    #[must_use]
    pub fn with_surface_oracle(mut self, oracle: Box<dyn WalkableSurfaceOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Finalizes the director, validating required collaborators.
    pub fn build(self) -> Result<RoundDirector, DirectorError> {
        let player = self.player.ok_or(DirectorError::MissingPlayerLocator)?;
        if self.catalog.is_empty() {
            return Err(DirectorError::EmptyCatalog);
        }

        let mut factory_index: BTreeMap<EnemyTypeId, usize> = BTreeMap::new();
        for (index, factory) in self.factories.iter().enumerate() {
            for &enemy_type in factory.managed_types() {
                if factory_index.contains_key(&enemy_type) {
                    debug!(
                        enemy_type = enemy_type.get(),
                        "duplicate factory registration ignored"
                    );
                    continue;
                }
                let _ = factory_index.insert(enemy_type, index);
            }
        }

        let seed = self.config.rng_seed;
        let composer = BudgetComposer::new(ComposerConfig::new(
            self.config.points_per_round,
            seed ^ COMPOSER_SEED_SALT,
        ));
        let planner = GeneticPlanner::new(self.config.planner_tuning, seed ^ PLANNER_SEED_SALT);
        let placement = SpawnPlacement::new(PlacementConfig::with_seed(
            self.config.scatter_radius,
            self.config.sample_tolerance,
            seed ^ PLACEMENT_SEED_SALT,
        ));

        Ok(RoundDirector {
            config: self.config,
            catalog: self.catalog,
            factories: self.factories,
            factory_index,
            player,
            oracle: self.oracle,
            composer,
            planner,
            placement,
            expansion_rng: ChaCha8Rng::seed_from_u64(seed ^ EXPANSION_SEED_SALT),
            round: 0,
            unlocked: 0,
            current_kind: None,
            active: BTreeSet::new(),
            waiting: VecDeque::new(),
            pending_round_start: None,
            camera_focus_pending: false,
        })
    }
}

/// Authoritative owner of the round lifecycle state.
pub struct RoundDirector {
    config: DirectorConfig,
    catalog: EnemyCatalog,
    factories: Vec<Box<dyn EnemyFactory>>,
    factory_index: BTreeMap<EnemyTypeId, usize>,
    player: Box<dyn PlayerLocator>,
    oracle: Option<Box<dyn WalkableSurfaceOracle>>,
    composer: BudgetComposer,
    planner: GeneticPlanner,
    placement: SpawnPlacement,
    expansion_rng: ChaCha8Rng,
    round: u32,
    unlocked: usize,
    current_kind: Option<RoundKind>,
    active: BTreeSet<EnemyId>,
    waiting: VecDeque<EnemyTypeId>,
    pending_round_start: Option<Duration>,
    camera_focus_pending: bool,
}

/// Applies the provided command to the director, mutating state
/// deterministically and appending the resulting events.
pub fn apply(director: &mut RoundDirector, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => director.tick(dt, out_events),
        Command::StartNextRound => director.start_next_round(out_events),
        Command::JumpToRound { round } => director.jump_to_round(round, out_events),
        Command::NotifyEnemyDied { enemy } => director.on_enemy_died(enemy, out_events),
    }
}

impl RoundDirector {
    /// Round kind the director would assign to `round` under its config.
    #[must_use]
    pub fn round_kind_for(&self, round: RoundNumber) -> RoundKind {
        let interval = self.config.presentation_interval.get();
        let offset = round.get().saturating_sub(1);
        let unlock_index = (offset / interval) as usize;
        if offset % interval == 0 && unlock_index < self.catalog.len() {
            RoundKind::Presentation { unlock_index }
        } else {
            RoundKind::Procedural
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(remaining) = self.pending_round_start else {
            return;
        };
        if dt >= remaining {
            self.pending_round_start = None;
            self.start_next_round(out_events);
        } else {
            self.pending_round_start = Some(remaining - dt);
        }
    }

    fn start_next_round(&mut self, out_events: &mut Vec<Event>) {
        self.round = self.round.saturating_add(1);
        self.pending_round_start = None;
        self.active.clear();
        self.waiting.clear();

        let round = RoundNumber::new(self.round);
        self.unlocked = self
            .catalog
            .unlocked_count_for_round(round, self.config.presentation_interval);
        let kind = self.round_kind_for(round);
        self.current_kind = Some(kind);
        self.camera_focus_pending = matches!(kind, RoundKind::Presentation { .. });

        out_events.push(Event::RoundStarted { round, kind });
        out_events.push(Event::RoundDisplayUpdated { round });

        let plan = match kind {
            RoundKind::Presentation { unlock_index } => self.presentation_plan(unlock_index),
            RoundKind::Procedural => self.procedural_plan(round),
        };

        debug!(
            round = round.get(),
            enemies = plan.len(),
            difficulty = plan.total_difficulty(),
            "round plan ready"
        );

        self.waiting.extend(plan.into_entries());
        while self.try_spawn_next(out_events) {}

        // A plan that fielded nothing (empty input set, or every spawn
        // skipped) completes on the spot so the session keeps moving.
        if self.active.is_empty() && self.waiting.is_empty() {
            warn!(round = round.get(), "round fielded no enemies");
            out_events.push(Event::RoundCompleted { round });
            self.pending_round_start = Some(self.config.round_start_delay);
        }
    }

    fn jump_to_round(&mut self, round: RoundNumber, out_events: &mut Vec<Event>) {
        self.round = round.get().max(1) - 1;
        self.pending_round_start = None;
        self.active.clear();
        self.waiting.clear();
        self.start_next_round(out_events);
    }

    fn on_enemy_died(&mut self, enemy: EnemyId, out_events: &mut Vec<Event>) {
        // Untracked handles are duplicate or late notifications.
        if !self.active.remove(&enemy) {
            return;
        }

        // Backfill the freed slot. Skipped spawns keep draining the queue,
        // so a factory that cannot field the remaining entries still lets
        // the round finish.
        while self.try_spawn_next(out_events) {}

        if self.active.is_empty() && self.waiting.is_empty() {
            let round = RoundNumber::new(self.round);
            out_events.push(Event::RoundCompleted { round });
            if self.pending_round_start.is_none() {
                self.pending_round_start = Some(self.config.round_start_delay);
            }
        }
    }

    /// Attempts to move one waiting spawn into the play space. Returns
    /// whether a queue entry was consumed.
    fn try_spawn_next(&mut self, out_events: &mut Vec<Event>) -> bool {
        if self.active.len() >= self.config.max_concurrent_enemies.get() {
            return false;
        }
        let Some(enemy_type) = self.waiting.pop_front() else {
            return false;
        };

        // Resolve the factory before drawing a position so skipped spawns
        // leave the placement stream untouched.
        let Some(&factory_index) = self.factory_index.get(&enemy_type) else {
            warn!(
                enemy_type = enemy_type.get(),
                "no factory registered for archetype, spawn skipped"
            );
            return true;
        };

        let position = self.placement.pick(
            self.player.player_position(),
            self.config.map_center,
            self.oracle.as_deref(),
        );

        match self.factories[factory_index].create_enemy(enemy_type, position) {
            Some(enemy) => {
                let _ = self.active.insert(enemy);
                out_events.push(Event::EnemySpawned {
                    enemy,
                    enemy_type,
                    position,
                });
                if self.camera_focus_pending {
                    self.camera_focus_pending = false;
                    out_events.push(Event::CameraFocusRequested {
                        enemy,
                        duration: self.config.camera_focus_duration,
                    });
                }
            }
            None => {
                warn!(
                    enemy_type = enemy_type.get(),
                    "factory failed to instantiate archetype, spawn skipped"
                );
            }
        }
        true
    }

    fn presentation_plan(&self, unlock_index: usize) -> RoundPlan {
        let descriptor = &self.catalog.progression()[unlock_index];
        let count = self.config.presentation_spawn_count.get() as usize;
        let entries = vec![descriptor.id(); count];
        RoundPlan::new(entries, descriptor.difficulty() * count as f32)
    }

    fn procedural_plan(&mut self, round: RoundNumber) -> RoundPlan {
        match self.config.strategy {
            CompositionStrategy::Genetic => {
                let target = self.config.difficulty_curve.target_for_round(round);
                self.planner
                    .generate_round(target, self.catalog.unlocked(self.unlocked))
            }
            CompositionStrategy::Budget => self.budget_plan(round),
        }
    }

    /// Expands the composer's `cost -> count` output into concrete
    /// archetypes, drawing weighted among the unlocked archetypes that
    /// share each cost.
    fn budget_plan(&mut self, round: RoundNumber) -> RoundPlan {
        let costs = self.catalog.distinct_point_costs(self.unlocked);
        let composition = self.composer.cook(round, &costs);

        let mut entries = Vec::new();
        let mut total_difficulty = 0.0;
        for (cost, count) in composition {
            let candidates: Vec<&EnemyDescriptor> = self
                .catalog
                .unlocked(self.unlocked)
                .iter()
                .filter(|descriptor| descriptor.point_cost() == cost)
                .collect();
            if candidates.is_empty() {
                continue;
            }
            for _ in 0..count {
                let chosen = weighted_pick(&mut self.expansion_rng, &candidates);
                entries.push(chosen.id());
                total_difficulty += chosen.difficulty();
            }
        }

        RoundPlan::new(entries, total_difficulty)
    }
}

/// Draws one candidate with probability proportional to its selection
/// weight. With all weights zero (or a single candidate) the first entry
/// wins. Callers guarantee `candidates` is non-empty.
fn weighted_pick<'a>(
    rng: &mut ChaCha8Rng,
    candidates: &[&'a EnemyDescriptor],
) -> &'a EnemyDescriptor {
    let total: u32 = candidates
        .iter()
        .map(|descriptor| descriptor.selection_weight())
        .sum();
    if total == 0 {
        return candidates[0];
    }

    let mut point = rng.gen_range(0..total);
    for &descriptor in candidates {
        let weight = descriptor.selection_weight();
        if point < weight {
            return descriptor;
        }
        point -= weight;
    }
    candidates[0]
}

/// Query functions that provide read-only access to the director state.
pub mod query {
    use super::RoundDirector;
    use horde_core::{EnemyDescriptor, EnemyId, RoundKind, RoundNumber};

    /// Round currently being played; zero before the first round starts.
    #[must_use]
    pub fn round(director: &RoundDirector) -> RoundNumber {
        RoundNumber::new(director.round)
    }

    /// Kind of the active round, if one has started.
    #[must_use]
    pub fn round_kind(director: &RoundDirector) -> Option<RoundKind> {
        director.current_kind
    }

    /// Handles of the enemies currently alive, in deterministic order.
    #[must_use]
    pub fn active_enemies(director: &RoundDirector) -> Vec<EnemyId> {
        director.active.iter().copied().collect()
    }

    /// Number of enemies currently alive.
    #[must_use]
    pub fn active_count(director: &RoundDirector) -> usize {
        director.active.len()
    }

    /// Number of spawns still waiting for a free concurrency slot.
    #[must_use]
    pub fn waiting_count(director: &RoundDirector) -> usize {
        director.waiting.len()
    }

    /// Archetypes unlocked by the current round, in progression order.
    #[must_use]
    pub fn unlocked_types(director: &RoundDirector) -> &[EnemyDescriptor] {
        director.catalog.unlocked(director.unlocked)
    }

    /// Reports whether a delayed round start is currently counting down.
    #[must_use]
    pub fn is_round_pending(director: &RoundDirector) -> bool {
        director.pending_round_start.is_some()
    }
}
