#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the horde round-composition engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative round director, and the pure composition systems. Adapters
//! submit [`Command`] values describing desired transitions, the director
//! executes those commands via its `apply` entry point, and then broadcasts
//! [`Event`] values for presentation layers to react to deterministically.
//! The composition systems consume immutable catalog data and respond with
//! fresh [`RoundPlan`] values.

use std::num::NonZeroU32;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default base difficulty targeted by round one, before per-round growth.
pub const DEFAULT_BASE_DIFFICULTY: f32 = 100.0;

/// Default additional difficulty targeted with every subsequent round.
pub const DEFAULT_DIFFICULTY_INCREASE_PER_ROUND: f32 = 30.0;

/// Unique identifier assigned to an enemy archetype.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EnemyTypeId(u32);

impl EnemyTypeId {
    /// Creates a new archetype identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Opaque handle identifying a single spawned enemy instance.
///
/// Handles are allocated by [`EnemyFactory`] implementations; the director
/// only stores and compares them.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new instance handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of one instantiable variant belonging to an archetype.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct VariantId(u32);

impl VariantId {
    /// Creates a new variant identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One-based round counter that grows monotonically over a session.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RoundNumber(u32);

impl RoundNumber {
    /// Creates a new round number wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying round index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Integral cost of fielding one enemy of an archetype, used by the budget
/// composer as a simpler difficulty unit than the continuous score.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PointCost(NonZeroU32);

impl PointCost {
    /// Creates a new point cost from a non-zero value.
    #[must_use]
    pub const fn new(value: NonZeroU32) -> Self {
        Self(value)
    }

    /// Retrieves the cost as a plain integer.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0.get()
    }
}

/// Location in the 2D play space expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new position from world-space coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate of the position.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate of the position.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance between two positions.
    #[must_use]
    pub fn distance(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Point diametrically opposite this position across the given center.
    #[must_use]
    pub fn mirrored_across(self, center: Position) -> Position {
        Position::new(2.0 * center.x - self.x, 2.0 * center.y - self.y)
    }

    /// Returns this position translated by the provided offsets.
    #[must_use]
    pub fn offset_by(self, dx: f32, dy: f32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }
}

/// Inclusive range a base stat is rolled from when an enemy is instantiated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatRange {
    min: f32,
    max: f32,
}

impl StatRange {
    /// Creates a new stat range from its bounds.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Lower bound of the range.
    #[must_use]
    pub const fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound of the range.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Midpoint of the range, used by the difficulty model.
    #[must_use]
    pub fn average(&self) -> f32 {
        (self.min + self.max) / 2.0
    }
}

/// Base stat ranges describing an enemy archetype.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Hit points rolled at instantiation time.
    pub health: StatRange,
    /// Damage dealt per attack.
    pub damage: StatRange,
    /// Seconds between successive attacks.
    pub attack_delay: StatRange,
    /// Movement speed in world units per second.
    pub move_speed: StatRange,
}

impl EnemyStats {
    /// Scalar difficulty score derived from the stat ranges.
    ///
    /// Combines average health, damage per second, and movement speed as
    /// `0.5 * health + 2.0 * dps + 1.5 * speed`. A non-positive average
    /// attack delay degrades `dps` to the raw average damage so the score
    /// stays finite.
    #[must_use]
    pub fn difficulty_score(&self) -> f32 {
        let avg_health = self.health.average();
        let avg_damage = self.damage.average();
        let avg_attack_delay = self.attack_delay.average();
        let avg_speed = self.move_speed.average();
        let dps = if avg_attack_delay > 0.0 {
            avg_damage / avg_attack_delay
        } else {
            avg_damage
        };
        avg_health * 0.5 + dps * 2.0 + avg_speed * 1.5
    }
}

/// Target-difficulty curve evaluated once per round.
///
/// The curve is deliberately unbounded; the set of unlocked archetypes is
/// what keeps the round search space honest, not this function.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyCurve {
    base: f32,
    increase_per_round: f32,
}

impl Default for DifficultyCurve {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DIFFICULTY, DEFAULT_DIFFICULTY_INCREASE_PER_ROUND)
    }
}

impl DifficultyCurve {
    /// Creates a new curve from its base value and per-round growth.
    #[must_use]
    pub const fn new(base: f32, increase_per_round: f32) -> Self {
        Self {
            base,
            increase_per_round,
        }
    }

    /// Difficulty the composition systems should aim for in `round`.
    #[must_use]
    pub fn target_for_round(&self, round: RoundNumber) -> f32 {
        self.base + round.get() as f32 * self.increase_per_round
    }
}

/// Immutable authoring-time description of an enemy archetype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyDescriptor {
    id: EnemyTypeId,
    name: String,
    point_cost: PointCost,
    stats: EnemyStats,
    variants: Vec<VariantId>,
    difficulty: f32,
    selection_weight: u32,
}

impl EnemyDescriptor {
    /// Creates a new descriptor, deriving the difficulty score from `stats`.
    /// The selection weight defaults to one, an even share.
    #[must_use]
    pub fn new(
        id: EnemyTypeId,
        name: impl Into<String>,
        point_cost: PointCost,
        stats: EnemyStats,
        variants: Vec<VariantId>,
    ) -> Self {
        let difficulty = stats.difficulty_score();
        Self {
            id,
            name: name.into(),
            point_cost,
            stats,
            variants,
            difficulty,
            selection_weight: 1,
        }
    }

    /// Sets the relative weight used when several archetypes share a point
    /// cost and one must be drawn. Zero removes the archetype from the draw.
    #[must_use]
    pub fn with_selection_weight(mut self, weight: u32) -> Self {
        self.selection_weight = weight;
        self
    }

    /// Identifier of the archetype.
    #[must_use]
    pub const fn id(&self) -> EnemyTypeId {
        self.id
    }

    /// Human-readable archetype name used for diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Integral cost of one instance under the budget composer.
    #[must_use]
    pub const fn point_cost(&self) -> PointCost {
        self.point_cost
    }

    /// Base stat ranges of the archetype.
    #[must_use]
    pub const fn stats(&self) -> &EnemyStats {
        &self.stats
    }

    /// Variants a factory may instantiate for this archetype.
    #[must_use]
    pub fn variants(&self) -> &[VariantId] {
        &self.variants
    }

    /// Difficulty score derived from the stat ranges at construction time.
    #[must_use]
    pub const fn difficulty(&self) -> f32 {
        self.difficulty
    }

    /// Relative weight of this archetype among same-cost alternatives.
    #[must_use]
    pub const fn selection_weight(&self) -> u32 {
        self.selection_weight
    }
}

/// Ordered registry of enemy archetypes.
///
/// Authoring order doubles as the unlock progression: the first descriptor
/// is available from round one, and one further descriptor unlocks per
/// presentation interval.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnemyCatalog {
    descriptors: Vec<EnemyDescriptor>,
}

impl EnemyCatalog {
    /// Builds a catalog from descriptors, keeping the first descriptor
    /// registered for each identifier. Later duplicates are dropped with a
    /// warning.
    #[must_use]
    pub fn from_descriptors(descriptors: Vec<EnemyDescriptor>) -> Self {
        let mut unique: Vec<EnemyDescriptor> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if unique.iter().any(|existing| existing.id() == descriptor.id()) {
                warn!(
                    enemy_type = descriptor.id().get(),
                    name = descriptor.name(),
                    "duplicate archetype id dropped from catalog"
                );
                continue;
            }
            unique.push(descriptor);
        }
        Self { descriptors: unique }
    }

    /// Number of archetypes in the progression.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Reports whether the catalog holds no archetypes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Looks up the descriptor registered for `id`.
    #[must_use]
    pub fn descriptor(&self, id: EnemyTypeId) -> Option<&EnemyDescriptor> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.id() == id)
    }

    /// Full unlock progression in authoring order.
    #[must_use]
    pub fn progression(&self) -> &[EnemyDescriptor] {
        &self.descriptors
    }

    /// Leading slice of the progression unlocked so far; `count` is clamped
    /// to the catalog size.
    #[must_use]
    pub fn unlocked(&self, count: usize) -> &[EnemyDescriptor] {
        let clamped = count.min(self.descriptors.len());
        &self.descriptors[..clamped]
    }

    /// Number of archetypes unlocked by `round` for a given presentation
    /// interval: `1 + (round - 1) / interval`, clamped to the catalog size.
    #[must_use]
    pub fn unlocked_count_for_round(&self, round: RoundNumber, interval: NonZeroU32) -> usize {
        if self.descriptors.is_empty() {
            return 0;
        }
        let earned = 1 + (round.get().saturating_sub(1) / interval.get()) as usize;
        earned.min(self.descriptors.len())
    }

    /// Distinct point costs among the first `count` unlocked archetypes,
    /// sorted ascending for the budget composer.
    #[must_use]
    pub fn distinct_point_costs(&self, count: usize) -> Vec<PointCost> {
        let mut costs: Vec<PointCost> = self
            .unlocked(count)
            .iter()
            .map(EnemyDescriptor::point_cost)
            .collect();
        costs.sort_unstable();
        costs.dedup();
        costs
    }
}

/// Distinguishes showcase rounds from algorithmically composed ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoundKind {
    /// Round dedicated to introducing one newly unlocked archetype.
    Presentation {
        /// Index into the progression of the archetype being introduced.
        unlock_index: usize,
    },
    /// Round whose composition was generated against a difficulty target.
    Procedural,
}

/// One round's full spawn list together with its computed difficulty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoundPlan {
    entries: Vec<EnemyTypeId>,
    total_difficulty: f32,
}

impl RoundPlan {
    /// Creates a plan from spawn entries and their summed difficulty.
    #[must_use]
    pub fn new(entries: Vec<EnemyTypeId>, total_difficulty: f32) -> Self {
        Self {
            entries,
            total_difficulty,
        }
    }

    /// Plan that fields no enemies at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Archetypes to spawn, in plan order.
    #[must_use]
    pub fn entries(&self) -> &[EnemyTypeId] {
        &self.entries
    }

    /// Summed difficulty score of every entry in the plan.
    #[must_use]
    pub const fn total_difficulty(&self) -> f32 {
        self.total_difficulty
    }

    /// Reports whether the plan fields no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of enemies the plan fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Consumes the plan, yielding its spawn entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<EnemyTypeId> {
        self.entries
    }
}

/// Commands that express all permissible director transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the director's clock, counting down any pending round start.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests an immediate transition into the next round.
    StartNextRound,
    /// Hard-cancels the current round and restarts the session at `round`.
    JumpToRound {
        /// One-based round the session should continue from.
        round: RoundNumber,
    },
    /// Reports that a previously spawned enemy died.
    NotifyEnemyDied {
        /// Handle of the enemy instance that died.
        enemy: EnemyId,
    },
}

/// Events broadcast by the director after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that a new round began.
    RoundStarted {
        /// Round that became active.
        round: RoundNumber,
        /// Whether the round showcases a new archetype or was composed.
        kind: RoundKind,
    },
    /// One-way notification for UI layers displaying the round number.
    RoundDisplayUpdated {
        /// Round number that should be displayed.
        round: RoundNumber,
    },
    /// Confirms that an enemy instance entered the play space.
    EnemySpawned {
        /// Handle allocated by the factory for the new instance.
        enemy: EnemyId,
        /// Archetype of the spawned instance.
        enemy_type: EnemyTypeId,
        /// World-space location the instance was placed at.
        position: Position,
    },
    /// Asks the camera to dwell on a newly introduced enemy.
    CameraFocusRequested {
        /// Handle of the enemy the camera should frame.
        enemy: EnemyId,
        /// How long the camera should hold the focus.
        duration: Duration,
    },
    /// Reports that every enemy of the active round has been cleared.
    RoundCompleted {
        /// Round that finished.
        round: RoundNumber,
    },
}

/// External collaborator that instantiates enemies on request.
///
/// A factory claims the archetypes it can build via
/// [`Self::managed_types`]; the director routes each spawn request to the
/// first factory registered for the requested archetype.
pub trait EnemyFactory {
    /// Archetypes this factory is able to instantiate.
    fn managed_types(&self) -> &[EnemyTypeId];

    /// Instantiates one enemy of `enemy_type` at `position`, returning the
    /// handle of the new instance, or `None` when instantiation failed.
    fn create_enemy(&mut self, enemy_type: EnemyTypeId, position: Position) -> Option<EnemyId>;
}

/// External collaborator exposing the player's current location.
pub trait PlayerLocator {
    /// Current world-space position of the player.
    fn player_position(&self) -> Position;
}

/// Optional collaborator that snaps points onto walkable ground.
pub trait WalkableSurfaceOracle {
    /// Returns a valid walkable position within `tolerance` of `point`,
    /// or `None` when no such position exists.
    fn sample_position(&self, point: Position, tolerance: f32) -> Option<Position>;
}
