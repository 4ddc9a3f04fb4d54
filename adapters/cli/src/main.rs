#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver that plays the round loop in a terminal.
//!
//! Builds the demo catalog, wires stub collaborators into the director, and
//! clears the requested number of rounds while printing the event stream.

mod catalog;

use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use horde_core::{Command, EnemyFactory, EnemyId, EnemyTypeId, Event, PlayerLocator, Position};
use horde_director::{
    apply, query, CompositionStrategy, DirectorBuilder, DirectorConfig, RoundDirector,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    /// Greedy point-budget composition.
    Budget,
    /// Genetic search against the difficulty curve.
    Genetic,
}

impl From<StrategyArg> for CompositionStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Budget => CompositionStrategy::Budget,
            StrategyArg::Genetic => CompositionStrategy::Genetic,
        }
    }
}

#[derive(Debug, Parser)]
#[command(about = "Plays the horde round loop without a renderer")]
struct Args {
    /// Number of rounds to clear before exiting.
    #[arg(long, default_value_t = 10)]
    rounds: u32,

    /// Seed for every random stream inside the director.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Composition algorithm used for procedural rounds.
    #[arg(long, value_enum, default_value = "genetic")]
    strategy: StrategyArg,

    /// Rounds between two archetype introductions.
    #[arg(long, default_value_t = 3)]
    presentation_interval: u32,

    /// Upper bound on simultaneously live enemies.
    #[arg(long, default_value_t = 10)]
    max_concurrent: usize,
}

/// Factory that fabricates sequential handles for every archetype.
struct SimulatedFactory {
    managed: Vec<EnemyTypeId>,
    next_handle: u32,
}

impl EnemyFactory for SimulatedFactory {
    fn managed_types(&self) -> &[EnemyTypeId] {
        &self.managed
    }

    fn create_enemy(&mut self, _enemy_type: EnemyTypeId, _position: Position) -> Option<EnemyId> {
        let handle = EnemyId::new(self.next_handle);
        self.next_handle += 1;
        Some(handle)
    }
}

/// Player pinned to a fixed spot on the map.
struct FixedPlayer;

impl PlayerLocator for FixedPlayer {
    fn player_position(&self) -> Position {
        Position::new(3.0, 3.0)
    }
}

fn render(events: &mut Vec<Event>) {
    for event in events.drain(..) {
        match event {
            Event::RoundStarted { round, kind } => {
                println!("round {} started ({kind:?})", round.get());
            }
            Event::RoundDisplayUpdated { round } => {
                println!("  ui: round counter shows {}", round.get());
            }
            Event::EnemySpawned {
                enemy,
                enemy_type,
                position,
            } => {
                println!(
                    "  spawn: enemy #{} of type {} at ({:.1}, {:.1})",
                    enemy.get(),
                    enemy_type.get(),
                    position.x(),
                    position.y()
                );
            }
            Event::CameraFocusRequested { enemy, duration } => {
                println!(
                    "  camera: focus enemy #{} for {:.1}s",
                    enemy.get(),
                    duration.as_secs_f32()
                );
            }
            Event::RoundCompleted { round } => {
                println!("round {} cleared", round.get());
            }
        }
    }
}

fn clear_round(director: &mut RoundDirector, events: &mut Vec<Event>) {
    while query::active_count(director) > 0 {
        let victim = query::active_enemies(director)[0];
        apply(director, Command::NotifyEnemyDied { enemy: victim }, events);
        render(events);
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = DirectorConfig {
        presentation_interval: NonZeroU32::new(args.presentation_interval)
            .context("presentation interval must be at least 1")?,
        max_concurrent_enemies: NonZeroUsize::new(args.max_concurrent)
            .context("max concurrent enemies must be at least 1")?,
        strategy: args.strategy.into(),
        rng_seed: args.seed,
        ..DirectorConfig::default()
    };

    let catalog = catalog::demo_catalog();
    let managed: Vec<EnemyTypeId> = catalog.progression().iter().map(|d| d.id()).collect();
    let mut director = DirectorBuilder::new(config, catalog)
        .with_factory(Box::new(SimulatedFactory {
            managed,
            next_handle: 1,
        }))
        .with_player_locator(Box::new(FixedPlayer))
        .build()
        .context("failed to assemble the round director")?;

    let mut events = Vec::new();
    apply(&mut director, Command::StartNextRound, &mut events);
    render(&mut events);

    for _ in 1..args.rounds {
        clear_round(&mut director, &mut events);
        // Skip past the between-round delay in one tick.
        apply(
            &mut director,
            Command::Tick {
                dt: config.round_start_delay + Duration::from_millis(1),
            },
            &mut events,
        );
        render(&mut events);
    }
    clear_round(&mut director, &mut events);

    Ok(())
}
