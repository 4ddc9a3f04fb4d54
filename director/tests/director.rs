use std::cell::Cell;
use std::num::{NonZeroU32, NonZeroUsize};
use std::rc::Rc;
use std::time::Duration;

use horde_core::{
    Command, EnemyCatalog, EnemyDescriptor, EnemyFactory, EnemyId, EnemyStats, EnemyTypeId, Event,
    PlayerLocator, PointCost, Position, RoundKind, RoundNumber, StatRange, VariantId,
    WalkableSurfaceOracle,
};
use horde_director::{
    apply, query, CompositionStrategy, DirectorBuilder, DirectorConfig, DirectorError,
    RoundDirector,
};

struct StubFactory {
    managed: Vec<EnemyTypeId>,
    next_handle: u32,
    fail: bool,
    fail_after: Option<u32>,
    created: Rc<Cell<u32>>,
}

impl StubFactory {
    fn managing(types: &[u32], first_handle: u32) -> Self {
        Self {
            managed: types.iter().copied().map(EnemyTypeId::new).collect(),
            next_handle: first_handle,
            fail: false,
            fail_after: None,
            created: Rc::new(Cell::new(0)),
        }
    }
}

impl EnemyFactory for StubFactory {
    fn managed_types(&self) -> &[EnemyTypeId] {
        &self.managed
    }

    fn create_enemy(&mut self, _enemy_type: EnemyTypeId, _position: Position) -> Option<EnemyId> {
        if self.fail {
            return None;
        }
        if let Some(limit) = self.fail_after {
            if self.created.get() >= limit {
                return None;
            }
        }
        self.created.set(self.created.get() + 1);
        let handle = EnemyId::new(self.next_handle);
        self.next_handle += 1;
        Some(handle)
    }
}

struct CountingOracle {
    calls: Rc<Cell<u32>>,
}

impl WalkableSurfaceOracle for CountingOracle {
    fn sample_position(&self, point: Position, _tolerance: f32) -> Option<Position> {
        self.calls.set(self.calls.get() + 1);
        Some(point)
    }
}

struct StubPlayer;

impl PlayerLocator for StubPlayer {
    fn player_position(&self) -> Position {
        Position::new(2.0, 2.0)
    }
}

fn descriptor(id: u32, point_cost: u32, health: f32) -> EnemyDescriptor {
    EnemyDescriptor::new(
        EnemyTypeId::new(id),
        format!("enemy-{id}"),
        PointCost::new(NonZeroU32::new(point_cost).expect("cost")),
        EnemyStats {
            health: StatRange::new(health, health),
            damage: StatRange::new(4.0, 6.0),
            attack_delay: StatRange::new(1.0, 2.0),
            move_speed: StatRange::new(2.0, 3.0),
        },
        vec![VariantId::new(0), VariantId::new(1)],
    )
}

fn three_archetype_catalog() -> EnemyCatalog {
    EnemyCatalog::from_descriptors(vec![
        descriptor(0, 2, 20.0),
        descriptor(1, 5, 40.0),
        descriptor(2, 8, 80.0),
    ])
}

fn config_with_interval(interval: u32) -> DirectorConfig {
    DirectorConfig {
        presentation_interval: NonZeroU32::new(interval).expect("interval"),
        rng_seed: 0x0dd_ba11,
        ..DirectorConfig::default()
    }
}

fn build_director(config: DirectorConfig) -> RoundDirector {
    DirectorBuilder::new(config, three_archetype_catalog())
        .with_factory(Box::new(StubFactory::managing(&[0, 1, 2], 100)))
        .with_player_locator(Box::new(StubPlayer))
        .build()
        .expect("director must build")
}

fn started_kinds(events: &[Event]) -> Vec<(u32, RoundKind)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::RoundStarted { round, kind } => Some((round.get(), *kind)),
            _ => None,
        })
        .collect()
}

#[test]
fn builder_requires_a_player_locator() {
    let result = DirectorBuilder::new(DirectorConfig::default(), three_archetype_catalog())
        .with_factory(Box::new(StubFactory::managing(&[0, 1, 2], 0)))
        .build();
    assert!(matches!(result, Err(DirectorError::MissingPlayerLocator)));
}

#[test]
fn builder_rejects_an_empty_catalog() {
    let result = DirectorBuilder::new(
        DirectorConfig::default(),
        EnemyCatalog::from_descriptors(Vec::new()),
    )
    .with_player_locator(Box::new(StubPlayer))
    .build();
    assert!(matches!(result, Err(DirectorError::EmptyCatalog)));
}

#[test]
fn presentation_rounds_follow_the_interval() {
    let mut director = build_director(config_with_interval(5));
    let mut events = Vec::new();
    for _ in 0..12 {
        apply(&mut director, Command::StartNextRound, &mut events);
    }

    for (round, kind) in started_kinds(&events) {
        let expected_presentation = matches!(round, 1 | 6 | 11);
        match kind {
            RoundKind::Presentation { unlock_index } => {
                assert!(expected_presentation, "round {round} should be procedural");
                assert_eq!(unlock_index as u32, (round - 1) / 5);
            }
            RoundKind::Procedural => {
                assert!(!expected_presentation, "round {round} should showcase");
            }
        }
    }
}

#[test]
fn jump_to_round_eleven_is_the_last_presentation() {
    let mut director = build_director(config_with_interval(5));
    let mut events = Vec::new();
    apply(
        &mut director,
        Command::JumpToRound {
            round: RoundNumber::new(11),
        },
        &mut events,
    );

    assert_eq!(query::round(&director).get(), 11);
    assert_eq!(
        query::round_kind(&director),
        Some(RoundKind::Presentation { unlock_index: 2 })
    );
    assert_eq!(query::unlocked_types(&director).len(), 3);
}

#[test]
fn jump_past_the_progression_is_procedural_with_all_unlocked() {
    let mut director = build_director(config_with_interval(5));
    let mut events = Vec::new();
    apply(
        &mut director,
        Command::JumpToRound {
            round: RoundNumber::new(16),
        },
        &mut events,
    );

    assert_eq!(query::round(&director).get(), 16);
    assert_eq!(query::round_kind(&director), Some(RoundKind::Procedural));
    assert_eq!(query::unlocked_types(&director).len(), 3);
}

#[test]
fn untracked_death_notification_is_a_no_op() {
    let mut director = build_director(config_with_interval(3));
    let mut events = Vec::new();
    apply(&mut director, Command::StartNextRound, &mut events);
    let live_before = query::active_count(&director);
    assert!(live_before > 0);

    apply(
        &mut director,
        Command::NotifyEnemyDied {
            enemy: EnemyId::new(9_999),
        },
        &mut events,
    );
    assert_eq!(query::active_count(&director), live_before);
}

#[test]
fn concurrency_cap_is_honored_and_backfilled() {
    let config = DirectorConfig {
        max_concurrent_enemies: NonZeroUsize::new(2).expect("cap"),
        presentation_spawn_count: NonZeroU32::new(5).expect("count"),
        ..config_with_interval(3)
    };
    let mut director = build_director(config);
    let mut events = Vec::new();
    apply(&mut director, Command::StartNextRound, &mut events);

    assert_eq!(query::active_count(&director), 2);
    assert_eq!(query::waiting_count(&director), 3);

    // Each death frees one slot that is immediately backfilled.
    while query::waiting_count(&director) > 0 {
        let victim = query::active_enemies(&director)[0];
        apply(
            &mut director,
            Command::NotifyEnemyDied { enemy: victim },
            &mut events,
        );
        assert!(query::active_count(&director) <= 2, "cap exceeded");
    }
    assert_eq!(query::active_count(&director), 2);
}

#[test]
fn clearing_a_round_schedules_exactly_one_next_round() {
    let config = DirectorConfig {
        presentation_spawn_count: NonZeroU32::new(2).expect("count"),
        round_start_delay: Duration::from_secs(3),
        ..config_with_interval(3)
    };
    let mut director = build_director(config);
    let mut events = Vec::new();
    apply(&mut director, Command::StartNextRound, &mut events);

    let victims = query::active_enemies(&director);
    for victim in &victims {
        apply(
            &mut director,
            Command::NotifyEnemyDied { enemy: *victim },
            &mut events,
        );
    }
    assert!(query::is_round_pending(&director));

    // A late duplicate notification must not schedule a second countdown.
    apply(
        &mut director,
        Command::NotifyEnemyDied { enemy: victims[0] },
        &mut events,
    );

    events.clear();
    apply(
        &mut director,
        Command::Tick {
            dt: Duration::from_secs(2),
        },
        &mut events,
    );
    assert!(events.is_empty(), "countdown must not fire early");

    apply(
        &mut director,
        Command::Tick {
            dt: Duration::from_secs(2),
        },
        &mut events,
    );
    let started = started_kinds(&events);
    assert_eq!(started.len(), 1, "exactly one round may start");
    assert_eq!(started[0].0, 2);
}

#[test]
fn missing_factory_skips_spawns_without_failing() {
    // The factory only claims archetype 0, so round 6 (showcasing
    // archetype 1) cannot field anything and completes immediately.
    let mut director = DirectorBuilder::new(config_with_interval(5), three_archetype_catalog())
        .with_factory(Box::new(StubFactory::managing(&[0], 0)))
        .with_player_locator(Box::new(StubPlayer))
        .build()
        .expect("director must build");

    let mut events = Vec::new();
    apply(
        &mut director,
        Command::JumpToRound {
            round: RoundNumber::new(6),
        },
        &mut events,
    );

    assert_eq!(query::active_count(&director), 0);
    assert_eq!(query::waiting_count(&director), 0);
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::RoundCompleted { round } if round.get() == 6)),
        "an unspawnable round must complete immediately"
    );
    assert!(query::is_round_pending(&director));
}

#[test]
fn failing_factory_degrades_to_an_empty_round() {
    let mut failing = StubFactory::managing(&[0, 1, 2], 0);
    failing.fail = true;
    let mut director = DirectorBuilder::new(config_with_interval(3), three_archetype_catalog())
        .with_factory(Box::new(failing))
        .with_player_locator(Box::new(StubPlayer))
        .build()
        .expect("director must build");

    let mut events = Vec::new();
    apply(&mut director, Command::StartNextRound, &mut events);
    assert_eq!(query::active_count(&director), 0);
    assert!(query::is_round_pending(&director));
}

#[test]
fn skipped_backfills_drain_the_queue_and_complete_the_round() {
    // One slot, five planned spawns; the factory dies after the first
    // instance, so every backfill attempt is skipped. The round must still
    // complete and schedule its successor instead of stalling.
    let mut factory = StubFactory::managing(&[0, 1, 2], 0);
    factory.fail_after = Some(1);
    let config = DirectorConfig {
        max_concurrent_enemies: NonZeroUsize::new(1).expect("cap"),
        presentation_spawn_count: NonZeroU32::new(5).expect("count"),
        ..config_with_interval(3)
    };
    let mut director = DirectorBuilder::new(config, three_archetype_catalog())
        .with_factory(Box::new(factory))
        .with_player_locator(Box::new(StubPlayer))
        .build()
        .expect("director must build");

    let mut events = Vec::new();
    apply(&mut director, Command::StartNextRound, &mut events);
    assert_eq!(query::active_count(&director), 1);
    assert_eq!(query::waiting_count(&director), 4);

    let victim = query::active_enemies(&director)[0];
    apply(
        &mut director,
        Command::NotifyEnemyDied { enemy: victim },
        &mut events,
    );

    assert_eq!(query::active_count(&director), 0);
    assert_eq!(query::waiting_count(&director), 0, "queue must drain");
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::RoundCompleted { round } if round.get() == 1)),
        "the cleared round must complete"
    );
    assert!(query::is_round_pending(&director), "next round must be scheduled");
}

#[test]
fn factory_misses_leave_the_placement_stream_untouched() {
    // Round 6 showcases archetype 1, which the factory does not claim.
    // Skipped spawns resolve the factory first, so the oracle never sees a
    // placement attempt.
    let oracle = CountingOracle {
        calls: Rc::new(Cell::new(0)),
    };
    let samples = Rc::clone(&oracle.calls);
    let mut director = DirectorBuilder::new(config_with_interval(5), three_archetype_catalog())
        .with_factory(Box::new(StubFactory::managing(&[0], 0)))
        .with_player_locator(Box::new(StubPlayer))
        .with_surface_oracle(Box::new(oracle))
        .build()
        .expect("director must build");

    let mut events = Vec::new();
    apply(
        &mut director,
        Command::JumpToRound {
            round: RoundNumber::new(6),
        },
        &mut events,
    );
    assert_eq!(samples.get(), 0, "skipped spawns must not draw positions");

    // A round the factory can field does reach the oracle.
    apply(
        &mut director,
        Command::JumpToRound {
            round: RoundNumber::new(1),
        },
        &mut events,
    );
    assert!(samples.get() > 0);
}

#[test]
fn first_registered_factory_wins_shared_archetypes() {
    let first = StubFactory::managing(&[0, 1, 2], 0);
    let first_counter = Rc::clone(&first.created);
    let second = StubFactory::managing(&[0, 1, 2], 1_000);
    let second_counter = Rc::clone(&second.created);

    let mut director = DirectorBuilder::new(config_with_interval(3), three_archetype_catalog())
        .with_factory(Box::new(first))
        .with_factory(Box::new(second))
        .with_player_locator(Box::new(StubPlayer))
        .build()
        .expect("director must build");

    let mut events = Vec::new();
    apply(&mut director, Command::StartNextRound, &mut events);

    assert!(first_counter.get() > 0);
    assert_eq!(second_counter.get(), 0, "duplicate registrant must stay idle");
}

#[test]
fn presentation_round_requests_camera_focus_once() {
    let mut director = build_director(config_with_interval(3));
    let mut events = Vec::new();
    apply(&mut director, Command::StartNextRound, &mut events);

    let focus_events: Vec<&Event> = events
        .iter()
        .filter(|event| matches!(event, Event::CameraFocusRequested { .. }))
        .collect();
    assert_eq!(focus_events.len(), 1);

    // Procedural rounds never ask for camera focus.
    events.clear();
    apply(&mut director, Command::StartNextRound, &mut events);
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, Event::CameraFocusRequested { .. })),
        "procedural rounds must not focus the camera"
    );
}

#[test]
fn budget_strategy_fields_enemies_within_the_cap() {
    let config = DirectorConfig {
        strategy: CompositionStrategy::Budget,
        ..config_with_interval(2)
    };
    let mut director = build_director(config);
    let mut events = Vec::new();
    // Round 4 is procedural under interval 2 and unlocks two archetypes.
    apply(
        &mut director,
        Command::JumpToRound {
            round: RoundNumber::new(4),
        },
        &mut events,
    );

    assert_eq!(query::round_kind(&director), Some(RoundKind::Procedural));
    assert!(query::active_count(&director) > 0);
    assert!(query::active_count(&director) <= 10);
}

#[test]
fn budget_expansion_honors_selection_weights() {
    // Two archetypes share the cost; the zero-weight one must never be
    // drawn when expanding the composition into concrete spawns.
    let catalog = EnemyCatalog::from_descriptors(vec![
        descriptor(0, 2, 20.0).with_selection_weight(0),
        descriptor(1, 2, 30.0).with_selection_weight(7),
    ]);
    let config = DirectorConfig {
        strategy: CompositionStrategy::Budget,
        ..config_with_interval(1)
    };
    let mut director = DirectorBuilder::new(config, catalog)
        .with_factory(Box::new(StubFactory::managing(&[0, 1], 0)))
        .with_player_locator(Box::new(StubPlayer))
        .build()
        .expect("director must build");

    let mut events = Vec::new();
    // Round 3 is the first procedural round under interval 1.
    apply(
        &mut director,
        Command::JumpToRound {
            round: RoundNumber::new(3),
        },
        &mut events,
    );

    let spawned: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { enemy_type, .. } => Some(enemy_type.get()),
            _ => None,
        })
        .collect();
    assert!(!spawned.is_empty());
    assert!(
        spawned.iter().all(|&enemy_type| enemy_type == 1),
        "zero-weight archetype must never be fielded"
    );
}

#[test]
fn identical_seeds_replay_identical_event_streams() {
    let script = |director: &mut RoundDirector| {
        let mut events = Vec::new();
        apply(director, Command::StartNextRound, &mut events);
        apply(director, Command::StartNextRound, &mut events);
        let victims = query::active_enemies(director);
        for victim in victims {
            apply(director, Command::NotifyEnemyDied { enemy: victim }, &mut events);
        }
        apply(
            director,
            Command::Tick {
                dt: Duration::from_secs(10),
            },
            &mut events,
        );
        events
    };

    let mut first = build_director(config_with_interval(3));
    let mut second = build_director(config_with_interval(3));
    assert_eq!(
        script(&mut first),
        script(&mut second),
        "replay diverged between identical seeds"
    );
}
