//! Demo enemy catalog used by the headless driver.

use std::num::NonZeroU32;

use horde_core::{EnemyCatalog, EnemyDescriptor, EnemyStats, EnemyTypeId, PointCost, StatRange, VariantId};

fn cost(value: u32) -> PointCost {
    PointCost::new(NonZeroU32::new(value).expect("point costs are positive"))
}

/// Four-archetype progression: three slime sizes and a skeleton archer.
pub(crate) fn demo_catalog() -> EnemyCatalog {
    EnemyCatalog::from_descriptors(vec![
        EnemyDescriptor::new(
            EnemyTypeId::new(0),
            "slime-little",
            cost(2),
            EnemyStats {
                health: StatRange::new(10.0, 20.0),
                damage: StatRange::new(3.0, 5.0),
                attack_delay: StatRange::new(1.0, 2.0),
                move_speed: StatRange::new(2.0, 3.0),
            },
            vec![VariantId::new(0), VariantId::new(1)],
        ),
        EnemyDescriptor::new(
            EnemyTypeId::new(1),
            "slime-medium",
            cost(4),
            EnemyStats {
                health: StatRange::new(25.0, 40.0),
                damage: StatRange::new(5.0, 8.0),
                attack_delay: StatRange::new(1.2, 2.2),
                move_speed: StatRange::new(1.8, 2.6),
            },
            vec![VariantId::new(0)],
        ),
        EnemyDescriptor::new(
            EnemyTypeId::new(2),
            "slime-big",
            cost(7),
            EnemyStats {
                health: StatRange::new(60.0, 90.0),
                damage: StatRange::new(8.0, 12.0),
                attack_delay: StatRange::new(1.5, 2.5),
                move_speed: StatRange::new(1.2, 1.8),
            },
            vec![VariantId::new(0)],
        ),
        EnemyDescriptor::new(
            EnemyTypeId::new(3),
            "skeleton-archer",
            cost(6),
            EnemyStats {
                health: StatRange::new(15.0, 25.0),
                damage: StatRange::new(6.0, 9.0),
                attack_delay: StatRange::new(0.8, 1.4),
                move_speed: StatRange::new(2.2, 3.0),
            },
            vec![VariantId::new(0), VariantId::new(1), VariantId::new(2)],
        ),
    ])
}
