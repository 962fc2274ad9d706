//! Тесты детерминизма
//!
//! Одинаковый seed → идентичные снапшоты после headless дуэли
//! (случайные нажатия слотов + hit-sweep'ы от случайных атак).

use bevy::prelude::*;
use rand::Rng;

use atlas_combat::actions::{ActionSlot, ActionSlots, SlotPressed, SlotReleased};
use atlas_combat::combat::events::AttackHit;
use atlas_combat::*;

#[derive(Component, Debug)]
struct Opponent(Entity);

/// Случайный input: press слота, release block, иногда hit по противнику
fn random_duel_input(
    mut rng: ResMut<DeterministicRng>,
    actors: Query<(Entity, &Opponent)>,
    mut presses: EventWriter<SlotPressed>,
    mut releases: EventWriter<SlotReleased>,
    mut hits: EventWriter<AttackHit>,
) {
    let mut ordered: Vec<(Entity, Entity)> = actors.iter().map(|(e, o)| (e, o.0)).collect();
    ordered.sort();

    for (actor, opponent) in ordered {
        if rng.rng.gen_bool(0.1) {
            let slot = ActionSlot::from_index(rng.rng.gen_range(0..ActionSlot::COUNT))
                .unwrap_or(ActionSlot::Slot1);
            presses.write(SlotPressed::new(actor, slot));
        }
        if rng.rng.gen_bool(0.05) {
            releases.write(SlotReleased {
                actor,
                slot: ActionSlot::Slot3,
            });
        }
        if rng.rng.gen_bool(0.08) {
            hits.write(AttackHit {
                attacker: actor,
                target: opponent,
                attack: None,
            });
        }
    }
}

fn loadout() -> ActionSlots {
    ActionSlots::with_loadout(&[
        (ActionSlot::Slot1, "basic_attack"),
        (ActionSlot::Slot2, "heavy_attack"),
        (ActionSlot::Slot3, "block"),
        (ActionSlot::Slot4, "dash"),
        (ActionSlot::Slot5, "debris_pull"),
    ])
}

/// Запускает дуэль и возвращает snapshot мира
fn run_simulation(seed: u64, tick_count: usize) -> Vec<u8> {
    let mut app = create_headless_app(seed);
    set_log_level(LogLevel::Error);

    app.add_systems(
        FixedUpdate,
        random_duel_input
            .after(CombatSet::Input)
            .before(CombatSet::Actions),
    );

    let world = app.world_mut();
    let a = world.spawn_empty().id();
    let b = world.spawn_empty().id();
    world
        .entity_mut(a)
        .insert((CombatActor, loadout(), Opponent(b), Transform::from_xyz(0.0, 0.0, 0.0)));
    world
        .entity_mut(b)
        .insert((CombatActor, loadout(), Opponent(a), Transform::from_xyz(1.5, 0.0, 0.0)));

    for _ in 0..tick_count {
        app.update();
    }

    let world = app.world_mut();
    let mut snapshot = world_snapshot::<Health>(world);
    snapshot.extend(world_snapshot::<Poise>(world));
    snapshot.extend(world_snapshot::<Vulnerability>(world));
    snapshot.extend(world_snapshot::<CombatStateTags>(world));
    snapshot.extend(world_snapshot::<ActionSlots>(world));
    snapshot.extend(format!("{:?}", world.resource::<StationIntegrity>()).into_bytes());
    snapshot
}

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;
    const TICK_COUNT: usize = 1200;

    let snapshot1 = run_simulation(SEED, TICK_COUNT);
    let snapshot2 = run_simulation(SEED, TICK_COUNT);

    assert_eq!(
        snapshot1, snapshot2,
        "Симуляция с одинаковым seed ({}) дала разные результаты!",
        SEED
    );
}

#[test]
fn test_determinism_multiple_runs() {
    const SEED: u64 = 42;
    const TICK_COUNT: usize = 600;

    let snapshots: Vec<_> = (0..3).map(|_| run_simulation(SEED, TICK_COUNT)).collect();

    for (i, snapshot) in snapshots.iter().enumerate().skip(1) {
        assert_eq!(
            snapshots[0], *snapshot,
            "Прогон {} дал результат отличный от прогона 0",
            i
        );
    }
}

#[test]
fn test_different_seeds_diverge() {
    let snapshot1 = run_simulation(1, 900);
    let snapshot2 = run_simulation(2, 900);

    assert_ne!(snapshot1, snapshot2, "Разные seed должны давать разные дуэли");
}
