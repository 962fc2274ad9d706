//! Headless дуэль Atlas Combat
//!
//! Два бойца жмут случайные слоты (seeded RNG), animation layer
//! симулируется: каждая активированная melee атака через несколько тиков
//! "попадает" в противника.

use bevy::prelude::*;
use rand::Rng;

use atlas_combat::actions::{ActionActivated, ActionSlot, ActionSlots, SlotPressed, SlotReleased};
use atlas_combat::combat::events::{AttackHit, EntityDied};
use atlas_combat::{
    create_headless_app_with, init_logger, log_info, set_log_level, AtlasCombatPlugin, CombatActor,
    CombatSet, DeterministicRng, Health, LogLevel,
};

/// Тиков между активацией атаки и hit-sweep'ом
const HIT_DELAY_TICKS: u32 = 12;
const MAX_TICKS: u32 = 3600;

#[derive(Component)]
struct Duelist {
    opponent: Entity,
    /// Тиков до hit-sweep текущей атаки
    pending_hit: Option<u32>,
    block_held: u32,
}

#[derive(Resource, Default)]
struct DuelOutcome {
    winner: Option<Entity>,
    ticks: u32,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let seed = args
        .get(1)
        .and_then(|arg| arg.parse::<u64>().ok())
        .unwrap_or(42);

    // atlas_combat [seed] [rules.ron] [actions.ron]
    let mut plugin = AtlasCombatPlugin::default();
    if let Some(path) = args.get(2) {
        plugin = plugin.with_rules(path);
    }
    if let Some(path) = args.get(3) {
        plugin = plugin.with_actions(path);
    }

    init_logger();
    set_log_level(LogLevel::Info);
    log_info(&format!("Starting Atlas Combat headless duel (seed: {})", seed));

    let mut app = create_headless_app_with(seed, plugin);
    app.init_resource::<DuelOutcome>().add_systems(
        FixedUpdate,
        (
            choose_inputs.before(CombatSet::Actions).after(CombatSet::Input),
            simulate_hit_sweeps
                .after(CombatSet::Actions)
                .before(CombatSet::Resolve),
            track_deaths.after(CombatSet::Aftermath),
        ),
    );

    let loadout = || {
        ActionSlots::with_loadout(&[
            (ActionSlot::Slot1, "basic_attack"),
            (ActionSlot::Slot2, "heavy_attack"),
            (ActionSlot::Slot3, "block"),
            (ActionSlot::Slot4, "dash"),
        ])
    };

    let world = app.world_mut();
    let red = world.spawn_empty().id();
    let blue = world.spawn_empty().id();
    world.entity_mut(red).insert((
        CombatActor,
        loadout(),
        Transform::from_xyz(0.0, 0.0, 0.0),
        Duelist {
            opponent: blue,
            pending_hit: None,
            block_held: 0,
        },
    ));
    world.entity_mut(blue).insert((
        CombatActor,
        loadout(),
        Transform::from_xyz(1.5, 0.0, 0.0),
        Duelist {
            opponent: red,
            pending_hit: None,
            block_held: 0,
        },
    ));

    for tick in 0..MAX_TICKS {
        app.update();

        if tick % 300 == 0 {
            let world = app.world();
            let hp = |entity| world.get::<Health>(entity).map(|h| h.current).unwrap_or(0.0);
            log_info(&format!("Tick {}: red {:.1} HP, blue {:.1} HP", tick, hp(red), hp(blue)));
        }
        if app.world().resource::<DuelOutcome>().winner.is_some() {
            break;
        }
    }

    let outcome = app.world().resource::<DuelOutcome>();
    match outcome.winner {
        Some(winner) => log_info(&format!(
            "Duel over after {} fixed ticks, winner {:?}",
            outcome.ticks, winner
        )),
        None => log_info("Duel timed out, no winner"),
    }
}

/// AI stub: случайный слот раз в ~полсекунды, block держится 10-30 тиков
fn choose_inputs(
    mut rng: ResMut<DeterministicRng>,
    mut duelists: Query<(Entity, &mut Duelist, &Health)>,
    mut presses: EventWriter<SlotPressed>,
    mut releases: EventWriter<SlotReleased>,
) {
    // Порядок entity детерминирован спавном, но сортируем для надёжности
    let mut order: Vec<Entity> = duelists.iter().map(|(entity, ..)| entity).collect();
    order.sort();

    for entity in order {
        let Ok((_, mut duelist, health)) = duelists.get_mut(entity) else {
            continue;
        };
        if health.is_dead() {
            continue;
        }

        if duelist.block_held > 0 {
            duelist.block_held -= 1;
            if duelist.block_held == 0 {
                releases.write(SlotReleased {
                    actor: entity,
                    slot: ActionSlot::Slot3,
                });
            }
            continue;
        }

        if !rng.rng.gen_bool(1.0 / 30.0) {
            continue;
        }

        let slot = match rng.rng.gen_range(0..10) {
            0..=4 => ActionSlot::Slot1,
            5..=6 => ActionSlot::Slot2,
            7..=8 => ActionSlot::Slot3,
            _ => ActionSlot::Slot4,
        };
        if slot == ActionSlot::Slot3 {
            duelist.block_held = rng.rng.gen_range(10..30);
        }
        presses.write(SlotPressed::new(entity, slot));
    }
}

/// Animation layer stub: hit-sweep через HIT_DELAY_TICKS после старта атаки
fn simulate_hit_sweeps(
    mut activated: EventReader<ActionActivated>,
    mut duelists: Query<(Entity, &mut Duelist, &ActionSlots)>,
    mut hits: EventWriter<AttackHit>,
) {
    for event in activated.read() {
        if !matches!(event.slot, ActionSlot::Slot1 | ActionSlot::Slot2) {
            continue;
        }
        if let Ok((_, mut duelist, _)) = duelists.get_mut(event.actor) {
            duelist.pending_hit = Some(HIT_DELAY_TICKS);
        }
    }

    for (entity, mut duelist, slots) in duelists.iter_mut() {
        let Some(remaining) = duelist.pending_hit else {
            continue;
        };
        // Атаку прервали (stagger/parry) - удара не будет
        if slots.active_slot().is_none() {
            duelist.pending_hit = None;
            continue;
        }
        if remaining > 0 {
            duelist.pending_hit = Some(remaining - 1);
            continue;
        }

        duelist.pending_hit = None;
        hits.write(AttackHit {
            attacker: entity,
            target: duelist.opponent,
            attack: None,
        });
    }
}

fn track_deaths(
    mut deaths: EventReader<EntityDied>,
    mut outcome: ResMut<DuelOutcome>,
    mut ticks: Local<u32>,
) {
    *ticks += 1;
    for death in deaths.read() {
        if outcome.winner.is_none() {
            outcome.winner = death.killer;
            outcome.ticks = *ticks;
        }
    }
}
