//! Combat integration tests
//!
//! Headless App (AtlasCombatPlugin), события через `World::send_event`,
//! egress события пишутся в `Recorded<E>` системой в `Last`.
//!
//! Проверяем:
//! - Damage pipeline end-to-end (plain / block / vulnerability / parry)
//! - Knockback → wall/floor impact ровно один раз
//! - Stagger/death → force interrupt текущего действия
//! - Heal / revive, i-frames, station integrity

use bevy::prelude::*;

use atlas_combat::actions::{
    ActionDefinition, ActionFailed, ActionFailure, ActionKind, AttackParams, SlotPressed,
};
use atlas_combat::combat::events::*;
use atlas_combat::combat::{ImpactTracker, TimeDilation, VulnerabilityTier};
use atlas_combat::*;

#[derive(Resource)]
struct Recorded<E: Event + Clone>(Vec<E>);

fn record<E: Event + Clone>(mut reader: EventReader<E>, mut recorded: ResMut<Recorded<E>>) {
    recorded.0.extend(reader.read().cloned());
}

fn track<E: Event + Clone>(app: &mut App) {
    app.insert_resource(Recorded::<E>(Vec::new()))
        .add_systems(Last, record::<E>);
}

fn recorded<E: Event + Clone>(app: &App) -> &[E] {
    &app.world().resource::<Recorded<E>>().0
}

/// Helper: combat App + recorders для всех интересных событий
fn create_combat_app() -> App {
    let mut app = create_headless_app(42);
    set_log_level(LogLevel::Warning);

    track::<DamageResolved>(&mut app);
    track::<KnockbackApplied>(&mut app);
    track::<VulnerabilityEnded>(&mut app);
    track::<ParrySuccess>(&mut app);
    track::<WallImpact>(&mut app);
    track::<FloorImpact>(&mut app);
    track::<RagdollRecovered>(&mut app);
    track::<StaggerStarted>(&mut app);
    track::<StaggerEnded>(&mut app);
    track::<EntityDied>(&mut app);
    track::<HealthChanged>(&mut app);
    track::<ActionFailed>(&mut app);

    // Jab: 5 урона без knockback
    app.world_mut()
        .resource_mut::<ActionDefinitions>()
        .upsert(ActionDefinition {
            id: "jab".into(),
            name: "Jab".to_string(),
            kind: ActionKind::MeleeAttack(AttackParams {
                damage: 5.0,
                knockback: 0.0,
                ..AttackParams::default()
            }),
            ..ActionDefinition::basic_attack()
        });

    app
}

fn fighter_loadout() -> ActionSlots {
    ActionSlots::with_loadout(&[
        (ActionSlot::Slot1, "basic_attack"),
        (ActionSlot::Slot2, "heavy_attack"),
        (ActionSlot::Slot3, "block"),
        (ActionSlot::Slot4, "dash"),
        (ActionSlot::Slot5, "kinetic_pulse"),
    ])
}

/// Helper: два бойца в 2m друг от друга (+X), warm-up update сделан
fn spawn_duel(app: &mut App) -> (Entity, Entity) {
    let attacker = app
        .world_mut()
        .spawn((CombatActor, fighter_loadout(), Transform::from_xyz(0.0, 0.0, 0.0)))
        .id();
    let target = app
        .world_mut()
        .spawn((CombatActor, fighter_loadout(), Transform::from_xyz(2.0, 0.0, 0.0)))
        .id();

    app.update();
    (attacker, target)
}

fn hit(app: &mut App, attacker: Entity, target: Entity, attack: &str) {
    app.world_mut().send_event(AttackHit {
        attacker,
        target,
        attack: Some(ActionId::from(attack)),
    });
    app.update();
}

fn press(app: &mut App, actor: Entity, slot: ActionSlot) {
    app.world_mut().send_event(SlotPressed::new(actor, slot));
    app.update();
}

fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.update();
    }
}

fn health(app: &App, entity: Entity) -> f32 {
    app.world().get::<Health>(entity).unwrap().current
}

fn tags(app: &App, entity: Entity) -> CombatStateTags {
    *app.world().get::<CombatStateTags>(entity).unwrap()
}

// ============================================================================
// Damage pipeline
// ============================================================================

#[test]
fn test_plain_hit_deals_base_damage() {
    let mut app = create_combat_app();
    let (attacker, target) = spawn_duel(&mut app);

    hit(&mut app, attacker, target, "jab");

    assert_eq!(health(&app, target), 95.0);
    assert!(recorded::<KnockbackApplied>(&app).is_empty(), "knockback 0 → без knockback");

    let resolved = recorded::<DamageResolved>(&app);
    assert_eq!(resolved.len(), 1);
    assert!(!resolved[0].resolution.was_blocked);
    assert!(!resolved[0].resolution.was_vulnerable);
}

#[test]
fn test_blocking_target_loses_sixty_percent() {
    let mut app = create_combat_app();
    let (attacker, target) = spawn_duel(&mut app);

    // Blocking без parry window (окно уже закрылось)
    app.world_mut()
        .get_mut::<CombatStateTags>(target)
        .unwrap()
        .add(CombatTag::Blocking);

    // debris_pull: base 10, без knockback
    hit(&mut app, attacker, target, "debris_pull");

    assert_eq!(health(&app, target), 94.0);
    let resolved = recorded::<DamageResolved>(&app);
    assert!(resolved[0].resolution.was_blocked);
    assert!(!resolved[0].resolution.was_parried);
}

#[test]
fn test_stunned_target_takes_eight_times_then_tier_consumed() {
    let mut app = create_combat_app();
    let (attacker, target) = spawn_duel(&mut app);

    let rules = app.world().resource::<CombatRules>().clone();
    app.world_mut()
        .get_mut::<Vulnerability>(target)
        .unwrap()
        .apply_tier(VulnerabilityTier::Stunned, rules.vulnerability.get(VulnerabilityTier::Stunned));

    hit(&mut app, attacker, target, "jab");
    assert_eq!(health(&app, target), 60.0);

    let ended = recorded::<VulnerabilityEnded>(&app);
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].reason, VulnerabilityEndReason::Consumed);
    assert!(!app.world().get::<Vulnerability>(target).unwrap().is_vulnerable());
    assert!(!tags(&app, target).has(CombatTag::Vulnerable));

    // Следующий удар без множителя
    hit(&mut app, attacker, target, "jab");
    assert_eq!(health(&app, target), 55.0);
}

#[test]
fn test_iframes_avoid_hit_entirely() {
    let mut app = create_combat_app();
    let (attacker, target) = spawn_duel(&mut app);

    press(&mut app, target, ActionSlot::Slot4); // dash → i-frames
    assert!(tags(&app, target).has(CombatTag::IFrames));

    hit(&mut app, attacker, target, "heavy_attack");

    assert_eq!(health(&app, target), 100.0);
    assert_eq!(app.world().get::<Poise>(target).unwrap().current, 100.0);
    assert!(recorded::<KnockbackApplied>(&app).is_empty());
    assert!(recorded::<DamageResolved>(&app)[0].resolution.was_avoided);
}

// ============================================================================
// Parry
// ============================================================================

#[test]
fn test_perfect_parry_negates_hit_and_stuns_attacker() {
    let mut app = create_combat_app();
    let (attacker, target) = spawn_duel(&mut app);

    // Block открывает parry window
    press(&mut app, target, ActionSlot::Slot3);
    assert!(tags(&app, target).has(CombatTag::Parrying));

    hit(&mut app, attacker, target, "heavy_attack");

    assert_eq!(health(&app, target), 100.0);
    assert_eq!(app.world().get::<Poise>(target).unwrap().current, 100.0);
    assert!(recorded::<KnockbackApplied>(&app).is_empty());

    let parries = recorded::<ParrySuccess>(&app);
    assert_eq!(parries.len(), 1);
    assert_eq!(parries[0].quality, ParryQuality::Perfect);
    assert_eq!(parries[0].attacker, attacker);

    let attacker_vulnerability = app.world().get::<Vulnerability>(attacker).unwrap();
    assert_eq!(attacker_vulnerability.tier(), VulnerabilityTier::Stunned);
    assert!(tags(&app, attacker).has(CombatTag::Vulnerable));

    // Slow motion включён и снимается по реальному времени
    assert!(app.world().resource::<TimeDilation>().is_active());
    assert!(app.world().resource::<Time<Virtual>>().relative_speed() < 1.0);
    run_ticks(&mut app, 20);
    assert!(!app.world().resource::<TimeDilation>().is_active());
    assert_eq!(app.world().resource::<Time<Virtual>>().relative_speed(), 1.0);
}

#[test]
fn test_late_parry_halves_damage() {
    let mut app = create_combat_app();
    let (attacker, target) = spawn_duel(&mut app);

    app.world_mut().send_event(AnimationNotify {
        actor: target,
        kind: AnimationNotifyKind::ParryWindowBegin,
    });
    app.update();

    // 0.25s: perfect (0.2) прошёл, late (0.1) ещё открыт
    run_ticks(&mut app, 14);
    hit(&mut app, attacker, target, "jab");

    assert_eq!(health(&app, target), 97.5);
    let parries = recorded::<ParrySuccess>(&app);
    assert_eq!(parries.len(), 1);
    assert_eq!(parries[0].quality, ParryQuality::Late);
    assert_eq!(
        app.world().get::<Vulnerability>(attacker).unwrap().tier(),
        VulnerabilityTier::None
    );
}

#[test]
fn test_parry_window_safety_close() {
    let mut app = create_combat_app();
    let (_, target) = spawn_duel(&mut app);

    app.world_mut().send_event(AnimationNotify {
        actor: target,
        kind: AnimationNotifyKind::ParryWindowBegin,
    });
    app.update();
    assert!(tags(&app, target).has(CombatTag::Parrying));

    // Без ParryWindowEnd окно закрывается после perfect + late
    run_ticks(&mut app, 25);
    assert!(!app.world().get::<ParryWindow>(target).unwrap().is_open());
    assert!(!tags(&app, target).has(CombatTag::Parrying));
}

// ============================================================================
// Knockback impacts
// ============================================================================

#[test]
fn test_wall_impact_fires_once_and_extends_stagger() {
    let mut app = create_combat_app();
    let (attacker, target) = spawn_duel(&mut app);

    // heavy_attack: 15 урона, knockback 500 (>= 300 → tracking)
    hit(&mut app, attacker, target, "heavy_attack");
    assert_eq!(health(&app, target), 85.0);
    assert_eq!(recorded::<KnockbackApplied>(&app).len(), 1);

    for _ in 0..2 {
        app.world_mut().send_event(KnockbackCollision {
            entity: target,
            normal: Vec3::X,
        });
        app.update();
    }

    assert_eq!(recorded::<WallImpact>(&app).len(), 1);
    assert!(recorded::<FloorImpact>(&app).is_empty());
    assert_eq!(health(&app, target), 55.0);
    assert!(app.world().get::<Poise>(target).unwrap().is_staggered());
    assert!(tags(&app, target).has(CombatTag::Staggered));
    assert_eq!(recorded::<StaggerStarted>(&app).len(), 1);

    // Stagger 2.0s + отложенное продление 1.0s → ещё staggered на 2.5s
    run_ticks(&mut app, 150);
    assert!(app.world().get::<Poise>(target).unwrap().is_staggered());

    run_ticks(&mut app, 60);
    assert!(!app.world().get::<Poise>(target).unwrap().is_staggered());
    assert!(!tags(&app, target).has(CombatTag::Staggered));
    assert_eq!(recorded::<StaggerEnded>(&app).len(), 1);
}

#[test]
fn test_floor_impact_ragdolls_then_recovers() {
    let mut app = create_combat_app();
    let (attacker, target) = spawn_duel(&mut app);

    hit(&mut app, attacker, target, "heavy_attack");
    for _ in 0..2 {
        app.world_mut().send_event(KnockbackCollision {
            entity: target,
            normal: Vec3::Z,
        });
        app.update();
    }

    assert_eq!(recorded::<FloorImpact>(&app).len(), 1);
    assert!(recorded::<WallImpact>(&app).is_empty());
    assert!(tags(&app, target).has(CombatTag::Ragdolled));
    // 100 - 40 (heavy) - 30 (floor)
    assert_eq!(app.world().get::<Poise>(target).unwrap().current, 30.0);

    run_ticks(&mut app, 70);
    assert!(!tags(&app, target).has(CombatTag::Ragdolled));
    assert_eq!(recorded::<RagdollRecovered>(&app).len(), 1);
}

#[test]
fn test_slope_contact_keeps_tracking() {
    let mut app = create_combat_app();
    let (attacker, target) = spawn_duel(&mut app);

    hit(&mut app, attacker, target, "heavy_attack");

    app.world_mut().send_event(KnockbackCollision {
        entity: target,
        normal: Vec3::new(1.0, 0.0, 0.5).normalize(),
    });
    app.update();
    assert!(recorded::<WallImpact>(&app).is_empty());
    assert!(recorded::<FloorImpact>(&app).is_empty());

    app.world_mut().send_event(KnockbackCollision {
        entity: target,
        normal: Vec3::Z,
    });
    app.update();
    assert_eq!(recorded::<FloorImpact>(&app).len(), 1);
}

#[test]
fn test_weak_knockback_is_not_tracked() {
    let mut app = create_combat_app();
    let (attacker, target) = spawn_duel(&mut app);

    // basic_attack knockback 100 < 300
    hit(&mut app, attacker, target, "basic_attack");
    assert_eq!(recorded::<KnockbackApplied>(&app).len(), 1);

    app.world_mut().send_event(KnockbackCollision {
        entity: target,
        normal: Vec3::X,
    });
    app.update();
    assert!(recorded::<WallImpact>(&app).is_empty());
}

#[test]
fn test_lethal_knockback_skips_impact_effects() {
    let mut app = create_combat_app();
    let attacker = app
        .world_mut()
        .spawn((CombatActor, fighter_loadout(), Transform::from_xyz(0.0, 0.0, 0.0)))
        .id();
    let target = app
        .world_mut()
        .spawn((
            CombatActor,
            fighter_loadout(),
            Health::new(5.0),
            Transform::from_xyz(2.0, 0.0, 0.0),
        ))
        .id();
    app.update();

    // heavy_attack убивает, knockback 500 всё равно публикуется
    hit(&mut app, attacker, target, "heavy_attack");
    assert_eq!(recorded::<EntityDied>(&app).len(), 1);
    assert_eq!(recorded::<KnockbackApplied>(&app).len(), 1);
    assert!(app.world().get::<ImpactTracker>(target).is_none());

    for normal in [Vec3::X, Vec3::Z] {
        app.world_mut().send_event(KnockbackCollision { entity: target, normal });
        app.update();
    }

    assert!(recorded::<WallImpact>(&app).is_empty());
    assert!(recorded::<FloorImpact>(&app).is_empty());
    assert!(recorded::<StaggerStarted>(&app).is_empty());
    assert!(!app.world().get::<Poise>(target).unwrap().is_staggered());
    let target_tags = tags(&app, target);
    assert!(!target_tags.has(CombatTag::Staggered));
    assert!(!target_tags.has(CombatTag::Ragdolled));
}

#[test]
fn test_death_while_tracked_cancels_impact() {
    let mut app = create_combat_app();
    let attacker = app
        .world_mut()
        .spawn((CombatActor, fighter_loadout(), Transform::from_xyz(0.0, 0.0, 0.0)))
        .id();
    let target = app
        .world_mut()
        .spawn((
            CombatActor,
            fighter_loadout(),
            Health::new(20.0),
            Transform::from_xyz(2.0, 0.0, 0.0),
        ))
        .id();
    app.update();

    // 20 - 15: жив, tracker стартовал; jab добивает до контакта
    hit(&mut app, attacker, target, "heavy_attack");
    assert!(app.world().get::<ImpactTracker>(target).is_some());
    hit(&mut app, attacker, target, "jab");
    assert_eq!(health(&app, target), 0.0);

    app.world_mut().send_event(KnockbackCollision {
        entity: target,
        normal: Vec3::X,
    });
    app.update();

    assert!(recorded::<WallImpact>(&app).is_empty());
    assert!(recorded::<StaggerStarted>(&app).is_empty());
    assert!(!tags(&app, target).has(CombatTag::Staggered));
    assert!(app.world().get::<ImpactTracker>(target).is_none());

    // Отложенного продления stagger тоже нет
    run_ticks(&mut app, 90);
    assert!(!app.world().get::<Poise>(target).unwrap().is_staggered());
}

// ============================================================================
// Rules → spawned actors
// ============================================================================

#[test]
fn test_spawned_actor_uses_live_rules() {
    let mut app = create_combat_app();
    app.insert_resource(CombatRules {
        default_max_health: 250.0,
        max_poise: 40.0,
        stagger_duration: 0.5,
        station_max_integrity: 200.0,
        ..CombatRules::default()
    });

    let actor = app.world_mut().spawn(CombatActor).id();
    let custom = app
        .world_mut()
        .spawn((CombatActor, Health::new(80.0)))
        .id();
    // warm-up + один fixed step (sync integrity)
    run_ticks(&mut app, 2);

    let health = app.world().get::<Health>(actor).unwrap();
    assert_eq!((health.current, health.max), (250.0, 250.0));
    let poise = app.world().get::<Poise>(actor).unwrap();
    assert_eq!(poise.max, 40.0);
    assert_eq!(poise.stagger_duration, 0.5);

    // Явный Health из spawn не перетирается, poise всё равно из правил
    assert_eq!(app.world().get::<Health>(custom).unwrap().max, 80.0);
    assert_eq!(app.world().get::<Poise>(custom).unwrap().max, 40.0);

    let integrity = app.world().resource::<StationIntegrity>();
    assert_eq!(integrity.max(), 200.0);
    assert_eq!(integrity.current(), 200.0);
}

#[test]
fn test_plugin_loads_rules_file() {
    let path = std::env::temp_dir().join(format!("atlas_rules_{}.ron", std::process::id()));
    std::fs::write(&path, "(default_max_health: 150.0, station_max_integrity: 40.0)").unwrap();

    let mut app = create_headless_app_with(3, AtlasCombatPlugin::default().with_rules(&path));
    let actor = app.world_mut().spawn(CombatActor).id();
    app.update();
    std::fs::remove_file(&path).ok();

    assert_eq!(app.world().get::<Health>(actor).unwrap().max, 150.0);
    assert_eq!(app.world().resource::<StationIntegrity>().max(), 40.0);
    assert_eq!(app.world().resource::<ActionDefinitions>().len(), 10);
}

// ============================================================================
// Stagger / death
// ============================================================================

#[test]
fn test_stagger_force_interrupts_heavy_attack() {
    let mut app = create_combat_app();
    let (attacker, target) = spawn_duel(&mut app);

    // heavy: 40 poise за удар → 60 → 20
    hit(&mut app, attacker, target, "heavy_attack");
    hit(&mut app, attacker, target, "heavy_attack");

    press(&mut app, target, ActionSlot::Slot2);
    assert!(tags(&app, target).has(CombatTag::Attacking));

    hit(&mut app, attacker, target, "heavy_attack");

    let target_tags = tags(&app, target);
    assert!(target_tags.has(CombatTag::Staggered));
    assert!(!target_tags.has(CombatTag::Attacking));

    let slots = app.world().get::<ActionSlots>(target).unwrap();
    assert_eq!(slots.active_count(), 0);
    let heavy = slots.get(ActionSlot::Slot2).unwrap();
    assert_eq!(heavy.state(), ActionState::Cooldown);
    // Interrupted cooldown = 1.0 × 0.5
    assert!(heavy.cooldown_remaining() <= 0.5);
}

#[test]
fn test_death_stops_actions_and_refuses_input() {
    let mut app = create_combat_app();
    let attacker = app
        .world_mut()
        .spawn((CombatActor, fighter_loadout(), Transform::from_xyz(0.0, 0.0, 0.0)))
        .id();
    let target = app
        .world_mut()
        .spawn((
            CombatActor,
            fighter_loadout(),
            Health::new(5.0),
            Transform::from_xyz(2.0, 0.0, 0.0),
        ))
        .id();
    app.update();

    press(&mut app, target, ActionSlot::Slot1);
    hit(&mut app, attacker, target, "jab");

    assert_eq!(health(&app, target), 0.0);
    let died = recorded::<EntityDied>(&app);
    assert_eq!(died.len(), 1);
    assert_eq!(died[0].killer, Some(attacker));

    let target_tags = tags(&app, target);
    assert!(target_tags.has(CombatTag::Dead));
    assert!(!target_tags.has(CombatTag::Attacking));
    assert_eq!(app.world().get::<ActionSlots>(target).unwrap().active_count(), 0);

    // Повторный удар по мёртвому - ничего
    hit(&mut app, attacker, target, "jab");
    assert_eq!(recorded::<EntityDied>(&app).len(), 1);

    press(&mut app, target, ActionSlot::Slot3);
    let failures = recorded::<ActionFailed>(&app);
    assert!(failures
        .iter()
        .any(|failure| failure.actor == target && failure.reason == ActionFailure::Dead));
}

#[test]
fn test_heal_and_revive() {
    let mut app = create_combat_app();
    let (attacker, target) = spawn_duel(&mut app);

    hit(&mut app, attacker, target, "debris_pull");
    assert_eq!(health(&app, target), 90.0);

    app.world_mut().send_event(HealIntent {
        target,
        amount: 50.0,
        instigator: None,
    });
    app.update();
    assert_eq!(health(&app, target), 100.0);

    let heals: Vec<_> = recorded::<HealthChanged>(&app)
        .iter()
        .filter(|change| change.delta > 0.0)
        .cloned()
        .collect();
    assert_eq!(heals.len(), 1);
    assert_eq!(heals[0].delta, 10.0);

    // Смерть → revive
    app.world_mut().get_mut::<Health>(target).unwrap().take_damage(500.0);
    app.world_mut()
        .get_mut::<CombatStateTags>(target)
        .unwrap()
        .add(CombatTag::Dead);

    app.world_mut().send_event(HealIntent {
        target,
        amount: 50.0,
        instigator: None,
    });
    app.update();
    assert_eq!(health(&app, target), 0.0, "heal мёртвого - no-op");

    app.world_mut().send_event(ReviveIntent {
        target,
        health: 0.0,
    });
    app.update();
    assert_eq!(health(&app, target), 1.0, "revive clamp >= 1");
    assert!(!tags(&app, target).has(CombatTag::Dead));
}

// ============================================================================
// Station integrity
// ============================================================================

#[test]
fn test_area_action_consumes_station_integrity() {
    let mut app = create_combat_app();
    let (attacker, _) = spawn_duel(&mut app);

    press(&mut app, attacker, ActionSlot::Slot5);

    let integrity = app.world().resource::<StationIntegrity>();
    assert_eq!(integrity.current(), 95.0);
    assert!(!integrity.is_critical());
}
