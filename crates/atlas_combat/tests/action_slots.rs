//! Action slot integration tests
//!
//! Проверяем:
//! - Slot exclusivity: максимум одно Active действие на каждом тике
//! - Input lock, arbitration, toggle, cooldown
//! - Combo buffer → replay на ComboWindowEnd
//! - Loadout: assign / clear / swap

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use atlas_combat::actions::*;
use atlas_combat::combat::events::{AnimationNotify, AnimationNotifyKind};
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

fn create_actions_app() -> (App, Entity) {
    let mut app = create_headless_app(7);
    set_log_level(LogLevel::Warning);

    track::<ActionActivated>(&mut app);
    track::<ActionFailed>(&mut app);
    track::<InputBuffered>(&mut app);
    track::<ActionSlotChanged>(&mut app);
    track::<DashStarted>(&mut app);

    let actor = app
        .world_mut()
        .spawn((
            CombatActor,
            ActionSlots::with_loadout(&[
                (ActionSlot::Slot1, "basic_attack"),
                (ActionSlot::Slot2, "heavy_attack"),
                (ActionSlot::Slot3, "block"),
                (ActionSlot::Slot4, "dash"),
                (ActionSlot::Slot5, "focus_mode"),
            ]),
        ))
        .id();
    app.update();

    (app, actor)
}

fn press(app: &mut App, actor: Entity, slot: ActionSlot) {
    app.world_mut().send_event(SlotPressed::new(actor, slot));
    app.update();
}

fn release(app: &mut App, actor: Entity, slot: ActionSlot) {
    app.world_mut().send_event(SlotReleased { actor, slot });
    app.update();
}

fn notify(app: &mut App, actor: Entity, kind: AnimationNotifyKind) {
    app.world_mut().send_event(AnimationNotify { actor, kind });
    app.update();
}

fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.update();
    }
}

fn slots(app: &App, actor: Entity) -> &ActionSlots {
    app.world().get::<ActionSlots>(actor).unwrap()
}

fn slot_state(app: &App, actor: Entity, slot: ActionSlot) -> ActionState {
    slots(app, actor).get(slot).unwrap().state()
}

fn tags(app: &App, actor: Entity) -> CombatStateTags {
    *app.world().get::<CombatStateTags>(actor).unwrap()
}

fn last_failure(app: &App) -> Option<ActionFailure> {
    recorded::<ActionFailed>(app).last().map(|failed| failed.reason.clone())
}

#[test]
fn test_slot_exclusivity_under_random_input() {
    let (mut app, actor) = create_actions_app();
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for tick in 0..2000 {
        if rng.gen_bool(0.2) {
            let slot = ActionSlot::from_index(rng.gen_range(0..ActionSlot::COUNT)).unwrap();
            app.world_mut().send_event(SlotPressed::new(actor, slot));
        }
        if rng.gen_bool(0.05) {
            app.world_mut().send_event(SlotReleased {
                actor,
                slot: ActionSlot::Slot3,
            });
        }
        if rng.gen_bool(0.02) {
            app.world_mut().send_event(InterruptActionIntent {
                actor,
                force: rng.gen_bool(0.5),
            });
        }

        app.update();

        let slots = slots(&app, actor);
        assert!(
            slots.active_count() <= 1,
            "tick {}: {} active actions",
            tick,
            slots.active_count()
        );
        if let Some(current) = slots.current() {
            assert!(slots.get(current).unwrap().is_active(), "tick {}: stale current slot", tick);
        }
    }

    assert!(!recorded::<ActionActivated>(&app).is_empty());
}

#[test]
fn test_melee_attack_lifecycle() {
    let (mut app, actor) = create_actions_app();

    press(&mut app, actor, ActionSlot::Slot1);
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot1), ActionState::Active);
    assert!(tags(&app, actor).has(CombatTag::Attacking));
    assert_eq!(slots(&app, actor).current(), Some(ActionSlot::Slot1));

    // basic_attack: 0.6s, без cooldown → сразу Idle
    run_ticks(&mut app, 40);
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot1), ActionState::Idle);
    assert!(!tags(&app, actor).has(CombatTag::Attacking));
    assert_eq!(slots(&app, actor).current(), None);
}

#[test]
fn test_cooldown_refuses_reactivation() {
    let (mut app, actor) = create_actions_app();

    // heavy_attack: 1.0s active + 1.0s cooldown
    press(&mut app, actor, ActionSlot::Slot2);
    run_ticks(&mut app, 65);
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot2), ActionState::Cooldown);

    press(&mut app, actor, ActionSlot::Slot2);
    assert!(matches!(
        last_failure(&app),
        Some(ActionFailure::Refused(ActivationRefusal::OnCooldown { .. }))
    ));

    run_ticks(&mut app, 65);
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot2), ActionState::Idle);
    press(&mut app, actor, ActionSlot::Slot2);
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot2), ActionState::Active);
}

#[test]
fn test_input_locked_while_attacking() {
    let (mut app, actor) = create_actions_app();

    press(&mut app, actor, ActionSlot::Slot1);
    press(&mut app, actor, ActionSlot::Slot3);

    assert_eq!(last_failure(&app), Some(ActionFailure::InputLocked));
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot3), ActionState::Idle);
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot1), ActionState::Active);
}

#[test]
fn test_dash_cannot_interrupt_non_interruptible_attack() {
    let (mut app, actor) = create_actions_app();

    press(&mut app, actor, ActionSlot::Slot1);
    press(&mut app, actor, ActionSlot::Slot4);

    assert_eq!(
        last_failure(&app),
        Some(ActionFailure::NotInterruptible(ActionId::from("basic_attack")))
    );
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot1), ActionState::Active);
    assert!(recorded::<DashStarted>(&app).is_empty());
}

#[test]
fn test_dash_interrupts_block_with_reduced_cooldown() {
    let (mut app, actor) = create_actions_app();

    press(&mut app, actor, ActionSlot::Slot3);
    assert!(tags(&app, actor).has(CombatTag::Blocking));

    press(&mut app, actor, ActionSlot::Slot4);

    assert_eq!(slot_state(&app, actor, ActionSlot::Slot4), ActionState::Active);
    assert!(!tags(&app, actor).has(CombatTag::Blocking));
    assert!(!tags(&app, actor).has(CombatTag::Parrying));
    assert_eq!(recorded::<DashStarted>(&app).len(), 1);

    // block cooldown 0.2 × 0.5
    let block = slots(&app, actor).get(ActionSlot::Slot3).unwrap();
    assert_eq!(block.state(), ActionState::Cooldown);
    assert!(block.cooldown_remaining() <= 0.1 + 1e-4);
}

#[test]
fn test_block_held_until_release() {
    let (mut app, actor) = create_actions_app();

    press(&mut app, actor, ActionSlot::Slot3);
    run_ticks(&mut app, 120);
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot3), ActionState::Active);
    assert!(tags(&app, actor).has(CombatTag::Blocking));

    release(&mut app, actor, ActionSlot::Slot3);
    assert!(!tags(&app, actor).has(CombatTag::Blocking));
    assert_ne!(slot_state(&app, actor, ActionSlot::Slot3), ActionState::Active);
}

#[test]
fn test_toggle_second_press_turns_off() {
    let (mut app, actor) = create_actions_app();

    press(&mut app, actor, ActionSlot::Slot5);
    assert!(tags(&app, actor).has(CombatTag::FocusMode));

    // Release toggle не выключает
    release(&mut app, actor, ActionSlot::Slot5);
    assert!(tags(&app, actor).has(CombatTag::FocusMode));

    press(&mut app, actor, ActionSlot::Slot5);
    assert!(!tags(&app, actor).has(CombatTag::FocusMode));
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot5), ActionState::Idle);
}

#[test]
fn test_combo_buffer_replays_on_window_end() {
    let (mut app, actor) = create_actions_app();

    press(&mut app, actor, ActionSlot::Slot1);
    notify(
        &mut app,
        actor,
        AnimationNotifyKind::ComboWindowBegin {
            name: "light_chain".to_string(),
        },
    );

    // Два нажатия в окне - остаётся последнее
    press(&mut app, actor, ActionSlot::Slot4);
    press(&mut app, actor, ActionSlot::Slot2);
    assert_eq!(recorded::<InputBuffered>(&app).len(), 2);
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot1), ActionState::Active);

    notify(&mut app, actor, AnimationNotifyKind::ComboWindowEnd);

    assert_eq!(slot_state(&app, actor, ActionSlot::Slot1), ActionState::Idle);
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot2), ActionState::Active);
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot4), ActionState::Idle);
    assert_eq!(slots(&app, actor).current(), Some(ActionSlot::Slot2));
    assert!(recorded::<DashStarted>(&app).is_empty());
}

#[test]
fn test_combo_chain_same_slot_restarts_attack() {
    let (mut app, actor) = create_actions_app();

    press(&mut app, actor, ActionSlot::Slot1);
    notify(
        &mut app,
        actor,
        AnimationNotifyKind::ComboWindowBegin {
            name: "light_chain".to_string(),
        },
    );
    press(&mut app, actor, ActionSlot::Slot1);
    assert_eq!(recorded::<InputBuffered>(&app).len(), 1);

    notify(&mut app, actor, AnimationNotifyKind::ComboWindowEnd);

    let basic_activations = recorded::<ActionActivated>(&app)
        .iter()
        .filter(|event| event.slot == ActionSlot::Slot1)
        .count();
    assert_eq!(basic_activations, 2, "basic → basic: вторая активация из буфера");
    assert!(recorded::<ActionFailed>(&app).is_empty());
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot1), ActionState::Active);
    assert_eq!(slots(&app, actor).current(), Some(ActionSlot::Slot1));
    assert!(tags(&app, actor).has(CombatTag::Attacking));

    // Таймер перезапущен: первая атака (0.6s) уже закончилась бы
    run_ticks(&mut app, 34);
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot1), ActionState::Active);

    run_ticks(&mut app, 4);
    assert_ne!(slot_state(&app, actor, ActionSlot::Slot1), ActionState::Active);
    assert_eq!(slots(&app, actor).current(), None);
}

#[test]
fn test_combo_window_without_input_does_nothing() {
    let (mut app, actor) = create_actions_app();

    press(&mut app, actor, ActionSlot::Slot1);
    let activations = recorded::<ActionActivated>(&app).len();

    notify(
        &mut app,
        actor,
        AnimationNotifyKind::ComboWindowBegin {
            name: "light_chain".to_string(),
        },
    );
    notify(&mut app, actor, AnimationNotifyKind::ComboWindowEnd);

    assert_eq!(recorded::<ActionActivated>(&app).len(), activations);
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot1), ActionState::Active);
}

#[test]
fn test_empty_slot_and_unknown_action() {
    let (mut app, actor) = create_actions_app();

    app.world_mut().send_event(ClearSlotIntent {
        actor,
        slot: ActionSlot::Slot4,
    });
    app.update();
    press(&mut app, actor, ActionSlot::Slot4);
    assert_eq!(last_failure(&app), Some(ActionFailure::EmptySlot));

    app.world_mut().send_event(AssignActionIntent {
        actor,
        slot: ActionSlot::Slot4,
        action: ActionId::from("no_such_action"),
    });
    app.update();
    assert_eq!(
        last_failure(&app),
        Some(ActionFailure::UnknownAction(ActionId::from("no_such_action")))
    );
    assert!(slots(&app, actor).get(ActionSlot::Slot4).is_none());
}

#[test]
fn test_reassign_running_slot_force_interrupts() {
    let (mut app, actor) = create_actions_app();

    press(&mut app, actor, ActionSlot::Slot2);
    assert!(tags(&app, actor).has(CombatTag::Attacking));

    app.world_mut().send_event(AssignActionIntent {
        actor,
        slot: ActionSlot::Slot2,
        action: ActionId::from("coolant_spray"),
    });
    app.update();

    assert!(!tags(&app, actor).has(CombatTag::Attacking));
    assert_eq!(slots(&app, actor).active_count(), 0);
    let instance = slots(&app, actor).get(ActionSlot::Slot2).unwrap();
    assert_eq!(instance.action, ActionId::from("coolant_spray"));
    assert_eq!(instance.state(), ActionState::Idle);

    let changes = recorded::<ActionSlotChanged>(&app);
    assert_eq!(changes.last().unwrap().action, Some(ActionId::from("coolant_spray")));
}

#[test]
fn test_swap_slots_moves_current() {
    let (mut app, actor) = create_actions_app();

    press(&mut app, actor, ActionSlot::Slot3);
    app.world_mut().send_event(SwapSlotsIntent {
        actor,
        a: ActionSlot::Slot3,
        b: ActionSlot::Slot1,
    });
    app.update();

    let slots = slots(&app, actor);
    assert_eq!(slots.current(), Some(ActionSlot::Slot1));
    assert_eq!(slots.get(ActionSlot::Slot1).unwrap().action, ActionId::from("block"));
    assert_eq!(slots.get(ActionSlot::Slot3).unwrap().action, ActionId::from("basic_attack"));
    assert_eq!(recorded::<ActionSlotChanged>(&app).len(), 2);

    // Release по новому слоту снимает block
    release(&mut app, actor, ActionSlot::Slot1);
    assert!(!tags(&app, actor).has(CombatTag::Blocking));
}

#[test]
fn test_channel_progress_reported() {
    let (mut app, actor) = create_actions_app();

    app.world_mut().send_event(AssignActionIntent {
        actor,
        slot: ActionSlot::Slot5,
        action: ActionId::from("coolant_spray"),
    });
    app.update();

    // coolant_spray: charge 1.5s
    press(&mut app, actor, ActionSlot::Slot5);
    assert!(tags(&app, actor).has(CombatTag::Channeling));
    run_ticks(&mut app, 44);

    let progress = slots(&app, actor)
        .get(ActionSlot::Slot5)
        .unwrap()
        .channel_progress();
    assert!((progress - 0.5).abs() < 0.05, "progress {}", progress);

    run_ticks(&mut app, 60);
    assert!(!tags(&app, actor).has(CombatTag::Channeling));
    assert_eq!(slot_state(&app, actor, ActionSlot::Slot5), ActionState::Cooldown);
}
