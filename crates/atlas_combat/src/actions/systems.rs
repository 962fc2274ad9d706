//! Action slot systems (slot arbitration, ticking, loadout).
//!
//! `ActionInstance` возвращает `ActionEffect`'ы, здесь они применяются к
//! компонентам актора и превращаются в события.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::definition::{ActionDefinition, ActionDefinitions, ActionId, ActionType};
use super::events::*;
use super::instance::{ActionEffect, ActionState};
use super::slots::{ActionSlot, ActionSlots};
use crate::combat::components::{CombatClock, CombatStateTags, CombatTag, ComboWindow, Health, ParryWindow, Vulnerability};
use crate::combat::events::{IFramesStarted, IntegrityChanged, IntegrityCritical, IntegrityFailed};
use crate::combat::station::StationIntegrity;
use crate::config::CombatRules;

/// Компоненты актора, которые трогают action effects
pub struct ActorParts<'a> {
    pub tags: &'a mut CombatStateTags,
    pub vulnerability: &'a mut Vulnerability,
    pub parry: &'a mut ParryWindow,
    pub clock: &'a mut CombatClock,
}

/// Всё, куда пишут action effects (resources + event writers)
#[derive(SystemParam)]
pub struct ActionOutput<'w> {
    rules: Res<'w, CombatRules>,
    time: Res<'w, Time>,
    integrity: ResMut<'w, StationIntegrity>,
    state_changed: EventWriter<'w, ActionStateChanged>,
    iframes_started: EventWriter<'w, IFramesStarted>,
    dash_started: EventWriter<'w, DashStarted>,
    ranged_fired: EventWriter<'w, RangedAttackFired>,
    area_triggered: EventWriter<'w, AreaEffectTriggered>,
    integrity_changed: EventWriter<'w, IntegrityChanged>,
    integrity_critical: EventWriter<'w, IntegrityCritical>,
    integrity_failed: EventWriter<'w, IntegrityFailed>,
}

impl ActionOutput<'_> {
    pub fn rules(&self) -> &CombatRules {
        &self.rules
    }

    pub fn apply(
        &mut self,
        actor: Entity,
        slot: ActionSlot,
        action: &ActionId,
        effects: Vec<ActionEffect>,
        parts: &mut ActorParts,
    ) {
        let now = self.time.elapsed_secs();

        for effect in effects {
            match effect {
                ActionEffect::StateChanged(state) => {
                    self.state_changed.write(ActionStateChanged {
                        actor,
                        slot,
                        action: action.clone(),
                        state,
                    });
                }
                ActionEffect::AddTag(tag) => {
                    parts.tags.add(tag);
                    if matches!(tag, CombatTag::Attacking | CombatTag::Blocking | CombatTag::Dashing) {
                        parts.clock.mark(now);
                    }
                }
                ActionEffect::RemoveTag(tag) => {
                    parts.tags.remove(tag);
                }
                ActionEffect::StartIFrames(duration) => {
                    if parts.vulnerability.start_iframes(duration) {
                        parts.tags.add(CombatTag::IFrames);
                        self.iframes_started.write(IFramesStarted {
                            entity: actor,
                            duration,
                        });
                    }
                }
                ActionEffect::OpenParryWindow => {
                    parts
                        .parry
                        .open(self.rules.perfect_parry_window, self.rules.late_parry_window);
                    parts.tags.add(CombatTag::Parrying);
                }
                ActionEffect::CloseParryWindow => {
                    parts.parry.close();
                    parts.tags.remove(CombatTag::Parrying);
                }
                ActionEffect::ConsumeIntegrity(cost) => {
                    self.consume_integrity(actor, cost);
                }
                ActionEffect::Dash { distance, duration } => {
                    self.dash_started.write(DashStarted {
                        actor,
                        distance,
                        duration,
                    });
                }
                ActionEffect::FireProjectile { damage, range, speed } => {
                    self.ranged_fired.write(RangedAttackFired {
                        actor,
                        action: action.clone(),
                        damage,
                        range,
                        projectile_speed: speed,
                    });
                }
                ActionEffect::TriggerArea {
                    radius,
                    damage,
                    affects_allies,
                } => {
                    self.area_triggered.write(AreaEffectTriggered {
                        actor,
                        action: action.clone(),
                        radius,
                        damage,
                        affects_allies,
                    });
                }
            }
        }
    }

    fn consume_integrity(&mut self, actor: Entity, cost: f32) {
        let update = self.integrity.apply_damage(cost);
        if update.delta == 0.0 {
            return;
        }

        self.integrity_changed.write(IntegrityChanged {
            current: self.integrity.current(),
            max: self.integrity.max(),
            delta: update.delta,
            source: Some(actor),
        });

        if update.became_critical {
            crate::logger::log_warning(&format!(
                "🚨 Station integrity critical: {:.0}%",
                self.integrity.percent()
            ));
            self.integrity_critical.write(IntegrityCritical {
                current: self.integrity.current(),
            });
        }
        if update.failed {
            crate::logger::log_warning(&format!("💀 Station integrity failed (by {:?})", actor));
            self.integrity_failed.write(IntegrityFailed {
                source: Some(actor),
            });
        }
    }
}

fn fail(
    failed: &mut EventWriter<ActionFailed>,
    actor: Entity,
    slot: ActionSlot,
    action: Option<&ActionId>,
    reason: ActionFailure,
) {
    crate::logger::log(&format!(
        "❌ Action {:?} failed for {:?}: {}",
        slot, actor, reason
    ));
    failed.write(ActionFailed {
        actor,
        slot,
        action: action.cloned(),
        reason,
    });
}

/// Force interrupt действия в слоте (reassign/clear).
fn force_interrupt_slot(
    actor: Entity,
    slot: ActionSlot,
    slots: &mut ActionSlots,
    definitions: &ActionDefinitions,
    parts: &mut ActorParts,
    output: &mut ActionOutput,
) {
    let factor = output.rules().interrupted_cooldown_factor;
    let Some(instance) = slots.get_mut(slot) else {
        return;
    };
    if !instance.is_active() {
        return;
    }
    let Some(definition) = definitions.get(&instance.action) else {
        return;
    };

    let action = instance.action.clone();
    let effects = instance.force_interrupt(definition, factor);
    output.apply(actor, slot, &action, effects, parts);
}

fn clear_finished_current(slots: &mut ActionSlots) {
    if slots.current().is_some() && slots.active_slot().is_none() {
        slots.set_current(None);
    }
}

/// Атака/выстрел/блок во время атаки без combo window - input lock
fn locked_while_attacking(definition: &ActionDefinition) -> bool {
    matches!(
        definition.action_type(),
        ActionType::MeleeAttack | ActionType::RangedAttack | ActionType::Defense
    )
}

// ============================================================================
// Systems
// ============================================================================

/// System: loadout intents (assign / clear / swap).
///
/// Перед заменой running action в слоте - force interrupt.
#[allow(clippy::too_many_arguments)]
pub fn process_slot_assignments(
    mut assign_events: EventReader<AssignActionIntent>,
    mut clear_events: EventReader<ClearSlotIntent>,
    mut swap_events: EventReader<SwapSlotsIntent>,
    definitions: Res<ActionDefinitions>,
    mut actors: Query<(
        &mut ActionSlots,
        &mut CombatStateTags,
        &mut Vulnerability,
        &mut ParryWindow,
        &mut CombatClock,
    )>,
    mut output: ActionOutput,
    mut slot_changed: EventWriter<ActionSlotChanged>,
    mut failed: EventWriter<ActionFailed>,
) {
    for event in assign_events.read() {
        let Ok((mut slots, mut tags, mut vulnerability, mut parry, mut clock)) = actors.get_mut(event.actor) else {
            crate::logger::log_warning(&format!("⚠️ AssignActionIntent: {:?} is not an actor", event.actor));
            continue;
        };

        if !definitions.contains(&event.action) {
            crate::logger::log_error(&format!(
                "❌ Unknown action '{}' for {:?} {:?}",
                event.action, event.actor, event.slot
            ));
            fail(
                &mut failed,
                event.actor,
                event.slot,
                Some(&event.action),
                ActionFailure::UnknownAction(event.action.clone()),
            );
            continue;
        }

        let mut parts = ActorParts {
            tags: &mut tags,
            vulnerability: &mut vulnerability,
            parry: &mut parry,
            clock: &mut clock,
        };
        force_interrupt_slot(event.actor, event.slot, &mut slots, &definitions, &mut parts, &mut output);
        slots.assign(event.slot, event.action.clone());

        crate::logger::log(&format!(
            "🎯 {:?} {:?} ← '{}'",
            event.actor, event.slot, event.action
        ));
        slot_changed.write(ActionSlotChanged {
            actor: event.actor,
            slot: event.slot,
            action: Some(event.action.clone()),
        });
    }

    for event in clear_events.read() {
        let Ok((mut slots, mut tags, mut vulnerability, mut parry, mut clock)) = actors.get_mut(event.actor) else {
            continue;
        };

        let mut parts = ActorParts {
            tags: &mut tags,
            vulnerability: &mut vulnerability,
            parry: &mut parry,
            clock: &mut clock,
        };
        force_interrupt_slot(event.actor, event.slot, &mut slots, &definitions, &mut parts, &mut output);

        if slots.clear(event.slot).is_some() {
            slot_changed.write(ActionSlotChanged {
                actor: event.actor,
                slot: event.slot,
                action: None,
            });
        }
    }

    for event in swap_events.read() {
        let Ok((mut slots, ..)) = actors.get_mut(event.actor) else {
            continue;
        };
        if event.a == event.b {
            continue;
        }

        slots.swap(event.a, event.b);
        for slot in [event.a, event.b] {
            slot_changed.write(ActionSlotChanged {
                actor: event.actor,
                slot,
                action: slots.get(slot).map(|instance| instance.action.clone()),
            });
        }
    }
}

/// System: slot presses → arbitration → activation.
///
/// Порядок проверок:
/// 1. Dead → отказ
/// 2. Combo window открыт → press буферизуется (replay на ComboWindowEnd)
/// 3. Атака в процессе → attack/ranged/defense заблокированы (InputLocked)
/// 4. Пустой слот / неизвестное действие → отказ
/// 5. Тот же слот уже active → второе нажатие toggle выключает, остальное игнорируется
/// 6. Другое действие active → buffered replay его release'ит, обычный press - interrupt
/// 7. `can_activate` → `activate`
#[allow(clippy::too_many_arguments)]
pub fn process_slot_presses(
    mut presses: EventReader<SlotPressed>,
    definitions: Res<ActionDefinitions>,
    mut actors: Query<(
        &mut ActionSlots,
        &mut CombatStateTags,
        &mut Vulnerability,
        &mut ParryWindow,
        &mut CombatClock,
        &mut ComboWindow,
        &Health,
    )>,
    mut output: ActionOutput,
    mut activated: EventWriter<ActionActivated>,
    mut failed: EventWriter<ActionFailed>,
    mut input_buffered: EventWriter<InputBuffered>,
) {
    for press in presses.read() {
        let actor = press.actor;
        let Ok((mut slots, mut tags, mut vulnerability, mut parry, mut clock, mut combo, health)) =
            actors.get_mut(actor)
        else {
            crate::logger::log_warning(&format!("⚠️ SlotPressed: {:?} is not an actor", actor));
            continue;
        };

        let action = slots.get(press.slot).map(|instance| instance.action.clone());

        if health.is_dead() || tags.has(CombatTag::Dead) {
            fail(&mut failed, actor, press.slot, action.as_ref(), ActionFailure::Dead);
            continue;
        }

        if !press.buffered && combo.is_active() {
            combo.buffer(press.slot);
            input_buffered.write(InputBuffered {
                actor,
                slot: press.slot,
            });
            continue;
        }

        let Some(action) = action else {
            fail(&mut failed, actor, press.slot, None, ActionFailure::EmptySlot);
            continue;
        };
        let Some(definition) = definitions.get(&action) else {
            crate::logger::log_error(&format!(
                "❌ Action '{}' in {:?} {:?} has no definition",
                action, actor, press.slot
            ));
            fail(
                &mut failed,
                actor,
                press.slot,
                Some(&action),
                ActionFailure::UnknownAction(action.clone()),
            );
            continue;
        };

        if !press.buffered && tags.has(CombatTag::Attacking) && locked_while_attacking(definition) {
            fail(&mut failed, actor, press.slot, Some(&action), ActionFailure::InputLocked);
            continue;
        }

        let mut parts = ActorParts {
            tags: &mut tags,
            vulnerability: &mut vulnerability,
            parry: &mut parry,
            clock: &mut clock,
        };

        if let Some(current) = slots.active_slot() {
            if current == press.slot && !press.buffered {
                // Второе нажатие toggle action выключает его
                if let Some(instance) = slots.get_mut(current) {
                    if instance.is_toggled_on() {
                        let effects = instance.toggle_off(definition);
                        output.apply(actor, current, &action, effects, &mut parts);
                        clear_finished_current(&mut slots);
                    }
                }
                continue;
            }

            let factor = output.rules().interrupted_cooldown_factor;
            let Some(current_instance) = slots.get_mut(current) else {
                continue;
            };
            let current_action = current_instance.action.clone();
            let Some(current_definition) = definitions.get(&current_action) else {
                continue;
            };

            let effects = if press.buffered {
                // Combo replay: текущая атака завершается, а не прерывается
                let mut effects = current_instance.release(current_definition);
                if current_instance.is_active() {
                    effects.extend(current_instance.force_interrupt(current_definition, factor));
                }
                effects
            } else {
                match current_instance.interrupt(current_definition, factor) {
                    Ok(effects) => effects,
                    Err(refused) => {
                        crate::logger::log_warning(&format!("⚠️ {:?}: {}", actor, refused));
                        fail(
                            &mut failed,
                            actor,
                            press.slot,
                            Some(&action),
                            ActionFailure::NotInterruptible(refused.0),
                        );
                        continue;
                    }
                }
            };
            output.apply(actor, current, &current_action, effects, &mut parts);
            slots.set_current(None);
        }

        let Some(instance) = slots.get_mut(press.slot) else {
            continue;
        };
        if let Err(refusal) = instance.can_activate(definition, parts.tags) {
            fail(&mut failed, actor, press.slot, Some(&action), refusal.into());
            continue;
        }

        let effects = instance.activate(definition, output.rules());
        let still_active = instance.is_active();
        output.apply(actor, press.slot, &action, effects, &mut parts);
        if still_active {
            slots.set_current(Some(press.slot));
        }

        crate::logger::log(&format!("⚔️ {:?} activated '{}' ({:?})", actor, action, press.slot));
        activated.write(ActionActivated {
            actor,
            slot: press.slot,
            action,
        });
    }
}

/// System: отпускание слота (hold-to-maintain actions, например block).
pub fn process_slot_releases(
    mut releases: EventReader<SlotReleased>,
    definitions: Res<ActionDefinitions>,
    mut actors: Query<(
        &mut ActionSlots,
        &mut CombatStateTags,
        &mut Vulnerability,
        &mut ParryWindow,
        &mut CombatClock,
    )>,
    mut output: ActionOutput,
) {
    for release in releases.read() {
        let Ok((mut slots, mut tags, mut vulnerability, mut parry, mut clock)) = actors.get_mut(release.actor) else {
            continue;
        };
        let Some(instance) = slots.get_mut(release.slot) else {
            continue;
        };
        let Some(definition) = definitions.get(&instance.action) else {
            continue;
        };

        let action = instance.action.clone();
        let effects = instance.release(definition);
        let mut parts = ActorParts {
            tags: &mut tags,
            vulnerability: &mut vulnerability,
            parry: &mut parry,
            clock: &mut clock,
        };
        output.apply(release.actor, release.slot, &action, effects, &mut parts);
        clear_finished_current(&mut slots);
    }
}

/// System: tick всех instance (active timers, cooldowns).
pub fn tick_actions(
    definitions: Res<ActionDefinitions>,
    mut actors: Query<(
        Entity,
        &mut ActionSlots,
        &mut CombatStateTags,
        &mut Vulnerability,
        &mut ParryWindow,
        &mut CombatClock,
    )>,
    mut output: ActionOutput,
) {
    let delta = output.time.delta_secs();
    if delta <= 0.0 {
        return;
    }

    for (actor, mut slots, mut tags, mut vulnerability, mut parry, mut clock) in actors.iter_mut() {
        let mut parts = ActorParts {
            tags: &mut tags,
            vulnerability: &mut vulnerability,
            parry: &mut parry,
            clock: &mut clock,
        };

        for slot in ActionSlot::ALL {
            let Some(instance) = slots.get_mut(slot) else {
                continue;
            };
            if instance.state() == ActionState::Idle {
                continue;
            }
            let Some(definition) = definitions.get(&instance.action) else {
                continue;
            };

            let action = instance.action.clone();
            let effects = instance.tick(delta, definition);
            if !effects.is_empty() {
                output.apply(actor, slot, &action, effects, &mut parts);
            }
        }

        clear_finished_current(&mut slots);
    }
}

/// System: interrupt requests (stagger, death, gameplay).
///
/// `force` игнорирует `interruptible == false`.
pub fn process_interrupt_requests(
    mut requests: EventReader<InterruptActionIntent>,
    definitions: Res<ActionDefinitions>,
    mut actors: Query<(
        &mut ActionSlots,
        &mut CombatStateTags,
        &mut Vulnerability,
        &mut ParryWindow,
        &mut CombatClock,
    )>,
    mut output: ActionOutput,
    mut failed: EventWriter<ActionFailed>,
) {
    for request in requests.read() {
        let Ok((mut slots, mut tags, mut vulnerability, mut parry, mut clock)) = actors.get_mut(request.actor) else {
            continue;
        };
        let Some(current) = slots.active_slot() else {
            continue;
        };

        let factor = output.rules().interrupted_cooldown_factor;
        let Some(instance) = slots.get_mut(current) else {
            continue;
        };
        let Some(definition) = definitions.get(&instance.action) else {
            continue;
        };
        let action = instance.action.clone();

        let effects = if request.force {
            instance.force_interrupt(definition, factor)
        } else {
            match instance.interrupt(definition, factor) {
                Ok(effects) => effects,
                Err(refused) => {
                    crate::logger::log_warning(&format!("⚠️ Interrupt refused for {:?}: {}", request.actor, refused));
                    fail(
                        &mut failed,
                        request.actor,
                        current,
                        Some(&action),
                        ActionFailure::NotInterruptible(refused.0),
                    );
                    continue;
                }
            }
        };

        let mut parts = ActorParts {
            tags: &mut tags,
            vulnerability: &mut vulnerability,
            parry: &mut parry,
            clock: &mut clock,
        };
        output.apply(request.actor, current, &action, effects, &mut parts);
        clear_finished_current(&mut slots);

        crate::logger::log(&format!("🛑 {:?} interrupted '{}'", request.actor, action));
    }
}

/// Текущая melee атака актора (для `AttackHit { attack: None }`)
pub fn current_attack<'a>(slots: &ActionSlots, definitions: &'a ActionDefinitions) -> Option<&'a ActionDefinition> {
    slots
        .active_action()
        .and_then(|action| definitions.get(action))
        .filter(|definition| definition.is_attack())
}

