//! Knockback impact systems + scheduled follow-ups.

use bevy::prelude::*;
use bevy_rapier3d::prelude::ExternalImpulse;

use super::CombatEvents;
use crate::combat::components::{CombatStateTags, CombatTag, Health, Poise, PoiseHit};
use crate::combat::events::{
    FloorImpact, HealthChanged, KnockbackCollision, PoiseChanged, RagdollRecovered, WallImpact,
};
use crate::combat::impact::{classify_impact, wall_bounce_impulse, ImpactKind, ImpactTracker};
use crate::combat::timers::{ScheduledTask, ScheduledTasks};
use crate::config::CombatRules;

/// System: первый контакт после knockback → wall / floor эффекты.
///
/// Wall: бонусный урон, гарантированный stagger, отложенное продление
/// stagger, отскок от стены. Floor: poise урон + Ragdolled до recovery.
/// Slope: трекинг продолжается.
#[allow(clippy::too_many_arguments)]
pub fn process_knockback_collisions(
    mut collisions: EventReader<KnockbackCollision>,
    rules: Res<CombatRules>,
    mut tasks: ResMut<ScheduledTasks>,
    mut targets: Query<(&ImpactTracker, &mut Health, &mut Poise, &mut CombatStateTags)>,
    mut impulses: Query<&mut ExternalImpulse>,
    mut commands: Commands,
    mut events: CombatEvents,
    mut wall_impacts: EventWriter<WallImpact>,
    mut floor_impacts: EventWriter<FloorImpact>,
) {
    let mut handled: Vec<Entity> = Vec::new();

    for collision in collisions.read() {
        if handled.contains(&collision.entity) {
            continue;
        }
        // Не трекается (порог/таймаут/уже обработан) - контакт игнорируется
        let Ok((tracker, mut health, mut poise, mut tags)) = targets.get_mut(collision.entity) else {
            continue;
        };
        let tracker = *tracker;

        // Умер после старта трекинга: impact не применяется
        if health.is_dead() {
            handled.push(collision.entity);
            commands.entity(collision.entity).remove::<ImpactTracker>();
            continue;
        }

        let kind = classify_impact(
            collision.normal,
            rules.world_up(),
            rules.wall_angle_threshold,
            rules.floor_angle_threshold,
        );

        match kind {
            ImpactKind::Slope => continue,
            ImpactKind::Wall => {
                let change = health.take_damage(rules.wall_impact_damage);
                if change.applied > 0.0 {
                    events.health_changed.write(HealthChanged {
                        entity: collision.entity,
                        current: health.current,
                        max: health.max,
                        delta: -change.applied,
                        instigator: Some(tracker.attacker),
                    });
                }
                if change.died {
                    events.died(collision.entity, &mut tags, Some(tracker.attacker));
                } else {
                    if poise.force_stagger(rules.wall_impact_stagger_duration) == PoiseHit::Staggered {
                        events.poise_changed.write(PoiseChanged {
                            entity: collision.entity,
                            current: poise.current,
                            max: poise.max,
                        });
                        events.stagger_started(
                            collision.entity,
                            &mut tags,
                            poise.stagger_remaining,
                            Some(tracker.attacker),
                        );
                    }
                    tasks.schedule(
                        rules.wall_followup_delay(),
                        ScheduledTask::ExtendStagger {
                            entity: collision.entity,
                            seconds: rules.wall_followup_stagger_extension,
                        },
                    );
                }

                if let Ok(mut impulse) = impulses.get_mut(collision.entity) {
                    impulse.impulse += wall_bounce_impulse(collision.normal, tracker.force, &rules);
                }

                crate::logger::log(&format!(
                    "🧱 {:?} wall impact (force {:.0})",
                    collision.entity, tracker.force
                ));
                wall_impacts.write(WallImpact {
                    entity: collision.entity,
                    normal: collision.normal,
                    force: tracker.force,
                });
            }
            ImpactKind::Floor => {
                match poise.take_poise_damage(rules.floor_impact_poise_damage) {
                    PoiseHit::Ignored => {}
                    PoiseHit::Damaged => {
                        events.poise_changed.write(PoiseChanged {
                            entity: collision.entity,
                            current: poise.current,
                            max: poise.max,
                        });
                    }
                    PoiseHit::Staggered => {
                        events.poise_changed.write(PoiseChanged {
                            entity: collision.entity,
                            current: poise.current,
                            max: poise.max,
                        });
                        events.stagger_started(
                            collision.entity,
                            &mut tags,
                            poise.stagger_remaining,
                            Some(tracker.attacker),
                        );
                    }
                }

                tags.add(CombatTag::Ragdolled);
                tasks.schedule(
                    rules.floor_impact_ragdoll_duration,
                    ScheduledTask::RecoverFromRagdoll {
                        entity: collision.entity,
                    },
                );

                crate::logger::log(&format!(
                    "⬇️ {:?} floor impact (force {:.0})",
                    collision.entity, tracker.force
                ));
                floor_impacts.write(FloorImpact {
                    entity: collision.entity,
                    normal: collision.normal,
                    force: tracker.force,
                });
            }
        }

        // Одно impact событие на tracked knockback
        handled.push(collision.entity);
        commands.entity(collision.entity).remove::<ImpactTracker>();
    }
}

/// System: таймаут трекинга (контакта не было).
pub fn tick_impact_trackers(
    mut trackers: Query<(Entity, &mut ImpactTracker)>,
    time: Res<Time>,
    mut commands: Commands,
) {
    let delta = time.delta_secs();
    for (entity, mut tracker) in trackers.iter_mut() {
        if tracker.tick(delta) {
            commands.entity(entity).remove::<ImpactTracker>();
        }
    }
}

/// System: исполняет созревшие scheduled tasks.
///
/// Entity могла исчезнуть или умереть - задача тогда просто пропускается.
pub fn run_scheduled_tasks(
    mut tasks: ResMut<ScheduledTasks>,
    time: Res<Time>,
    mut actors: Query<(&Health, &mut Poise, &mut CombatStateTags)>,
    mut recovered: EventWriter<RagdollRecovered>,
) {
    for task in tasks.advance(time.delta_secs()) {
        let Ok((health, mut poise, mut tags)) = actors.get_mut(task.entity()) else {
            continue;
        };

        match task {
            ScheduledTask::ExtendStagger { entity, seconds } => {
                if health.is_alive() && poise.extend_stagger(seconds) {
                    crate::logger::log(&format!("💫 {:?} stagger extended by {:.2}s", entity, seconds));
                }
            }
            ScheduledTask::RecoverFromRagdoll { entity } => {
                if tags.remove(CombatTag::Ragdolled) {
                    recovered.write(RagdollRecovered { entity });
                }
            }
        }
    }
}
