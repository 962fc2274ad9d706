//! Attack hit processing (animation hit-sweep → damage pipeline).

use bevy::prelude::*;
use bevy_rapier3d::prelude::ExternalImpulse;

use super::CombatEvents;
use crate::actions::{current_attack, ActionDefinition, ActionDefinitions, ActionKind, ActionSlots};
use crate::combat::components::{
    CombatClock, CombatStateTags, CombatTag, Health, ParryQuality, ParryWindow, Poise, PoiseHit,
    Vulnerability, VulnerabilityTier,
};
use crate::combat::damage::{knockback_direction, resolve_damage, AttackProfile, HitContext};
use crate::combat::dilation::TimeDilation;
use crate::combat::events::{
    AttackHit, DamageResolved, HealthChanged, ParrySuccess, PoiseChanged, VulnerabilityEndReason,
    VulnerabilityEnded, KnockbackApplied,
};
use crate::combat::impact::ImpactTracker;
use crate::config::CombatRules;

/// Удар по definition: melee → AttackParams, ranged/area → только урон
pub fn attack_profile(definition: &ActionDefinition) -> Option<AttackProfile> {
    match &definition.kind {
        ActionKind::MeleeAttack(params) => Some(AttackProfile::from(params)),
        ActionKind::RangedAttack(params) => Some(AttackProfile::damage_only(params.damage)),
        ActionKind::AreaEffect(params) => Some(AttackProfile::damage_only(params.damage)),
        _ => None,
    }
}

/// System: `AttackHit` → resolve → health/poise/vulnerability/knockback.
///
/// Attacker tags читаются ДО мутаций target. Мутируется только target,
/// кроме perfect parry (Stunned вешается на attacker).
#[allow(clippy::too_many_arguments)]
pub fn process_attack_hits(
    mut hits: EventReader<AttackHit>,
    rules: Option<Res<CombatRules>>,
    definitions: Res<ActionDefinitions>,
    time: Res<Time>,
    mut dilation: ResMut<TimeDilation>,
    mut actors: Query<(
        &mut Health,
        &mut Poise,
        &mut Vulnerability,
        &mut CombatStateTags,
        &ParryWindow,
        &ActionSlots,
        &mut CombatClock,
        Option<&Transform>,
    )>,
    mut impulses: Query<&mut ExternalImpulse>,
    mut commands: Commands,
    mut events: CombatEvents,
) {
    let fallback_rules = CombatRules::default();
    let tuning = rules.as_deref().unwrap_or(&fallback_rules);
    let now = time.elapsed_secs();

    for hit in hits.read() {
        if hit.attacker == hit.target {
            continue;
        }

        let Ok([attacker, target]) = actors.get_many_mut([hit.attacker, hit.target]) else {
            crate::logger::log_warning(&format!(
                "⚠️ AttackHit {:?} → {:?}: missing combat components",
                hit.attacker, hit.target
            ));
            continue;
        };
        let (_, _, mut attacker_vulnerability, mut attacker_tags, _, attacker_slots, mut attacker_clock, attacker_transform) =
            attacker;
        let (mut health, mut poise, mut vulnerability, mut tags, parry, _, mut clock, target_transform) = target;

        if health.is_dead() {
            continue;
        }

        let definition = match &hit.attack {
            Some(id) => definitions.get(id),
            None => current_attack(attacker_slots, &definitions),
        };
        let Some(profile) = definition.and_then(attack_profile) else {
            match &hit.attack {
                Some(id) => crate::logger::log_error(&format!("❌ AttackHit: unknown attack '{}'", id)),
                None => crate::logger::log_warning(&format!(
                    "⚠️ AttackHit: {:?} has no current attack",
                    hit.attacker
                )),
            }
            continue;
        };

        let snapshot_attacker_tags = *attacker_tags;
        let ctx = HitContext {
            attacker: hit.attacker,
            target: hit.target,
            attack: &profile,
            attacker_tags: &snapshot_attacker_tags,
            defender_tags: &tags,
            vulnerability: &vulnerability,
            parry: parry.quality(),
        };
        let resolution = resolve_damage(&ctx, rules.as_deref());

        if resolution.was_avoided {
            crate::logger::log(&format!("💨 {:?} avoided hit from {:?} (i-frames)", hit.target, hit.attacker));
            events.damage_resolved.write(DamageResolved {
                resolution,
                applied: 0.0,
            });
            continue;
        }

        attacker_clock.mark(now);
        clock.mark(now);

        // ===== Parry =====
        if let Some(quality) = resolution.parry_quality {
            if quality == ParryQuality::Perfect {
                events.apply_vulnerability(
                    hit.attacker,
                    &mut attacker_vulnerability,
                    &mut attacker_tags,
                    VulnerabilityTier::Stunned,
                    tuning,
                );
                dilation.trigger(tuning.perfect_parry_time_dilation, tuning.time_dilation_duration);
            }
            crate::logger::log(&format!("🛡️ {:?} parried {:?} ({:?})", hit.target, hit.attacker, quality));
            events.parry_success.write(ParrySuccess {
                defender: hit.target,
                attacker: hit.attacker,
                quality,
            });
        }

        // ===== Health =====
        let change = health.take_damage(resolution.final_damage);
        if change.applied > 0.0 {
            events.health_changed.write(HealthChanged {
                entity: hit.target,
                current: health.current,
                max: health.max,
                delta: -change.applied,
                instigator: Some(hit.attacker),
            });
        }

        // Critical hit: уязвимая цель получила урон → tier расходуется
        if resolution.was_vulnerable && resolution.final_damage > 0.0 {
            let tier = vulnerability.tier();
            if vulnerability.on_critical_hit_landed() {
                tags.remove(CombatTag::Vulnerable);
                events.vulnerability_ended.write(VulnerabilityEnded {
                    entity: hit.target,
                    tier,
                    reason: VulnerabilityEndReason::Consumed,
                });
            }
        }

        if change.died {
            events.died(hit.target, &mut tags, Some(hit.attacker));
        }

        let perfect_parry = resolution.parry_quality == Some(ParryQuality::Perfect);

        // ===== Poise =====
        if !perfect_parry && !change.died {
            match poise.take_poise_damage(profile.poise_damage) {
                PoiseHit::Ignored => {}
                PoiseHit::Damaged => {
                    events.poise_changed.write(PoiseChanged {
                        entity: hit.target,
                        current: poise.current,
                        max: poise.max,
                    });
                }
                PoiseHit::Staggered => {
                    events.poise_changed.write(PoiseChanged {
                        entity: hit.target,
                        current: poise.current,
                        max: poise.max,
                    });
                    events.stagger_started(hit.target, &mut tags, poise.stagger_remaining, Some(hit.attacker));
                }
            }
        }

        // ===== Knockback =====
        if resolution.knockback > 0.0 {
            let up = tuning.world_up();
            let from = attacker_transform.map(|t| t.translation).unwrap_or(Vec3::ZERO);
            let to = target_transform.map(|t| t.translation).unwrap_or(Vec3::ZERO);
            let direction = knockback_direction(from, to, up, tuning.knockback_upward_force, Vec3::X);

            if let Ok(mut impulse) = impulses.get_mut(hit.target) {
                impulse.impulse += direction * resolution.knockback;
            }
            events.knockback_applied.write(KnockbackApplied {
                target: hit.target,
                attacker: hit.attacker,
                direction,
                force: resolution.knockback,
                ragdoll: resolution.caused_ragdoll,
            });

            // Труп летит, но wall/floor эффектов у него уже нет
            if !change.died {
                if let Some(tracker) =
                    ImpactTracker::start(resolution.knockback, resolution.caused_ragdoll, hit.attacker, tuning)
                {
                    commands.entity(hit.target).insert(tracker);
                }
            }
        }

        crate::logger::log(&format!(
            "⚔️ {:?} → {:?}: {:.1} (base {:.1}{}{}{})",
            hit.attacker,
            hit.target,
            resolution.final_damage,
            resolution.base_damage,
            if resolution.was_blocked { ", blocked" } else { "" },
            if resolution.was_vulnerable { ", vulnerable" } else { "" },
            if resolution.was_parried { ", parried" } else { "" },
        ));
        events.damage_resolved.write(DamageResolved {
            resolution,
            applied: change.applied,
        });
    }
}
