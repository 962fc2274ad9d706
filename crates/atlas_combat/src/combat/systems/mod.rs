//! Combat systems

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::components::{CombatStateTags, CombatTag, Vulnerability, VulnerabilityTier};
use super::events::*;
use crate::actions::InterruptActionIntent;
use crate::config::CombatRules;

pub mod health;
pub mod hit;
pub mod impact;
pub mod notify;
pub mod recovery;


pub use health::{apply_rule_defaults, process_heal_intents, process_revive_intents, sync_integrity_rules};
pub use hit::process_attack_hits;
pub use impact::{process_knockback_collisions, run_scheduled_tasks, tick_impact_trackers};
pub use notify::process_animation_notifies;
pub use recovery::{sync_vulnerability_tags, tick_parry_windows, tick_poise, tick_vulnerability};

/// Egress события боевого ядра (общие для hit / impact / recovery систем)
#[derive(SystemParam)]
pub struct CombatEvents<'w> {
    pub damage_resolved: EventWriter<'w, DamageResolved>,
    pub health_changed: EventWriter<'w, HealthChanged>,
    pub poise_changed: EventWriter<'w, PoiseChanged>,
    pub stagger_started: EventWriter<'w, StaggerStarted>,
    pub entity_died: EventWriter<'w, EntityDied>,
    pub vulnerability_applied: EventWriter<'w, VulnerabilityApplied>,
    pub vulnerability_ended: EventWriter<'w, VulnerabilityEnded>,
    pub parry_success: EventWriter<'w, ParrySuccess>,
    pub knockback_applied: EventWriter<'w, KnockbackApplied>,
    pub interrupts: EventWriter<'w, InterruptActionIntent>,
}

impl CombatEvents<'_> {
    /// Stagger entry: тег + force interrupt текущего действия + событие
    pub fn stagger_started(
        &mut self,
        entity: Entity,
        tags: &mut CombatStateTags,
        duration: f32,
        instigator: Option<Entity>,
    ) {
        tags.add(CombatTag::Staggered);
        self.interrupts.write(InterruptActionIntent {
            actor: entity,
            force: true,
        });
        crate::logger::log(&format!("💫 {:?} staggered for {:.2}s", entity, duration));
        self.stagger_started.write(StaggerStarted {
            entity,
            duration,
            instigator,
        });
    }

    /// Death: Dead тег, выход из Attacking/Blocking, force interrupt
    pub fn died(&mut self, entity: Entity, tags: &mut CombatStateTags, killer: Option<Entity>) {
        tags.add(CombatTag::Dead);
        for tag in [CombatTag::Attacking, CombatTag::Blocking, CombatTag::Parrying] {
            tags.remove(tag);
        }
        self.interrupts.write(InterruptActionIntent {
            actor: entity,
            force: true,
        });
        crate::logger::log_info(&format!("💀 {:?} died (killer: {:?})", entity, killer));
        self.entity_died.write(EntityDied { entity, killer });
    }

    pub fn apply_vulnerability(
        &mut self,
        entity: Entity,
        vulnerability: &mut Vulnerability,
        tags: &mut CombatStateTags,
        tier: VulnerabilityTier,
        rules: &CombatRules,
    ) {
        let params = rules.vulnerability.get(tier);
        vulnerability.apply_tier(tier, params);
        sync_vulnerability_tags(vulnerability, tags);

        if vulnerability.is_vulnerable() {
            crate::logger::log(&format!(
                "🎯 {:?} vulnerable: {:?} ×{:.1} for {:.2}s",
                entity,
                tier,
                vulnerability.damage_multiplier(),
                vulnerability.remaining()
            ));
            self.vulnerability_applied.write(VulnerabilityApplied {
                entity,
                tier,
                duration: vulnerability.remaining(),
                multiplier: vulnerability.damage_multiplier(),
            });
        }
    }
}
