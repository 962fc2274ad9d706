//! Heal / revive intents.

use bevy::prelude::*;

use crate::combat::components::{CombatActor, CombatStateTags, CombatTag, Health, Poise};
use crate::combat::events::{HealIntent, HealthChanged, ReviveIntent};
use crate::combat::station::StationIntegrity;
use crate::combat::timers::ScheduledTasks;
use crate::config::CombatRules;

/// Observer: новый `CombatActor` получает health/poise из текущих `CombatRules`.
///
/// Компоненты, переданные в spawn явно (`Health::new(250.0)`), не трогаются.
pub fn apply_rule_defaults(
    trigger: Trigger<OnAdd, CombatActor>,
    rules: Option<Res<CombatRules>>,
    mut actors: Query<(&mut Health, &mut Poise)>,
) {
    let Some(rules) = rules else {
        return;
    };
    let Ok((mut health, mut poise)) = actors.get_mut(trigger.target()) else {
        return;
    };

    if health.uses_rule_defaults() {
        *health = Health::from_rules(&rules);
    }
    if poise.uses_rule_defaults() {
        *poise = Poise::from_rules(&rules);
    }
}

/// System: новые `CombatRules` → max / пороги station integrity (процент сохраняется).
pub fn sync_integrity_rules(rules: Res<CombatRules>, mut integrity: ResMut<StationIntegrity>) {
    integrity.reconfigure(&rules);
}

/// System: heal (no-op для мёртвых и при полном HP).
pub fn process_heal_intents(
    mut intents: EventReader<HealIntent>,
    mut targets: Query<&mut Health>,
    mut health_changed: EventWriter<HealthChanged>,
) {
    for intent in intents.read() {
        let Ok(mut health) = targets.get_mut(intent.target) else {
            crate::logger::log_warning(&format!("⚠️ HealIntent: {:?} has no Health", intent.target));
            continue;
        };

        let healed = health.heal(intent.amount);
        if healed > 0.0 {
            health_changed.write(HealthChanged {
                entity: intent.target,
                current: health.current,
                max: health.max,
                delta: healed,
                instigator: intent.instigator,
            });
        }
    }
}

/// System: revive (Dead → живой, clamp [1, max]).
pub fn process_revive_intents(
    mut intents: EventReader<ReviveIntent>,
    mut targets: Query<(&mut Health, &mut Poise, &mut CombatStateTags)>,
    mut tasks: ResMut<ScheduledTasks>,
    mut health_changed: EventWriter<HealthChanged>,
) {
    for intent in intents.read() {
        let Ok((mut health, mut poise, mut tags)) = targets.get_mut(intent.target) else {
            continue;
        };

        if !health.revive(intent.health) {
            continue;
        }

        tags.remove(CombatTag::Dead);
        tags.remove(CombatTag::Ragdolled);
        tags.remove(CombatTag::Staggered);
        poise.recover_from_stagger();
        tasks.cancel_for(intent.target);

        crate::logger::log_info(&format!("✨ {:?} revived with {:.0} HP", intent.target, health.current));
        health_changed.write(HealthChanged {
            entity: intent.target,
            current: health.current,
            max: health.max,
            delta: health.current,
            instigator: None,
        });
    }
}
