//! Combat resolution core
//!
//! ECS ответственность:
//! - Health / Poise / Vulnerability / ParryWindow / ComboWindow компоненты
//! - Damage pipeline: `AttackHit` → `resolve_damage` → мутации target
//! - Knockback → impact classification (wall / floor / slope)
//! - Station integrity, slow motion, scheduled follow-ups
//!
//! Animation / physics слои (вне ядра):
//! - hit-sweep → `AttackHit`
//! - parry/combo notifies → `AnimationNotify`
//! - rigid body contact → `KnockbackCollision`
//!
//! Ядро ничего не вызывает у presentation - только broadcast событий.

use bevy::prelude::*;

pub mod components;
pub mod damage;
pub mod dilation;
pub mod events;
pub mod impact;
pub mod queries;
pub mod station;
pub mod systems;
pub mod timers;


pub use components::*;
pub use damage::{resolve_damage, AttackProfile, HitContext};
pub use dilation::TimeDilation;
pub use events::*;
pub use impact::{classify_impact, ImpactKind, ImpactTracker};
pub use queries::{distance_to_target, is_in_combat};
pub use station::{IntegrityUpdate, StationIntegrity};
pub use timers::{ScheduledTask, ScheduledTasks, TaskHandle};

/// Стадии боевого тика (FixedUpdate), строго по порядку
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// Scheduled tasks, action timers/cooldowns
    Timers,
    /// Animation notifies (parry/combo windows, combo replay)
    Input,
    /// Loadout, slot presses/releases
    Actions,
    /// Hits, impacts, heal/revive
    Resolve,
    /// Interrupts от stagger/death
    Aftermath,
    /// Poise / vulnerability / parry / impact timeouts
    Recovery,
}

impl CombatSet {
    /// Идемпотентно: вызывают оба plugin'а
    pub fn configure(app: &mut App) {
        app.configure_sets(
            FixedUpdate,
            (
                CombatSet::Timers,
                CombatSet::Input,
                CombatSet::Actions,
                CombatSet::Resolve,
                CombatSet::Aftermath,
                CombatSet::Recovery,
            )
                .chain(),
        );
    }
}

/// Combat Plugin
///
/// Порядок выполнения (FixedUpdate, 60Hz):
/// 1. Timers - sync_integrity_rules (если правила сменились), run_scheduled_tasks
///    (wall follow-up, ragdoll recovery)
/// 2. Input - process_animation_notifies
/// 3. Resolve - attack hits → knockback collisions → heal/revive
/// 4. Recovery - poise, vulnerability, parry windows, impact timeouts
///
/// Slow motion (`apply_time_dilation`) работает в Update: меняет `Time<Virtual>`.
/// Observer `apply_rule_defaults` заполняет health/poise нового `CombatActor` из правил.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<crate::config::CombatRules>()
            .init_resource::<crate::actions::ActionDefinitions>()
            .init_resource::<ScheduledTasks>()
            .init_resource::<TimeDilation>();

        if !app.world().contains_resource::<StationIntegrity>() {
            let integrity = app
                .world()
                .get_resource::<crate::config::CombatRules>()
                .map(StationIntegrity::from_rules)
                .unwrap_or_default();
            app.insert_resource(integrity);
        }

        // Ingress
        app.add_event::<AttackHit>()
            .add_event::<KnockbackCollision>()
            .add_event::<AnimationNotify>()
            .add_event::<HealIntent>()
            .add_event::<ReviveIntent>();

        // Egress
        app.add_event::<DamageResolved>()
            .add_event::<HealthChanged>()
            .add_event::<PoiseChanged>()
            .add_event::<StaggerStarted>()
            .add_event::<StaggerEnded>()
            .add_event::<EntityDied>()
            .add_event::<VulnerabilityApplied>()
            .add_event::<VulnerabilityEnded>()
            .add_event::<IFramesStarted>()
            .add_event::<ParrySuccess>()
            .add_event::<KnockbackApplied>()
            .add_event::<WallImpact>()
            .add_event::<FloorImpact>()
            .add_event::<RagdollRecovered>()
            .add_event::<IntegrityChanged>()
            .add_event::<IntegrityCritical>()
            .add_event::<IntegrityFailed>();

        // Пишутся из combat систем (stagger/death interrupt, combo replay)
        app.add_event::<crate::actions::InterruptActionIntent>()
            .add_event::<crate::actions::SlotPressed>();

        CombatSet::configure(app);

        app.add_systems(
            FixedUpdate,
            (
                (
                    systems::sync_integrity_rules.run_if(resource_exists_and_changed::<crate::config::CombatRules>),
                    systems::run_scheduled_tasks,
                )
                    .chain()
                    .in_set(CombatSet::Timers),
                systems::process_animation_notifies.in_set(CombatSet::Input),
                (
                    systems::process_attack_hits,
                    systems::process_knockback_collisions,
                    systems::process_heal_intents,
                    systems::process_revive_intents,
                )
                    .chain()
                    .in_set(CombatSet::Resolve),
                (
                    systems::tick_poise,
                    systems::tick_vulnerability,
                    systems::tick_parry_windows,
                    systems::tick_impact_trackers,
                )
                    .chain()
                    .in_set(CombatSet::Recovery),
            ),
        );

        app.add_observer(systems::apply_rule_defaults);

        app.add_systems(Update, dilation::apply_time_dilation);
    }
}
