//! Action/ability system: 5 generic slots per actor, data-driven actions.
//!
//! ECS ответственность:
//! - `ActionDefinitions` - неизменяемый registry (RON / built-in presets)
//! - `ActionSlots` - per-actor instances + текущее действие
//! - Slot arbitration: максимум одно Active действие на актора
//!
//! Input/AI слой шлёт `SlotPressed`/`SlotReleased`, presentation слушает
//! `ActionActivated`, `ActionStateChanged`, `DashStarted` и т.д.

use bevy::prelude::*;

pub mod definition;
pub mod events;
pub mod instance;
pub mod slots;
pub mod systems;


pub use definition::*;
pub use events::*;
pub use instance::{ActionEffect, ActionInstance, ActionState, ActivationRefusal, NotInterruptible};
pub use slots::{ActionSlot, ActionSlots};
pub use systems::current_attack;

use crate::combat::events::{IFramesStarted, IntegrityChanged, IntegrityCritical, IntegrityFailed};
use crate::combat::{CombatSet, StationIntegrity};
use crate::config::CombatRules;

/// Actions Plugin
///
/// Порядок выполнения (FixedUpdate):
/// 1. `CombatSet::Timers` - tick_actions (active timers, cooldowns)
/// 2. `CombatSet::Actions` - loadout → presses → releases
/// 3. `CombatSet::Aftermath` - interrupt requests (stagger/death из Resolve)
pub struct ActionsPlugin;

impl Plugin for ActionsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActionDefinitions>()
            .init_resource::<CombatRules>()
            .init_resource::<StationIntegrity>();

        app.add_event::<SlotPressed>()
            .add_event::<SlotReleased>()
            .add_event::<AssignActionIntent>()
            .add_event::<ClearSlotIntent>()
            .add_event::<SwapSlotsIntent>()
            .add_event::<InterruptActionIntent>()
            .add_event::<ActionSlotChanged>()
            .add_event::<ActionActivated>()
            .add_event::<ActionStateChanged>()
            .add_event::<ActionFailed>()
            .add_event::<InputBuffered>()
            .add_event::<DashStarted>()
            .add_event::<RangedAttackFired>()
            .add_event::<AreaEffectTriggered>()
            // Общие с CombatPlugin (add_event идемпотентен)
            .add_event::<IFramesStarted>()
            .add_event::<IntegrityChanged>()
            .add_event::<IntegrityCritical>()
            .add_event::<IntegrityFailed>();

        CombatSet::configure(app);

        app.add_systems(
            FixedUpdate,
            (
                systems::tick_actions.in_set(CombatSet::Timers),
                (
                    systems::process_slot_assignments,
                    systems::process_slot_presses,
                    systems::process_slot_releases,
                )
                    .chain()
                    .in_set(CombatSet::Actions),
                systems::process_interrupt_requests.in_set(CombatSet::Aftermath),
            ),
        );
    }
}
