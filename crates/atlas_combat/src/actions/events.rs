//! Action system events
//!
//! # Ingress (input / gameplay layer → ECS)
//! - `SlotPressed` / `SlotReleased` - нажатие/отпускание слота
//! - `AssignActionIntent` / `ClearSlotIntent` / `SwapSlotsIntent` - loadout
//! - `InterruptActionIntent` - прервать текущее действие (stagger, death, gameplay)
//!
//! # Egress (ECS → presentation)
//! - `ActionActivated`, `ActionStateChanged`, `ActionFailed`, `InputBuffered`
//! - `DashStarted`, `RangedAttackFired`, `AreaEffectTriggered` - execution hooks
//!   для movement/projectile/VFX слоёв

use bevy::prelude::*;
use thiserror::Error;

use super::definition::ActionId;
use super::instance::{ActionState, ActivationRefusal};
use super::slots::ActionSlot;

// ============================================================================
// Input
// ============================================================================

/// Нажатие слота.
///
/// `buffered == true` - replay из combo buffer (ComboWindowEnd), такой press
/// обходит input lock и завершает текущую атаку вместо interrupt.
#[derive(Event, Clone, Debug)]
pub struct SlotPressed {
    pub actor: Entity,
    pub slot: ActionSlot,
    pub buffered: bool,
}

impl SlotPressed {
    pub fn new(actor: Entity, slot: ActionSlot) -> Self {
        Self {
            actor,
            slot,
            buffered: false,
        }
    }
}

/// Отпускание слота (hold-to-maintain actions)
#[derive(Event, Clone, Debug)]
pub struct SlotReleased {
    pub actor: Entity,
    pub slot: ActionSlot,
}

// ============================================================================
// Loadout
// ============================================================================

#[derive(Event, Clone, Debug)]
pub struct AssignActionIntent {
    pub actor: Entity,
    pub slot: ActionSlot,
    pub action: ActionId,
}

#[derive(Event, Clone, Debug)]
pub struct ClearSlotIntent {
    pub actor: Entity,
    pub slot: ActionSlot,
}

#[derive(Event, Clone, Debug)]
pub struct SwapSlotsIntent {
    pub actor: Entity,
    pub a: ActionSlot,
    pub b: ActionSlot,
}

/// Прервать текущее действие актора.
///
/// `force == true` игнорирует `interruptible` (stagger, death).
#[derive(Event, Clone, Debug)]
pub struct InterruptActionIntent {
    pub actor: Entity,
    pub force: bool,
}

// ============================================================================
// Output
// ============================================================================

#[derive(Event, Clone, Debug)]
pub struct ActionSlotChanged {
    pub actor: Entity,
    pub slot: ActionSlot,
    /// None - слот очищен
    pub action: Option<ActionId>,
}

#[derive(Event, Clone, Debug)]
pub struct ActionActivated {
    pub actor: Entity,
    pub slot: ActionSlot,
    pub action: ActionId,
}

#[derive(Event, Clone, Debug)]
pub struct ActionStateChanged {
    pub actor: Entity,
    pub slot: ActionSlot,
    pub action: ActionId,
    pub state: ActionState,
}

/// Причина отказа (для UI feedback)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionFailure {
    #[error("unknown action {0}")]
    UnknownAction(ActionId),
    #[error("slot is empty")]
    EmptySlot,
    #[error("actor is dead")]
    Dead,
    #[error("input locked while attacking")]
    InputLocked,
    #[error("current action {0} cannot be interrupted")]
    NotInterruptible(ActionId),
    #[error(transparent)]
    Refused(#[from] ActivationRefusal),
}

#[derive(Event, Clone, Debug)]
pub struct ActionFailed {
    pub actor: Entity,
    pub slot: ActionSlot,
    /// None - слот пуст
    pub action: Option<ActionId>,
    pub reason: ActionFailure,
}

/// Press попал в открытое combo window и ждёт ComboWindowEnd
#[derive(Event, Clone, Debug)]
pub struct InputBuffered {
    pub actor: Entity,
    pub slot: ActionSlot,
}

// ============================================================================
// Execution hooks
// ============================================================================

#[derive(Event, Clone, Debug)]
pub struct DashStarted {
    pub actor: Entity,
    pub distance: f32,
    pub duration: f32,
}

#[derive(Event, Clone, Debug)]
pub struct RangedAttackFired {
    pub actor: Entity,
    pub action: ActionId,
    pub damage: f32,
    pub range: f32,
    pub projectile_speed: f32,
}

#[derive(Event, Clone, Debug)]
pub struct AreaEffectTriggered {
    pub actor: Entity,
    pub action: ActionId,
    pub radius: f32,
    pub damage: f32,
    pub affects_allies: bool,
}
