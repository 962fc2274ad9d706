//! Combat actor marker and combat clock.

use bevy::prelude::*;

use super::{CombatStateTags, ComboWindow, Health, ParryWindow, Poise, Vulnerability};
use crate::actions::ActionSlots;

/// Combat-capable entity.
///
/// Required components создаются автоматически (Bevy 0.16 required components),
/// spawn-код переопределяет только то, что нужно (например `Health::new(250.0)`).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(
    Health,
    Poise,
    Vulnerability,
    CombatStateTags,
    ActionSlots,
    ParryWindow,
    ComboWindow,
    CombatClock
)]
pub struct CombatActor;

/// Время последнего боевого действия (для "in combat" decay).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct CombatClock {
    /// Секунды от старта симуляции (`Time::elapsed_secs`)
    pub last_combat_action: Option<f32>,
}

impl CombatClock {
    pub fn mark(&mut self, now: f32) {
        self.last_combat_action = Some(now);
    }

    pub fn since_last_action(&self, now: f32) -> Option<f32> {
        self.last_combat_action.map(|at| (now - at).max(0.0))
    }
}
