//! Impact classifier: knockback → wall / floor / slope.

use bevy::prelude::*;

use crate::config::CombatRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactKind {
    Wall,
    Floor,
    /// Без спец. обработки, трекинг продолжается
    Slope,
}

/// `|n·up| < wall_threshold` → Wall, `n·up > floor_threshold` → Floor.
///
/// Вырожденная нормаль классифицируется как Slope.
pub fn classify_impact(normal: Vec3, up: Vec3, wall_threshold: f32, floor_threshold: f32) -> ImpactKind {
    let Some(normal) = normal.try_normalize() else {
        return ImpactKind::Slope;
    };

    let alignment = normal.dot(up);
    if alignment.abs() < wall_threshold {
        ImpactKind::Wall
    } else if alignment > floor_threshold {
        ImpactKind::Floor
    } else {
        ImpactKind::Slope
    }
}

/// Отскок от стены: вдоль нормали + немного вверх, сила × scale
pub fn wall_bounce_impulse(normal: Vec3, force: f32, rules: &CombatRules) -> Vec3 {
    let up = rules.world_up();
    let direction = (normal.normalize_or_zero() + up * rules.wall_bounce_upward).normalize_or_zero();
    direction * force * rules.wall_bounce_force_scale
}

/// Entity летит после сильного knockback; ждём первый контакт.
///
/// Один tracker = одно impact событие: компонент удаляется на первом
/// Wall/Floor или по таймауту.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ImpactTracker {
    pub force: f32,
    pub remaining: f32,
    pub ragdoll: bool,
    pub attacker: Entity,
}

impl ImpactTracker {
    /// None если сила ниже порога
    pub fn start(force: f32, ragdoll: bool, attacker: Entity, rules: &CombatRules) -> Option<Self> {
        if force < rules.min_knockback_for_impact {
            return None;
        }
        Some(Self {
            force,
            remaining: rules.impact_tracking_timeout,
            ragdoll,
            attacker,
        })
    }

    /// Returns true когда таймаут истёк
    pub fn tick(&mut self, delta: f32) -> bool {
        self.remaining -= delta;
        self.remaining <= 0.0
    }
}
