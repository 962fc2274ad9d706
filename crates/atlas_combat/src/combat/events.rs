//! Combat events
//!
//! # Ingress (animation / physics / gameplay → ECS)
//! - `AttackHit` - hit-sweep анимации нашёл цель (единственная точка входа урона)
//! - `KnockbackCollision` - первый контакт rigid body после knockback
//! - `AnimationNotify` - parry/combo окна, привязанные к анимации
//! - `HealIntent`, `ReviveIntent`
//!
//! # Egress (ECS → presentation / AI)
//! Все события отправляются ПОСЛЕ мутации, которую описывают.

use bevy::prelude::*;

use super::components::{CombatTag, ParryQuality, VulnerabilityTier};
use crate::actions::ActionId;

// ============================================================================
// Ingress
// ============================================================================

/// Animation hit-sweep попал в `target`.
///
/// `attack: None` - берётся текущая melee атака attacker'а (ActionSlots).
#[derive(Event, Clone, Debug)]
pub struct AttackHit {
    pub attacker: Entity,
    pub target: Entity,
    pub attack: Option<ActionId>,
}

/// Physics contact для entity, которую сейчас трекает ImpactTracker
#[derive(Event, Clone, Debug)]
pub struct KnockbackCollision {
    pub entity: Entity,
    /// Contact normal (world space, Z-up)
    pub normal: Vec3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationNotifyKind {
    ParryWindowBegin,
    ParryWindowEnd,
    ComboWindowBegin { name: String },
    ComboWindowEnd,
}

#[derive(Event, Clone, Debug)]
pub struct AnimationNotify {
    pub actor: Entity,
    pub kind: AnimationNotifyKind,
}

#[derive(Event, Clone, Debug)]
pub struct HealIntent {
    pub target: Entity,
    pub amount: f32,
    pub instigator: Option<Entity>,
}

#[derive(Event, Clone, Debug)]
pub struct ReviveIntent {
    pub target: Entity,
    pub health: f32,
}

// ============================================================================
// Damage
// ============================================================================

/// Результат одного `resolve_damage` (transient, не хранится)
#[derive(Debug, Clone, PartialEq)]
pub struct AttackResolution {
    pub attacker: Entity,
    pub target: Entity,
    pub base_damage: f32,
    pub final_damage: f32,
    pub was_blocked: bool,
    pub was_parried: bool,
    pub parry_quality: Option<ParryQuality>,
    pub was_vulnerable: bool,
    /// I-frames: удар полностью проигнорирован
    pub was_avoided: bool,
    pub caused_ragdoll: bool,
    /// Итоговая сила (с ragdoll multiplier)
    pub knockback: f32,
    pub attack_tags: Vec<CombatTag>,
}

#[derive(Event, Clone, Debug)]
pub struct DamageResolved {
    pub resolution: AttackResolution,
    /// HP, реально снятые после clamp
    pub applied: f32,
}

#[derive(Event, Clone, Debug)]
pub struct HealthChanged {
    pub entity: Entity,
    pub current: f32,
    pub max: f32,
    /// Отрицательная - урон
    pub delta: f32,
    pub instigator: Option<Entity>,
}

#[derive(Event, Clone, Debug)]
pub struct PoiseChanged {
    pub entity: Entity,
    pub current: f32,
    pub max: f32,
}

#[derive(Event, Clone, Debug)]
pub struct StaggerStarted {
    pub entity: Entity,
    pub duration: f32,
    pub instigator: Option<Entity>,
}

#[derive(Event, Clone, Debug)]
pub struct StaggerEnded {
    pub entity: Entity,
}

/// Entity умерла (Health достиг 0)
#[derive(Event, Clone, Debug)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

// ============================================================================
// Vulnerability / parry
// ============================================================================

#[derive(Event, Clone, Debug)]
pub struct VulnerabilityApplied {
    pub entity: Entity,
    pub tier: VulnerabilityTier,
    pub duration: f32,
    pub multiplier: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VulnerabilityEndReason {
    Expired,
    Consumed,
    Cleared,
}

#[derive(Event, Clone, Debug)]
pub struct VulnerabilityEnded {
    pub entity: Entity,
    pub tier: VulnerabilityTier,
    pub reason: VulnerabilityEndReason,
}

#[derive(Event, Clone, Debug)]
pub struct IFramesStarted {
    pub entity: Entity,
    pub duration: f32,
}

#[derive(Event, Clone, Debug)]
pub struct ParrySuccess {
    pub defender: Entity,
    pub attacker: Entity,
    pub quality: ParryQuality,
}

// ============================================================================
// Knockback / impact
// ============================================================================

#[derive(Event, Clone, Debug)]
pub struct KnockbackApplied {
    pub target: Entity,
    pub attacker: Entity,
    /// Нормализованное направление (с upward компонентой)
    pub direction: Vec3,
    pub force: f32,
    pub ragdoll: bool,
}

#[derive(Event, Clone, Debug)]
pub struct WallImpact {
    pub entity: Entity,
    pub normal: Vec3,
    pub force: f32,
}

#[derive(Event, Clone, Debug)]
pub struct FloorImpact {
    pub entity: Entity,
    pub normal: Vec3,
    pub force: f32,
}

#[derive(Event, Clone, Debug)]
pub struct RagdollRecovered {
    pub entity: Entity,
}

// ============================================================================
// Station integrity
// ============================================================================

#[derive(Event, Clone, Debug)]
pub struct IntegrityChanged {
    pub current: f32,
    pub max: f32,
    pub delta: f32,
    pub source: Option<Entity>,
}

#[derive(Event, Clone, Debug)]
pub struct IntegrityCritical {
    pub current: f32,
}

#[derive(Event, Clone, Debug)]
pub struct IntegrityFailed {
    pub source: Option<Entity>,
}
