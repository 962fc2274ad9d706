//! Damage calculator (pure).
//!
//! `resolve_damage` только считает `AttackResolution`. Мутации
//! (health, poise, vulnerability, knockback) делает `systems::hit`.
//!
//! Порядок:
//! 1. I-frames → avoided, 0 урона, без knockback
//! 2. Нет `CombatRules` → base damage без модификаторов
//! 3. × vulnerability multiplier
//! 4. Parry (perfect 0, late ×(1-reduction)) ИЛИ block ×(1-block_reduction)
//! 5. × tag multipliers (attacker tags + attack tags + defender tags)
//! 6. clamp >= 0

use bevy::prelude::*;

use super::components::{CombatStateTags, CombatTag, ParryQuality, ParryWindow, Vulnerability};
use super::events::AttackResolution;
use crate::actions::AttackParams;
use crate::config::CombatRules;

/// Параметры одного удара (из `AttackParams` действия)
#[derive(Debug, Clone, PartialEq)]
pub struct AttackProfile {
    pub base_damage: f32,
    pub knockback: f32,
    pub poise_damage: f32,
    pub causes_ragdoll: bool,
    pub unblockable: bool,
    pub tags: Vec<CombatTag>,
}

impl From<&AttackParams> for AttackProfile {
    fn from(params: &AttackParams) -> Self {
        Self {
            base_damage: params.damage,
            knockback: params.knockback,
            poise_damage: params.poise_damage,
            causes_ragdoll: params.causes_ragdoll,
            unblockable: params.unblockable,
            tags: params.tags.clone(),
        }
    }
}

impl AttackProfile {
    /// Удар без knockback/poise (тесты, environmental damage)
    pub fn damage_only(base_damage: f32) -> Self {
        Self {
            base_damage,
            knockback: 0.0,
            poise_damage: 0.0,
            causes_ragdoll: false,
            unblockable: false,
            tags: Vec::new(),
        }
    }
}

/// Всё, что калькулятор читает у обеих сторон (до мутаций)
#[derive(Debug, Clone, Copy)]
pub struct HitContext<'a> {
    pub attacker: Entity,
    pub target: Entity,
    pub attack: &'a AttackProfile,
    pub attacker_tags: &'a CombatStateTags,
    pub defender_tags: &'a CombatStateTags,
    pub vulnerability: &'a Vulnerability,
    /// Текущее качество parry окна защитника
    pub parry: Option<ParryQuality>,
}

pub fn resolve_damage(ctx: &HitContext, rules: Option<&CombatRules>) -> AttackResolution {
    let attack = ctx.attack;
    let mut resolution = AttackResolution {
        attacker: ctx.attacker,
        target: ctx.target,
        base_damage: attack.base_damage,
        final_damage: attack.base_damage,
        was_blocked: false,
        was_parried: false,
        parry_quality: None,
        was_vulnerable: false,
        was_avoided: false,
        caused_ragdoll: false,
        knockback: attack.knockback.max(0.0),
        attack_tags: attack.tags.clone(),
    };

    if ctx.vulnerability.has_iframes() {
        resolution.final_damage = 0.0;
        resolution.knockback = 0.0;
        resolution.was_avoided = true;
        return resolution;
    }

    let Some(rules) = rules else {
        resolution.final_damage = resolution.final_damage.max(0.0);
        resolution.caused_ragdoll = attack.causes_ragdoll && resolution.knockback > 0.0;
        return resolution;
    };

    let mut damage = attack.base_damage;

    if ctx.vulnerability.is_vulnerable() {
        damage *= ctx.vulnerability.damage_multiplier();
        resolution.was_vulnerable = true;
    }

    match ctx.parry.filter(|_| !attack.unblockable) {
        Some(quality) => {
            resolution.was_parried = true;
            resolution.parry_quality = Some(quality);
            damage *= 1.0 - ParryWindow::damage_reduction(quality, rules.late_parry_damage_reduction);
        }
        None => {
            if ctx.defender_tags.has(CombatTag::Blocking) && !attack.unblockable {
                damage *= 1.0 - rules.block_damage_reduction;
                resolution.was_blocked = true;
            }
        }
    }

    damage *= rules.tag_multiplier(|tag| {
        ctx.attacker_tags.has(tag) || ctx.defender_tags.has(tag) || attack.tags.contains(&tag)
    });

    resolution.final_damage = damage.max(0.0);

    // Perfect parry гасит весь удар, включая knockback
    if resolution.parry_quality == Some(ParryQuality::Perfect) {
        resolution.knockback = 0.0;
    } else if attack.causes_ragdoll && resolution.knockback > 0.0 {
        resolution.knockback *= rules.ragdoll_knockback_multiplier;
        resolution.caused_ragdoll = true;
    }

    resolution
}

/// Направление knockback: attacker → target в горизонтальной плоскости + up.
///
/// Совпадающие позиции → толкаем вдоль `fallback` (forward атакующего).
pub fn knockback_direction(from: Vec3, to: Vec3, up: Vec3, upward_force: f32, fallback: Vec3) -> Vec3 {
    let offset = to - from;
    let horizontal = offset - up * offset.dot(up);
    let horizontal = horizontal
        .try_normalize()
        .or_else(|| (fallback - up * fallback.dot(up)).try_normalize())
        .unwrap_or(Vec3::ZERO);

    (horizontal + up * upward_force).try_normalize().unwrap_or(up)
}
