//! Combat tuning constants (CombatRules resource).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::combat::components::{CombatTag, VulnerabilityTier};

/// Параметры одного tier уязвимости
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierParams {
    /// Множитель входящего урона
    pub multiplier: f32,
    /// Сколько секунд держится tier
    pub duration: f32,
    /// Сколько critical hits tier выдерживает
    pub charges: u32,
    /// I-frames, выдаваемые вместе с tier (0 = нет)
    pub iframes: f32,
}

impl Default for TierParams {
    fn default() -> Self {
        Self {
            multiplier: 8.0,
            duration: 1.0,
            charges: 1,
            iframes: 0.0,
        }
    }
}

/// Таблица tier'ов: Stunned < Crippled < Exposed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnerabilityTable {
    pub stunned: TierParams,
    pub crippled: TierParams,
    pub exposed: TierParams,
}

impl Default for VulnerabilityTable {
    fn default() -> Self {
        Self {
            stunned: TierParams::default(),
            crippled: TierParams {
                multiplier: 12.0,
                duration: 2.0,
                ..TierParams::default()
            },
            exposed: TierParams {
                multiplier: 16.0,
                duration: 3.0,
                ..TierParams::default()
            },
        }
    }
}

impl VulnerabilityTable {
    /// `None` tier не имеет параметров
    pub fn get(&self, tier: VulnerabilityTier) -> Option<&TierParams> {
        match tier {
            VulnerabilityTier::None => None,
            VulnerabilityTier::Stunned => Some(&self.stunned),
            VulnerabilityTier::Crippled => Some(&self.crippled),
            VulnerabilityTier::Exposed => Some(&self.exposed),
        }
    }
}

/// Tag-keyed damage multiplier.
///
/// Применяется, если tag есть у attacker'а (state + attack tags) или у defender'а.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TagMultiplier {
    pub tag: CombatTag,
    pub multiplier: f32,
}

/// Все тюнинг-константы боевого ядра.
///
/// Загружается из RON (`data/combat_rules.ron`) или берётся `Default`.
/// Отсутствие ресурса в World = damage проходит без модификаторов.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    // ===== Damage =====
    pub block_damage_reduction: f32,
    pub vulnerability: VulnerabilityTable,
    pub damage_multipliers: Vec<TagMultiplier>,

    // ===== Health / Poise =====
    pub default_max_health: f32,
    pub max_poise: f32,
    pub poise_regen_rate: f32,
    pub poise_regen_delay: f32,
    pub stagger_duration: f32,

    // ===== Knockback / Impact =====
    pub knockback_upward_force: f32,
    pub ragdoll_knockback_multiplier: f32,
    pub min_knockback_for_impact: f32,
    pub impact_tracking_timeout: f32,
    pub wall_angle_threshold: f32,
    pub floor_angle_threshold: f32,
    /// Simulation space is Z-up
    pub world_up: [f32; 3],
    pub wall_impact_damage: f32,
    pub wall_impact_stagger_duration: f32,
    pub wall_followup_stagger_extension: f32,
    pub wall_bounce_upward: f32,
    pub wall_bounce_force_scale: f32,
    pub floor_impact_poise_damage: f32,
    pub floor_impact_ragdoll_duration: f32,

    // ===== Parry =====
    pub perfect_parry_window: f32,
    pub late_parry_window: f32,
    pub late_parry_damage_reduction: f32,
    pub perfect_parry_time_dilation: f32,
    pub time_dilation_duration: f32,

    // ===== Actions =====
    pub interrupted_cooldown_factor: f32,
    pub melee_safety_timeout: f32,
    pub combat_timeout: f32,

    // ===== Station integrity =====
    pub station_max_integrity: f32,
    pub integrity_critical_percent: f32,
    pub integrity_failure_percent: f32,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            block_damage_reduction: 0.4,
            vulnerability: VulnerabilityTable::default(),
            damage_multipliers: Vec::new(),

            default_max_health: 100.0,
            max_poise: 100.0,
            poise_regen_rate: 15.0,
            poise_regen_delay: 1.5,
            stagger_duration: 2.0,

            knockback_upward_force: 0.3,
            ragdoll_knockback_multiplier: 2.0,
            min_knockback_for_impact: 300.0,
            impact_tracking_timeout: 1.0,
            wall_angle_threshold: 0.3,
            floor_angle_threshold: 0.7,
            world_up: [0.0, 0.0, 1.0],
            wall_impact_damage: 30.0,
            wall_impact_stagger_duration: 2.0,
            wall_followup_stagger_extension: 1.0,
            wall_bounce_upward: 0.2,
            wall_bounce_force_scale: 0.3,
            floor_impact_poise_damage: 30.0,
            floor_impact_ragdoll_duration: 1.0,

            perfect_parry_window: 0.2,
            late_parry_window: 0.1,
            late_parry_damage_reduction: 0.5,
            perfect_parry_time_dilation: 0.5,
            time_dilation_duration: 0.2,

            interrupted_cooldown_factor: 0.5,
            melee_safety_timeout: 2.0,
            combat_timeout: 3.0,

            station_max_integrity: 100.0,
            integrity_critical_percent: 50.0,
            integrity_failure_percent: 0.0,
        }
    }
}

impl CombatRules {
    pub fn world_up(&self) -> Vec3 {
        Vec3::from_array(self.world_up)
            .try_normalize()
            .unwrap_or(Vec3::Z)
    }

    /// Delay до второго (продлевающего) poise hit'а после wall impact
    pub fn wall_followup_delay(&self) -> f32 {
        self.wall_impact_stagger_duration * 0.5
    }

    /// Product of every table entry whose tag is present on either side
    pub fn tag_multiplier(&self, has_tag: impl Fn(CombatTag) -> bool) -> f32 {
        self.damage_multipliers
            .iter()
            .filter(|entry| has_tag(entry.tag))
            .map(|entry| entry.multiplier)
            .product()
    }

    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let rules: CombatRules = ron::from_str(source).map_err(|source| ConfigError::Parse {
            what: "combat rules".to_string(),
            source,
        })?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fraction = |field: &'static str, value: f32| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::invalid(field, format!("{} is outside [0, 1]", value)))
            }
        };
        let non_negative = |field: &'static str, value: f32| {
            if value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::invalid(field, format!("{} is negative", value)))
            }
        };

        fraction("block_damage_reduction", self.block_damage_reduction)?;
        fraction("late_parry_damage_reduction", self.late_parry_damage_reduction)?;
        fraction("interrupted_cooldown_factor", self.interrupted_cooldown_factor)?;
        fraction("wall_angle_threshold", self.wall_angle_threshold)?;
        fraction("floor_angle_threshold", self.floor_angle_threshold)?;

        non_negative("poise_regen_rate", self.poise_regen_rate)?;
        non_negative("poise_regen_delay", self.poise_regen_delay)?;
        non_negative("stagger_duration", self.stagger_duration)?;
        non_negative("perfect_parry_window", self.perfect_parry_window)?;
        non_negative("late_parry_window", self.late_parry_window)?;
        non_negative("impact_tracking_timeout", self.impact_tracking_timeout)?;
        non_negative("combat_timeout", self.combat_timeout)?;

        if self.default_max_health <= 0.0 {
            return Err(ConfigError::invalid("default_max_health", "must be positive"));
        }
        if self.max_poise <= 0.0 {
            return Err(ConfigError::invalid("max_poise", "must be positive"));
        }
        if self.station_max_integrity <= 0.0 {
            return Err(ConfigError::invalid("station_max_integrity", "must be positive"));
        }
        if self.wall_angle_threshold >= self.floor_angle_threshold {
            return Err(ConfigError::invalid(
                "wall_angle_threshold",
                "must be below floor_angle_threshold",
            ));
        }
        if !(self.perfect_parry_time_dilation > 0.0 && self.perfect_parry_time_dilation <= 1.0) {
            return Err(ConfigError::invalid(
                "perfect_parry_time_dilation",
                "must be in (0, 1]",
            ));
        }
        if Vec3::from_array(self.world_up).length_squared() <= f32::EPSILON {
            return Err(ConfigError::invalid("world_up", "must be a non-zero vector"));
        }

        for tier in [
            VulnerabilityTier::Stunned,
            VulnerabilityTier::Crippled,
            VulnerabilityTier::Exposed,
        ] {
            if let Some(params) = self.vulnerability.get(tier) {
                if params.multiplier < 1.0 {
                    return Err(ConfigError::invalid(
                        "vulnerability",
                        format!("{:?} multiplier {} is below 1.0", tier, params.multiplier),
                    ));
                }
                if params.charges == 0 {
                    return Err(ConfigError::invalid(
                        "vulnerability",
                        format!("{:?} needs at least one charge", tier),
                    ));
                }
            }
        }

        Ok(())
    }
}
