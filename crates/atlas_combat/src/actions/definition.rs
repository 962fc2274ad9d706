//! Action definitions - immutable, data-authored action records.
//!
//! # Архитектура
//!
//! **ActionDefinition** - статический blueprint (id + kind + общие параметры):
//! - Хранится в `ActionDefinitions` resource (HashMap lookup)
//! - Immutable, шарится по `ActionId` между всеми `ActionInstance`
//! - Создаётся в `ActionDefinitions::default()` или из RON
//!
//! **ActionInstance** (см. `instance.rs`) - runtime state в конкретном слоте.
//!
//! **ActionKind** - tagged variant: параметры лежат прямо в варианте,
//! execution выбирается `match`'ем по варианту.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::combat::components::CombatTag;
use crate::config::ConfigError;

// ============================================================================
// ActionId
// ============================================================================

/// Action identifier (unique string ID)
///
/// # Examples
/// - "basic_attack"
/// - "block"
/// - "dash"
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub String);

impl From<&str> for ActionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// ActionType / ActionKind
// ============================================================================

/// Категория действия (без параметров)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ActionType {
    Movement,
    Defense,
    MeleeAttack,
    RangedAttack,
    AreaEffect,
    Utility,
    Special,
}

/// Параметры удара (melee)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackParams {
    pub damage: f32,
    pub knockback: f32,
    pub poise_damage: f32,
    pub causes_ragdoll: bool,
    pub unblockable: bool,
    /// Attack tags (HeavyAttack, ...) - участвуют в tag multiplier table
    pub tags: Vec<CombatTag>,
}

impl Default for AttackParams {
    fn default() -> Self {
        Self {
            damage: 5.0,
            knockback: 100.0,
            poise_damage: 20.0,
            causes_ragdoll: false,
            unblockable: false,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashParams {
    pub distance: f32,
    pub duration: f32,
    pub iframes: f32,
}

impl Default for DashParams {
    fn default() -> Self {
        Self {
            distance: 400.0,
            duration: 0.3,
            iframes: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseParams {
    /// Held actions держатся до release
    pub hold_to_maintain: bool,
    /// Открывает parry window при активации
    pub opens_parry_window: bool,
}

impl Default for DefenseParams {
    fn default() -> Self {
        Self {
            hold_to_maintain: true,
            opens_parry_window: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedParams {
    pub damage: f32,
    pub range: f32,
    pub projectile_speed: f32,
}

impl Default for RangedParams {
    fn default() -> Self {
        Self {
            damage: 10.0,
            range: 1000.0,
            projectile_speed: 2000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaParams {
    pub radius: f32,
    pub damage: f32,
    /// > 0 → действие остаётся Active (channeled) это время
    pub effect_duration: f32,
    pub affects_allies: bool,
}

impl Default for AreaParams {
    fn default() -> Self {
        Self {
            radius: 300.0,
            damage: 10.0,
            effect_duration: 0.0,
            affects_allies: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilityParams {
    /// > 0 → channeled, прогресс 0..1
    pub charge_time: f32,
    /// Some → toggle action: первое нажатие включает tag, второе выключает
    pub toggle_tag: Option<CombatTag>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialParams {
    /// Не тратит station integrity
    pub bypasses_integrity: bool,
}

/// Tagged variant: тип действия + его параметры
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionKind {
    Movement(DashParams),
    Defense(DefenseParams),
    MeleeAttack(AttackParams),
    RangedAttack(RangedParams),
    AreaEffect(AreaParams),
    Utility(UtilityParams),
    Special(SpecialParams),
}

impl Default for ActionKind {
    fn default() -> Self {
        ActionKind::Special(SpecialParams::default())
    }
}

impl ActionKind {
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionKind::Movement(_) => ActionType::Movement,
            ActionKind::Defense(_) => ActionType::Defense,
            ActionKind::MeleeAttack(_) => ActionType::MeleeAttack,
            ActionKind::RangedAttack(_) => ActionType::RangedAttack,
            ActionKind::AreaEffect(_) => ActionType::AreaEffect,
            ActionKind::Utility(_) => ActionType::Utility,
            ActionKind::Special(_) => ActionType::Special,
        }
    }
}

// ============================================================================
// ActionDefinition
// ============================================================================

/// Static action definition (blueprint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionDefinition {
    pub id: ActionId,
    pub name: String,
    pub kind: ActionKind,

    // === Universal ===
    pub cooldown: f32,
    /// Station integrity cost (тратится всегда, даже если не хватает)
    pub integrity_cost: f32,
    /// Длительность Active для timed actions (0 = без таймера)
    pub duration: f32,

    // === Requirements ===
    pub required_tags: Vec<CombatTag>,
    pub blocked_tags: Vec<CombatTag>,

    // === Flags ===
    pub interruptible: bool,
    pub auto_release: bool,
}

impl Default for ActionDefinition {
    fn default() -> Self {
        Self {
            id: ActionId(String::new()),
            name: String::new(),
            kind: ActionKind::default(),
            cooldown: 0.0,
            integrity_cost: 0.0,
            duration: 0.5,
            required_tags: Vec::new(),
            blocked_tags: vec![CombatTag::Dead],
            interruptible: true,
            auto_release: true,
        }
    }
}

impl ActionDefinition {
    pub fn action_type(&self) -> ActionType {
        self.kind.action_type()
    }

    pub fn attack(&self) -> Option<&AttackParams> {
        match &self.kind {
            ActionKind::MeleeAttack(params) => Some(params),
            _ => None,
        }
    }

    pub fn toggle_tag(&self) -> Option<CombatTag> {
        match &self.kind {
            ActionKind::Utility(params) => params.toggle_tag,
            _ => None,
        }
    }

    pub fn is_attack(&self) -> bool {
        matches!(
            self.action_type(),
            ActionType::MeleeAttack | ActionType::RangedAttack
        )
    }

    /// Integrity cost после учёта Special bypass
    pub fn effective_integrity_cost(&self) -> f32 {
        match &self.kind {
            ActionKind::Special(params) if params.bypasses_integrity => 0.0,
            _ => self.integrity_cost.max(0.0),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let field = |name: &str| format!("{}.{}", self.id, name);

        if self.id.0.is_empty() {
            return Err(ConfigError::invalid("id", "action id must not be empty"));
        }
        if self.cooldown < 0.0 {
            return Err(ConfigError::invalid(field("cooldown"), "negative cooldown"));
        }
        if self.duration < 0.0 {
            return Err(ConfigError::invalid(field("duration"), "negative duration"));
        }
        if self.integrity_cost < 0.0 {
            return Err(ConfigError::invalid(field("integrity_cost"), "negative cost"));
        }
        if let Some(tag) = self
            .required_tags
            .iter()
            .find(|tag| self.blocked_tags.contains(tag))
        {
            return Err(ConfigError::invalid(
                field("required_tags"),
                format!("{:?} is both required and blocked", tag),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Presets
    // ------------------------------------------------------------------

    pub fn basic_attack() -> Self {
        Self {
            id: "basic_attack".into(),
            name: "Basic Attack".to_string(),
            kind: ActionKind::MeleeAttack(AttackParams::default()),
            duration: 0.6,
            interruptible: false,
            ..Self::default()
        }
    }

    pub fn heavy_attack() -> Self {
        Self {
            id: "heavy_attack".into(),
            name: "Heavy Attack".to_string(),
            kind: ActionKind::MeleeAttack(AttackParams {
                damage: 15.0,
                knockback: 500.0,
                poise_damage: 40.0,
                causes_ragdoll: false,
                unblockable: false,
                tags: vec![CombatTag::HeavyAttack],
            }),
            cooldown: 1.0,
            duration: 1.0,
            interruptible: false,
            ..Self::default()
        }
    }

    pub fn block() -> Self {
        Self {
            id: "block".into(),
            name: "Block".to_string(),
            kind: ActionKind::Defense(DefenseParams::default()),
            cooldown: 0.2,
            duration: 0.0,
            blocked_tags: vec![CombatTag::Dead, CombatTag::Attacking],
            ..Self::default()
        }
    }

    pub fn dash() -> Self {
        Self {
            id: "dash".into(),
            name: "Dash".to_string(),
            kind: ActionKind::Movement(DashParams::default()),
            cooldown: 2.0,
            ..Self::default()
        }
    }

    pub fn focus_mode() -> Self {
        Self {
            id: "focus_mode".into(),
            name: "Focus Mode".to_string(),
            kind: ActionKind::Utility(UtilityParams {
                charge_time: 0.0,
                toggle_tag: Some(CombatTag::FocusMode),
            }),
            duration: 0.0,
            ..Self::default()
        }
    }

    pub fn kinetic_pulse() -> Self {
        Self {
            id: "kinetic_pulse".into(),
            name: "Kinetic Pulse".to_string(),
            kind: ActionKind::AreaEffect(AreaParams {
                radius: 400.0,
                damage: 12.0,
                effect_duration: 0.0,
                affects_allies: false,
            }),
            cooldown: 6.0,
            integrity_cost: 5.0,
            ..Self::default()
        }
    }

    pub fn debris_pull() -> Self {
        Self {
            id: "debris_pull".into(),
            name: "Debris Pull".to_string(),
            kind: ActionKind::RangedAttack(RangedParams::default()),
            cooldown: 3.0,
            ..Self::default()
        }
    }

    pub fn coolant_spray() -> Self {
        Self {
            id: "coolant_spray".into(),
            name: "Coolant Spray".to_string(),
            kind: ActionKind::Utility(UtilityParams {
                charge_time: 1.5,
                toggle_tag: None,
            }),
            cooldown: 4.0,
            ..Self::default()
        }
    }

    pub fn system_hack() -> Self {
        Self {
            id: "system_hack".into(),
            name: "System Hack".to_string(),
            kind: ActionKind::Special(SpecialParams {
                bypasses_integrity: true,
            }),
            cooldown: 8.0,
            integrity_cost: 10.0,
            duration: 1.0,
            ..Self::default()
        }
    }

    pub fn airlock_breach() -> Self {
        Self {
            id: "airlock_breach".into(),
            name: "Airlock Breach".to_string(),
            kind: ActionKind::AreaEffect(AreaParams {
                radius: 800.0,
                damage: 40.0,
                effect_duration: 2.0,
                affects_allies: true,
            }),
            cooldown: 20.0,
            integrity_cost: 25.0,
            interruptible: false,
            ..Self::default()
        }
    }
}

// ============================================================================
// ActionDefinitions Resource
// ============================================================================

/// Registry всех action definitions (lookup по `ActionId`)
#[derive(Resource, Debug, Clone)]
pub struct ActionDefinitions {
    definitions: HashMap<ActionId, ActionDefinition>,
}

impl Default for ActionDefinitions {
    fn default() -> Self {
        let mut registry = Self::empty();
        for definition in [
            ActionDefinition::basic_attack(),
            ActionDefinition::heavy_attack(),
            ActionDefinition::block(),
            ActionDefinition::dash(),
            ActionDefinition::focus_mode(),
            ActionDefinition::kinetic_pulse(),
            ActionDefinition::debris_pull(),
            ActionDefinition::coolant_spray(),
            ActionDefinition::system_hack(),
            ActionDefinition::airlock_breach(),
        ] {
            registry.definitions.insert(definition.id.clone(), definition);
        }
        registry
    }
}

impl ActionDefinitions {
    pub fn empty() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Регистрирует definition, отказывает на duplicate id
    pub fn register(&mut self, definition: ActionDefinition) -> Result<(), ConfigError> {
        definition.validate()?;
        if self.definitions.contains_key(&definition.id) {
            return Err(ConfigError::DuplicateAction(definition.id));
        }
        self.definitions.insert(definition.id.clone(), definition);
        Ok(())
    }

    /// Заменяет (или добавляет) definition без проверки на дубликат
    pub fn upsert(&mut self, definition: ActionDefinition) {
        self.definitions.insert(definition.id.clone(), definition);
    }

    pub fn get(&self, id: &ActionId) -> Option<&ActionDefinition> {
        self.definitions.get(id)
    }

    pub fn contains(&self, id: &ActionId) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Ids в детерминированном (отсортированном) порядке
    pub fn ids(&self) -> Vec<ActionId> {
        let mut ids: Vec<_> = self.definitions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// RON формат: список `ActionDefinition`
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let list: Vec<ActionDefinition> =
            ron::from_str(source).map_err(|source| ConfigError::Parse {
                what: "action definitions".to_string(),
                source,
            })?;

        let mut registry = Self::empty();
        for definition in list {
            registry.register(definition)?;
        }
        Ok(registry)
    }
}
