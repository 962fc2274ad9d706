//! ActionInstance - stateful wrapper around an `ActionDefinition`.
//!
//! Чистая state machine: методы не трогают World, а возвращают список
//! `ActionEffect`, который система применяет к актору (tags, parry, events).
//!
//! ```text
//! Idle ──activate──► Active ──release/timer──► Cooldown ──tick──► Idle
//!                      │                          ▲
//!                      └──────interrupt───────────┘ (cooldown × factor)
//! Active ──release (cooldown == 0)──► Idle
//! ```

use bevy::prelude::*;
use thiserror::Error;

use super::definition::{ActionDefinition, ActionId, ActionKind, ActionType};
use crate::combat::components::{CombatStateTags, CombatTag};
use crate::config::CombatRules;

/// Ровно одно состояние на instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum ActionState {
    #[default]
    Idle,
    Active,
    Cooldown,
}

/// Почему `can_activate` отказал
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ActivationRefusal {
    #[error("on cooldown ({remaining:.2}s left)")]
    OnCooldown { remaining: f32 },
    #[error("already active")]
    AlreadyActive,
    #[error("actor is dead")]
    Dead,
    #[error("actor is staggered")]
    Staggered,
    #[error("already attacking")]
    AlreadyAttacking,
    #[error("blocked by tag {0:?}")]
    BlockedByTag(CombatTag),
    #[error("missing required tag {0:?}")]
    MissingTag(CombatTag),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("action {0} cannot be interrupted")]
pub struct NotInterruptible(pub ActionId);

/// Side effect, который система применяет к актору
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEffect {
    StateChanged(ActionState),
    AddTag(CombatTag),
    RemoveTag(CombatTag),
    StartIFrames(f32),
    OpenParryWindow,
    CloseParryWindow,
    ConsumeIntegrity(f32),
    Dash { distance: f32, duration: f32 },
    FireProjectile { damage: f32, range: f32, speed: f32 },
    TriggerArea { radius: f32, damage: f32, affects_allies: bool },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ExecutionFlags {
    blocking: bool,
    dashing: bool,
    attacking: bool,
    channeling: bool,
    toggled: Option<CombatTag>,
}

/// Runtime state одного слота
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInstance {
    pub action: ActionId,
    state: ActionState,
    cooldown_remaining: f32,
    active_timer: f32,
    channel_duration: f32,
    flags: ExecutionFlags,
}

impl ActionInstance {
    pub fn new(action: ActionId) -> Self {
        Self {
            action,
            state: ActionState::Idle,
            cooldown_remaining: 0.0,
            active_timer: 0.0,
            channel_duration: 0.0,
            flags: ExecutionFlags::default(),
        }
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ActionState::Active
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    pub fn active_timer(&self) -> f32 {
        self.active_timer
    }

    pub fn is_toggled_on(&self) -> bool {
        self.flags.toggled.is_some()
    }

    /// 0..1 для channeled actions, 0 для остальных
    pub fn channel_progress(&self) -> f32 {
        if self.channel_duration <= 0.0 {
            return 0.0;
        }
        ((self.channel_duration - self.active_timer) / self.channel_duration).clamp(0.0, 1.0)
    }

    pub fn can_activate(
        &self,
        definition: &ActionDefinition,
        tags: &CombatStateTags,
    ) -> Result<(), ActivationRefusal> {
        match self.state {
            ActionState::Active => return Err(ActivationRefusal::AlreadyActive),
            ActionState::Cooldown => {
                return Err(ActivationRefusal::OnCooldown {
                    remaining: self.cooldown_remaining,
                })
            }
            ActionState::Idle => {}
        }

        if tags.has(CombatTag::Dead) {
            return Err(ActivationRefusal::Dead);
        }
        if tags.has(CombatTag::Staggered) {
            return Err(ActivationRefusal::Staggered);
        }

        // Type hooks: атака и блок не стартуют посреди атаки
        let attacking = tags.has(CombatTag::Attacking);
        match definition.action_type() {
            ActionType::MeleeAttack | ActionType::RangedAttack | ActionType::Defense
                if attacking =>
            {
                return Err(ActivationRefusal::AlreadyAttacking)
            }
            _ => {}
        }

        if let Some(tag) = definition.blocked_tags.iter().find(|tag| tags.has(**tag)) {
            return Err(ActivationRefusal::BlockedByTag(*tag));
        }
        if let Some(tag) = definition.required_tags.iter().find(|tag| !tags.has(**tag)) {
            return Err(ActivationRefusal::MissingTag(*tag));
        }

        Ok(())
    }

    /// Idle → Active + type-specific execution.
    ///
    /// Instant actions (ranged, instant utility/area) сразу проходят release.
    pub fn activate(&mut self, definition: &ActionDefinition, rules: &CombatRules) -> Vec<ActionEffect> {
        let mut effects = Vec::new();

        self.flags = ExecutionFlags::default();
        self.active_timer = 0.0;
        self.channel_duration = 0.0;
        self.set_state(ActionState::Active, &mut effects);

        // Cost списывается без проверки остатка integrity
        let cost = definition.effective_integrity_cost();
        if cost > 0.0 {
            effects.push(ActionEffect::ConsumeIntegrity(cost));
        }

        let instant = match &definition.kind {
            ActionKind::Movement(dash) => {
                self.flags.dashing = true;
                effects.push(ActionEffect::AddTag(CombatTag::Dashing));
                if dash.iframes > 0.0 {
                    effects.push(ActionEffect::StartIFrames(dash.iframes));
                }
                effects.push(ActionEffect::Dash {
                    distance: dash.distance,
                    duration: dash.duration,
                });
                self.active_timer = dash.duration;
                dash.duration <= 0.0
            }
            ActionKind::Defense(defense) => {
                self.flags.blocking = true;
                effects.push(ActionEffect::AddTag(CombatTag::Blocking));
                if defense.opens_parry_window {
                    effects.push(ActionEffect::OpenParryWindow);
                }
                if defense.hold_to_maintain {
                    false
                } else {
                    self.active_timer = definition.duration;
                    definition.duration <= 0.0
                }
            }
            ActionKind::MeleeAttack(_) => {
                self.flags.attacking = true;
                effects.push(ActionEffect::AddTag(CombatTag::Attacking));
                // Анимация обычно заканчивает атаку раньше; таймер - страховка
                self.active_timer = if definition.duration > 0.0 {
                    definition.duration
                } else {
                    rules.melee_safety_timeout
                };
                false
            }
            ActionKind::RangedAttack(ranged) => {
                effects.push(ActionEffect::FireProjectile {
                    damage: ranged.damage,
                    range: ranged.range,
                    speed: ranged.projectile_speed,
                });
                true
            }
            ActionKind::AreaEffect(area) => {
                effects.push(ActionEffect::TriggerArea {
                    radius: area.radius,
                    damage: area.damage,
                    affects_allies: area.affects_allies,
                });
                self.start_channel(area.effect_duration, &mut effects)
            }
            ActionKind::Utility(utility) => {
                if let Some(tag) = utility.toggle_tag {
                    self.flags.toggled = Some(tag);
                    effects.push(ActionEffect::AddTag(tag));
                    false
                } else {
                    self.start_channel(utility.charge_time, &mut effects)
                }
            }
            ActionKind::Special(_) => self.start_channel(definition.duration, &mut effects),
        };

        if instant {
            effects.extend(self.release(definition));
        }
        effects
    }

    pub fn tick(&mut self, delta: f32, definition: &ActionDefinition) -> Vec<ActionEffect> {
        let mut effects = Vec::new();

        match self.state {
            ActionState::Idle => {}
            ActionState::Cooldown => {
                self.cooldown_remaining -= delta;
                if self.cooldown_remaining <= 0.0 {
                    self.cooldown_remaining = 0.0;
                    self.set_state(ActionState::Idle, &mut effects);
                }
            }
            ActionState::Active => {
                if self.active_timer > 0.0 {
                    self.active_timer -= delta;
                    if self.active_timer <= 0.0 {
                        self.active_timer = 0.0;
                        self.end_timed_flags(&mut effects);
                        if definition.auto_release {
                            effects.extend(self.release(definition));
                        }
                    }
                }
            }
        }

        effects
    }

    /// Held actions заканчиваются, toggle actions игнорируют release.
    pub fn release(&mut self, definition: &ActionDefinition) -> Vec<ActionEffect> {
        let mut effects = Vec::new();
        if self.state != ActionState::Active || self.flags.toggled.is_some() {
            return effects;
        }

        self.clear_flags(&mut effects);
        self.start_cooldown(definition.cooldown, &mut effects);
        effects
    }

    /// Второе нажатие toggle action
    pub fn toggle_off(&mut self, definition: &ActionDefinition) -> Vec<ActionEffect> {
        let mut effects = Vec::new();
        let Some(tag) = self.flags.toggled.take() else {
            return effects;
        };

        effects.push(ActionEffect::RemoveTag(tag));
        self.clear_flags(&mut effects);
        self.start_cooldown(definition.cooldown, &mut effects);
        effects
    }

    /// Regular interrupt: уважает `interruptible == false`.
    pub fn interrupt(
        &mut self,
        definition: &ActionDefinition,
        cooldown_factor: f32,
    ) -> Result<Vec<ActionEffect>, NotInterruptible> {
        if self.state != ActionState::Active {
            return Ok(Vec::new());
        }
        if !definition.interruptible {
            return Err(NotInterruptible(self.action.clone()));
        }
        Ok(self.force_interrupt(definition, cooldown_factor))
    }

    /// Death/stagger/reassign: прерывает всегда
    pub fn force_interrupt(
        &mut self,
        definition: &ActionDefinition,
        cooldown_factor: f32,
    ) -> Vec<ActionEffect> {
        let mut effects = Vec::new();
        if self.state != ActionState::Active {
            return effects;
        }

        if let Some(tag) = self.flags.toggled.take() {
            effects.push(ActionEffect::RemoveTag(tag));
        }
        self.clear_flags(&mut effects);
        self.active_timer = 0.0;
        self.start_cooldown(definition.cooldown * cooldown_factor, &mut effects);
        effects
    }

    // ------------------------------------------------------------------

    fn start_channel(&mut self, duration: f32, effects: &mut Vec<ActionEffect>) -> bool {
        if duration <= 0.0 {
            return true;
        }
        self.flags.channeling = true;
        self.active_timer = duration;
        self.channel_duration = duration;
        effects.push(ActionEffect::AddTag(CombatTag::Channeling));
        false
    }

    /// Таймер истёк: dash/attack/channel заканчиваются сами, block - только по release
    fn end_timed_flags(&mut self, effects: &mut Vec<ActionEffect>) {
        if std::mem::take(&mut self.flags.dashing) {
            effects.push(ActionEffect::RemoveTag(CombatTag::Dashing));
        }
        if std::mem::take(&mut self.flags.attacking) {
            effects.push(ActionEffect::RemoveTag(CombatTag::Attacking));
        }
        if std::mem::take(&mut self.flags.channeling) {
            effects.push(ActionEffect::RemoveTag(CombatTag::Channeling));
        }
    }

    fn clear_flags(&mut self, effects: &mut Vec<ActionEffect>) {
        if std::mem::take(&mut self.flags.blocking) {
            effects.push(ActionEffect::RemoveTag(CombatTag::Blocking));
            effects.push(ActionEffect::CloseParryWindow);
        }
        self.end_timed_flags(effects);
    }

    fn start_cooldown(&mut self, cooldown: f32, effects: &mut Vec<ActionEffect>) {
        if cooldown > 0.0 {
            self.cooldown_remaining = cooldown;
            self.set_state(ActionState::Cooldown, effects);
        } else {
            self.cooldown_remaining = 0.0;
            self.set_state(ActionState::Idle, effects);
        }
    }

    fn set_state(&mut self, state: ActionState, effects: &mut Vec<ActionEffect>) {
        if self.state != state {
            self.state = state;
            effects.push(ActionEffect::StateChanged(state));
        }
    }
}
