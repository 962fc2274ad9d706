//! Health and poise components.
//!
//! Оба компонента - чистые state machines без доступа к World.
//! Side effects (tags, events, interrupt) делают системы в `combat::systems`.

use bevy::prelude::*;

use crate::config::CombatRules;

/// Результат `Health::take_damage`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HealthChange {
    /// Реально снятое/добавленное HP (после clamp)
    pub applied: f32,
    /// Этот вызов перевёл актора в Dead
    pub died: bool,
}

/// Hit points актора.
///
/// Инвариант: `0 <= current <= max`. После смерти `take_damage`/`heal` - no-op
/// (кроме `revive`).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    pub invincible: bool,
    dead: bool,
    /// Создан через `Default` (required component): max заменит `CombatRules`
    rule_defaults: bool,
}

impl Default for Health {
    fn default() -> Self {
        Self {
            rule_defaults: true,
            ..Self::new(CombatRules::default().default_max_health)
        }
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = max.max(1.0);
        Self {
            current: max,
            max,
            invincible: false,
            dead: false,
            rule_defaults: false,
        }
    }

    /// Health из `CombatRules::default_max_health`
    pub fn from_rules(rules: &CombatRules) -> Self {
        Self::new(rules.default_max_health)
    }

    /// true, пока spawn не передал свой Health и правила ещё не применены
    pub fn uses_rule_defaults(&self) -> bool {
        self.rule_defaults
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// 0..1
    pub fn percent(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }

    pub fn take_damage(&mut self, amount: f32) -> HealthChange {
        if self.dead || self.invincible || !(amount > 0.0) {
            return HealthChange::default();
        }

        let applied = amount.min(self.current);
        self.current -= applied;

        let died = self.current <= 0.0;
        if died {
            self.current = 0.0;
            self.dead = true;
        }

        HealthChange { applied, died }
    }

    /// Returns restored amount (0 if dead, full or amount <= 0)
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.dead || !(amount > 0.0) || self.current >= self.max {
            return 0.0;
        }

        let restored = amount.min(self.max - self.current);
        self.current += restored;
        restored
    }

    /// Меняет max. `scale_current` сохраняет процент здоровья.
    pub fn set_max(&mut self, new_max: f32, scale_current: bool) {
        if !(new_max > 0.0) {
            return;
        }

        if scale_current {
            let percent = self.percent();
            self.max = new_max;
            self.current = if self.dead { 0.0 } else { new_max * percent };
        } else {
            self.max = new_max;
            self.current = self.current.min(new_max);
        }
    }

    /// Возвращает к жизни с `health` в [1, max]. No-op для живых.
    pub fn revive(&mut self, health: f32) -> bool {
        if !self.dead {
            return false;
        }

        self.dead = false;
        self.current = health.max(1.0).min(self.max);
        true
    }
}

/// Результат `Poise::take_poise_damage`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoiseHit {
    /// Урон проигнорирован (уже staggered или amount <= 0)
    Ignored,
    Damaged,
    /// Poise упал до 0: актор вошёл в stagger
    Staggered,
}

/// Результат `Poise::tick`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoiseTick {
    Idle,
    Regenerated,
    Recovered,
}

/// Poise (вторичный ресурс): при 0 → timed stagger.
///
/// # Lifecycle
/// ```text
/// hit → regen_delay_remaining = regen_delay
/// poise <= 0 → Staggered (poise = 0, stagger_remaining = duration)
/// stagger_remaining <= 0 → Recovered (poise = max)
/// regen: после delay, regen_rate/s до max (пока не staggered)
/// ```
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Poise {
    pub current: f32,
    pub max: f32,
    pub regen_rate: f32,
    pub regen_delay: f32,
    pub stagger_duration: f32,
    pub regen_delay_remaining: f32,
    pub stagger_remaining: f32,
    staggered: bool,
    rule_defaults: bool,
}

impl Default for Poise {
    fn default() -> Self {
        Self {
            rule_defaults: true,
            ..Self::from_rules(&CombatRules::default())
        }
    }
}

impl Poise {
    pub fn new(max: f32, regen_rate: f32, regen_delay: f32, stagger_duration: f32) -> Self {
        Self {
            current: max,
            max,
            regen_rate,
            regen_delay,
            stagger_duration,
            regen_delay_remaining: 0.0,
            stagger_remaining: 0.0,
            staggered: false,
            rule_defaults: false,
        }
    }

    pub fn from_rules(rules: &CombatRules) -> Self {
        Self::new(
            rules.max_poise,
            rules.poise_regen_rate,
            rules.poise_regen_delay,
            rules.stagger_duration,
        )
    }

    pub fn uses_rule_defaults(&self) -> bool {
        self.rule_defaults
    }

    pub fn is_staggered(&self) -> bool {
        self.staggered
    }

    pub fn take_poise_damage(&mut self, amount: f32) -> PoiseHit {
        if self.staggered || !(amount > 0.0) {
            return PoiseHit::Ignored;
        }

        self.current = (self.current - amount).max(0.0);
        self.regen_delay_remaining = self.regen_delay;

        if self.current <= 0.0 {
            self.enter_stagger(self.stagger_duration);
            PoiseHit::Staggered
        } else {
            PoiseHit::Damaged
        }
    }

    /// Гарантированный stagger (wall impact): полный расход poise.
    /// Если уже staggered - таймер не укорачивается.
    pub fn force_stagger(&mut self, duration: f32) -> PoiseHit {
        self.regen_delay_remaining = self.regen_delay;
        if self.staggered {
            self.stagger_remaining = self.stagger_remaining.max(duration);
            return PoiseHit::Ignored;
        }

        self.current = 0.0;
        self.enter_stagger(duration);
        PoiseHit::Staggered
    }

    /// Продлевает текущий stagger. Returns false если актор уже восстановился.
    pub fn extend_stagger(&mut self, seconds: f32) -> bool {
        if !self.staggered || !(seconds > 0.0) {
            return false;
        }
        self.stagger_remaining += seconds;
        true
    }

    pub fn recover_from_stagger(&mut self) {
        self.staggered = false;
        self.stagger_remaining = 0.0;
        self.regen_delay_remaining = 0.0;
        self.current = self.max;
    }

    pub fn tick(&mut self, delta: f32) -> PoiseTick {
        if self.staggered {
            self.stagger_remaining -= delta;
            if self.stagger_remaining <= 0.0 {
                self.recover_from_stagger();
                return PoiseTick::Recovered;
            }
            return PoiseTick::Idle;
        }

        let mut delta = delta;
        if self.regen_delay_remaining > 0.0 {
            if delta < self.regen_delay_remaining {
                self.regen_delay_remaining -= delta;
                return PoiseTick::Idle;
            }
            delta -= self.regen_delay_remaining;
            self.regen_delay_remaining = 0.0;
        }

        if self.current >= self.max || delta <= 0.0 {
            return PoiseTick::Idle;
        }

        self.current = (self.current + self.regen_rate * delta).min(self.max);
        PoiseTick::Regenerated
    }

    fn enter_stagger(&mut self, duration: f32) {
        self.staggered = true;
        self.stagger_remaining = duration.max(0.0);
    }
}
