//! Station integrity - общий risk-ресурс.
//!
//! Некоторые действия (system_hack, airlock_breach) списывают integrity без
//! проверки остатка. Failure только broadcast'ится, game over решает внешний слой.

use bevy::prelude::*;

use crate::config::CombatRules;

/// Что произошло после изменения integrity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IntegrityUpdate {
    pub delta: f32,
    /// Впервые опустились до critical порога (с последнего restore)
    pub became_critical: bool,
    pub failed: bool,
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct StationIntegrity {
    current: f32,
    max: f32,
    critical_percent: f32,
    failure_percent: f32,
    critical_reported: bool,
    failure_reported: bool,
}

impl Default for StationIntegrity {
    fn default() -> Self {
        Self::from_rules(&CombatRules::default())
    }
}

impl StationIntegrity {
    pub fn new(max: f32, critical_percent: f32, failure_percent: f32) -> Self {
        let max = max.max(1.0);
        Self {
            current: max,
            max,
            critical_percent,
            failure_percent,
            critical_reported: false,
            failure_reported: false,
        }
    }

    pub fn from_rules(rules: &CombatRules) -> Self {
        Self::new(
            rules.station_max_integrity,
            rules.integrity_critical_percent,
            rules.integrity_failure_percent,
        )
    }

    /// Новый max / пороги из правил. Текущий процент сохраняется.
    pub fn reconfigure(&mut self, rules: &CombatRules) {
        let percent = self.current / self.max;
        self.max = rules.station_max_integrity.max(1.0);
        self.critical_percent = rules.integrity_critical_percent;
        self.failure_percent = rules.integrity_failure_percent;
        self.current = (self.max * percent).clamp(0.0, self.max);
        self.critical_reported = self.is_critical();
        self.failure_reported = self.has_failed();
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// 0..100
    pub fn percent(&self) -> f32 {
        self.current / self.max * 100.0
    }

    pub fn is_critical(&self) -> bool {
        self.percent() <= self.critical_percent
    }

    pub fn has_failed(&self) -> bool {
        self.percent() <= self.failure_percent
    }

    pub fn apply_damage(&mut self, amount: f32) -> IntegrityUpdate {
        if !(amount > 0.0) {
            return IntegrityUpdate::default();
        }
        self.set(self.current - amount)
    }

    pub fn restore(&mut self, amount: f32) -> IntegrityUpdate {
        if !(amount > 0.0) {
            return IntegrityUpdate::default();
        }
        self.set(self.current + amount)
    }

    /// Clamp в [0, max] + пересчёт threshold флагов
    pub fn set(&mut self, value: f32) -> IntegrityUpdate {
        let before = self.current;
        self.current = value.clamp(0.0, self.max);

        let mut update = IntegrityUpdate {
            delta: self.current - before,
            ..Default::default()
        };

        if self.is_critical() {
            if !self.critical_reported {
                self.critical_reported = true;
                update.became_critical = true;
            }
        } else {
            self.critical_reported = false;
        }

        if self.has_failed() {
            if !self.failure_reported {
                self.failure_reported = true;
                update.failed = true;
            }
        } else {
            self.failure_reported = false;
        }

        update
    }
}
