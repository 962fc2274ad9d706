//! Vulnerability tiers and invulnerability frames.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TierParams;

/// Severity: None < Stunned < Crippled < Exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum VulnerabilityTier {
    #[default]
    None,
    Stunned,
    Crippled,
    Exposed,
}

/// Результат `Vulnerability::tick`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VulnerabilityTick {
    pub expired: bool,
    pub iframes_ended: bool,
}

/// Timed/consumable damage multiplier + независимое окно i-frames.
///
/// Tier заканчивается по времени ИЛИ когда critical hits съели все charges -
/// что наступит раньше.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct Vulnerability {
    tier: VulnerabilityTier,
    remaining: f32,
    charges: u32,
    multiplier: f32,
    iframes_remaining: f32,
}

impl Vulnerability {
    pub fn tier(&self) -> VulnerabilityTier {
        self.tier
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn charges(&self) -> u32 {
        self.charges
    }

    pub fn iframes_remaining(&self) -> f32 {
        self.iframes_remaining
    }

    pub fn is_vulnerable(&self) -> bool {
        self.tier != VulnerabilityTier::None
    }

    pub fn has_iframes(&self) -> bool {
        self.iframes_remaining > 0.0
    }

    /// 1.0 когда tier == None
    pub fn damage_multiplier(&self) -> f32 {
        if self.is_vulnerable() {
            self.multiplier
        } else {
            1.0
        }
    }

    /// Ставит tier с параметрами из таблицы (перезаписывает текущий).
    pub fn apply_tier(&mut self, tier: VulnerabilityTier, params: Option<&TierParams>) {
        let Some(params) = params.filter(|_| tier != VulnerabilityTier::None) else {
            self.end();
            return;
        };

        self.tier = tier;
        self.multiplier = params.multiplier;
        self.remaining = params.duration.max(0.0);
        self.charges = params.charges.max(1);

        if params.iframes > 0.0 {
            self.start_iframes(params.iframes);
        }
    }

    /// I-frames слоятся независимо от tier; более длинное окно побеждает.
    pub fn start_iframes(&mut self, duration: f32) -> bool {
        if !(duration > 0.0) {
            return false;
        }
        self.iframes_remaining = self.iframes_remaining.max(duration);
        true
    }

    /// Critical hit по уязвимой цели. Returns true если tier закончился.
    pub fn on_critical_hit_landed(&mut self) -> bool {
        if !self.is_vulnerable() {
            return false;
        }

        self.charges = self.charges.saturating_sub(1);
        if self.charges == 0 {
            self.end();
            return true;
        }
        false
    }

    pub fn end(&mut self) {
        self.tier = VulnerabilityTier::None;
        self.remaining = 0.0;
        self.charges = 0;
        self.multiplier = 1.0;
    }

    pub fn tick(&mut self, delta: f32) -> VulnerabilityTick {
        let mut result = VulnerabilityTick::default();

        if self.is_vulnerable() {
            self.remaining -= delta;
            if self.remaining <= 0.0 {
                self.end();
                result.expired = true;
            }
        }

        if self.iframes_remaining > 0.0 {
            self.iframes_remaining = (self.iframes_remaining - delta).max(0.0);
            result.iframes_ended = self.iframes_remaining == 0.0;
        }

        result
    }
}
