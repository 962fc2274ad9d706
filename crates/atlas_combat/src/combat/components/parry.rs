//! Parry window (perfect/late timing).

use bevy::prelude::*;

/// Качество парирования в момент попадания
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ParryQuality {
    Perfect,
    Late,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ParryPhase {
    Closed,
    PerfectOpen,
    LateOpen,
}

/// Per-actor parry window.
///
/// ```text
/// open() → elapsed = 0
/// elapsed <= perfect           → PerfectOpen
/// perfect < elapsed <= p+late  → LateOpen
/// elapsed > p+late             → Closed (auto-close в tick)
/// ```
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ParryWindow {
    pub elapsed: f32,
    pub perfect_duration: f32,
    pub late_duration: f32,
    open: bool,
}

impl Default for ParryWindow {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            perfect_duration: 0.2,
            late_duration: 0.1,
            open: false,
        }
    }
}

impl ParryWindow {
    pub fn open(&mut self, perfect_duration: f32, late_duration: f32) {
        self.open = true;
        self.elapsed = 0.0;
        self.perfect_duration = perfect_duration.max(0.0);
        self.late_duration = late_duration.max(0.0);
    }

    pub fn close(&mut self) -> bool {
        let was_open = self.open;
        self.open = false;
        was_open
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns true when this tick closed the window (safety close).
    pub fn tick(&mut self, delta: f32) -> bool {
        if !self.open {
            return false;
        }

        self.elapsed += delta;
        if self.elapsed > self.perfect_duration + self.late_duration {
            self.open = false;
            return true;
        }
        false
    }

    pub fn phase(&self) -> ParryPhase {
        if !self.open {
            return ParryPhase::Closed;
        }

        if self.elapsed <= self.perfect_duration {
            ParryPhase::PerfectOpen
        } else if self.elapsed <= self.perfect_duration + self.late_duration {
            ParryPhase::LateOpen
        } else {
            ParryPhase::Closed
        }
    }

    pub fn quality(&self) -> Option<ParryQuality> {
        match self.phase() {
            ParryPhase::PerfectOpen => Some(ParryQuality::Perfect),
            ParryPhase::LateOpen => Some(ParryQuality::Late),
            ParryPhase::Closed => None,
        }
    }

    /// Доля урона, которую снимает parry (perfect 1.0, late - из правил)
    pub fn damage_reduction(quality: ParryQuality, late_reduction: f32) -> f32 {
        match quality {
            ParryQuality::Perfect => 1.0,
            ParryQuality::Late => late_reduction,
        }
    }
}
