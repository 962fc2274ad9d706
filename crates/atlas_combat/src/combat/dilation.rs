//! Slow motion после perfect parry.
//!
//! FixedUpdate системы только ставят запрос (`TimeDilation::trigger`),
//! `apply_time_dilation` в Update меняет `Time<Virtual>` и восстанавливает
//! скорость по реальному времени (`Time<Real>`), иначе slow-mo растягивал бы сам себя.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
struct DilationRequest {
    scale: f32,
    duration: f32,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct TimeDilation {
    pending: Option<DilationRequest>,
    /// Real time (секунды), когда вернуть скорость 1.0
    restore_at: Option<f64>,
}

impl TimeDilation {
    /// Повторный trigger во время slow-mo продлевает его
    pub fn trigger(&mut self, scale: f32, duration: f32) {
        if !(scale > 0.0) || !(duration > 0.0) {
            return;
        }
        self.pending = Some(DilationRequest {
            scale: scale.min(1.0),
            duration,
        });
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some() || self.restore_at.is_some()
    }
}

/// System: применяет/снимает slow motion (Update schedule).
pub fn apply_time_dilation(
    mut dilation: ResMut<TimeDilation>,
    mut virtual_time: ResMut<Time<Virtual>>,
    real_time: Res<Time<Real>>,
) {
    let now = real_time.elapsed_secs_f64();

    if let Some(request) = dilation.pending.take() {
        virtual_time.set_relative_speed(request.scale);
        dilation.restore_at = Some(now + f64::from(request.duration));
        crate::logger::log(&format!(
            "⏱️ Time dilation ×{:.2} for {:.2}s",
            request.scale, request.duration
        ));
        return;
    }

    if let Some(restore_at) = dilation.restore_at {
        if now >= restore_at {
            virtual_time.set_relative_speed(1.0);
            dilation.restore_at = None;
            crate::logger::log("⏱️ Time dilation restored");
        }
    }
}
