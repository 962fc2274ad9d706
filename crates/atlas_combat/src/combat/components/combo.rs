//! Combo window / input buffer.

use bevy::prelude::*;

use crate::actions::ActionSlot;

/// Окно комбо во время атаки.
///
/// Пока окно открыто, нажатие слота буферизуется (последнее побеждает).
/// При закрытии буфер отдаётся наружу для replay через обычный slot path.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct ComboWindow {
    active: bool,
    name: Option<String>,
    buffered: Option<ActionSlot>,
}

impl ComboWindow {
    pub fn open(&mut self, name: impl Into<String>) {
        self.active = true;
        self.name = Some(name.into());
        self.buffered = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn buffered(&self) -> Option<ActionSlot> {
        self.buffered
    }

    /// Records the slot; returns false if the window is closed
    pub fn buffer(&mut self, slot: ActionSlot) -> bool {
        if !self.active {
            return false;
        }
        self.buffered = Some(slot);
        true
    }

    /// Закрывает окно и забирает buffered slot (если был)
    pub fn close(&mut self) -> Option<ActionSlot> {
        self.active = false;
        self.name = None;
        self.buffered.take()
    }
}
