//! Action slots - 5 generic containers per actor.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::definition::ActionId;
use super::instance::ActionInstance;

/// Slot identifier (Slot1..Slot5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize, Deserialize)]
pub enum ActionSlot {
    Slot1,
    Slot2,
    Slot3,
    Slot4,
    Slot5,
}

impl ActionSlot {
    pub const COUNT: usize = 5;

    pub const ALL: [ActionSlot; Self::COUNT] = [
        ActionSlot::Slot1,
        ActionSlot::Slot2,
        ActionSlot::Slot3,
        ActionSlot::Slot4,
        ActionSlot::Slot5,
    ];

    pub fn to_index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Слоты актора + указатель на текущее действие.
///
/// Инвариант: максимум один instance в состоянии Active. Arbitration
/// (interrupt текущего перед активацией другого) делает `process_slot_presses`.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct ActionSlots {
    slots: [Option<ActionInstance>; ActionSlot::COUNT],
    current: Option<ActionSlot>,
}

impl ActionSlots {
    /// Slot1 basic_attack, Slot2 heavy_attack
    pub fn starter() -> Self {
        Self::with_loadout(&[
            (ActionSlot::Slot1, "basic_attack"),
            (ActionSlot::Slot2, "heavy_attack"),
        ])
    }

    pub fn with_loadout(loadout: &[(ActionSlot, &str)]) -> Self {
        let mut slots = Self::default();
        for (slot, action) in loadout {
            slots.assign(*slot, ActionId::from(*action));
        }
        slots
    }

    pub fn get(&self, slot: ActionSlot) -> Option<&ActionInstance> {
        self.slots[slot.to_index()].as_ref()
    }

    pub fn get_mut(&mut self, slot: ActionSlot) -> Option<&mut ActionInstance> {
        self.slots[slot.to_index()].as_mut()
    }

    /// Кладёт новый instance в слот, возвращает старый
    pub fn assign(&mut self, slot: ActionSlot, action: ActionId) -> Option<ActionInstance> {
        if self.current == Some(slot) {
            self.current = None;
        }
        self.slots[slot.to_index()].replace(ActionInstance::new(action))
    }

    pub fn clear(&mut self, slot: ActionSlot) -> Option<ActionInstance> {
        if self.current == Some(slot) {
            self.current = None;
        }
        self.slots[slot.to_index()].take()
    }

    /// Меняет слоты местами; current следует за своим instance
    pub fn swap(&mut self, a: ActionSlot, b: ActionSlot) {
        if a == b {
            return;
        }
        self.slots.swap(a.to_index(), b.to_index());
        self.current = match self.current {
            Some(slot) if slot == a => Some(b),
            Some(slot) if slot == b => Some(a),
            other => other,
        };
    }

    pub fn current(&self) -> Option<ActionSlot> {
        self.current
    }

    pub fn set_current(&mut self, slot: Option<ActionSlot>) {
        self.current = slot;
    }

    /// Текущий слот, только если его instance реально Active
    pub fn active_slot(&self) -> Option<ActionSlot> {
        self.current
            .filter(|slot| self.get(*slot).is_some_and(ActionInstance::is_active))
    }

    pub fn active_action(&self) -> Option<&ActionId> {
        self.active_slot()
            .and_then(|slot| self.get(slot))
            .map(|instance| &instance.action)
    }

    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|instance| instance.is_active())
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionSlot, &ActionInstance)> {
        ActionSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|instance| (slot, instance)))
    }
}
