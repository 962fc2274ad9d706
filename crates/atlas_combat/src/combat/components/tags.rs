//! Combat state tags.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Closed set of combat tags.
///
/// State tags (Attacking, Blocking, ...) живут в `CombatStateTags` актора,
/// attack tags (HeavyAttack, Unblockable) - в `ActionDefinition`.
/// Только membership, никакой иерархии.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum CombatTag {
    Attacking,
    Blocking,
    Dashing,
    Parrying,
    Staggered,
    Vulnerable,
    IFrames,
    Dead,
    Ragdolled,
    Channeling,
    FocusMode,
    HeavyAttack,
    Unblockable,
}

impl CombatTag {
    pub const ALL: [CombatTag; 13] = [
        CombatTag::Attacking,
        CombatTag::Blocking,
        CombatTag::Dashing,
        CombatTag::Parrying,
        CombatTag::Staggered,
        CombatTag::Vulnerable,
        CombatTag::IFrames,
        CombatTag::Dead,
        CombatTag::Ragdolled,
        CombatTag::Channeling,
        CombatTag::FocusMode,
        CombatTag::HeavyAttack,
        CombatTag::Unblockable,
    ];

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Transient combat states актора (bitset по `CombatTag`).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct CombatStateTags {
    bits: u32,
}

impl CombatStateTags {
    pub fn from_tags(tags: &[CombatTag]) -> Self {
        let mut set = Self::default();
        for tag in tags {
            set.add(*tag);
        }
        set
    }

    /// Returns true if the tag was newly added
    pub fn add(&mut self, tag: CombatTag) -> bool {
        let had = self.has(tag);
        self.bits |= tag.bit();
        !had
    }

    /// Returns true if the tag was present
    pub fn remove(&mut self, tag: CombatTag) -> bool {
        let had = self.has(tag);
        self.bits &= !tag.bit();
        had
    }

    pub fn set(&mut self, tag: CombatTag, present: bool) {
        if present {
            self.add(tag);
        } else {
            self.remove(tag);
        }
    }

    /// Flip membership, returns new state
    pub fn toggle(&mut self, tag: CombatTag) -> bool {
        self.bits ^= tag.bit();
        self.has(tag)
    }

    pub fn has(&self, tag: CombatTag) -> bool {
        self.bits & tag.bit() != 0
    }

    pub fn has_any(&self, tags: &[CombatTag]) -> bool {
        tags.iter().any(|tag| self.has(*tag))
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = CombatTag> + '_ {
        CombatTag::ALL.into_iter().filter(|tag| self.has(*tag))
    }
}
