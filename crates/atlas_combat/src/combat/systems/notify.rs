//! Animation notifies: parry window и combo window.

use bevy::prelude::*;

use crate::actions::SlotPressed;
use crate::combat::components::{CombatStateTags, CombatTag, ComboWindow, ParryWindow};
use crate::combat::events::{AnimationNotify, AnimationNotifyKind};
use crate::config::CombatRules;

/// System: animation notify → parry/combo windows.
///
/// ComboWindowEnd с buffered slot → `SlotPressed { buffered: true }`,
/// который `process_slot_presses` обработает в этом же тике.
pub fn process_animation_notifies(
    mut notifies: EventReader<AnimationNotify>,
    rules: Res<CombatRules>,
    mut actors: Query<(&mut ParryWindow, &mut ComboWindow, &mut CombatStateTags)>,
    mut presses: EventWriter<SlotPressed>,
) {
    for notify in notifies.read() {
        let Ok((mut parry, mut combo, mut tags)) = actors.get_mut(notify.actor) else {
            crate::logger::log_warning(&format!("⚠️ AnimationNotify for unknown actor {:?}", notify.actor));
            continue;
        };

        match &notify.kind {
            AnimationNotifyKind::ParryWindowBegin => {
                parry.open(rules.perfect_parry_window, rules.late_parry_window);
                tags.add(CombatTag::Parrying);
            }
            AnimationNotifyKind::ParryWindowEnd => {
                parry.close();
                tags.remove(CombatTag::Parrying);
            }
            AnimationNotifyKind::ComboWindowBegin { name } => {
                combo.open(name.clone());
            }
            AnimationNotifyKind::ComboWindowEnd => {
                if let Some(slot) = combo.close() {
                    crate::logger::log(&format!("🔗 {:?} combo replay {:?}", notify.actor, slot));
                    presses.write(SlotPressed {
                        actor: notify.actor,
                        slot,
                        buffered: true,
                    });
                }
            }
        }
    }
}
