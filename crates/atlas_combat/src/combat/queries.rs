//! Query surface для AI (blackboard facts).

use bevy::prelude::*;

use super::components::{CombatClock, CombatStateTags, CombatTag};

/// "В бою": атакует, блокирует, staggered, или последнее боевое действие
/// было меньше `combat_timeout` секунд назад.
pub fn is_in_combat(tags: &CombatStateTags, clock: &CombatClock, now: f32, combat_timeout: f32) -> bool {
    if tags.has_any(&[CombatTag::Attacking, CombatTag::Blocking, CombatTag::Staggered]) {
        return true;
    }
    clock
        .since_last_action(now)
        .is_some_and(|elapsed| elapsed < combat_timeout)
}

/// Дистанция между двумя entity; None если у кого-то нет Transform
pub fn distance_to_target(
    transforms: &Query<&Transform>,
    from: Entity,
    to: Entity,
) -> Option<f32> {
    let from = transforms.get(from).ok()?;
    let to = transforms.get(to).ok()?;
    Some(from.translation.distance(to.translation))
}
