//! Recovery systems: poise regen / stagger, vulnerability, parry windows.

use bevy::prelude::*;

use crate::combat::components::{
    CombatStateTags, CombatTag, ParryWindow, Poise, PoiseTick, Vulnerability,
};
use crate::combat::events::{PoiseChanged, StaggerEnded, VulnerabilityEndReason, VulnerabilityEnded};

/// Vulnerable / IFrames теги зеркалят компонент
pub fn sync_vulnerability_tags(vulnerability: &Vulnerability, tags: &mut CombatStateTags) {
    tags.set(CombatTag::Vulnerable, vulnerability.is_vulnerable());
    tags.set(CombatTag::IFrames, vulnerability.has_iframes());
}

/// System: stagger countdown + poise regeneration (после regen_delay).
pub fn tick_poise(
    mut actors: Query<(Entity, &mut Poise, &mut CombatStateTags)>,
    time: Res<Time>,
    mut poise_changed: EventWriter<PoiseChanged>,
    mut stagger_ended: EventWriter<StaggerEnded>,
) {
    let delta = time.delta_secs();

    for (entity, mut poise, mut tags) in actors.iter_mut() {
        match poise.tick(delta) {
            PoiseTick::Idle => {}
            PoiseTick::Regenerated => {
                poise_changed.write(PoiseChanged {
                    entity,
                    current: poise.current,
                    max: poise.max,
                });
            }
            PoiseTick::Recovered => {
                tags.remove(CombatTag::Staggered);
                poise_changed.write(PoiseChanged {
                    entity,
                    current: poise.current,
                    max: poise.max,
                });
                crate::logger::log(&format!("✅ {:?} recovered from stagger", entity));
                stagger_ended.write(StaggerEnded { entity });
            }
        }
    }
}

/// System: tier duration + i-frames countdown.
pub fn tick_vulnerability(
    mut actors: Query<(Entity, &mut Vulnerability, &mut CombatStateTags)>,
    time: Res<Time>,
    mut vulnerability_ended: EventWriter<VulnerabilityEnded>,
) {
    let delta = time.delta_secs();

    for (entity, mut vulnerability, mut tags) in actors.iter_mut() {
        let tier = vulnerability.tier();
        let tick = vulnerability.tick(delta);
        sync_vulnerability_tags(&vulnerability, &mut tags);

        if tick.expired {
            crate::logger::log(&format!("🎯 {:?} vulnerability {:?} expired", entity, tier));
            vulnerability_ended.write(VulnerabilityEnded {
                entity,
                tier,
                reason: VulnerabilityEndReason::Expired,
            });
        }
    }
}

/// System: parry window timer + safety close (без явного ParryWindowEnd).
pub fn tick_parry_windows(
    mut actors: Query<(&mut ParryWindow, &mut CombatStateTags)>,
    time: Res<Time>,
) {
    let delta = time.delta_secs();

    for (mut parry, mut tags) in actors.iter_mut() {
        if !parry.is_open() {
            continue;
        }
        if parry.tick(delta) {
            tags.remove(CombatTag::Parrying);
        }
    }
}
