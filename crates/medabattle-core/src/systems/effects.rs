//! Status effects: attach, remove and tick.
//!
//! Stat-modifying effects are folded in by
//! [`PartInfo`](crate::part_info::PartInfo) when rates are read, so expiring
//! one only has to delete its entry.

use tracing::debug;

use crate::arena::Arena;
use crate::combat::{apply_damage, DamageOutcome};
use crate::entity::{EffectData, EntityId, PartSlot};

/// Damage dealt by a damage-over-time effect during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DotHit {
    /// Robot that took the damage.
    pub entity: EntityId,
    /// Part that took it.
    pub slot: PartSlot,
    /// What the damage did.
    pub outcome: DamageOutcome,
}

/// Attaches an effect. A `duration` of `0` lasts until removed explicitly.
pub fn apply_effect(arena: &mut Arena, id: EntityId, effect: EffectData, duration: u32) {
    if let Some(entity) = arena.get_mut(id) {
        debug!(entity = %id, ?effect, duration, "effect applied");
        entity.effects.push(effect, duration);
    }
}

/// Removes every entry carrying `effect`. Returns how many were removed.
pub fn remove_effect(arena: &mut Arena, id: EntityId, effect: &EffectData) -> usize {
    let removed = arena
        .get_mut(id)
        .map_or(0, |entity| entity.effects.remove_matching(effect));
    if removed > 0 {
        debug!(entity = %id, ?effect, removed, "effect removed");
    }
    removed
}

/// Drops the actor's effects that carry no timer.
///
/// These are the debuffs attached when its charge began.
pub fn clear_action_scoped(arena: &mut Arena, id: EntityId) -> usize {
    let removed = arena
        .get_mut(id)
        .map_or(0, |entity| entity.effects.clear_action_scoped());
    if removed > 0 {
        debug!(entity = %id, removed, "action-scoped effects cleared");
    }
    removed
}

/// Counts down every timed effect by one tick.
///
/// Damage-over-time effects deal their damage before counting down and hit
/// the first intact part in slot order. Effects reaching zero are removed.
/// Effects without a timer and robots that are broken are left alone.
pub fn tick_effects(arena: &mut Arena) -> Vec<DotHit> {
    let ids: Vec<EntityId> = arena.entity_ids_sorted().collect();
    let mut hits = Vec::new();
    for id in ids {
        let Some(entity) = arena.get_mut(id) else {
            continue;
        };
        if entity.is_broken() || entity.effects.is_empty() {
            continue;
        }

        let mut dot = 0;
        let mut expired = Vec::new();
        entity.effects.entries_mut().retain_mut(|active| {
            if active.remaining == 0 {
                return true;
            }
            if let EffectData::DamageOverTime { damage } = active.effect {
                dot += damage;
            }
            active.remaining -= 1;
            if active.remaining == 0 {
                expired.push(active.effect);
                return false;
            }
            true
        });
        for effect in &expired {
            debug!(entity = %id, ?effect, "effect expired");
        }

        if dot > 0 {
            let slot = PartSlot::ALL
                .into_iter()
                .find(|slot| entity.has_working_part(*slot));
            if let Some(slot) = slot {
                let outcome = apply_damage(arena, id, slot, dot);
                debug!(entity = %id, %slot, damage = outcome.dealt, "damage over time");
                hits.push(DotHit {
                    entity: id,
                    slot,
                    outcome,
                });
            }
        }
    }
    hits
}
