//! Applying armor damage to parts.

use tracing::debug;

use crate::arena::Arena;
use crate::entity::{EntityId, PartSlot};
use crate::part_info::remove_buffs_from_source;
use crate::systems::gauge::mark_broken;

/// What a damage application changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamageOutcome {
    /// Armor actually removed.
    pub dealt: i32,
    /// The part is broken after the hit.
    pub part_broken: bool,
    /// The robot is broken after the hit.
    pub robot_broken: bool,
}

/// Removes armor from one part.
///
/// Breaking a part revokes the team buffs it granted. Breaking the head
/// breaks the robot in the same call. Unknown robots or empty slots are
/// left alone.
pub fn apply_damage(
    arena: &mut Arena,
    target: EntityId,
    slot: PartSlot,
    amount: i32,
) -> DamageOutcome {
    let Some(part) = arena.get_mut(target).and_then(|e| e.parts.get_mut(&slot)) else {
        return DamageOutcome::default();
    };
    let before = part.current_armor;
    let broke = part.apply_damage(amount);
    let outcome = DamageOutcome {
        dealt: before - part.current_armor,
        part_broken: part.is_broken,
        robot_broken: false,
    };
    if broke {
        debug!(entity = %target, %slot, "part broken");
        remove_buffs_from_source(arena, target, slot);
        if slot == PartSlot::Head {
            mark_broken(arena, target);
        }
    }
    DamageOutcome {
        robot_broken: arena.get(target).is_some_and(|e| e.is_broken()),
        ..outcome
    }
}
