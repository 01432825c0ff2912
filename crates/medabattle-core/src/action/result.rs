//! The structured outcome of one dispatched action.

use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::data::{GameData, PartCategory, PartDefinition, PartTrait};
use crate::entity::{EffectData, EntityId, PartSlot};

/// An effect to hand to the status-effect system after the action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedEffect {
    /// Robot that receives the effect.
    pub recipient: EntityId,
    /// The effect.
    pub effect: EffectData,
    /// Ticks it lasts; `0` until removed explicitly.
    pub duration: u32,
}

/// Everything the host needs to animate and narrate an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Acting robot.
    pub actor: EntityId,
    /// Robot the action resolved against, if any.
    pub target: Option<EntityId>,
    /// Part the action was aimed at.
    pub intended_slot: Option<PartSlot>,
    /// Part that actually took the hit (the defender on a defended hit).
    pub actual_hit_slot: Option<PartSlot>,
    /// The action connected.
    pub is_hit: bool,
    /// The damage roll was critical.
    pub is_critical: bool,
    /// Damage before defense.
    pub original_damage: i32,
    /// Damage applied to the hit part.
    pub damage_dealt: i32,
    /// A defending part took the hit.
    pub is_defended: bool,
    /// The hit part broke.
    pub target_part_broken: bool,
    /// The target robot broke.
    pub target_robot_broken: bool,
    /// Actor display name.
    pub attacker_name: String,
    /// Target display name.
    pub defender_name: String,
    /// Name of the acting part.
    pub action_name: String,
    /// Trait of the acting part.
    pub action_trait: PartTrait,
    /// Weapon label of the acting part.
    pub weapon_type: String,
    /// Category of the acting part.
    pub category: PartCategory,
    /// Name of the part aimed at.
    pub target_part_name: String,
    /// Name of the part that took the hit.
    pub hit_part_name: String,
    /// Effects to attach after the action.
    pub applied_effects: Vec<AppliedEffect>,
}

impl ActionResult {
    /// A no-hit result for `actor` using `part`.
    #[must_use]
    pub fn new(arena: &Arena, actor: EntityId, part: &PartDefinition) -> Self {
        Self {
            actor,
            target: None,
            intended_slot: None,
            actual_hit_slot: None,
            is_hit: false,
            is_critical: false,
            original_damage: 0,
            damage_dealt: 0,
            is_defended: false,
            target_part_broken: false,
            target_robot_broken: false,
            attacker_name: robot_name(arena, actor),
            defender_name: String::new(),
            action_name: part.name.clone(),
            action_trait: part.action_trait,
            weapon_type: part.weapon_type.clone(),
            category: part.category,
            target_part_name: String::new(),
            hit_part_name: String::new(),
            applied_effects: Vec::new(),
        }
    }

    /// Records the robot and part the action resolved against.
    pub fn set_target(
        &mut self,
        arena: &Arena,
        data: &GameData,
        target: EntityId,
        slot: Option<PartSlot>,
    ) {
        self.target = Some(target);
        self.defender_name = robot_name(arena, target);
        self.intended_slot = slot;
        self.target_part_name =
            slot.map_or_else(String::new, |s| part_name(arena, data, target, s));
    }

    /// Records the part that took the hit.
    pub fn set_hit_part(&mut self, arena: &Arena, data: &GameData, slot: PartSlot) {
        if let Some(target) = self.target {
            self.actual_hit_slot = Some(slot);
            self.hit_part_name = part_name(arena, data, target, slot);
        }
    }
}

fn robot_name(arena: &Arena, id: EntityId) -> String {
    arena
        .get(id)
        .map_or_else(String::new, |e| e.settings.name.clone())
}

fn part_name(arena: &Arena, data: &GameData, id: EntityId, slot: PartSlot) -> String {
    arena
        .get(id)
        .and_then(|e| e.part(slot))
        .and_then(|p| data.part(&p.definition_id))
        .map_or_else(String::new, |d| d.name.clone())
}
