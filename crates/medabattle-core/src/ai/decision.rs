//! Turning a personality into a concrete action for an idle robot.

use tracing::debug;

use super::{RandomTargeting, StrategyContext, StrategyRegistry, TargetChoice, TargetingStrategy};
use crate::config::LaneParams;
use crate::data::{PartCategory, PartTrait};
use crate::entity::{Entity, EntityId, PartSlot};
use crate::part_info::PartInfo;
use crate::rng::BattleRng;
use crate::targeting::{closest_enemy, targetable_enemies};

/// What an AI robot wants to charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Slot of the part to use.
    pub slot: PartSlot,
    /// Preselected target robot, if the action needs one now.
    pub target: Option<EntityId>,
    /// Preselected target part.
    pub target_slot: Option<PartSlot>,
}

fn targeting_for<'s>(
    entity: &Entity,
    registered: Option<&'s dyn TargetingStrategy>,
) -> &'s dyn TargetingStrategy {
    match registered {
        Some(strategy) if !entity.effects.has_target_random() => strategy,
        _ => &RandomTargeting,
    }
}

/// Chooses a part and, where needed, a target for an idle AI robot.
///
/// Melee and support parts carry no preselected target: melee picks the
/// nearest enemy at execution, support buffs the own team. Returns `None`
/// when the robot has no AI, no usable part, or nothing to aim at.
pub fn decide(
    info: PartInfo<'_>,
    registry: &StrategyRegistry,
    actor: EntityId,
    rng: &mut BattleRng,
) -> Option<Decision> {
    let entity = info.arena().get(actor)?;
    let memory = entity.ai.as_ref()?;
    let pair = registry.pair_for(memory.personality);

    let parts = info.available_attack_parts(actor);
    let slot = pair.part_selection.select(&parts)?;
    let definition = parts.iter().find(|p| p.slot == slot)?.definition;

    let untargeted = definition.category == PartCategory::Melee
        || (definition.category == PartCategory::Intervention
            && definition.action_trait == PartTrait::Support);
    if untargeted {
        debug!(
            %actor,
            personality = %memory.personality,
            %slot,
            part = %definition.id,
            "ai chose untargeted action"
        );
        return Some(Decision {
            slot,
            target: None,
            target_slot: None,
        });
    }

    let candidates = targetable_enemies(info.arena(), actor);
    let ctx = StrategyContext {
        info,
        actor,
        candidates: &candidates,
    };
    let targeting = targeting_for(entity, Some(pair.targeting.as_ref()));
    let Some(choice) = targeting.select(&ctx, rng) else {
        debug!(%actor, strategy = targeting.name(), "ai found no target");
        return None;
    };
    debug!(
        %actor,
        personality = %memory.personality,
        %slot,
        part = %definition.id,
        target = %choice.entity,
        target_slot = %choice.slot,
        "ai chose action"
    );
    Some(Decision {
        slot,
        target: Some(choice.entity),
        target_slot: Some(choice.slot),
    })
}

/// Resolves a melee attack at execution: the nearest enemy, with the part
/// picked by the actor's targeting strategy restricted to that enemy.
///
/// Robots without AI memory pick a random part.
pub fn resolve_melee_target(
    info: PartInfo<'_>,
    registry: &StrategyRegistry,
    lane: &LaneParams,
    actor: EntityId,
    rng: &mut BattleRng,
) -> Option<TargetChoice> {
    let entity = info.arena().get(actor)?;
    let closest = closest_enemy(info.arena(), actor, lane)?;
    let candidates = [closest];
    let ctx = StrategyContext {
        info,
        actor,
        candidates: &candidates,
    };
    let pair = entity
        .ai
        .as_ref()
        .map(|ai| registry.pair_for(ai.personality));
    let targeting = targeting_for(entity, pair.as_ref().map(|p| p.targeting.as_ref()));
    targeting.select(&ctx, rng)
}
