//! Charge initiation: the entry point for player choices and AI decisions.

use tracing::{debug, warn};

use crate::arena::Arena;
use crate::config::BattleConfig;
use crate::data::{GameData, PartCategory, PartDefinition, PartTrait};
use crate::entity::components::ActionTarget;
use crate::entity::{EffectData, EntityId, PartSlot, RobotState, TargetPolicy};
use crate::error::ChargeError;
use crate::part_info::PartInfo;
use crate::systems::{apply_effect, begin_charge, duration_ticks};
use crate::targeting::{is_valid_target, is_valid_target_part};

/// A request to start charging an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeRequest {
    /// Robot that acts.
    pub actor: EntityId,
    /// Slot of the part to use.
    pub slot: PartSlot,
    /// Preselected target robot.
    pub target: Option<EntityId>,
    /// Preselected target part. Left open, a random intact part is picked at
    /// execution.
    pub target_slot: Option<PartSlot>,
}

impl ChargeRequest {
    /// A request without a target, as for melee and support parts.
    #[must_use]
    pub const fn untargeted(actor: EntityId, slot: PartSlot) -> Self {
        Self {
            actor,
            slot,
            target: None,
            target_slot: None,
        }
    }

    /// A request aimed at a robot's part.
    #[must_use]
    pub const fn aimed(
        actor: EntityId,
        slot: PartSlot,
        target: EntityId,
        target_slot: PartSlot,
    ) -> Self {
        Self {
            actor,
            slot,
            target: Some(target),
            target_slot: Some(target_slot),
        }
    }
}

/// Whether using `part` needs a preselected enemy.
#[must_use]
pub fn requires_target(part: &PartDefinition) -> bool {
    match part.category {
        PartCategory::Ranged => true,
        PartCategory::Intervention => part.action_trait != PartTrait::Support,
        PartCategory::Melee | PartCategory::None => false,
    }
}

fn check_target(
    arena: &Arena,
    request: &ChargeRequest,
    enemy_only: bool,
) -> Result<(), ChargeError> {
    let Some(target) = request.target else {
        return Ok(());
    };
    if !is_valid_target(arena, target) {
        return Err(ChargeError::InvalidTarget(target));
    }
    let same_team = arena
        .get(request.actor)
        .zip(arena.get(target))
        .is_some_and(|(a, t)| a.team() == t.team());
    if enemy_only && same_team {
        return Err(ChargeError::TargetNotEnemy(target));
    }
    if let Some(slot) = request.target_slot {
        if !is_valid_target_part(arena, target, slot) {
            return Err(ChargeError::InvalidTargetPart(slot));
        }
    }
    Ok(())
}

/// Validates a request and returns the acting part's definition and the
/// target to store.
fn plan<'d>(
    arena: &Arena,
    data: &'d GameData,
    request: &ChargeRequest,
) -> Result<(&'d PartDefinition, ActionTarget), ChargeError> {
    let actor = arena
        .get(request.actor)
        .ok_or(ChargeError::UnknownActor(request.actor))?;
    if actor.is_broken() {
        return Err(ChargeError::ActorBroken);
    }
    if actor.state != RobotState::Idle {
        return Err(ChargeError::NotIdle);
    }
    let instance = actor
        .part(request.slot)
        .filter(|p| !p.is_broken)
        .ok_or(ChargeError::PartUnavailable(request.slot))?;
    let part = data
        .part(&instance.definition_id)
        .ok_or_else(|| ChargeError::MissingDefinition(instance.definition_id.clone()))?;
    if !part.category.is_action() {
        return Err(ChargeError::NotActionPart(part.id.clone()));
    }

    let target = if part.category == PartCategory::Melee {
        ActionTarget {
            policy: TargetPolicy::ClosestAtExecution,
            entity: None,
            slot: None,
        }
    } else {
        if requires_target(part) && request.target.is_none() {
            return Err(ChargeError::TargetRequired);
        }
        check_target(arena, request, requires_target(part))?;
        ActionTarget {
            policy: TargetPolicy::Preselected,
            entity: request.target,
            slot: request.target.and(request.target_slot),
        }
    };
    Ok((part, target))
}

/// Moves the actor's pending self-effects onto it. They carry no timer and
/// last until its action completes.
fn apply_pending_effects(arena: &mut Arena, id: EntityId) {
    let pending = arena
        .get_mut(id)
        .map(|actor| std::mem::take(&mut actor.intent.pending_effects))
        .unwrap_or_default();
    for effect in pending {
        apply_effect(arena, id, effect, 0);
    }
}

/// Starts charging an action.
///
/// Fails closed: a rejected request leaves the actor untouched. On success
/// the actor carries its trait's self-debuffs until the action completes
/// and its gauge runs for the part's charge time.
pub fn start_charge(
    arena: &mut Arena,
    data: &GameData,
    config: &BattleConfig,
    request: ChargeRequest,
) -> Result<(), ChargeError> {
    let (part, target) = plan(arena, data, &request).map_err(|err| {
        warn!(actor = %request.actor, slot = %request.slot, %err, "charge rejected");
        err
    })?;

    let debuffs: Vec<EffectData> = data
        .formula(part.action_trait)
        .user_debuffs
        .iter()
        .map(|d| d.to_effect())
        .collect();
    let total = duration_ticks(
        config,
        part.stats.charge,
        PartInfo::new(arena, data).overall_propulsion(request.actor),
    );

    if let Some(actor) = arena.get_mut(request.actor) {
        actor.intent.selected_slot = Some(request.slot);
        actor.intent.pending_effects = debuffs;
        actor.target = target;
    }
    debug!(
        actor = %request.actor,
        slot = %request.slot,
        part = %part.id,
        target = ?target.entity,
        "charge started"
    );
    begin_charge(arena, request.actor, total);
    apply_pending_effects(arena, request.actor);
    Ok(())
}
