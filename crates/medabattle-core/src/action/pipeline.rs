//! Dispatch of ready actors and post-action bookkeeping.

use tracing::{debug, warn};

use super::{ActionContext, ActionResult, HandlerRegistry};
use crate::ai::StrategyRegistry;
use crate::arena::Arena;
use crate::config::BattleConfig;
use crate::data::{GameData, PartDefinition};
use crate::entity::{EntityId, LastHit, PartSlot, RobotState};
use crate::error::DispatchError;
use crate::part_info::PartInfo;
use crate::rng::BattleRng;
use crate::systems::{apply_effect, begin_cooldown, clear_action_scoped, duration_ticks};

/// What happened to the actor popped from the ready queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// The action executed.
    Action(ActionResult),
    /// The action could not execute.
    Failed {
        /// Robot that was dispatched.
        actor: EntityId,
        /// Why it failed.
        error: DispatchError,
    },
}

/// Shared, read-only inputs for dispatching actions.
#[derive(Debug, Clone, Copy)]
pub struct ActionPipeline<'a> {
    /// Static definitions.
    pub data: &'a GameData,
    /// Formula constants.
    pub config: &'a BattleConfig,
    /// AI strategies for targets resolved at execution.
    pub strategies: &'a StrategyRegistry,
    /// Trait-keyed handlers.
    pub handlers: &'a HandlerRegistry,
}

impl<'a> ActionPipeline<'a> {
    /// Pops the front of the ready queue and executes its action.
    ///
    /// Returns `None` when the queue is empty. An actor whose action cannot
    /// execute (its part broke while charging, or no handler fits) gets a
    /// short cooldown so it does not stall in the ready state. Entries that
    /// are gone or not ready are dropped.
    pub fn dispatch_next(&self, arena: &mut Arena, rng: &mut BattleRng) -> Option<Dispatched> {
        let actor = arena.action_queue.pop_front()?;
        let outcome = match self.prepare(arena, actor) {
            Ok((slot, part)) => self.execute(arena, rng, actor, slot, part),
            Err(error) => Err(error),
        };
        Some(match outcome {
            Ok(result) => Dispatched::Action(result),
            Err(error) => {
                warn!(%actor, %error, "dispatch failed");
                if !matches!(
                    error,
                    DispatchError::UnknownActor(_) | DispatchError::NotReady(_)
                ) {
                    let total = f64::from(self.config.failure_cooldown_ticks.max(1));
                    begin_cooldown(arena, actor, total);
                    clear_action_scoped(arena, actor);
                }
                Dispatched::Failed { actor, error }
            }
        })
    }

    fn prepare(
        &self,
        arena: &Arena,
        actor: EntityId,
    ) -> Result<(PartSlot, &'a PartDefinition), DispatchError> {
        let entity = arena.get(actor).ok_or(DispatchError::UnknownActor(actor))?;
        if entity.state != RobotState::Ready {
            return Err(DispatchError::NotReady(actor));
        }
        let slot = entity
            .intent
            .selected_slot
            .ok_or(DispatchError::NoIntent(actor))?;
        let instance = entity
            .part(slot)
            .filter(|p| !p.is_broken)
            .ok_or(DispatchError::PartBroken(slot))?;
        let part = self
            .data
            .part(&instance.definition_id)
            .ok_or_else(|| DispatchError::MissingDefinition(instance.definition_id.clone()))?;
        Ok((slot, part))
    }

    fn execute(
        &self,
        arena: &mut Arena,
        rng: &mut BattleRng,
        actor: EntityId,
        slot: PartSlot,
        part: &'a PartDefinition,
    ) -> Result<ActionResult, DispatchError> {
        let handler = self
            .handlers
            .handler_for(part)
            .ok_or_else(|| DispatchError::NoHandler(part.id.clone()))?;
        debug!(%actor, %slot, part = %part.id, handler = handler.name(), "dispatch");
        let result = {
            let mut ctx = ActionContext {
                arena: &mut *arena,
                data: self.data,
                config: self.config,
                strategies: self.strategies,
                rng,
                actor,
                slot,
                part,
            };
            handler.execute(&mut ctx)
        };
        self.finish(arena, part, &result);
        Ok(result)
    }

    /// Post-action bookkeeping: memory, effects, cooldown.
    fn finish(&self, arena: &mut Arena, part: &PartDefinition, result: &ActionResult) {
        let actor = result.actor;
        arena.last_result = Some(result.clone());

        if let Some(target) = result.target {
            if let Some(ai) = arena.get_mut(target).and_then(|e| e.ai.as_mut()) {
                ai.last_attacker = Some(actor);
            }
            if let Some(slot) = result.actual_hit_slot.filter(|_| result.is_hit) {
                let tick = arena.current_tick();
                if let Some(ai) = arena.get_mut(actor).and_then(|e| e.ai.as_mut()) {
                    ai.last_hit = Some(LastHit { target, slot, tick });
                }
            }
        }

        for applied in &result.applied_effects {
            apply_effect(arena, applied.recipient, applied.effect, applied.duration);
        }

        let propulsion = PartInfo::new(arena, self.data).overall_propulsion(actor);
        let total = duration_ticks(self.config, part.stats.cooldown, propulsion);
        begin_cooldown(arena, actor, total);
        clear_action_scoped(arena, actor);
    }
}
