//! Intervention actions: team support and obstruction.

use tracing::{debug, warn};

use super::{ActionContext, ActionHandler, ActionResult};
use crate::arena::{BuffKind, BuffSource};
use crate::data::PartTrait;
use crate::targeting::is_valid_target;

/// Grants the actor's team an accuracy buff of `1 + power / 100`.
///
/// One buff per source part: using the same part again replaces its entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupportHandler;

impl ActionHandler for SupportHandler {
    fn name(&self) -> &'static str {
        "support"
    }

    fn handles(&self) -> &[PartTrait] {
        &[PartTrait::Support]
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> ActionResult {
        let mut result = ActionResult::new(ctx.arena, ctx.actor, ctx.part);
        let Some(team) = ctx.arena.get(ctx.actor).map(|e| e.team()) else {
            return result;
        };
        let value = 1.0 + f64::from(ctx.part.stats.power) / 100.0;
        ctx.arena.team_buffs.add(
            team,
            BuffKind::Accuracy,
            BuffSource {
                source_entity: ctx.actor,
                source_slot: ctx.slot,
                value,
            },
        );
        debug!(actor = %ctx.actor, %team, value, "accuracy buff granted");
        result.is_hit = true;
        result
    }
}

/// Interference against a preselected enemy.
///
/// Carries no stat effect of its own; it records the target so the
/// message step can name it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObstructHandler;

impl ActionHandler for ObstructHandler {
    fn name(&self) -> &'static str {
        "obstruct"
    }

    fn handles(&self) -> &[PartTrait] {
        &[PartTrait::Obstruct]
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> ActionResult {
        let mut result = ActionResult::new(ctx.arena, ctx.actor, ctx.part);
        let target = ctx.arena.get(ctx.actor).map(|e| e.target);
        match target.and_then(|t| t.entity.map(|id| (id, t.slot))) {
            Some((id, slot)) if is_valid_target(ctx.arena, id) => {
                result.set_target(ctx.arena, ctx.data, id, slot);
                result.is_hit = true;
            }
            _ => warn!(actor = %ctx.actor, "obstruct has no valid target"),
        }
        result
    }
}
