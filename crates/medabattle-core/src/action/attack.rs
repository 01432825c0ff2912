//! Ranged and melee attacks.

use tracing::{debug, warn};

use super::{ActionContext, ActionHandler, ActionResult, AppliedEffect};
use crate::ai::{resolve_melee_target, TargetChoice};
use crate::combat::{
    apply_damage, defended_damage, defense_chance, hit_chance, roll_damage, DamageInput,
};
use crate::data::PartTrait;
use crate::entity::TargetPolicy;
use crate::part_info::PartInfo;
use crate::targeting::{is_valid_target, is_valid_target_part, random_part, select_defender};

/// Hit check, damage roll, defense and armor damage.
///
/// Shoot and aim resolve against the preselected target. Strike and
/// berserk pick the nearest enemy when they execute.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttackHandler;

impl AttackHandler {
    fn resolve_target(ctx: &mut ActionContext<'_>) -> Option<TargetChoice> {
        let target = ctx.arena.get(ctx.actor)?.target;
        match target.policy {
            TargetPolicy::Preselected => {
                let entity = target.entity?;
                if !is_valid_target(ctx.arena, entity) {
                    return None;
                }
                let slot = match target.slot {
                    Some(slot) => slot,
                    None => random_part(ctx.arena, entity, ctx.rng)?,
                };
                is_valid_target_part(ctx.arena, entity, slot)
                    .then_some(TargetChoice { entity, slot })
            }
            TargetPolicy::ClosestAtExecution => resolve_melee_target(
                PartInfo::new(ctx.arena, ctx.data),
                ctx.strategies,
                &ctx.config.lane,
                ctx.actor,
                ctx.rng,
            ),
        }
    }
}

impl ActionHandler for AttackHandler {
    fn name(&self) -> &'static str {
        "attack"
    }

    fn handles(&self) -> &[PartTrait] {
        &[
            PartTrait::Shoot,
            PartTrait::Aim,
            PartTrait::Strike,
            PartTrait::Berserk,
        ]
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> ActionResult {
        let mut result = ActionResult::new(ctx.arena, ctx.actor, ctx.part);
        let Some(TargetChoice { entity: target, slot }) = Self::resolve_target(ctx) else {
            warn!(actor = %ctx.actor, part = %ctx.part.id, "attack has no valid target");
            return result;
        };
        result.set_target(ctx.arena, ctx.data, target, Some(slot));

        let info = PartInfo::new(ctx.arena, ctx.data);
        let formula = ctx.data.formula(ctx.part.action_trait);
        let success = info.success_rate(ctx.actor, ctx.part, ctx.slot);
        let evasion = info.evasion_rate(target);
        if !ctx.rng.check(hit_chance(ctx.config, success, evasion)) {
            debug!(actor = %ctx.actor, %target, success, evasion, "miss");
            return result;
        }
        result.is_hit = true;

        let roll = roll_damage(
            ctx.config,
            DamageInput {
                success,
                evasion,
                power: info.power(ctx.actor, ctx.part, ctx.slot),
                critical_bonus: formula.critical_rate_bonus,
            },
            ctx.rng,
        );
        result.is_critical = roll.is_critical;
        result.original_damage = roll.damage;

        let defense_rate = info.defense_rate(target);
        let (hit_slot, damage, defended) = match select_defender(ctx.arena, target) {
            Some(defender)
                if ctx
                    .rng
                    .check(defense_chance(ctx.config, defense_rate, success)) =>
            {
                let part_defense = info
                    .definition(target, defender)
                    .map_or(0, |d| d.stats.defense);
                (defender, defended_damage(roll.damage, part_defense), true)
            }
            _ => (slot, roll.damage, false),
        };

        let outcome = apply_damage(ctx.arena, target, hit_slot, damage);
        debug!(
            actor = %ctx.actor,
            %target,
            slot = %hit_slot,
            damage,
            critical = roll.is_critical,
            defended,
            "hit"
        );
        result.set_hit_part(ctx.arena, ctx.data, hit_slot);
        result.damage_dealt = damage;
        result.is_defended = defended;
        result.target_part_broken = outcome.part_broken;
        result.target_robot_broken = outcome.robot_broken;
        result
            .applied_effects
            .extend(formula.target_effects.iter().map(|te| AppliedEffect {
                recipient: target,
                effect: te.effect,
                duration: te.duration,
            }));
        result
    }
}
