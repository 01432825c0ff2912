//! Targeting strategies: which enemy part to aim at.

use tracing::debug;

use crate::entity::{EntityId, LastHit, PartSlot};
use crate::part_info::PartInfo;
use crate::rng::BattleRng;

/// A chosen enemy part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetChoice {
    /// Targeted robot.
    pub entity: EntityId,
    /// Targeted part.
    pub slot: PartSlot,
}

/// What a targeting strategy may look at.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    /// Read-only stats of the arena.
    pub info: PartInfo<'a>,
    /// The deciding robot.
    pub actor: EntityId,
    /// Enemies the strategy may pick from, in draw-index order.
    pub candidates: &'a [EntityId],
}

impl StrategyContext<'_> {
    fn is_candidate(&self, id: EntityId) -> bool {
        self.candidates.contains(&id)
    }

    /// Intact parts of every candidate, candidate order then slot order.
    #[must_use]
    pub fn candidate_parts(&self) -> Vec<TargetChoice> {
        let arena = self.info.arena();
        self.candidates
            .iter()
            .filter_map(|id| arena.get(*id))
            .filter(|e| !e.is_broken())
            .flat_map(|e| {
                e.working_slots()
                    .into_iter()
                    .map(move |slot| TargetChoice {
                        entity: e.id(),
                        slot,
                    })
            })
            .collect()
    }

    /// Uniform choice among the intact parts of one candidate.
    fn random_part_of(&self, id: EntityId, rng: &mut BattleRng) -> Option<TargetChoice> {
        if !self.is_candidate(id) {
            return None;
        }
        let entity = self.info.arena().get(id).filter(|e| !e.is_broken())?;
        let slots = entity.working_slots();
        rng.choose(&slots)
            .map(|slot| TargetChoice { entity: id, slot: *slot })
    }
}

/// Picks an enemy part.
///
/// Strategies must be deterministic given the context and the random stream,
/// and must only return candidates with an intact part.
pub trait TargetingStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Chooses a target, or `None` when nothing fits.
    fn select(&self, ctx: &StrategyContext<'_>, rng: &mut BattleRng) -> Option<TargetChoice>;
}

// =============================================================================
// Stateless strategies
// =============================================================================

/// Joker: uniform over every intact enemy part. The shared fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTargeting;

impl TargetingStrategy for RandomTargeting {
    fn name(&self) -> &'static str {
        "random"
    }

    fn select(&self, ctx: &StrategyContext<'_>, rng: &mut BattleRng) -> Option<TargetChoice> {
        let parts = ctx.candidate_parts();
        rng.choose(&parts).copied()
    }
}

fn fallback(
    strategy: &str,
    ctx: &StrategyContext<'_>,
    rng: &mut BattleRng,
) -> Option<TargetChoice> {
    debug!(actor = %ctx.actor, strategy, "falling back to random targeting");
    RandomTargeting.select(ctx, rng)
}

fn by_armor(ctx: &StrategyContext<'_>, prefer: impl Fn(i32, i32) -> bool) -> Option<TargetChoice> {
    let arena = ctx.info.arena();
    let mut best: Option<(TargetChoice, i32)> = None;
    for choice in ctx.candidate_parts() {
        let Some(armor) = arena
            .get(choice.entity)
            .and_then(|e| e.part(choice.slot))
            .map(|p| p.current_armor)
        else {
            continue;
        };
        if best.map_or(true, |(_, current)| prefer(armor, current)) {
            best = Some((choice, armor));
        }
    }
    best.map(|(choice, _)| choice)
}

/// Hunter: the intact enemy part with the least armor.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestArmorTargeting;

impl TargetingStrategy for LowestArmorTargeting {
    fn name(&self) -> &'static str {
        "lowest_armor"
    }

    fn select(&self, ctx: &StrategyContext<'_>, _rng: &mut BattleRng) -> Option<TargetChoice> {
        by_armor(ctx, |armor, best| armor < best)
    }
}

/// Crusher: the intact enemy part with the most armor.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestArmorTargeting;

impl TargetingStrategy for HighestArmorTargeting {
    fn name(&self) -> &'static str {
        "highest_armor"
    }

    fn select(&self, ctx: &StrategyContext<'_>, _rng: &mut BattleRng) -> Option<TargetChoice> {
        by_armor(ctx, |armor, best| armor > best)
    }
}

/// Leader: a random intact part of the enemy leader.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaderTargeting;

impl TargetingStrategy for LeaderTargeting {
    fn name(&self) -> &'static str {
        "leader"
    }

    fn select(&self, ctx: &StrategyContext<'_>, rng: &mut BattleRng) -> Option<TargetChoice> {
        let arena = ctx.info.arena();
        let leader = ctx
            .candidates
            .iter()
            .copied()
            .find(|id| arena.get(*id).is_some_and(|e| e.settings.is_leader));
        leader
            .and_then(|id| ctx.random_part_of(id, rng))
            .or_else(|| fallback(self.name(), ctx, rng))
    }
}

/// Chase: the enemy legs with the most propulsion; with every leg broken,
/// a random non-leg part.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChaseTargeting;

impl TargetingStrategy for ChaseTargeting {
    fn name(&self) -> &'static str {
        "chase"
    }

    fn select(&self, ctx: &StrategyContext<'_>, rng: &mut BattleRng) -> Option<TargetChoice> {
        let parts = ctx.candidate_parts();
        let mut best: Option<(EntityId, i32)> = None;
        for choice in parts.iter().filter(|c| c.slot == PartSlot::Legs) {
            let propulsion = ctx.info.overall_propulsion(choice.entity);
            if best.map_or(true, |(_, p)| propulsion > p) {
                best = Some((choice.entity, propulsion));
            }
        }
        if let Some((entity, _)) = best {
            return Some(TargetChoice {
                entity,
                slot: PartSlot::Legs,
            });
        }
        let others: Vec<_> = parts
            .into_iter()
            .filter(|c| c.slot != PartSlot::Legs)
            .collect();
        rng.choose(&others)
            .copied()
            .or_else(|| fallback(self.name(), ctx, rng))
    }
}

/// Duel: a random enemy arm that can still act.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuelTargeting;

impl TargetingStrategy for DuelTargeting {
    fn name(&self) -> &'static str {
        "duel"
    }

    fn select(&self, ctx: &StrategyContext<'_>, rng: &mut BattleRng) -> Option<TargetChoice> {
        let arms: Vec<_> = ctx
            .candidate_parts()
            .into_iter()
            .filter(|c| c.slot.is_arm())
            .filter(|c| {
                ctx.info
                    .definition(c.entity, c.slot)
                    .is_some_and(|d| d.category.is_action())
            })
            .collect();
        rng.choose(&arms)
            .copied()
            .or_else(|| fallback(self.name(), ctx, rng))
    }
}

/// Intercept: a random enemy part that cannot act.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterceptTargeting;

impl TargetingStrategy for InterceptTargeting {
    fn name(&self) -> &'static str {
        "intercept"
    }

    fn select(&self, ctx: &StrategyContext<'_>, rng: &mut BattleRng) -> Option<TargetChoice> {
        let passive: Vec<_> = ctx
            .candidate_parts()
            .into_iter()
            .filter(|c| {
                ctx.info
                    .definition(c.entity, c.slot)
                    .is_some_and(|d| !d.category.is_action())
            })
            .collect();
        rng.choose(&passive)
            .copied()
            .or_else(|| fallback(self.name(), ctx, rng))
    }
}

// =============================================================================
// History strategies
// =============================================================================

/// Counter: the robot that last acted on this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterTargeting;

impl TargetingStrategy for CounterTargeting {
    fn name(&self) -> &'static str {
        "counter"
    }

    fn select(&self, ctx: &StrategyContext<'_>, rng: &mut BattleRng) -> Option<TargetChoice> {
        let attacker = ctx
            .info
            .arena()
            .get(ctx.actor)
            .and_then(|e| e.ai.as_ref())
            .and_then(|ai| ai.last_attacker);
        attacker
            .and_then(|id| ctx.random_part_of(id, rng))
            .or_else(|| fallback(self.name(), ctx, rng))
    }
}

/// Guard: the robot that last acted on this robot's leader.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardTargeting;

impl TargetingStrategy for GuardTargeting {
    fn name(&self) -> &'static str {
        "guard"
    }

    fn select(&self, ctx: &StrategyContext<'_>, rng: &mut BattleRng) -> Option<TargetChoice> {
        let arena = ctx.info.arena();
        let attacker = arena
            .get(ctx.actor)
            .and_then(|e| arena.leader(e.team()))
            .and_then(|leader| leader.ai.as_ref())
            .and_then(|ai| ai.last_attacker);
        attacker
            .and_then(|id| ctx.random_part_of(id, rng))
            .or_else(|| fallback(self.name(), ctx, rng))
    }
}

/// Focus: the exact part this robot last hit, while it is still intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusTargeting;

impl TargetingStrategy for FocusTargeting {
    fn name(&self) -> &'static str {
        "focus"
    }

    fn select(&self, ctx: &StrategyContext<'_>, rng: &mut BattleRng) -> Option<TargetChoice> {
        let arena = ctx.info.arena();
        let remembered = arena
            .get(ctx.actor)
            .and_then(|e| e.ai.as_ref())
            .and_then(|ai| ai.last_hit)
            .filter(|hit| {
                ctx.is_candidate(hit.target)
                    && arena
                        .get(hit.target)
                        .is_some_and(|e| !e.is_broken() && e.has_working_part(hit.slot))
            });
        remembered
            .map(|hit| TargetChoice {
                entity: hit.target,
                slot: hit.slot,
            })
            .or_else(|| fallback(self.name(), ctx, rng))
    }
}

/// Assist: the part an ally hit most recently, while it is still intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssistTargeting;

impl TargetingStrategy for AssistTargeting {
    fn name(&self) -> &'static str {
        "assist"
    }

    fn select(&self, ctx: &StrategyContext<'_>, rng: &mut BattleRng) -> Option<TargetChoice> {
        let arena = ctx.info.arena();
        let Some(actor) = arena.get(ctx.actor) else {
            return fallback(self.name(), ctx, rng);
        };
        let mut latest: Option<LastHit> = None;
        for ally in arena.team_members(actor.team()) {
            if ally.id() == ctx.actor {
                continue;
            }
            let Some(hit) = ally.ai.as_ref().and_then(|ai| ai.last_hit) else {
                continue;
            };
            if latest.map_or(true, |l| hit.tick > l.tick) {
                latest = Some(hit);
            }
        }
        latest
            .filter(|hit| {
                ctx.is_candidate(hit.target)
                    && arena
                        .get(hit.target)
                        .is_some_and(|e| !e.is_broken() && e.has_working_part(hit.slot))
            })
            .map(|hit| TargetChoice {
                entity: hit.target,
                slot: hit.slot,
            })
            .or_else(|| fallback(self.name(), ctx, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Personality;
    use crate::arena::Arena;
    use crate::data::GameData;
    use crate::entity::{RobotState, TeamId};
    use crate::targeting::targetable_enemies;
    use crate::tests::helpers::{
        break_part, set_armor, set_personality, spawn_robot, spawn_standard, test_data, BOOSTER,
        HEAD, JAMMER, LEGS,
    };

    struct Fixture {
        arena: Arena,
        data: GameData,
        actor: EntityId,
        ally: EntityId,
        enemy_leader: EntityId,
        enemy: EntityId,
    }

    impl Fixture {
        fn new() -> Self {
            let data = test_data();
            let mut arena = Arena::new();
            let actor = spawn_standard(&mut arena, &data, "actor", TeamId::One, false, 2);
            let ally = spawn_standard(&mut arena, &data, "ally", TeamId::One, true, 1);
            let enemy = spawn_standard(&mut arena, &data, "enemy", TeamId::Two, false, 2);
            let enemy_leader = spawn_robot(
                &mut arena,
                &data,
                "boss",
                TeamId::Two,
                true,
                1,
                [HEAD, JAMMER, BOOSTER, LEGS],
            );
            set_personality(&mut arena, actor, Personality::Joker);
            set_personality(&mut arena, ally, Personality::Joker);
            Self {
                arena,
                data,
                actor,
                ally,
                enemy_leader,
                enemy,
            }
        }

        fn select(&self, strategy: &dyn TargetingStrategy, seed: u64) -> Option<TargetChoice> {
            let candidates = targetable_enemies(&self.arena, self.actor);
            let ctx = StrategyContext {
                info: PartInfo::new(&self.arena, &self.data),
                actor: self.actor,
                candidates: &candidates,
            };
            strategy.select(&ctx, &mut BattleRng::new(seed))
        }

        fn memory(&mut self, id: EntityId) -> &mut crate::entity::AiMemory {
            self.arena.get_mut(id).unwrap().ai.as_mut().unwrap()
        }
    }

    mod stateless_tests {
        use super::*;

        #[test]
        fn random_only_picks_intact_enemy_parts() {
            let mut f = Fixture::new();
            for slot in PartSlot::ALL {
                break_part(&mut f.arena, f.enemy, slot);
            }
            f.arena.get_mut(f.enemy).unwrap().state = RobotState::Broken;
            break_part(&mut f.arena, f.enemy_leader, PartSlot::Head);
            for seed in 0..30 {
                let choice = f.select(&RandomTargeting, seed).unwrap();
                assert_eq!(choice.entity, f.enemy_leader);
                assert_ne!(choice.slot, PartSlot::Head);
            }
        }

        #[test]
        fn random_with_no_candidates_is_none() {
            let f = Fixture::new();
            let ctx = StrategyContext {
                info: PartInfo::new(&f.arena, &f.data),
                actor: f.actor,
                candidates: &[],
            };
            assert!(RandomTargeting.select(&ctx, &mut BattleRng::new(1)).is_none());
        }

        #[test]
        fn hunter_picks_lowest_armor() {
            let mut f = Fixture::new();
            set_armor(&mut f.arena, f.enemy, PartSlot::LeftArm, 3);
            let choice = f.select(&LowestArmorTargeting, 0).unwrap();
            assert_eq!(choice, TargetChoice { entity: f.enemy, slot: PartSlot::LeftArm });
        }

        #[test]
        fn crusher_picks_highest_armor_first_on_ties() {
            let f = Fixture::new();
            // Both heads and both legs sit at 20; the leader comes first in draw order.
            let choice = f.select(&HighestArmorTargeting, 0).unwrap();
            assert_eq!(choice, TargetChoice { entity: f.enemy_leader, slot: PartSlot::Head });
        }

        #[test]
        fn leader_targets_enemy_leader() {
            let f = Fixture::new();
            for seed in 0..10 {
                assert_eq!(f.select(&LeaderTargeting, seed).unwrap().entity, f.enemy_leader);
            }
        }

        #[test]
        fn chase_prefers_legs_then_other_parts() {
            let mut f = Fixture::new();
            assert_eq!(f.select(&ChaseTargeting, 0).unwrap().slot, PartSlot::Legs);
            break_part(&mut f.arena, f.enemy, PartSlot::Legs);
            break_part(&mut f.arena, f.enemy_leader, PartSlot::Legs);
            for seed in 0..10 {
                assert_ne!(f.select(&ChaseTargeting, seed).unwrap().slot, PartSlot::Legs);
            }
        }

        #[test]
        fn duel_picks_action_arms() {
            let f = Fixture::new();
            for seed in 0..20 {
                let choice = f.select(&DuelTargeting, seed).unwrap();
                assert!(choice.slot.is_arm());
                // The boss's arms are intervention parts and count as action parts too.
                let definition = f
                    .data
                    .part(
                        &f.arena
                            .get(choice.entity)
                            .unwrap()
                            .part(choice.slot)
                            .unwrap()
                            .definition_id,
                    )
                    .unwrap();
                assert!(definition.category.is_action());
            }
        }

        #[test]
        fn intercept_picks_passive_parts() {
            let f = Fixture::new();
            for seed in 0..20 {
                let slot = f.select(&InterceptTargeting, seed).unwrap().slot;
                assert!(matches!(slot, PartSlot::Head | PartSlot::Legs));
            }
        }
    }

    mod history_tests {
        use super::*;

        #[test]
        fn counter_targets_last_attacker() {
            let mut f = Fixture::new();
            let enemy = f.enemy;
            f.memory(f.actor).last_attacker = Some(enemy);
            for seed in 0..10 {
                assert_eq!(f.select(&CounterTargeting, seed).unwrap().entity, enemy);
            }
        }

        #[test]
        fn counter_revalidates_broken_attacker() {
            let mut f = Fixture::new();
            let enemy = f.enemy;
            f.memory(f.actor).last_attacker = Some(enemy);
            f.arena.get_mut(enemy).unwrap().state = RobotState::Broken;
            for seed in 0..10 {
                assert_eq!(f.select(&CounterTargeting, seed).unwrap().entity, f.enemy_leader);
            }
        }

        #[test]
        fn guard_targets_leaders_attacker() {
            let mut f = Fixture::new();
            let enemy = f.enemy;
            f.memory(f.ally).last_attacker = Some(enemy);
            assert_eq!(f.select(&GuardTargeting, 3).unwrap().entity, enemy);
        }

        #[test]
        fn focus_repeats_last_hit_while_intact() {
            let mut f = Fixture::new();
            let hit = LastHit {
                target: f.enemy,
                slot: PartSlot::RightArm,
                tick: 4,
            };
            f.memory(f.actor).last_hit = Some(hit);
            assert_eq!(
                f.select(&FocusTargeting, 0),
                Some(TargetChoice { entity: f.enemy, slot: PartSlot::RightArm })
            );
            break_part(&mut f.arena, f.enemy, PartSlot::RightArm);
            let choice = f.select(&FocusTargeting, 0).unwrap();
            assert!(!(choice.entity == f.enemy && choice.slot == PartSlot::RightArm));
        }

        #[test]
        fn assist_follows_most_recent_ally_hit() {
            let mut f = Fixture::new();
            let third = spawn_standard(&mut f.arena, &f.data, "third", TeamId::One, false, 3);
            set_personality(&mut f.arena, third, Personality::Joker);
            let (enemy, boss) = (f.enemy, f.enemy_leader);
            f.memory(f.ally).last_hit = Some(LastHit {
                target: enemy,
                slot: PartSlot::Legs,
                tick: 10,
            });
            f.memory(third).last_hit = Some(LastHit {
                target: boss,
                slot: PartSlot::Head,
                tick: 12,
            });
            assert_eq!(
                f.select(&AssistTargeting, 0),
                Some(TargetChoice { entity: boss, slot: PartSlot::Head })
            );
        }

        #[test]
        fn history_outside_candidates_falls_back() {
            let mut f = Fixture::new();
            let enemy = f.enemy;
            f.memory(f.actor).last_attacker = Some(enemy);
            let candidates = [f.enemy_leader];
            let ctx = StrategyContext {
                info: PartInfo::new(&f.arena, &f.data),
                actor: f.actor,
                candidates: &candidates,
            };
            let choice = CounterTargeting.select(&ctx, &mut BattleRng::new(0)).unwrap();
            assert_eq!(choice.entity, f.enemy_leader);
        }
    }
}
