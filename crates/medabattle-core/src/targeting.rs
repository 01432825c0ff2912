//! Target selection: enemy enumeration, defender choice, lane proximity.
//!
//! Every enumeration here is ordered by draw index (then entity ID) so map
//! iteration never leaks into outcomes.

use glam::Vec2;

use crate::arena::Arena;
use crate::config::LaneParams;
use crate::entity::{Entity, EntityId, PartSlot, RobotState};
use crate::rng::BattleRng;

/// Slots that may step in front of an attack, in tie-break order.
const DEFENDER_SLOTS: [PartSlot; 3] = [PartSlot::RightArm, PartSlot::LeftArm, PartSlot::Legs];

/// Returns `true` if the robot exists and is not broken.
#[must_use]
pub fn is_valid_target(arena: &Arena, id: EntityId) -> bool {
    arena.is_active(id)
}

/// Returns `true` if the robot is a valid target and the part is intact.
#[must_use]
pub fn is_valid_target_part(arena: &Arena, id: EntityId, slot: PartSlot) -> bool {
    arena
        .get(id)
        .is_some_and(|e| !e.is_broken() && e.has_working_part(slot))
}

/// Non-broken robots of the opposing team, ordered by draw index.
#[must_use]
pub fn targetable_enemies(arena: &Arena, actor: EntityId) -> Vec<EntityId> {
    let Some(actor) = arena.get(actor) else {
        return Vec::new();
    };
    let mut enemies: Vec<&Entity> = arena
        .team_members(actor.team().opponent())
        .filter(|e| !e.is_broken())
        .collect();
    enemies.sort_by_key(|e| (e.settings.draw_index, e.id()));
    enemies.into_iter().map(Entity::id).collect()
}

/// Picks the part that takes a defended hit.
///
/// The intact arm or legs with the most armor wins, earlier slots winning
/// ties. Without one the head defends if intact.
#[must_use]
pub fn select_defender(arena: &Arena, target: EntityId) -> Option<PartSlot> {
    let entity = arena.get(target)?;
    let mut best: Option<(PartSlot, i32)> = None;
    for slot in DEFENDER_SLOTS {
        let Some(part) = entity.part(slot).filter(|p| !p.is_broken) else {
            continue;
        };
        if best.map_or(true, |(_, armor)| part.current_armor > armor) {
            best = Some((slot, part.current_armor));
        }
    }
    best.map(|(slot, _)| slot).or_else(|| {
        entity
            .has_working_part(PartSlot::Head)
            .then_some(PartSlot::Head)
    })
}

/// Uniform choice among the target's intact parts.
pub fn random_part(arena: &Arena, target: EntityId, rng: &mut BattleRng) -> Option<PartSlot> {
    let slots = arena.get(target)?.working_slots();
    rng.choose(&slots).copied()
}

/// Position of a robot on its lane: `x` in `[0, 1]`, `y` the draw index.
///
/// Charging robots walk from home toward their action line, ready robots
/// stand on it and cooling robots walk back.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn lane_position(entity: &Entity, lane: &LaneParams) -> Vec2 {
    let (home, line) = lane.anchors(entity.team());
    let t = (entity.gauge.current / 100.0).clamp(0.0, 1.0) as f32;
    let x = match entity.state {
        RobotState::Idle | RobotState::Broken => home,
        RobotState::Charging => home + (line - home) * t,
        RobotState::Ready => line,
        RobotState::Cooldown => line + (home - line) * t,
    };
    Vec2::new(x, entity.settings.draw_index as f32)
}

/// Enemy whose lane position is horizontally nearest to the actor.
///
/// Ties go to the lower draw index.
#[must_use]
pub fn closest_enemy(arena: &Arena, actor: EntityId, lane: &LaneParams) -> Option<EntityId> {
    let origin = lane_position(arena.get(actor)?, lane).x;
    let mut best: Option<(EntityId, f32)> = None;
    for id in targetable_enemies(arena, actor) {
        let Some(enemy) = arena.get(id) else { continue };
        let distance = (lane_position(enemy, lane).x - origin).abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((id, distance));
        }
    }
    best.map(|(id, _)| id)
}
