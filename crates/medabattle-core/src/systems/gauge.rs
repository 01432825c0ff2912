//! Gauge scheduler: durations, state transitions and ready-queue enrollment.
//!
//! ```text
//! idle --start_charge--> charging --gauge full--> ready --dispatch--> cooldown
//!   ^                                                                    |
//!   +---------------------------- gauge full ----------------------------+
//!
//! any state --head broken--> broken (terminal)
//! ```
//!
//! Only charging and cooldown robots advance, one progress step per tick.

use std::collections::HashMap;

use tracing::debug;

use crate::arena::Arena;
use crate::config::BattleConfig;
use crate::data::GameData;
use crate::entity::components::{ActionIntent, ActionTarget};
use crate::entity::{EntityId, RobotState};
use crate::part_info::PartInfo;

/// Base seconds used when a part's charge or cooldown is zero or negative.
const MIN_BASE_SECONDS: f64 = 0.1;

/// Ticks an action phase lasts.
///
/// `max(1, B * 60 / (speed * (1 + P * rate)))` with `B` the part's charge
/// or cooldown seconds and `P` the actor's propulsion.
#[must_use]
pub fn duration_ticks(config: &BattleConfig, base_seconds: i32, propulsion: i32) -> f64 {
    let base = if base_seconds <= 0 {
        MIN_BASE_SECONDS
    } else {
        f64::from(base_seconds)
    };
    let divisor = config.game_speed_multiplier
        * (1.0 + f64::from(propulsion) * config.propulsion_effect_rate);
    let ticks = base * 60.0 / divisor;
    if ticks.is_finite() {
        ticks.max(1.0)
    } else {
        1.0
    }
}

/// Moves a robot into `charging` for `total` ticks.
pub fn begin_charge(arena: &mut Arena, id: EntityId, total: f64) {
    if let Some(entity) = arena.get_mut(id) {
        debug!(entity = %id, from = ?entity.state, total, "charging");
        entity.state = RobotState::Charging;
        entity.gauge.start(total);
    }
}

/// Moves a robot into `cooldown` for `total` ticks.
pub fn begin_cooldown(arena: &mut Arena, id: EntityId, total: f64) {
    arena.action_queue.remove(id);
    if let Some(entity) = arena.get_mut(id) {
        if entity.is_broken() {
            return;
        }
        debug!(entity = %id, from = ?entity.state, total, "cooldown");
        entity.state = RobotState::Cooldown;
        entity.gauge.start(total);
    }
}

/// Moves a robot into the terminal `broken` state.
///
/// Clears its gauge, intent and target and drops it from the ready queue.
pub fn mark_broken(arena: &mut Arena, id: EntityId) {
    arena.action_queue.remove(id);
    if let Some(entity) = arena.get_mut(id) {
        if entity.is_broken() {
            return;
        }
        debug!(entity = %id, from = ?entity.state, "broken");
        entity.state = RobotState::Broken;
        entity.gauge.clear();
        entity.intent = ActionIntent::default();
        entity.target = ActionTarget::default();
    }
}

/// Advances every charging and cooldown gauge by one tick.
///
/// Completed charges become `ready` and are appended to the ready queue in
/// entity order. Completed cooldowns return to `idle`. Robots under a
/// charge-stop effect do not advance. Returns the newly ready robots.
pub fn advance_gauges(arena: &mut Arena) -> Vec<EntityId> {
    let mut ready = Vec::new();
    for entity in arena.entities_sorted_mut() {
        if entity.effects.has_charge_stop() {
            continue;
        }
        match entity.state {
            RobotState::Charging => {
                if entity.gauge.advance() {
                    debug!(entity = %entity.id(), "ready");
                    entity.state = RobotState::Ready;
                    entity.gauge.fill();
                    ready.push(entity.id());
                }
            }
            RobotState::Cooldown => {
                if entity.gauge.advance() {
                    debug!(entity = %entity.id(), "idle");
                    entity.state = RobotState::Idle;
                    entity.gauge.clear();
                    entity.intent = ActionIntent::default();
                    entity.target = ActionTarget::default();
                }
            }
            RobotState::Idle | RobotState::Ready | RobotState::Broken => {}
        }
    }
    for id in &ready {
        arena.action_queue.enqueue(*id);
    }
    ready
}

/// Stable-sorts the ready queue by actor propulsion, fastest first.
pub fn sort_ready_queue(arena: &mut Arena, data: &GameData) {
    let propulsion: HashMap<EntityId, i32> = {
        let info = PartInfo::new(arena, data);
        arena
            .action_queue
            .as_slice()
            .iter()
            .map(|id| (*id, info.overall_propulsion(*id)))
            .collect()
    };
    arena
        .action_queue
        .sort_descending_by(|id| propulsion.get(&id).copied().unwrap_or(0));
}
