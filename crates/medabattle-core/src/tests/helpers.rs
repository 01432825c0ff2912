//! Test helper functions for setting up battles and robots.
//!
//! This module provides factory functions and setup utilities that make
//! writing tests more ergonomic and consistent. Every robot built here uses
//! the small part catalog from [`test_data`].

use crate::action::{ActionContext, ActionHandler, ActionResult};
use crate::ai::{Personality, StrategyRegistry};
use crate::arena::Arena;
use crate::config::{BattleConfig, ChanceParams};
use crate::data::{
    GameData, MedalDefinition, PartCategory, PartDefinition, PartStats, PartTrait, RobotLoadout,
};
use crate::entity::components::{ActionTarget, AiMemory, PartInstance, Settings};
use crate::entity::{EntityId, PartSlot, TargetPolicy, TeamId};
use crate::rng::BattleRng;

// =============================================================================
// Part catalog
// =============================================================================

/// Plain head, 20 armor.
pub const HEAD: &str = "test-head";
/// Ranged shoot arm: power 20, accuracy 40, charge 2, cooldown 2.
pub const RIFLE: &str = "test-rifle";
/// Melee strike arm: power 25, accuracy 30, charge 2, cooldown 2.
pub const SWORD: &str = "test-sword";
/// Support arm: power 20, charge 1, cooldown 1.
pub const BOOSTER: &str = "test-booster";
/// Obstruct arm: charge 1, cooldown 1.
pub const JAMMER: &str = "test-jammer";
/// Legs: propulsion 10, mobility 10, defense 5.
pub const LEGS: &str = "test-legs";
/// Joker medal.
pub const MEDAL: &str = "test-medal";

/// Builds stats from the commonly varied fields; the rest default.
pub fn stats(max_armor: i32, power: i32, accuracy: i32, charge: i32, cooldown: i32) -> PartStats {
    PartStats {
        max_armor,
        power,
        accuracy,
        charge,
        cooldown,
        ..PartStats::default()
    }
}

/// Builds a part definition named after its id.
pub fn part(
    id: &str,
    part_type: PartSlot,
    category: PartCategory,
    action_trait: PartTrait,
    stats: PartStats,
) -> PartDefinition {
    PartDefinition {
        id: id.to_string(),
        name: id.to_string(),
        part_type,
        category,
        action_trait,
        weapon_type: String::new(),
        stats,
    }
}

/// Data set with the standard test parts and medal.
pub fn test_data() -> GameData {
    let mut data = GameData::new();
    data.insert_part(part(
        HEAD,
        PartSlot::Head,
        PartCategory::None,
        PartTrait::None,
        stats(20, 0, 0, 1, 1),
    ));
    data.insert_part(part(
        RIFLE,
        PartSlot::RightArm,
        PartCategory::Ranged,
        PartTrait::Shoot,
        stats(15, 20, 40, 2, 2),
    ));
    data.insert_part(part(
        SWORD,
        PartSlot::LeftArm,
        PartCategory::Melee,
        PartTrait::Strike,
        stats(15, 25, 30, 2, 2),
    ));
    data.insert_part(part(
        BOOSTER,
        PartSlot::LeftArm,
        PartCategory::Intervention,
        PartTrait::Support,
        stats(10, 20, 0, 1, 1),
    ));
    data.insert_part(part(
        JAMMER,
        PartSlot::RightArm,
        PartCategory::Intervention,
        PartTrait::Obstruct,
        stats(10, 0, 0, 1, 1),
    ));
    data.insert_part(part(
        LEGS,
        PartSlot::Legs,
        PartCategory::None,
        PartTrait::None,
        PartStats {
            max_armor: 20,
            propulsion: 10,
            mobility: 10,
            defense: 5,
            ..PartStats::default()
        },
    ));
    data.insert_medal(MedalDefinition {
        id: MEDAL.to_string(),
        name: "Test".to_string(),
        personality: "joker".to_string(),
        skill_level: 1,
    });
    data
}

// =============================================================================
// Robots
// =============================================================================

/// Spawns a player-controlled robot wearing `parts` (head, right arm, left
/// arm, legs). Armor comes from the definitions in `data`.
pub fn spawn_robot(
    arena: &mut Arena,
    data: &GameData,
    name: &str,
    team: TeamId,
    leader: bool,
    draw_index: u32,
    parts: [&str; 4],
) -> EntityId {
    let id = arena.spawn(Settings::new(name, name, team, leader, draw_index));
    let robot = arena.get_mut(id).unwrap();
    for (slot, part_id) in PartSlot::ALL.into_iter().zip(parts) {
        let armor = data.part(part_id).map_or(1, |d| d.stats.max_armor);
        robot.parts.insert(slot, PartInstance::new(part_id, armor));
    }
    id
}

/// Spawns a robot with head, rifle, sword and legs.
pub fn spawn_standard(
    arena: &mut Arena,
    data: &GameData,
    name: &str,
    team: TeamId,
    leader: bool,
    draw_index: u32,
) -> EntityId {
    spawn_robot(
        arena,
        data,
        name,
        team,
        leader,
        draw_index,
        [HEAD, RIFLE, SWORD, LEGS],
    )
}

/// Gives a robot AI memory with a personality.
pub fn set_personality(arena: &mut Arena, id: EntityId, personality: Personality) {
    arena.get_mut(id).unwrap().ai = Some(AiMemory::new(personality));
}

/// Sets the current armor of a part, keeping the broken flag consistent.
pub fn set_armor(arena: &mut Arena, id: EntityId, slot: PartSlot, armor: i32) {
    let part = arena.get_mut(id).unwrap().parts.get_mut(&slot).unwrap();
    part.current_armor = armor.clamp(0, part.max_armor);
    part.is_broken = part.current_armor == 0;
}

/// Breaks a part without going through damage resolution.
pub fn break_part(arena: &mut Arena, id: EntityId, slot: PartSlot) {
    set_armor(arena, id, slot, 0);
}

/// Returns the current armor of a part.
pub fn armor(arena: &Arena, id: EntityId, slot: PartSlot) -> i32 {
    arena.get(id).unwrap().part(slot).unwrap().current_armor
}

/// Points a robot's stored target at an enemy part.
pub fn aim(arena: &mut Arena, actor: EntityId, target: EntityId, slot: PartSlot) {
    arena.get_mut(actor).unwrap().target = ActionTarget {
        policy: TargetPolicy::Preselected,
        entity: Some(target),
        slot: Some(slot),
    };
}

/// Runs one handler for `actor`'s part in `slot` with a fresh random source.
pub fn run_handler(
    handler: &dyn ActionHandler,
    arena: &mut Arena,
    data: &GameData,
    config: &BattleConfig,
    actor: EntityId,
    slot: PartSlot,
    seed: u64,
) -> ActionResult {
    let part_id = arena.get(actor).unwrap().part(slot).unwrap().definition_id.clone();
    let part = data.part(&part_id).unwrap();
    let strategies = StrategyRegistry::default();
    let mut rng = BattleRng::new(seed);
    let mut ctx = ActionContext {
        arena,
        data,
        config,
        strategies: &strategies,
        rng: &mut rng,
        actor,
        slot,
        part,
    };
    handler.execute(&mut ctx)
}

/// Builds a loadout row.
pub fn loadout(
    id: &str,
    team: TeamId,
    leader: bool,
    draw_index: u32,
    parts: [&str; 4],
) -> RobotLoadout {
    RobotLoadout {
        id: id.to_string(),
        name: id.to_string(),
        team,
        is_leader: leader,
        draw_index,
        medal_id: MEDAL.to_string(),
        parts: PartSlot::ALL
            .into_iter()
            .zip(parts)
            .map(|(slot, p)| (slot, p.to_string()))
            .collect(),
    }
}

// =============================================================================
// Configurations
// =============================================================================

/// Headless config where every attack hits, no defense succeeds and no
/// critical happens.
pub fn sure_hit_config() -> BattleConfig {
    let mut config = BattleConfig::headless();
    config.hit = ChanceParams {
        base: 100.0,
        min: 100.0,
        max: 100.0,
    };
    config.defense = ChanceParams {
        base: 0.0,
        min: 0.0,
        max: 0.0,
    };
    config.critical.max = 0.0;
    config
}

/// Like [`sure_hit_config`] but every defense check succeeds.
pub fn sure_defense_config() -> BattleConfig {
    let mut config = sure_hit_config();
    config.defense = ChanceParams {
        base: 100.0,
        min: 100.0,
        max: 100.0,
    };
    config
}

/// Headless config where every attack misses.
pub fn sure_miss_config() -> BattleConfig {
    let mut config = sure_hit_config();
    config.hit = ChanceParams {
        base: 0.0,
        min: 0.0,
        max: 0.0,
    };
    config
}
