//! End-to-end battle scenarios.
//!
//! These tests drive the scheduler, the action pipeline and the
//! [`Simulation`] loop together, the way a host would.

use std::sync::Arc;

use crate::action::{ActionPipeline, AttackHandler, Dispatched, HandlerRegistry, SupportHandler};
use crate::ai::{decide, Personality, StrategyRegistry};
use crate::arena::{Arena, BuffKind};
use crate::config::BattleConfig;
use crate::data::{GameData, PartCategory, PartStats, PartTrait};
use crate::entity::{EntityId, PartSlot, RobotState, TeamId};
use crate::event::{BattleInput, GameEvent, HostModes};
use crate::messages::MessageCatalog;
use crate::part_info::PartInfo;
use crate::rng::BattleRng;
use crate::simulation::Simulation;
use crate::systems::{advance_gauges, begin_charge, mark_broken, sort_ready_queue};

use super::helpers::{
    aim, armor, loadout, part, run_handler, set_armor, set_personality, spawn_robot,
    spawn_standard, stats, sure_defense_config, sure_hit_config, test_data, BOOSTER, HEAD, LEGS,
    RIFLE, SWORD,
};

const CANNON: &str = "scenario-cannon";
const GLASS_HEAD: &str = "scenario-glass-head";
const PLATE: &str = "scenario-plate";
const SLOW_LEGS: &str = "scenario-slow-legs";
const STILL_LEGS: &str = "scenario-still-legs";

/// Test data plus the parts the scenarios need.
fn scenario_data() -> GameData {
    let mut data = test_data();
    data.insert_part(part(
        CANNON,
        PartSlot::RightArm,
        PartCategory::Ranged,
        PartTrait::Shoot,
        stats(10, 100, 50, 1, 1),
    ));
    data.insert_part(part(
        GLASS_HEAD,
        PartSlot::Head,
        PartCategory::None,
        PartTrait::None,
        stats(1, 0, 0, 1, 1),
    ));
    data.insert_part(part(
        PLATE,
        PartSlot::LeftArm,
        PartCategory::None,
        PartTrait::None,
        stats(10, 0, 0, 1, 1),
    ));
    data.insert_part(part(
        SLOW_LEGS,
        PartSlot::Legs,
        PartCategory::None,
        PartTrait::None,
        PartStats {
            max_armor: 20,
            propulsion: 5,
            ..PartStats::default()
        },
    ));
    data.insert_part(part(
        STILL_LEGS,
        PartSlot::Legs,
        PartCategory::None,
        PartTrait::None,
        PartStats {
            max_armor: 10,
            ..PartStats::default()
        },
    ));
    data
}

fn pipeline_run(arena: &mut Arena, data: &GameData, config: &BattleConfig) -> Option<Dispatched> {
    let strategies = StrategyRegistry::default();
    let handlers = HandlerRegistry::standard();
    let pipeline = ActionPipeline {
        data,
        config,
        strategies: &strategies,
        handlers: &handlers,
    };
    pipeline.dispatch_next(arena, &mut BattleRng::new(11))
}

fn dispatched_actor(outcome: Option<Dispatched>) -> EntityId {
    match outcome {
        Some(Dispatched::Action(result)) => result.actor,
        other => panic!("expected an executed action, got {other:?}"),
    }
}

// =============================================================================
// Literal scenarios
// =============================================================================

#[test]
fn deterministic_one_shot() {
    let mut data = scenario_data();
    data.push_loadout(loadout(
        "attacker",
        TeamId::One,
        true,
        1,
        [HEAD, CANNON, PLATE, STILL_LEGS],
    ));
    data.push_loadout(loadout(
        "defender",
        TeamId::Two,
        true,
        1,
        [GLASS_HEAD, PLATE, PLATE, STILL_LEGS],
    ));
    // Default formulas: the hit, defense and critical rolls all run. Seed 2024
    // lands the shot on the head; other seeds can miss.
    let mut config = BattleConfig::headless();
    config.player_team = Some(TeamId::One);

    let mut sim = Simulation::setup(
        Arc::new(data),
        Arc::new(MessageCatalog::default()),
        config,
        2024,
    )
    .unwrap();
    sim.update();
    assert!(sim.modes().contains(HostModes::ACTION_SELECTION));
    let attacker = sim.pending_players()[0];
    let defender = sim
        .arena()
        .entities_sorted()
        .find(|e| e.team() == TeamId::Two)
        .unwrap()
        .id();
    sim.handle_input(BattleInput::ActionConfirmed {
        actor: attacker,
        slot: PartSlot::RightArm,
        target: Some(defender),
        target_slot: Some(PartSlot::Head),
    })
    .unwrap();

    // 60 / 50 = 1.2 ticks of charge.
    for _ in 0..10 {
        if sim.is_over() {
            break;
        }
        sim.update();
    }

    let events = sim.take_events();
    let results: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::ActionAnimationStarted { result, .. } => Some(result),
            _ => None,
        })
        .collect();
    assert_eq!(results.len(), 1);
    assert!(results[0].damage_dealt >= 1);
    assert!(results[0].target_part_broken);
    let target = sim.arena().get(defender).unwrap();
    assert!(target.part(PartSlot::Head).unwrap().is_broken);
    assert_eq!(target.state, RobotState::Broken);
    assert_eq!(sim.winner(), Some(TeamId::One));
    assert!(events.contains(&GameEvent::GameOver {
        winner: TeamId::One
    }));
}

#[test]
fn propulsion_orders_dispatch() {
    let data = scenario_data();
    let mut arena = Arena::new();
    // B joins the queue first; A's faster legs must still put it in front.
    let slow = [HEAD, RIFLE, SWORD, SLOW_LEGS];
    let b = spawn_robot(&mut arena, &data, "b", TeamId::One, false, 2, slow);
    let a = spawn_standard(&mut arena, &data, "a", TeamId::One, true, 1);
    let enemy = spawn_standard(&mut arena, &data, "enemy", TeamId::Two, true, 1);
    for id in [a, b] {
        aim(&mut arena, id, enemy, PartSlot::Legs);
        arena.get_mut(id).unwrap().intent.selected_slot = Some(PartSlot::RightArm);
        begin_charge(&mut arena, id, 2.0);
    }

    advance_gauges(&mut arena);
    let ready = advance_gauges(&mut arena);
    assert_eq!(ready, vec![b, a]);
    sort_ready_queue(&mut arena, &data);
    assert_eq!(arena.action_queue.as_slice(), &[a, b]);

    let config = sure_hit_config();
    assert_eq!(dispatched_actor(pipeline_run(&mut arena, &data, &config)), a);
    assert_eq!(arena.get(b).unwrap().state, RobotState::Ready);
    assert_eq!(dispatched_actor(pipeline_run(&mut arena, &data, &config)), b);
}

#[test]
fn defense_protects_the_head() {
    let data = scenario_data();
    let mut arena = Arena::new();
    let attacker = spawn_standard(&mut arena, &data, "attacker", TeamId::One, true, 1);
    let defender = spawn_standard(&mut arena, &data, "defender", TeamId::Two, true, 1);
    set_armor(&mut arena, defender, PartSlot::Head, 1);
    set_armor(&mut arena, defender, PartSlot::RightArm, 10);
    set_armor(&mut arena, defender, PartSlot::LeftArm, 10);
    set_armor(&mut arena, defender, PartSlot::Legs, 5);
    aim(&mut arena, attacker, defender, PartSlot::Head);

    let result = run_handler(
        &AttackHandler,
        &mut arena,
        &data,
        &sure_defense_config(),
        attacker,
        PartSlot::RightArm,
        4,
    );
    assert!(result.is_defended);
    // Tied arms resolve to the first in slot order.
    assert_eq!(result.actual_hit_slot, Some(PartSlot::RightArm));
    assert_eq!(armor(&arena, defender, PartSlot::Head), 1);
    assert!(armor(&arena, defender, PartSlot::RightArm) < 10);
    assert_eq!(armor(&arena, defender, PartSlot::LeftArm), 10);
    assert_ne!(arena.get(defender).unwrap().state, RobotState::Broken);
}

#[test]
fn team_accuracy_buffs_do_not_stack() {
    let data = scenario_data();
    let mut arena = Arena::new();
    let parts = [HEAD, RIFLE, BOOSTER, LEGS];
    let s1 = spawn_robot(&mut arena, &data, "s1", TeamId::One, true, 1, parts);
    let s2 = spawn_robot(&mut arena, &data, "s2", TeamId::One, false, 2, parts);
    let config = sure_hit_config();
    for id in [s1, s2] {
        let slot = PartSlot::LeftArm;
        run_handler(&SupportHandler, &mut arena, &data, &config, id, slot, 1);
    }
    assert_eq!(arena.team_buffs.sources(TeamId::One, BuffKind::Accuracy).len(), 2);
    let multiplier = PartInfo::new(&arena, &data).team_accuracy_multiplier(s1);
    assert!((multiplier - 1.2).abs() < 1e-12);
}

#[test]
fn counter_remembers_last_attacker() {
    let data = scenario_data();
    let mut arena = Arena::new();
    let x = spawn_standard(&mut arena, &data, "x", TeamId::One, true, 1);
    let z = spawn_standard(&mut arena, &data, "z", TeamId::One, false, 2);
    let shooter = [HEAD, RIFLE, PLATE, LEGS];
    let y = spawn_robot(&mut arena, &data, "y", TeamId::Two, true, 1, shooter);
    set_personality(&mut arena, y, Personality::Counter);

    aim(&mut arena, x, y, PartSlot::Legs);
    arena.get_mut(x).unwrap().intent.selected_slot = Some(PartSlot::RightArm);
    begin_charge(&mut arena, x, 1.0);
    advance_gauges(&mut arena);
    dispatched_actor(pipeline_run(&mut arena, &data, &sure_hit_config()));
    assert_eq!(arena.get(y).unwrap().ai.as_ref().unwrap().last_attacker, Some(x));

    let strategies = StrategyRegistry::default();
    for seed in 0..8 {
        let decision = decide(
            PartInfo::new(&arena, &data),
            &strategies,
            y,
            &mut BattleRng::new(seed),
        )
        .unwrap();
        assert_eq!(decision.slot, PartSlot::RightArm);
        assert_eq!(decision.target, Some(x));
    }

    mark_broken(&mut arena, x);
    let info = PartInfo::new(&arena, &data);
    let decision = decide(info, &strategies, y, &mut BattleRng::new(3)).unwrap();
    assert_eq!(decision.target, Some(z));
}

#[test]
fn broken_support_part_revokes_its_buff() {
    let data = scenario_data();
    let mut arena = Arena::new();
    let parts = [HEAD, RIFLE, BOOSTER, LEGS];
    let supporter = spawn_robot(&mut arena, &data, "s", TeamId::One, true, 1, parts);
    let enemy = spawn_standard(&mut arena, &data, "e", TeamId::Two, true, 1);
    let config = sure_hit_config();

    let slot = PartSlot::LeftArm;
    run_handler(&SupportHandler, &mut arena, &data, &config, supporter, slot, 1);
    assert!(PartInfo::new(&arena, &data).team_accuracy_multiplier(supporter) > 1.0);

    set_armor(&mut arena, supporter, PartSlot::LeftArm, 1);
    aim(&mut arena, enemy, supporter, PartSlot::LeftArm);
    let slot = PartSlot::RightArm;
    let result = run_handler(&AttackHandler, &mut arena, &data, &config, enemy, slot, 1);
    assert!(result.target_part_broken);
    assert!(arena.team_buffs.is_empty());
    let multiplier = PartInfo::new(&arena, &data).team_accuracy_multiplier(supporter);
    assert!((multiplier - 1.0).abs() < f64::EPSILON);
}

// =============================================================================
// Whole battles
// =============================================================================

fn bundled_data() -> GameData {
    GameData::from_tables(
        include_str!("../../../../data/parts.csv"),
        include_str!("../../../../data/medals.csv"),
        include_str!("../../../../data/loadouts.csv"),
        include_str!("../../../../data/formulas.json"),
    )
    .unwrap()
}

#[test]
fn bundled_data_parses() {
    let data = bundled_data();
    assert!(data.part_count() > 0);
    assert_eq!(data.loadouts().len(), 6);
    for loadout in data.loadouts() {
        assert!(data.medal(&loadout.medal_id).is_some(), "{}", loadout.id);
        for (slot, id) in &loadout.parts {
            let part = data.part(id).unwrap_or_else(|| panic!("{} missing {id}", loadout.id));
            assert_eq!(part.part_type, *slot, "{id}");
        }
    }
    MessageCatalog::from_json(include_str!("../../../../data/messages.json")).unwrap();
}

#[test]
fn invariants_hold_every_tick() {
    let mut sim = Simulation::setup(
        Arc::new(bundled_data()),
        Arc::new(MessageCatalog::default()),
        BattleConfig::headless(),
        77,
    )
    .unwrap();
    let data = sim.data().clone();

    while !sim.is_over() && sim.tick() < 50_000 {
        sim.take_events();
        sim.update();
        let dispatched = sim
            .take_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::ActionAnimationStarted { .. }))
            .count();
        assert!(dispatched <= 1, "tick {} dispatched {dispatched}", sim.tick());

        let arena = sim.arena();
        for robot in arena.entities_sorted() {
            for part in robot.parts.values() {
                let max = data.part(&part.definition_id).unwrap().stats.max_armor;
                assert!((0..=max).contains(&part.current_armor));
                assert_eq!(part.is_broken, part.current_armor == 0);
            }
            let gauge = robot.gauge.current;
            assert!((0.0..=100.0).contains(&gauge));
            match robot.state {
                RobotState::Idle | RobotState::Broken => assert!(gauge.abs() < f64::EPSILON),
                RobotState::Ready => assert!((gauge - 100.0).abs() < f64::EPSILON),
                RobotState::Charging | RobotState::Cooldown => {}
            }
            if robot.is_broken() {
                assert!(!arena.action_queue.contains(robot.id()));
            }
        }
    }
    assert!(sim.is_over());
}
