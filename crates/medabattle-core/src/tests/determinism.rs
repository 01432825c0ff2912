//! Determinism verification tests.
//!
//! These tests verify that a battle produces identical results when:
//! - Started with the same seed
//! - Given identical data, configuration and inputs
//!
//! This is critical for:
//! - Replays
//! - Batch balance runs
//! - Debug reproducibility

use std::sync::Arc;

use crate::ai::Personality;
use crate::config::BattleConfig;
use crate::data::GameData;
use crate::entity::TeamId;
use crate::event::GameEvent;
use crate::messages::MessageCatalog;
use crate::simulation::{BattleSnapshot, Simulation};

use super::helpers::{loadout, test_data, BOOSTER, HEAD, JAMMER, LEGS, MEDAL, RIFLE, SWORD};

// =============================================================================
// Helpers
// =============================================================================

/// Three-a-side battle using every action kind in the test catalog.
fn three_vs_three() -> GameData {
    let mut data = test_data();
    let brawler = [HEAD, RIFLE, SWORD, LEGS];
    let support = [HEAD, RIFLE, BOOSTER, LEGS];
    let jammer = [HEAD, JAMMER, SWORD, LEGS];
    for (team, prefix) in [(TeamId::One, "one"), (TeamId::Two, "two")] {
        data.push_loadout(loadout(&format!("{prefix}-leader"), team, true, 1, brawler));
        data.push_loadout(loadout(&format!("{prefix}-support"), team, false, 2, support));
        data.push_loadout(loadout(&format!("{prefix}-jammer"), team, false, 3, jammer));
    }
    data
}

fn run_battle(data: &Arc<GameData>, seed: u64) -> (BattleSnapshot, Vec<GameEvent>) {
    let mut sim = Simulation::setup(
        Arc::clone(data),
        Arc::new(MessageCatalog::default()),
        BattleConfig::headless(),
        seed,
    )
    .unwrap();
    sim.run_to_end(50_000);
    (sim.snapshot(), sim.take_events())
}

/// Runs `ticks` updates and records a snapshot after each.
fn trace(data: &Arc<GameData>, seed: u64, ticks: usize) -> Vec<BattleSnapshot> {
    let mut sim = Simulation::setup(
        Arc::clone(data),
        Arc::new(MessageCatalog::default()),
        BattleConfig::headless(),
        seed,
    )
    .unwrap();
    (0..ticks)
        .map(|_| {
            sim.update();
            sim.snapshot()
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn same_seed_same_battle() {
    let data = Arc::new(three_vs_three());
    let (first, first_events) = run_battle(&data, 42);
    let (second, second_events) = run_battle(&data, 42);
    assert_eq!(first, second);
    assert_eq!(first_events, second_events);
}

#[test]
fn same_seed_same_trace() {
    let data = Arc::new(three_vs_three());
    let first = trace(&data, 7, 300);
    let second = trace(&data, 7, 300);
    for (tick, (a, b)) in first.iter().zip(&second).enumerate() {
        assert_eq!(a, b, "diverged at tick {tick}");
    }
}

#[test]
fn snapshots_serialize_identically() {
    let data = Arc::new(three_vs_three());
    let (first, _) = run_battle(&data, 99);
    let (second, _) = run_battle(&data, 99);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn every_personality_finishes_deterministically() {
    for personality in Personality::ALL {
        let mut data = test_data();
        let mut medal = data.medal(MEDAL).unwrap().clone();
        medal.personality = personality.key().to_string();
        data.insert_medal(medal);
        data.push_loadout(loadout("a", TeamId::One, true, 1, [HEAD, RIFLE, SWORD, LEGS]));
        data.push_loadout(loadout("b", TeamId::Two, true, 1, [HEAD, JAMMER, BOOSTER, LEGS]));
        let data = Arc::new(data);

        let (first, _) = run_battle(&data, 5);
        let (second, _) = run_battle(&data, 5);
        assert_eq!(first.winner, Some(TeamId::One), "{personality} never finished");
        assert_eq!(first, second, "{personality} diverged");
    }
}
