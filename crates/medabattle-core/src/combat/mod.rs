//! Combat math and damage application.
//!
//! The calculators are pure functions of the [`BattleConfig`](crate::config::BattleConfig)
//! and the battle's random source; all clamping happens here rather than in
//! the stat providers. [`apply_damage`] is the only place part armor goes down.

mod calculator;
mod damage;

pub use calculator::{
    critical_chance, defense_chance, defended_damage, floor_damage, hit_chance, roll_damage,
    DamageInput, DamageRoll,
};
pub use damage::{apply_damage, DamageOutcome};
