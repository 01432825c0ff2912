//! Hit, defense, critical and damage formulas.

use crate::config::BattleConfig;
use crate::rng::BattleRng;

/// Chance in percent that an attack connects.
#[must_use]
pub fn hit_chance(config: &BattleConfig, success: f64, evasion: f64) -> f64 {
    config.hit.chance(success - evasion)
}

/// Chance in percent that the defender blocks with a part.
#[must_use]
pub fn defense_chance(config: &BattleConfig, defense_rate: f64, success: f64) -> f64 {
    config.defense.chance(defense_rate - success)
}

/// Chance in percent of a critical hit.
#[must_use]
pub fn critical_chance(config: &BattleConfig, success: f64, trait_bonus: f64) -> f64 {
    let c = &config.critical;
    (c.base + success * c.success_rate_factor + trait_bonus).clamp(c.min, c.max)
}

/// Floors a damage value to an integer of at least 1.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn floor_damage(raw: f64) -> i32 {
    if raw.is_nan() {
        return 1;
    }
    raw.floor().clamp(1.0, f64::from(i32::MAX)) as i32
}

/// Damage that gets through a successful defense.
#[must_use]
pub fn defended_damage(raw: i32, part_defense: i32) -> i32 {
    raw.saturating_sub(part_defense).max(1)
}

/// Inputs of a damage roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageInput {
    /// Attacker success rate.
    pub success: f64,
    /// Target evasion rate.
    pub evasion: f64,
    /// Attacker power, bonuses included.
    pub power: f64,
    /// Critical bonus of the acting trait.
    pub critical_bonus: f64,
}

/// Outcome of a damage roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRoll {
    /// Damage before any defense.
    pub damage: i32,
    /// Whether the roll was critical.
    pub is_critical: bool,
}

/// Rolls critical and variance, then computes raw damage.
///
/// A critical ignores evasion for this roll only.
pub fn roll_damage(config: &BattleConfig, input: DamageInput, rng: &mut BattleRng) -> DamageRoll {
    let is_critical = rng.check(critical_chance(config, input.success, input.critical_bonus));
    let evasion = if is_critical { 0.0 } else { input.evasion };
    let base = (input.success - evasion) / config.damage.adjustment_factor + input.power;
    let variance = rng.uniform(config.damage.variance_min, config.damage.variance_max);
    DamageRoll {
        damage: floor_damage(base * variance),
        is_critical,
    }
}
