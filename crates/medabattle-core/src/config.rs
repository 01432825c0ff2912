//! Battle configuration: formula constants, scheduler pacing and lane geometry.
//!
//! Every constant the calculators and the scheduler read lives here so a host
//! can tune balance without touching code. All sections default individually,
//! so a JSON override only needs the keys it changes.
//!
//! # Example
//!
//! ```
//! use medabattle_core::config::BattleConfig;
//!
//! let config = BattleConfig::from_json(r#"{ "game_speed_multiplier": 25.0 }"#).unwrap();
//! assert_eq!(config.game_speed_multiplier, 25.0);
//! assert_eq!(config.hit.base, 50.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::entity::TeamId;
use crate::error::{BattleError, Result};

/// A chance formula of the form `base + delta`, clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChanceParams {
    /// Chance when the compared rates are equal.
    pub base: f64,
    /// Lower clamp.
    pub min: f64,
    /// Upper clamp.
    pub max: f64,
}

impl ChanceParams {
    /// Clamps `base + delta` into `[min, max]`.
    #[must_use]
    pub fn chance(&self, delta: f64) -> f64 {
        (self.base + delta).clamp(self.min, self.max)
    }
}

/// Critical hit constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CriticalParams {
    /// Flat critical chance.
    pub base: f64,
    /// Fraction of the success rate added to the chance.
    pub success_rate_factor: f64,
    /// Lower clamp.
    pub min: f64,
    /// Upper clamp.
    pub max: f64,
}

/// Damage roll constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DamageParams {
    /// Divisor applied to `success - evasion` before power is added.
    pub adjustment_factor: f64,
    /// Lower bound of the uniform variance factor.
    pub variance_min: f64,
    /// Upper bound of the uniform variance factor.
    pub variance_max: f64,
}

/// Horizontal lane anchors, as fractions of the battlefield width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaneParams {
    /// Resting position of team one.
    pub team_one_home: f32,
    /// Resting position of team two.
    pub team_two_home: f32,
    /// Where team one stands when its charge completes.
    pub team_one_action_line: f32,
    /// Where team two stands when its charge completes.
    pub team_two_action_line: f32,
}

impl LaneParams {
    /// Returns `(home, action_line)` for a team.
    #[must_use]
    pub const fn anchors(&self, team: TeamId) -> (f32, f32) {
        match team {
            TeamId::One => (self.team_one_home, self.team_one_action_line),
            TeamId::Two => (self.team_two_home, self.team_two_action_line),
        }
    }
}

/// How the core cooperates with a presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    /// Pause for animations and message windows until the host acknowledges them.
    #[default]
    Interactive,
    /// Emit presentation events but never wait for them.
    Headless,
}

/// Complete battle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BattleConfig {
    /// Global pacing divisor for charge and cooldown durations.
    pub game_speed_multiplier: f64,
    /// How strongly propulsion shortens durations.
    pub propulsion_effect_rate: f64,
    /// Hit check.
    pub hit: ChanceParams,
    /// Defense check.
    pub defense: ChanceParams,
    /// Critical check.
    pub critical: CriticalParams,
    /// Damage roll.
    pub damage: DamageParams,
    /// Cooldown applied to an actor whose dispatch failed.
    pub failure_cooldown_ticks: u32,
    /// Lane geometry for proximity.
    pub lane: LaneParams,
    /// Interactive or headless pacing.
    pub presentation: Presentation,
    /// Team whose robots wait for player input, if any.
    pub player_team: Option<TeamId>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            game_speed_multiplier: 50.0,
            propulsion_effect_rate: 0.01,
            hit: ChanceParams {
                base: 50.0,
                min: 10.0,
                max: 95.0,
            },
            defense: ChanceParams {
                base: 10.0,
                min: 0.0,
                max: 90.0,
            },
            critical: CriticalParams {
                base: 5.0,
                success_rate_factor: 0.1,
                min: 0.0,
                max: 50.0,
            },
            damage: DamageParams {
                adjustment_factor: 4.0,
                variance_min: 0.9,
                variance_max: 1.1,
            },
            failure_cooldown_ticks: 1,
            lane: LaneParams {
                team_one_home: 0.05,
                team_two_home: 0.95,
                team_one_action_line: 0.35,
                team_two_action_line: 0.65,
            },
            presentation: Presentation::Interactive,
            player_team: None,
        }
    }
}

impl BattleConfig {
    /// Parses a configuration document; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| BattleError::Json {
            document: "battle config",
            source,
        })
    }

    /// Default configuration that never waits on a presentation layer.
    #[must_use]
    pub fn headless() -> Self {
        Self {
            presentation: Presentation::Headless,
            ..Self::default()
        }
    }
}
