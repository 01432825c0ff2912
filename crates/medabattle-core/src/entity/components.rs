//! Component structs carried by every robot entity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{EntityId, PartSlot, TeamId};
use crate::ai::Personality;

/// Static identity of a robot, copied from its loadout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Loadout id.
    pub loadout_id: String,
    /// Display name.
    pub name: String,
    /// Side the robot fights on.
    pub team: TeamId,
    /// Whether losing this robot's head loses the battle.
    pub is_leader: bool,
    /// Vertical lane slot, 1-based. Orders targeting enumerations.
    pub draw_index: u32,
}

impl Settings {
    /// Creates settings from their parts.
    #[must_use]
    pub fn new(
        loadout_id: &str,
        name: &str,
        team: TeamId,
        is_leader: bool,
        draw_index: u32,
    ) -> Self {
        Self {
            loadout_id: loadout_id.to_string(),
            name: name.to_string(),
            team,
            is_leader,
            draw_index,
        }
    }
}

/// A live part in a slot.
///
/// Invariants: `0 <= current_armor <= max_armor` and
/// `is_broken == (current_armor == 0)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartInstance {
    /// Id of the static part definition.
    pub definition_id: String,
    /// Remaining armor.
    pub current_armor: i32,
    /// Armor at full health, copied from the definition.
    pub max_armor: i32,
    /// Set when armor reaches zero.
    pub is_broken: bool,
}

impl PartInstance {
    /// Creates a part at full armor.
    #[must_use]
    pub fn new(definition_id: &str, max_armor: i32) -> Self {
        let max_armor = max_armor.max(0);
        Self {
            definition_id: definition_id.to_string(),
            current_armor: max_armor,
            max_armor,
            is_broken: max_armor == 0,
        }
    }

    /// Subtracts damage, clamping at zero.
    ///
    /// Returns `true` if this call broke the part.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        if self.is_broken {
            return false;
        }
        self.current_armor = (self.current_armor - amount.max(0)).max(0);
        if self.current_armor == 0 {
            self.is_broken = true;
            return true;
        }
        false
    }

    /// Checks the armor invariants.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        (0..=self.max_armor).contains(&self.current_armor)
            && self.is_broken == (self.current_armor == 0)
    }
}

/// Parts keyed by slot; iteration follows slot order.
pub type Parts = BTreeMap<PartSlot, PartInstance>;

/// Scheduler state of a robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotState {
    /// No gauge, no intent. Eligible for a new action.
    #[default]
    Idle,
    /// Gauge filling toward the action.
    Charging,
    /// Charge complete, waiting in the ready queue.
    Ready,
    /// Gauge filling back toward idle.
    Cooldown,
    /// Head destroyed. Terminal.
    Broken,
}

/// Charge or cooldown progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Gauge {
    /// Ticks elapsed in the current phase.
    pub progress: u32,
    /// Ticks the current phase lasts. Fractional totals round up in effect.
    pub total: f64,
    /// `100 * progress / total`, clamped to `[0, 100]`.
    pub current: f64,
}

impl Gauge {
    /// Starts a new phase of `total` ticks.
    pub fn start(&mut self, total: f64) {
        self.progress = 0;
        self.total = total;
        self.current = 0.0;
    }

    /// Advances one tick. Returns `true` once the phase is complete.
    pub fn advance(&mut self) -> bool {
        self.progress = self.progress.saturating_add(1);
        let progress = f64::from(self.progress);
        self.current = if self.total > 0.0 {
            (100.0 * progress / self.total).clamp(0.0, 100.0)
        } else {
            100.0
        };
        progress >= self.total
    }

    /// Pins the gauge full, as while ready.
    pub fn fill(&mut self) {
        self.current = 100.0;
    }

    /// Empties the gauge, as while idle or broken.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The action a robot is charging.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionIntent {
    /// Slot of the part being used.
    pub selected_slot: Option<PartSlot>,
    /// Effects applied to the actor itself when the charge begins.
    pub pending_effects: Vec<EffectData>,
}

/// How the target of an action is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Target chosen at charge time.
    #[default]
    Preselected,
    /// Nearest enemy chosen when the action executes.
    ClosestAtExecution,
}

/// Target of the action being charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionTarget {
    /// Resolution policy.
    pub policy: TargetPolicy,
    /// Targeted robot, if already known.
    pub entity: Option<EntityId>,
    /// Targeted part, if already known.
    pub slot: Option<PartSlot>,
}

/// Medal copied from its definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Medal {
    /// Medal id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Personality key selecting the AI strategy pair.
    pub personality: String,
    /// Skill level.
    pub skill_level: i32,
}

/// A remembered successful hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastHit {
    /// Robot that was hit.
    pub target: EntityId,
    /// Part that was hit.
    pub slot: PartSlot,
    /// Tick of the hit, for recency comparisons between allies.
    pub tick: u64,
}

/// Per-robot AI memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMemory {
    /// Strategy pair key.
    pub personality: Personality,
    /// Last robot that acted on this one.
    pub last_attacker: Option<EntityId>,
    /// Last hit this robot landed.
    pub last_hit: Option<LastHit>,
}

impl AiMemory {
    /// Fresh memory for a personality.
    #[must_use]
    pub const fn new(personality: Personality) -> Self {
        Self {
            personality,
            last_attacker: None,
            last_hit: None,
        }
    }
}

/// Data of a status effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EffectData {
    /// Multiplies the carrier's evasion rate.
    EvasionDebuff {
        /// Factor applied to evasion.
        multiplier: f64,
    },
    /// Multiplies the carrier's defense rate.
    DefenseDebuff {
        /// Factor applied to defense.
        multiplier: f64,
    },
    /// Deals armor damage every tick.
    DamageOverTime {
        /// Damage per tick.
        damage: i32,
    },
    /// Freezes the carrier's gauge.
    ChargeStop,
    /// Replaces the carrier's targeting with a uniform choice.
    TargetRandom,
}

/// A status effect attached to a robot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    /// What the effect does.
    pub effect: EffectData,
    /// Ticks left; `0` means it lasts until removed explicitly.
    pub remaining: u32,
}

/// Status effects on a robot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    entries: Vec<ActiveEffect>,
}

impl ActiveEffects {
    /// Attaches an effect.
    pub fn push(&mut self, effect: EffectData, remaining: u32) {
        self.entries.push(ActiveEffect { effect, remaining });
    }

    /// Removes every entry carrying `effect`. Returns how many were removed.
    pub fn remove_matching(&mut self, effect: &EffectData) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.effect != *effect);
        before - self.entries.len()
    }

    /// Removes effects without a timer. Returns how many were removed.
    pub fn clear_action_scoped(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.remaining > 0);
        before - self.entries.len()
    }

    /// Iterates attached effects.
    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.entries.iter()
    }

    /// Mutable access for the effect ticker.
    pub(crate) fn entries_mut(&mut self) -> &mut Vec<ActiveEffect> {
        &mut self.entries
    }

    /// Number of attached effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Product of every evasion debuff multiplier, folded in order.
    #[must_use]
    pub fn evasion_multiplier(&self) -> f64 {
        self.entries.iter().fold(1.0, |acc, e| match e.effect {
            EffectData::EvasionDebuff { multiplier } => acc * multiplier,
            _ => acc,
        })
    }

    /// Product of every defense debuff multiplier, folded in order.
    #[must_use]
    pub fn defense_multiplier(&self) -> f64 {
        self.entries.iter().fold(1.0, |acc, e| match e.effect {
            EffectData::DefenseDebuff { multiplier } => acc * multiplier,
            _ => acc,
        })
    }

    /// Returns `true` while a charge-stop effect is attached.
    #[must_use]
    pub fn has_charge_stop(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.effect, EffectData::ChargeStop))
    }

    /// Returns `true` while a target-random effect is attached.
    #[must_use]
    pub fn has_target_random(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.effect, EffectData::TargetRandom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod part_instance_tests {
        use super::*;

        #[test]
        fn new_part_is_full() {
            let part = PartInstance::new("p", 20);
            assert_eq!(part.current_armor, 20);
            assert!(!part.is_broken);
            assert!(part.is_consistent());
        }

        #[test]
        fn zero_armor_part_starts_broken() {
            let part = PartInstance::new("p", 0);
            assert!(part.is_broken);
            assert!(part.is_consistent());
        }

        #[test]
        fn damage_clamps_and_breaks_once() {
            let mut part = PartInstance::new("p", 10);
            assert!(!part.apply_damage(4));
            assert_eq!(part.current_armor, 6);
            assert!(part.apply_damage(50));
            assert_eq!(part.current_armor, 0);
            assert!(!part.apply_damage(1));
            assert!(part.is_consistent());
        }

        #[test]
        fn negative_damage_is_ignored() {
            let mut part = PartInstance::new("p", 10);
            part.apply_damage(-5);
            assert_eq!(part.current_armor, 10);
        }
    }

    mod gauge_tests {
        use super::*;

        #[test]
        fn fractional_total_completes_on_ceiling() {
            let mut gauge = Gauge::default();
            gauge.start(1.2);
            assert!(!gauge.advance());
            assert!(gauge.advance());
            assert_eq!(gauge.current, 100.0);
        }

        #[test]
        fn current_tracks_progress() {
            let mut gauge = Gauge::default();
            gauge.start(4.0);
            gauge.advance();
            assert!((gauge.current - 25.0).abs() < f64::EPSILON);
        }

        #[test]
        fn clear_resets() {
            let mut gauge = Gauge::default();
            gauge.start(2.0);
            gauge.advance();
            gauge.clear();
            assert_eq!(gauge, Gauge::default());
        }
    }

    mod active_effects_tests {
        use super::*;

        #[test]
        fn multipliers_fold_sequentially() {
            let mut effects = ActiveEffects::default();
            effects.push(EffectData::EvasionDebuff { multiplier: 0.5 }, 0);
            effects.push(EffectData::EvasionDebuff { multiplier: 0.5 }, 3);
            effects.push(EffectData::DefenseDebuff { multiplier: 0.8 }, 0);
            assert!((effects.evasion_multiplier() - 0.25).abs() < 1e-12);
            assert!((effects.defense_multiplier() - 0.8).abs() < 1e-12);
        }

        #[test]
        fn clear_action_scoped_keeps_timed() {
            let mut effects = ActiveEffects::default();
            effects.push(EffectData::EvasionDebuff { multiplier: 0.5 }, 0);
            effects.push(EffectData::ChargeStop, 5);
            assert_eq!(effects.clear_action_scoped(), 1);
            assert_eq!(effects.len(), 1);
            assert!(effects.has_charge_stop());
        }

        #[test]
        fn remove_matching_by_data() {
            let mut effects = ActiveEffects::default();
            effects.push(EffectData::TargetRandom, 2);
            effects.push(EffectData::ChargeStop, 2);
            assert_eq!(effects.remove_matching(&EffectData::TargetRandom), 1);
            assert!(!effects.has_target_random());
        }

        #[test]
        fn effect_data_json_shape() {
            let json =
                serde_json::to_string(&EffectData::DefenseDebuff { multiplier: 0.5 }).unwrap();
            assert_eq!(json, r#"{"type":"defense-debuff","multiplier":0.5}"#);
        }
    }
}
