//! Entity module: robot identity and component storage.
//!
//! This module provides the core entity types for the battle world:
//! - [`EntityId`]: Unique identifier for a robot
//! - [`TeamId`]: Which side a robot fights on
//! - [`PartSlot`]: The four equipment slots
//! - [`Entity`]: A robot with all of its components
//!
//! Entities refer to each other only by [`EntityId`]. Historical references
//! (for example an AI's last attacker) stay valid after the referenced robot
//! is destroyed and are re-checked on use.
//!
//! # Example
//!
//! ```
//! use medabattle_core::entity::{Entity, EntityId, PartSlot, RobotState, TeamId};
//! use medabattle_core::entity::components::{PartInstance, Settings};
//!
//! let settings = Settings::new("r1", "Rokusho", TeamId::One, true, 1);
//! let mut robot = Entity::new(EntityId::new(1), settings);
//! robot.parts.insert(PartSlot::Head, PartInstance::new("head-01", 30));
//!
//! assert_eq!(robot.state, RobotState::Idle);
//! assert!(robot.settings.is_leader);
//! ```

pub mod components;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use components::{
    ActionIntent, ActionTarget, ActiveEffect, ActiveEffects, AiMemory, EffectData, Gauge,
    LastHit, Medal, PartInstance, Parts, RobotState, Settings, TargetPolicy,
};

/// Unique identifier for a robot.
///
/// Entity IDs are ordered by their numeric value, which gives a deterministic
/// iteration order over the world.
///
/// ```
/// use medabattle_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// One of the two sides of a battle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamId {
    /// First team (CSV value `0`).
    One,
    /// Second team (CSV value `1`).
    Two,
}

impl TeamId {
    /// Both teams, in end-check order.
    pub const ALL: [Self; 2] = [Self::One, Self::Two];

    /// Returns the opposing team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Maps the CSV team column (`0` or `1`).
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::One),
            1 => Some(Self::Two),
            _ => None,
        }
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "Team 1"),
            Self::Two => write!(f, "Team 2"),
        }
    }
}

/// Equipment slot of a robot.
///
/// The derived ordering (head, right arm, left arm, legs) is the slot order
/// used for every deterministic tie-break.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartSlot {
    /// Head. Carries the robot's life.
    Head,
    /// Right arm.
    RightArm,
    /// Left arm.
    LeftArm,
    /// Legs. Source of propulsion, mobility and defense.
    Legs,
}

impl PartSlot {
    /// All slots in slot order.
    pub const ALL: [Self; 4] = [Self::Head, Self::RightArm, Self::LeftArm, Self::Legs];

    /// Slots that can hold an action part.
    pub const ACTION_SLOTS: [Self; 3] = [Self::Head, Self::RightArm, Self::LeftArm];

    /// Returns `true` for either arm.
    #[must_use]
    pub const fn is_arm(self) -> bool {
        matches!(self, Self::RightArm | Self::LeftArm)
    }

    /// Kebab-case key used in data files and logs.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::RightArm => "right-arm",
            Self::LeftArm => "left-arm",
            Self::Legs => "legs",
        }
    }
}

impl fmt::Display for PartSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PartSlot {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "head" => Ok(Self::Head),
            "rightarm" => Ok(Self::RightArm),
            "leftarm" => Ok(Self::LeftArm),
            "legs" | "leg" => Ok(Self::Legs),
            _ => Err(format!("unknown part slot '{s}'")),
        }
    }
}

/// A robot in the battle world.
///
/// Every component is a public field so systems can borrow exactly what they
/// touch. The optional AI component is `None` for player-controlled robots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    /// Static identity copied from the loadout.
    pub settings: Settings,
    /// Equipped parts by slot.
    pub parts: Parts,
    /// Scheduler state.
    pub state: RobotState,
    /// Charge or cooldown progress.
    pub gauge: Gauge,
    /// The action being charged.
    pub intent: ActionIntent,
    /// Who the action is aimed at.
    pub target: ActionTarget,
    /// Medal copied from its definition.
    pub medal: Medal,
    /// AI memory; absent for player-controlled robots.
    pub ai: Option<AiMemory>,
    /// Timed and action-scoped status effects.
    pub effects: ActiveEffects,
}

impl Entity {
    /// Creates an idle robot with no parts, a default medal and no AI.
    #[must_use]
    pub fn new(id: EntityId, settings: Settings) -> Self {
        Self {
            id,
            settings,
            parts: Parts::new(),
            state: RobotState::Idle,
            gauge: Gauge::default(),
            intent: ActionIntent::default(),
            target: ActionTarget::default(),
            medal: Medal::default(),
            ai: None,
            effects: ActiveEffects::default(),
        }
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the robot's team.
    #[must_use]
    pub const fn team(&self) -> TeamId {
        self.settings.team
    }

    /// Returns `true` once the head has been destroyed.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.state == RobotState::Broken
    }

    /// Returns `true` when the robot waits for player input instead of AI.
    #[must_use]
    pub const fn is_player_controlled(&self) -> bool {
        self.ai.is_none()
    }

    /// Returns the part in a slot, if equipped.
    #[must_use]
    pub fn part(&self, slot: PartSlot) -> Option<&PartInstance> {
        self.parts.get(&slot)
    }

    /// Returns `true` if the slot holds a part that is not broken.
    #[must_use]
    pub fn has_working_part(&self, slot: PartSlot) -> bool {
        self.part(slot).is_some_and(|p| !p.is_broken)
    }

    /// Non-broken slots in slot order.
    #[must_use]
    pub fn working_slots(&self) -> Vec<PartSlot> {
        self.parts
            .iter()
            .filter(|(_, part)| !part.is_broken)
            .map(|(slot, _)| *slot)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn robot() -> Entity {
        Entity::new(
            EntityId::new(1),
            Settings::new("r1", "Metabee", TeamId::One, false, 2),
        )
    }

    mod entity_id_tests {
        use super::*;

        #[test]
        fn ordering() {
            let mut ids = vec![EntityId::new(3), EntityId::new(1), EntityId::new(2)];
            ids.sort();
            assert_eq!(ids, vec![EntityId::new(1), EntityId::new(2), EntityId::new(3)]);
        }

        #[test]
        fn debug_and_display_format() {
            let id = EntityId::new(42);
            assert_eq!(format!("{id:?}"), "EntityId(42)");
            assert_eq!(format!("{id}"), "42");
        }

        #[test]
        fn u64_conversions() {
            let id: EntityId = 42u64.into();
            let raw: u64 = id.into();
            assert_eq!(raw, 42);
        }
    }

    mod team_tests {
        use super::*;

        #[test]
        fn opponent_is_symmetric() {
            assert_eq!(TeamId::One.opponent(), TeamId::Two);
            assert_eq!(TeamId::Two.opponent(), TeamId::One);
        }

        #[test]
        fn from_csv_index() {
            assert_eq!(TeamId::from_index(0), Some(TeamId::One));
            assert_eq!(TeamId::from_index(1), Some(TeamId::Two));
            assert_eq!(TeamId::from_index(2), None);
        }
    }

    mod part_slot_tests {
        use super::*;

        #[test]
        fn slot_order_is_head_arms_legs() {
            let mut slots = vec![
                PartSlot::Legs,
                PartSlot::LeftArm,
                PartSlot::Head,
                PartSlot::RightArm,
            ];
            slots.sort();
            assert_eq!(slots, PartSlot::ALL.to_vec());
        }

        #[test]
        fn parses_common_spellings() {
            assert_eq!("rightArm".parse::<PartSlot>(), Ok(PartSlot::RightArm));
            assert_eq!("left-arm".parse::<PartSlot>(), Ok(PartSlot::LeftArm));
            assert_eq!("LEGS".parse::<PartSlot>(), Ok(PartSlot::Legs));
            assert!("tail".parse::<PartSlot>().is_err());
        }

        #[test]
        fn display_uses_key() {
            assert_eq!(PartSlot::RightArm.to_string(), "right-arm");
        }
    }

    mod entity_tests {
        use super::*;

        #[test]
        fn new_robot_is_idle_and_player_controlled() {
            let robot = robot();
            assert_eq!(robot.state, RobotState::Idle);
            assert!(robot.is_player_controlled());
            assert!(!robot.is_broken());
        }

        #[test]
        fn working_slots_skip_broken_parts() {
            let mut robot = robot();
            robot.parts.insert(PartSlot::Head, PartInstance::new("h", 10));
            robot.parts.insert(PartSlot::Legs, PartInstance::new("l", 10));
            let mut broken = PartInstance::new("a", 5);
            broken.apply_damage(5);
            robot.parts.insert(PartSlot::RightArm, broken);

            assert_eq!(robot.working_slots(), vec![PartSlot::Head, PartSlot::Legs]);
            assert!(!robot.has_working_part(PartSlot::RightArm));
            assert!(!robot.has_working_part(PartSlot::LeftArm));
        }
    }
}
