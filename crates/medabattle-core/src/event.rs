//! Events between the battle core and its host.
//!
//! The core never draws or waits. It appends [`GameEvent`]s to an outbox the
//! host drains after each update, and it takes [`BattleInput`]s back when the
//! player confirms an action or an animation finishes. While the host is
//! busy, [`HostModes`] flags hold the scheduler still.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::action::{requires_target, ActionResult};
use crate::data::{PartCategory, PartTrait};
use crate::entity::{EntityId, PartSlot, TeamId};
use crate::part_info::PartInfo;
use crate::targeting::targetable_enemies;

bitflags! {
    /// Host activities that pause gauges, effects and dispatch.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct HostModes: u8 {
        /// The action-selection modal is open for a player robot.
        const ACTION_SELECTION = 1 << 0;
        /// An action animation is playing.
        const ANIMATING        = 1 << 1;
        /// The message window is showing.
        const MESSAGE          = 1 << 2;
    }
}

// =============================================================================
// Events out
// =============================================================================

/// Events published by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Player robots are idle and waiting for a choice.
    PlayerActionRequired {
        /// Idle player robots, in draw order.
        actors: Vec<EntityId>,
    },
    /// An action resolved; the host may animate it.
    ActionAnimationStarted {
        /// What happened.
        result: ActionResult,
        /// Tick the action resolved on.
        tick: u64,
    },
    /// The host finished animating an action.
    ActionAnimationFinished {
        /// Acting robot.
        actor: EntityId,
        /// What happened.
        result: ActionResult,
    },
    /// Lines for the message window.
    MessageDisplayRequest {
        /// Formatted lines, in display order.
        messages: Vec<String>,
    },
    /// The message window closed.
    MessageDisplayFinished,
    /// The battle is decided.
    GameOver {
        /// Winning team.
        winner: TeamId,
    },
    /// Open the action-selection modal.
    ShowActionModal(ActionModalView),
    /// Close the action-selection modal.
    HideActionModal,
    /// Drop any highlighted target.
    ClearCurrentTarget,
    /// Leave the battle screen.
    GoToTitle,
}

// =============================================================================
// Inputs
// =============================================================================

/// Inputs the host feeds back into the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleInput {
    /// The player picked an action for a robot.
    ActionConfirmed {
        /// Robot that acts.
        actor: EntityId,
        /// Slot of the chosen part.
        slot: PartSlot,
        /// Chosen enemy, for parts that need one.
        target: Option<EntityId>,
        /// Chosen enemy part.
        target_slot: Option<PartSlot>,
    },
    /// The player closed the modal without choosing.
    ActionCanceled {
        /// Robot whose modal was open.
        actor: EntityId,
    },
    /// The host finished the current animation.
    AnimationFinished,
    /// The host closed the message window.
    MessagesFinished,
}

// =============================================================================
// Action modal view model
// =============================================================================

/// One usable part in the action modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalPart {
    /// Slot the part occupies.
    pub slot: PartSlot,
    /// Display name.
    pub name: String,
    /// Action trait.
    pub action_trait: PartTrait,
    /// Action category.
    pub category: PartCategory,
    /// The player must pick an enemy before confirming.
    pub needs_target: bool,
}

/// One enemy the player may aim at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalTarget {
    /// Enemy robot.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Parts that can still be hit.
    pub slots: Vec<PartSlot>,
}

/// What the action-selection modal shows for one robot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionModalView {
    /// Robot choosing an action.
    pub actor: EntityId,
    /// Display name of the actor.
    pub actor_name: String,
    /// Intact action parts.
    pub parts: Vec<ModalPart>,
    /// Enemies that can be targeted, in draw order.
    pub targets: Vec<ModalTarget>,
}

impl ActionModalView {
    /// Builds the view for `actor`. Returns `None` if it does not exist.
    #[must_use]
    pub fn build(info: PartInfo<'_>, actor: EntityId) -> Option<Self> {
        let arena = info.arena();
        let entity = arena.get(actor)?;
        let parts = info
            .available_attack_parts(actor)
            .into_iter()
            .map(|p| ModalPart {
                slot: p.slot,
                name: p.definition.name.clone(),
                action_trait: p.definition.action_trait,
                category: p.definition.category,
                needs_target: requires_target(p.definition),
            })
            .collect();
        let targets = targetable_enemies(arena, actor)
            .into_iter()
            .filter_map(|id| arena.get(id))
            .map(|enemy| ModalTarget {
                id: enemy.id(),
                name: enemy.settings.name.clone(),
                slots: enemy.working_slots(),
            })
            .collect();
        Some(Self {
            actor,
            actor_name: entity.settings.name.clone(),
            parts,
            targets,
        })
    }

    /// Whether the robot has anything it could do.
    #[must_use]
    pub fn has_choices(&self) -> bool {
        self.parts
            .iter()
            .any(|p| !p.needs_target || !self.targets.is_empty())
    }
}
