//! Error types for the battle core.
//!
//! Only [`BattleError`] ever reaches the host. [`ChargeError`] and
//! [`DispatchError`] describe recoverable conditions: the core logs them and
//! keeps the battle running.

use thiserror::Error;

use crate::entity::{EntityId, PartSlot};

/// Result type alias using [`BattleError`].
pub type Result<T> = std::result::Result<T, BattleError>;

/// Errors returned to the host.
#[derive(Debug, Error)]
pub enum BattleError {
    /// A CSV table could not be read.
    #[error("failed to read {table} table: {source}")]
    Csv {
        /// Which table failed.
        table: &'static str,
        /// Underlying reader error.
        #[source]
        source: csv::Error,
    },

    /// A CSV row was structurally valid but carried an unusable value.
    #[error("{table} table, row {row}: {message}")]
    InvalidRow {
        /// Which table failed.
        table: &'static str,
        /// 1-based data row (header excluded).
        row: usize,
        /// What was wrong.
        message: String,
    },

    /// A JSON document could not be parsed.
    #[error("failed to parse {document}: {source}")]
    Json {
        /// Which document failed.
        document: &'static str,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// A loadout references an id that is not in the static tables.
    #[error("loadout '{loadout}' references unknown {kind} '{id}'")]
    UnknownDefinition {
        /// Loadout id.
        loadout: String,
        /// "part" or "medal".
        kind: &'static str,
        /// The missing id.
        id: String,
    },

    /// The battle cannot be set up from the given loadouts.
    #[error("invalid battle setup: {0}")]
    InvalidSetup(String),

    /// An input event named an entity that does not exist.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// A confirmed action was rejected by charge initiation.
    #[error("action rejected for {actor}: {source}")]
    ActionRejected {
        /// Actor that tried to act.
        actor: EntityId,
        /// Why charge initiation refused it.
        #[source]
        source: ChargeError,
    },
}

/// Why a charge could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChargeError {
    /// The actor does not exist.
    #[error("actor {0} does not exist")]
    UnknownActor(EntityId),

    /// The actor is not idle.
    #[error("actor is not idle")]
    NotIdle,

    /// The actor's head is destroyed.
    #[error("actor is broken")]
    ActorBroken,

    /// The chosen slot has no part or the part is broken.
    #[error("part in slot {0} is missing or broken")]
    PartUnavailable(PartSlot),

    /// The part id has no static definition.
    #[error("no definition for part '{0}'")]
    MissingDefinition(String),

    /// The part cannot be used as an action.
    #[error("part '{0}' is not an action part")]
    NotActionPart(String),

    /// A preselected target is required but none was supplied.
    #[error("a target is required")]
    TargetRequired,

    /// The supplied target does not exist or is broken.
    #[error("target {0} is not valid")]
    InvalidTarget(EntityId),

    /// An attack was aimed at a robot on the actor's own team.
    #[error("target {0} is not an enemy")]
    TargetNotEnemy(EntityId),

    /// The targeted part is missing or broken.
    #[error("target part {0} is missing or broken")]
    InvalidTargetPart(PartSlot),
}

/// Scheduler failures while dispatching a ready actor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The dispatched entity no longer exists.
    #[error("actor {0} does not exist")]
    UnknownActor(EntityId),

    /// The dispatched entity is not in the ready state.
    #[error("actor {0} is not ready")]
    NotReady(EntityId),

    /// The actor has no selected action slot.
    #[error("actor {0} has no selected action")]
    NoIntent(EntityId),

    /// The selected part broke while the actor was charging.
    #[error("acting part in slot {0} is missing or broken")]
    PartBroken(PartSlot),

    /// The selected part has no definition.
    #[error("no definition for part '{0}'")]
    MissingDefinition(String),

    /// No handler is registered for the part's trait and category.
    #[error("no handler for part '{0}'")]
    NoHandler(String),
}
