//! # Medabattle Core
//!
//! Deterministic battle core for gauge-driven robot combat.
//!
//! Two teams of robots fight in real time. Every robot charges an action,
//! executes it when its gauge fills and cools down before it may choose
//! again. A team loses when its leader's head breaks or all of its robots
//! stop functioning.
//!
//! ## Architecture
//!
//! - **World**: [`arena::Arena`] owns every robot ([`entity::Entity`]) plus
//!   the ready queue, team buffs and last action result
//! - **Systems**: gauge scheduling, status effects, end check ([`systems`])
//! - **Actions**: charge initiation, trait-keyed handlers, post-action
//!   bookkeeping ([`action`])
//! - **AI**: personality-keyed targeting and part-selection strategies
//!   ([`ai`])
//! - **Loop**: [`simulation::Simulation`] runs one step per update and talks
//!   to its host through [`event`]s
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use medabattle_core::{BattleConfig, GameData, MessageCatalog, Simulation};
//!
//! let data = GameData::from_tables(&parts, &medals, &loadouts, &formulas)?;
//! let mut sim = Simulation::setup(
//!     Arc::new(data),
//!     Arc::new(MessageCatalog::default()),
//!     BattleConfig::headless(),
//!     42,
//! )?;
//! let winner = sim.run_to_end(100_000);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod action;
pub mod ai;
pub mod arena;
pub mod combat;
pub mod config;
pub mod data;
pub mod entity;
pub mod error;
pub mod event;
pub mod messages;
pub mod part_info;
pub mod rng;
pub mod simulation;
pub mod systems;
pub mod targeting;

pub use arena::Arena;
pub use config::BattleConfig;
pub use data::GameData;
pub use error::{BattleError, Result};
pub use event::{BattleInput, GameEvent};
pub use messages::MessageCatalog;
pub use simulation::Simulation;

#[cfg(test)]
mod tests;
