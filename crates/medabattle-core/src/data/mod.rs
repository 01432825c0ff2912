//! Static game data: part, medal and loadout tables plus trait formulas.
//!
//! Everything here is read-only once a battle starts. Tables are parsed from
//! text by [`loader`]; the resulting [`GameData`] is shared behind an `Arc`
//! by every system that needs a definition.

pub mod definitions;
pub mod loader;

pub use definitions::{
    ActionFormula, BonusTerm, DebuffEffect, DebuffType, GameData, MedalDefinition,
    PartCategory, PartDefinition, PartParameter, PartStats, PartTrait, RobotLoadout,
    TargetEffect,
};
pub use loader::{parse_formulas, parse_loadouts, parse_medals, parse_parts};
