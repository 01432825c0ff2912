//! Victory check.

use tracing::info;

use crate::arena::Arena;
use crate::entity::{PartSlot, TeamId};
use crate::messages::{describe_game_over, MessageCatalog};

/// Result of an end-condition check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndCheck {
    /// The battle is over.
    pub game_over: bool,
    /// Winning team when over.
    pub winner: Option<TeamId>,
    /// Game-over line when over.
    pub message: Option<String>,
}

/// Returns `true` if the team has lost.
///
/// A team loses when its leader is missing, its leader's head is broken,
/// or none of its robots is still functioning.
#[must_use]
pub fn has_lost(arena: &Arena, team: TeamId) -> bool {
    let leader_down = arena
        .leader(team)
        .map_or(true, |leader| !leader.has_working_part(PartSlot::Head) || leader.is_broken());
    leader_down || arena.team_members(team).all(|e| e.is_broken())
}

/// Checks both teams, team one first.
#[must_use]
pub fn check_end(arena: &Arena, catalog: &MessageCatalog) -> EndCheck {
    let Some(loser) = TeamId::ALL.into_iter().find(|team| has_lost(arena, *team)) else {
        return EndCheck::default();
    };
    let winner = loser.opponent();
    info!(%winner, tick = arena.current_tick(), "game over");
    EndCheck {
        game_over: true,
        winner: Some(winner),
        message: Some(describe_game_over(catalog, winner)),
    }
}
