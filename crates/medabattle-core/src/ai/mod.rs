//! AI personalities and the strategy registry.
//!
//! A medal's personality selects a pair of strategies: one that picks an
//! enemy part to aim at and one that picks which of the robot's own parts to
//! use. Strategies are stateless trait objects looked up in a
//! [`StrategyRegistry`], so adding a personality means registering a pair,
//! not touching the pipeline.
//!
//! Strategies never mutate the arena. The only state they consult beyond
//! parts and gauges is each robot's [`AiMemory`](crate::entity::AiMemory),
//! and every remembered ID is re-checked before use.
//!
//! # Example
//!
//! ```
//! use medabattle_core::ai::{Personality, StrategyRegistry};
//!
//! let registry = StrategyRegistry::default();
//! let pair = registry.pair_for(Personality::Hunter);
//! assert_eq!(pair.targeting.name(), "lowest_armor");
//! assert_eq!(pair.part_selection.name(), "highest_power");
//!
//! // Unknown personality keys fall back to Joker.
//! assert_eq!(Personality::from_key("wildcard"), Personality::Joker);
//! ```

mod decision;
mod part_selection;
mod targeting;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use decision::{decide, resolve_melee_target, Decision};
pub use part_selection::{FirstAvailable, HighestPower, PartSelectionStrategy, ShortestCharge};
pub use targeting::{
    AssistTargeting, ChaseTargeting, CounterTargeting, DuelTargeting, FocusTargeting,
    GuardTargeting, HighestArmorTargeting, InterceptTargeting, LeaderTargeting,
    LowestArmorTargeting, RandomTargeting, StrategyContext, TargetChoice, TargetingStrategy,
};

use crate::data::definitions::normalize_key;

// =============================================================================
// Personality
// =============================================================================

/// Medal personality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    /// Aims at the weakest enemy part.
    Hunter,
    /// Aims at the sturdiest enemy part.
    Crusher,
    /// Aims at random.
    Joker,
    /// Goes for the enemy leader.
    Leader,
    /// Follows up on an ally's latest hit.
    Assist,
    /// Hits back at whoever hit it.
    Counter,
    /// Hits back at whoever hit its leader.
    Guard,
    /// Keeps hitting its own last target.
    Focus,
    /// Goes for the fastest legs.
    Chase,
    /// Goes for arms that can fight back.
    Duel,
    /// Goes for parts that cannot attack.
    Intercept,
}

impl Personality {
    /// Every personality, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Hunter,
        Self::Crusher,
        Self::Joker,
        Self::Leader,
        Self::Assist,
        Self::Counter,
        Self::Guard,
        Self::Focus,
        Self::Chase,
        Self::Duel,
        Self::Intercept,
    ];

    /// Lowercase key as written in the medals table.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Hunter => "hunter",
            Self::Crusher => "crusher",
            Self::Joker => "joker",
            Self::Leader => "leader",
            Self::Assist => "assist",
            Self::Counter => "counter",
            Self::Guard => "guard",
            Self::Focus => "focus",
            Self::Chase => "chase",
            Self::Duel => "duel",
            Self::Intercept => "intercept",
        }
    }

    /// Parses a medal's personality key, falling back to Joker.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        key.parse().unwrap_or_else(|_| {
            warn!(key, "unknown personality, using joker");
            Self::Joker
        })
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Personality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(s);
        Self::ALL
            .into_iter()
            .find(|p| p.key() == key)
            .ok_or_else(|| format!("unknown personality '{s}'"))
    }
}

// =============================================================================
// Strategy Registry
// =============================================================================

/// The two strategies behind a personality.
#[derive(Clone)]
pub struct StrategyPair {
    /// Picks the enemy part to aim at.
    pub targeting: Arc<dyn TargetingStrategy>,
    /// Picks the robot's own part to use.
    pub part_selection: Arc<dyn PartSelectionStrategy>,
}

impl StrategyPair {
    /// Bundles two strategies.
    pub fn new(
        targeting: Arc<dyn TargetingStrategy>,
        part_selection: Arc<dyn PartSelectionStrategy>,
    ) -> Self {
        Self {
            targeting,
            part_selection,
        }
    }
}

impl fmt::Debug for StrategyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyPair")
            .field("targeting", &self.targeting.name())
            .field("part_selection", &self.part_selection.name())
            .finish()
    }
}

/// Strategy pairs keyed by personality.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    pairs: HashMap<Personality, StrategyPair>,
}

impl StrategyRegistry {
    /// Creates an empty registry.
    ///
    /// Lookups on an empty registry still succeed through the Joker fallback
    /// of [`pair_for`](Self::pair_for).
    #[must_use]
    pub fn new() -> Self {
        Self {
            pairs: HashMap::new(),
        }
    }

    /// Registers (or replaces) the pair for a personality.
    pub fn register(&mut self, personality: Personality, pair: StrategyPair) {
        self.pairs.insert(personality, pair);
    }

    /// The pair registered for a personality, if any.
    #[must_use]
    pub fn get(&self, personality: Personality) -> Option<&StrategyPair> {
        self.pairs.get(&personality)
    }

    /// The pair for a personality, falling back to the Joker pair.
    #[must_use]
    pub fn pair_for(&self, personality: Personality) -> StrategyPair {
        self.get(personality)
            .or_else(|| self.get(Personality::Joker))
            .cloned()
            .unwrap_or_else(Self::joker_pair)
    }

    /// Random targeting with shortest-charge part selection.
    #[must_use]
    pub fn joker_pair() -> StrategyPair {
        StrategyPair::new(Arc::new(RandomTargeting), Arc::new(ShortestCharge))
    }

    /// Number of registered personalities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Default for StrategyRegistry {
    /// The standard eleven personalities.
    fn default() -> Self {
        let first: Arc<dyn PartSelectionStrategy> = Arc::new(FirstAvailable);
        let power: Arc<dyn PartSelectionStrategy> = Arc::new(HighestPower);

        let mut registry = Self::new();
        registry.register(
            Personality::Hunter,
            StrategyPair::new(Arc::new(LowestArmorTargeting), Arc::clone(&power)),
        );
        registry.register(
            Personality::Crusher,
            StrategyPair::new(Arc::new(HighestArmorTargeting), power),
        );
        registry.register(Personality::Joker, Self::joker_pair());

        let history: [(Personality, Arc<dyn TargetingStrategy>); 8] = [
            (Personality::Leader, Arc::new(LeaderTargeting)),
            (Personality::Assist, Arc::new(AssistTargeting)),
            (Personality::Counter, Arc::new(CounterTargeting)),
            (Personality::Guard, Arc::new(GuardTargeting)),
            (Personality::Focus, Arc::new(FocusTargeting)),
            (Personality::Chase, Arc::new(ChaseTargeting)),
            (Personality::Duel, Arc::new(DuelTargeting)),
            (Personality::Intercept, Arc::new(InterceptTargeting)),
        ];
        for (personality, targeting) in history {
            registry.register(personality, StrategyPair::new(targeting, Arc::clone(&first)));
        }
        registry
    }
}
