//! Trait-keyed action handlers.
//!
//! Each handler declares the part traits it resolves, the way the pipeline
//! routes a dispatched action without knowing what the action does. A new
//! trait means a new handler entry in the [`HandlerRegistry`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{ActionResult, AttackHandler, ObstructHandler, SupportHandler};
use crate::ai::StrategyRegistry;
use crate::arena::Arena;
use crate::config::BattleConfig;
use crate::data::{GameData, PartCategory, PartDefinition, PartTrait};
use crate::entity::{EntityId, PartSlot};
use crate::rng::BattleRng;

/// Everything a handler may read or mutate while resolving one action.
pub struct ActionContext<'a> {
    /// Battle world.
    pub arena: &'a mut Arena,
    /// Static definitions.
    pub data: &'a GameData,
    /// Formula constants.
    pub config: &'a BattleConfig,
    /// AI strategies, for targets resolved at execution.
    pub strategies: &'a StrategyRegistry,
    /// The battle's random source.
    pub rng: &'a mut BattleRng,
    /// Acting robot.
    pub actor: EntityId,
    /// Slot of the acting part.
    pub slot: PartSlot,
    /// Definition of the acting part.
    pub part: &'a PartDefinition,
}

impl fmt::Debug for ActionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("actor", &self.actor)
            .field("slot", &self.slot)
            .field("part", &self.part.id)
            .finish_non_exhaustive()
    }
}

/// Resolves dispatched actions of some part traits.
///
/// # Example
///
/// ```
/// use medabattle_core::action::{ActionContext, ActionHandler, ActionResult};
/// use medabattle_core::data::PartTrait;
///
/// struct Taunt;
///
/// impl ActionHandler for Taunt {
///     fn name(&self) -> &'static str {
///         "taunt"
///     }
///
///     fn handles(&self) -> &[PartTrait] {
///         &[PartTrait::Obstruct]
///     }
///
///     fn execute(&self, ctx: &mut ActionContext<'_>) -> ActionResult {
///         ActionResult::new(ctx.arena, ctx.actor, ctx.part)
///     }
/// }
/// ```
pub trait ActionHandler: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Traits routed to this handler.
    fn handles(&self) -> &[PartTrait];

    /// Resolves the action. Must not emit messages or touch the actor's
    /// state; the pipeline owns both.
    fn execute(&self, ctx: &mut ActionContext<'_>) -> ActionResult;
}

/// Handlers keyed by the traits they declare.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    by_trait: HashMap<PartTrait, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under every trait it declares, replacing earlier
    /// entries for those traits.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        for action_trait in handler.handles() {
            self.by_trait.insert(*action_trait, Arc::clone(&handler));
        }
    }

    /// Attack for ranged and melee traits, plus support and obstruct.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(AttackHandler));
        registry.register(Arc::new(SupportHandler));
        registry.register(Arc::new(ObstructHandler));
        registry
    }

    /// Handler for a part.
    ///
    /// Parts without a trait route by category: ranged as shoot, melee as
    /// strike. Anything else has no handler.
    #[must_use]
    pub fn handler_for(&self, part: &PartDefinition) -> Option<&dyn ActionHandler> {
        let key = match (part.action_trait, part.category) {
            (PartTrait::None, PartCategory::Ranged) => PartTrait::Shoot,
            (PartTrait::None, PartCategory::Melee) => PartTrait::Strike,
            (action_trait, _) => action_trait,
        };
        self.by_trait.get(&key).map(AsRef::as_ref)
    }

    /// Number of routed traits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_trait.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_trait.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<_> = self
            .by_trait
            .iter()
            .map(|(t, h)| (t.label(), h.name()))
            .collect();
        routes.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("routes", &routes)
            .finish()
    }
}
