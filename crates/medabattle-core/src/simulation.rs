//! The battle loop.
//!
//! [`Simulation`] owns the world, the random source and the registries, and
//! runs one scheduler step per [`update`](Simulation::update):
//!
//! 1. **PLAN**: idle AI robots decide and start charging; idle player robots
//!    are queued for the action modal
//! 2. **EFFECTS**: timed status effects count down, damage over time lands
//! 3. **GAUGES**: charge and cooldown gauges advance, finished chargers join
//!    the ready queue, which is sorted by propulsion
//! 4. **DISPATCH**: at most one ready robot acts
//! 5. **END**: the victory check runs, the tick advances
//!
//! While the host is showing the action modal, an animation or the message
//! window, the loop holds still so a slow presentation never hands free
//! ticks to robots that did not act.
//!
//! # Determinism
//!
//! Given the same data, configuration, seed and inputs, a battle produces
//! identical results across runs and platforms:
//! - All randomness comes from one seeded [`BattleRng`]
//! - Entities are iterated in ID order (via `BTreeMap`)
//! - Targeting enumerations sort by draw index
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use medabattle_core::config::BattleConfig;
//! use medabattle_core::data::GameData;
//! use medabattle_core::messages::MessageCatalog;
//! use medabattle_core::simulation::Simulation;
//!
//! let parts = "id,name,type,category,trait,weapon,armor,power,charge,cooldown,defense,accuracy,mobility,propulsion,stability\n\
//!              head,Head,head,none,none,,10,0,1,1,0,0,0,0,0\n\
//!              gun,Gun,right-arm,ranged,shoot,Rifle,10,30,1,1,0,50,0,0,0\n\
//!              arm,Arm,left-arm,none,none,,10,0,1,1,0,0,0,0,0\n\
//!              legs,Legs,legs,none,none,,10,0,1,1,0,0,10,10,0\n";
//! let medals = "id,name,personality,a,b,c,skill\nm,Medal,joker,,,,1\n";
//! let loadouts = "id,name,team,leader,draw,medal,head,rarm,larm,legs\n\
//!                 r1,Alpha,0,true,1,m,head,gun,arm,legs\n\
//!                 r2,Beta,1,true,1,m,head,gun,arm,legs\n";
//! let data = GameData::from_tables(parts, medals, loadouts, "{}").unwrap();
//!
//! let mut sim = Simulation::setup(
//!     Arc::new(data),
//!     Arc::new(MessageCatalog::default()),
//!     BattleConfig::headless(),
//!     7,
//! )
//! .unwrap();
//! let winner = sim.run_to_end(10_000);
//! assert!(winner.is_some());
//! assert!(sim.is_over());
//! ```

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::action::{
    start_charge, ActionPipeline, ActionResult, ChargeRequest, Dispatched, HandlerRegistry,
};
use crate::ai::{decide, Personality, StrategyRegistry};
use crate::arena::Arena;
use crate::config::{BattleConfig, Presentation};
use crate::data::{GameData, RobotLoadout};
use crate::entity::components::{AiMemory, Medal, PartInstance, Settings};
use crate::entity::{EntityId, PartSlot, RobotState, TeamId};
use crate::error::{BattleError, Result};
use crate::event::{ActionModalView, BattleInput, GameEvent, HostModes};
use crate::messages::{describe_action, MessageCatalog};
use crate::part_info::PartInfo;
use crate::rng::BattleRng;
use crate::systems::{advance_gauges, check_end, sort_ready_queue, tick_effects, EndCheck};

// =============================================================================
// Snapshot
// =============================================================================

/// Serializable summary of one robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotSnapshot {
    /// Entity id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Side.
    pub team: TeamId,
    /// Leader flag.
    pub is_leader: bool,
    /// Scheduler state.
    pub state: RobotState,
    /// Gauge in `[0, 100]`.
    pub gauge: f64,
    /// Current armor by slot.
    pub armor: BTreeMap<PartSlot, i32>,
}

/// Serializable summary of a battle at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    /// Tick the snapshot was taken on.
    pub tick: u64,
    /// Seed of the battle.
    pub seed: u64,
    /// Winning team, once decided.
    pub winner: Option<TeamId>,
    /// Every robot in ID order.
    pub robots: Vec<RobotSnapshot>,
}

// =============================================================================
// Simulation
// =============================================================================

/// The battle orchestrator.
///
/// `Simulation` manages:
/// - The [`Arena`] holding every robot and the singleton world state
/// - Shared static data and message templates
/// - The AI strategy and action handler registries
/// - The seeded random source
/// - The host handshake: [`HostModes`], the pending player queue and the
///   event outbox
pub struct Simulation {
    arena: Arena,
    data: Arc<GameData>,
    catalog: Arc<MessageCatalog>,
    config: BattleConfig,
    strategies: StrategyRegistry,
    handlers: HandlerRegistry,
    rng: BattleRng,
    modes: HostModes,
    pending_players: VecDeque<EntityId>,
    animating: Option<ActionResult>,
    closing_message: Option<String>,
    outcome: EndCheck,
    events: Vec<GameEvent>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("arena", &self.arena)
            .field("config", &self.config)
            .field("strategies", &self.strategies)
            .field("handlers", &self.handlers)
            .field("seed", &self.rng.seed())
            .field("modes", &self.modes)
            .field("pending_players", &self.pending_players)
            .field("outcome", &self.outcome)
            .field("events", &format!("[{} events]", self.events.len()))
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Builds a battle from the loadouts in `data`.
    ///
    /// Robots on `config.player_team` get no AI and wait for
    /// [`BattleInput::ActionConfirmed`]. Everyone else follows the
    /// personality of their medal.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::UnknownDefinition`] if a loadout names a part or
    /// medal that is not in `data`, and [`BattleError::InvalidSetup`] if a
    /// loadout id repeats, a slot is empty, or a team has no robots or no
    /// leader.
    pub fn setup(
        data: Arc<GameData>,
        catalog: Arc<MessageCatalog>,
        config: BattleConfig,
        seed: u64,
    ) -> Result<Self> {
        validate_loadouts(&data)?;

        let mut arena = Arena::new();
        for loadout in data.loadouts() {
            spawn_loadout(&mut arena, &data, &config, loadout)?;
        }
        info!(
            robots = arena.entity_count(),
            seed,
            player_team = ?config.player_team,
            "battle set up"
        );

        let mut sim = Self {
            arena,
            data,
            catalog,
            config,
            strategies: StrategyRegistry::default(),
            handlers: HandlerRegistry::standard(),
            rng: BattleRng::new(seed),
            modes: HostModes::empty(),
            pending_players: VecDeque::new(),
            animating: None,
            closing_message: None,
            outcome: EndCheck::default(),
            events: Vec::new(),
        };
        let opening = sim.catalog.format("battle_start", &[]);
        sim.show_messages(vec![opening]);
        Ok(sim)
    }

    /// Runs one scheduler step.
    ///
    /// Does nothing once the battle is over or while any [`HostModes`] flag
    /// is set. At most one action is dispatched per call.
    pub fn update(&mut self) {
        if self.is_over() || !self.modes.is_empty() {
            return;
        }

        // PLAN
        self.plan_ai_actions();
        if self.request_player_actions() {
            return;
        }

        // EFFECTS
        for hit in tick_effects(&mut self.arena) {
            debug!(
                entity = %hit.entity,
                slot = %hit.slot,
                damage = hit.outcome.dealt,
                "damage over time"
            );
        }

        // GAUGES
        advance_gauges(&mut self.arena);
        sort_ready_queue(&mut self.arena, &self.data);

        // DISPATCH
        let pipeline = ActionPipeline {
            data: &self.data,
            config: &self.config,
            strategies: &self.strategies,
            handlers: &self.handlers,
        };
        if let Some(Dispatched::Action(result)) =
            pipeline.dispatch_next(&mut self.arena, &mut self.rng)
        {
            self.publish_action(result);
        }

        // END
        self.check_end();
        self.arena.advance_tick();
    }

    /// Applies a host input.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::EntityNotFound`] if the input names an unknown
    /// robot and [`BattleError::ActionRejected`] if a confirmed action cannot
    /// start charging. A rejected action leaves the modal open.
    pub fn handle_input(&mut self, input: BattleInput) -> Result<()> {
        match input {
            BattleInput::ActionConfirmed {
                actor,
                slot,
                target,
                target_slot,
            } => {
                self.require_entity(actor)?;
                let request = ChargeRequest {
                    actor,
                    slot,
                    target,
                    target_slot,
                };
                start_charge(&mut self.arena, &self.data, &self.config, request)
                    .map_err(|source| BattleError::ActionRejected { actor, source })?;
                self.pending_players.retain(|id| *id != actor);
                self.events.push(GameEvent::HideActionModal);
                self.events.push(GameEvent::ClearCurrentTarget);
                self.modes.remove(HostModes::ACTION_SELECTION);
                self.show_next_modal();
            }
            BattleInput::ActionCanceled { actor } => {
                self.require_entity(actor)?;
                debug!(%actor, "action selection canceled");
                self.pending_players.clear();
                self.modes.remove(HostModes::ACTION_SELECTION);
                self.events.push(GameEvent::HideActionModal);
            }
            BattleInput::AnimationFinished => self.finish_animation(),
            BattleInput::MessagesFinished => self.finish_messages(),
        }
        Ok(())
    }

    /// Runs until the battle ends or `max_ticks` is reached, acknowledging
    /// animations and messages on the host's behalf.
    ///
    /// Stops early if a player robot is waiting for a choice. Returns the
    /// winner, if any.
    pub fn run_to_end(&mut self, max_ticks: u64) -> Option<TeamId> {
        while !self.is_over() && self.tick() < max_ticks {
            self.finish_animation();
            self.finish_messages();
            if self.modes.contains(HostModes::ACTION_SELECTION) {
                break;
            }
            self.update();
        }
        self.finish_animation();
        self.finish_messages();
        self.winner()
    }

    /// Drains the event outbox.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Serializable summary of every robot.
    #[must_use]
    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            tick: self.tick(),
            seed: self.seed(),
            winner: self.winner(),
            robots: self
                .arena
                .entities_sorted()
                .map(|e| RobotSnapshot {
                    id: e.id(),
                    name: e.settings.name.clone(),
                    team: e.team(),
                    is_leader: e.settings.is_leader,
                    state: e.state,
                    gauge: e.gauge.current,
                    armor: e
                        .parts
                        .iter()
                        .map(|(slot, part)| (*slot, part.current_armor))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Returns a reference to the world.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Returns a mutable reference to the world, for setup and tests.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Returns the static data.
    #[must_use]
    pub fn data(&self) -> &GameData {
        &self.data
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Returns the AI strategy registry for registering extra personalities.
    pub fn strategies_mut(&mut self) -> &mut StrategyRegistry {
        &mut self.strategies
    }

    /// Returns the handler registry for registering extra traits.
    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    /// Host activities currently holding the loop.
    #[must_use]
    pub const fn modes(&self) -> HostModes {
        self.modes
    }

    /// Player robots waiting for a choice, head first.
    #[must_use]
    pub fn pending_players(&self) -> Vec<EntityId> {
        self.pending_players.iter().copied().collect()
    }

    /// Returns `true` once a team has won.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.game_over
    }

    /// Winning team, once decided.
    #[must_use]
    pub const fn winner(&self) -> Option<TeamId> {
        self.outcome.winner
    }

    /// Returns the current tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.arena.current_tick()
    }

    /// Returns the seed the battle started with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    // -------------------------------------------------------------------------
    // Planning
    // -------------------------------------------------------------------------

    fn plan_ai_actions(&mut self) {
        let idle: Vec<EntityId> = self
            .arena
            .entities_sorted()
            .filter(|e| e.state == RobotState::Idle && e.ai.is_some())
            .map(|e| e.id())
            .collect();
        for actor in idle {
            let decision = decide(
                PartInfo::new(&self.arena, &self.data),
                &self.strategies,
                actor,
                &mut self.rng,
            );
            let Some(decision) = decision else {
                debug!(%actor, "no action available");
                continue;
            };
            let request = ChargeRequest {
                actor,
                slot: decision.slot,
                target: decision.target,
                target_slot: decision.target_slot,
            };
            if let Err(error) = start_charge(&mut self.arena, &self.data, &self.config, request) {
                debug!(%actor, %error, "ai action rejected, retrying next tick");
            }
        }
    }

    /// Queues idle player robots and opens the modal. Returns `true` if the
    /// loop must wait for a choice.
    fn request_player_actions(&mut self) -> bool {
        let queued: HashSet<EntityId> = self.pending_players.iter().copied().collect();
        let info = PartInfo::new(&self.arena, &self.data);
        let waiting: Vec<EntityId> = self
            .arena
            .entities_sorted()
            .filter(|e| e.state == RobotState::Idle && e.is_player_controlled())
            .map(|e| e.id())
            .filter(|id| !queued.contains(id))
            .filter(|id| ActionModalView::build(info, *id).is_some_and(|v| v.has_choices()))
            .collect();
        if waiting.is_empty() && self.pending_players.is_empty() {
            return false;
        }
        self.pending_players.extend(waiting);
        self.events.push(GameEvent::PlayerActionRequired {
            actors: self.pending_players.iter().copied().collect(),
        });
        self.show_next_modal();
        self.modes.contains(HostModes::ACTION_SELECTION)
    }

    fn show_next_modal(&mut self) {
        while let Some(&actor) = self.pending_players.front() {
            let view = ActionModalView::build(PartInfo::new(&self.arena, &self.data), actor)
                .filter(|v| v.has_choices());
            let idle = self
                .arena
                .get(actor)
                .is_some_and(|e| e.state == RobotState::Idle);
            match view {
                Some(view) if idle => {
                    self.events.push(GameEvent::ShowActionModal(view));
                    self.modes.insert(HostModes::ACTION_SELECTION);
                    return;
                }
                _ => {
                    self.pending_players.pop_front();
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Presentation
    // -------------------------------------------------------------------------

    fn publish_action(&mut self, result: ActionResult) {
        self.events.push(GameEvent::ActionAnimationStarted {
            result: result.clone(),
            tick: self.arena.current_tick(),
        });
        match self.config.presentation {
            Presentation::Interactive => {
                self.animating = Some(result);
                self.modes.insert(HostModes::ANIMATING);
            }
            Presentation::Headless => {
                let messages = describe_action(&self.catalog, &result);
                self.events.push(GameEvent::ActionAnimationFinished {
                    actor: result.actor,
                    result,
                });
                self.show_messages(messages);
            }
        }
    }

    fn finish_animation(&mut self) {
        let Some(result) = self.animating.take() else {
            return;
        };
        self.modes.remove(HostModes::ANIMATING);
        let mut messages = describe_action(&self.catalog, &result);
        messages.extend(self.closing_message.take());
        self.events.push(GameEvent::ActionAnimationFinished {
            actor: result.actor,
            result,
        });
        self.show_messages(messages);
    }

    fn show_messages(&mut self, messages: Vec<String>) {
        self.events.push(GameEvent::MessageDisplayRequest { messages });
        match self.config.presentation {
            Presentation::Interactive => self.modes.insert(HostModes::MESSAGE),
            Presentation::Headless => self.close_messages(),
        }
    }

    fn finish_messages(&mut self) {
        if self.modes.contains(HostModes::MESSAGE) {
            self.modes.remove(HostModes::MESSAGE);
            self.close_messages();
        }
    }

    fn close_messages(&mut self) {
        self.events.push(GameEvent::MessageDisplayFinished);
        if self.is_over() && self.animating.is_none() && self.closing_message.is_none() {
            self.events.push(GameEvent::GoToTitle);
        }
    }

    fn check_end(&mut self) {
        let check = check_end(&self.arena, &self.catalog);
        if !check.game_over {
            return;
        }
        if let Some(winner) = check.winner {
            self.events.push(GameEvent::GameOver { winner });
        }
        self.pending_players.clear();
        self.modes.remove(HostModes::ACTION_SELECTION);
        let message = check.message.clone();
        self.outcome = check;
        if let Some(message) = message {
            if self.modes.contains(HostModes::ANIMATING) {
                self.closing_message = Some(message);
            } else {
                self.show_messages(vec![message]);
            }
        }
    }

    fn require_entity(&self, id: EntityId) -> Result<()> {
        if self.arena.get(id).is_some() {
            Ok(())
        } else {
            Err(BattleError::EntityNotFound(id))
        }
    }
}

// =============================================================================
// Setup helpers
// =============================================================================

fn validate_loadouts(data: &GameData) -> Result<()> {
    let mut seen = HashSet::new();
    for loadout in data.loadouts() {
        if !seen.insert(loadout.id.as_str()) {
            return Err(BattleError::InvalidSetup(format!(
                "duplicate loadout id '{}'",
                loadout.id
            )));
        }
    }
    for team in TeamId::ALL {
        let members: Vec<&RobotLoadout> =
            data.loadouts().iter().filter(|l| l.team == team).collect();
        if members.is_empty() {
            return Err(BattleError::InvalidSetup(format!("{team} has no robots")));
        }
        if !members.iter().any(|l| l.is_leader) {
            return Err(BattleError::InvalidSetup(format!("{team} has no leader")));
        }
    }
    Ok(())
}

fn spawn_loadout(
    arena: &mut Arena,
    data: &GameData,
    config: &BattleConfig,
    loadout: &RobotLoadout,
) -> Result<EntityId> {
    let unknown = |kind: &'static str, id: &str| BattleError::UnknownDefinition {
        loadout: loadout.id.clone(),
        kind,
        id: id.to_string(),
    };
    let medal = data
        .medal(&loadout.medal_id)
        .ok_or_else(|| unknown("medal", &loadout.medal_id))?;

    let mut parts = Vec::with_capacity(PartSlot::ALL.len());
    for slot in PartSlot::ALL {
        let part_id = loadout.parts.get(&slot).ok_or_else(|| {
            BattleError::InvalidSetup(format!("loadout '{}' has no {slot} part", loadout.id))
        })?;
        let definition = data.part(part_id).ok_or_else(|| unknown("part", part_id))?;
        parts.push((slot, PartInstance::new(part_id, definition.stats.max_armor)));
    }

    let id = arena.spawn(Settings::new(
        &loadout.id,
        &loadout.name,
        loadout.team,
        loadout.is_leader,
        loadout.draw_index,
    ));
    let robot = arena
        .get_mut(id)
        .ok_or_else(|| BattleError::InvalidSetup(format!("failed to spawn '{}'", loadout.id)))?;
    robot.parts.extend(parts);
    robot.medal = Medal {
        id: medal.id.clone(),
        name: medal.name.clone(),
        personality: medal.personality.clone(),
        skill_level: medal.skill_level,
    };
    if config.player_team != Some(loadout.team) {
        robot.ai = Some(AiMemory::new(Personality::from_key(&medal.personality)));
    }
    debug!(entity = %id, loadout = %loadout.id, team = %loadout.team, "robot spawned");
    Ok(id)
}
