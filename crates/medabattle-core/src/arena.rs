//! Arena module for the battle simulation.
//!
//! The Arena is the container for all mutable battle state. It provides:
//! - Robot storage with deterministic iteration order (`BTreeMap`)
//! - The singleton ready queue, team buff registry and last action result
//! - Tick tracking
//!
//! # Determinism
//!
//! Entity IDs are assigned monotonically and stored in a `BTreeMap`, so every
//! full scan visits robots in the same order on every platform. Team buffs
//! are keyed by ordered maps for the same reason.
//!
//! # Singletons
//!
//! The ready queue, buff registry and last result are owned fields of the
//! arena rather than entities, so they exist from construction and cannot go
//! missing mid-battle.
//!
//! # Example
//!
//! ```
//! use medabattle_core::arena::Arena;
//! use medabattle_core::entity::TeamId;
//! use medabattle_core::entity::components::Settings;
//!
//! let mut arena = Arena::new();
//! let a = arena.spawn(Settings::new("r1", "Metabee", TeamId::One, true, 1));
//! let b = arena.spawn(Settings::new("r2", "Rokusho", TeamId::Two, true, 1));
//!
//! let ids: Vec<_> = arena.entity_ids_sorted().collect();
//! assert_eq!(ids, vec![a, b]);
//! assert_eq!(arena.leader(TeamId::Two).map(|e| e.id()), Some(b));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::ActionResult;
use crate::entity::components::Settings;
use crate::entity::{Entity, EntityId, PartSlot, TeamId};

// =============================================================================
// Ready queue
// =============================================================================

/// Robots whose charge has completed, in dispatch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionQueue {
    entries: Vec<EntityId>,
}

impl ActionQueue {
    /// Appends a robot unless it is already queued.
    ///
    /// Returns `true` if the robot was added.
    pub fn enqueue(&mut self, id: EntityId) -> bool {
        if self.entries.contains(&id) {
            return false;
        }
        self.entries.push(id);
        true
    }

    /// Removes a robot wherever it sits. Returns `true` if it was queued.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| *e != id);
        before != self.entries.len()
    }

    /// Pops the head of the queue.
    pub fn pop_front(&mut self) -> Option<EntityId> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }

    /// Stable sort by a key, descending. Equal keys keep insertion order.
    pub fn sort_descending_by<K: PartialOrd>(&mut self, mut key: impl FnMut(EntityId) -> K) {
        self.entries.sort_by(|a, b| {
            key(*b)
                .partial_cmp(&key(*a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Returns `true` if the robot is queued.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.contains(&id)
    }

    /// Queued robots, head first.
    #[must_use]
    pub fn as_slice(&self) -> &[EntityId] {
        &self.entries
    }

    /// Number of queued robots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Team buffs
// =============================================================================

/// Kind of team-wide multiplicative buff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffKind {
    /// Multiplies the success rate of every teammate.
    Accuracy,
}

/// A buff contributed by one part of one robot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuffSource {
    /// Robot that granted the buff.
    pub source_entity: EntityId,
    /// Slot of the granting part.
    pub source_slot: PartSlot,
    /// Multiplier.
    pub value: f64,
}

/// Per-team buff registry. Buffs of one kind do not stack: the team gets the
/// best single value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamBuffs {
    teams: BTreeMap<TeamId, BTreeMap<BuffKind, Vec<BuffSource>>>,
}

impl TeamBuffs {
    /// Adds a buff, replacing any earlier buff from the same source slot.
    pub fn add(&mut self, team: TeamId, kind: BuffKind, source: BuffSource) {
        let list = self.teams.entry(team).or_default().entry(kind).or_default();
        list.retain(|b| {
            !(b.source_entity == source.source_entity && b.source_slot == source.source_slot)
        });
        list.push(source);
    }

    /// Best value for a team and kind, or `1.0` when nothing is registered.
    #[must_use]
    pub fn multiplier(&self, team: TeamId, kind: BuffKind) -> f64 {
        self.sources(team, kind)
            .iter()
            .map(|b| b.value)
            .reduce(f64::max)
            .unwrap_or(1.0)
    }

    /// Registered sources for a team and kind.
    #[must_use]
    pub fn sources(&self, team: TeamId, kind: BuffKind) -> &[BuffSource] {
        self.teams
            .get(&team)
            .and_then(|kinds| kinds.get(&kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drops every buff granted by `(entity, slot)` on any team.
    ///
    /// Returns how many sources were removed.
    pub fn remove_from_source(&mut self, entity: EntityId, slot: PartSlot) -> usize {
        let mut removed = 0;
        for kinds in self.teams.values_mut() {
            for list in kinds.values_mut() {
                let before = list.len();
                list.retain(|b| !(b.source_entity == entity && b.source_slot == slot));
                removed += before - list.len();
            }
        }
        removed
    }

    /// Total number of registered sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.teams
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Returns `true` when no buff is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Battle arena containing every robot and the singleton state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arena {
    /// Monotonically increasing entity ID counter.
    next_id: u64,
    /// Robot storage with deterministic iteration order.
    entities: BTreeMap<EntityId, Entity>,
    /// Current simulation tick.
    tick: u64,
    /// Robots waiting to act.
    pub action_queue: ActionQueue,
    /// Team buff registry.
    pub team_buffs: TeamBuffs,
    /// Most recently resolved action.
    pub last_result: Option<ActionResult>,
}

impl Arena {
    /// Creates an empty arena at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns an idle robot with no parts and returns its ID.
    pub fn spawn(&mut self, settings: Settings) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, Entity::new(id, settings));
        id
    }

    /// Removes a robot, dropping it from the ready queue as well.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.action_queue.remove(id);
        self.entities.remove(&id)
    }

    /// Returns a robot by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a mutable robot by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns `true` if the robot exists and its head is intact.
    #[must_use]
    pub fn is_active(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(|e| !e.is_broken())
    }

    /// Entity IDs in deterministic (sorted) order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Robots in deterministic order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Mutable robots in deterministic order.
    pub fn entities_sorted_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.entities.values_mut()
    }

    /// Robots of one team, in ID order.
    pub fn team_members(&self, team: TeamId) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values().filter(move |e| e.team() == team)
    }

    /// The first leader of a team, if any.
    #[must_use]
    pub fn leader(&self, team: TeamId) -> Option<&Entity> {
        self.team_members(team).find(|e| e.settings.is_leader)
    }

    /// Number of robots.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the arena has no robots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Current simulation tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Advances the tick counter.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(name: &str, team: TeamId, leader: bool) -> Settings {
        Settings::new(name, name, team, leader, 1)
    }

    mod action_queue_tests {
        use super::*;

        #[test]
        fn enqueue_ignores_duplicates() {
            let mut queue = ActionQueue::default();
            assert!(queue.enqueue(EntityId::new(1)));
            assert!(!queue.enqueue(EntityId::new(1)));
            assert_eq!(queue.len(), 1);
        }

        #[test]
        fn sort_is_stable_and_descending() {
            let mut queue = ActionQueue::default();
            for id in [1, 2, 3, 4] {
                queue.enqueue(EntityId::new(id));
            }
            // 1 and 3 tie; 2 and 4 tie.
            let propulsion = |id: EntityId| if id.as_u64() % 2 == 0 { 5 } else { 10 };
            queue.sort_descending_by(propulsion);
            assert_eq!(
                queue.as_slice(),
                &[
                    EntityId::new(1),
                    EntityId::new(3),
                    EntityId::new(2),
                    EntityId::new(4)
                ]
            );
        }

        #[test]
        fn pop_and_remove() {
            let mut queue = ActionQueue::default();
            queue.enqueue(EntityId::new(7));
            queue.enqueue(EntityId::new(8));
            assert!(queue.remove(EntityId::new(8)));
            assert!(!queue.remove(EntityId::new(8)));
            assert_eq!(queue.pop_front(), Some(EntityId::new(7)));
            assert_eq!(queue.pop_front(), None);
        }
    }

    mod team_buff_tests {
        use super::*;

        fn source(entity: u64, slot: PartSlot, value: f64) -> BuffSource {
            BuffSource {
                source_entity: EntityId::new(entity),
                source_slot: slot,
                value,
            }
        }

        #[test]
        fn default_multiplier_is_one() {
            let buffs = TeamBuffs::default();
            assert_eq!(buffs.multiplier(TeamId::One, BuffKind::Accuracy), 1.0);
        }

        #[test]
        fn best_value_wins() {
            let mut buffs = TeamBuffs::default();
            buffs.add(TeamId::One, BuffKind::Accuracy, source(1, PartSlot::Head, 1.2));
            buffs.add(TeamId::One, BuffKind::Accuracy, source(2, PartSlot::Head, 1.2));
            buffs.add(TeamId::One, BuffKind::Accuracy, source(3, PartSlot::LeftArm, 1.1));
            assert!((buffs.multiplier(TeamId::One, BuffKind::Accuracy) - 1.2).abs() < 1e-12);
            assert_eq!(buffs.multiplier(TeamId::Two, BuffKind::Accuracy), 1.0);
        }

        #[test]
        fn same_source_slot_replaces() {
            let mut buffs = TeamBuffs::default();
            buffs.add(TeamId::One, BuffKind::Accuracy, source(1, PartSlot::RightArm, 1.2));
            buffs.add(TeamId::One, BuffKind::Accuracy, source(1, PartSlot::RightArm, 1.3));
            assert_eq!(buffs.len(), 1);
            assert!((buffs.multiplier(TeamId::One, BuffKind::Accuracy) - 1.3).abs() < 1e-12);
        }

        #[test]
        fn remove_from_source_is_exact() {
            let mut buffs = TeamBuffs::default();
            buffs.add(TeamId::One, BuffKind::Accuracy, source(1, PartSlot::RightArm, 1.2));
            buffs.add(TeamId::One, BuffKind::Accuracy, source(1, PartSlot::LeftArm, 1.1));
            buffs.add(TeamId::One, BuffKind::Accuracy, source(2, PartSlot::RightArm, 1.05));

            assert_eq!(buffs.remove_from_source(EntityId::new(1), PartSlot::RightArm), 1);
            let left: Vec<_> = buffs
                .sources(TeamId::One, BuffKind::Accuracy)
                .iter()
                .map(|b| (b.source_entity.as_u64(), b.source_slot))
                .collect();
            assert_eq!(left, vec![(1, PartSlot::LeftArm), (2, PartSlot::RightArm)]);
        }
    }

    mod arena_tests {
        use super::*;

        #[test]
        fn spawn_assigns_increasing_ids() {
            let mut arena = Arena::new();
            let a = arena.spawn(settings("a", TeamId::One, true));
            let b = arena.spawn(settings("b", TeamId::Two, false));
            assert!(a < b);
            assert_eq!(arena.entity_count(), 2);
        }

        #[test]
        fn despawn_drops_queue_entry() {
            let mut arena = Arena::new();
            let a = arena.spawn(settings("a", TeamId::One, true));
            arena.action_queue.enqueue(a);
            assert!(arena.despawn(a).is_some());
            assert!(arena.action_queue.is_empty());
            assert!(!arena.is_active(a));
        }

        #[test]
        fn team_members_and_leader() {
            let mut arena = Arena::new();
            arena.spawn(settings("a", TeamId::One, false));
            let lead = arena.spawn(settings("b", TeamId::One, true));
            arena.spawn(settings("c", TeamId::Two, false));
            assert_eq!(arena.team_members(TeamId::One).count(), 2);
            assert_eq!(arena.leader(TeamId::One).map(Entity::id), Some(lead));
            assert!(arena.leader(TeamId::Two).is_none());
        }

        #[test]
        fn tick_advances() {
            let mut arena = Arena::new();
            arena.advance_tick();
            arena.advance_tick();
            assert_eq!(arena.current_tick(), 2);
        }
    }
}
