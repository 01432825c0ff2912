//! Part-info provider: effective stats derived from parts, effects and buffs.
//!
//! [`PartInfo`] is a read-only view over the arena and the static data. It
//! folds status effects and team buffs in at read time, so nothing has to be
//! undone when an effect or buff goes away. Clamping is left to the
//! calculators.
//!
//! Missing definitions are logged and read as zero.

use tracing::{debug, warn};

use crate::arena::{Arena, BuffKind};
use crate::data::{GameData, PartDefinition, PartParameter};
use crate::entity::{EntityId, PartSlot};

/// A usable action part of a robot.
#[derive(Debug, Clone, Copy)]
pub struct AttackPart<'a> {
    /// Slot the part sits in.
    pub slot: PartSlot,
    /// Static definition.
    pub definition: &'a PartDefinition,
}

/// Read-only stat view over an arena.
#[derive(Debug, Clone, Copy)]
pub struct PartInfo<'a> {
    arena: &'a Arena,
    data: &'a GameData,
}

impl<'a> PartInfo<'a> {
    /// Creates a view.
    #[must_use]
    pub const fn new(arena: &'a Arena, data: &'a GameData) -> Self {
        Self { arena, data }
    }

    /// The arena being viewed.
    #[must_use]
    pub const fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// The static data being viewed.
    #[must_use]
    pub const fn data(&self) -> &'a GameData {
        self.data
    }

    /// Definition of the part in a slot, broken or not.
    #[must_use]
    pub fn definition(&self, id: EntityId, slot: PartSlot) -> Option<&'a PartDefinition> {
        let part = self.arena.get(id)?.part(slot)?;
        let definition = self.data.part(&part.definition_id);
        if definition.is_none() {
            warn!(entity = %id, %slot, part = %part.definition_id, "missing part definition");
        }
        definition
    }

    /// A stat of the part in a slot, or `0` if the slot is empty or broken.
    #[must_use]
    pub fn part_parameter(&self, id: EntityId, slot: PartSlot, param: PartParameter) -> f64 {
        match self.arena.get(id) {
            Some(entity) if entity.has_working_part(slot) => self
                .definition(id, slot)
                .map_or(0.0, |d| d.stat(param)),
            _ => 0.0,
        }
    }

    fn legs_stat(&self, id: EntityId, param: PartParameter) -> i32 {
        match self.arena.get(id) {
            Some(entity) if entity.has_working_part(PartSlot::Legs) => self
                .definition(id, PartSlot::Legs)
                .map_or(0, |d| d.stats.get(param)),
            _ => 0,
        }
    }

    /// Propulsion of the legs, `0` if they are broken.
    #[must_use]
    pub fn overall_propulsion(&self, id: EntityId) -> i32 {
        self.legs_stat(id, PartParameter::Propulsion)
    }

    /// Mobility of the legs, `0` if they are broken.
    #[must_use]
    pub fn overall_mobility(&self, id: EntityId) -> i32 {
        self.legs_stat(id, PartParameter::Mobility)
    }

    /// Working head and arm parts whose category allows an action.
    #[must_use]
    pub fn available_attack_parts(&self, id: EntityId) -> Vec<AttackPart<'a>> {
        let Some(entity) = self.arena.get(id) else {
            return Vec::new();
        };
        PartSlot::ACTION_SLOTS
            .into_iter()
            .filter(|slot| entity.has_working_part(*slot))
            .filter_map(|slot| {
                self.definition(id, slot)
                    .filter(|d| d.category.is_action())
                    .map(|definition| AttackPart { slot, definition })
            })
            .collect()
    }

    /// Team accuracy multiplier for the robot's team; `1.0` without buffs.
    #[must_use]
    pub fn team_accuracy_multiplier(&self, id: EntityId) -> f64 {
        self.arena.get(id).map_or(1.0, |e| {
            self.arena.team_buffs.multiplier(e.team(), BuffKind::Accuracy)
        })
    }

    /// Accuracy of the acting part plus its trait's bonus terms, times the
    /// team accuracy multiplier.
    #[must_use]
    pub fn success_rate(&self, id: EntityId, part: &PartDefinition, slot: PartSlot) -> f64 {
        let bonus: f64 = self
            .data
            .formula(part.action_trait)
            .success_rate_bonuses
            .iter()
            .map(|term| self.part_parameter(id, slot, term.source_param) * term.multiplier)
            .sum();
        (f64::from(part.stats.accuracy) + bonus) * self.team_accuracy_multiplier(id)
    }

    /// Power of the acting part plus its trait's power bonus terms.
    #[must_use]
    pub fn power(&self, id: EntityId, part: &PartDefinition, slot: PartSlot) -> f64 {
        let bonus: f64 = self
            .data
            .formula(part.action_trait)
            .power_bonuses
            .iter()
            .map(|term| self.part_parameter(id, slot, term.source_param) * term.multiplier)
            .sum();
        f64::from(part.stats.power) + bonus
    }

    /// Legs mobility with evasion debuffs folded in.
    #[must_use]
    pub fn evasion_rate(&self, id: EntityId) -> f64 {
        let multiplier = self
            .arena
            .get(id)
            .map_or(1.0, |e| e.effects.evasion_multiplier());
        f64::from(self.overall_mobility(id)) * multiplier
    }

    /// Legs defense with defense debuffs folded in.
    #[must_use]
    pub fn defense_rate(&self, id: EntityId) -> f64 {
        let multiplier = self
            .arena
            .get(id)
            .map_or(1.0, |e| e.effects.defense_multiplier());
        f64::from(self.legs_stat(id, PartParameter::Defense)) * multiplier
    }
}

/// Revokes every team buff granted by the part in `(entity, slot)`.
///
/// Called when that part breaks. Returns how many sources were removed.
pub fn remove_buffs_from_source(arena: &mut Arena, entity: EntityId, slot: PartSlot) -> usize {
    let removed = arena.team_buffs.remove_from_source(entity, slot);
    if removed > 0 {
        debug!(%entity, %slot, removed, "revoked team buffs from broken part");
    }
    removed
}
