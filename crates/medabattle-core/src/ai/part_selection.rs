//! Part-selection strategies: which of its own parts a robot uses.

use crate::entity::PartSlot;
use crate::part_info::AttackPart;

/// Picks one of the robot's usable action parts.
///
/// `parts` comes from
/// [`PartInfo::available_attack_parts`](crate::part_info::PartInfo::available_attack_parts)
/// and is in slot order. Ties resolve to the earliest slot.
pub trait PartSelectionStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Chooses a slot, or `None` if `parts` is empty.
    fn select(&self, parts: &[AttackPart<'_>]) -> Option<PartSlot>;
}

/// The part with the most power.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestPower;

impl PartSelectionStrategy for HighestPower {
    fn name(&self) -> &'static str {
        "highest_power"
    }

    fn select(&self, parts: &[AttackPart<'_>]) -> Option<PartSlot> {
        // `max_by_key` keeps the last maximum; scan by hand to keep the first.
        let mut best: Option<&AttackPart<'_>> = None;
        for part in parts {
            if best.map_or(true, |b| part.definition.stats.power > b.definition.stats.power) {
                best = Some(part);
            }
        }
        best.map(|p| p.slot)
    }
}

/// The part with the shortest charge time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestCharge;

impl PartSelectionStrategy for ShortestCharge {
    fn name(&self) -> &'static str {
        "shortest_charge"
    }

    fn select(&self, parts: &[AttackPart<'_>]) -> Option<PartSlot> {
        parts
            .iter()
            .min_by_key(|p| p.definition.stats.charge)
            .map(|p| p.slot)
    }
}

/// The first usable part in slot order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstAvailable;

impl PartSelectionStrategy for FirstAvailable {
    fn name(&self) -> &'static str {
        "first_available"
    }

    fn select(&self, parts: &[AttackPart<'_>]) -> Option<PartSlot> {
        parts.first().map(|p| p.slot)
    }
}
