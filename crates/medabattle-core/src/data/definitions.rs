//! Static definitions loaded once per battle and never mutated.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::{EffectData, PartSlot, TeamId};

/// Strips separators and lowercases, so `right-arm`, `rightArm` and
/// `RIGHT_ARM` all compare equal.
pub(crate) fn normalize_key(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .collect::<String>()
        .to_lowercase()
}

/// Broad family of an action part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartCategory {
    /// Fires at a preselected target.
    Ranged,
    /// Strikes the nearest enemy at execution.
    Melee,
    /// Supports allies or interferes with enemies.
    Intervention,
    /// Not an action part (legs, passive heads).
    #[default]
    None,
}

impl PartCategory {
    /// Returns `true` for categories that can be used as an action.
    #[must_use]
    pub const fn is_action(self) -> bool {
        matches!(self, Self::Ranged | Self::Melee | Self::Intervention)
    }

    /// Label used in action results and messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ranged => "ranged",
            Self::Melee => "melee",
            Self::Intervention => "intervention",
            Self::None => "none",
        }
    }
}

impl FromStr for PartCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "ranged" | "shooting" | "射撃" => Ok(Self::Ranged),
            "melee" | "fight" | "格闘" => Ok(Self::Melee),
            "intervention" | "介入" => Ok(Self::Intervention),
            "" | "none" | "なし" => Ok(Self::None),
            _ => Err(format!("unknown part category '{s}'")),
        }
    }
}

/// Action flavor of a part. Selects the formula row and the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartTrait {
    /// Careful ranged shot.
    Aim,
    /// Plain melee blow.
    Strike,
    /// Reckless melee blow.
    Berserk,
    /// Plain ranged shot.
    Shoot,
    /// Team buff.
    Support,
    /// Interference.
    Obstruct,
    /// No trait.
    #[default]
    None,
}

impl PartTrait {
    /// Label used in action results and messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Aim => "aim",
            Self::Strike => "strike",
            Self::Berserk => "berserk",
            Self::Shoot => "shoot",
            Self::Support => "support",
            Self::Obstruct => "obstruct",
            Self::None => "none",
        }
    }
}

impl fmt::Display for PartTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PartTrait {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "aim" | "狙い撃ち" => Ok(Self::Aim),
            "strike" | "殴る" => Ok(Self::Strike),
            "berserk" | "我武者羅" => Ok(Self::Berserk),
            "shoot" | "撃つ" => Ok(Self::Shoot),
            "support" | "支援" => Ok(Self::Support),
            "obstruct" | "妨害" => Ok(Self::Obstruct),
            "" | "none" | "なし" => Ok(Self::None),
            _ => Err(format!("unknown part trait '{s}'")),
        }
    }
}

/// Parses a part type column, accepting the Japanese slot names too.
pub(crate) fn parse_part_type(s: &str) -> Result<PartSlot, String> {
    match s.trim() {
        "頭部" => Ok(PartSlot::Head),
        "右腕" => Ok(PartSlot::RightArm),
        "左腕" => Ok(PartSlot::LeftArm),
        "脚部" => Ok(PartSlot::Legs),
        other => other.parse(),
    }
}

/// A named stat of a part, used by formula bonus terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartParameter {
    /// Armor at full health.
    #[serde(alias = "max-armor", alias = "max_armor")]
    MaxArmor,
    /// Base damage.
    Power,
    /// Base success rate.
    #[serde(alias = "success")]
    Accuracy,
    /// Charge time in seconds.
    Charge,
    /// Cooldown time in seconds.
    Cooldown,
    /// Speed of gauges (legs).
    Propulsion,
    /// Evasion (legs).
    Mobility,
    /// Defense rate (legs).
    #[serde(alias = "armor")]
    Defense,
    /// Stability.
    Stability,
}

/// Numeric stats of a part definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartStats {
    /// Armor at full health.
    pub max_armor: i32,
    /// Base damage.
    pub power: i32,
    /// Base success rate.
    pub accuracy: i32,
    /// Charge time in seconds.
    pub charge: i32,
    /// Cooldown time in seconds.
    pub cooldown: i32,
    /// Gauge speed.
    pub propulsion: i32,
    /// Evasion.
    pub mobility: i32,
    /// Defense rate; also the flat reduction of a defending part.
    pub defense: i32,
    /// Stability.
    pub stability: i32,
}

impl Default for PartStats {
    fn default() -> Self {
        Self {
            max_armor: 1,
            power: 0,
            accuracy: 0,
            charge: 1,
            cooldown: 1,
            propulsion: 0,
            mobility: 0,
            defense: 0,
            stability: 0,
        }
    }
}

impl PartStats {
    /// Returns a stat by name.
    #[must_use]
    pub const fn get(&self, param: PartParameter) -> i32 {
        match param {
            PartParameter::MaxArmor => self.max_armor,
            PartParameter::Power => self.power,
            PartParameter::Accuracy => self.accuracy,
            PartParameter::Charge => self.charge,
            PartParameter::Cooldown => self.cooldown,
            PartParameter::Propulsion => self.propulsion,
            PartParameter::Mobility => self.mobility,
            PartParameter::Defense => self.defense,
            PartParameter::Stability => self.stability,
        }
    }
}

/// A part as authored in the parts table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartDefinition {
    /// Unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Slot the part is built for.
    pub part_type: PartSlot,
    /// Category.
    pub category: PartCategory,
    /// Trait.
    pub action_trait: PartTrait,
    /// Free-form weapon label shown in messages.
    pub weapon_type: String,
    /// Numeric stats.
    pub stats: PartStats,
}

impl PartDefinition {
    /// Returns a stat as a float.
    #[must_use]
    pub fn stat(&self, param: PartParameter) -> f64 {
        f64::from(self.stats.get(param))
    }
}

/// A medal as authored in the medals table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalDefinition {
    /// Unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Personality key.
    pub personality: String,
    /// Skill level.
    pub skill_level: i32,
}

/// `stat * multiplier` contribution to a formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusTerm {
    /// Stat read from the acting part.
    #[serde(alias = "source-param", alias = "source_param")]
    pub source_param: PartParameter,
    /// Weight of the stat.
    pub multiplier: f64,
}

/// Kind of debuff a trait applies to its own user while charging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DebuffType {
    /// Lowers the user's evasion.
    #[serde(alias = "evasion-debuff", alias = "evasion_debuff", alias = "evasion")]
    EvasionDebuff,
    /// Lowers the user's defense.
    #[serde(alias = "defense-debuff", alias = "defense_debuff", alias = "defense")]
    DefenseDebuff,
}

/// A debuff the actor carries while charging a trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebuffEffect {
    /// Which rate is lowered.
    #[serde(rename = "type")]
    pub debuff_type: DebuffType,
    /// Factor applied to the rate.
    pub multiplier: f64,
}

impl DebuffEffect {
    /// Converts to the effect data attached to the actor.
    #[must_use]
    pub const fn to_effect(self) -> EffectData {
        match self.debuff_type {
            DebuffType::EvasionDebuff => EffectData::EvasionDebuff {
                multiplier: self.multiplier,
            },
            DebuffType::DefenseDebuff => EffectData::DefenseDebuff {
                multiplier: self.multiplier,
            },
        }
    }
}

/// Effect placed on the target of a successful hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetEffect {
    /// The effect.
    #[serde(flatten)]
    pub effect: EffectData,
    /// Duration in ticks.
    pub duration: u32,
}

/// Formula row for a trait.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionFormula {
    /// Added to the success rate.
    #[serde(alias = "success-rate-bonuses")]
    pub success_rate_bonuses: Vec<BonusTerm>,
    /// Added to power.
    #[serde(alias = "power-bonuses")]
    pub power_bonuses: Vec<BonusTerm>,
    /// Flat critical chance bonus.
    #[serde(alias = "critical-rate-bonus")]
    pub critical_rate_bonus: f64,
    /// Debuffs applied to the actor during its own charge.
    #[serde(alias = "user-debuffs")]
    pub user_debuffs: Vec<DebuffEffect>,
    /// Effects placed on the target on a hit.
    #[serde(alias = "target-effects")]
    pub target_effects: Vec<TargetEffect>,
}

static EMPTY_FORMULA: ActionFormula = ActionFormula {
    success_rate_bonuses: Vec::new(),
    power_bonuses: Vec::new(),
    critical_rate_bonus: 0.0,
    user_debuffs: Vec::new(),
    target_effects: Vec::new(),
};

/// A robot as authored in the loadouts table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotLoadout {
    /// Unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Side.
    pub team: TeamId,
    /// Leader flag.
    pub is_leader: bool,
    /// Vertical lane slot, 1-based.
    pub draw_index: u32,
    /// Medal id.
    pub medal_id: String,
    /// Part id per slot.
    pub parts: BTreeMap<PartSlot, String>,
}

/// Every static table a battle needs.
#[derive(Debug, Clone, Default)]
pub struct GameData {
    parts: HashMap<String, PartDefinition>,
    medals: HashMap<String, MedalDefinition>,
    formulas: HashMap<PartTrait, ActionFormula>,
    loadouts: Vec<RobotLoadout>,
}

impl GameData {
    /// Creates an empty data set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a part definition.
    pub fn insert_part(&mut self, part: PartDefinition) {
        self.parts.insert(part.id.clone(), part);
    }

    /// Adds or replaces a medal definition.
    pub fn insert_medal(&mut self, medal: MedalDefinition) {
        self.medals.insert(medal.id.clone(), medal);
    }

    /// Adds or replaces the formula of a trait.
    pub fn insert_formula(&mut self, action_trait: PartTrait, formula: ActionFormula) {
        self.formulas.insert(action_trait, formula);
    }

    /// Appends a loadout.
    pub fn push_loadout(&mut self, loadout: RobotLoadout) {
        self.loadouts.push(loadout);
    }

    /// Looks up a part definition.
    #[must_use]
    pub fn part(&self, id: &str) -> Option<&PartDefinition> {
        self.parts.get(id)
    }

    /// Looks up a medal definition.
    #[must_use]
    pub fn medal(&self, id: &str) -> Option<&MedalDefinition> {
        self.medals.get(id)
    }

    /// Formula of a trait; traits without a row get an empty formula.
    #[must_use]
    pub fn formula(&self, action_trait: PartTrait) -> &ActionFormula {
        self.formulas.get(&action_trait).unwrap_or(&EMPTY_FORMULA)
    }

    /// Loadouts in table order.
    #[must_use]
    pub fn loadouts(&self) -> &[RobotLoadout] {
        &self.loadouts
    }

    /// Number of part definitions.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }
}
