//! Parsing of the static tables from in-memory text.
//!
//! The core never touches the filesystem; hosts read the files and hand the
//! contents over. Column positions are fixed so existing content ports
//! unchanged:
//!
//! | Table | Columns |
//! |---|---|
//! | parts | `id, name, type, category, trait, weapon-type, max-armor, power, charge, cooldown, defense, accuracy, mobility, propulsion, stability` |
//! | medals | `id, name, personality, ..., skill-level` (index 6) |
//! | loadouts | `id, name, team, is-leader, draw-index, medal-id, head-id, right-arm-id, left-arm-id, legs-id` |

use std::collections::{BTreeMap, HashMap};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::warn;

use super::definitions::{
    parse_part_type, ActionFormula, GameData, MedalDefinition, PartDefinition, PartStats,
    PartTrait, RobotLoadout,
};
use crate::entity::{PartSlot, TeamId};
use crate::error::{BattleError, Result};

const MEDAL_SKILL_COLUMN: usize = 6;

/// One data row with its position, for error reporting.
struct Row<'a> {
    table: &'static str,
    number: usize,
    record: &'a StringRecord,
}

impl Row<'_> {
    fn text(&self, column: usize) -> &str {
        self.record.get(column).map_or("", str::trim)
    }

    fn required(&self, column: usize, what: &str) -> Result<String> {
        let value = self.text(column);
        if value.is_empty() {
            return Err(self.invalid(format!("missing {what}")));
        }
        Ok(value.to_string())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn int(&self, column: usize, default: i32) -> Result<i32> {
        let value = self.text(column);
        if value.is_empty() {
            return Ok(default);
        }
        if let Ok(v) = value.parse::<i32>() {
            return Ok(v);
        }
        // Spreadsheet exports sometimes write "12.0".
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v.trunc() as i32),
            _ => Err(self.invalid(format!("column {column}: '{value}' is not a number"))),
        }
    }

    fn invalid(&self, message: String) -> BattleError {
        BattleError::InvalidRow {
            table: self.table,
            row: self.number,
            message,
        }
    }
}

fn read_rows<T>(
    table: &'static str,
    text: &str,
    mut parse: impl FnMut(&Row<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut out = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|source| BattleError::Csv { table, source })?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let row = Row {
            table,
            number: i + 1,
            record: &record,
        };
        out.push(parse(&row)?);
    }
    Ok(out)
}

/// Parses the parts table.
///
/// # Errors
///
/// Returns [`BattleError::Csv`] for malformed CSV and
/// [`BattleError::InvalidRow`] for unknown enum values or non-numeric stats.
pub fn parse_parts(text: &str) -> Result<Vec<PartDefinition>> {
    read_rows("parts", text, |row| {
        let defaults = PartStats::default();
        Ok(PartDefinition {
            id: row.required(0, "id")?,
            name: row.text(1).to_string(),
            part_type: parse_part_type(row.text(2)).map_err(|e| row.invalid(e))?,
            category: row.text(3).parse().map_err(|e| row.invalid(e))?,
            action_trait: row.text(4).parse().map_err(|e| row.invalid(e))?,
            weapon_type: row.text(5).to_string(),
            stats: PartStats {
                max_armor: row.int(6, defaults.max_armor)?,
                power: row.int(7, defaults.power)?,
                charge: row.int(8, defaults.charge)?,
                cooldown: row.int(9, defaults.cooldown)?,
                defense: row.int(10, defaults.defense)?,
                accuracy: row.int(11, defaults.accuracy)?,
                mobility: row.int(12, defaults.mobility)?,
                propulsion: row.int(13, defaults.propulsion)?,
                stability: row.int(14, defaults.stability)?,
            },
        })
    })
}

/// Parses the medals table.
///
/// # Errors
///
/// Returns [`BattleError::Csv`] or [`BattleError::InvalidRow`].
pub fn parse_medals(text: &str) -> Result<Vec<MedalDefinition>> {
    read_rows("medals", text, |row| {
        Ok(MedalDefinition {
            id: row.required(0, "id")?,
            name: row.text(1).to_string(),
            personality: row.text(2).to_string(),
            skill_level: row.int(MEDAL_SKILL_COLUMN, 0)?,
        })
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Parses the robot loadouts table.
///
/// # Errors
///
/// Returns [`BattleError::Csv`] or [`BattleError::InvalidRow`] (bad team,
/// leader flag or draw index).
pub fn parse_loadouts(text: &str) -> Result<Vec<RobotLoadout>> {
    read_rows("loadouts", text, |row| {
        let team = row
            .text(2)
            .parse::<u8>()
            .ok()
            .and_then(TeamId::from_index)
            .ok_or_else(|| row.invalid(format!("team must be 0 or 1, got '{}'", row.text(2))))?;
        let is_leader = parse_bool(row.text(3))
            .ok_or_else(|| row.invalid(format!("bad leader flag '{}'", row.text(3))))?;
        let draw_index = u32::try_from(row.int(4, 1)?)
            .map_err(|_| row.invalid("draw index must not be negative".to_string()))?;

        let mut parts = BTreeMap::new();
        for (offset, slot) in PartSlot::ALL.into_iter().enumerate() {
            parts.insert(slot, row.required(6 + offset, slot.key())?);
        }

        Ok(RobotLoadout {
            id: row.required(0, "id")?,
            name: row.text(1).to_string(),
            team,
            is_leader,
            draw_index,
            medal_id: row.required(5, "medal id")?,
            parts,
        })
    })
}

/// Parses the formula table, a JSON map from trait name to formula.
///
/// Keys that name no known trait are skipped with a warning.
///
/// # Errors
///
/// Returns [`BattleError::Json`] if the document is malformed.
pub fn parse_formulas(json: &str) -> Result<HashMap<PartTrait, ActionFormula>> {
    let raw: HashMap<String, ActionFormula> =
        serde_json::from_str(json).map_err(|source| BattleError::Json {
            document: "formula table",
            source,
        })?;

    let mut formulas = HashMap::new();
    for (key, formula) in raw {
        match key.parse::<PartTrait>() {
            Ok(action_trait) => {
                formulas.insert(action_trait, formula);
            }
            Err(e) => warn!(key = %key, "skipping formula: {e}"),
        }
    }
    Ok(formulas)
}

impl GameData {
    /// Builds the data set from the four table documents.
    ///
    /// # Errors
    ///
    /// Propagates the first parse error.
    ///
    /// # Example
    ///
    /// ```
    /// use medabattle_core::data::GameData;
    ///
    /// let parts = "id,name,type,category,trait,weapon,armor,power,charge,cooldown,defense,accuracy,mobility,propulsion,stability\n\
    ///              h1,Sensor,head,ranged,shoot,Rifle,40,20,2,2,0,30,0,0,0\n";
    /// let medals = "id,name,personality,a,b,c,skill\nm1,Kabuto,hunter,,,,3\n";
    /// let loadouts = "id,name,team,leader,draw,medal,head,rarm,larm,legs\n";
    ///
    /// let data = GameData::from_tables(parts, medals, loadouts, "{}").unwrap();
    /// assert_eq!(data.part("h1").unwrap().stats.power, 20);
    /// assert_eq!(data.medal("m1").unwrap().skill_level, 3);
    /// ```
    pub fn from_tables(
        parts_csv: &str,
        medals_csv: &str,
        loadouts_csv: &str,
        formulas_json: &str,
    ) -> Result<Self> {
        let mut data = Self::new();
        for part in parse_parts(parts_csv)? {
            data.insert_part(part);
        }
        for medal in parse_medals(medals_csv)? {
            data.insert_medal(medal);
        }
        for loadout in parse_loadouts(loadouts_csv)? {
            data.push_loadout(loadout);
        }
        for (action_trait, formula) in parse_formulas(formulas_json)? {
            data.insert_formula(action_trait, formula);
        }
        Ok(data)
    }
}
