//! Message templates and the result-to-strings step.
//!
//! Handlers never build text. After an action resolves, [`describe_action`]
//! turns its [`ActionResult`] into the lines the host shows in its message
//! window. Templates come from a [`MessageCatalog`]: built-in English
//! defaults, optionally overridden by a JSON table of `{id, text}` entries.
//!
//! Two placeholder styles are supported so existing tables port unchanged:
//! named `{attacker}` tokens and ordered `%s`/`%d`/`%f` tokens.
//!
//! ```
//! use medabattle_core::messages::{MessageArg, MessageCatalog};
//!
//! let catalog = MessageCatalog::from_json(
//!     r#"[{"id":"damage","text":"%s took %d damage"}]"#,
//! ).unwrap();
//! let line = catalog.format_ordered(
//!     "damage",
//!     &[MessageArg::from("Metabee"), MessageArg::from(12)],
//! );
//! assert_eq!(line, "Metabee took 12 damage");
//! ```

use std::collections::HashMap;
use std::fmt::{self, Display};

use serde::Deserialize;
use tracing::warn;

use crate::action::ActionResult;
use crate::data::PartTrait;
use crate::entity::{PartSlot, TeamId};
use crate::error::{BattleError, Result};

/// Message ids the core emits, with their English defaults.
const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("battle_start", "Robattle, start!"),
    ("action_declare", "{attacker} uses {action}! ({trait})"),
    ("no_target", "{attacker} could not find a target!"),
    ("miss", "{defender} dodged the attack!"),
    ("critical", "A critical hit!"),
    ("defended", "{defender} guarded with its {defender_part}!"),
    ("damage", "{defender}'s {part} took {damage} damage!"),
    ("part_broken", "{defender}'s {part} was destroyed!"),
    ("robot_broken", "{defender} has stopped functioning!"),
    ("support", "{attacker} raised the team's accuracy!"),
    ("obstruct", "{attacker} is interfering with {defender}!"),
    ("game_over", "{team} wins!"),
    ("player_turn", "Choose an action for {actor}."),
];

/// An ordered argument for `%s`, `%d` and `%f` tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageArg {
    /// Free text.
    Text(String),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
}

impl From<&str> for MessageArg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MessageArg {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for MessageArg {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for MessageArg {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl Display for MessageArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl MessageArg {
    #[allow(clippy::cast_possible_truncation)]
    fn render(&self, token: char) -> String {
        match (token, self) {
            ('d', Self::Float(v)) => format!("{}", v.floor() as i64),
            ('f', Self::Int(v)) => format!("{v}"),
            _ => self.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageEntry {
    id: String,
    text: String,
}

/// Templates keyed by message id.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    templates: HashMap<String, String>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            templates: DEFAULT_TEMPLATES
                .iter()
                .map(|(id, text)| ((*id).to_string(), (*text).to_string()))
                .collect(),
        }
    }
}

impl MessageCatalog {
    /// Loads a `[{id, text}]` table on top of the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BattleError::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<MessageEntry> =
            serde_json::from_str(json).map_err(|source| BattleError::Json {
                document: "message table",
                source,
            })?;
        let mut catalog = Self::default();
        for entry in entries {
            catalog.templates.insert(entry.id, entry.text);
        }
        Ok(catalog)
    }

    /// Raw template for an id. Unknown ids render as the id itself.
    #[must_use]
    pub fn template<'a>(&'a self, id: &'a str) -> &'a str {
        match self.templates.get(id) {
            Some(text) => text,
            None => {
                warn!(id, "missing message template");
                id
            }
        }
    }

    /// Renders a template with named `{key}` placeholders.
    ///
    /// Placeholders without a matching argument are left as written.
    #[must_use]
    pub fn format(&self, id: &str, args: &[(&str, &dyn Display)]) -> String {
        let mut text = self.template(id).to_string();
        for (key, value) in args {
            let token = format!("{{{key}}}");
            if text.contains(&token) {
                text = text.replace(&token, &value.to_string());
            }
        }
        text
    }

    /// Renders a template with ordered `%s`, `%d` and `%f` tokens.
    ///
    /// `%%` renders a literal percent sign. Tokens beyond the supplied
    /// arguments render empty.
    #[must_use]
    pub fn format_ordered(&self, id: &str, args: &[MessageArg]) -> String {
        let template = self.template(id);
        let mut out = String::with_capacity(template.len());
        let mut args = args.iter();
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.peek().copied() {
                Some('%') => {
                    chars.next();
                    out.push('%');
                }
                Some(token @ ('s' | 'd' | 'f')) => {
                    chars.next();
                    if let Some(arg) = args.next() {
                        out.push_str(&arg.render(token));
                    }
                }
                _ => out.push('%'),
            }
        }
        out
    }
}

fn slot_label(slot: Option<PartSlot>) -> String {
    slot.map_or_else(String::new, |s| s.key().replace('-', " "))
}

/// Builds the message lines for a resolved action.
#[must_use]
pub fn describe_action(catalog: &MessageCatalog, result: &ActionResult) -> Vec<String> {
    let attacker = result.attacker_name.as_str();
    let defender = result.defender_name.as_str();
    let mut lines = vec![catalog.format(
        "action_declare",
        &[
            ("attacker", &attacker),
            ("action", &result.action_name),
            ("trait", &result.action_trait),
        ],
    )];

    match result.action_trait {
        PartTrait::Support => {
            lines.push(catalog.format("support", &[("attacker", &attacker)]));
            return lines;
        }
        PartTrait::Obstruct => {
            if result.target.is_some() {
                lines.push(catalog.format(
                    "obstruct",
                    &[("attacker", &attacker), ("defender", &defender)],
                ));
            } else {
                lines.push(catalog.format("no_target", &[("attacker", &attacker)]));
            }
            return lines;
        }
        _ => {}
    }

    if result.target.is_none() {
        lines.push(catalog.format("no_target", &[("attacker", &attacker)]));
        return lines;
    }
    if !result.is_hit {
        lines.push(catalog.format("miss", &[("defender", &defender)]));
        return lines;
    }
    if result.is_critical {
        lines.push(catalog.format("critical", &[]));
    }

    let part = if result.hit_part_name.is_empty() {
        slot_label(result.actual_hit_slot)
    } else {
        result.hit_part_name.clone()
    };
    if result.is_defended {
        lines.push(catalog.format(
            "defended",
            &[("defender", &defender), ("defender_part", &part)],
        ));
    }
    lines.push(catalog.format(
        "damage",
        &[
            ("defender", &defender),
            ("part", &part),
            ("damage", &result.damage_dealt),
        ],
    ));
    if result.target_part_broken {
        lines.push(catalog.format("part_broken", &[("defender", &defender), ("part", &part)]));
    }
    if result.target_robot_broken {
        lines.push(catalog.format("robot_broken", &[("defender", &defender)]));
    }
    lines
}

/// Builds the game-over line.
#[must_use]
pub fn describe_game_over(catalog: &MessageCatalog, winner: TeamId) -> String {
    catalog.format("game_over", &[("team", &winner)])
}
