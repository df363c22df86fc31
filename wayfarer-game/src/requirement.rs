//! Requirement predicates gating scenes and transitions.
//!
//! Requirements are written as short strings in scene data:
//!
//! - `visited:<scene_id>` holds once the scene was visited,
//! - `goal:<goal>` holds once the goal was recorded,
//! - `stat:<name><op><value>` compares a stat with `>=`, `<=` or `==`.
//!
//! Strings are parsed once, when scene data is loaded. Anything that does not
//! parse becomes [`Requirement::Unrecognized`], which never holds.

use crate::state::PlayerState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const VISITED_PREFIX: &str = "visited:";
const GOAL_PREFIX: &str = "goal:";
const STAT_PREFIX: &str = "stat:";

/// Comparison operator of a stat requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    AtLeast,
    AtMost,
    Equal,
}

impl Comparison {
    // Two-character operators, all the same width.
    const OPERATORS: [(&'static str, Self); 3] = [
        (">=", Self::AtLeast),
        ("<=", Self::AtMost),
        ("==", Self::Equal),
    ];

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::AtLeast => ">=",
            Self::AtMost => "<=",
            Self::Equal => "==",
        }
    }

    #[must_use]
    pub const fn holds(self, actual: i32, expected: i32) -> bool {
        match self {
            Self::AtLeast => actual >= expected,
            Self::AtMost => actual <= expected,
            Self::Equal => actual == expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementError {
    #[error("requirement '{0}' has no recognized prefix")]
    UnknownPrefix(String),
    #[error("requirement '{0}' names nothing")]
    EmptyOperand(String),
    #[error("stat requirement '{0}' must look like stat:<name><op><integer>")]
    MalformedStat(String),
}

/// A pre-parsed gating predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Requirement {
    Visited(String),
    Goal(String),
    Stat {
        name: String,
        op: Comparison,
        value: i32,
    },
    /// Kept verbatim so the data round-trips; always evaluates to `false`.
    Unrecognized(String),
}

impl Requirement {
    /// Parse leniently: anything malformed becomes a predicate that never holds.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|err: RequirementError| {
            log::warn!("{err}; treating as never satisfied");
            Self::Unrecognized(raw.to_string())
        })
    }

    #[must_use]
    pub fn is_met(&self, state: &PlayerState) -> bool {
        match self {
            Self::Visited(scene_id) => state.has_visited(scene_id),
            Self::Goal(goal) => state.has_goal(goal),
            Self::Stat { name, op, value } => op.holds(state.stat(name), *value),
            Self::Unrecognized(_) => false,
        }
    }
}

/// Evaluate a raw requirement string against a player.
#[must_use]
pub fn evaluate(requirement: &str, state: &PlayerState) -> bool {
    requirement
        .parse::<Requirement>()
        .is_ok_and(|parsed| parsed.is_met(state))
}

/// True when every requirement holds. Empty lists always hold.
#[must_use]
pub fn all_met(requirements: &[Requirement], state: &PlayerState) -> bool {
    requirements.iter().all(|requirement| requirement.is_met(state))
}

/// True when at least one requirement holds.
#[must_use]
pub fn any_met(requirements: &[Requirement], state: &PlayerState) -> bool {
    requirements.iter().any(|requirement| requirement.is_met(state))
}

impl FromStr for Requirement {
    type Err = RequirementError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if let Some(scene_id) = trimmed.strip_prefix(VISITED_PREFIX) {
            return non_empty(scene_id, raw).map(Self::Visited);
        }
        if let Some(goal) = trimmed.strip_prefix(GOAL_PREFIX) {
            return non_empty(goal, raw).map(Self::Goal);
        }
        if let Some(expr) = trimmed.strip_prefix(STAT_PREFIX) {
            return parse_stat(expr).ok_or_else(|| RequirementError::MalformedStat(raw.to_string()));
        }
        Err(RequirementError::UnknownPrefix(raw.to_string()))
    }
}

fn non_empty(operand: &str, raw: &str) -> Result<String, RequirementError> {
    let operand = operand.trim();
    if operand.is_empty() {
        Err(RequirementError::EmptyOperand(raw.to_string()))
    } else {
        Ok(operand.to_string())
    }
}

const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// `<name><op><integer>` where the name is `[A-Za-z0-9_-]+`.
///
/// The name cannot contain operator characters, so the first non-name
/// character must begin the operator and there is exactly one split point.
fn parse_stat(expr: &str) -> Option<Requirement> {
    let name_len = expr.find(|c: char| !is_name_char(c))?;
    let (name, rest) = expr.split_at(name_len);
    if name.is_empty() {
        return None;
    }
    let (op, operand) = Comparison::OPERATORS
        .iter()
        .find_map(|(symbol, op)| rest.strip_prefix(symbol).map(|operand| (*op, operand)))?;
    let value = operand.trim().parse::<i32>().ok()?;
    Some(Requirement::Stat {
        name: name.to_string(),
        op,
        value,
    })
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visited(scene_id) => write!(f, "{VISITED_PREFIX}{scene_id}"),
            Self::Goal(goal) => write!(f, "{GOAL_PREFIX}{goal}"),
            Self::Stat { name, op, value } => {
                write!(f, "{STAT_PREFIX}{name}{}{value}", op.symbol())
            }
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

impl From<String> for Requirement {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&str> for Requirement {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<Requirement> for String {
    fn from(requirement: Requirement) -> Self {
        requirement.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(stat: &str, value: i32) -> PlayerState {
        PlayerState::new(1).with_stat(stat, value)
    }

    #[test]
    fn stat_operators_compare_exactly() {
        for value in 0..6 {
            let state = state_with("bravery", value);
            assert_eq!(evaluate("stat:bravery>=3", &state), value >= 3);
            assert_eq!(evaluate("stat:bravery<=3", &state), value <= 3);
            assert_eq!(evaluate("stat:bravery==3", &state), value == 3);
        }
    }

    #[test]
    fn visited_and_goal_check_sets() {
        let mut state = PlayerState::new(1);
        assert!(!evaluate("visited:forest", &state));
        assert!(!evaluate("goal:find_map", &state));
        state.visited_scenes.insert("forest".into());
        state.goals.insert("find_map".into());
        assert!(evaluate("visited:forest", &state));
        assert!(evaluate("goal:find_map", &state));
    }

    #[test]
    fn unknown_or_malformed_requirements_fail_closed() {
        let state = state_with("bravery", 99);
        for raw in [
            "level:3",
            "",
            "visited:",
            "stat:bravery>3",
            "stat:bravery>=",
            "stat:bravery>=3x",
            "stat:>=3",
            "stat:a<=b>=1",
            "STAT:bravery>=1",
        ] {
            assert!(!evaluate(raw, &state), "{raw} should not hold");
            assert!(!Requirement::parse(raw).is_met(&state), "{raw} should not hold");
        }
    }

    #[test]
    fn missing_stat_counts_as_zero() {
        let state = PlayerState::new(1);
        assert!(evaluate("stat:luck<=0", &state));
        assert!(!evaluate("stat:luck>=1", &state));
    }

    #[test]
    fn parsing_is_structured() {
        assert_eq!(
            "stat:gold>=-5".parse::<Requirement>(),
            Ok(Requirement::Stat {
                name: "gold".into(),
                op: Comparison::AtLeast,
                value: -5,
            })
        );
        assert_eq!(
            "level:3".parse::<Requirement>(),
            Err(RequirementError::UnknownPrefix("level:3".into()))
        );
        assert!(matches!(
            "stat:bravery=>2".parse::<Requirement>(),
            Err(RequirementError::MalformedStat(_))
        ));
    }

    #[test]
    fn serde_round_trips_through_strings() {
        let parsed: Vec<Requirement> =
            serde_json::from_str(r#"["stat:bravery>=2", "goal:x", "weird"]"#).expect("parse");
        assert_eq!(parsed[0].to_string(), "stat:bravery>=2");
        assert_eq!(parsed[2], Requirement::Unrecognized("weird".into()));
        let json = serde_json::to_string(&parsed).expect("serialize");
        assert_eq!(json, r#"["stat:bravery>=2","goal:x","weird"]"#);
    }
}
