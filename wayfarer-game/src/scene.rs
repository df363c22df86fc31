//! Scene definitions as loaded from declarative scene data.
use crate::combat::EnemyKind;
use crate::constants::DEFAULT_SCENE_WEIGHT;
use crate::end_conditions::EndCondition;
use crate::requirement::Requirement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Narrative category of a scene; drives action availability and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    Story,
    Choice,
    Encounter,
    Dialogue,
    Rest,
    Exploration,
    Quest,
    Loot,
    Combat,
}

impl SceneKind {
    pub const ALL: [Self; 9] = [
        Self::Story,
        Self::Choice,
        Self::Encounter,
        Self::Dialogue,
        Self::Rest,
        Self::Exploration,
        Self::Quest,
        Self::Loot,
        Self::Combat,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Choice => "choice",
            Self::Encounter => "encounter",
            Self::Dialogue => "dialogue",
            Self::Rest => "rest",
            Self::Exploration => "exploration",
            Self::Quest => "quest",
            Self::Loot => "loot",
            Self::Combat => "combat",
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Weighted, optionally gated edge to a candidate next scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneTransition {
    pub to: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub requires: Vec<Requirement>,
}

impl SceneTransition {
    #[must_use]
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            weight: DEFAULT_SCENE_WEIGHT,
            requires: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = sanitize_weight(weight);
        self
    }

    #[must_use]
    pub fn requiring(mut self, requirement: impl Into<Requirement>) -> Self {
        self.requires.push(requirement.into());
        self
    }
}

/// Fixed reward granted when a scene is applied.
///
/// Values are written as dice expressions ("1d6+2") in scene data but every
/// present field pays a flat amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SceneReward {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamina: Option<String>,
}

/// A node in the adventure graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub kind: SceneKind,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub once: bool,
    #[serde(default)]
    pub requires: Vec<Requirement>,
    #[serde(default)]
    pub blocks: Vec<Requirement>,
    #[serde(default)]
    pub transitions: Vec<SceneTransition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<u32>,
    #[serde(default)]
    pub risk_delta: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<SceneReward>,
    /// Enemy archetype fought when this is a combat scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enemy: Option<EnemyKind>,
}

fn default_weight() -> f64 {
    DEFAULT_SCENE_WEIGHT
}

/// Negative and non-finite weights collapse to zero.
pub(crate) fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

impl Scene {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: SceneKind) -> Self {
        Self {
            id: id.into(),
            kind,
            weight: DEFAULT_SCENE_WEIGHT,
            once: false,
            requires: Vec::new(),
            blocks: Vec::new(),
            transitions: Vec::new(),
            cooldown: None,
            risk_delta: 0,
            reward: None,
            enemy: None,
        }
    }

    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = sanitize_weight(weight);
        self
    }

    #[must_use]
    pub const fn once(mut self) -> Self {
        self.once = true;
        self
    }

    #[must_use]
    pub fn requiring(mut self, requirement: impl Into<Requirement>) -> Self {
        self.requires.push(requirement.into());
        self
    }

    #[must_use]
    pub fn blocked_by(mut self, requirement: impl Into<Requirement>) -> Self {
        self.blocks.push(requirement.into());
        self
    }

    #[must_use]
    pub fn with_transition(mut self, transition: SceneTransition) -> Self {
        self.transitions.push(transition);
        self
    }

    #[must_use]
    pub const fn with_cooldown(mut self, turns: u32) -> Self {
        self.cooldown = Some(turns);
        self
    }

    #[must_use]
    pub const fn with_risk_delta(mut self, delta: i32) -> Self {
        self.risk_delta = delta;
        self
    }

    #[must_use]
    pub fn with_reward(mut self, reward: SceneReward) -> Self {
        self.reward = Some(reward);
        self
    }

    #[must_use]
    pub const fn with_enemy(mut self, enemy: EnemyKind) -> Self {
        self.enemy = Some(enemy);
        self
    }

    /// Starting scenes are the ones without entry requirements.
    #[must_use]
    pub fn is_entry_point(&self) -> bool {
        self.requires.is_empty()
    }
}

/// Top-level scene definition document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SceneData {
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub end_conditions: Vec<EndCondition>,
}

impl SceneData {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            scenes: Vec::new(),
            end_conditions: Vec::new(),
        }
    }

    /// Load scene data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid scene data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut data: Self = serde_json::from_str(json)?;
        for scene in &mut data.scenes {
            scene.weight = sanitize_weight(scene.weight);
            for transition in &mut scene.transitions {
                transition.weight = sanitize_weight(transition.weight);
            }
        }
        Ok(data)
    }

    /// Scene data bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled JSON is malformed.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        Self::from_json(include_str!("../data/scenes.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_defaults_fill_missing_fields() {
        let json = r#"{
            "scenes": [
                { "id": "tavern_intro", "kind": "story" },
                {
                    "id": "forest_encounter",
                    "kind": "encounter",
                    "weight": 2.5,
                    "once": true,
                    "requires": ["stat:bravery>=2"],
                    "cooldown": 3,
                    "risk_delta": 2,
                    "reward": { "gold": "1d6" },
                    "transitions": [{ "to": "tavern_intro" }]
                }
            ],
            "end_conditions": [{ "kind": "risk_threshold", "threshold": 10 }]
        }"#;

        let data = SceneData::from_json(json).expect("valid scene data");
        assert_eq!(data.scenes.len(), 2);
        let intro = &data.scenes[0];
        assert!((intro.weight - 1.0).abs() < f64::EPSILON);
        assert!(!intro.once);
        assert!(intro.is_entry_point());
        assert_eq!(intro.risk_delta, 0);

        let forest = &data.scenes[1];
        assert_eq!(forest.kind, SceneKind::Encounter);
        assert_eq!(forest.cooldown, Some(3));
        assert_eq!(forest.requires[0].to_string(), "stat:bravery>=2");
        assert_eq!(forest.transitions[0].to, "tavern_intro");
        assert!((forest.transitions[0].weight - 1.0).abs() < f64::EPSILON);
        assert_eq!(
            forest.reward.as_ref().and_then(|r| r.gold.as_deref()),
            Some("1d6")
        );
        assert_eq!(data.end_conditions.len(), 1);
    }

    #[test]
    fn invalid_weights_are_zeroed() {
        let json = r#"{"scenes":[{"id":"a","kind":"loot","weight":-4,
            "transitions":[{"to":"a","weight":-1}]}]}"#;
        let data = SceneData::from_json(json).expect("parse");
        assert!(data.scenes[0].weight.abs() < f64::EPSILON);
        assert!(data.scenes[0].transitions[0].weight.abs() < f64::EPSILON);
        assert!(Scene::new("x", SceneKind::Rest).with_weight(f64::NAN).weight.abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(SceneData::from_json(r#"{"scenes":[{"id":"a","kind":"dance"}]}"#).is_err());
    }

    #[test]
    fn bundled_data_parses() {
        let data = SceneData::bundled().expect("bundled scenes");
        assert!(!data.scenes.is_empty());
        assert!(!data.end_conditions.is_empty());
        for kind in SceneKind::ALL {
            assert!(
                data.scenes.iter().any(|scene| scene.kind == kind),
                "bundled data lacks a {kind} scene"
            );
        }
    }
}
