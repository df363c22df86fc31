//! Immutable adventure graph and its availability and bookkeeping rules.

use crate::constants::{
    REWARD_GOLD_FLAT, REWARD_STAMINA_ENERGY, REWARD_XP_FLAT, STAT_GOLD, STAT_XP,
};
use crate::end_conditions::{EndCondition, EndReason, check_ended};
use crate::requirement::{all_met, any_met};
use crate::scene::{Scene, SceneData, SceneTransition};
use crate::state::PlayerState;
use std::collections::HashMap;
use std::hash::Hasher;
use std::path::Path;
use thiserror::Error;
use twox_hash::XxHash64;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to read scene data from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("scene data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("scene id '{0}' is declared more than once")]
    DuplicateScene(String),
}

/// The loaded, read-only scene graph shared by every run.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    scenes: Vec<Scene>,
    index: HashMap<String, usize>,
    end_conditions: Vec<EndCondition>,
    fingerprint: u64,
}

impl SceneGraph {
    /// Graph with no scenes and no end conditions.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a graph, rejecting duplicate scene ids.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateScene`] when two scenes share an id.
    pub fn from_data(data: SceneData) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(data.scenes.len());
        for (position, scene) in data.scenes.iter().enumerate() {
            if index.insert(scene.id.clone(), position).is_some() {
                return Err(GraphError::DuplicateScene(scene.id.clone()));
            }
        }
        let fingerprint = fingerprint_of(&data);
        Ok(Self {
            scenes: data.scenes,
            index,
            end_conditions: data.end_conditions,
            fingerprint,
        })
    }

    /// Strictly parse a JSON scene document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or declares duplicate ids.
    pub fn try_from_json(json: &str) -> Result<Self, GraphError> {
        Self::from_data(SceneData::from_json(json)?)
    }

    /// Strictly read and parse a scene document from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its contents are invalid.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::try_from_json(&json)
    }

    /// Parse a JSON scene document, degrading to an empty graph on failure.
    #[must_use]
    pub fn from_json_or_empty(json: &str) -> Self {
        Self::try_from_json(json).unwrap_or_else(|err| {
            log::warn!("scene data rejected, continuing with an empty graph: {err}");
            Self::empty()
        })
    }

    /// Load a scene document from disk, degrading to an empty graph on failure.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        Self::try_load(path).unwrap_or_else(|err| {
            log::warn!("scene data unavailable, continuing with an empty graph: {err}");
            Self::empty()
        })
    }

    /// The scene graph bundled with the crate.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json_or_empty(include_str!("../data/scenes.json"))
    }

    #[must_use]
    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.index.get(id).and_then(|&idx| self.scenes.get(idx))
    }

    /// Scenes in declaration order.
    #[must_use]
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    #[must_use]
    pub fn end_conditions(&self) -> &[EndCondition] {
        &self.end_conditions
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Stable content hash used to match snapshots against the graph they came from.
    #[must_use]
    pub const fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    #[must_use]
    pub fn is_available(&self, scene: &Scene, state: &PlayerState) -> bool {
        if scene.once && state.has_visited(&scene.id) {
            return false;
        }
        if state.cooldown_remaining(&scene.id) > 0 {
            return false;
        }
        all_met(&scene.requires, state) && !any_met(&scene.blocks, state)
    }

    /// Available scenes without entry requirements, in declaration order.
    #[must_use]
    pub fn eligible_starting_scenes(&self, state: &PlayerState) -> Vec<&Scene> {
        self.scenes
            .iter()
            .filter(|scene| scene.is_entry_point() && self.is_available(scene, state))
            .collect()
    }

    /// Outgoing transitions whose own gate passes and whose target is available.
    ///
    /// Transitions to unknown scenes are skipped. An unknown source scene has
    /// no transitions.
    #[must_use]
    pub fn eligible_transitions(
        &self,
        from_scene: &str,
        state: &PlayerState,
    ) -> Vec<(&SceneTransition, &Scene)> {
        let Some(from) = self.scene(from_scene) else {
            return Vec::new();
        };
        from.transitions
            .iter()
            .filter(|transition| all_met(&transition.requires, state))
            .filter_map(|transition| {
                let target = self.scene(&transition.to)?;
                self.is_available(target, state)
                    .then_some((transition, target))
            })
            .collect()
    }

    /// Record that `scene` was played: history, cooldowns, risk, steps and reward.
    pub fn apply_consequences(&self, scene: &Scene, state: &mut PlayerState) {
        state.visited_scenes.insert(scene.id.clone());

        state.scene_cooldowns.retain(|id, remaining| {
            if *id == scene.id {
                return true;
            }
            *remaining = remaining.saturating_sub(1);
            *remaining > 0
        });
        match scene.cooldown {
            Some(turns) if turns > 0 => {
                state.scene_cooldowns.insert(scene.id.clone(), turns);
            }
            _ => {
                state.scene_cooldowns.remove(&scene.id);
            }
        }

        state.adjust_risk(scene.risk_delta);
        state.step_count = state.step_count.saturating_add(1);

        if let Some(reward) = &scene.reward {
            if reward.gold.is_some() {
                state.add_stat(STAT_GOLD, REWARD_GOLD_FLAT);
            }
            if reward.xp.is_some() {
                state.add_stat(STAT_XP, REWARD_XP_FLAT);
            }
            if reward.stamina.is_some() {
                state.adjust_energy(REWARD_STAMINA_ENERGY);
            }
        }
    }

    /// First configured end condition that holds for `state`.
    #[must_use]
    pub fn check_ended(&self, state: &PlayerState) -> Option<EndReason> {
        check_ended(&self.end_conditions, state)
    }
}

fn fingerprint_of(data: &SceneData) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    if let Ok(bytes) = serde_json::to_vec(data) {
        hasher.write(&bytes);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneKind, SceneReward};

    fn graph(scenes: Vec<Scene>) -> SceneGraph {
        SceneGraph::from_data(SceneData {
            scenes,
            end_conditions: vec![EndCondition::risk_threshold(10)],
        })
        .expect("unique ids")
    }

    #[test]
    fn bravery_gates_forest_encounter() {
        let forest = Scene::new("forest_encounter", SceneKind::Encounter)
            .requiring("stat:bravery>=2");
        let g = graph(vec![forest.clone()]);

        let brave = PlayerState::new(1).with_stat("bravery", 5);
        let timid = PlayerState::new(1).with_stat("bravery", 1);
        assert!(g.is_available(&forest, &brave));
        assert!(!g.is_available(&forest, &timid));
    }

    #[test]
    fn blocks_and_once_hide_scenes() {
        let shrine = Scene::new("shrine", SceneKind::Rest)
            .once()
            .blocked_by("goal:cursed");
        let g = graph(vec![shrine.clone()]);
        let mut state = PlayerState::new(1);
        assert_eq!(g.eligible_starting_scenes(&state).len(), 1);

        state.goals.insert("cursed".into());
        assert!(g.eligible_starting_scenes(&state).is_empty());

        state.goals.clear();
        g.apply_consequences(&shrine, &mut state);
        assert!(g.eligible_starting_scenes(&state).is_empty());
    }

    #[test]
    fn starting_scenes_exclude_gated_scenes() {
        let g = graph(vec![
            Scene::new("tavern_intro", SceneKind::Story),
            Scene::new("forest_encounter", SceneKind::Encounter).requiring("stat:bravery>=0"),
            Scene::new("market", SceneKind::Dialogue),
        ]);
        let ids: Vec<&str> = g
            .eligible_starting_scenes(&PlayerState::new(1))
            .iter()
            .map(|scene| scene.id.as_str())
            .collect();
        assert_eq!(ids, vec!["tavern_intro", "market"]);
    }

    #[test]
    fn transitions_filter_gates_and_missing_targets() {
        let g = graph(vec![
            Scene::new("crossroads", SceneKind::Choice)
                .with_transition(SceneTransition::new("cave"))
                .with_transition(SceneTransition::new("nowhere"))
                .with_transition(SceneTransition::new("castle").requiring("goal:invited"))
                .with_transition(SceneTransition::new("ruins")),
            Scene::new("cave", SceneKind::Exploration),
            Scene::new("castle", SceneKind::Quest),
            Scene::new("ruins", SceneKind::Loot).requiring("visited:cave"),
        ]);
        let mut state = PlayerState::new(1);
        let targets = |state: &PlayerState| -> Vec<String> {
            g.eligible_transitions("crossroads", state)
                .iter()
                .map(|(_, scene)| scene.id.clone())
                .collect()
        };
        assert_eq!(targets(&state), vec!["cave"]);

        state.goals.insert("invited".into());
        state.visited_scenes.insert("cave".into());
        assert_eq!(targets(&state), vec!["cave", "castle", "ruins"]);
        assert!(g.eligible_transitions("missing", &state).is_empty());
    }

    #[test]
    fn cooldown_expires_after_n_other_scenes() {
        let well = Scene::new("well", SceneKind::Rest).with_cooldown(2);
        let road = Scene::new("road", SceneKind::Story);
        let g = graph(vec![well.clone(), road.clone()]);
        let mut state = PlayerState::new(1);

        g.apply_consequences(&well, &mut state);
        assert!(!g.is_available(&well, &state));
        g.apply_consequences(&road, &mut state);
        assert!(!g.is_available(&well, &state));
        g.apply_consequences(&road, &mut state);
        assert!(g.is_available(&well, &state));
        assert!(state.scene_cooldowns.is_empty());
    }

    #[test]
    fn consequences_update_risk_steps_and_rewards() {
        let chest = Scene::new("chest", SceneKind::Loot)
            .with_risk_delta(-3)
            .with_reward(SceneReward {
                gold: Some("2d6".into()),
                xp: Some("10".into()),
                stamina: Some("1d4".into()),
            });
        let g = graph(vec![chest.clone()]);
        let mut state = PlayerState::new(1).with_energy(50);
        state.risk_level = 1;

        g.apply_consequences(&chest, &mut state);
        assert!(state.has_visited("chest"));
        assert_eq!(state.risk_level, 0);
        assert_eq!(state.step_count, 1);
        assert_eq!(state.stat("gold"), 5);
        assert_eq!(state.stat("xp"), 10);
        assert_eq!(state.energy, 60);
    }

    #[test]
    fn malformed_sources_degrade_to_empty_graph() {
        assert!(SceneGraph::from_json_or_empty("{not json").is_empty());
        assert!(SceneGraph::load("/definitely/not/here/scenes.json").is_empty());
        let duplicate = r#"{"scenes":[{"id":"a","kind":"story"},{"id":"a","kind":"loot"}]}"#;
        assert!(matches!(
            SceneGraph::try_from_json(duplicate),
            Err(GraphError::DuplicateScene(id)) if id == "a"
        ));
        let empty = SceneGraph::from_json_or_empty(duplicate);
        assert!(empty.is_empty());
        assert!(empty.end_conditions().is_empty());
        assert!(empty.eligible_starting_scenes(&PlayerState::new(1)).is_empty());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = graph(vec![Scene::new("a", SceneKind::Story)]);
        let same = graph(vec![Scene::new("a", SceneKind::Story)]);
        let other = graph(vec![Scene::new("b", SceneKind::Story)]);
        assert_eq!(a.fingerprint(), same.fingerprint());
        assert_ne!(a.fingerprint(), other.fingerprint());
        assert!(!SceneGraph::load_from_static().is_empty());
    }
}
