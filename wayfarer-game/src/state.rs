//! Per-run player simulation record.

use crate::character::{CharacterClass, Hero};
use crate::constants::{
    DEFAULT_NARRATIVE_STAT, ENERGY_MAX, ENERGY_MIN, RISK_MIN, STAT_BRAVERY, STAT_CHARISMA,
    STAT_GOLD, STAT_INTELLECT, STAT_LEVEL, STAT_STAMINA, STAT_XP,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Mutable record for one player's adventure run.
///
/// Ordered collections keep serialized snapshots stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub user_id: u64,
    #[serde(default)]
    pub current_scene: Option<String>,
    #[serde(default)]
    pub visited_scenes: BTreeSet<String>,
    #[serde(default)]
    pub scene_cooldowns: BTreeMap<String, u32>,
    #[serde(default)]
    pub risk_level: i32,
    #[serde(default = "default_energy")]
    pub energy: i32,
    #[serde(default)]
    pub stats: BTreeMap<String, i32>,
    #[serde(default)]
    pub goals: BTreeSet<String>,
    #[serde(default)]
    pub step_count: u32,
    #[serde(default)]
    pub hero: Hero,
}

const fn default_energy() -> i32 {
    ENERGY_MAX
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PlayerState {
    /// Fresh run with full energy and the starting narrative stats.
    #[must_use]
    pub fn new(user_id: u64) -> Self {
        let stats = [
            (STAT_BRAVERY, DEFAULT_NARRATIVE_STAT),
            (STAT_CHARISMA, DEFAULT_NARRATIVE_STAT),
            (STAT_INTELLECT, DEFAULT_NARRATIVE_STAT),
            (STAT_STAMINA, DEFAULT_NARRATIVE_STAT),
            (STAT_LEVEL, 1),
            (STAT_GOLD, 0),
            (STAT_XP, 0),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

        Self {
            user_id,
            current_scene: None,
            visited_scenes: BTreeSet::new(),
            scene_cooldowns: BTreeMap::new(),
            risk_level: 0,
            energy: ENERGY_MAX,
            stats,
            goals: BTreeSet::new(),
            step_count: 0,
            hero: Hero::default(),
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: CharacterClass) -> Self {
        self.hero = Hero::new(class);
        self
    }

    #[must_use]
    pub fn with_stat(mut self, name: &str, value: i32) -> Self {
        self.stats.insert(name.to_string(), value);
        self
    }

    #[must_use]
    pub fn with_energy(mut self, energy: i32) -> Self {
        self.energy = energy;
        self.clamp();
        self
    }

    /// Stat value, treating unknown stats as zero.
    #[must_use]
    pub fn stat(&self, name: &str) -> i32 {
        self.stats.get(name).copied().unwrap_or(0)
    }

    pub fn add_stat(&mut self, name: &str, delta: i32) {
        let entry = self.stats.entry(name.to_string()).or_insert(0);
        *entry = entry.saturating_add(delta);
    }

    pub fn adjust_energy(&mut self, delta: i32) {
        self.energy = self
            .energy
            .saturating_add(delta)
            .clamp(ENERGY_MIN, ENERGY_MAX);
    }

    pub fn adjust_risk(&mut self, delta: i32) {
        self.risk_level = self.risk_level.saturating_add(delta).max(RISK_MIN);
    }

    #[must_use]
    pub fn has_visited(&self, scene_id: &str) -> bool {
        self.visited_scenes.contains(scene_id)
    }

    #[must_use]
    pub fn has_goal(&self, goal: &str) -> bool {
        self.goals.contains(goal)
    }

    /// Turns left before a scene may be offered again.
    #[must_use]
    pub fn cooldown_remaining(&self, scene_id: &str) -> u32 {
        self.scene_cooldowns.get(scene_id).copied().unwrap_or(0)
    }

    /// Pull every bounded field back into range.
    pub fn clamp(&mut self) {
        self.energy = self.energy.clamp(ENERGY_MIN, ENERGY_MAX);
        self.risk_level = self.risk_level.max(RISK_MIN);
        let hp = self.hero.hp;
        self.hero.set_hp(hp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_has_starting_stats() {
        let state = PlayerState::new(42);
        assert_eq!(state.user_id, 42);
        assert_eq!(state.energy, 100);
        assert_eq!(state.stat("bravery"), 1);
        assert_eq!(state.stat("level"), 1);
        assert_eq!(state.stat("gold"), 0);
        assert_eq!(state.stat("unknown"), 0);
        assert!(state.current_scene.is_none());
    }

    #[test]
    fn resources_stay_in_bounds() {
        let mut state = PlayerState::new(1).with_energy(140);
        assert_eq!(state.energy, 100);
        state.adjust_energy(-250);
        assert_eq!(state.energy, 0);
        state.adjust_risk(-3);
        assert_eq!(state.risk_level, 0);
        state.adjust_risk(4);
        assert_eq!(state.risk_level, 4);
    }

    #[test]
    fn stats_accumulate() {
        let mut state = PlayerState::new(1);
        state.add_stat("gold", 7);
        state.add_stat("gold", -2);
        state.add_stat("luck", 1);
        assert_eq!(state.stat("gold"), 5);
        assert_eq!(state.stat("luck"), 1);
    }

    #[test]
    fn serializes_as_plain_record() {
        let mut state = PlayerState::new(9).with_class(CharacterClass::Mage);
        state.visited_scenes.insert("tavern_intro".into());
        state.scene_cooldowns.insert("market".into(), 2);
        state.goals.insert("find_map".into());

        let json = serde_json::to_string(&state).expect("serialize");
        let restored: PlayerState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, state);

        let sparse: PlayerState = serde_json::from_str(r#"{"user_id": 3}"#).expect("defaults");
        assert_eq!(sparse.energy, 100);
        assert_eq!(sparse.hero.class, CharacterClass::Warrior);
    }
}
