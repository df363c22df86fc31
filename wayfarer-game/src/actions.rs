//! Player actions and their resource/stat consequences.
//!
//! Every action has a fixed base consequence. The scene it is taken in and the
//! player's stats adjust that base before a success roll decides whether the
//! consequence, or its failure counterpart, is applied.

use crate::constants::{
    CAST_MIN_INTELLECT, CHARISMA_SUCCESS_BONUS, COMBAT_ENERGY_MULTIPLIER, COMBAT_RISK_BONUS,
    EXPLORATION_ENERGY_MULTIPLIER, EXPLORATION_SUCCESS_MULTIPLIER, INTELLECT_ENERGY_DISCOUNT,
    REST_ENERGY_DISCOUNT, REST_RISK_FLOOR, REST_RISK_RELIEF, STAMINA_ENERGY_DISCOUNT,
    STAT_BRAVERY, STAT_CHARISMA, STAT_GOLD, STAT_INTELLECT, STAT_MODIFIER_THRESHOLD,
    STAT_STAMINA, STAT_XP,
};
use crate::numbers::trunc_f64_to_i32;
use crate::scene::SceneKind;
use crate::state::PlayerState;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const GOAL_QUEST_ACCEPTED: &str = "quest_accepted";

/// Everything a player can do outside of combat rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Attack,
    Defend,
    Cast,
    UseItem,
    Talk,
    Sneak,
    Loot,
    Flee,
    Wait,
    Back,
    Accept,
    Investigate,
    Prepare,
    Rest,
    Explore,
    Persuade,
    Trade,
    Search,
}

impl Action {
    pub const ALL: [Self; 18] = [
        Self::Attack,
        Self::Defend,
        Self::Cast,
        Self::UseItem,
        Self::Talk,
        Self::Sneak,
        Self::Loot,
        Self::Flee,
        Self::Wait,
        Self::Back,
        Self::Accept,
        Self::Investigate,
        Self::Prepare,
        Self::Rest,
        Self::Explore,
        Self::Persuade,
        Self::Trade,
        Self::Search,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Defend => "defend",
            Self::Cast => "cast",
            Self::UseItem => "use_item",
            Self::Talk => "talk",
            Self::Sneak => "sneak",
            Self::Loot => "loot",
            Self::Flee => "flee",
            Self::Wait => "wait",
            Self::Back => "back",
            Self::Accept => "accept",
            Self::Investigate => "investigate",
            Self::Prepare => "prepare",
            Self::Rest => "rest",
            Self::Explore => "explore",
            Self::Persuade => "persuade",
            Self::Trade => "trade",
            Self::Search => "search",
        }
    }

    /// Unmodified consequence of taking this action.
    #[must_use]
    pub fn base_consequence(self) -> ActionConsequence {
        let base = ActionConsequence::new(self);
        match self {
            Self::Attack => base
                .costing(15)
                .with_risk(2)
                .with_success(0.7)
                .with_stat(STAT_BRAVERY, 1)
                .on_failure(ActionConsequence::setback(self, 10, 3)),
            Self::Defend => base
                .costing(5)
                .with_success(0.9)
                .on_failure(ActionConsequence::setback(self, 5, 1)),
            Self::Cast => base
                .costing(20)
                .with_risk(1)
                .with_success(0.75)
                .with_stat(STAT_INTELLECT, 1)
                .on_failure(ActionConsequence::setback(self, 10, 2)),
            Self::UseItem => base.costing(-10),
            Self::Talk => base
                .costing(5)
                .with_risk(-1)
                .with_success(0.8)
                .with_stat(STAT_CHARISMA, 1)
                .on_failure(ActionConsequence::setback(self, 0, 1)),
            Self::Sneak => base
                .costing(10)
                .with_risk(-1)
                .with_success(0.6)
                .on_failure(ActionConsequence::setback(self, 10, 2)),
            Self::Loot => base
                .costing(5)
                .with_risk(1)
                .with_success(0.85)
                .with_stat(STAT_GOLD, 5)
                .on_failure(ActionConsequence::setback(self, 5, 2)),
            Self::Flee => base
                .costing(10)
                .with_risk(-2)
                .with_success(0.6)
                .on_failure(ActionConsequence::setback(self, 10, 1)),
            Self::Wait => base.costing(-5).with_risk(1),
            Self::Back => base,
            Self::Accept => base.with_risk(1).with_goal(GOAL_QUEST_ACCEPTED),
            Self::Investigate => base
                .costing(10)
                .with_success(0.8)
                .with_stat(STAT_INTELLECT, 1)
                .on_failure(ActionConsequence::setback(self, 5, 1)),
            Self::Prepare => base.costing(5).with_risk(-1),
            Self::Rest => base.costing(-20).with_risk(-1),
            Self::Explore => base
                .costing(10)
                .with_risk(1)
                .with_success(0.9)
                .with_stat(STAT_XP, 2)
                .on_failure(ActionConsequence::setback(self, 10, 2)),
            Self::Persuade => base
                .costing(5)
                .with_success(0.65)
                .with_stat(STAT_CHARISMA, 1)
                .on_failure(ActionConsequence::setback(self, 5, 2)),
            Self::Trade => base.with_success(0.95).with_stat(STAT_GOLD, 3),
            Self::Search => base
                .costing(10)
                .with_success(0.75)
                .with_stat(STAT_GOLD, 2)
                .on_failure(ActionConsequence::setback(self, 10, 1)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.key().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown action '{value}'"))
    }
}

/// Computed deltas and odds for one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConsequence {
    pub action: Action,
    #[serde(default)]
    pub stat_changes: BTreeMap<String, i32>,
    /// Energy spent; negative values restore energy.
    #[serde(default)]
    pub energy_cost: i32,
    #[serde(default)]
    pub risk_change: i32,
    #[serde(default)]
    pub goal_updates: Vec<String>,
    /// Adjustments applied on top of the base table, by label.
    #[serde(default)]
    pub scene_modifiers: BTreeMap<String, f64>,
    pub success_probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_consequences: Option<Box<ActionConsequence>>,
}

impl ActionConsequence {
    /// A consequence that always succeeds and changes nothing.
    #[must_use]
    pub const fn new(action: Action) -> Self {
        Self {
            action,
            stat_changes: BTreeMap::new(),
            energy_cost: 0,
            risk_change: 0,
            goal_updates: Vec::new(),
            scene_modifiers: BTreeMap::new(),
            success_probability: 1.0,
            failure_consequences: None,
        }
    }

    const fn setback(action: Action, energy_cost: i32, risk_change: i32) -> Self {
        let mut setback = Self::new(action);
        setback.energy_cost = energy_cost;
        setback.risk_change = risk_change;
        setback
    }

    #[must_use]
    pub const fn costing(mut self, energy_cost: i32) -> Self {
        self.energy_cost = energy_cost;
        self
    }

    #[must_use]
    pub const fn with_risk(mut self, risk_change: i32) -> Self {
        self.risk_change = risk_change;
        self
    }

    #[must_use]
    pub fn with_success(mut self, probability: f64) -> Self {
        self.success_probability = probability.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_stat(mut self, stat: &str, delta: i32) -> Self {
        self.stat_changes.insert(stat.to_string(), delta);
        self
    }

    #[must_use]
    pub fn with_goal(mut self, goal: &str) -> Self {
        self.goal_updates.push(goal.to_string());
        self
    }

    #[must_use]
    pub fn on_failure(mut self, failure: Self) -> Self {
        self.failure_consequences = Some(Box::new(failure));
        self
    }

    fn note(&mut self, label: &str, value: f64) {
        self.scene_modifiers.insert(label.to_string(), value);
    }

    fn apply_scene_modifiers(&mut self, scene_kind: SceneKind) {
        match scene_kind {
            SceneKind::Combat => {
                self.energy_cost =
                    trunc_f64_to_i32(f64::from(self.energy_cost) * COMBAT_ENERGY_MULTIPLIER);
                self.risk_change += COMBAT_RISK_BONUS;
                self.note("combat.energy_multiplier", COMBAT_ENERGY_MULTIPLIER);
                self.note("combat.risk_bonus", f64::from(COMBAT_RISK_BONUS));
            }
            SceneKind::Rest => {
                self.energy_cost = discount(self.energy_cost, REST_ENERGY_DISCOUNT);
                self.risk_change = (self.risk_change - REST_RISK_RELIEF).max(REST_RISK_FLOOR);
                self.note("rest.energy_discount", f64::from(REST_ENERGY_DISCOUNT));
                self.note("rest.risk_relief", f64::from(REST_RISK_RELIEF));
            }
            SceneKind::Exploration => {
                self.energy_cost =
                    trunc_f64_to_i32(f64::from(self.energy_cost) * EXPLORATION_ENERGY_MULTIPLIER);
                self.success_probability *= EXPLORATION_SUCCESS_MULTIPLIER;
                self.note("exploration.energy_multiplier", EXPLORATION_ENERGY_MULTIPLIER);
                self.note("exploration.success_multiplier", EXPLORATION_SUCCESS_MULTIPLIER);
            }
            SceneKind::Story
            | SceneKind::Choice
            | SceneKind::Encounter
            | SceneKind::Dialogue
            | SceneKind::Quest
            | SceneKind::Loot => {}
        }
    }

    fn apply_stat_modifiers(&mut self, state: &PlayerState) {
        if state.stat(STAT_INTELLECT) >= STAT_MODIFIER_THRESHOLD {
            self.energy_cost = discount(self.energy_cost, INTELLECT_ENERGY_DISCOUNT);
            self.note("intellect.energy_discount", f64::from(INTELLECT_ENERGY_DISCOUNT));
        }
        if state.stat(STAT_STAMINA) >= STAT_MODIFIER_THRESHOLD {
            self.energy_cost = discount(self.energy_cost, STAMINA_ENERGY_DISCOUNT);
            self.note("stamina.energy_discount", f64::from(STAMINA_ENERGY_DISCOUNT));
        }
        if state.stat(STAT_CHARISMA) >= STAT_MODIFIER_THRESHOLD {
            self.success_probability = (self.success_probability + CHARISMA_SUCCESS_BONUS).min(1.0);
            self.note("charisma.success_bonus", CHARISMA_SUCCESS_BONUS);
        }
    }
}

/// Discounts shrink positive costs toward zero and leave restoration alone.
const fn discount(cost: i32, amount: i32) -> i32 {
    if cost > 0 {
        let reduced = cost - amount;
        if reduced > 0 { reduced } else { 0 }
    } else {
        cost
    }
}

/// Outcome of applying an action to a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub action: Action,
    pub success: bool,
    /// Uniform draw compared against the success probability.
    pub roll: f64,
    pub energy_delta: i32,
    pub risk_delta: i32,
    pub stat_changes: BTreeMap<String, i32>,
    pub goals_added: Vec<String>,
    pub message: String,
}

/// Base consequence adjusted for the scene it is taken in and the player's stats.
#[must_use]
pub fn resolve(action: Action, scene_kind: SceneKind, state: &PlayerState) -> ActionConsequence {
    let mut consequence = action.base_consequence();
    consequence.apply_scene_modifiers(scene_kind);
    consequence.apply_stat_modifiers(state);
    consequence
}

/// Roll for success and apply either the consequence or its failure branch.
pub fn apply<R: Rng + ?Sized>(
    consequence: &ActionConsequence,
    state: &mut PlayerState,
    rng: &mut R,
) -> ActionResult {
    let roll = rng.r#gen::<f64>();
    apply_roll(consequence, state, roll)
}

/// Apply with an externally drawn roll in `[0, 1)`.
pub fn apply_roll(consequence: &ActionConsequence, state: &mut PlayerState, roll: f64) -> ActionResult {
    let action = consequence.action;
    let success = roll <= consequence.success_probability;
    let effects = if success {
        Some(consequence)
    } else {
        consequence.failure_consequences.as_deref()
    };

    let energy_before = state.energy;
    let risk_before = state.risk_level;
    let mut stat_changes = BTreeMap::new();
    let mut goals_added = Vec::new();

    if let Some(effects) = effects {
        state.adjust_energy(-effects.energy_cost);
        state.adjust_risk(effects.risk_change);
        for (stat, delta) in &effects.stat_changes {
            state.add_stat(stat, *delta);
            stat_changes.insert(stat.clone(), *delta);
        }
        for goal in &effects.goal_updates {
            if state.goals.insert(goal.clone()) {
                goals_added.push(goal.clone());
            }
        }
    }

    let message = if success {
        format!("You {} successfully.", action_phrase(action))
    } else {
        format!("You fail to {}.", action_phrase(action))
    };

    ActionResult {
        action,
        success,
        roll,
        energy_delta: state.energy - energy_before,
        risk_delta: state.risk_level - risk_before,
        stat_changes,
        goals_added,
        message,
    }
}

const fn action_phrase(action: Action) -> &'static str {
    match action {
        Action::Attack => "attack",
        Action::Defend => "defend yourself",
        Action::Cast => "cast a spell",
        Action::UseItem => "use an item",
        Action::Talk => "talk",
        Action::Sneak => "sneak past",
        Action::Loot => "loot the area",
        Action::Flee => "flee",
        Action::Wait => "wait",
        Action::Back => "turn back",
        Action::Accept => "accept the offer",
        Action::Investigate => "investigate",
        Action::Prepare => "prepare",
        Action::Rest => "rest",
        Action::Explore => "explore",
        Action::Persuade => "persuade",
        Action::Trade => "trade",
        Action::Search => "search",
    }
}

/// Actions offered in a scene of `scene_kind`.
#[must_use]
pub const fn scene_actions(scene_kind: SceneKind) -> &'static [Action] {
    match scene_kind {
        SceneKind::Combat => &[
            Action::Attack,
            Action::Defend,
            Action::Cast,
            Action::UseItem,
            Action::Flee,
        ],
        SceneKind::Rest => &[Action::Rest, Action::UseItem, Action::Prepare, Action::Back],
        SceneKind::Exploration => &[
            Action::Explore,
            Action::Investigate,
            Action::Sneak,
            Action::Search,
            Action::Back,
        ],
        SceneKind::Dialogue => &[Action::Talk, Action::Persuade, Action::Trade, Action::Back],
        SceneKind::Encounter => &[Action::Attack, Action::Talk, Action::Sneak, Action::Flee],
        SceneKind::Loot => &[Action::Loot, Action::Search, Action::Back],
        SceneKind::Quest => &[
            Action::Accept,
            Action::Investigate,
            Action::Prepare,
            Action::Back,
        ],
        SceneKind::Choice => &[Action::Accept, Action::Wait, Action::Back],
        SceneKind::Story => &[Action::Wait, Action::Investigate, Action::Back],
    }
}

/// Scene actions the player can currently afford.
#[must_use]
pub fn available_actions(scene_kind: SceneKind, state: &PlayerState) -> Vec<Action> {
    scene_actions(scene_kind)
        .iter()
        .copied()
        .filter(|action| {
            let affordable = action.base_consequence().energy_cost.abs() <= state.energy;
            let castable =
                *action != Action::Cast || state.stat(STAT_INTELLECT) >= CAST_MIN_INTELLECT;
            affordable && castable
        })
        .collect()
}
