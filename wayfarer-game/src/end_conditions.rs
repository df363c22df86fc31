//! Adventure termination rules.
use crate::constants::DEFAULT_STEP_BUDGET;
use crate::numbers::floor_f64_to_i32;
use crate::state::PlayerState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A rule that ends the current run once satisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndCondition {
    RiskThreshold {
        threshold: i32,
    },
    EnergyDepleted {
        #[serde(default)]
        threshold: i32,
    },
    GoalReached {
        goal: String,
    },
    StepBudget {
        #[serde(default = "default_step_budget")]
        base: u32,
        #[serde(default)]
        dynamic: bool,
        /// Stat name to bonus steps per stat point.
        #[serde(default)]
        bonus_by_stat: BTreeMap<String, f64>,
    },
}

const fn default_step_budget() -> u32 {
    DEFAULT_STEP_BUDGET
}

/// Why a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndReason {
    RiskThreshold { risk_level: i32, threshold: i32 },
    EnergyDepleted { energy: i32, threshold: i32 },
    GoalReached { goal: String },
    StepBudget { steps: u32, max_steps: u32 },
    /// The scene graph had nowhere left to go.
    NoSceneAvailable,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RiskThreshold {
                risk_level,
                threshold,
            } => write!(f, "Risk level {risk_level} reached threshold {threshold}"),
            Self::EnergyDepleted { energy, threshold } => {
                write!(f, "Energy depleted ({energy} <= {threshold})")
            }
            Self::GoalReached { goal } => write!(f, "Goal '{goal}' reached"),
            Self::StepBudget { steps, max_steps } => {
                write!(f, "Step budget exhausted ({steps}/{max_steps} steps)")
            }
            Self::NoSceneAvailable => f.write_str("No more scenes available"),
        }
    }
}

impl EndCondition {
    #[must_use]
    pub const fn risk_threshold(threshold: i32) -> Self {
        Self::RiskThreshold { threshold }
    }

    #[must_use]
    pub const fn energy_depleted(threshold: i32) -> Self {
        Self::EnergyDepleted { threshold }
    }

    #[must_use]
    pub fn goal_reached(goal: impl Into<String>) -> Self {
        Self::GoalReached { goal: goal.into() }
    }

    #[must_use]
    pub const fn step_budget(base: u32) -> Self {
        Self::StepBudget {
            base,
            dynamic: false,
            bonus_by_stat: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn dynamic_step_budget<I, S>(base: u32, bonuses: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self::StepBudget {
            base,
            dynamic: true,
            bonus_by_stat: bonuses
                .into_iter()
                .map(|(stat, bonus)| (stat.into(), bonus))
                .collect(),
        }
    }

    /// Reason this condition ends the run, if it does.
    #[must_use]
    pub fn check(&self, state: &PlayerState) -> Option<EndReason> {
        match self {
            Self::RiskThreshold { threshold } => {
                (state.risk_level >= *threshold).then_some(EndReason::RiskThreshold {
                    risk_level: state.risk_level,
                    threshold: *threshold,
                })
            }
            Self::EnergyDepleted { threshold } => {
                (state.energy <= *threshold).then_some(EndReason::EnergyDepleted {
                    energy: state.energy,
                    threshold: *threshold,
                })
            }
            Self::GoalReached { goal } => state
                .has_goal(goal)
                .then(|| EndReason::GoalReached { goal: goal.clone() }),
            Self::StepBudget { .. } => {
                let max_steps = self.max_steps(state).unwrap_or(DEFAULT_STEP_BUDGET);
                (state.step_count >= max_steps).then_some(EndReason::StepBudget {
                    steps: state.step_count,
                    max_steps,
                })
            }
        }
    }

    /// Effective step budget for a player; `None` for other condition kinds.
    #[must_use]
    pub fn max_steps(&self, state: &PlayerState) -> Option<u32> {
        let Self::StepBudget {
            base,
            dynamic,
            bonus_by_stat,
        } = self
        else {
            return None;
        };
        if !*dynamic {
            return Some(*base);
        }
        let bonus: i64 = bonus_by_stat
            .iter()
            .map(|(stat, per_point)| {
                i64::from(floor_f64_to_i32(f64::from(state.stat(stat)) * per_point))
            })
            .sum();
        let total = (i64::from(*base) + bonus).clamp(0, i64::from(u32::MAX));
        Some(u32::try_from(total).unwrap_or(*base))
    }
}

/// Evaluate conditions in declaration order; the first one that holds wins.
#[must_use]
pub fn check_ended(conditions: &[EndCondition], state: &PlayerState) -> Option<EndReason> {
    conditions.iter().find_map(|condition| condition.check(state))
}
