use std::fmt;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use wayfarer_game::{Action, CombatState, PlayerAction, PlayerState, SceneKind, resolve};

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub action: Action,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub const fn new(action: Action, rationale: Option<String>) -> Self {
        Self { action, rationale }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select one of the actions offered in the current scene.
    fn pick_action(
        &mut self,
        state: &PlayerState,
        scene_kind: SceneKind,
        offered: &[Action],
    ) -> Option<PolicyDecision>;

    /// Select the next move in a pending fight.
    fn pick_combat(&mut self, combat: &CombatState) -> PlayerAction;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Cautious,
    Bold,
    Balanced,
}

impl GameplayStrategy {
    pub const ALL: [Self; 3] = [Self::Cautious, Self::Bold, Self::Balanced];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Bold => "Bold",
            Self::Balanced => "Balanced",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Bold => Box::new(BoldPolicy),
            Self::Balanced => Box::new(BalancedPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CautiousPolicy;
struct BoldPolicy;

struct BalancedPolicy {
    rng: ChaCha20Rng,
}

impl BalancedPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

/// Hit points below this share of the maximum make the cautious player run.
const CAUTIOUS_ESCAPE_RATIO: f64 = 0.4;
const BALANCED_ESCAPE_RATIO: f64 = 0.25;
const CAUTIOUS_REST_ENERGY: i32 = 40;

fn hp_ratio(combat: &CombatState) -> f64 {
    if combat.player_max_hp <= 0 {
        return 0.0;
    }
    f64::from(combat.player_hp) / f64::from(combat.player_max_hp)
}

/// Class skill when it is off cooldown, otherwise a basic attack.
fn strike(combat: &CombatState) -> PlayerAction {
    let skill = combat.player.class.skill();
    if combat.skill_ready(skill) {
        PlayerAction::Skill(skill)
    } else {
        PlayerAction::Attack
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn pick_action(
        &mut self,
        state: &PlayerState,
        scene_kind: SceneKind,
        offered: &[Action],
    ) -> Option<PolicyDecision> {
        if state.energy < CAUTIOUS_REST_ENERGY && offered.contains(&Action::Rest) {
            return Some(PolicyDecision::new(
                Action::Rest,
                Some(format!("energy {}", state.energy)),
            ));
        }
        offered
            .iter()
            .map(|action| (*action, resolve(*action, scene_kind, state)))
            .min_by_key(|(_, consequence)| (consequence.risk_change, consequence.energy_cost))
            .map(|(action, consequence)| {
                PolicyDecision::new(action, Some(format!("risk {}", consequence.risk_change)))
            })
    }

    fn pick_combat(&mut self, combat: &CombatState) -> PlayerAction {
        if hp_ratio(combat) < CAUTIOUS_ESCAPE_RATIO {
            PlayerAction::Escape
        } else {
            strike(combat)
        }
    }
}

impl PlayerPolicy for BoldPolicy {
    fn name(&self) -> &'static str {
        "Bold"
    }

    fn pick_action(
        &mut self,
        state: &PlayerState,
        scene_kind: SceneKind,
        offered: &[Action],
    ) -> Option<PolicyDecision> {
        offered
            .iter()
            .map(|action| (*action, resolve(*action, scene_kind, state)))
            .max_by_key(|(_, consequence)| {
                let gains: i32 = consequence.stat_changes.values().sum();
                (consequence.risk_change, gains)
            })
            .map(|(action, consequence)| {
                PolicyDecision::new(action, Some(format!("risk {}", consequence.risk_change)))
            })
    }

    fn pick_combat(&mut self, combat: &CombatState) -> PlayerAction {
        strike(combat)
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_action(
        &mut self,
        _state: &PlayerState,
        _scene_kind: SceneKind,
        offered: &[Action],
    ) -> Option<PolicyDecision> {
        offered
            .choose(&mut self.rng)
            .map(|action| PolicyDecision::new(*action, Some("random".to_string())))
    }

    fn pick_combat(&mut self, combat: &CombatState) -> PlayerAction {
        if hp_ratio(combat) < BALANCED_ESCAPE_RATIO {
            PlayerAction::Escape
        } else {
            strike(combat)
        }
    }
}
