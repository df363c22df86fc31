//! One player's adventure run: scene traversal, action resolution and the
//! hand-off to combat, with snapshot/restore for external persistence.

use crate::actions::{self, Action, ActionResult};
use crate::character::level_from_xp;
use crate::combat::{CombatError, CombatOutcome, CombatState, PlayerAction, TurnReport, play_round};
use crate::config::AdventureCfg;
use crate::constants::{STAT_GOLD, STAT_LEVEL, STAT_XP};
use crate::end_conditions::EndReason;
use crate::graph::SceneGraph;
use crate::numbers::floor_f64_to_i32;
use crate::rng::{RngBundle, RngCursor};
use crate::scene::{Scene, SceneKind};
use crate::selector::{DecisionTrace, select_next};
use crate::state::PlayerState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("not enough energy to start an adventure ({energy} < {required})")]
    InsufficientEnergy { energy: i32, required: i32 },
    #[error("the adventure has already started")]
    AlreadyStarted,
    #[error("the adventure has not started")]
    NotStarted,
    #[error("the adventure is over: {0}")]
    Ended(EndReason),
    #[error("current scene '{0}' is not part of the scene graph")]
    UnknownScene(String),
    #[error("'{action}' is not available in a {kind} scene")]
    ActionUnavailable { action: Action, kind: SceneKind },
    #[error("a fight is in progress")]
    CombatInProgress,
    #[error("no fight is in progress")]
    NoCombat,
    #[error("snapshot belongs to scene graph {found:016x}, loaded graph is {expected:016x}")]
    GraphMismatch { expected: u64, found: u64 },
    #[error(transparent)]
    Combat(#[from] CombatError),
}

/// What happened during one narrative step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StepReport {
    /// Resolution of the player's action; absent for the opening step.
    pub action: Option<ActionResult>,
    /// Scene entered by this step, if any.
    pub scene: Option<String>,
    pub trace: Option<DecisionTrace>,
    pub combat_started: bool,
    pub ended: Option<EndReason>,
}

/// What happened during one combat exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatRoundReport {
    pub turns: Vec<TurnReport>,
    /// Set once the fight has finished and been settled.
    pub outcome: Option<CombatOutcome>,
    pub levels_gained: i32,
    /// Scene traversal that resumed after the fight.
    pub next: Option<StepReport>,
    pub ended: Option<EndReason>,
}

/// Plain serializable record of a session, tagged with the graph it ran on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub graph_fingerprint: u64,
    /// Seed and stream positions, so a restored run keeps rolling where it left off.
    pub rng: RngCursor,
    pub player: PlayerState,
    #[serde(default)]
    pub combat: Option<CombatState>,
    #[serde(default)]
    pub ended: Option<EndReason>,
}

impl SessionSnapshot {
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A single run against a shared scene graph.
#[derive(Debug, Clone)]
pub struct AdventureSession {
    graph: Arc<SceneGraph>,
    cfg: AdventureCfg,
    rng: RngBundle,
    state: PlayerState,
    combat: Option<CombatState>,
    ended: Option<EndReason>,
}

impl AdventureSession {
    #[must_use]
    pub fn new(graph: Arc<SceneGraph>, cfg: AdventureCfg, state: PlayerState, seed: u64) -> Self {
        Self {
            graph,
            cfg,
            rng: RngBundle::from_user_seed(seed),
            state,
            combat: None,
            ended: None,
        }
    }

    /// Rebuild a session from a snapshot taken against the same graph. The
    /// random streams resume at the recorded positions.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::GraphMismatch`] if the snapshot was taken
    /// against different scene data.
    pub fn restore(
        graph: Arc<SceneGraph>,
        cfg: AdventureCfg,
        snapshot: SessionSnapshot,
    ) -> Result<Self, SessionError> {
        if snapshot.graph_fingerprint != graph.fingerprint() {
            return Err(SessionError::GraphMismatch {
                expected: graph.fingerprint(),
                found: snapshot.graph_fingerprint,
            });
        }
        let mut state = snapshot.player;
        state.clamp();
        Ok(Self {
            graph,
            cfg,
            rng: RngBundle::resume(snapshot.rng),
            state,
            combat: snapshot.combat,
            ended: snapshot.ended,
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            graph_fingerprint: self.graph.fingerprint(),
            rng: self.rng.cursor(),
            player: self.state.clone(),
            combat: self.combat.clone(),
            ended: self.ended.clone(),
        }
    }

    /// Replace the random streams with fresh ones from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = RngBundle::from_user_seed(seed);
    }

    #[must_use]
    pub const fn state(&self) -> &PlayerState {
        &self.state
    }

    pub const fn state_mut(&mut self) -> &mut PlayerState {
        &mut self.state
    }

    #[must_use]
    pub fn into_state(self) -> PlayerState {
        self.state
    }

    #[must_use]
    pub const fn combat(&self) -> Option<&CombatState> {
        self.combat.as_ref()
    }

    #[must_use]
    pub const fn cfg(&self) -> &AdventureCfg {
        &self.cfg
    }

    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    #[must_use]
    pub fn current_scene(&self) -> Option<&Scene> {
        self.state
            .current_scene
            .as_deref()
            .and_then(|id| self.graph.scene(id))
    }

    #[must_use]
    pub const fn in_combat(&self) -> bool {
        self.combat.is_some()
    }

    #[must_use]
    pub const fn ended(&self) -> Option<&EndReason> {
        self.ended.as_ref()
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.ended.is_some()
    }

    /// Actions the player may take in the current scene.
    #[must_use]
    pub fn available_actions(&self) -> Vec<Action> {
        if self.in_combat() || self.is_over() {
            return Vec::new();
        }
        self.current_scene()
            .map(|scene| actions::available_actions(scene.kind, &self.state))
            .unwrap_or_default()
    }

    /// Evaluate the graph's end conditions and latch the first one that holds.
    pub fn check_ended(&mut self) -> Option<EndReason> {
        if self.ended.is_none() {
            self.ended = self.graph.check_ended(&self.state);
            if let Some(reason) = &self.ended {
                log::debug!("adventure {} ended: {reason}", self.state.user_id);
            }
        }
        self.ended.clone()
    }

    /// Begin the adventure by entering a starting scene.
    ///
    /// # Errors
    ///
    /// Fails if the player is below the configured start energy or the
    /// adventure is already underway.
    pub fn start(&mut self) -> Result<StepReport, SessionError> {
        if self.state.current_scene.is_some() {
            return Err(SessionError::AlreadyStarted);
        }
        self.ensure_open()?;
        if self.state.energy < self.cfg.min_start_energy {
            return Err(SessionError::InsufficientEnergy {
                energy: self.state.energy,
                required: self.cfg.min_start_energy,
            });
        }
        let mut report = StepReport::default();
        self.advance(None, &mut report);
        Ok(report)
    }

    /// Resolve `action` in the current scene, then move to the next scene.
    ///
    /// # Errors
    ///
    /// Fails if the adventure has not started or is over, a fight is
    /// pending, or the action is not offered in this scene.
    pub fn take_action(&mut self, action: Action) -> Result<StepReport, SessionError> {
        self.ensure_open()?;
        if self.in_combat() {
            return Err(SessionError::CombatInProgress);
        }
        let current = self
            .state
            .current_scene
            .clone()
            .ok_or(SessionError::NotStarted)?;
        let kind = self
            .graph
            .scene(&current)
            .map(|scene| scene.kind)
            .ok_or_else(|| SessionError::UnknownScene(current.clone()))?;
        if !actions::available_actions(kind, &self.state).contains(&action) {
            return Err(SessionError::ActionUnavailable { action, kind });
        }

        let consequence = actions::resolve(action, kind, &self.state);
        let result = actions::apply(&consequence, &mut self.state, self.rng.actions());
        log::debug!(
            "action | scene:{current} {action} success:{} energy:{} risk:{}",
            result.success,
            self.state.energy,
            self.state.risk_level
        );

        let mut report = StepReport {
            action: Some(result),
            ..StepReport::default()
        };
        if let Some(reason) = self.check_ended() {
            report.ended = Some(reason);
            return Ok(report);
        }
        self.advance(Some(&current), &mut report);
        Ok(report)
    }

    /// Play one combat exchange. Once the fight ends, settles rewards or
    /// penalties and resumes scene traversal from the combat scene.
    ///
    /// # Errors
    ///
    /// Fails if no fight is pending or the resolver rejects the action.
    pub fn combat_round(&mut self, action: PlayerAction) -> Result<CombatRoundReport, SessionError> {
        let combat = self.combat.as_mut().ok_or(SessionError::NoCombat)?;
        let turns = play_round(combat, action, self.rng.combat())?;
        let player_hp = combat.player_hp;
        let outcome = combat.outcome();
        self.state.hero.set_hp(player_hp);

        let mut report = CombatRoundReport {
            turns,
            outcome,
            levels_gained: 0,
            next: None,
            ended: None,
        };
        let Some(outcome) = outcome else {
            return Ok(report);
        };
        self.combat = None;
        report.levels_gained = self.settle(outcome);
        if let Some(reason) = self.check_ended() {
            report.ended = Some(reason);
            return Ok(report);
        }

        let mut next = StepReport::default();
        let from = self.state.current_scene.clone();
        self.advance(from.as_deref(), &mut next);
        report.ended.clone_from(&next.ended);
        report.next = Some(next);
        Ok(report)
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        match &self.ended {
            Some(reason) => Err(SessionError::Ended(reason.clone())),
            None => Ok(()),
        }
    }

    fn advance(&mut self, from: Option<&str>, report: &mut StepReport) {
        let graph = Arc::clone(&self.graph);
        match select_next(&graph, &self.state, from, self.rng.scenes()) {
            Ok(selection) => {
                report.scene = Some(selection.scene.id.clone());
                report.trace = Some(selection.trace);
                report.combat_started = self.enter(selection.scene);
                if !report.combat_started {
                    report.ended = self.check_ended();
                }
            }
            Err(err) => {
                log::debug!("adventure {} stops: {err}", self.state.user_id);
                self.ended = Some(EndReason::NoSceneAvailable);
                report.ended = self.ended.clone();
            }
        }
    }

    /// Apply scene consequences; returns whether a fight began.
    fn enter(&mut self, scene: &Scene) -> bool {
        self.graph.apply_consequences(scene, &mut self.state);
        self.state.current_scene = Some(scene.id.clone());
        if scene.kind != SceneKind::Combat {
            return false;
        }

        let enemy = scene
            .enemy
            .unwrap_or_default()
            .generate(self.state.stat(STAT_LEVEL), self.cfg.enemy_region_multiplier);
        let hero = &self.state.hero;
        let combat = CombatState::begin(
            hero.combat_profile(),
            hero.hp,
            hero.max_hp(),
            enemy,
            self.rng.combat(),
        );
        log::debug!(
            "combat begins in '{}' against {}",
            scene.id,
            combat.enemy.name
        );
        self.combat = Some(combat);
        true
    }

    fn settle(&mut self, outcome: CombatOutcome) -> i32 {
        match outcome {
            CombatOutcome::Victory { xp, gold } => {
                self.state.add_stat(STAT_XP, xp);
                self.state.add_stat(STAT_GOLD, gold);
                let before = self.state.stat(STAT_LEVEL).max(1);
                let after = level_from_xp(self.state.stat(STAT_XP));
                if after > before {
                    let gained = after - before;
                    self.state.hero.level_up(gained.unsigned_abs());
                    self.state.stats.insert(STAT_LEVEL.to_string(), after);
                    return gained;
                }
                0
            }
            CombatOutcome::Defeat => {
                self.state.hero.set_hp(self.cfg.defeat_hp);
                let gold = self.state.stat(STAT_GOLD).max(0);
                let lost = floor_f64_to_i32(f64::from(gold) * self.cfg.defeat_gold_penalty);
                self.state.add_stat(STAT_GOLD, -lost);
                0
            }
            CombatOutcome::Escaped => 0,
        }
    }
}
