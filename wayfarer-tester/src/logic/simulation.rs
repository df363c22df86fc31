use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use wayfarer_game::{
    Action, AdventureCfg, AdventureSession, CharacterClass, CombatOutcome, EndReason,
    PlayerAction, PlayerState, SceneGraph, SessionError, StepReport,
};

use crate::logic::policy::{GameplayStrategy, PlayerPolicy, PolicyDecision};

/// Hard cap on narrative steps when a plan does not set one.
pub const DEFAULT_MAX_STEPS: usize = 200;

/// Declarative plan for running an adventure simulation.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    /// Fixed hero class; rotates through every class by seed when unset.
    pub class: Option<CharacterClass>,
    pub max_steps: Option<usize>,
    pub setup: Option<fn(&mut PlayerState)>,
    /// Run every seed twice and record whether both runs matched.
    pub verify_replay: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            class: None,
            max_steps: None,
            setup: None,
            verify_replay: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_class(mut self, class: CharacterClass) -> Self {
        self.class = Some(class);
        self
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut PlayerState)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub const fn with_replay_check(mut self) -> Self {
        self.verify_replay = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }

    fn class_for(&self, seed: u64) -> CharacterClass {
        self.class.unwrap_or_else(|| {
            let slot = usize::try_from(seed % 5).unwrap_or(0);
            CharacterClass::ALL[slot]
        })
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// One scene entry, with the decision that led to it.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub scene: Option<String>,
    pub action: Option<Action>,
    pub success: Option<bool>,
    pub rationale: Option<String>,
    pub combat_started: bool,
}

impl StepRecord {
    fn from_report(report: &StepReport, decision: Option<PolicyDecision>) -> Self {
        let (action, rationale) = decision.map_or((None, None), |d| (Some(d.action), d.rationale));
        Self {
            scene: report.scene.clone(),
            action,
            success: report.action.as_ref().map(|result| result.success),
            rationale,
            combat_started: report.combat_started,
        }
    }
}

/// How one fight went.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatRecord {
    pub enemy: String,
    pub rounds: u32,
    pub outcome: Option<CombatOutcome>,
    /// The round limit ran out and the driver switched to escaping.
    pub forced_escape: bool,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub class: CharacterClass,
    pub steps: Vec<StepRecord>,
    pub combats: Vec<CombatRecord>,
    pub final_state: PlayerState,
    pub end_reason: Option<EndReason>,
    pub ending_message: String,
    pub game_ended: bool,
    /// Whether a second run of the same seed matched; set for replay plans.
    pub replay_matched: Option<bool>,
}

impl SimulationSummary {
    pub fn scenes_entered(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|step| step.scene.as_deref())
    }

    #[must_use]
    pub fn victories(&self) -> usize {
        self.combats
            .iter()
            .filter(|c| matches!(c.outcome, Some(CombatOutcome::Victory { .. })))
            .count()
    }

    #[must_use]
    pub fn defeats(&self) -> usize {
        self.combats
            .iter()
            .filter(|c| matches!(c.outcome, Some(CombatOutcome::Defeat)))
            .count()
    }

    /// Label used to bucket runs by how they ended.
    #[must_use]
    pub fn ending_kind(&self) -> String {
        match &self.end_reason {
            Some(EndReason::RiskThreshold { .. }) => "risk_threshold".to_string(),
            Some(EndReason::EnergyDepleted { .. }) => "energy_depleted".to_string(),
            Some(EndReason::GoalReached { goal }) => format!("goal:{goal}"),
            Some(EndReason::StepBudget { .. }) => "step_budget".to_string(),
            Some(EndReason::NoSceneAvailable) => "no_scene_available".to_string(),
            None => "halted".to_string(),
        }
    }
}

/// Headless deterministic runner over one scene graph.
#[derive(Debug, Clone)]
pub struct AdventureTester {
    graph: Arc<SceneGraph>,
    cfg: AdventureCfg,
    verbose: bool,
}

impl AdventureTester {
    #[must_use]
    pub const fn new(graph: Arc<SceneGraph>, cfg: AdventureCfg, verbose: bool) -> Self {
        Self {
            graph,
            cfg,
            verbose,
        }
    }

    #[must_use]
    pub fn bundled(verbose: bool) -> Self {
        Self::new(
            Arc::new(SceneGraph::load_from_static()),
            AdventureCfg::default(),
            verbose,
        )
    }

    /// Load scenes from `scene_file`, or the bundled adventure when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene file cannot be read or is invalid.
    pub fn load(scene_file: Option<&Path>, verbose: bool) -> Result<Self> {
        let Some(path) = scene_file else {
            return Ok(Self::bundled(verbose));
        };
        let graph = SceneGraph::try_load(path)
            .with_context(|| format!("failed to load scenes from {}", path.display()))?;
        anyhow::ensure!(!graph.is_empty(), "{} defines no scenes", path.display());
        Ok(Self::new(Arc::new(graph), AdventureCfg::default(), verbose))
    }

    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let mut summary = self.simulate(plan, seed);
        if plan.verify_replay {
            let replay = self.simulate(plan, seed);
            summary.replay_matched = Some(
                replay.steps == summary.steps
                    && replay.combats == summary.combats
                    && replay.final_state == summary.final_state,
            );
        }
        summary
    }

    fn simulate(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let class = plan.class_for(seed);
        let mut state = PlayerState::new(seed).with_class(class);
        if let Some(setup) = plan.setup {
            setup(&mut state);
        }
        let mut session =
            AdventureSession::new(Arc::clone(&self.graph), self.cfg.clone(), state, seed);
        let mut policy = plan.strategy.create_policy(seed);
        let max_steps = plan.max_steps.unwrap_or(DEFAULT_MAX_STEPS);

        if self.verbose {
            log_initial_state(seed, plan, class, session.state());
        }

        let mut steps = Vec::new();
        let mut combats = Vec::new();
        let mut halted = match session.start() {
            Ok(report) => {
                steps.push(StepRecord::from_report(&report, None));
                None
            }
            Err(err) => Some(err.to_string()),
        };

        while halted.is_none() && !session.is_over() && steps.len() < max_steps {
            if session.in_combat() {
                match self.fight(&mut session, policy.as_mut()) {
                    Ok((record, next)) => {
                        combats.push(record);
                        if let Some(next) = next {
                            steps.push(StepRecord::from_report(&next, None));
                        }
                    }
                    Err(err) => halted = Some(err.to_string()),
                }
                continue;
            }

            let offered = session.available_actions();
            let kind = session.current_scene().map(|scene| scene.kind);
            let decision =
                kind.and_then(|kind| policy.pick_action(session.state(), kind, &offered));
            let Some(decision) = decision else {
                halted = Some("No affordable action".to_string());
                break;
            };
            match session.take_action(decision.action) {
                Ok(report) => {
                    if self.verbose {
                        log_step(&report, &decision, policy.name());
                    }
                    steps.push(StepRecord::from_report(&report, Some(decision)));
                }
                Err(err) => halted = Some(err.to_string()),
            }
        }

        if let Some(message) = &halted {
            log::warn!("simulation seed {seed} halted: {message}");
        }
        let end_reason = session.ended().cloned();
        let ending_message = match (&end_reason, halted) {
            (Some(reason), _) => reason.to_string(),
            (None, Some(message)) => message,
            (None, None) => "Step limit reached".to_string(),
        };
        if self.verbose {
            println!("🏁 Simulation ended: {ending_message}");
        }

        SimulationSummary {
            seed,
            strategy: plan.strategy,
            class,
            steps,
            combats,
            final_state: session.into_state(),
            game_ended: end_reason.is_some(),
            end_reason,
            ending_message,
            replay_matched: None,
        }
    }

    /// Play the pending fight to its end, escaping once the round limit runs out.
    fn fight(
        &self,
        session: &mut AdventureSession,
        policy: &mut dyn PlayerPolicy,
    ) -> Result<(CombatRecord, Option<StepReport>), SessionError> {
        let enemy = session
            .combat()
            .map(|combat| combat.enemy.name.clone())
            .unwrap_or_default();
        let limit = session.cfg().combat_round_limit;
        let mut record = CombatRecord {
            enemy,
            rounds: 0,
            outcome: None,
            forced_escape: false,
        };

        while let Some(combat) = session.combat() {
            let action = if record.rounds >= limit {
                record.forced_escape = true;
                PlayerAction::Escape
            } else {
                policy.pick_combat(combat)
            };
            let report = session.combat_round(action)?;
            record.rounds += 1;
            if self.verbose {
                for turn in &report.turns {
                    for entry in &turn.entries {
                        println!("  ⚔️  {entry}");
                    }
                }
            }
            if report.outcome.is_some() {
                record.outcome = report.outcome;
                return Ok((record, report.next));
            }
        }
        Ok((record, None))
    }
}

fn log_initial_state(seed: u64, plan: &SimulationPlan, class: CharacterClass, state: &PlayerState) {
    println!(
        "🎮 Starting simulation | seed:{seed} class:{class} policy:{}",
        plan.strategy.label()
    );
    println!(
        "📊 Initial stats | HP:{} Energy:{} Risk:{}",
        state.hero.hp, state.energy, state.risk_level
    );
}

fn log_step(report: &StepReport, decision: &PolicyDecision, policy: &str) {
    let outcome = report
        .action
        .as_ref()
        .map_or("-", |result| if result.success { "ok" } else { "failed" });
    println!(
        "🎯 {} ({}) -> {} [{}]",
        decision.action,
        outcome,
        report.scene.as_deref().unwrap_or("-"),
        policy
    );
    if report.combat_started {
        println!("⚔️  Combat begins");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_game::{Scene, SceneData, SceneKind, SceneTransition};

    fn loop_graph() -> Arc<SceneGraph> {
        Arc::new(
            SceneGraph::from_data(SceneData {
                scenes: vec![
                    Scene::new("camp", SceneKind::Rest).with_transition(SceneTransition::new("trail")),
                    Scene::new("trail", SceneKind::Story)
                        .requiring("visited:camp")
                        .with_transition(SceneTransition::new("camp")),
                ],
                end_conditions: Vec::new(),
            })
            .expect("graph"),
        )
    }

    #[test]
    fn step_limit_halts_endless_graphs() {
        let tester = AdventureTester::new(loop_graph(), AdventureCfg::default(), false);
        let plan = SimulationPlan::new(GameplayStrategy::Cautious).with_max_steps(6);
        let summary = tester.run_plan(&plan, 11);
        assert_eq!(summary.steps.len(), 6);
        assert!(!summary.game_ended);
        assert_eq!(summary.ending_message, "Step limit reached");
        assert_eq!(summary.ending_kind(), "halted");
        assert_eq!(summary.scenes_entered().next(), Some("camp"));
    }

    #[test]
    fn classes_rotate_by_seed_unless_fixed() {
        let plan = SimulationPlan::new(GameplayStrategy::Bold);
        assert_eq!(plan.class_for(0), CharacterClass::ALL[0]);
        assert_eq!(plan.class_for(7), CharacterClass::ALL[2]);
        let fixed = plan.with_class(CharacterClass::Mage);
        assert_eq!(fixed.class_for(7), CharacterClass::Mage);
    }

    #[test]
    fn bundled_runs_finish_and_replay() {
        let tester = AdventureTester::bundled(false);
        for strategy in GameplayStrategy::ALL {
            let plan = SimulationPlan::new(strategy).with_replay_check();
            let summary = tester.run_plan(&plan, 42);
            assert!(summary.game_ended, "{strategy}: {}", summary.ending_message);
            assert_eq!(summary.replay_matched, Some(true));
            assert!(summary.combats.iter().all(|c| c.outcome.is_some()));
        }
    }

    #[test]
    fn setup_hooks_shape_the_starting_state() {
        let tester = AdventureTester::bundled(false);
        let plan = SimulationPlan::new(GameplayStrategy::Cautious)
            .with_max_steps(0)
            .with_setup(|state| state.energy = 5);
        let summary = tester.run_plan(&plan, 1);
        assert!(summary.steps.is_empty());
        assert!(summary.ending_message.contains("not enough energy"));
    }

    #[test]
    fn missing_scene_files_are_reported() {
        let path = std::env::temp_dir().join("wayfarer-tester-missing-scenes.json");
        let err = AdventureTester::load(Some(&path), false).unwrap_err();
        assert!(err.to_string().contains("failed to load scenes"));
        assert!(AdventureTester::load(None, false).is_ok());
    }
}
