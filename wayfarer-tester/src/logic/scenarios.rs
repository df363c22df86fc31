use anyhow::Result;
use wayfarer_game::{CharacterClass, PlayerState};

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{SimulationPlan, SimulationSummary};

/// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

const CATALOG: [(&str, &str); 7] = [
    ("smoke", "Smoke Test"),
    ("cautious", "Full Adventure - Cautious Strategy"),
    ("bold", "Full Adventure - Bold Strategy"),
    ("balanced", "Full Adventure - Balanced Strategy"),
    ("deterministic", "Deterministic Replay Verification"),
    ("invariants", "Player State Invariants"),
    ("combat-gauntlet", "Combat Gauntlet"),
];

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG.to_vec()
}

/// Every scenario key, in catalog order.
pub fn all_scenario_keys() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|(key, _)| *key)
}

fn title(key: &str) -> &'static str {
    CATALOG
        .iter()
        .find(|(k, _)| *k == key)
        .map_or("Unknown Scenario", |(_, title)| *title)
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let key = match name.to_lowercase().as_str() {
        "smoke" => "smoke",
        "cautious" | "cautious-strategy" => "cautious",
        "bold" | "bold-strategy" => "bold",
        "balanced" | "balanced-strategy" => "balanced",
        "deterministic" | "replay" => "deterministic",
        "invariants" | "state-invariants" => "invariants",
        "combat-gauntlet" | "combat" => "combat-gauntlet",
        _ => return None,
    };
    let plan = match key {
        "smoke" => SimulationPlan::new(GameplayStrategy::Balanced)
            .with_max_steps(1)
            .with_expectation(smoke_expectation),
        "cautious" => full_adventure(GameplayStrategy::Cautious),
        "bold" => full_adventure(GameplayStrategy::Bold),
        "deterministic" => SimulationPlan::new(GameplayStrategy::Balanced)
            .with_replay_check()
            .with_expectation(replay_expectation),
        "invariants" => SimulationPlan::new(GameplayStrategy::Balanced)
            .with_expectation(ending_expectation)
            .with_expectation(invariant_expectation),
        "combat-gauntlet" => SimulationPlan::new(GameplayStrategy::Bold)
            .with_class(CharacterClass::Warrior)
            .with_setup(gauntlet_setup)
            .with_expectation(ending_expectation)
            .with_expectation(combat_expectation),
        _ => full_adventure(GameplayStrategy::Balanced),
    };
    Some(TestScenario::simulation(title(key), plan))
}

fn full_adventure(strategy: GameplayStrategy) -> SimulationPlan {
    SimulationPlan::new(strategy)
        .with_expectation(ending_expectation)
        .with_expectation(invariant_expectation)
        .with_expectation(combat_expectation)
}

/// Brave and rested, so combat scenes open up early.
fn gauntlet_setup(state: &mut PlayerState) {
    state.stats.insert("bravery".to_string(), 6);
    state.stats.insert("stamina".to_string(), 4);
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(
        summary.scenes_entered().next().is_some(),
        "Adventure should enter an opening scene ({})",
        summary.ending_message
    );
    Ok(())
}

fn ending_expectation(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(
        summary.game_ended,
        "Adventure should reach an end condition, stopped with '{}'",
        summary.ending_message
    );
    Ok(())
}

fn invariant_expectation(summary: &SimulationSummary) -> Result<()> {
    let state = &summary.final_state;
    anyhow::ensure!(
        (0..=100).contains(&state.energy),
        "Energy {} left its bounds",
        state.energy
    );
    anyhow::ensure!(state.risk_level >= 0, "Risk {} went negative", state.risk_level);
    let entered = summary.scenes_entered().count();
    anyhow::ensure!(
        usize::try_from(state.step_count).is_ok_and(|steps| steps == entered),
        "Step count {} does not match {entered} scene entries",
        state.step_count
    );
    for scene in summary.scenes_entered() {
        anyhow::ensure!(
            state.has_visited(scene),
            "Scene '{scene}' missing from visit history"
        );
    }
    Ok(())
}

fn combat_expectation(summary: &SimulationSummary) -> Result<()> {
    for fight in &summary.combats {
        anyhow::ensure!(
            fight.outcome.is_some(),
            "Fight against {} never finished",
            fight.enemy
        );
    }
    let hero = &summary.final_state.hero;
    anyhow::ensure!(
        (1..=hero.max_hp()).contains(&hero.hp),
        "Hero left combat with {} of {} HP",
        hero.hp,
        hero.max_hp()
    );
    Ok(())
}

fn replay_expectation(summary: &SimulationSummary) -> Result<()> {
    anyhow::ensure!(
        summary.replay_matched == Some(true),
        "Replaying seed {} diverged",
        summary.seed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, title) in list_scenarios() {
            let scenario = get_scenario(key).expect("listed scenario");
            assert_eq!(scenario.name, title);
            assert!(!scenario.plan.expectations.is_empty());
        }
        assert_eq!(all_scenario_keys().count(), list_scenarios().len());
    }

    #[test]
    fn aliases_and_case_are_accepted() {
        assert_eq!(
            get_scenario("COMBAT").map(|s| s.name),
            Some("Combat Gauntlet".to_string())
        );
        assert!(get_scenario("replay").is_some_and(|s| s.plan.verify_replay));
        assert!(get_scenario("nonexistent").is_none());
    }

    #[test]
    fn gauntlet_setup_raises_bravery() {
        let mut state = PlayerState::new(1);
        gauntlet_setup(&mut state);
        assert_eq!(state.stat("bravery"), 6);
    }
}
