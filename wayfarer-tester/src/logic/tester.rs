use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use wayfarer_game::numbers::usize_to_f64;

use crate::logic::scenarios::TestScenario;
use crate::logic::simulation::{AdventureTester, SimulationPlan, SimulationSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    /// Mean scenes entered per run.
    pub mean_steps: f64,
    pub victories: usize,
    pub defeats: usize,
    /// How many runs ended for each reason.
    pub endings: BTreeMap<String, usize>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

#[derive(Debug, Default)]
struct IterationTally {
    successes: usize,
    failures: Vec<String>,
    performance_data: Vec<Duration>,
    total_steps: usize,
    victories: usize,
    defeats: usize,
    endings: BTreeMap<String, usize>,
}

pub struct LogicTester {
    tester: AdventureTester,
}

impl LogicTester {
    pub const fn new(tester: AdventureTester) -> Self {
        Self { tester }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.tester.verbose() {
                println!(
                    "🧪 Testing scenario: {} (strategy: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.strategy.label(),
                    seed
                );
            }

            let result = self.run_single_scenario(scenario, seed, iterations);
            results.push(result);
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let tally = self.run_simulation_iterations(&scenario.plan, seed, iterations);

        let average_duration = if tally.performance_data.is_empty() {
            Duration::ZERO
        } else {
            tally.performance_data.iter().sum::<Duration>()
                / u32::try_from(tally.performance_data.len()).unwrap_or(1)
        };
        let mean_steps = if iterations == 0 {
            0.0
        } else {
            usize_to_f64(tally.total_steps) / usize_to_f64(iterations)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: tally.failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: tally.successes,
            failures: tally.failures,
            mean_steps,
            victories: tally.victories,
            defeats: tally.defeats,
            endings: tally.endings,
            average_duration,
            performance_data: tally.performance_data,
        }
    }

    fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> IterationTally {
        let mut tally = IterationTally::default();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = self.tester.run_plan(plan, iteration_seed);
            tally.total_steps += summary.steps.len();
            tally.victories += summary.victories();
            tally.defeats += summary.defeats();
            *tally.endings.entry(summary.ending_kind()).or_default() += 1;

            if let Some(err) = evaluate_expectations(plan, &summary) {
                let context = summarize_decision_path(&summary);
                let final_state = &summary.final_state;
                tally.failures.push(format!(
                    "Iteration {} (class {}, strategy {}, seed {}, steps {}, ending '{}'): {} | {} | final HP {} Energy {} Risk {}",
                    i + 1,
                    summary.class,
                    summary.strategy.label(),
                    summary.seed,
                    summary.steps.len(),
                    summary.ending_message,
                    err,
                    context,
                    final_state.hero.hp,
                    final_state.energy,
                    final_state.risk_level
                ));

                if self.tester.verbose() {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                    println!("     ↳ Seed {} | Decisions: {}", summary.seed, context);
                }
            } else {
                tally.successes += 1;
                let duration = start_time.elapsed();
                tally.performance_data.push(duration);

                if self.tester.verbose() {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) steps:{} ending:{} strategy:{}",
                        i + 1,
                        iterations,
                        summary.steps.len(),
                        summary.ending_message,
                        summary.strategy.label()
                    );
                }
            }
        }

        tally
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

fn summarize_decision_path(summary: &SimulationSummary) -> String {
    let decisions: Vec<String> = summary
        .steps
        .iter()
        .rev()
        .filter_map(|step| {
            let action = step.action?;
            let rationale = step
                .rationale
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("-");
            Some(format!(
                "{} -> {} reason {}",
                action,
                step.scene.as_deref().unwrap_or("-"),
                rationale
            ))
        })
        .take(3)
        .collect();
    if decisions.is_empty() {
        "no decisions recorded".to_string()
    } else {
        decisions.join(" | ")
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
