pub mod policy;
pub mod reports;
pub mod scenarios;
pub mod simulation;
pub mod tester;

pub use scenarios::{all_scenario_keys, get_scenario, list_scenarios};
pub use simulation::AdventureTester;
pub use tester::*;
