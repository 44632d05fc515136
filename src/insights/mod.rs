//! Rule-based insight generation on top of the performance analyzer.

pub mod engine;
pub mod rules;
pub mod scenarios;

pub use engine::*;
pub use rules::{LOW_PR_THRESHOLD, NORMAL_OPERATION, RULES, Rule, RuleContext};
pub use scenarios::{SCENARIOS, Scenario, scenario};
