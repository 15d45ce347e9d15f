//! Rule-based risk scoring.

mod engine;
mod rule;

pub use engine::{recommendation, RiskPolicy, RuleEngine};
pub use rule::{Outcome, Rule, RuleKind, RuleSet};
