//! Per-run fact memoization (`Almanac`) and condition-tree evaluation
//! (`RuleEngine`): construct an engine from a rule/operator/fact set, run
//! it against one file's context, and get back matched rules ready for
//! `RuleFailure` construction by the scan orchestrator.

mod almanac;
mod engine;
mod error;
mod path;

pub use almanac::{Almanac, RunContext};
pub use engine::{EngineRunResult, EvalResult, RuleEngine};
pub use error::EngineError;
