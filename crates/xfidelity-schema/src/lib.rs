//! Archetype and rule document types shared across the workspace, plus
//! the JSON Schema validation gate every document passes through before
//! being deserialized into those types.

mod archetype;
mod condition;
mod error;
mod result;
mod rule;

pub use archetype::{parse_rule_config, ArchetypeConfig, ArchetypeRuntimeConfig};
pub use condition::{Condition, ConditionSet, LeafCondition};
pub use error::SchemaError;
pub use result::{
    ConditionDetails, ConditionType, FileData, RuleFailure, RuleFailureDetails, ScanResult,
    REPO_GLOBAL_CHECK,
};
pub use rule::{ErrorBehavior, ErrorLevel, EventConfig, RuleConfig};
