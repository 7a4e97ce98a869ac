use serde::{Deserialize, Serialize};

use crate::condition::ConditionSet;

/// Severity assigned to a fired rule. Ordered per spec.md's severity
/// list (`trace < debug < info < warning < error < fatality`), with
/// `Exempt` above `Fatality` since it represents an override of the
/// worst outcome rather than a point on that scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Fatality,
    Exempt,
}

/// How a rule's own evaluation error should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorBehavior {
    /// Turn the rule's internal failure into a fatal `RuleFailure`.
    Fatality,
    /// Log and skip the rule; scanning continues unaffected.
    Swallow,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventConfig {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    pub conditions: ConditionSet,
    pub event: EventConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_behavior: Option<ErrorBehavior>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<serde_json::Value>,
}

impl RuleConfig {
    pub fn error_behavior(&self) -> ErrorBehavior {
        self.error_behavior.unwrap_or(ErrorBehavior::Swallow)
    }
}
