use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::rule::ErrorLevel;

/// One file's worth of scan input: the raw bytes behind a `fileContent`
/// fact plus the path/name facts commonly keyed on in conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileData {
    pub file_path: PathBuf,
    pub file_name: String,
    pub file_content: String,
}

impl FileData {
    pub fn new(file_path: impl Into<PathBuf>, file_content: impl Into<String>) -> Self {
        let file_path = file_path.into();
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file_path,
            file_name,
            file_content: file_content.into(),
        }
    }
}

/// The sentinel path used for the one synthetic "file" a repo-wide rule
/// (one with no per-file facts in its conditions) evaluates against,
/// run once after every real file has been scanned.
pub const REPO_GLOBAL_CHECK: &str = "REPO_GLOBAL_CHECK";

/// One leaf condition's shape as preserved in `RuleFailure.details`,
/// independent of `LeafCondition` so the priority/path fields stay
/// optional exactly as the rule-failure record requires, not as the
/// condition document requires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionDetails {
    pub fact: String,
    pub operator: String,
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionType {
    All,
    Any,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFailureDetails {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_details: Option<ConditionDetails>,
    pub all_conditions: Vec<ConditionDetails>,
    pub condition_type: ConditionType,
    pub rule_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    pub file_path: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_fact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFailure {
    pub rule_failure: String,
    pub level: ErrorLevel,
    pub details: RuleFailureDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub file_path: String,
    pub errors: Vec<RuleFailure>,
}

impl ScanResult {
    pub fn worst_level(&self) -> Option<ErrorLevel> {
        self.errors.iter().map(|e| e.level).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_data_derives_file_name_from_path() {
        let file = FileData::new("src/lib.rs", "fn main() {}");
        assert_eq!(file.file_name, "lib.rs");
    }

    #[test]
    fn scan_result_worst_level_is_the_maximum() {
        let result = ScanResult {
            file_path: "src/lib.rs".to_string(),
            errors: vec![
                RuleFailure {
                    rule_failure: "r1".to_string(),
                    level: ErrorLevel::Warning,
                    details: RuleFailureDetails {
                        message: "m1".to_string(),
                        condition_details: None,
                        all_conditions: vec![],
                        condition_type: ConditionType::All,
                        rule_description: "No description available".to_string(),
                        recommendations: None,
                        file_path: "src/lib.rs".to_string(),
                        file_name: "lib.rs".to_string(),
                        result_fact: None,
                        details: None,
                    },
                },
                RuleFailure {
                    rule_failure: "r2".to_string(),
                    level: ErrorLevel::Fatality,
                    details: RuleFailureDetails {
                        message: "m2".to_string(),
                        condition_details: None,
                        all_conditions: vec![],
                        condition_type: ConditionType::All,
                        rule_description: "No description available".to_string(),
                        recommendations: None,
                        file_path: "src/lib.rs".to_string(),
                        file_name: "lib.rs".to_string(),
                        result_fact: None,
                        details: None,
                    },
                },
            ],
        };
        assert_eq!(result.worst_level(), Some(ErrorLevel::Fatality));
    }
}
