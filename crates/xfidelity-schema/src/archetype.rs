use std::collections::BTreeMap;
use std::sync::OnceLock;

use jsonschema::Validator;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

const ARCHETYPE_SCHEMA_JSON: &str = include_str!("schemas/archetype.schema.json");
static ARCHETYPE_SCHEMA: OnceLock<Validator> = OnceLock::new();

const RULE_SCHEMA_JSON: &str = include_str!("schemas/rule.schema.json");
static RULE_SCHEMA: OnceLock<Validator> = OnceLock::new();

fn archetype_schema() -> &'static Validator {
    ARCHETYPE_SCHEMA.get_or_init(|| {
        let schema: serde_json::Value =
            serde_json::from_str(ARCHETYPE_SCHEMA_JSON).expect("embedded archetype schema is valid JSON");
        Validator::new(&schema).expect("embedded archetype schema compiles")
    })
}

fn rule_schema() -> &'static Validator {
    RULE_SCHEMA.get_or_init(|| {
        let schema: serde_json::Value =
            serde_json::from_str(RULE_SCHEMA_JSON).expect("embedded rule schema is valid JSON");
        Validator::new(&schema).expect("embedded rule schema compiles")
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeRuntimeConfig {
    #[serde(default)]
    pub minimum_dependency_versions: BTreeMap<String, String>,
    #[serde(default)]
    pub standard_structure: serde_json::Value,
    #[serde(default)]
    pub blacklist_patterns: Vec<String>,
    #[serde(default)]
    pub whitelist_patterns: Vec<String>,
}

impl ArchetypeRuntimeConfig {
    /// Parses `minimumDependencyVersions` into semver requirements,
    /// rejecting the whole archetype if any entry is malformed.
    pub fn dependency_requirements(
        &self,
    ) -> Result<BTreeMap<String, semver::VersionReq>, SchemaError> {
        self.minimum_dependency_versions
            .iter()
            .map(|(name, req)| {
                semver::VersionReq::parse(req)
                    .map(|parsed| (name.clone(), parsed))
                    .map_err(|source| SchemaError::InvalidVersionReq {
                        name: name.clone(),
                        source,
                    })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_server: Option<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<String>>,
    #[serde(default)]
    pub config: ArchetypeRuntimeConfig,
}

impl ArchetypeConfig {
    /// Parses and schema-validates an archetype document.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        validate_against(archetype_schema(), &value)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Parses and schema-validates a standalone rule document (as loaded
/// from a remote config server or a local rules directory).
pub fn parse_rule_config(json: &str) -> Result<crate::rule::RuleConfig, SchemaError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    validate_against(rule_schema(), &value)?;
    Ok(serde_json::from_value(value)?)
}

fn validate_against(schema: &Validator, value: &serde_json::Value) -> Result<(), SchemaError> {
    if let Err(e) = schema.validate(value) {
        return Err(SchemaError::ValidationFailed(
            e.to_string(),
            e.instance_path().to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_archetype_json() -> &'static str {
        r#"{
            "name": "node-fullstack",
            "rules": ["no-todo-rule", "outdated-dependency-rule"],
            "plugins": ["xfiPluginFileSystem"],
            "config": {
                "minimumDependencyVersions": {"express": "^4.18.0"},
                "blacklistPatterns": ["node_modules"],
                "whitelistPatterns": ["src/**"]
            }
        }"#
    }

    #[test]
    fn parses_valid_archetype() {
        let config = ArchetypeConfig::from_json(sample_archetype_json()).unwrap();
        assert_eq!(config.name, "node-fullstack");
        assert_eq!(config.rules.len(), 2);
        assert_eq!(
            config.config.minimum_dependency_versions.get("express").unwrap(),
            "^4.18.0"
        );
    }

    #[test]
    fn dependency_requirements_parse_semver() {
        let config = ArchetypeConfig::from_json(sample_archetype_json()).unwrap();
        let reqs = config.config.dependency_requirements().unwrap();
        assert!(reqs["express"].matches(&semver::Version::parse("4.18.2").unwrap()));
    }

    #[test]
    fn rejects_archetype_missing_required_name() {
        let json = r#"{"rules": [], "config": {}}"#;
        let err = ArchetypeConfig::from_json(json).unwrap_err();
        assert!(matches!(err, SchemaError::ValidationFailed(..)));
    }

    #[test]
    fn rejects_unknown_top_level_property() {
        let json = r#"{"name": "x", "rules": [], "config": {}, "typo": true}"#;
        let err = ArchetypeConfig::from_json(json).unwrap_err();
        assert!(matches!(err, SchemaError::ValidationFailed(..)));
    }

    #[test]
    fn parses_standalone_rule_document() {
        let json = r#"{
            "name": "no-todo-rule",
            "conditions": {"all": [{"fact": "fileContent", "operator": "contains", "value": "TODO"}]},
            "event": {"type": "warning", "params": {"message": "TODO found"}}
        }"#;
        let rule = parse_rule_config(json).unwrap();
        assert_eq!(rule.name, "no-todo-rule");
    }
}
