//! End-to-end scenarios, one per outcome named in the governing
//! specification's testable-properties section.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::json;
use xfidelity_config::{ConfigResolver, CoreOptions};
use xfidelity_engine::RuleEngine;
use xfidelity_exemptions::{Exemption, ExemptionStore};
use xfidelity_orchestrator::{run_engine_on_files, ScanRequest};
use xfidelity_plugin::{OperatorDefn, PluginRegistry};
use xfidelity_schema::{
    ArchetypeConfig, ArchetypeRuntimeConfig, Condition, ConditionSet, ErrorBehavior, EventConfig,
    FileData, LeafCondition, RuleConfig, REPO_GLOBAL_CHECK,
};
use xfidelity_telemetry::{TelemetryEvent, TelemetrySink};

fn archetype(name: &str) -> ArchetypeConfig {
    ArchetypeConfig {
        name: name.to_string(),
        description: None,
        config_server: None,
        rules: vec![],
        operators: None,
        facts: None,
        plugins: None,
        config: ArchetypeRuntimeConfig::default(),
    }
}

/// Scenario 1: `getConfig` idempotency — same archetype name returns the
/// same instance; a different name returns a distinct one.
#[tokio::test]
async fn get_config_is_idempotent_per_archetype_name() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("scenario-one.json"),
        r#"{"name":"scenario-one","rules":[],"config":{}}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("scenario-one-b.json"),
        r#"{"name":"scenario-one-b","rules":[],"config":{}}"#,
    )
    .unwrap();

    let registry = PluginRegistry::new();
    let resolver = ConfigResolver::new(&registry);
    let options = CoreOptions {
        local_config_path: Some(dir.path().to_str().unwrap().to_string()),
        ..Default::default()
    };

    let a = resolver.get_config(Some("scenario-one"), options.clone()).await.unwrap();
    let b = resolver.get_config(Some("scenario-one"), options.clone()).await.unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let c = resolver.get_config(Some("scenario-one-b"), options).await.unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
}

/// Scenario 3: an archetype name outside `[A-Za-z0-9_-]+` is rejected
/// before any source is consulted, and nothing is cached.
#[tokio::test]
async fn invalid_archetype_name_is_rejected_and_not_cached() {
    let registry = PluginRegistry::new();
    let resolver = ConfigResolver::new(&registry);
    let err = resolver
        .get_config(Some("invalid/archetype"), CoreOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, xfidelity_config::ConfigError::InvalidArchetypeName(_)));
}

fn contains_operator() -> OperatorDefn {
    OperatorDefn::native(
        "contains",
        Arc::new(|a, b| a.as_str().zip(b.as_str()).is_some_and(|(a, b)| a.contains(b))),
    )
}

fn contains_rule(name: &str, needle: &str) -> RuleConfig {
    RuleConfig {
        name: name.to_string(),
        description: None,
        recommendations: None,
        conditions: ConditionSet::All(vec![Condition::Leaf(LeafCondition {
            fact: "fileContent".into(),
            operator: "contains".into(),
            value: json!(needle),
            path: None,
            params: None,
            priority: None,
        })]),
        event: EventConfig { event_type: "warning".into(), params: None },
        error_behavior: Some(ErrorBehavior::Swallow),
        on_error: None,
    }
}

fn request(files: Vec<FileData>) -> ScanRequest {
    ScanRequest {
        file_data: files,
        archetype: archetype("scenario"),
        installed_dependency_versions: json!({}),
        minimum_dependency_versions: json!({}),
        standard_structure: json!({}),
        repo_path: None,
    }
}

/// Scenario 4: an iterative file plus the repo-global pseudo-file each
/// match once — two `ScanResult`s, global reported last with the
/// sentinel path.
#[tokio::test]
async fn run_engine_on_files_orders_global_result_last() {
    let mut operators = HashMap::new();
    operators.insert("contains".to_string(), contains_operator());
    let engine = RuleEngine::new(vec![contains_rule("no-todo", "TODO")], operators, HashMap::new());

    let files = vec![
        FileData::new("f.ts", "// TODO: refactor"),
        FileData::new(REPO_GLOBAL_CHECK, "// TODO: refactor"),
    ];
    let results = run_engine_on_files(&engine, request(files)).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].file_path, "f.ts");
    assert_eq!(results[1].file_path, REPO_GLOBAL_CHECK);
}

/// Scenario 5: three conditions in one file that all resolve to the same
/// `(ruleFailure, event.type, event.params.message)` key collapse to a
/// single `RuleFailure`.
#[tokio::test]
async fn three_identical_matches_in_one_file_dedupe_to_one_failure() {
    let mut operators = HashMap::new();
    operators.insert("contains".to_string(), contains_operator());
    let rule = RuleConfig {
        name: "no-todo".into(),
        description: None,
        recommendations: None,
        conditions: ConditionSet::Any(vec![
            Condition::Leaf(LeafCondition {
                fact: "fileContent".into(),
                operator: "contains".into(),
                value: json!("TODO"),
                path: None,
                params: None,
                priority: None,
            }),
            Condition::Leaf(LeafCondition {
                fact: "fileContent".into(),
                operator: "contains".into(),
                value: json!("FIXME"),
                path: None,
                params: None,
                priority: None,
            }),
            Condition::Leaf(LeafCondition {
                fact: "fileContent".into(),
                operator: "contains".into(),
                value: json!("XXX"),
                path: None,
                params: None,
                priority: None,
            }),
        ]),
        event: EventConfig { event_type: "warning".into(), params: None },
        error_behavior: None,
        on_error: None,
    };
    let engine = RuleEngine::new(vec![rule], operators, HashMap::new());

    let files = vec![FileData::new("f.ts", "TODO FIXME XXX all in one line")];
    let results = run_engine_on_files(&engine, request(files)).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].errors.len(), 1);
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl TelemetrySink for RecordingSink {
    fn record(&self, event: TelemetryEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Scenario 6: `isExempt` is true and emits `exemptionAllowed` for a
/// covering, unexpired exemption; false and silent once it has expired.
#[tokio::test]
async fn is_exempt_matches_only_while_unexpired_and_emits_telemetry_on_match() {
    let repo_url = "https://github.com/o/p";
    let store = ExemptionStore::new(vec![Exemption {
        repo_url: repo_url.to_string(),
        rule: "r".to_string(),
        expiration_date: "2099-12-31T00:00:00Z".parse().unwrap(),
        reason: "x".to_string(),
    }]);

    assert!(store.is_exempt(repo_url, "r").is_exempt());

    let mut results = vec![xfidelity_schema::ScanResult {
        file_path: "f.ts".to_string(),
        errors: vec![xfidelity_schema::RuleFailure {
            rule_failure: "r".to_string(),
            level: xfidelity_schema::ErrorLevel::Warning,
            details: xfidelity_schema::RuleFailureDetails {
                message: "m".to_string(),
                condition_details: None,
                all_conditions: vec![],
                condition_type: xfidelity_schema::ConditionType::All,
                rule_description: "No description available".to_string(),
                recommendations: None,
                file_path: "f.ts".to_string(),
                file_name: "f.ts".to_string(),
                result_fact: None,
                details: None,
            },
        }],
    }];

    let sink = RecordingSink::default();
    xfidelity_orchestrator::apply_exemptions(&mut results, &store, repo_url, &sink);

    assert_eq!(results[0].errors[0].level, xfidelity_schema::ErrorLevel::Exempt);
    assert_eq!(sink.events.lock().unwrap().len(), 1);

    let expired_store = ExemptionStore::new(vec![Exemption {
        repo_url: repo_url.to_string(),
        rule: "r".to_string(),
        expiration_date: "2000-01-01T00:00:00Z".parse().unwrap(),
        reason: "x".to_string(),
    }]);
    assert!(!expired_store.is_exempt(repo_url, "r").is_exempt());
}
