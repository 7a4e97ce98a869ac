use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tracing::debug;
use xfidelity_plugin::{FactDefn, OperatorDefn};
use xfidelity_schema::{
    Condition, ConditionDetails, ConditionSet, ConditionType, ErrorBehavior, EventConfig,
    LeafCondition, RuleConfig,
};

use crate::almanac::{Almanac, RunContext};
use crate::error::EngineError;
use crate::path::navigate;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One rule's match, carrying everything `RuleFailure` construction needs
/// that is derivable from the rule document alone. `filePath`, `fileName`,
/// `resultFact`, and the post-resolved `details` are finished by the
/// orchestrator, which is the only layer that knows `repoPath`.
#[derive(Debug, Clone)]
pub struct EvalResult {
    pub name: String,
    pub event: EventConfig,
    pub condition_type: ConditionType,
    pub condition_details: Option<ConditionDetails>,
    pub all_conditions: Vec<ConditionDetails>,
    pub rule_description: String,
    pub recommendations: Option<Vec<String>>,
}

/// `{ results, almanac }` — the almanac is returned alongside the matched
/// rules so the orchestrator's event-params post-processing can resolve a
/// `resultFact` against the same memoized fact set the run used.
#[derive(Debug)]
pub struct EngineRunResult {
    pub results: Vec<EvalResult>,
    pub almanac: Almanac,
}

/// Constructed with the rule set plus the operator/fact tables a config
/// resolved; `run` evaluates every rule's condition tree against one
/// file's context.
pub struct RuleEngine {
    rules: Vec<RuleConfig>,
    operators: HashMap<String, OperatorDefn>,
    facts: HashMap<String, FactDefn>,
}

impl RuleEngine {
    pub fn new(
        rules: Vec<RuleConfig>,
        operators: HashMap<String, OperatorDefn>,
        facts: HashMap<String, FactDefn>,
    ) -> Self {
        Self { rules, operators, facts }
    }

    pub async fn run(&self, context: RunContext) -> Result<EngineRunResult, EngineError> {
        let almanac = Almanac::new(self.facts.clone(), context);
        let mut results = Vec::new();

        for rule in &self.rules {
            let fatal = rule.error_behavior() == ErrorBehavior::Fatality;
            if self.eval_set(&rule.conditions, &almanac, fatal).await? {
                results.push(self.build_eval_result(rule));
            }
        }

        Ok(EngineRunResult { results, almanac })
    }

    fn build_eval_result(&self, rule: &RuleConfig) -> EvalResult {
        let leaves = flatten_leaves(&rule.conditions);
        let condition_type = if leaves.is_empty() {
            ConditionType::Unknown
        } else if rule.conditions.is_all() {
            ConditionType::All
        } else {
            ConditionType::Any
        };

        EvalResult {
            name: rule.name.clone(),
            event: rule.event.clone(),
            condition_type,
            condition_details: leaves.first().map(to_condition_details),
            all_conditions: leaves.iter().map(to_condition_details).collect(),
            rule_description: rule
                .description
                .clone()
                .unwrap_or_else(|| "No description available".to_string()),
            recommendations: rule.recommendations.clone(),
        }
    }

    /// Boxed because it and `eval_set` are mutually recursive through
    /// nested `Condition::Set` branches.
    fn eval_condition<'a>(
        &'a self,
        condition: &'a Condition,
        almanac: &'a Almanac,
        fatal: bool,
    ) -> BoxFuture<'a, Result<bool, EngineError>> {
        Box::pin(async move {
            match condition {
                Condition::Set(set) => self.eval_set(set, almanac, fatal).await,
                Condition::Leaf(leaf) => self.eval_leaf(leaf, almanac, fatal).await,
            }
        })
    }

    async fn eval_set(
        &self,
        set: &ConditionSet,
        almanac: &Almanac,
        fatal: bool,
    ) -> Result<bool, EngineError> {
        match set {
            ConditionSet::All(children) => {
                for child in children {
                    if !self.eval_condition(child, almanac, fatal).await? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            ConditionSet::Any(children) => {
                for child in children {
                    if self.eval_condition(child, almanac, fatal).await? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Unknown fact/operator never fails the rule (§4.H: "does not throw;
    /// leaf evaluates to false"). A fact or operator that IS registered
    /// but returns an error only aborts the run when the rule opted into
    /// `errorBehavior: fatality`; otherwise it degrades the same way.
    async fn eval_leaf(
        &self,
        leaf: &LeafCondition,
        almanac: &Almanac,
        fatal: bool,
    ) -> Result<bool, EngineError> {
        let resolved = match almanac.fact_value(&leaf.fact, leaf.params.as_ref()).await {
            Ok(v) => v,
            Err(EngineError::FactNotFound(name)) => {
                debug!(fact = %name, "fact not found, leaf evaluates to false");
                return Ok(false);
            }
            Err(e) if fatal => return Err(e),
            Err(e) => {
                debug!(error = %e, "fact resolution failed, leaf evaluates to false");
                return Ok(false);
            }
        };

        let navigated = match &leaf.path {
            Some(path) => navigate(&resolved, path).unwrap_or(serde_json::Value::Null),
            None => resolved,
        };

        match self.operators.get(&leaf.operator) {
            Some(op) => match op.evaluate(&navigated, &leaf.value).await {
                Ok(matched) => Ok(matched),
                Err(e) if fatal => Err(e.into()),
                Err(e) => {
                    debug!(
                        operator = %leaf.operator,
                        error = %e,
                        "operator evaluation failed, leaf evaluates to false"
                    );
                    Ok(false)
                }
            },
            None => {
                debug!(operator = %leaf.operator, "unknown operator, leaf evaluates to false");
                Ok(false)
            }
        }
    }
}

fn flatten_leaves(set: &ConditionSet) -> Vec<LeafCondition> {
    let mut out = Vec::new();
    collect_leaves(set.children(), &mut out);
    out
}

fn collect_leaves(children: &[Condition], out: &mut Vec<LeafCondition>) {
    for child in children {
        match child {
            Condition::Leaf(leaf) => out.push(leaf.clone()),
            Condition::Set(set) => collect_leaves(set.children(), out),
        }
    }
}

fn to_condition_details(leaf: &LeafCondition) -> ConditionDetails {
    ConditionDetails {
        fact: leaf.fact.clone(),
        operator: leaf.operator.clone(),
        value: leaf.value.clone(),
        params: leaf.params.clone(),
        path: leaf.path.clone(),
        priority: leaf.priority,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use xfidelity_plugin::{FactDefn, OperatorDefn, PluginError};
    use xfidelity_schema::{ArchetypeConfig, ArchetypeRuntimeConfig};

    use super::*;

    fn archetype() -> ArchetypeConfig {
        ArchetypeConfig {
            name: "test".into(),
            description: None,
            config_server: None,
            rules: vec![],
            operators: None,
            facts: None,
            plugins: None,
            config: ArchetypeRuntimeConfig::default(),
        }
    }

    fn context() -> RunContext {
        RunContext {
            file_data: None,
            archetype: archetype(),
            installed_dependency_versions: json!({}),
            minimum_dependency_versions: json!({}),
            standard_structure: json!({}),
        }
    }

    fn equal_operator() -> OperatorDefn {
        OperatorDefn::native("equal", Arc::new(|a, b| a == b))
    }

    fn constant_fact(name: &str, value: serde_json::Value) -> FactDefn {
        FactDefn::native(name, 0, Arc::new(move |_, _| Ok(value.clone())))
    }

    fn leaf(fact: &str, operator: &str, value: serde_json::Value) -> Condition {
        Condition::Leaf(LeafCondition {
            fact: fact.into(),
            operator: operator.into(),
            value,
            path: None,
            params: None,
            priority: None,
        })
    }

    fn rule(name: &str, conditions: ConditionSet, error_behavior: Option<ErrorBehavior>) -> RuleConfig {
        RuleConfig {
            name: name.into(),
            description: None,
            recommendations: None,
            conditions,
            event: EventConfig { event_type: "warning".into(), params: None },
            error_behavior,
            on_error: None,
        }
    }

    #[tokio::test]
    async fn rule_matches_when_all_conditions_true() {
        let mut r = rule("r1", ConditionSet::All(vec![leaf("greeting", "equal", json!("hello"))]), None);
        r.description = Some("blocks greetings".into());
        r.recommendations = Some(vec!["remove it".into()]);

        let mut facts = HashMap::new();
        facts.insert("greeting".to_string(), constant_fact("greeting", json!("hello")));
        let mut operators = HashMap::new();
        operators.insert("equal".to_string(), equal_operator());

        let engine = RuleEngine::new(vec![r], operators, facts);
        let outcome = engine.run(context()).await.unwrap();

        assert_eq!(outcome.results.len(), 1);
        let result = &outcome.results[0];
        assert_eq!(result.name, "r1");
        assert_eq!(result.condition_type, ConditionType::All);
        assert_eq!(result.rule_description, "blocks greetings");
        assert_eq!(result.all_conditions.len(), 1);
        assert_eq!(result.condition_details.as_ref().unwrap().fact, "greeting");
    }

    #[tokio::test]
    async fn rule_without_description_or_conditions_uses_defaults() {
        let r = rule("r2", ConditionSet::All(vec![]), None);
        let engine = RuleEngine::new(vec![r], HashMap::new(), HashMap::new());
        let outcome = engine.run(context()).await.unwrap();

        assert_eq!(outcome.results[0].rule_description, "No description available");
        assert_eq!(outcome.results[0].condition_type, ConditionType::Unknown);
    }

    #[tokio::test]
    async fn any_short_circuits_on_first_true() {
        let r = rule(
            "r3",
            ConditionSet::Any(vec![
                leaf("a", "equal", json!(1)),
                leaf("missing", "equal", json!(2)),
            ]),
            None,
        );
        let mut facts = HashMap::new();
        facts.insert("a".to_string(), constant_fact("a", json!(1)));
        let mut operators = HashMap::new();
        operators.insert("equal".to_string(), equal_operator());

        let engine = RuleEngine::new(vec![r], operators, facts);
        let outcome = engine.run(context()).await.unwrap();
        assert_eq!(outcome.results.len(), 1);
    }

    #[tokio::test]
    async fn unknown_fact_makes_leaf_false_without_failing_the_rule() {
        let r = rule("r4", ConditionSet::All(vec![leaf("missing", "equal", json!(1))]), None);
        let engine = RuleEngine::new(vec![r], HashMap::new(), HashMap::new());
        let outcome = engine.run(context()).await.unwrap();
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn unknown_operator_makes_leaf_false_without_failing_the_rule() {
        let r = rule("r5", ConditionSet::All(vec![leaf("a", "made-up-operator", json!(1))]), None);
        let mut facts = HashMap::new();
        facts.insert("a".to_string(), constant_fact("a", json!(1)));
        let engine = RuleEngine::new(vec![r], HashMap::new(), facts);
        let outcome = engine.run(context()).await.unwrap();
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn fatal_error_behavior_propagates_fact_resolution_failure() {
        let failing_fact = FactDefn::native(
            "flaky",
            0,
            Arc::new(|_, _| Err(PluginError::call("boom"))),
        );
        let r = rule(
            "r6",
            ConditionSet::All(vec![leaf("flaky", "equal", json!(1))]),
            Some(ErrorBehavior::Fatality),
        );
        let mut facts = HashMap::new();
        facts.insert("flaky".to_string(), failing_fact);

        let engine = RuleEngine::new(vec![r], HashMap::new(), facts);
        let err = engine.run(context()).await.unwrap_err();
        assert!(matches!(err, EngineError::FactResolution(_)));
    }

    #[tokio::test]
    async fn swallowed_error_behavior_degrades_failing_fact_to_false() {
        let failing_fact = FactDefn::native(
            "flaky",
            0,
            Arc::new(|_, _| Err(PluginError::call("boom"))),
        );
        let r = rule("r7", ConditionSet::All(vec![leaf("flaky", "equal", json!(1))]), None);
        let mut facts = HashMap::new();
        facts.insert("flaky".to_string(), failing_fact);

        let engine = RuleEngine::new(vec![r], HashMap::new(), facts);
        let outcome = engine.run(context()).await.unwrap();
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn leaf_path_navigates_into_the_resolved_fact() {
        let r = rule(
            "r8",
            ConditionSet::All(vec![Condition::Leaf(LeafCondition {
                fact: "pkg".into(),
                operator: "equal".into(),
                value: json!("1.2.3"),
                path: Some("version".into()),
                params: None,
                priority: None,
            })]),
            None,
        );
        let mut facts = HashMap::new();
        facts.insert("pkg".to_string(), constant_fact("pkg", json!({"version": "1.2.3"})));
        let mut operators = HashMap::new();
        operators.insert("equal".to_string(), equal_operator());

        let engine = RuleEngine::new(vec![r], operators, facts);
        let outcome = engine.run(context()).await.unwrap();
        assert_eq!(outcome.results.len(), 1);
    }
}
