use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::FactContext;
use crate::error::PluginError;
use crate::process::ProcessPluginHandle;

/// A native fact evaluator, boxed behind `Arc<dyn Fn>` so `Plugin` stays
/// `Clone` and shareable across the rayon-parallel scan workers without
/// cloning the closure itself.
pub type NativeFactFn =
    Arc<dyn Fn(&dyn FactContext, Option<&Value>) -> Result<Value, PluginError> + Send + Sync>;

pub type NativeOperatorFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum FactSource {
    /// Built into the binary; runs synchronously inline.
    Native(NativeFactFn),
    /// Delegated to a running subprocess plugin.
    Process(Arc<ProcessPluginHandle>),
}

impl fmt::Debug for FactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(_) => f.write_str("FactSource::Native(..)"),
            Self::Process(_) => f.write_str("FactSource::Process(..)"),
        }
    }
}

#[derive(Clone)]
pub enum OperatorSource {
    Native(NativeOperatorFn),
    Process(Arc<ProcessPluginHandle>),
}

impl fmt::Debug for OperatorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(_) => f.write_str("OperatorSource::Native(..)"),
            Self::Process(_) => f.write_str("OperatorSource::Process(..)"),
        }
    }
}

/// A named fact available to rule conditions, higher `priority` facts are
/// resolved first when several facts are ready to run (mirrors json-
/// rules-engine-style priority scheduling).
#[derive(Debug, Clone)]
pub struct FactDefn {
    pub name: String,
    pub priority: i32,
    pub source: FactSource,
}

impl FactDefn {
    pub fn native(name: impl Into<String>, priority: i32, f: NativeFactFn) -> Self {
        Self {
            name: name.into(),
            priority,
            source: FactSource::Native(f),
        }
    }

    pub async fn evaluate(
        &self,
        ctx: &dyn FactContext,
        params: Option<&Value>,
    ) -> Result<Value, PluginError> {
        match &self.source {
            FactSource::Native(f) => f(ctx, params),
            FactSource::Process(handle) => handle.call_fact(&self.name, params).await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OperatorDefn {
    pub name: String,
    pub source: OperatorSource,
}

impl OperatorDefn {
    pub fn native(name: impl Into<String>, f: NativeOperatorFn) -> Self {
        Self {
            name: name.into(),
            source: OperatorSource::Native(f),
        }
    }

    pub async fn evaluate(
        &self,
        fact_value: &Value,
        condition_value: &Value,
    ) -> Result<bool, PluginError> {
        match &self.source {
            OperatorSource::Native(f) => Ok(f(fact_value, condition_value)),
            OperatorSource::Process(handle) => {
                handle.call_operator(&self.name, fact_value, condition_value).await
            }
        }
    }
}

/// A unit of extension: a named bundle of facts and operators, optionally
/// paired with bundled rule archetype fragments. `sample_rules` mirrors
/// the teacher's notion of a plugin shipping example configuration, kept
/// here as opaque JSON since rule shape is owned by `xfidelity-schema`.
#[derive(Debug, Clone)]
pub struct Plugin {
    pub name: String,
    pub version: String,
    pub facts: Vec<FactDefn>,
    pub operators: Vec<OperatorDefn>,
    pub sample_rules: Vec<Value>,
}

impl Plugin {
    pub fn fact(&self, name: &str) -> Option<&FactDefn> {
        self.facts.iter().find(|f| f.name == name)
    }

    pub fn operator(&self, name: &str) -> Option<&OperatorDefn> {
        self.operators.iter().find(|o| o.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubContext;
    impl FactContext for StubContext {
        fn file_data(&self) -> Option<&xfidelity_schema::FileData> {
            None
        }
        fn archetype_config(&self) -> &xfidelity_schema::ArchetypeConfig {
            unreachable!("not exercised in this test")
        }
        fn param(&self, _key: &str) -> Option<&Value> {
            None
        }
    }

    #[tokio::test]
    async fn native_fact_runs_inline() {
        let defn = FactDefn::native(
            "fileExtension",
            1,
            Arc::new(|_ctx, _params| Ok(Value::String("rs".into()))),
        );
        let ctx = StubContext;
        let value = defn.evaluate(&ctx, None).await.unwrap();
        assert_eq!(value, Value::String("rs".into()));
    }

    #[tokio::test]
    async fn native_operator_runs_inline() {
        let defn = OperatorDefn::native("equal", Arc::new(|a, b| a == b));
        let result = defn
            .evaluate(&Value::from(1), &Value::from(1))
            .await
            .unwrap();
        assert!(result);
    }

    #[test]
    fn plugin_lookup_by_name() {
        let plugin = Plugin {
            name: "xfi-sample".into(),
            version: "1.0.0".into(),
            facts: vec![FactDefn::native("f", 0, Arc::new(|_, _| Ok(Value::Null)))],
            operators: vec![],
            sample_rules: vec![],
        };
        assert!(plugin.fact("f").is_some());
        assert!(plugin.fact("missing").is_none());
    }
}
