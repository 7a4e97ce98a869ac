use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::{Mutex, OnceCell};
use xfidelity_plugin::{FactContext, FactDefn};
use xfidelity_schema::{ArchetypeConfig, FileData};

use crate::error::EngineError;

/// The non-plugin-backed facts and scan identity handed to an engine run
/// (§4.G's base facts: `fileData`, `dependencyData`, `standardStructure`).
/// `file_data` is `None` while evaluating the repo-global pseudo-file pass.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub file_data: Option<FileData>,
    pub archetype: ArchetypeConfig,
    pub installed_dependency_versions: Value,
    pub minimum_dependency_versions: Value,
    pub standard_structure: Value,
}

/// The view a fact's native function or params lookup sees: the current
/// file (if any), the archetype, and the leaf condition's own `params`,
/// rebuilt for each `factValue` call rather than owned by the `Almanac`
/// itself, since `params` is specific to the condition asking.
struct LeafContext<'a> {
    file_data: Option<&'a FileData>,
    archetype: &'a ArchetypeConfig,
    param: Option<&'a Value>,
}

impl FactContext for LeafContext<'_> {
    fn file_data(&self) -> Option<&FileData> {
        self.file_data
    }

    fn archetype_config(&self) -> &ArchetypeConfig {
        self.archetype
    }

    fn param(&self, key: &str) -> Option<&Value> {
        self.param.and_then(|p| p.get(key))
    }
}

type Memo = Arc<OnceCell<Result<Value, String>>>;

/// Per-run facade over the fact set: `factValue` resolves lazily, memoizes
/// by `(name, params)`, and single-flights concurrent callers onto the
/// same in-flight resolution via the `OnceCell` stored for that key.
#[derive(Debug)]
pub struct Almanac {
    facts: HashMap<String, FactDefn>,
    context: RunContext,
    cache: Mutex<HashMap<String, Memo>>,
}

impl Almanac {
    pub fn new(facts: HashMap<String, FactDefn>, context: RunContext) -> Self {
        Self {
            facts,
            context,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub async fn fact_value(
        &self,
        name: &str,
        params: Option<&Value>,
    ) -> Result<Value, EngineError> {
        if let Some(base) = self.base_fact(name) {
            return base;
        }

        let key = memo_key(name, params);
        let cell = {
            let mut cache = self.cache.lock().await;
            cache
                .entry(key)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let outcome = cell
            .get_or_init(|| async {
                match self.facts.get(name) {
                    None => Err(format!("Fact '{name}' not found")),
                    Some(defn) => {
                        let ctx = LeafContext {
                            file_data: self.context.file_data.as_ref(),
                            archetype: &self.context.archetype,
                            param: params,
                        };
                        defn.evaluate(&ctx, params).await.map_err(|e| e.to_string())
                    }
                }
            })
            .await
            .clone();

        outcome.map_err(|message| {
            if message == format!("Fact '{name}' not found") {
                EngineError::FactNotFound(name.to_string())
            } else {
                EngineError::FactResolution(message)
            }
        })
    }

    fn base_fact(&self, name: &str) -> Option<Result<Value, EngineError>> {
        match name {
            "fileData" => Some(
                self.context
                    .file_data
                    .as_ref()
                    .map(|f| serde_json::to_value(f).expect("FileData always serializes"))
                    .ok_or_else(|| EngineError::FactNotFound(name.to_string())),
            ),
            "dependencyData" => Some(Ok(json!({
                "installedDependencyVersions": self.context.installed_dependency_versions,
                "minimumDependencyVersions": self.context.minimum_dependency_versions,
            }))),
            "standardStructure" => Some(Ok(self.context.standard_structure.clone())),
            _ => None,
        }
    }
}

fn memo_key(name: &str, params: Option<&Value>) -> String {
    match params {
        Some(p) => format!("{name}:{p}"),
        None => name.to_string(),
    }
}
