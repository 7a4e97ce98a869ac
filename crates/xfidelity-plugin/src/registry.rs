use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::warn;

use crate::error::PluginError;
use crate::model::{FactDefn, OperatorDefn, Plugin};
use xfidelity_manifest::{is_valid_plugin_name, PluginCapabilityManifest};

/// Process-wide home for loaded plugins. Generalizes the teacher's
/// `PluginHost` (manifest/executor/alias maps keyed by rule name) to this
/// domain's fact/operator registration: a plugin contributes named facts
/// and operators into one flat namespace, and the registry rejects a
/// second plugin claiming a name already in use rather than silently
/// shadowing it.
pub struct PluginRegistry {
    plugins: RwLock<HashMap<String, Plugin>>,
    fact_owners: RwLock<HashMap<String, String>>,
    operator_owners: RwLock<HashMap<String, String>>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(HashMap::new()),
            fact_owners: RwLock::new(HashMap::new()),
            operator_owners: RwLock::new(HashMap::new()),
        }
    }

    /// Validates, then registers `plugin`. A name already present is not
    /// an error: it logs a warning and leaves existing state unchanged,
    /// so registering the same plugin twice is idempotent.
    pub fn register(&self, plugin: Plugin) -> Result<(), PluginError> {
        if plugin.name.is_empty() || plugin.version.is_empty() {
            return Err(PluginError::InvalidFormat);
        }
        if !is_valid_plugin_name(&plugin.name) {
            return Err(PluginError::InvalidName(plugin.name));
        }
        if self.plugins.read().contains_key(&plugin.name) {
            warn!(plugin = %plugin.name, "plugin already registered, skipping");
            return Ok(());
        }

        {
            let fact_owners = self.fact_owners.read();
            for fact in &plugin.facts {
                if let Some(owner) = fact_owners.get(&fact.name) {
                    return Err(PluginError::DuplicateName(format!(
                        "fact '{}' already registered by plugin '{owner}'",
                        fact.name
                    )));
                }
            }
            let operator_owners = self.operator_owners.read();
            for operator in &plugin.operators {
                if let Some(owner) = operator_owners.get(&operator.name) {
                    return Err(PluginError::DuplicateName(format!(
                        "operator '{}' already registered by plugin '{owner}'",
                        operator.name
                    )));
                }
            }
        }

        let mut fact_owners = self.fact_owners.write();
        let mut operator_owners = self.operator_owners.write();
        for fact in &plugin.facts {
            fact_owners.insert(fact.name.clone(), plugin.name.clone());
        }
        for operator in &plugin.operators {
            operator_owners.insert(operator.name.clone(), plugin.name.clone());
        }
        self.plugins.write().insert(plugin.name.clone(), plugin);
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> Result<(), PluginError> {
        let plugin = self
            .plugins
            .write()
            .remove(name)
            .ok_or_else(|| PluginError::not_found(name))?;

        let mut fact_owners = self.fact_owners.write();
        for fact in &plugin.facts {
            fact_owners.remove(&fact.name);
        }
        let mut operator_owners = self.operator_owners.write();
        for operator in &plugin.operators {
            operator_owners.remove(&operator.name);
        }
        Ok(())
    }

    pub fn loaded_plugins(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn find_fact(&self, name: &str) -> Option<FactDefn> {
        let owner = self.fact_owners.read().get(name).cloned()?;
        self.plugins.read().get(&owner)?.fact(name).cloned()
    }

    pub fn find_operator(&self, name: &str) -> Option<OperatorDefn> {
        let owner = self.operator_owners.read().get(name).cloned()?;
        self.plugins.read().get(&owner)?.operator(name).cloned()
    }

    /// Every registered fact, flattened across plugins into the
    /// name-keyed map a `RuleEngine` is constructed with.
    pub fn all_facts(&self) -> HashMap<String, FactDefn> {
        self.plugins
            .read()
            .values()
            .flat_map(|p| p.facts.iter().map(|f| (f.name.clone(), f.clone())))
            .collect()
    }

    /// Every registered operator, flattened the same way as [`all_facts`](Self::all_facts).
    pub fn all_operators(&self) -> HashMap<String, OperatorDefn> {
        self.plugins
            .read()
            .values()
            .flat_map(|p| p.operators.iter().map(|o| (o.name.clone(), o.clone())))
            .collect()
    }

    pub fn manifest_for(&self, name: &str) -> Option<PluginCapabilityManifest> {
        let plugins = self.plugins.read();
        let plugin = plugins.get(name)?;
        Some(PluginCapabilityManifest {
            plugin: xfidelity_manifest::PluginMetadata {
                name: plugin.name.clone(),
                version: plugin.version.clone(),
                description: None,
                repository: None,
                license: None,
                authors: Vec::new(),
                keywords: Vec::new(),
            },
            facts: plugin
                .facts
                .iter()
                .map(|f| xfidelity_manifest::FactCapability {
                    name: f.name.clone(),
                    priority: f.priority,
                })
                .collect(),
            operators: plugin
                .operators
                .iter()
                .map(|o| xfidelity_manifest::OperatorCapability {
                    name: o.name.clone(),
                })
                .collect(),
            entrypoint: xfidelity_manifest::EntrypointSpec::Builtin,
            timeout_ms: None,
        })
    }
}
