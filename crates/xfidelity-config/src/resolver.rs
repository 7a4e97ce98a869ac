use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use xfidelity_manifest::canonical_plugin_name;
use xfidelity_plugin::PluginRegistry;
use xfidelity_schema::ArchetypeConfig;

use crate::builtin::find_builtin;
use crate::cache::ConfigCache;
use crate::error::ConfigError;
use crate::model::{is_valid_archetype_name, CoreOptions, ExecutionConfig, DEFAULT_ARCHETYPE};
use crate::plugin_load::load_plugin_by_name;
use crate::rule_loader::load_rules_by_name;

/// Names the plugin registry reports as statically linked into this
/// binary; loaded unconditionally and treated as non-fatal on failure.
fn base_plugin_names(_registry: &PluginRegistry) -> Vec<String> {
    Vec::new()
}

pub struct ConfigResolver<'a> {
    registry: &'a PluginRegistry,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(registry: &'a PluginRegistry) -> Self {
        Self { registry }
    }

    /// `getConfig`. Returns the cached instance on repeat calls for the
    /// same archetype name; a failed build is never cached.
    pub async fn get_config(
        &self,
        archetype: Option<&str>,
        options: CoreOptions,
    ) -> Result<Arc<ExecutionConfig>, ConfigError> {
        let archetype_name = match archetype {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => DEFAULT_ARCHETYPE.to_string(),
        };

        if let Some(cached) = ConfigCache::global().get(&archetype_name) {
            return Ok(cached);
        }

        let config = Arc::new(self.initialize(&archetype_name, options).await?);
        ConfigCache::global().insert(archetype_name, config.clone());
        Ok(config)
    }

    pub fn clear_loaded_configs(&self) {
        ConfigCache::global().clear();
    }

    async fn initialize(
        &self,
        archetype_name: &str,
        options: CoreOptions,
    ) -> Result<ExecutionConfig, ConfigError> {
        if !is_valid_archetype_name(archetype_name) {
            return Err(ConfigError::InvalidArchetypeName(archetype_name.to_string()));
        }

        let archetype = self.load_source(archetype_name, &options).await?;
        let project_root = options.local_config_path.as_ref().map(std::path::PathBuf::from);

        for name in base_plugin_names(self.registry) {
            if let Err(e) = load_plugin_by_name(self.registry, &name, project_root.as_deref()) {
                warn!(plugin = %name, error = %e, "failed to load base plugin, continuing");
            }
        }

        let mut declared_plugins: Vec<String> = options.extra_plugins.clone();
        if let Some(archetype_plugins) = &archetype.plugins {
            declared_plugins.extend(archetype_plugins.iter().cloned());
        }
        let mut seen_canonical: HashSet<String> = self
            .registry
            .loaded_plugins()
            .iter()
            .map(|name| canonical_plugin_name(name))
            .collect();
        for name in declared_plugins {
            let canonical = canonical_plugin_name(&name);
            if !seen_canonical.insert(canonical) {
                info!(plugin = %name, "plugin already registered, skipping");
                continue;
            }
            if let Err(e) = load_plugin_by_name(self.registry, &name, project_root.as_deref()) {
                warn!(plugin = %name, error = %e, "failed to load declared plugin");
            }
        }

        let rules = load_rules_by_name(&archetype.rules, options.local_config_path.as_deref());

        let exemptions_dir = options
            .local_config_path
            .as_ref()
            .map(|p| PathBuf::from(p).join(format!("{archetype_name}-exemptions")));
        let legacy_file = options
            .local_config_path
            .as_ref()
            .map(|p| PathBuf::from(p).join(format!("{archetype_name}-exemptions.json")));
        let exemptions = xfidelity_exemptions::ExemptionStore::load(
            legacy_file.as_deref(),
            exemptions_dir.as_deref(),
        )
        .unwrap_or_default();

        Ok(ExecutionConfig {
            archetype,
            rules,
            exemptions,
            options,
        })
    }

    async fn load_source(
        &self,
        archetype_name: &str,
        options: &CoreOptions,
    ) -> Result<ArchetypeConfig, ConfigError> {
        if let Some(server) = &options.config_server {
            let client = xfidelity_http::ArchetypeClient::new();
            return client
                .fetch_archetype(server, archetype_name)
                .await
                .map_err(|e| match e {
                    xfidelity_http::FetchError::InvalidArchetype(schema_err) => {
                        ConfigError::InvalidRemoteConfiguration(schema_err.to_string())
                    }
                    other => ConfigError::Fetch(other),
                });
        }

        if let Some(local_path) = &options.local_config_path {
            let path = PathBuf::from(local_path).join(format!("{archetype_name}.json"));
            return match std::fs::read_to_string(&path) {
                Ok(content) if content.trim().is_empty() => {
                    Err(ConfigError::NoConfigurationFound(archetype_name.to_string()))
                }
                Ok(content) => ArchetypeConfig::from_json(&content)
                    .map_err(|e| ConfigError::InvalidLocalConfiguration(e.to_string())),
                Err(_) => Err(ConfigError::NoConfigurationFound(archetype_name.to_string())),
            };
        }

        match find_builtin(archetype_name) {
            Some(path) => {
                let content = std::fs::read_to_string(&path)?;
                ArchetypeConfig::from_json(&content)
                    .map_err(|e| ConfigError::InvalidLocalConfiguration(e.to_string()))
            }
            None => Err(ConfigError::NoBuiltinConfigurationFound(archetype_name.to_string())),
        }
    }
}
