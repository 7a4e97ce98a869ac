use std::sync::Arc;

use tracing::warn;
use xfidelity_manifest::{validate_manifest, EntrypointSpec};
use xfidelity_plugin::{
    FactDefn, FactSource, OperatorDefn, OperatorSource, Plugin, PluginError, PluginLoader,
    PluginRegistry, ProcessPluginHandle,
};

/// Resolves `name` to an on-disk plugin directory, validates its
/// manifest, spawns the process entrypoint, and registers the facts and
/// operators it declares. Mirrors the loader's module-shape detection
/// step (`spec.md` §4.F) in spirit: the manifest *is* the declared
/// shape here, so there's no default/plugin/module-itself guesswork.
pub fn load_plugin_by_name(
    registry: &PluginRegistry,
    name: &str,
    project_root: Option<&std::path::Path>,
) -> Result<(), PluginError> {
    let dir = PluginLoader::resolve(name, project_root)
        .ok_or_else(|| PluginError::not_found(name))?;

    let manifest_path = dir.join("xfidelity-plugin.json");
    let manifest_json = std::fs::read_to_string(&manifest_path)?;
    let manifest = validate_manifest(&manifest_json)
        .map_err(|e| PluginError::invalid_manifest(e.to_string()))?;

    if manifest.plugin.name != name {
        warn!(requested = name, declared = %manifest.plugin.name, "plugin manifest name does not match requested name");
    }

    let handle = match &manifest.entrypoint {
        EntrypointSpec::Builtin => {
            return Err(PluginError::load(format!(
                "plugin '{name}' declares a builtin entrypoint, but no plugins are statically linked into this build"
            )));
        }
        EntrypointSpec::Process { path, args, sha256 } => {
            let executable = dir.join(path);
            if let Some(expected) = sha256 {
                let bytes = std::fs::read(&executable)?;
                xfidelity_manifest::HashVerifier::verify(&bytes, expected)
                    .map_err(|e| PluginError::load(format!("integrity check failed for '{name}': {e}")))?;
            }
            Arc::new(ProcessPluginHandle::spawn(&executable, args, Some(&dir))?)
        }
    };

    let facts = manifest
        .facts
        .iter()
        .map(|f| FactDefn {
            name: f.name.clone(),
            priority: f.priority,
            source: FactSource::Process(handle.clone()),
        })
        .collect();

    let operators = manifest
        .operators
        .iter()
        .map(|o| OperatorDefn {
            name: o.name.clone(),
            source: OperatorSource::Process(handle.clone()),
        })
        .collect();

    registry.register(Plugin {
        name: manifest.plugin.name,
        version: manifest.plugin.version,
        facts,
        operators,
        sample_rules: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_plugin_directory_is_not_found() {
        let registry = PluginRegistry::new();
        let err = load_plugin_by_name(&registry, "does-not-exist", None).unwrap_err();
        assert!(matches!(err, PluginError::NotFound(_)));
    }
}
