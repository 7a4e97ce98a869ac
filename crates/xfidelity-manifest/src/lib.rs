//! Plugin capability manifest: the `xfidelity-plugin.json` document an
//! out-of-tree plugin ships alongside its executable, describing the
//! facts/operators/rules it provides and how to launch it.

pub mod integrity;

pub use integrity::{HashVerifier, IntegrityError};

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

pub const MAX_PLUGIN_NAME_LENGTH: usize = 64;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to parse manifest JSON: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("manifest validation failed: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginCapabilityManifest {
    pub plugin: PluginMetadata,
    pub entrypoint: EntrypointSpec,
    #[serde(default)]
    pub facts: Vec<FactCapability>,
    #[serde(default)]
    pub operators: Vec<OperatorCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// How a plugin's facts/operators/rules are obtained at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntrypointSpec {
    /// Statically linked into the host process; `path`/`args` unused.
    Builtin,
    /// An executable speaking the stdio plugin protocol.
    Process {
        path: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sha256: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCapability {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorCapability {
    pub name: String,
}

const PLUGIN_SCHEMA_JSON: &str = include_str!("schemas/plugin.schema.json");
static SCHEMA: OnceLock<Validator> = OnceLock::new();

/// A valid plugin name: 1-64 chars, no whitespace/control chars, no path
/// separators or dots. Multilingual names are explicitly allowed.
pub fn is_valid_plugin_name(name: &str) -> bool {
    if name.is_empty() || name.chars().count() > MAX_PLUGIN_NAME_LENGTH {
        return false;
    }
    !name.chars().any(|c| {
        c.is_whitespace()
            || (c as u32) <= 0x1F
            || ((c as u32) >= 0x7F && (c as u32) <= 0x9F)
            || c == '/'
            || c == '\\'
            || c == '.'
    })
}

/// Canonicalizes an internal plugin name for duplicate elimination
/// (§4.F): a camelCase name starting with the internal `xfi` naming
/// convention (e.g. `xfiPluginFooBar`) is rewritten to kebab-case
/// (`xfi-plugin-foo-bar`); any other name (already kebab-case, or an
/// external plugin's own naming scheme) is kept verbatim. Idempotent on
/// its own output.
pub fn canonical_plugin_name(name: &str) -> String {
    let mut chars = name.chars();
    let has_xfi_prefix = chars.by_ref().take(3).eq(['x', 'f', 'i']);
    let next_is_upper = chars.next().is_some_and(|c| c.is_ascii_uppercase());
    if !has_xfi_prefix || !next_is_upper {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            out.push('-');
        }
        out.extend(c.to_lowercase());
    }
    out
}

pub fn validate_manifest(json_str: &str) -> Result<PluginCapabilityManifest, ManifestError> {
    let instance: Value = serde_json::from_str(json_str)?;

    let schema = SCHEMA.get_or_init(|| {
        let schema_json: Value =
            serde_json::from_str(PLUGIN_SCHEMA_JSON).expect("embedded plugin schema is valid JSON");
        Validator::new(&schema_json).expect("embedded plugin schema compiles")
    });

    if let Err(e) = schema.validate(&instance) {
        return Err(ManifestError::ValidationError(format!(
            "{} at {}",
            e,
            e.instance_path()
        )));
    }

    Ok(serde_json::from_value(instance)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_allow_unicode() {
        assert!(is_valid_plugin_name("xfiPluginFileSystem"));
        assert!(is_valid_plugin_name("プラグイン"));
    }

    #[test]
    fn invalid_names_reject_path_separators_and_whitespace() {
        assert!(!is_valid_plugin_name(""));
        assert!(!is_valid_plugin_name("has space"));
        assert!(!is_valid_plugin_name("../escape"));
        assert!(!is_valid_plugin_name("a/b"));
        assert!(!is_valid_plugin_name(&"x".repeat(65)));
    }

    #[test]
    fn canonicalizes_internal_camel_case_names() {
        assert_eq!(canonical_plugin_name("xfiPluginFooBar"), "xfi-plugin-foo-bar");
        assert_eq!(canonical_plugin_name("xfiPluginAwsS3"), "xfi-plugin-aws-s3");
    }

    #[test]
    fn keeps_external_and_already_kebab_names_verbatim() {
        assert_eq!(canonical_plugin_name("xfi-plugin-foo-bar"), "xfi-plugin-foo-bar");
        assert_eq!(canonical_plugin_name("my-custom-plugin"), "my-custom-plugin");
        assert_eq!(canonical_plugin_name("CustomPlugin"), "CustomPlugin");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let once = canonical_plugin_name("xfiPluginFooBar");
        let twice = canonical_plugin_name(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn validates_process_manifest() {
        let json = r#"{
            "plugin": {"name": "xfiPluginDependency", "version": "1.0.0"},
            "entrypoint": {"kind": "process", "path": "./xfi-plugin-dependency", "sha256": "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"},
            "facts": [{"name": "dependencyVersions", "priority": 1}],
            "operators": [{"name": "outdatedFramework"}]
        }"#;
        let manifest = validate_manifest(json).unwrap();
        assert_eq!(manifest.plugin.name, "xfiPluginDependency");
        assert_eq!(manifest.facts.len(), 1);
    }

    #[test]
    fn rejects_manifest_with_unknown_field() {
        let json = r#"{
            "plugin": {"name": "p", "version": "1.0.0"},
            "entrypoint": {"kind": "builtin"},
            "unknown": true
        }"#;
        assert!(matches!(
            validate_manifest(json),
            Err(ManifestError::ValidationError(_))
        ));
    }
}
