use std::path::PathBuf;

use tracing::warn;
use xfidelity_schema::{parse_rule_config, RuleConfig};

/// Materializes legacy string-form rule references (`archetype.rules: [string]`)
/// into full `RuleConfig` documents, using the same local-then-builtin
/// precedence as the archetype source itself. Invalid or unresolvable
/// names are dropped with a warning rather than failing the whole load,
/// per the legacy rule-list ambiguity this mirrors.
pub fn load_rules_by_name(names: &[String], local_config_path: Option<&str>) -> Vec<RuleConfig> {
    names
        .iter()
        .filter_map(|name| match resolve_and_parse(name, local_config_path) {
            Some(rule) => Some(rule),
            None => {
                warn!(rule = %name, "could not resolve rule by name from any source, dropping");
                None
            }
        })
        .collect()
}

fn resolve_and_parse(name: &str, local_config_path: Option<&str>) -> Option<RuleConfig> {
    let candidates = search_paths(name, local_config_path);
    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => match parse_rule_config(&content) {
                Ok(rule) => return Some(rule),
                Err(e) => warn!(rule = %name, path = %path.display(), error = %e, "invalid rule document, skipping"),
            },
            Err(e) => warn!(rule = %name, path = %path.display(), error = %e, "failed to read rule document, skipping"),
        }
    }
    None
}

fn search_paths(name: &str, local_config_path: Option<&str>) -> Vec<PathBuf> {
    let filename = format!("{name}.json");
    let mut paths = Vec::new();
    if let Some(local) = local_config_path {
        paths.push(PathBuf::from(local).join("rules").join(&filename));
    }
    paths.push(
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("rules")
            .join(&filename),
    );
    paths
}
