use xfidelity_exemptions::ExemptionStore;
use xfidelity_schema::{ArchetypeConfig, RuleConfig};

/// CLI-supplied options threaded through to the engine untouched; kept
/// as its own struct rather than flattened onto `ExecutionConfig` so the
/// resolver's cache key stays just `archetype`.
#[derive(Debug, Clone, Default)]
pub struct CoreOptions {
    pub config_server: Option<String>,
    pub local_config_path: Option<String>,
    pub extra_plugins: Vec<String>,
    pub repo_path: Option<String>,
}

/// The fully resolved, immutable configuration for one archetype: the
/// source document, its materialized rule list, and the exemptions that
/// apply to this run. Built once per archetype name and pinned by
/// identity in the process-wide cache (`cache::ConfigCache`).
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    pub archetype: ArchetypeConfig,
    pub rules: Vec<RuleConfig>,
    pub exemptions: ExemptionStore,
    pub options: CoreOptions,
}

pub const DEFAULT_ARCHETYPE: &str = "node-fullstack";

/// `[A-Za-z0-9_-]+`, checked without pulling in a regex dependency the
/// rest of the workspace doesn't otherwise need.
pub fn is_valid_archetype_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alphanumeric_and_dash_underscore() {
        assert!(is_valid_archetype_name("node-fullstack"));
        assert!(is_valid_archetype_name("java_8"));
        assert!(is_valid_archetype_name("Archetype1"));
    }

    #[test]
    fn rejects_empty_and_path_like_names() {
        assert!(!is_valid_archetype_name(""));
        assert!(!is_valid_archetype_name("invalid/archetype"));
        assert!(!is_valid_archetype_name("has space"));
    }
}
