use std::path::PathBuf;

/// Small list of bundled locations searched, in order, for a builtin
/// archetype document when neither a remote config server nor a local
/// config path is configured.
pub fn builtin_search_paths(archetype: &str) -> Vec<PathBuf> {
    let filename = format!("{archetype}.json");
    vec![
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("archetypes")
            .join(&filename),
        PathBuf::from("/etc/xfidelity/archetypes").join(&filename),
    ]
}

pub fn find_builtin(archetype: &str) -> Option<PathBuf> {
    builtin_search_paths(archetype).into_iter().find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_paths_include_bundled_archetypes_dir() {
        let paths = builtin_search_paths("node-fullstack");
        assert!(paths[0].ends_with("archetypes/node-fullstack.json"));
    }

    #[test]
    fn bundled_node_fullstack_archetype_resolves() {
        assert!(find_builtin("node-fullstack").is_some());
    }

    #[test]
    fn unknown_archetype_resolves_to_none() {
        assert!(find_builtin("does-not-exist").is_none());
    }
}
