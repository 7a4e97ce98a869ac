use std::path::{Component, Path, PathBuf};

use tracing::debug;

/// Resolves a plugin name to the directory holding its
/// `xfidelity-plugin.json` manifest.
///
/// Search order:
/// 1. `<project_root>/.xfidelity/plugins/<name>/`  (local, project-pinned)
/// 2. `$HOME/.xfidelity/plugins/<name>/`            (global, user-installed)
///
/// Builtin plugins never go through this resolver; the caller checks a
/// static name table before falling back to it.
pub struct PluginLoader;

impl PluginLoader {
    pub fn resolve(name: &str, project_root: Option<&Path>) -> Option<PathBuf> {
        if !is_safe_plugin_name(name) {
            debug!(name, "rejected plugin name during resolution");
            return None;
        }

        if let Some(root) = project_root {
            let local_dir = root.join(".xfidelity").join("plugins").join(name);
            if local_dir.join("xfidelity-plugin.json").is_file() {
                return Some(local_dir);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let global_dir = home.join(".xfidelity").join("plugins").join(name);
            if global_dir.join("xfidelity-plugin.json").is_file() {
                return Some(global_dir);
            }
        }

        None
    }
}

/// Exactly one normal path component; rejects traversal, absolute paths,
/// and empty/dot names the way the resolver this is adapted from does.
fn is_safe_plugin_name(name: &str) -> bool {
    let path = Path::new(name);
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
