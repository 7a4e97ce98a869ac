use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::info;

/// Walks `repo_root` honoring `.gitignore`/`.ignore` (and always skipping
/// `.git` itself), the same directory-discovery shape as the teacher's
/// `Linter::discover_files`, minus the include/exclude glob layer this
/// domain has no CLI surface for yet.
pub fn discover_files(repo_root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkBuilder::new(repo_root)
        .hidden(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files.dedup();

    info!(count = files.len(), "discovered files to scan");
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_files_and_skips_git_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn main() {}").unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git").join("HEAD"), "ref: refs/heads/main").unwrap();

        let files = discover_files(dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.rs"));
    }
}
