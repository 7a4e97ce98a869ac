use std::path::PathBuf;

use serde_json::Value;
use xfidelity_schema::{ArchetypeConfig, FileData};

/// Everything `run_engine_on_files` needs besides the engine itself.
/// `repo_path`, when present, is stripped from each `ScanResult.file_path`
/// so reported paths read relative to the repo root rather than absolute.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub file_data: Vec<FileData>,
    pub archetype: ArchetypeConfig,
    pub installed_dependency_versions: Value,
    pub minimum_dependency_versions: Value,
    pub standard_structure: Value,
    pub repo_path: Option<PathBuf>,
}
