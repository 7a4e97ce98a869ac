use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::ExemptionError;
use crate::exemption::Exemption;

/// `isExempt` result: distinguishes "not exempt" from "exempt, and here
/// is the matching record", so callers can log the reason/expiry.
#[derive(Debug, Clone, PartialEq)]
pub enum ExemptionDecision<'a> {
    NotExempt,
    Exempt(&'a Exemption),
}

impl ExemptionDecision<'_> {
    pub fn is_exempt(&self) -> bool {
        matches!(self, ExemptionDecision::Exempt(_))
    }
}

/// In-memory exemption store, loaded by merging a single legacy
/// `.xfi-exemptions.json` file (if present) with every `*.json` file in
/// an exemptions directory (if present). Entries from the directory are
/// appended after the legacy file's entries; duplicates are kept (the
/// engine only needs the first match).
#[derive(Debug, Clone, Default)]
pub struct ExemptionStore {
    exemptions: Vec<Exemption>,
}

impl ExemptionStore {
    pub fn new(exemptions: Vec<Exemption>) -> Self {
        Self { exemptions }
    }

    pub fn load(
        legacy_file: Option<&Path>,
        exemptions_dir: Option<&Path>,
    ) -> Result<Self, ExemptionError> {
        let mut exemptions = Vec::new();

        if let Some(path) = legacy_file {
            if path.exists() {
                exemptions.extend(load_file(path)?);
            } else {
                debug!(path = %path.display(), "legacy exemption file not present, skipping");
            }
        }

        if let Some(dir) = exemptions_dir {
            if dir.is_dir() {
                let mut entries: Vec<PathBuf> = fs::read_dir(dir)
                    .map_err(|source| ExemptionError::Read {
                        path: dir.to_path_buf(),
                        source,
                    })?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                    .collect();
                // Deterministic merge order regardless of filesystem iteration order.
                entries.sort();

                for path in entries {
                    match load_file(&path) {
                        Ok(mut loaded) => exemptions.append(&mut loaded),
                        Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable exemption file"),
                    }
                }
            }
        }

        Ok(Self { exemptions })
    }

    pub fn is_exempt(&self, repo_url: &str, rule: &str) -> ExemptionDecision<'_> {
        self.is_exempt_at(repo_url, rule, Utc::now())
    }

    pub fn is_exempt_at(
        &self,
        repo_url: &str,
        rule: &str,
        now: DateTime<Utc>,
    ) -> ExemptionDecision<'_> {
        self.exemptions
            .iter()
            .find(|e| e.covers(repo_url, rule) && !e.is_expired_at(now))
            .map(ExemptionDecision::Exempt)
            .unwrap_or(ExemptionDecision::NotExempt)
    }

    pub fn len(&self) -> usize {
        self.exemptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exemptions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exemption> {
        self.exemptions.iter()
    }
}

fn load_file(path: &Path) -> Result<Vec<Exemption>, ExemptionError> {
    let content = fs::read_to_string(path).map_err(|source| ExemptionError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Document {
        List(Vec<Exemption>),
        Single(Exemption),
    }

    let doc: Document = serde_json::from_str(&content).map_err(|source| ExemptionError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(match doc {
        Document::List(list) => list,
        Document::Single(single) => vec![single],
    })
}
