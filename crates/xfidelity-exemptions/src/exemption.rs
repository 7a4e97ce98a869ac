use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ExemptionError;

/// Host assumed for the bare `org/repo` input form, which carries no
/// host of its own.
const DEFAULT_HOST: &str = "github.com";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exemption {
    pub repo_url: String,
    pub rule: String,
    pub expiration_date: DateTime<Utc>,
    pub reason: String,
}

impl Exemption {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date <= now
    }

    /// Matches a scan's `(repo_url, rule)` pair using normalized repo URL
    /// comparison, so `git@host:org/repo.git` and `https://host/org/repo`
    /// exempt the same repository. A reference that fails to normalize
    /// never matches.
    pub fn covers(&self, repo_url: &str, rule: &str) -> bool {
        if self.rule != rule {
            return false;
        }
        match (normalize_repo_url(&self.repo_url), normalize_repo_url(repo_url)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// Normalizes a git repository reference (SSH, HTTPS, or bare
/// `owner/repo`) to the canonical `git@host:org/repo.git` form used for
/// exemption matching, for any host. Idempotent on its own output.
/// Empty input normalizes to empty; anything else that doesn't parse as
/// one of the three known forms is rejected.
pub fn normalize_repo_url(raw: &str) -> Result<String, ExemptionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    if let Some(rest) = trimmed.strip_prefix("git@") {
        let (host, path) = rest.split_once(':').ok_or(ExemptionError::InvalidGitHubUrl)?;
        return build_canonical(host, path);
    }

    for scheme in ["https://", "http://"] {
        if let Some(rest) = trimmed.strip_prefix(scheme) {
            let (host, path) = rest.split_once('/').ok_or(ExemptionError::InvalidGitHubUrl)?;
            return build_canonical(host, path);
        }
    }

    // Bare `org/repo`: no host in the input, assume the default.
    build_canonical(DEFAULT_HOST, trimmed)
}

fn build_canonical(host: &str, path: &str) -> Result<String, ExemptionError> {
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut segments = path.split('/');
    let org = segments.next().filter(|s| !s.is_empty());
    let repo = segments.next().filter(|s| !s.is_empty());
    if segments.next().is_some() || host.is_empty() {
        return Err(ExemptionError::InvalidGitHubUrl);
    }
    let (org, repo) = org.zip(repo).ok_or(ExemptionError::InvalidGitHubUrl)?;

    Ok(format!(
        "git@{}:{}/{}.git",
        host.to_lowercase(),
        org.to_lowercase(),
        repo.to_lowercase()
    ))
}
