use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExemptionError {
    #[error("failed to read exemption file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse exemption document '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("exemption '{rule}' for '{repo_url}' has an invalid expiration date: {reason}")]
    InvalidExpiration {
        repo_url: String,
        rule: String,
        reason: String,
    },

    #[error("Invalid GitHub URL format")]
    InvalidGitHubUrl,
}
