use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("schema validation failed: {0} at {1}")]
    ValidationFailed(String, String),

    #[error("invalid semver range for dependency '{name}': {source}")]
    InvalidVersionReq {
        name: String,
        #[source]
        source: semver::Error,
    },
}
