use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("failed to load plugin: {0}")]
    LoadError(String),

    #[error("plugin call failed: {0}")]
    CallError(String),

    #[error("invalid plugin manifest: {0}")]
    InvalidManifest(String),

    #[error("plugin not found: {0}")]
    NotFound(String),

    #[error("plugin name rejected: {0}")]
    InvalidName(String),

    #[error("duplicate plugin name: {0}")]
    DuplicateName(String),

    #[error("Invalid plugin format - missing name or version")]
    InvalidFormat,

    #[error("plugin subprocess timed out after {0}ms")]
    Timeout(u64),

    #[error("security error: {0}")]
    Security(#[from] xfidelity_security::SecurityError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl PluginError {
    pub fn load(message: impl Into<String>) -> Self {
        Self::LoadError(message.into())
    }

    pub fn call(message: impl Into<String>) -> Self {
        Self::CallError(message.into())
    }

    pub fn invalid_manifest(message: impl Into<String>) -> Self {
        Self::InvalidManifest(message.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }
}
