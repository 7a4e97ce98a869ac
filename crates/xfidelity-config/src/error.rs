use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid archetype name: {0}")]
    InvalidArchetypeName(String),

    #[error("No valid configuration found for archetype: {0}")]
    NoConfigurationFound(String),

    #[error("Invalid local archetype configuration: {0}")]
    InvalidLocalConfiguration(String),

    #[error("No valid builtin configuration found for archetype: {0}")]
    NoBuiltinConfigurationFound(String),

    #[error("Invalid remote archetype configuration: {0}")]
    InvalidRemoteConfiguration(String),

    #[error(transparent)]
    Fetch(#[from] xfidelity_http::FetchError),

    #[error(transparent)]
    Exemptions(#[from] xfidelity_exemptions::ExemptionError),

    #[error(transparent)]
    Plugin(#[from] xfidelity_plugin::PluginError),

    #[error(transparent)]
    Security(#[from] xfidelity_security::SecurityError),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}
