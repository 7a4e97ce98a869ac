use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Fact '{0}' not found")]
    FactNotFound(String),

    #[error("fact resolution failed: {0}")]
    FactResolution(String),

    #[error("operator evaluation failed: {0}")]
    OperatorFailed(String),
}

impl From<xfidelity_plugin::PluginError> for EngineError {
    fn from(e: xfidelity_plugin::PluginError) -> Self {
        EngineError::OperatorFailed(e.to_string())
    }
}
