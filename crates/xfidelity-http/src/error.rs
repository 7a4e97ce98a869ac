use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("too many redirects")]
    RedirectLimitExceeded,

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("security error: {0}")]
    SecurityError(#[from] xfidelity_security::SecurityError),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("http error: {0}")]
    HttpError(reqwest::StatusCode),

    #[error("response too large: {size} bytes exceeds maximum of {max} bytes")]
    ResponseTooLarge { size: u64, max: u64 },

    #[error("invalid archetype document: {0}")]
    InvalidArchetype(#[from] xfidelity_schema::SchemaError),

    #[error("i/o error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("invalid UTF-8 in response: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}
