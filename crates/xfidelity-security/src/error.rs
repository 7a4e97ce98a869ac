use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("invalid URL scheme: {0}")]
    InvalidScheme(String),
    #[error("access to loopback address denied: {0}")]
    LoopbackDenied(String),
    #[error("access to private IP address denied: {0}")]
    PrivateIpDenied(String),
    #[error("path traversal detected: {path} escapes {base}")]
    PathTraversal { path: String, base: String },
    #[error("absolute or rooted path not allowed: {0}")]
    AbsolutePathNotAllowed(String),
    #[error("parent directory '..' not allowed in path: {0}")]
    ParentDirNotAllowed(String),
    #[error("plugin executable not found: {path}")]
    FileNotFound { path: String },
    #[error("command '{0}' is not on the allowed command list")]
    CommandNotAllowed(String),
    #[error("command argument rejected: {0}")]
    ArgumentRejected(String),
    #[error("command timed out after {0}ms")]
    Timeout(u64),
    #[error("failed to spawn command: {0}")]
    Spawn(#[source] std::io::Error),
}
