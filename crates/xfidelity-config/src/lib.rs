//! Composes remote/local/builtin archetype sources, exemptions, and
//! declared plugins into a cached, per-archetype `ExecutionConfig`.

mod builtin;
mod cache;
mod error;
mod github;
mod model;
mod plugin_load;
mod resolver;
mod rule_loader;

pub use cache::ConfigCache;
pub use error::ConfigError;
pub use github::{github_config_dir, GithubConfigMetadata, GithubConfigSync, ProcessGithubConfigSync};
pub use model::{is_valid_archetype_name, CoreOptions, ExecutionConfig, DEFAULT_ARCHETYPE};
pub use resolver::ConfigResolver;
