//! SSRF guards for outbound URL fetches, path-traversal guards for
//! plugin/rule resolution, and an allowlisted subprocess runner shared
//! by the config-sync and external-plugin boundaries.

mod error;
mod path;
mod process;
mod url;

pub use error::SecurityError;
pub use path::validate_relative_path;
pub use process::run_checked;
pub use url::{check_ip, validate_url};
