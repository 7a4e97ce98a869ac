//! Exemption store: merges a legacy single-file exemption list with a
//! directory of per-team exemption files, and answers `isExempt`
//! queries against repo URL + rule name with expiry enforcement.

mod error;
mod exemption;
mod store;

pub use error::ExemptionError;
pub use exemption::{normalize_repo_url, Exemption};
pub use store::{ExemptionDecision, ExemptionStore};
