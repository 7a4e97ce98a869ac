//! Bounded HTTP client used to fetch remote archetype and rule
//! documents from a config server, with SSRF protection on every
//! redirect hop and a linear-backoff retry policy for transport errors.

mod client;
mod error;
mod fetch;

pub use client::{SecureHttpClient, SecureHttpClientBuilder, DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT};
pub use error::FetchError;
pub use fetch::{ArchetypeClient, RetryPolicy};
