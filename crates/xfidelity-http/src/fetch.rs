use std::time::Duration;

use tracing::{debug, warn};
use xfidelity_schema::ArchetypeConfig;

use crate::client::SecureHttpClient;
use crate::error::FetchError;

/// Maximum size for a remote archetype document (10 MB), mirroring the
/// manifest-size ceiling used elsewhere in the stack.
const MAX_ARCHETYPE_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

pub struct ArchetypeClient {
    http: SecureHttpClient,
    allow_local: bool,
    retry: RetryPolicy,
}

impl Default for ArchetypeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchetypeClient {
    pub fn new() -> Self {
        Self {
            http: SecureHttpClient::builder().build(),
            allow_local: false,
            retry: RetryPolicy::default(),
        }
    }

    pub fn allow_local(mut self, allow: bool) -> Self {
        self.http = SecureHttpClient::builder().allow_local(allow).build();
        self.allow_local = allow;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetches and validates an archetype document from `config_server`,
    /// retrying up to `retry.max_attempts` times with a fixed linear
    /// backoff between attempts. Only transport/HTTP failures are
    /// retried; a schema-validation failure on a successfully fetched
    /// body is returned immediately.
    pub async fn fetch_archetype(
        &self,
        config_server: &str,
        archetype_name: &str,
    ) -> Result<ArchetypeConfig, FetchError> {
        let url = format!(
            "{}/archetypes/{}",
            config_server.trim_end_matches('/'),
            archetype_name
        );

        let mut last_err = None;
        for attempt in 1..=self.retry.max_attempts {
            match self
                .http
                .fetch_with_size_limit(&url, self.allow_local, MAX_ARCHETYPE_SIZE)
                .await
            {
                Ok(bytes) => {
                    let text = String::from_utf8(bytes)?;
                    return Ok(ArchetypeConfig::from_json(&text)?);
                }
                Err(e @ FetchError::InvalidArchetype(_)) => return Err(e),
                Err(e) => {
                    warn!(attempt, %url, error = %e, "archetype fetch attempt failed");
                    last_err = Some(e);
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.backoff * attempt).await;
                    }
                }
            }
        }

        debug!(%url, "exhausted retry budget fetching archetype");
        Err(last_err.expect("loop runs at least once"))
    }
}
