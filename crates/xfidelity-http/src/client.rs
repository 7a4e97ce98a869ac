use std::time::Duration;

use reqwest::redirect::Policy;
use tracing::debug;

use crate::error::FetchError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// HTTP client for archetype/rule-config fetches: every redirect hop is
/// re-validated against the SSRF allowlist, not just the initial URL,
/// and responses are read under a hard byte ceiling.
pub struct SecureHttpClient {
    client: reqwest::Client,
}

pub struct SecureHttpClientBuilder {
    timeout: Duration,
    max_redirects: usize,
    allow_local: bool,
}

impl Default for SecureHttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            allow_local: false,
        }
    }
}

impl SecureHttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn allow_local(mut self, allow: bool) -> Self {
        self.allow_local = allow;
        self
    }

    pub fn build(self) -> SecureHttpClient {
        let allow_local = self.allow_local;
        let max_redirects = self.max_redirects;
        let policy = Policy::custom(move |attempt| {
            if attempt.previous().len() >= max_redirects {
                return attempt.error("too many redirects");
            }
            match xfidelity_security::validate_url(attempt.url(), allow_local) {
                Ok(()) => attempt.follow(),
                Err(e) => attempt.error(e),
            }
        });

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(policy)
            .build()
            .expect("reqwest client configuration is valid");

        SecureHttpClient { client }
    }
}

impl SecureHttpClient {
    pub fn builder() -> SecureHttpClientBuilder {
        SecureHttpClientBuilder::default()
    }

    /// Fetches `url`, enforcing `allow_local` on the initial request (the
    /// redirect policy enforces it on every subsequent hop) and bailing
    /// out as soon as the body would exceed `max_size`.
    pub async fn fetch_with_size_limit(
        &self,
        url: &str,
        allow_local: bool,
        max_size: u64,
    ) -> Result<Vec<u8>, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|_| FetchError::NotFound(url.to_string()))?;
        xfidelity_security::validate_url(&parsed, allow_local)?;

        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::HttpError(status));
        }

        if let Some(len) = response.content_length() {
            if len > max_size {
                return Err(FetchError::ResponseTooLarge { size: len, max: max_size });
            }
        }

        let bytes = response.bytes().await?;
        if bytes.len() as u64 > max_size {
            debug!(size = bytes.len(), max_size, "response exceeded size ceiling after download");
            return Err(FetchError::ResponseTooLarge {
                size: bytes.len() as u64,
                max: max_size,
            });
        }

        Ok(bytes.to_vec())
    }
}
