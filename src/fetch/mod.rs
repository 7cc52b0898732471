//! Remote fetch backends and the allow-list gatekeeper.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::policy::FetchPolicy;

/// Transport-level fetch failures. None of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// No allow pattern covers the URL.
    #[error("Fetch is forbidden from the requested URL: {url}")]
    Forbidden {
        /// Refused URL.
        url: String,
    },
    /// Connection, DNS, TLS or timeout failure.
    #[error("Request to {url} failed: {reason}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying error.
        reason: String,
    },
    /// Non-2xx response.
    #[error("Request to {url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status.
        status: u16,
    },
}

/// Something that can retrieve the bytes behind a URL.
///
/// Implementations request JSON-compatible content and must not retry.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch `url` and return the response body.
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Applies a [`FetchPolicy`] in front of a [`RemoteFetcher`].
///
/// Borrowed per request; the policy itself is owned by the service configuration.
pub struct FetchGatekeeper<'a, F: RemoteFetcher> {
    policy: &'a FetchPolicy,
    fetcher: &'a F,
}

impl<'a, F: RemoteFetcher> Clone for FetchGatekeeper<'a, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, F: RemoteFetcher> Copy for FetchGatekeeper<'a, F> {}

impl<'a, F: RemoteFetcher> FetchGatekeeper<'a, F> {
    /// Wrap a fetcher with a policy.
    pub fn new(policy: &'a FetchPolicy, fetcher: &'a F) -> Self {
        Self { policy, fetcher }
    }

    /// Fetch `url` if the policy allows it.
    ///
    /// A refused URL never reaches the fetcher.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if !self.policy.allows(url) {
            warn!(
                target: "json_uplift::fetch",
                url = %url,
                allowed = false,
                "Remote fetch not allowed"
            );
            return Err(FetchError::Forbidden {
                url: url.to_string(),
            });
        }

        info!(target: "json_uplift::fetch", url = %url, allowed = true, "Remote fetching");
        self.fetcher.get(url).await
    }
}

pub use http::HttpFetcher;
pub use memory::StaticFetcher;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refused_url_never_reaches_fetcher() {
        let fetcher = StaticFetcher::new().with_response("https://a.org/doc.json", b"{}".to_vec());
        let policy = FetchPolicy::disabled();
        let gatekeeper = FetchGatekeeper::new(&policy, &fetcher);

        let err = gatekeeper.fetch("https://a.org/doc.json").await.unwrap_err();
        assert!(matches!(err, FetchError::Forbidden { .. }));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_allowed_url_is_fetched() {
        let fetcher = StaticFetcher::new().with_response("https://a.org/doc.json", b"{}".to_vec());
        let policy = FetchPolicy::from_patterns([r"https://a\.org/.*"]).unwrap();
        let gatekeeper = FetchGatekeeper::new(&policy, &fetcher);

        let body = gatekeeper.fetch("https://a.org/doc.json").await.unwrap();
        assert_eq!(body, b"{}");
        assert_eq!(fetcher.requested(), vec!["https://a.org/doc.json".to_string()]);
    }

    #[tokio::test]
    async fn test_partial_match_is_refused() {
        let fetcher = StaticFetcher::new();
        let policy = FetchPolicy::from_patterns([r"https://a\.org/.*"]).unwrap();
        let gatekeeper = FetchGatekeeper::new(&policy, &fetcher);

        let err = gatekeeper
            .fetch("https://evil.com/https://a.org/x")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Forbidden { .. }));
        assert_eq!(fetcher.call_count(), 0);
    }
}
