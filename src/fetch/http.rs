//! HTTP fetcher backed by reqwest.

use std::error::Error as _;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::redirect::{Attempt, Policy};
use reqwest::{Client, ClientBuilder};
use tracing::warn;

use super::{FetchError, RemoteFetcher};
use crate::policy::FetchPolicy;

const MAX_REDIRECTS: usize = 10;

/// Redirect target outside the allow-list, carried through reqwest's error chain.
#[derive(Debug, thiserror::Error)]
#[error("Redirect to {url} is not allowed")]
struct RedirectRefused {
    url: String,
}

/// Fetches URLs over HTTP(S), asking for JSON.
///
/// Every redirect hop is checked against the same [`FetchPolicy`] as the
/// original URL; a hop outside it fails as [`FetchError::Forbidden`].
///
/// No timeout is configured beyond reqwest's defaults, so a hanging remote
/// server holds the request open until the connection drops.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with a default client that follows only allowed redirects.
    pub fn new(policy: FetchPolicy) -> Result<Self, reqwest::Error> {
        Self::from_builder(
            Client::builder().user_agent(concat!("json-uplift/", env!("CARGO_PKG_VERSION"))),
            policy,
        )
    }

    /// Create a fetcher from a preconfigured builder (timeouts, proxies).
    ///
    /// The builder's redirect policy is replaced by one bound to `policy`.
    pub fn from_builder(
        builder: ClientBuilder,
        policy: FetchPolicy,
    ) -> Result<Self, reqwest::Error> {
        let client = builder.redirect(redirect_policy(Arc::new(policy))).build()?;
        Ok(Self { client })
    }
}

fn redirect_policy(policy: Arc<FetchPolicy>) -> Policy {
    Policy::custom(move |attempt: Attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let url = attempt.url().as_str().to_string();
        if policy.allows(&url) {
            attempt.follow()
        } else {
            attempt.error(RedirectRefused { url })
        }
    })
}

/// Find a refused redirect anywhere in the error's source chain.
fn refused_redirect(err: &reqwest::Error) -> Option<&RedirectRefused> {
    let mut source = err.source();
    while let Some(e) = source {
        if let Some(refused) = e.downcast_ref::<RedirectRefused>() {
            return Some(refused);
        }
        source = e.source();
    }
    None
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = match self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                if let Some(refused) = refused_redirect(&e) {
                    warn!(
                        target: "json_uplift::fetch",
                        url = %url,
                        redirect = %refused.url,
                        allowed = false,
                        "Redirect target not allowed"
                    );
                    return Err(FetchError::Forbidden {
                        url: refused.url.clone(),
                    });
                }
                return Err(transport(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }
}
