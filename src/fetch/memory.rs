//! In-memory fetcher for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{FetchError, RemoteFetcher};

/// Serves canned bodies and records every URL it was asked for.
///
/// Unknown URLs answer with HTTP 404.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Vec<u8>>,
    requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with_response(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.into(), body.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }

    /// Number of fetches performed.
    pub fn call_count(&self) -> usize {
        self.requested.lock().len()
    }
}

#[async_trait]
impl RemoteFetcher for StaticFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requested.lock().push(url.to_string());

        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}
