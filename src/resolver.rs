//! Input resolution: inline content or an allow-listed fetch.

use serde_json::Value;

use crate::error::UpliftError;
use crate::fetch::{FetchError, FetchGatekeeper, RemoteFetcher};
use crate::policy::FetchPolicy;
use crate::types::UpliftRequest;

/// The two raw inputs of a transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInputs {
    /// Context definition text; empty when none was supplied.
    pub context: String,
    /// Parsed JSON document.
    pub document: Value,
}

/// Produces [`ResolvedInputs`] for a request.
///
/// For each input, non-empty inline content is used verbatim and any URL
/// given alongside it is ignored. Otherwise the URL goes through the
/// [`FetchGatekeeper`]. The context may resolve to nothing; the document may not.
pub struct InputResolver<'a, F: RemoteFetcher> {
    gatekeeper: FetchGatekeeper<'a, F>,
}

impl<'a, F: RemoteFetcher> InputResolver<'a, F> {
    /// Resolver that fetches through `fetcher` under `policy`.
    pub fn new(policy: &'a FetchPolicy, fetcher: &'a F) -> Self {
        Self {
            gatekeeper: FetchGatekeeper::new(policy, fetcher),
        }
    }

    /// Resolve context and document concurrently.
    pub async fn resolve(&self, request: &UpliftRequest) -> Result<ResolvedInputs, UpliftError> {
        let (context, document) = tokio::try_join!(
            self.resolve_context(request),
            self.resolve_document(request)
        )?;
        Ok(ResolvedInputs { context, document })
    }

    async fn resolve_context(&self, request: &UpliftRequest) -> Result<String, UpliftError> {
        let source = self
            .source(request.context.as_deref(), request.context_url.as_deref())
            .await?;
        match source {
            Some(bytes) => Ok(String::from_utf8(bytes)?),
            None => Ok(String::new()),
        }
    }

    async fn resolve_document(&self, request: &UpliftRequest) -> Result<Value, UpliftError> {
        let bytes = self
            .source(request.document.as_deref(), request.document_url.as_deref())
            .await?
            .ok_or_else(UpliftError::missing_document)?;
        serde_json::from_slice(&bytes).map_err(UpliftError::JsonDecode)
    }

    async fn source(
        &self,
        inline: Option<&[u8]>,
        url: Option<&str>,
    ) -> Result<Option<Vec<u8>>, FetchError> {
        if let Some(bytes) = inline.filter(|b| !b.is_empty()) {
            return Ok(Some(bytes.to_vec()));
        }
        match url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => self.gatekeeper.fetch(url).await.map(Some),
            None => Ok(None),
        }
    }
}
