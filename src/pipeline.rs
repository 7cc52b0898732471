//! Request orchestration.
//!
//! ```text
//! UpliftRequest
//!   → InputResolver      (inline or fetched; context and document in parallel)
//!   → UpliftEngine       (validate context, one generate_graph call)
//!   → OutputAssembler    (provenance per representation, render)
//!   → RenderedOutput
//! ```
//!
//! Every failure surfaces as an [`UpliftError`]; translating it to a status
//! code is left to the caller.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, warn};

use crate::assembler::OutputAssembler;
use crate::config::ServiceConfig;
use crate::engine::UpliftEngine;
use crate::error::UpliftError;
use crate::fetch::RemoteFetcher;
use crate::resolver::InputResolver;
use crate::types::{ProvenanceMetadata, RenderedOutput, UpliftRequest};

/// Runs uplift requests against one engine, fetcher and configuration.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct UpliftPipeline<E: UpliftEngine, F: RemoteFetcher> {
    config: Arc<ServiceConfig>,
    engine: E,
    fetcher: F,
}

impl<E: UpliftEngine, F: RemoteFetcher> UpliftPipeline<E, F> {
    /// Create a pipeline.
    pub fn new(config: Arc<ServiceConfig>, engine: E, fetcher: F) -> Self {
        Self {
            config,
            engine,
            fetcher,
        }
    }

    /// The configuration this pipeline runs under.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The transformation engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The remote fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Run one request to completion.
    pub async fn run(&self, request: &UpliftRequest) -> Result<RenderedOutput, UpliftError> {
        let started = Instant::now();
        let provenance = request
            .include_provenance
            .then(|| ProvenanceMetadata::for_request(request, Utc::now()));

        let result = self.execute(request, provenance.as_ref()).await;

        match &result {
            Ok(output) => debug!(
                output = %request.output,
                bytes = output.body.len(),
                latency_ms = started.elapsed().as_millis() as u64,
                "Uplift completed"
            ),
            Err(e) => warn!(
                error_type = e.kind().as_str(),
                error = %e,
                output = %request.output,
                context_url = request.context_url.as_deref().unwrap_or(""),
                document_url = request.document_url.as_deref().unwrap_or(""),
                "Uplift failed"
            ),
        }
        result
    }

    async fn execute(
        &self,
        request: &UpliftRequest,
        provenance: Option<&ProvenanceMetadata>,
    ) -> Result<RenderedOutput, UpliftError> {
        let inputs = InputResolver::new(&self.config.fetch_policy, &self.fetcher)
            .resolve(request)
            .await?;

        let context = self.engine.validate_context(&inputs.context)?;
        let result = self.engine.generate_graph(
            &inputs.document,
            &context,
            request.base_uri.as_deref(),
            &self.config.context_fetch_policy,
        )?;

        OutputAssembler::new(&self.engine).assemble(request.output, result, provenance)
    }
}
