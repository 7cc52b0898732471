//! Shared service state.

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::engine::UpliftEngine;
use crate::fetch::RemoteFetcher;
use crate::pipeline::UpliftPipeline;

/// State shared by every handler.
///
/// Read-only after startup; cloning only bumps reference counts.
pub struct ServiceState<E: UpliftEngine, F: RemoteFetcher> {
    /// The request pipeline.
    pub pipeline: Arc<UpliftPipeline<E, F>>,
}

impl<E: UpliftEngine, F: RemoteFetcher> ServiceState<E, F> {
    /// Build state around a pipeline.
    pub fn new(pipeline: UpliftPipeline<E, F>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Build state from its parts.
    pub fn from_parts(config: ServiceConfig, engine: E, fetcher: F) -> Self {
        Self::new(UpliftPipeline::new(Arc::new(config), engine, fetcher))
    }

    /// The service configuration.
    pub fn config(&self) -> &ServiceConfig {
        self.pipeline.config()
    }
}

impl<E: UpliftEngine, F: RemoteFetcher> Clone for ServiceState<E, F> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BasicEngine;
    use crate::fetch::StaticFetcher;

    #[test]
    fn test_clone_shares_pipeline() {
        let state = ServiceState::from_parts(
            ServiceConfig::default().with_root_path("/api/"),
            BasicEngine::default(),
            StaticFetcher::new(),
        );
        let other = state.clone();

        assert!(Arc::ptr_eq(&state.pipeline, &other.pipeline));
        assert_eq!(other.config().root_path.as_deref(), Some("/api"));
    }
}
