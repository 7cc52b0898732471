//! # json-uplift
//!
//! Turns a plain JSON document plus a context definition into linked data.
//!
//! The crate answers one question per request:
//!
//! > Given these inputs, which representation should go back to the caller,
//! > and how was it produced?
//!
//! ## Core Contract
//!
//! 1. Resolve the context definition and the JSON document, inline or fetched
//!    from an allow-listed URL
//! 2. Run a single transformation producing a graph, an expanded JSON-LD form
//!    and an uplifted JSON form
//! 3. Render the requested representation, annotated with provenance when asked
//! 4. Report every failure through a small, stable error taxonomy
//!
//! ## Architecture
//!
//! ```text
//! UpliftRequest → InputResolver → UpliftEngine → ProvenanceAnnotator → OutputAssembler
//!                      ↓
//!              FetchGatekeeper (FetchPolicy) → RemoteFetcher (HTTP or Memory)
//! ```
//!
//! The transformation itself sits behind the [`UpliftEngine`] trait.
//! [`BasicEngine`] is a term-mapping implementation that lets the service
//! run on its own.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod annotator;
pub mod assembler;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod pipeline;
pub mod policy;
pub mod resolver;
pub mod types;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use annotator::{AnnotationTarget, ProvenanceAnnotator, Representation};
pub use assembler::{
    OutputAssembler, BUNDLE_EXPANDED_ENTRY, BUNDLE_TURTLE_ENTRY, BUNDLE_UPLIFTED_ENTRY,
};
pub use config::{ConfigError, CorsOrigins, ServiceConfig};
pub use engine::{BasicEngine, ContextDefinition, UpliftEngine};
pub use error::{ErrorDetail, ErrorKind, UpliftError, ValidationError};
pub use fetch::{FetchError, FetchGatekeeper, HttpFetcher, RemoteFetcher, StaticFetcher};
pub use graph::{BlankNode, Graph, Literal, NamedNode, Object, Subject, Triple};
pub use pipeline::UpliftPipeline;
pub use policy::{AllowPattern, ContextFetchPolicy, FetchPolicy};
pub use resolver::{InputResolver, ResolvedInputs};
pub use types::{
    FileProvenance, OutputKind, ProvenanceMetadata, RenderedOutput, UnknownOutputKind,
    UpliftRequest, UpliftResult,
};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, AppState};

/// Default service name reported by `GET /` and used as the provenance agent label.
pub const DEFAULT_SERVICE_NAME: &str = "JSON Uplift Service";
