//! Graph transformation engines.
//!
//! The pipeline only talks to [`UpliftEngine`]; the engine owns every
//! semantic decision (what a context definition means, how terms expand,
//! how provenance is expressed).

pub mod basic;
pub mod definition;
pub mod expand;
pub mod provenance;

use serde_json::Value;

use crate::error::ValidationError;
use crate::graph::Graph;
use crate::policy::ContextFetchPolicy;
use crate::types::{ProvenanceMetadata, UpliftResult};

/// Trait for graph transformation engines.
///
/// Implementations must produce all three views of a document from a single
/// `generate_graph` call; callers never ask for them separately.
pub trait UpliftEngine: Send + Sync {
    /// A context definition that passed validation.
    type Context: Send + Sync;

    /// Validate context definition text. Empty text is a valid, empty context.
    fn validate_context(&self, text: &str) -> Result<Self::Context, ValidationError>;

    /// Transform a document into a graph, an expanded form and an uplifted form.
    ///
    /// Remote JSON-LD contexts may only be referenced when `context_fetch` allows them.
    fn generate_graph(
        &self,
        document: &Value,
        context: &Self::Context,
        base_uri: Option<&str>,
        context_fetch: &ContextFetchPolicy,
    ) -> Result<UpliftResult, ValidationError>;

    /// Add provenance statements to a graph.
    fn generate_provenance(&self, graph: &mut Graph, metadata: &ProvenanceMetadata);

    /// Add provenance nodes to an expanded JSON-LD document.
    fn add_jsonld_provenance(&self, document: &mut Value, metadata: &ProvenanceMetadata);

    /// Serialize a graph as Turtle.
    fn serialize_turtle(&self, graph: &Graph) -> String;
}

pub use basic::BasicEngine;
pub use definition::{ContextDefinition, TermDefinition, TermMap};
