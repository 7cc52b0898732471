//! Transformation results and rendered payloads.

use serde_json::Value;

use crate::graph::Graph;

/// Media types used by the service.
pub mod mime {
    /// Plain JSON.
    pub const JSON: &str = "application/json";
    /// JSON-LD.
    pub const JSON_LD: &str = "application/ld+json";
    /// Turtle.
    pub const TURTLE: &str = "text/turtle";
    /// Zip archive.
    pub const ZIP: &str = "application/zip";
    /// YAML context definitions.
    pub const YAML: &str = "text/yaml";
}

/// Three views of one transformation, produced together.
#[derive(Debug, Clone)]
pub struct UpliftResult {
    /// RDF graph.
    pub graph: Graph,
    /// Expanded JSON-LD (an array of node objects).
    pub expanded: Value,
    /// Document with its JSON-LD context attached.
    pub uplifted: Value,
}

/// A complete response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOutput {
    /// Response body.
    pub body: Vec<u8>,
    /// Response content type.
    pub content_type: &'static str,
}

impl RenderedOutput {
    /// Wrap a body and its content type.
    pub fn new(body: impl Into<Vec<u8>>, content_type: &'static str) -> Self {
        Self {
            body: body.into(),
            content_type,
        }
    }
}
