//! Provenance annotation of rendered representations.
//!
//! Each representation gets its own copy of the request's provenance with
//! `output` pointing at the document itself (`#`) and carrying the
//! representation's media type. The base metadata is never touched.

use serde_json::Value;

use crate::engine::UpliftEngine;
use crate::graph::Graph;
use crate::types::{mime, FileProvenance, ProvenanceMetadata};

/// Output identifier used for every annotated representation.
pub const OUTPUT_URI: &str = "#";

/// Representations that carry provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// Graph serialized as Turtle.
    Turtle,
    /// Expanded JSON-LD document.
    JsonLd,
}

impl Representation {
    /// Media type recorded in the output descriptor.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Turtle => mime::TURTLE,
            Self::JsonLd => mime::JSON_LD,
        }
    }
}

/// What gets annotated: a graph (Turtle) or a document (JSON-LD).
pub enum AnnotationTarget<'t> {
    /// Graph-level annotation.
    Graph(&'t mut Graph),
    /// Document-level annotation.
    Document(&'t mut Value),
}

impl AnnotationTarget<'_> {
    /// The representation this target renders to.
    pub fn representation(&self) -> Representation {
        match self {
            Self::Graph(_) => Representation::Turtle,
            Self::Document(_) => Representation::JsonLd,
        }
    }
}

/// Attaches provenance to representations of one request.
pub struct ProvenanceAnnotator<'a, E: UpliftEngine> {
    engine: &'a E,
    base: Option<&'a ProvenanceMetadata>,
}

impl<'a, E: UpliftEngine> ProvenanceAnnotator<'a, E> {
    /// `base` is `None` when provenance was not requested.
    pub fn new(engine: &'a E, base: Option<&'a ProvenanceMetadata>) -> Self {
        Self { engine, base }
    }

    /// Whether annotation does anything.
    pub fn is_enabled(&self) -> bool {
        self.base.is_some()
    }

    /// The metadata a representation would be annotated with.
    pub fn metadata_for(&self, representation: Representation) -> Option<ProvenanceMetadata> {
        self.base.map(|base| {
            base.for_output(FileProvenance::new(
                Some(OUTPUT_URI.to_string()),
                representation.mime_type(),
            ))
        })
    }

    /// Annotate one target. No-op without base metadata.
    pub fn annotate(&self, target: AnnotationTarget<'_>) {
        let Some(metadata) = self.metadata_for(target.representation()) else {
            return;
        };
        match target {
            AnnotationTarget::Graph(graph) => self.engine.generate_provenance(graph, &metadata),
            AnnotationTarget::Document(document) => {
                self.engine.add_jsonld_provenance(document, &metadata)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BasicEngine;
    use crate::graph::dct;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_disabled_is_noop() {
        let engine = BasicEngine::default();
        let annotator = ProvenanceAnnotator::new(&engine, None);

        let mut graph = Graph::new();
        annotator.annotate(AnnotationTarget::Graph(&mut graph));
        assert!(graph.is_empty());

        let mut doc = json!([]);
        annotator.annotate(AnnotationTarget::Document(&mut doc));
        assert_eq!(doc, json!([]));
    }

    #[test]
    fn test_each_representation_gets_its_own_descriptor() {
        let engine = BasicEngine::default();
        let base = ProvenanceMetadata::new(Utc::now()).stamped();
        let annotator = ProvenanceAnnotator::new(&engine, Some(&base));

        let ttl = annotator.metadata_for(Representation::Turtle).unwrap();
        let jsonld = annotator.metadata_for(Representation::JsonLd).unwrap();

        assert_eq!(ttl.output.as_ref().unwrap().mime_type, "text/turtle");
        assert_eq!(jsonld.output.as_ref().unwrap().mime_type, "application/ld+json");
        assert_eq!(ttl.end, jsonld.end);
        assert_eq!(base.output, None);
    }

    #[test]
    fn test_graph_annotation_records_turtle_format() {
        let engine = BasicEngine::default();
        let base = ProvenanceMetadata::new(Utc::now()).stamped();
        let annotator = ProvenanceAnnotator::new(&engine, Some(&base));

        let mut graph = Graph::new();
        annotator.annotate(AnnotationTarget::Graph(&mut graph));
        let formats: Vec<_> = graph.with_predicate(dct::FORMAT).collect();
        assert_eq!(formats.len(), 1);
        assert!(engine.serialize_turtle(&graph).contains("<#> a prov:Entity"));
    }
}
