//! Output assembly.
//!
//! | Output | Body | Content type | Provenance |
//! |--------|------|--------------|------------|
//! | `uplifted` | uplifted JSON | `application/json` | never |
//! | `ttl` | Turtle | `text/turtle` | optional |
//! | `expanded` | expanded JSON-LD | `application/json` | optional |
//! | `all` | zip of the three above | `application/zip` | optional, per entry |
//!
//! Every representation comes from the one [`UpliftResult`] handed in; the
//! assembler never calls back into the engine's transformation.

use std::io::{Cursor, Write};

use serde_json::Value;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::annotator::{AnnotationTarget, ProvenanceAnnotator};
use crate::engine::UpliftEngine;
use crate::error::UpliftError;
use crate::graph::Graph;
use crate::types::{OutputKind, ProvenanceMetadata, RenderedOutput, UpliftResult};

/// Turtle entry of the `all` bundle.
pub const BUNDLE_TURTLE_ENTRY: &str = "ttl.ttl";
/// Expanded JSON-LD entry of the `all` bundle.
pub const BUNDLE_EXPANDED_ENTRY: &str = "expanded.jsonld";
/// Uplifted JSON entry of the `all` bundle.
pub const BUNDLE_UPLIFTED_ENTRY: &str = "uplifted.jsonld";

/// Renders the requested representation of a transformation result.
pub struct OutputAssembler<'a, E: UpliftEngine> {
    engine: &'a E,
}

impl<'a, E: UpliftEngine> OutputAssembler<'a, E> {
    /// Create an assembler backed by `engine` for annotation and Turtle.
    pub fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    /// Render `kind`.
    ///
    /// `provenance` is the request's base metadata, or `None` when provenance
    /// was not requested. Its end time is stamped once here, so every entry of
    /// a bundle reports the same timestamps.
    pub fn assemble(
        &self,
        kind: OutputKind,
        result: UpliftResult,
        provenance: Option<&ProvenanceMetadata>,
    ) -> Result<RenderedOutput, UpliftError> {
        let stamped = provenance.map(ProvenanceMetadata::stamped);
        let annotator = ProvenanceAnnotator::new(self.engine, stamped.as_ref());

        let body = match kind {
            OutputKind::Uplifted => {
                serde_json::to_vec(&result.uplifted).map_err(UpliftError::Serialization)?
            }
            OutputKind::Turtle => self.turtle(result.graph, &annotator).into_bytes(),
            OutputKind::Expanded => {
                let expanded = annotated_expanded(result.expanded, &annotator);
                serde_json::to_vec(&expanded).map_err(UpliftError::Serialization)?
            }
            OutputKind::All => self.bundle(result, &annotator)?,
        };

        Ok(RenderedOutput::new(body, kind.content_type()))
    }

    fn turtle(&self, mut graph: Graph, annotator: &ProvenanceAnnotator<'_, E>) -> String {
        annotator.annotate(AnnotationTarget::Graph(&mut graph));
        self.engine.serialize_turtle(&graph)
    }

    fn bundle(
        &self,
        result: UpliftResult,
        annotator: &ProvenanceAnnotator<'_, E>,
    ) -> Result<Vec<u8>, UpliftError> {
        let UpliftResult {
            graph,
            expanded,
            uplifted,
        } = result;

        let turtle = self.turtle(graph, annotator);
        let expanded = serde_json::to_vec_pretty(&annotated_expanded(expanded, annotator))
            .map_err(UpliftError::Serialization)?;
        let uplifted = serde_json::to_vec_pretty(&uplifted).map_err(UpliftError::Serialization)?;

        write_zip(&[
            (BUNDLE_TURTLE_ENTRY, turtle.as_bytes()),
            (BUNDLE_EXPANDED_ENTRY, expanded.as_slice()),
            (BUNDLE_UPLIFTED_ENTRY, uplifted.as_slice()),
        ])
    }
}

fn annotated_expanded<E: UpliftEngine>(
    mut expanded: Value,
    annotator: &ProvenanceAnnotator<'_, E>,
) -> Value {
    annotator.annotate(AnnotationTarget::Document(&mut expanded));
    expanded
}

fn write_zip(entries: &[(&str, &[u8])]) -> Result<Vec<u8>, UpliftError> {
    let archive = |e: &dyn std::fmt::Display| UpliftError::Archive(e.to_string());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer.start_file(*name, options).map_err(|e| archive(&e))?;
        writer.write_all(body).map_err(|e| archive(&e))?;
    }
    let cursor = writer.finish().map_err(|e| archive(&e))?;
    Ok(cursor.into_inner())
}
