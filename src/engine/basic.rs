//! Built-in term-mapping engine.

use serde_json::Value;
use url::Url;

use super::definition::ContextDefinition;
use super::expand::Expander;
use super::provenance::provenance_nodes;
use super::UpliftEngine;
use crate::error::ValidationError;
use crate::graph::{to_rdf, to_turtle, Graph};
use crate::policy::ContextFetchPolicy;
use crate::types::{ProvenanceMetadata, UpliftResult};
use crate::DEFAULT_SERVICE_NAME;

/// Maps document keys through a context definition's terms.
///
/// Remote contexts are referenced in the uplifted output but never
/// dereferenced, so only inline terms contribute to the expanded form and
/// the graph.
#[derive(Debug, Clone)]
pub struct BasicEngine {
    agent_label: String,
}

impl BasicEngine {
    /// Engine whose provenance agent carries `agent_label`.
    pub fn new(agent_label: impl Into<String>) -> Self {
        Self {
            agent_label: agent_label.into(),
        }
    }

    /// Engine labelled `"<service name> <crate version>"`.
    pub fn for_service(service_name: &str) -> Self {
        Self::new(format!("{service_name} {}", env!("CARGO_PKG_VERSION")))
    }

    /// Label used for the software agent.
    pub fn agent_label(&self) -> &str {
        &self.agent_label
    }
}

impl Default for BasicEngine {
    fn default() -> Self {
        Self::for_service(DEFAULT_SERVICE_NAME)
    }
}

impl UpliftEngine for BasicEngine {
    type Context = ContextDefinition;

    fn validate_context(&self, text: &str) -> Result<ContextDefinition, ValidationError> {
        ContextDefinition::parse(text)
    }

    fn generate_graph(
        &self,
        document: &Value,
        context: &ContextDefinition,
        base_uri: Option<&str>,
        context_fetch: &ContextFetchPolicy,
    ) -> Result<UpliftResult, ValidationError> {
        if let Some(refused) = context
            .remote_contexts
            .iter()
            .find(|reference| !context_fetch.allows(reference))
        {
            return Err(ValidationError::new("Remote context fetch not allowed")
                .with_property("context")
                .with_value(refused.clone()));
        }

        let base = base_uri
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .or(context.base_uri.as_deref())
            .or(context.terms.base.as_deref())
            .map(|b| {
                Url::parse(b).map_err(|e| {
                    ValidationError::new("Invalid base URI")
                        .with_property("base")
                        .with_value(b)
                        .with_cause("UrlError", e)
                })
            })
            .transpose()?;

        let expanded =
            Expander::new(&context.terms, base).expand_document(document, &context.types)?;
        let graph = to_rdf(&expanded)?;
        let uplifted = context.uplift(document);

        Ok(UpliftResult {
            graph,
            expanded,
            uplifted,
        })
    }

    fn generate_provenance(&self, graph: &mut Graph, metadata: &ProvenanceMetadata) {
        let nodes = Value::Array(provenance_nodes(metadata, &self.agent_label));
        match to_rdf(&nodes) {
            Ok(statements) => graph.extend(statements),
            Err(e) => tracing::warn!(error = %e, "Could not convert provenance to triples"),
        }
    }

    fn add_jsonld_provenance(&self, document: &mut Value, metadata: &ProvenanceMetadata) {
        let nodes = provenance_nodes(metadata, &self.agent_label);
        match document {
            Value::Array(existing) => existing.extend(nodes),
            other => {
                let mut all = vec![other.take()];
                all.extend(nodes);
                *other = Value::Array(all);
            }
        }
    }

    fn serialize_turtle(&self, graph: &Graph) -> String {
        to_turtle(graph)
    }
}
