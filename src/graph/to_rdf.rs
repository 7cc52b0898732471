use std::collections::HashSet;

use serde_json::{Map, Value};

use super::*;
use crate::error::ValidationError;

/// Convert expanded JSON-LD (an array of node objects) to a graph.
///
/// Nodes without `@id` get fresh blank nodes `b0`, `b1`, ... in document order,
/// skipping any label the document already uses as `_:label`.
pub fn to_rdf(expanded: &Value) -> Result<Graph, ValidationError> {
    let nodes = expanded
        .as_array()
        .ok_or_else(|| ValidationError::new("Expanded JSON-LD must be an array"))?;

    let mut builder = GraphBuilder::default();
    collect_blank_labels(expanded, &mut builder.reserved);
    for node in nodes {
        if let Some(obj) = node.as_object() {
            builder.process_node(obj)?;
        }
    }
    Ok(builder.graph)
}

#[derive(Default)]
struct GraphBuilder {
    graph: Graph,
    blank_counter: u64,
    /// Labels written in the document, never issued by `fresh_blank`.
    reserved: HashSet<String>,
}

impl GraphBuilder {
    fn fresh_blank(&mut self) -> BlankNode {
        loop {
            let label = format!("b{}", self.blank_counter);
            self.blank_counter += 1;
            if !self.reserved.contains(&label) {
                return BlankNode::new(label);
            }
        }
    }

    fn process_node(&mut self, node: &Map<String, Value>) -> Result<Subject, ValidationError> {
        let subject = match node.get("@id") {
            Some(id) => {
                let id = id.as_str().ok_or_else(|| {
                    ValidationError::new("@id must be a string").with_value(id.clone())
                })?;
                node_ref(id).into()
            }
            None => Subject::Blank(self.fresh_blank()),
        };

        if let Some(Value::Array(types)) = node.get("@type") {
            for type_iri in types.iter().filter_map(Value::as_str) {
                self.graph.add(Triple::new(
                    subject.clone(),
                    NamedNode::new(rdf::TYPE),
                    NamedNode::new(type_iri),
                ));
            }
        }

        for (key, value) in node {
            if key.starts_with('@') {
                continue;
            }
            let predicate = NamedNode::new(key.as_str());
            let Value::Array(items) = value else {
                continue;
            };
            for item in items {
                if let Some(object) = self.value_to_object(item)? {
                    self.graph
                        .add(Triple::new(subject.clone(), predicate.clone(), object));
                }
            }
        }

        Ok(subject)
    }

    fn value_to_object(&mut self, value: &Value) -> Result<Option<Object>, ValidationError> {
        let Value::Object(obj) = value else {
            return Ok(None);
        };

        if let Some(val) = obj.get("@value") {
            return Ok(value_object_to_literal(val, obj).map(Object::Literal));
        }
        if let Some(list) = obj.get("@list") {
            return self.list_to_rdf(list).map(Some);
        }
        if obj.len() == 1 {
            if let Some(id) = obj.get("@id").and_then(Value::as_str) {
                return Ok(Some(match node_ref(id) {
                    Subject::Named(n) => Object::Named(n),
                    Subject::Blank(b) => Object::Blank(b),
                }));
            }
        }

        self.process_node(obj).map(|s| Some(s.into()))
    }

    fn list_to_rdf(&mut self, list: &Value) -> Result<Object, ValidationError> {
        let items = list
            .as_array()
            .ok_or_else(|| ValidationError::new("@list must be an array"))?;

        let mut current = Object::Named(NamedNode::new(rdf::NIL));
        for item in items.iter().rev() {
            let Some(head) = self.value_to_object(item)? else {
                continue;
            };
            let cell = self.fresh_blank();
            self.graph
                .add(Triple::new(cell.clone(), NamedNode::new(rdf::FIRST), head));
            self.graph
                .add(Triple::new(cell.clone(), NamedNode::new(rdf::REST), current));
            current = Object::Blank(cell);
        }
        Ok(current)
    }
}

fn collect_blank_labels(value: &Value, labels: &mut HashSet<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_blank_labels(item, labels);
            }
        }
        Value::Object(obj) => {
            for (key, v) in obj {
                match (key.as_str(), v) {
                    ("@id", Value::String(id)) => {
                        if let Some(label) = id.strip_prefix("_:") {
                            labels.insert(label.to_string());
                        }
                    }
                    ("@value", _) => {}
                    _ => collect_blank_labels(v, labels),
                }
            }
        }
        _ => {}
    }
}

fn node_ref(id: &str) -> Subject {
    match id.strip_prefix("_:") {
        Some(label) => Subject::Blank(BlankNode::new(label)),
        None => Subject::Named(NamedNode::new(id)),
    }
}

fn value_object_to_literal(val: &Value, obj: &Map<String, Value>) -> Option<Literal> {
    let lexical = match val {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };

    if let Some(lang) = obj.get("@language").and_then(Value::as_str) {
        return Some(Literal::lang(lexical, lang));
    }
    if let Some(datatype) = obj.get("@type").and_then(Value::as_str) {
        return Some(Literal::typed(lexical, NamedNode::new(datatype)));
    }

    Some(match val {
        Value::Bool(_) => Literal::typed(lexical, NamedNode::new(xsd::BOOLEAN)),
        Value::Number(n) if n.is_f64() => Literal::typed(lexical, NamedNode::new(xsd::DOUBLE)),
        Value::Number(_) => Literal::typed(lexical, NamedNode::new(xsd::INTEGER)),
        _ => Literal::new(lexical),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_node() {
        let expanded = json!([{
            "@id": "http://example.org/a",
            "@type": ["http://schema.org/Thing"],
            "http://schema.org/name": [{"@value": "A"}],
            "http://schema.org/size": [{"@value": 3}],
        }]);
        let graph = to_rdf(&expanded).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.with_predicate(rdf::TYPE).count(), 1);
        let size = graph.with_predicate("http://schema.org/size").next().unwrap();
        assert_eq!(
            size.object,
            Object::Literal(Literal::typed("3", NamedNode::new(xsd::INTEGER)))
        );
    }

    #[test]
    fn test_nested_node_gets_blank_subject() {
        let expanded = json!([{
            "http://schema.org/author": [{
                "http://schema.org/name": [{"@value": "B"}]
            }]
        }]);
        let graph = to_rdf(&expanded).unwrap();

        let author = graph.with_predicate("http://schema.org/author").next().unwrap();
        assert_eq!(author.subject, Subject::Blank(BlankNode::new("b0")));
        assert_eq!(author.object, Object::Blank(BlankNode::new("b1")));
    }

    #[test]
    fn test_issued_blanks_skip_document_labels() {
        let expanded = json!([
            {"@id": "_:b0", "http://example.org/x": [{"@value": 1}]},
            {"http://example.org/y": [{"@value": 2}]},
            {"http://example.org/z": [{"@id": "_:b2"}]},
            {"http://example.org/w": [{"@value": 3}]},
        ]);
        let graph = to_rdf(&expanded).unwrap();

        let subjects: Vec<_> = graph.triples().iter().map(|t| t.subject.clone()).collect();
        assert_eq!(
            subjects,
            vec![
                Subject::Blank(BlankNode::new("b0")),
                Subject::Blank(BlankNode::new("b1")),
                Subject::Blank(BlankNode::new("b3")),
                Subject::Blank(BlankNode::new("b4")),
            ]
        );
    }

    #[test]
    fn test_list_becomes_rdf_collection() {
        let expanded = json!([{
            "@id": "http://example.org/a",
            "http://example.org/items": [{"@list": [{"@value": 1}, {"@value": 2}]}]
        }]);
        let graph = to_rdf(&expanded).unwrap();
        assert_eq!(graph.with_predicate(rdf::FIRST).count(), 2);
        assert_eq!(graph.with_predicate(rdf::REST).count(), 2);
    }

    #[test]
    fn test_null_values_are_skipped() {
        let expanded = json!([{
            "@id": "http://example.org/a",
            "http://example.org/p": [{"@value": null}],
        }]);
        assert!(to_rdf(&expanded).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(to_rdf(&json!({"@id": "x"})).is_err());
    }
}
