//! Term expansion.
//!
//! Produces expanded JSON-LD (an array of node objects) from a plain JSON
//! document and a [`TermMap`]. Keys resolve, in order, through:
//!
//! 1. a term definition
//! 2. a compact IRI `prefix:suffix` whose prefix is a term
//! 3. an absolute IRI used as is
//! 4. `@vocab`
//!
//! Keys that resolve to none of these are dropped.

use serde_json::{json, Map, Value};
use url::Url;

use super::definition::{TermDefinition, TermMap};
use crate::error::ValidationError;
use crate::graph::{is_language_tag, rdf, rdfs, xsd};

/// Term definitions may point at other terms; chains deeper than this are
/// left unexpanded.
const MAX_TERM_DEPTH: usize = 8;

/// Datatype prefixes understood even when the context leaves them undefined.
const DATATYPE_PREFIXES: &[(&str, &str)] =
    &[("xsd", xsd::NS), ("rdf", rdf::NS), ("rdfs", rdfs::NS)];

/// Expands documents against one set of term definitions.
pub struct Expander<'a> {
    terms: &'a TermMap,
    base: Option<Url>,
}

impl<'a> Expander<'a> {
    /// Create an expander. `base` resolves relative `@id` values.
    pub fn new(terms: &'a TermMap, base: Option<Url>) -> Self {
        Self { terms, base }
    }

    /// Expand a whole document.
    ///
    /// The document must be an object or an array of objects. `root_types`
    /// are added to the `@type` of every root node.
    pub fn expand_document(
        &self,
        document: &Value,
        root_types: &[String],
    ) -> Result<Value, ValidationError> {
        let roots: Vec<&Map<String, Value>> = match document {
            Value::Object(obj) => vec![obj],
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    item.as_object().ok_or_else(|| {
                        ValidationError::new("Array documents may only contain objects")
                            .with_index(index)
                            .with_value(item.clone())
                    })
                })
                .collect::<Result<_, _>>()?,
            other => {
                return Err(ValidationError::new(
                    "JSON document must be an object or an array of objects",
                )
                .with_value(other.clone()))
            }
        };

        let root_types: Vec<Value> = root_types
            .iter()
            .map(|t| Value::String(self.expand_iri(t, true)))
            .collect();

        let mut nodes = Vec::with_capacity(roots.len());
        for root in roots {
            let mut node = self.expand_node(root)?;
            if !root_types.is_empty() {
                let types = node
                    .entry("@type")
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(types) = types {
                    for t in &root_types {
                        if !types.contains(t) {
                            types.push(t.clone());
                        }
                    }
                }
            }
            nodes.push(Value::Object(node));
        }
        Ok(Value::Array(nodes))
    }

    fn expand_node(&self, obj: &Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        let mut node = Map::new();

        for (key, value) in obj {
            match key.as_str() {
                "@id" => {
                    let id = value.as_str().ok_or_else(|| {
                        ValidationError::new("@id must be a string")
                            .with_property("@id")
                            .with_value(value.clone())
                    })?;
                    node.insert("@id".to_string(), Value::String(self.resolve_id(id)));
                }
                "@type" => {
                    let types = self.expand_types(value)?;
                    if !types.is_empty() {
                        node.insert("@type".to_string(), Value::Array(types));
                    }
                }
                keyword if keyword.starts_with('@') => {}
                _ => {
                    let Some((iri, definition)) = self.expand_term(key) else {
                        continue;
                    };
                    let mut values = Vec::new();
                    self.expand_value(value, definition, &mut values)?;
                    if values.is_empty() {
                        continue;
                    }
                    if let Value::Array(existing) =
                        node.entry(iri).or_insert_with(|| Value::Array(Vec::new()))
                    {
                        existing.extend(values);
                    }
                }
            }
        }
        Ok(node)
    }

    fn expand_types(&self, value: &Value) -> Result<Vec<Value>, ValidationError> {
        let invalid = || {
            ValidationError::new("@type must be a string or a list of strings")
                .with_property("@type")
                .with_value(value.clone())
        };
        match value {
            Value::String(t) => Ok(vec![Value::String(self.expand_iri(t, true))]),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(|t| Value::String(self.expand_iri(t, true)))
                        .ok_or_else(invalid)
                })
                .collect(),
            _ => Err(invalid()),
        }
    }

    fn expand_value(
        &self,
        value: &Value,
        definition: Option<&TermDefinition>,
        out: &mut Vec<Value>,
    ) -> Result<(), ValidationError> {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    self.expand_value(item, definition, out)?;
                }
            }
            Value::Object(obj) if obj.contains_key("@value") => {
                if let Some(literal) = self.expand_value_object(obj)? {
                    out.push(literal);
                }
            }
            Value::Object(obj) => out.push(Value::Object(self.expand_node(obj)?)),
            scalar => {
                let mapping = definition.and_then(|d| d.type_mapping.as_deref());
                let expanded = match (mapping, scalar) {
                    (Some("@id"), Value::String(s)) => json!({ "@id": self.resolve_id(s) }),
                    (Some("@vocab"), Value::String(s)) => {
                        json!({ "@id": self.expand_iri(s, true) })
                    }
                    (Some(datatype), _) if !datatype.starts_with('@') => json!({
                        "@value": scalar,
                        "@type": self.expand_datatype(datatype),
                    }),
                    _ => json!({ "@value": scalar }),
                };
                out.push(expanded);
            }
        }
        Ok(())
    }

    /// Check a `{"@value", "@language" | "@type"}` object and expand its datatype.
    ///
    /// A `null` value drops the object. Keys other than `@value`, `@language`
    /// and `@type` are not carried over.
    fn expand_value_object(
        &self,
        obj: &Map<String, Value>,
    ) -> Result<Option<Value>, ValidationError> {
        let invalid = |msg: &str, property: &str, value: &Value| {
            ValidationError::new(msg)
                .with_property(property)
                .with_value(value.clone())
        };

        let literal = match obj.get("@value") {
            None | Some(Value::Null) => return Ok(None),
            Some(v @ (Value::Array(_) | Value::Object(_))) => {
                return Err(invalid("@value must be a scalar", "@value", v))
            }
            Some(v) => v,
        };

        let mut out = Map::new();
        out.insert("@value".to_string(), literal.clone());

        match (obj.get("@language"), obj.get("@type")) {
            (Some(lang), Some(_)) => {
                return Err(invalid(
                    "A value may not carry both @language and @type",
                    "@language",
                    lang,
                ))
            }
            (Some(Value::String(tag)), None) if is_language_tag(tag) => {
                out.insert("@language".to_string(), Value::String(tag.clone()));
            }
            (Some(lang), None) => {
                return Err(invalid("@language must be a BCP47 language tag", "@language", lang))
            }
            (None, Some(Value::String(datatype))) => {
                out.insert("@type".to_string(), Value::String(self.expand_datatype(datatype)));
            }
            (None, Some(other)) => return Err(invalid("@type must be a string", "@type", other)),
            (None, None) => {}
        }

        Ok(Some(Value::Object(out)))
    }

    /// Expand a datatype, falling back to the well-known `xsd`, `rdf` and
    /// `rdfs` prefixes when the context does not define them.
    fn expand_datatype(&self, datatype: &str) -> String {
        let expanded = self.expand_iri(datatype, true);
        if let Some((prefix, suffix)) = expanded.split_once(':') {
            if self.terms.get(prefix).is_none() {
                if let Some((_, ns)) = DATATYPE_PREFIXES.iter().find(|(p, _)| *p == prefix) {
                    return format!("{ns}{suffix}");
                }
            }
        }
        expanded
    }

    /// Resolve a document key to a property IRI.
    fn expand_term(&self, key: &str) -> Option<(String, Option<&'a TermDefinition>)> {
        let definition = self.terms.get(key);
        let iri = self.expand_iri(key, true);
        is_absolute(&iri).then_some((iri, definition))
    }

    /// Expand a term, compact IRI or vocabulary-relative name.
    pub fn expand_iri(&self, value: &str, vocab: bool) -> String {
        self.expand_iri_at(value, vocab, 0)
    }

    fn expand_iri_at(&self, value: &str, vocab: bool, depth: usize) -> String {
        if value.starts_with('@') || value.starts_with("_:") || depth > MAX_TERM_DEPTH {
            return value.to_string();
        }
        if vocab {
            if let Some(definition) = self.terms.get(value) {
                if definition.id != value {
                    return self.expand_iri_at(&definition.id, true, depth + 1);
                }
            }
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if !suffix.starts_with("//") {
                if let Some(definition) = self.terms.get(prefix) {
                    let namespace = self.expand_iri_at(&definition.id, true, depth + 1);
                    return format!("{namespace}{suffix}");
                }
            }
            return value.to_string();
        }
        match (&self.terms.vocab, vocab) {
            (Some(prefix), true) => format!("{prefix}{value}"),
            _ => value.to_string(),
        }
    }

    /// Resolve an `@id` value: compact IRIs expand, relative references join
    /// the base, everything else is kept.
    fn resolve_id(&self, id: &str) -> String {
        if id.starts_with("_:") {
            return id.to_string();
        }
        let expanded = self.expand_iri(id, false);
        if Url::parse(&expanded).is_ok() {
            return expanded;
        }
        match &self.base {
            Some(base) => base
                .join(id)
                .map(String::from)
                .unwrap_or_else(|_| id.to_string()),
            None => id.to_string(),
        }
    }
}

fn is_absolute(iri: &str) -> bool {
    iri.starts_with("_:") || iri.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::definition::ContextDefinition;

    fn definition(yaml: &str) -> ContextDefinition {
        ContextDefinition::parse(yaml).unwrap()
    }

    #[test]
    fn test_terms_and_compact_iris() {
        let def = definition(
            "context:\n  schema: http://schema.org/\n  name: schema:name\n",
        );
        let expander = Expander::new(&def.terms, None);
        let expanded = expander
            .expand_document(&json!({"name": "A", "schema:age": 3, "ignored": true}), &[])
            .unwrap();

        assert_eq!(
            expanded,
            json!([{
                "http://schema.org/name": [{"@value": "A"}],
                "http://schema.org/age": [{"@value": 3}],
            }])
        );
    }

    #[test]
    fn test_vocab_catches_unmapped_keys() {
        let def = definition("context:\n  '@vocab': http://example.org/\n");
        let expander = Expander::new(&def.terms, None);
        let expanded = expander.expand_document(&json!({"title": "x"}), &[]).unwrap();
        assert_eq!(expanded, json!([{"http://example.org/title": [{"@value": "x"}]}]));
    }

    #[test]
    fn test_id_resolves_against_base() {
        let def = definition("context:\n  '@vocab': http://example.org/\n");
        let base = Url::parse("https://data.example.org/items/").unwrap();
        let expander = Expander::new(&def.terms, Some(base));
        let expanded = expander.expand_document(&json!({"@id": "42"}), &[]).unwrap();
        assert_eq!(expanded, json!([{"@id": "https://data.example.org/items/42"}]));
    }

    #[test]
    fn test_type_coercion() {
        let def = definition(
            "context:\n  '@vocab': http://example.org/\n  \
             xsd: http://www.w3.org/2001/XMLSchema#\n  \
             link: { '@id': 'http://example.org/link', '@type': '@id' }\n  \
             born: { '@id': 'http://example.org/born', '@type': 'xsd:date' }\n",
        );
        let expander = Expander::new(&def.terms, None);
        let expanded = expander
            .expand_document(&json!({"link": "http://a.org/x", "born": "2001-01-01"}), &[])
            .unwrap();

        assert_eq!(expanded[0]["http://example.org/link"], json!([{"@id": "http://a.org/x"}]));
        assert_eq!(
            expanded[0]["http://example.org/born"],
            json!([{"@value": "2001-01-01", "@type": "http://www.w3.org/2001/XMLSchema#date"}])
        );
    }

    #[test]
    fn test_nested_objects_and_arrays() {
        let def = definition("context:\n  '@vocab': http://example.org/\n");
        let expander = Expander::new(&def.terms, None);
        let expanded = expander
            .expand_document(&json!({"tags": ["a", null, ["b"]], "author": {"name": "C"}}), &[])
            .unwrap();

        assert_eq!(
            expanded[0]["http://example.org/tags"],
            json!([{"@value": "a"}, {"@value": "b"}])
        );
        assert_eq!(
            expanded[0]["http://example.org/author"],
            json!([{"http://example.org/name": [{"@value": "C"}]}])
        );
    }

    #[test]
    fn test_root_types() {
        let def = definition("context:\n  schema: http://schema.org/\ntypes: [schema:Dataset]\n");
        let expander = Expander::new(&def.terms, None);
        let expanded = expander
            .expand_document(&json!([{}, {"@type": "schema:Thing"}]), &def.types)
            .unwrap();

        assert_eq!(expanded[0]["@type"], json!(["http://schema.org/Dataset"]));
        assert_eq!(
            expanded[1]["@type"],
            json!(["http://schema.org/Thing", "http://schema.org/Dataset"])
        );
    }

    #[test]
    fn test_rejects_scalar_documents() {
        let terms = TermMap::default();
        let expander = Expander::new(&terms, None);
        assert!(expander.expand_document(&json!("text"), &[]).is_err());

        let err = expander.expand_document(&json!([{}, 1]), &[]).unwrap_err();
        assert_eq!(err.index, Some(1));
    }

    #[test]
    fn test_value_objects_are_checked_and_expanded() {
        let def = definition("context:\n  '@vocab': http://example.org/\n");
        let expander = Expander::new(&def.terms, None);
        let expanded = expander
            .expand_document(
                &json!({
                    "@id": "http://example.org/a",
                    "title": {"@value": "Hallo", "@language": "de-AT", "@index": "x"},
                    "born": {"@value": "2020-01-01", "@type": "xsd:date"},
                    "gone": {"@value": null},
                }),
                &[],
            )
            .unwrap();

        let node = &expanded[0];
        assert_eq!(
            node["http://example.org/title"],
            json!([{"@value": "Hallo", "@language": "de-AT"}])
        );
        assert_eq!(
            node["http://example.org/born"],
            json!([{"@value": "2020-01-01", "@type": "http://www.w3.org/2001/XMLSchema#date"}])
        );
        assert!(node.get("http://example.org/gone").is_none());
    }

    #[test]
    fn test_context_prefix_wins_over_well_known_datatype_prefix() {
        let def = definition(
            "context:\n  '@vocab': http://example.org/\n  xsd: http://example.org/types#\n",
        );
        let expander = Expander::new(&def.terms, None);
        let expanded = expander
            .expand_document(&json!({"d": {"@value": "1", "@type": "xsd:date"}}), &[])
            .unwrap();
        assert_eq!(
            expanded[0]["http://example.org/d"][0]["@type"],
            "http://example.org/types#date"
        );
    }

    #[test]
    fn test_malformed_value_objects_are_rejected() {
        let def = definition("context:\n  '@vocab': http://example.org/\n");
        let expander = Expander::new(&def.terms, None);

        let err = expander
            .expand_document(&json!({"t": {"@value": "x", "@language": "en fr"}}), &[])
            .unwrap_err();
        assert_eq!(err.property.as_deref(), Some("@language"));
        assert_eq!(err.value, Some(json!("en fr")));

        let both = json!({"t": {"@value": "x", "@language": "en", "@type": "xsd:string"}});
        let err = expander.expand_document(&both, &[]).unwrap_err();
        assert_eq!(err.property.as_deref(), Some("@language"));

        let err = expander
            .expand_document(&json!({"t": {"@value": {"nested": 1}}}), &[])
            .unwrap_err();
        assert_eq!(err.property.as_deref(), Some("@value"));
    }

    #[test]
    fn test_self_referencing_terms_terminate() {
        let def = definition("context:\n  a: b\n  b: a\n");
        let expander = Expander::new(&def.terms, None);
        assert!(expander.expand_document(&json!({"a": 1}), &[]).is_ok());
    }
}
