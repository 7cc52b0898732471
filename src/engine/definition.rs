//! Context definitions.
//!
//! A context definition is a YAML (or JSON) mapping:
//!
//! ```yaml
//! context:
//!   '@vocab': https://example.org/vocab/
//!   schema: http://schema.org/
//!   name: schema:name
//!   homepage: { '@id': schema:url, '@type': '@id' }
//! types:
//!   - schema:Dataset
//! base-uri: https://example.org/items/
//! ```
//!
//! `context` may also be a remote context URL, or a list mixing URLs and
//! inline mappings. Remote contexts are referenced, never dereferenced.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use url::Url;

use crate::error::ValidationError;

/// One term's mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermDefinition {
    /// Target IRI, compact IRI or term.
    pub id: String,
    /// `@type` coercion: `@id`, `@vocab` or a datatype.
    pub type_mapping: Option<String>,
}

/// Inline term definitions collected from every context entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermMap {
    /// `@vocab` prefix for unmapped terms.
    pub vocab: Option<String>,
    /// `@base` for relative identifiers.
    pub base: Option<String>,
    terms: BTreeMap<String, TermDefinition>,
}

impl TermMap {
    /// Look up a term.
    pub fn get(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    /// Number of defined terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether no term is defined.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn insert(&mut self, term: &str, definition: &Value) -> Result<(), ValidationError> {
        let invalid = |msg: &str| {
            ValidationError::new(msg)
                .with_property(term)
                .with_value(definition.clone())
        };

        match (term, definition) {
            ("@vocab", Value::String(v)) => self.vocab = Some(v.clone()),
            ("@base", Value::String(v)) => self.base = Some(v.clone()),
            ("@vocab", Value::Null) => self.vocab = None,
            ("@base", Value::Null) => self.base = None,
            ("@vocab" | "@base", _) => return Err(invalid("Keyword value must be an IRI")),
            // @version, @language and friends are carried in the uplifted
            // context but do not affect term mapping.
            (keyword, _) if keyword.starts_with('@') => {}
            (_, Value::Null) => {
                self.terms.remove(term);
            }
            (_, Value::String(iri)) => {
                self.terms.insert(
                    term.to_string(),
                    TermDefinition {
                        id: iri.clone(),
                        type_mapping: None,
                    },
                );
            }
            (_, Value::Object(obj)) => {
                let id = match obj.get("@id") {
                    Some(Value::String(id)) => id.clone(),
                    _ => return Err(invalid("Expanded term definition requires a string @id")),
                };
                let type_mapping = match obj.get("@type") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(t)) => Some(t.clone()),
                    Some(_) => return Err(invalid("Term @type must be a string")),
                };
                self.terms
                    .insert(term.to_string(), TermDefinition { id, type_mapping });
            }
            _ => return Err(invalid("Term definitions must be IRIs or mappings")),
        }
        Ok(())
    }
}

/// A validated context definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextDefinition {
    /// The JSON-LD `@context` attached to uplifted documents.
    pub context: Option<Value>,
    /// Inline term definitions.
    pub terms: TermMap,
    /// Remote contexts referenced by `context`.
    pub remote_contexts: Vec<String>,
    /// Classes applied to every root object.
    pub types: Vec<String>,
    /// Default base URI.
    pub base_uri: Option<String>,
}

impl ContextDefinition {
    /// Parse and validate definition text. Blank text is an empty definition.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_yaml::from_str(text).map_err(|e| {
            ValidationError::new("Context definition is neither valid YAML nor JSON")
                .with_cause("ParseError", e)
        })?;
        Self::from_value(value)
    }

    /// Validate an already parsed definition.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(
                    ValidationError::new("Context definition must be a mapping").with_value(other)
                )
            }
        };

        let mut definition = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "context" => definition.set_context(value)?,
                "types" => definition.types = parse_types(value)?,
                "base-uri" => match value {
                    Value::String(base) => definition.base_uri = Some(base),
                    Value::Null => {}
                    other => {
                        return Err(ValidationError::new("base-uri must be a string")
                            .with_property("base-uri")
                            .with_value(other))
                    }
                },
                other => {
                    return Err(ValidationError::new("Unknown context definition property")
                        .with_property(other)
                        .with_value(value))
                }
            }
        }
        Ok(definition)
    }

    /// Whether the definition attaches any context at all.
    pub fn is_empty(&self) -> bool {
        self.context.is_none() && self.types.is_empty()
    }

    /// Attach the context to a document.
    ///
    /// Objects get an `@context` key (replacing any existing one); arrays are
    /// wrapped in `{"@context", "@graph"}`. Without a context the document is
    /// returned as is.
    pub fn uplift(&self, document: &Value) -> Value {
        let Some(context) = &self.context else {
            return document.clone();
        };
        match document {
            Value::Object(obj) => {
                let mut uplifted = obj.clone();
                uplifted.insert("@context".to_string(), context.clone());
                Value::Object(uplifted)
            }
            other => {
                let mut wrapper = Map::new();
                wrapper.insert("@context".to_string(), context.clone());
                wrapper.insert("@graph".to_string(), other.clone());
                Value::Object(wrapper)
            }
        }
    }

    fn set_context(&mut self, value: Value) -> Result<(), ValidationError> {
        match &value {
            Value::Null => return Ok(()),
            Value::Array(entries) => {
                for (index, entry) in entries.iter().enumerate() {
                    self.add_context_entry(entry)
                        .map_err(|e| e.with_index(index))?;
                }
            }
            entry => self.add_context_entry(entry)?,
        }

        let empty = matches!(&value, Value::Object(m) if m.is_empty())
            || matches!(&value, Value::Array(a) if a.is_empty());
        if !empty {
            self.context = Some(value);
        }
        Ok(())
    }

    fn add_context_entry(&mut self, entry: &Value) -> Result<(), ValidationError> {
        match entry {
            Value::String(reference) => {
                Url::parse(reference).map_err(|e| {
                    ValidationError::new("Remote context reference must be an absolute URL")
                        .with_property("context")
                        .with_value(reference.clone())
                        .with_cause("UrlError", e)
                })?;
                self.remote_contexts.push(reference.clone());
                Ok(())
            }
            Value::Object(terms) => {
                for (term, definition) in terms {
                    self.terms.insert(term, definition)?;
                }
                Ok(())
            }
            Value::Null => Ok(()),
            other => Err(ValidationError::new("Context entries must be mappings or URLs")
                .with_property("context")
                .with_value(other.clone())),
        }
    }
}

fn parse_types(value: Value) -> Result<Vec<String>, ValidationError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(t) => Ok(vec![t]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(t) => Ok(t),
                other => Err(ValidationError::new("types entries must be strings")
                    .with_property("types")
                    .with_index(index)
                    .with_value(other)),
            })
            .collect(),
        other => Err(ValidationError::new("types must be a string or a list")
            .with_property("types")
            .with_value(other)),
    }
}
