//! Minimal RDF graph model.
//!
//! Triples only; there is no named-graph or dataset support and no querying.

pub mod to_rdf;
pub mod turtle;

use std::collections::HashSet;

pub use to_rdf::to_rdf;
pub use turtle::to_turtle;

/// An IRI-identified node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedNode {
    /// The IRI.
    pub iri: String,
}

impl NamedNode {
    /// Create a named node.
    pub fn new(iri: impl Into<String>) -> Self {
        Self { iri: iri.into() }
    }
}

/// A blank node. `id` is stored without the `_:` prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankNode {
    /// Label without `_:`.
    pub id: String,
}

impl BlankNode {
    /// Create a blank node.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A literal with datatype and optional language tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    /// Lexical form.
    pub value: String,
    /// Datatype IRI.
    pub datatype: NamedNode,
    /// Language tag, for `rdf:langString`.
    pub language: Option<String>,
}

impl Literal {
    /// Plain `xsd:string` literal.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: NamedNode::new(xsd::STRING),
            language: None,
        }
    }

    /// Typed literal.
    pub fn typed(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self {
            value: value.into(),
            datatype,
            language: None,
        }
    }

    /// Language-tagged literal.
    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: NamedNode::new(rdf::LANG_STRING),
            language: Some(language.into()),
        }
    }
}

/// Subject position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Subject {
    /// IRI.
    Named(NamedNode),
    /// Blank node.
    Blank(BlankNode),
}

impl From<NamedNode> for Subject {
    fn from(n: NamedNode) -> Self {
        Self::Named(n)
    }
}

impl From<BlankNode> for Subject {
    fn from(b: BlankNode) -> Self {
        Self::Blank(b)
    }
}

/// Object position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Object {
    /// IRI.
    Named(NamedNode),
    /// Blank node.
    Blank(BlankNode),
    /// Literal.
    Literal(Literal),
}

impl From<NamedNode> for Object {
    fn from(n: NamedNode) -> Self {
        Self::Named(n)
    }
}

impl From<BlankNode> for Object {
    fn from(b: BlankNode) -> Self {
        Self::Blank(b)
    }
}

impl From<Literal> for Object {
    fn from(l: Literal) -> Self {
        Self::Literal(l)
    }
}

impl From<Subject> for Object {
    fn from(s: Subject) -> Self {
        match s {
            Subject::Named(n) => Self::Named(n),
            Subject::Blank(b) => Self::Blank(b),
        }
    }
}

/// One statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Triple {
    /// Subject.
    pub subject: Subject,
    /// Predicate.
    pub predicate: NamedNode,
    /// Object.
    pub object: Object,
}

impl Triple {
    /// Create a triple.
    pub fn new(
        subject: impl Into<Subject>,
        predicate: NamedNode,
        object: impl Into<Object>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object: object.into(),
        }
    }
}

/// An ordered collection of triples. Insertion order is kept for stable output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
}

impl Graph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a triple; duplicates are ignored.
    pub fn add(&mut self, triple: Triple) {
        if self.seen.insert(triple.clone()) {
            self.triples.push(triple);
        }
    }

    /// Add every triple of `other`.
    pub fn extend(&mut self, other: Graph) {
        for triple in other.triples {
            self.add(triple);
        }
    }

    /// All triples.
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    /// Number of triples.
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Triples with the given predicate IRI.
    pub fn with_predicate<'a>(&'a self, iri: &'a str) -> impl Iterator<Item = &'a Triple> + 'a {
        self.triples.iter().filter(move |t| t.predicate.iri == iri)
    }
}

/// Whether `tag` is a well-formed BCP47 language tag (`en`, `en-GB`, `zh-Hant-TW`).
pub fn is_language_tag(tag: &str) -> bool {
    let subtag_ok = |s: &str, alpha_only: bool| {
        (1..=8).contains(&s.len())
            && s.bytes().all(|b| {
                if alpha_only {
                    b.is_ascii_alphabetic()
                } else {
                    b.is_ascii_alphanumeric()
                }
            })
    };

    let mut subtags = tag.split('-');
    subtags.next().is_some_and(|primary| subtag_ok(primary, true))
        && subtags.all(|s| subtag_ok(s, false))
}

/// XSD namespace.
pub mod xsd {
    /// Namespace IRI.
    pub const NS: &str = "http://www.w3.org/2001/XMLSchema#";
    /// `xsd:string`
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    /// `xsd:boolean`
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    /// `xsd:integer`
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    /// `xsd:double`
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    /// `xsd:dateTime`
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
}

/// RDF namespace.
pub mod rdf {
    /// Namespace IRI.
    pub const NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// `rdf:type`
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    /// `rdf:first`
    pub const FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
    /// `rdf:rest`
    pub const REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
    /// `rdf:nil`
    pub const NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
    /// `rdf:langString`
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

/// RDFS namespace.
pub mod rdfs {
    /// Namespace IRI.
    pub const NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    /// `rdfs:label`
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
}

/// PROV-O namespace.
pub mod prov {
    /// Namespace IRI.
    pub const NS: &str = "http://www.w3.org/ns/prov#";
    /// `prov:Activity`
    pub const ACTIVITY: &str = "http://www.w3.org/ns/prov#Activity";
    /// `prov:Entity`
    pub const ENTITY: &str = "http://www.w3.org/ns/prov#Entity";
    /// `prov:SoftwareAgent`
    pub const SOFTWARE_AGENT: &str = "http://www.w3.org/ns/prov#SoftwareAgent";
    /// `prov:startedAtTime`
    pub const STARTED_AT_TIME: &str = "http://www.w3.org/ns/prov#startedAtTime";
    /// `prov:endedAtTime`
    pub const ENDED_AT_TIME: &str = "http://www.w3.org/ns/prov#endedAtTime";
    /// `prov:used`
    pub const USED: &str = "http://www.w3.org/ns/prov#used";
    /// `prov:generated`
    pub const GENERATED: &str = "http://www.w3.org/ns/prov#generated";
    /// `prov:wasGeneratedBy`
    pub const WAS_GENERATED_BY: &str = "http://www.w3.org/ns/prov#wasGeneratedBy";
    /// `prov:wasAssociatedWith`
    pub const WAS_ASSOCIATED_WITH: &str = "http://www.w3.org/ns/prov#wasAssociatedWith";
}

/// Dublin Core terms namespace.
pub mod dct {
    /// Namespace IRI.
    pub const NS: &str = "http://purl.org/dc/terms/";
    /// `dct:format`
    pub const FORMAT: &str = "http://purl.org/dc/terms/format";
}
