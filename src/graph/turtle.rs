//! Turtle serialization.
//!
//! Output layout:
//!
//! ```text
//! @prefix prov: <http://www.w3.org/ns/prov#> .
//!
//! <s> a prov:Activity ;
//!     prov:used <a>, <b> .
//! ```
//!
//! Subjects appear in first-seen order, predicates in first-seen order within
//! a subject. Only prefixes that are actually used are declared.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

use super::*;

const PREFIXES: &[(&str, &str)] = &[
    ("dct", dct::NS),
    ("prov", prov::NS),
    ("rdf", rdf::NS),
    ("rdfs", rdfs::NS),
    ("xsd", xsd::NS),
];

/// Serialize a graph as Turtle.
pub fn to_turtle(graph: &Graph) -> String {
    let mut used_prefixes = BTreeSet::new();
    let mut body = String::new();

    for (subject, predicates) in group_by_subject(graph) {
        let _ = write!(body, "{}", subject_term(subject, &mut used_prefixes));
        for (p_index, (predicate, objects)) in predicates.iter().enumerate() {
            let separator = if p_index == 0 { " " } else { " ;\n    " };
            let predicate = if predicate.iri == rdf::TYPE {
                "a".to_string()
            } else {
                iri_term(&predicate.iri, &mut used_prefixes)
            };
            let objects: Vec<String> = objects
                .iter()
                .map(|o| object_term(o, &mut used_prefixes))
                .collect();
            let _ = write!(body, "{separator}{predicate} {}", objects.join(", "));
        }
        body.push_str(" .\n\n");
    }

    let mut out = String::new();
    for &(prefix, ns) in PREFIXES {
        if used_prefixes.contains(prefix) {
            let _ = writeln!(out, "@prefix {prefix}: <{ns}> .");
        }
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&body);
    out
}

type PredicateGroup<'a> = Vec<(&'a NamedNode, Vec<&'a Object>)>;

fn group_by_subject(graph: &Graph) -> Vec<(&Subject, PredicateGroup<'_>)> {
    let mut groups: Vec<(&Subject, PredicateGroup<'_>)> = Vec::new();
    let mut subject_index: HashMap<&Subject, usize> = HashMap::new();
    let mut predicate_index: HashMap<(usize, &NamedNode), usize> = HashMap::new();

    for triple in graph.triples() {
        let s = *subject_index.entry(&triple.subject).or_insert_with(|| {
            groups.push((&triple.subject, Vec::new()));
            groups.len() - 1
        });
        let predicates = &mut groups[s].1;
        match predicate_index.get(&(s, &triple.predicate)) {
            Some(&p) => predicates[p].1.push(&triple.object),
            None => {
                predicate_index.insert((s, &triple.predicate), predicates.len());
                predicates.push((&triple.predicate, vec![&triple.object]));
            }
        }
    }
    groups
}

fn subject_term(subject: &Subject, used: &mut BTreeSet<&'static str>) -> String {
    match subject {
        Subject::Named(n) => iri_term(&n.iri, used),
        Subject::Blank(b) => blank_term(b),
    }
}

fn object_term(object: &Object, used: &mut BTreeSet<&'static str>) -> String {
    match object {
        Object::Named(n) => iri_term(&n.iri, used),
        Object::Blank(b) => blank_term(b),
        Object::Literal(l) => literal_term(l, used),
    }
}

fn literal_term(literal: &Literal, used: &mut BTreeSet<&'static str>) -> String {
    let quoted = format!("\"{}\"", escape_string(&literal.value));
    // A malformed tag would make the whole document unparseable.
    if let Some(lang) = literal.language.as_deref().filter(|l| is_language_tag(l)) {
        format!("{quoted}@{lang}")
    } else if literal.language.is_some() {
        quoted
    } else if literal.datatype.iri == xsd::STRING {
        quoted
    } else {
        format!("{quoted}^^{}", iri_term(&literal.datatype.iri, used))
    }
}

fn blank_term(node: &BlankNode) -> String {
    let label: String = node
        .id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    format!("_:{label}")
}

fn iri_term(iri: &str, used: &mut BTreeSet<&'static str>) -> String {
    for &(prefix, ns) in PREFIXES {
        if let Some(local) = iri.strip_prefix(ns) {
            if is_simple_local_name(local) {
                used.insert(prefix);
                return format!("{prefix}:{local}");
            }
        }
    }
    format!("<{}>", escape_iri(iri))
}

fn is_simple_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c < '\u{0020}' => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

fn escape_iri(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len());
    for ch in iri.chars() {
        match ch {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | ' ' => {
                let _ = write!(out, "\\u{:04X}", ch as u32);
            }
            c if c < '\u{0020}' => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_by_subject_and_predicate() {
        let mut graph = Graph::new();
        let s = NamedNode::new("http://example.org/s");
        graph.add(Triple::new(s.clone(), NamedNode::new(rdf::TYPE), NamedNode::new(prov::ENTITY)));
        graph.add(Triple::new(s.clone(), NamedNode::new(rdfs::LABEL), Literal::new("one")));
        graph.add(Triple::new(s, NamedNode::new(rdfs::LABEL), Literal::new("two")));

        let ttl = to_turtle(&graph);
        assert_eq!(
            ttl,
            "@prefix prov: <http://www.w3.org/ns/prov#> .\n\
             @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
             \n\
             <http://example.org/s> a prov:Entity ;\n    rdfs:label \"one\", \"two\" .\n\n"
        );
    }

    #[test]
    fn test_typed_and_language_literals() {
        let mut graph = Graph::new();
        let s = BlankNode::new("b0");
        graph.add(Triple::new(
            s.clone(),
            NamedNode::new("http://example.org/n"),
            Literal::typed("4", NamedNode::new(xsd::INTEGER)),
        ));
        graph.add(Triple::new(
            s,
            NamedNode::new("http://example.org/t"),
            Literal::lang("hi", "en"),
        ));

        let ttl = to_turtle(&graph);
        assert!(ttl.contains("_:b0 <http://example.org/n> \"4\"^^xsd:integer"));
        assert!(ttl.contains("<http://example.org/t> \"hi\"@en"));
        assert!(ttl.starts_with("@prefix xsd:"));
    }

    #[test]
    fn test_malformed_language_tag_is_not_written() {
        let mut graph = Graph::new();
        graph.add(Triple::new(
            NamedNode::new("http://example.org/s"),
            NamedNode::new("http://example.org/t"),
            Literal::lang("x", "en fr"),
        ));
        graph.add(Triple::new(
            NamedNode::new("http://example.org/s"),
            NamedNode::new("http://example.org/d"),
            Literal::typed("2020-01-01", NamedNode::new(format!("{}date", xsd::NS))),
        ));

        let ttl = to_turtle(&graph);
        assert!(ttl.contains("<http://example.org/t> \"x\""));
        assert!(!ttl.contains("@en"));
        assert!(ttl.contains("\"2020-01-01\"^^xsd:date"));
    }

    #[test]
    fn test_grouping_many_subjects_keeps_first_seen_order() {
        let mut graph = Graph::new();
        for i in 0..5_000 {
            for p in ["a", "b"] {
                graph.add(Triple::new(
                    NamedNode::new(format!("http://example.org/s{i}")),
                    NamedNode::new(format!("http://example.org/{p}")),
                    Literal::new(format!("{i}")),
                ));
            }
        }

        let ttl = to_turtle(&graph);
        assert!(ttl.starts_with(
            "<http://example.org/s0> <http://example.org/a> \"0\" ;\n    <http://example.org/b> \"0\" .\n\n"
        ));
        assert!(ttl.ends_with("<http://example.org/b> \"4999\" .\n\n"));
        assert_eq!(ttl.matches(" .\n\n").count(), 5_000);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(escape_string("a\"b\nc"), "a\\\"b\\nc");
        assert_eq!(escape_iri("http://x.org/a b"), "http://x.org/a\\u0020b");
    }

    #[test]
    fn test_empty_graph() {
        assert_eq!(to_turtle(&Graph::new()), "");
    }

    #[test]
    fn test_relative_iri_is_kept() {
        let mut graph = Graph::new();
        graph.add(Triple::new(
            NamedNode::new("#"),
            NamedNode::new(dct::FORMAT),
            Literal::new("text/turtle"),
        ));
        assert!(to_turtle(&graph).contains("<#> dct:format \"text/turtle\" ."));
    }
}
