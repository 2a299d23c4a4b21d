//! Triple collection backing ontology extraction.
//!
//! Documents are parsed with oxigraph's `RdfParser`. Triples keep the order in
//! which they were read, so "last declaration wins" follows document order, and
//! can be looked up by any combination of bound subject, predicate and object.

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{NamedNodeRef, NamedOrBlankNodeRef, Term, TermRef, Triple};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Picks the parser for an ontology document from its extension, if the
/// extension is one of `recognized`.
pub fn format_for_path(path: &Path, recognized: &[String]) -> Option<RdfFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())?;
    if !recognized
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(&extension))
    {
        return None;
    }
    match extension.as_str() {
        "ttl" | "turtle" => Some(RdfFormat::Turtle),
        "n3" => Some(RdfFormat::N3),
        "nt" => Some(RdfFormat::NTriples),
        "rdf" | "owl" | "xml" => Some(RdfFormat::RdfXml),
        _ => None,
    }
}

/// Parses one document completely. Nothing is returned unless the whole
/// document parses, so a malformed file contributes no triples at all.
pub fn parse_document(path: &Path, format: RdfFormat) -> Result<Vec<Triple>, String> {
    let bytes = fs::read(path).map_err(|err| format!("failed to read: {err}"))?;
    parse_bytes(&bytes, format)
}

pub fn parse_bytes(bytes: &[u8], format: RdfFormat) -> Result<Vec<Triple>, String> {
    let parser = RdfParser::from_format(format).without_named_graphs();
    let mut triples = Vec::new();
    for quad in parser.for_slice(bytes) {
        let quad = quad.map_err(|err| err.to_string())?;
        triples.push(Triple::new(quad.subject, quad.predicate, quad.object));
    }
    Ok(triples)
}

#[derive(Debug, Default)]
pub struct TripleStore {
    triples: Vec<Triple>,
    by_predicate: HashMap<String, Vec<usize>>,
}

impl TripleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn extend(&mut self, triples: impl IntoIterator<Item = Triple>) {
        for triple in triples {
            let index = self.triples.len();
            self.by_predicate
                .entry(triple.predicate.as_str().to_string())
                .or_default()
                .push(index);
            self.triples.push(triple);
        }
    }

    /// Triples matching every bound position, in load order.
    pub fn triples_matching<'a>(
        &'a self,
        subject: Option<NamedOrBlankNodeRef<'a>>,
        predicate: Option<NamedNodeRef<'a>>,
        object: Option<TermRef<'a>>,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        let indices: Vec<usize> = match predicate {
            Some(predicate) => self
                .by_predicate
                .get(predicate.as_str())
                .cloned()
                .unwrap_or_default(),
            None => (0..self.triples.len()).collect(),
        };
        indices
            .into_iter()
            .map(move |index| &self.triples[index])
            .filter(move |triple| {
                subject.map_or(true, |s| triple.subject.as_ref() == s)
                    && object.map_or(true, |o| triple.object.as_ref() == o)
            })
    }

    /// Objects of `subject predicate ?o`, in load order.
    pub fn objects<'a>(
        &'a self,
        subject: NamedOrBlankNodeRef<'a>,
        predicate: NamedNodeRef<'a>,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.triples_matching(Some(subject), Some(predicate), None)
            .map(|triple| &triple.object)
    }

    /// Subjects declared `rdf:type` of any kind accepted by `accept`, paired with
    /// the kind, in load order.
    pub fn typed_subjects<'a, F>(
        &'a self,
        rdf_type: NamedNodeRef<'a>,
        accept: F,
    ) -> impl Iterator<Item = &'a Triple> + 'a
    where
        F: Fn(NamedNodeRef<'_>) -> bool + 'a,
    {
        self.triples_matching(None, Some(rdf_type), None)
            .filter(move |triple| match triple.object.as_ref() {
                TermRef::NamedNode(kind) => accept(kind),
                _ => false,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::NamedNode;
    use std::path::PathBuf;

    const DOC: &str = r#"
@prefix ex: <http://example.com/> .
@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .

ex:a rdf:type ex:Thing ;
    ex:label "first" .
ex:b rdf:type ex:Thing .
ex:a ex:label "second" .
"#;

    fn store() -> TripleStore {
        let mut store = TripleStore::new();
        store.extend(parse_bytes(DOC.as_bytes(), RdfFormat::Turtle).expect("valid turtle"));
        store
    }

    #[test]
    fn lookups_by_each_bound_position() {
        let store = store();
        let a = NamedNode::new_unchecked("http://example.com/a");
        let label = NamedNode::new_unchecked("http://example.com/label");
        let thing = NamedNode::new_unchecked("http://example.com/Thing");

        assert_eq!(store.len(), 4);
        assert_eq!(
            store
                .triples_matching(Some(a.as_ref().into()), None, None)
                .count(),
            3
        );
        assert_eq!(
            store
                .triples_matching(None, None, Some(thing.as_ref().into()))
                .count(),
            2
        );
        assert_eq!(
            store
                .triples_matching(None, Some(label.as_ref()), None)
                .count(),
            2
        );
    }

    #[test]
    fn objects_keep_document_order() {
        let store = store();
        let a = NamedNode::new_unchecked("http://example.com/a");
        let label = NamedNode::new_unchecked("http://example.com/label");
        let values: Vec<String> = store
            .objects(a.as_ref().into(), label.as_ref())
            .filter_map(|term| match term {
                Term::Literal(literal) => Some(literal.value().to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec!["first", "second"]);
    }

    #[test]
    fn malformed_document_yields_error_and_no_triples() {
        let broken = "@prefix ex: <http://example.com/> .\nex:a ex:b ex:c .\nex:d ex:e";
        assert!(parse_bytes(broken.as_bytes(), RdfFormat::Turtle).is_err());
    }

    #[test]
    fn formats_follow_recognized_extensions() {
        let recognized = vec!["ttl".to_string(), "owl".to_string()];
        assert_eq!(
            format_for_path(&PathBuf::from("a/onto.TTL"), &recognized),
            Some(RdfFormat::Turtle)
        );
        assert_eq!(
            format_for_path(&PathBuf::from("a/onto.owl"), &recognized),
            Some(RdfFormat::RdfXml)
        );
        assert_eq!(format_for_path(&PathBuf::from("a/onto.nt"), &recognized), None);
        assert_eq!(format_for_path(&PathBuf::from("a/README"), &recognized), None);
    }
}
