//! Ontology extraction: loads every recognized document of an ontology
//! directory and turns the resulting triples into model records.

use crate::error::CompileError;
use crate::model::{
    CompilationModel, Diagnostic, FunctionRecord, Phase, PropertyClassEdge, PropertyConstraint,
    ShapeRecord, SubclassEdge, DEFAULT_CYCLE_COST,
};
use crate::named_nodes::Vocabulary;
use crate::store::{format_for_path, parse_document, TripleStore};
use log::debug;
use oxigraph::model::{NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Term, TermRef};
use std::fs;
use std::path::{Path, PathBuf};

/// Local name of an IRI: the fragment after `#`, else the last path segment
/// after `/`. Empty fragments and segments count as absent.
pub fn iri_local_name(iri: &str) -> Option<&str> {
    if let Some((_, fragment)) = iri.rsplit_once('#') {
        if !fragment.is_empty() {
            return Some(fragment);
        }
    }
    let base = iri.split('#').next().unwrap_or(iri);
    match base.rsplit_once('/') {
        Some((_, segment)) if !segment.is_empty() => Some(segment),
        _ => None,
    }
}

/// Local name of a graph node. Only IRIs have one.
pub fn extract_local_name(node: TermRef<'_>) -> Option<String> {
    match node {
        TermRef::NamedNode(named) => iri_local_name(named.as_str()).map(str::to_string),
        _ => None,
    }
}

fn subject_local_name(subject: &NamedOrBlankNode) -> Option<String> {
    match subject {
        NamedOrBlankNode::NamedNode(named) => iri_local_name(named.as_str()).map(str::to_string),
        _ => None,
    }
}

fn subject_uri(subject: &NamedOrBlankNode) -> String {
    match subject {
        NamedOrBlankNode::NamedNode(named) => named.as_str().to_string(),
        other => other.to_string(),
    }
}

fn as_subject(term: &Term) -> Option<NamedOrBlankNodeRef<'_>> {
    match term {
        Term::NamedNode(named) => Some(named.as_ref().into()),
        Term::BlankNode(blank) => Some(blank.as_ref().into()),
        _ => None,
    }
}

fn literal_value(term: &Term) -> Option<&str> {
    match term {
        Term::Literal(literal) => Some(literal.value()),
        _ => None,
    }
}

fn parse_count(term: &Term) -> Option<u32> {
    literal_value(term).and_then(|value| value.trim().parse::<u32>().ok())
}

/// Outcome of loading an ontology directory.
#[derive(Debug, Default)]
pub struct LoadedOntology {
    pub store: TripleStore,
    pub documents_loaded: usize,
    pub documents_skipped: usize,
}

/// Lists the recognized ontology documents of `dir` in sorted order.
pub fn ontology_documents(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, CompileError> {
    let entries = fs::read_dir(dir).map_err(|source| CompileError::OntologySource {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CompileError::OntologySource {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && format_for_path(&path, extensions).is_some() {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

/// Parses every document; a document that fails to parse is skipped with a
/// diagnostic and the rest are still loaded.
pub fn load_ontology_dir(
    dir: &Path,
    extensions: &[String],
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<LoadedOntology, CompileError> {
    let mut loaded = LoadedOntology::default();
    for path in ontology_documents(dir, extensions)? {
        let Some(format) = format_for_path(&path, extensions) else {
            continue;
        };
        match parse_document(&path, format) {
            Ok(triples) => {
                debug!("loaded {} triples from {}", triples.len(), path.display());
                loaded.store.extend(triples);
                loaded.documents_loaded += 1;
            }
            Err(err) => {
                diagnostics.push(Diagnostic::warn(
                    Phase::ParseOntologies,
                    path.display().to_string(),
                    format!("skipping malformed document: {err}"),
                ));
                loaded.documents_skipped += 1;
            }
        }
    }
    Ok(loaded)
}

/// Walks the triples and records every class, property, edge, function and
/// shape they declare.
pub struct OntologyExtractor<'a> {
    store: &'a TripleStore,
    vocab: &'a Vocabulary,
}

impl<'a> OntologyExtractor<'a> {
    pub fn new(store: &'a TripleStore, vocab: &'a Vocabulary) -> Self {
        OntologyExtractor { store, vocab }
    }

    pub fn extract_into(&self, model: &mut CompilationModel) {
        self.extract_classes(model);
        self.extract_properties(model);
        self.extract_edges(model);
        self.extract_functions(model);
        self.extract_shapes(model);
    }

    fn extract_classes(&self, model: &mut CompilationModel) {
        let vocab = self.vocab;
        for triple in self
            .store
            .typed_subjects(vocab.rdf.type_, |kind| vocab.is_class_kind(kind))
        {
            match subject_local_name(&triple.subject) {
                Some(name) => model.declare_class(&name, &subject_uri(&triple.subject)),
                None => debug!("skipping class without a local name: {}", triple.subject),
            }
        }
    }

    fn extract_properties(&self, model: &mut CompilationModel) {
        let vocab = self.vocab;
        for triple in self
            .store
            .typed_subjects(vocab.rdf.type_, |kind| vocab.is_property_kind(kind))
        {
            match subject_local_name(&triple.subject) {
                Some(name) => model.declare_property(&name, &subject_uri(&triple.subject)),
                None => debug!("skipping property without a local name: {}", triple.subject),
            }
        }
    }

    fn extract_edges(&self, model: &mut CompilationModel) {
        for (child, parent) in self.named_pairs(self.vocab.rdfs.sub_class_of) {
            model.subclass_edges.insert(SubclassEdge { child, parent });
        }
        for (property, class) in self.named_pairs(self.vocab.rdfs.domain) {
            model
                .domain_edges
                .insert(PropertyClassEdge { property, class });
        }
        for (property, class) in self.named_pairs(self.vocab.rdfs.range) {
            model.range_edges.insert(PropertyClassEdge { property, class });
        }
    }

    /// `(subject, object)` local names of every `?s predicate ?o` where both
    /// ends have one.
    fn named_pairs(&self, predicate: NamedNodeRef<'_>) -> Vec<(String, String)> {
        self.store
            .triples_matching(None, Some(predicate), None)
            .filter_map(|triple| {
                let subject = subject_local_name(&triple.subject)?;
                let object = extract_local_name(triple.object.as_ref())?;
                Some((subject, object))
            })
            .collect()
    }

    fn extract_functions(&self, model: &mut CompilationModel) {
        let perf = &self.vocab.perf;
        let function_kind = perf.function.as_ref();
        for triple in self
            .store
            .typed_subjects(self.vocab.rdf.type_, move |kind| kind == function_kind)
        {
            let Some(name) = subject_local_name(&triple.subject) else {
                debug!("skipping function without a local name: {}", triple.subject);
                continue;
            };
            let subject = triple.subject.as_ref();
            let mut function = FunctionRecord::new(name);

            let declared_cost = self.store.objects(subject, perf.cycle_cost.as_ref()).last();
            function.cycle_cost_estimate = declared_cost
                .and_then(parse_count)
                .unwrap_or(DEFAULT_CYCLE_COST);
            function.performance_tier = self
                .store
                .objects(subject, perf.performance_tier.as_ref())
                .filter_map(|tier| {
                    extract_local_name(tier.as_ref())
                        .or_else(|| literal_value(tier).map(str::to_string))
                })
                .last();
            function.api_signature = self
                .store
                .objects(subject, perf.api_signature.as_ref())
                .filter_map(|signature| literal_value(signature).map(str::to_string))
                .last();

            model.add_function(function);
        }
    }

    fn extract_shapes(&self, model: &mut CompilationModel) {
        let sh = &self.vocab.sh;
        let node_shape = sh.node_shape;
        for triple in self
            .store
            .typed_subjects(self.vocab.rdf.type_, move |kind| kind == node_shape)
        {
            let Some(name) = subject_local_name(&triple.subject) else {
                debug!("skipping shape without a local name: {}", triple.subject);
                continue;
            };
            let subject = triple.subject.as_ref();
            let target_class = self
                .store
                .objects(subject, sh.target_class)
                .filter_map(|class| extract_local_name(class.as_ref()))
                .last();
            let constraints = self
                .store
                .objects(subject, sh.property)
                .filter_map(as_subject)
                .filter_map(|node| self.property_constraint(&name, node))
                .collect();

            model.add_shape(ShapeRecord {
                name,
                target_class,
                constraints,
            });
        }
    }

    fn property_constraint(
        &self,
        shape: &str,
        node: NamedOrBlankNodeRef<'_>,
    ) -> Option<PropertyConstraint> {
        let sh = &self.vocab.sh;
        let last_local_name = |predicate| {
            self.store
                .objects(node, predicate)
                .filter_map(|term| extract_local_name(term.as_ref()))
                .last()
        };
        let last_count = |predicate| self.store.objects(node, predicate).last().and_then(parse_count);

        let Some(path) = last_local_name(sh.path) else {
            debug!("shape {shape}: dropping property constraint without sh:path");
            return None;
        };
        Some(PropertyConstraint {
            path,
            min_count: last_count(sh.min_count),
            max_count: last_count(sh.max_count),
            datatype: last_local_name(sh.datatype),
            class_constraint: last_local_name(sh.class),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity_key;
    use crate::store::parse_bytes;
    use oxigraph::io::RdfFormat;
    use oxigraph::model::{Literal, NamedNode};

    const NS: &str = "http://cns.io/ontology#";

    fn extract(turtle: &str) -> CompilationModel {
        let mut store = TripleStore::new();
        store.extend(parse_bytes(turtle.as_bytes(), RdfFormat::Turtle).expect("valid turtle"));
        let vocab = Vocabulary::new(NS).expect("valid namespace");
        let mut model = CompilationModel::new();
        OntologyExtractor::new(&store, &vocab).extract_into(&mut model);
        model
    }

    const PREFIXES: &str = r#"
@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix cns: <http://cns.io/ontology#> .
@prefix ex: <http://example.com/onto#> .
"#;

    #[test]
    fn local_names_prefer_fragment_then_segment() {
        assert_eq!(iri_local_name("http://example.com/onto#Person"), Some("Person"));
        assert_eq!(iri_local_name("http://example.com/onto/Person"), Some("Person"));
        assert_eq!(iri_local_name("http://example.com/onto/Person#"), Some("Person"));
        assert_eq!(iri_local_name("http://example.com/onto/"), None);
        assert_eq!(iri_local_name("urn:isbn"), None);

        let literal = Literal::new_simple_literal("Person");
        assert_eq!(extract_local_name(literal.as_ref().into()), None);
        let named = NamedNode::new_unchecked("http://example.com/x#Thing");
        assert_eq!(extract_local_name(named.as_ref().into()), Some("Thing".to_string()));
    }

    #[test]
    fn classes_from_both_idioms_and_properties() {
        let model = extract(&format!(
            "{PREFIXES}
ex:Person a owl:Class .
ex:Agent a rdfs:Class .
ex:hasName a rdf:Property ; rdfs:domain ex:Person ; rdfs:range xsd:string .
ex:knows a owl:ObjectProperty .
[] a owl:Class .
"
        ));
        let classes: Vec<&str> = model.classes.keys().map(String::as_str).collect();
        assert_eq!(classes, vec!["AGENT", "PERSON"]);
        let properties: Vec<&str> = model.properties.keys().map(String::as_str).collect();
        assert_eq!(properties, vec!["HASNAME", "KNOWS"]);
        assert_eq!(
            model.class("Person").map(|c| c.source_uri.as_str()),
            Some("http://example.com/onto#Person")
        );
        assert!(model.domain_edges.contains(&PropertyClassEdge {
            property: "hasName".to_string(),
            class: "Person".to_string(),
        }));
        assert!(model.range_edges.contains(&PropertyClassEdge {
            property: "hasName".to_string(),
            class: "string".to_string(),
        }));
    }

    #[test]
    fn subclass_edges_are_recorded_even_for_undeclared_parents() {
        let model = extract(&format!(
            "{PREFIXES}
ex:Student a owl:Class ; rdfs:subClassOf ex:Person .
ex:Person a owl:Class ; rdfs:subClassOf ex:Ghost .
"
        ));
        assert_eq!(model.subclass_edges.len(), 2);
        assert!(model.subclass_edges.contains(&SubclassEdge {
            child: "Person".to_string(),
            parent: "Ghost".to_string(),
        }));
        assert!(model.class("Ghost").is_none());
    }

    #[test]
    fn function_cost_defaults_when_absent_or_unparsable() {
        let model = extract(&format!(
            "{PREFIXES}
ex:fastLookup a cns:Function ;
    cns:cycleCost 3 ;
    cns:performanceTier cns:L1 ;
    cns:apiSignature \"uint32_t fast_lookup(uint32_t)\" .
ex:slowScan a cns:Function ; cns:cycleCost \"lots\" .
ex:plain a cns:Function .
"
        ));
        let fast = &model.functions[&entity_key("fastLookup")];
        assert_eq!(fast.cycle_cost_estimate, 3);
        assert_eq!(fast.performance_tier.as_deref(), Some("L1"));
        assert_eq!(
            fast.api_signature.as_deref(),
            Some("uint32_t fast_lookup(uint32_t)")
        );
        assert_eq!(
            model.functions[&entity_key("slowScan")].cycle_cost_estimate,
            DEFAULT_CYCLE_COST
        );
        assert_eq!(
            model.functions[&entity_key("plain")].cycle_cost_estimate,
            DEFAULT_CYCLE_COST
        );
    }

    #[test]
    fn shapes_keep_constraint_order_and_drop_pathless_constraints() {
        let model = extract(&format!(
            "{PREFIXES}
ex:PersonShape a sh:NodeShape ;
    sh:targetClass ex:Agent ;
    sh:targetClass ex:Person ;
    sh:property [ sh:path ex:hasName ; sh:minCount 1 ; sh:maxCount 2 ; sh:datatype xsd:string ] ;
    sh:property [ sh:minCount 1 ] ;
    sh:property [ sh:path ex:knows ; sh:minCount -1 ; sh:class ex:Person ] .
"
        ));
        let shape = &model.shapes["PERSONSHAPE"];
        assert_eq!(shape.target_class.as_deref(), Some("Person"));
        assert_eq!(shape.constraints.len(), 2);

        let name = &shape.constraints[0];
        assert_eq!(name.path, "hasName");
        assert_eq!(name.min_count, Some(1));
        assert_eq!(name.max_count, Some(2));
        assert_eq!(name.datatype.as_deref(), Some("string"));

        let knows = &shape.constraints[1];
        assert_eq!(knows.path, "knows");
        assert_eq!(knows.min_count, None, "negative counts are dropped");
        assert_eq!(knows.class_constraint.as_deref(), Some("Person"));
    }
}
