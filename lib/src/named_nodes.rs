use oxigraph::model::{NamedNode, NamedNodeRef};

pub struct RDF {
    pub type_: NamedNodeRef<'static>, // `type` is a reserved keyword in Rust
    pub property: NamedNodeRef<'static>,
}

impl RDF {
    pub fn new() -> Self {
        RDF {
            type_: NamedNodeRef::new_unchecked(
                "http://www.w3.org/1999/02/22-rdf-syntax-ns#type",
            ),
            property: NamedNodeRef::new_unchecked(
                "http://www.w3.org/1999/02/22-rdf-syntax-ns#Property",
            ),
        }
    }
}

pub struct RDFS {
    pub class: NamedNodeRef<'static>,
    pub sub_class_of: NamedNodeRef<'static>,
    pub domain: NamedNodeRef<'static>,
    pub range: NamedNodeRef<'static>,
}

impl RDFS {
    pub fn new() -> Self {
        RDFS {
            class: NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#Class"),
            sub_class_of: NamedNodeRef::new_unchecked(
                "http://www.w3.org/2000/01/rdf-schema#subClassOf",
            ),
            domain: NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#domain"),
            range: NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#range"),
        }
    }
}

pub struct OWL {
    pub class: NamedNodeRef<'static>,
    pub object_property: NamedNodeRef<'static>,
    pub datatype_property: NamedNodeRef<'static>,
}

impl OWL {
    pub fn new() -> Self {
        OWL {
            class: NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Class"),
            object_property: NamedNodeRef::new_unchecked(
                "http://www.w3.org/2002/07/owl#ObjectProperty",
            ),
            datatype_property: NamedNodeRef::new_unchecked(
                "http://www.w3.org/2002/07/owl#DatatypeProperty",
            ),
        }
    }
}

pub struct SHACL {
    pub node_shape: NamedNodeRef<'static>,
    pub target_class: NamedNodeRef<'static>,
    pub property: NamedNodeRef<'static>,
    pub path: NamedNodeRef<'static>,
    pub min_count: NamedNodeRef<'static>,
    pub max_count: NamedNodeRef<'static>,
    pub datatype: NamedNodeRef<'static>,
    pub class: NamedNodeRef<'static>,
}

impl SHACL {
    pub fn new() -> Self {
        SHACL {
            node_shape: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#NodeShape"),
            target_class: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#targetClass"),
            property: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#property"),
            path: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#path"),
            min_count: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#minCount"),
            max_count: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#maxCount"),
            datatype: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#datatype"),
            class: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#class"),
        }
    }
}

pub const DEFAULT_FUNCTION_NAMESPACE: &str = "http://cns.io/ontology#";

/// Performance annotations for ontology-declared functions. The namespace is
/// configurable, so the terms are owned rather than `'static`.
pub struct PERF {
    pub function: NamedNode,
    pub cycle_cost: NamedNode,
    pub performance_tier: NamedNode,
    pub api_signature: NamedNode,
}

impl PERF {
    pub fn new(namespace: &str) -> Result<Self, String> {
        let term = |local: &str| {
            NamedNode::new(format!("{namespace}{local}"))
                .map_err(|err| format!("invalid function namespace {namespace:?}: {err}"))
        };
        Ok(PERF {
            function: term("Function")?,
            cycle_cost: term("cycleCost")?,
            performance_tier: term("performanceTier")?,
            api_signature: term("apiSignature")?,
        })
    }
}

/// Every term the ontology extractor matches against.
pub struct Vocabulary {
    pub rdf: RDF,
    pub rdfs: RDFS,
    pub owl: OWL,
    pub sh: SHACL,
    pub perf: PERF,
}

impl Vocabulary {
    pub fn new(function_namespace: &str) -> Result<Self, String> {
        Ok(Vocabulary {
            rdf: RDF::new(),
            rdfs: RDFS::new(),
            owl: OWL::new(),
            sh: SHACL::new(),
            perf: PERF::new(function_namespace)?,
        })
    }

    pub fn is_class_kind(&self, kind: NamedNodeRef<'_>) -> bool {
        kind == self.owl.class || kind == self.rdfs.class
    }

    pub fn is_property_kind(&self, kind: NamedNodeRef<'_>) -> bool {
        kind == self.rdf.property
            || kind == self.owl.object_property
            || kind == self.owl.datatype_property
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_terms_follow_namespace() {
        let vocab = Vocabulary::new("http://example.com/perf#").expect("valid namespace");
        assert_eq!(
            vocab.perf.function.as_str(),
            "http://example.com/perf#Function"
        );
        assert_eq!(
            vocab.perf.cycle_cost.as_str(),
            "http://example.com/perf#cycleCost"
        );
    }

    #[test]
    fn invalid_namespace_is_rejected() {
        assert!(Vocabulary::new("not an iri ").is_err());
    }

    #[test]
    fn both_class_idioms_are_recognized() {
        let vocab = Vocabulary::new(DEFAULT_FUNCTION_NAMESPACE).expect("valid namespace");
        assert!(vocab.is_class_kind(vocab.owl.class));
        assert!(vocab.is_class_kind(vocab.rdfs.class));
        assert!(!vocab.is_class_kind(vocab.rdf.property));
        assert!(vocab.is_property_kind(vocab.owl.object_property));
    }
}
