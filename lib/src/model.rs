//! The compilation model: everything extracted from the ontology and SQL
//! sources, threaded by reference through each compiler phase.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

/// Budget assumed for a function that declares no (or an unparsable) cycle cost.
pub const DEFAULT_CYCLE_COST: u32 = 7;

/// The key an entity is stored under: its uppercased local name. Generated
/// identifiers are derived from the key later, at lowering time.
pub fn entity_key(local_name: &str) -> String {
    local_name.to_uppercase()
}

/// A class or property. `numeric_id` stays `None` until the ID allocator runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub local_name: String,
    pub numeric_id: Option<u32>,
    pub source_uri: String,
}

pub type ClassEntity = Entity;
pub type PropertyEntity = Entity;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubclassEdge {
    pub child: String,
    pub parent: String,
}

/// `rdfs:domain` / `rdfs:range` edge between a property and a class.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyClassEdge {
    pub property: String,
    pub class: String,
}

pub type DomainEdge = PropertyClassEdge;
pub type RangeEdge = PropertyClassEdge;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    pub api_signature: Option<String>,
    pub cycle_cost_estimate: u32,
    pub performance_tier: Option<String>,
}

impl FunctionRecord {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionRecord {
            name: name.into(),
            api_signature: None,
            cycle_cost_estimate: DEFAULT_CYCLE_COST,
            performance_tier: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyConstraint {
    pub path: String,
    pub min_count: Option<u32>,
    pub max_count: Option<u32>,
    pub datatype: Option<String>,
    pub class_constraint: Option<String>,
}

impl PropertyConstraint {
    pub fn new(path: impl Into<String>) -> Self {
        PropertyConstraint {
            path: path.into(),
            min_count: None,
            max_count: None,
            datatype: None,
            class_constraint: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub name: String,
    pub target_class: Option<String>,
    pub constraints: Vec<PropertyConstraint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    Integer,
    Float,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub inferred_type: ParamType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlQueryRecord {
    pub name: String,
    pub sql_text: String,
    pub parameters: Vec<ParameterSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    ParseOntologies,
    ParseSql,
    GenerateHeaders,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::ParseOntologies => "parse-ontologies",
            Phase::ParseSql => "parse-sql",
            Phase::GenerateHeaders => "generate-headers",
        };
        f.write_str(name)
    }
}

/// A recoverable problem: the affected document or item was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub phase: Phase,
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    /// Builds the diagnostic and reports it on the `warn` log level.
    pub fn warn(phase: Phase, subject: impl Into<String>, message: impl Into<String>) -> Self {
        let diagnostic = Diagnostic {
            phase,
            subject: subject.into(),
            message: message.into(),
        };
        warn!("{diagnostic}");
        diagnostic
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.phase, self.subject, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceStats {
    pub ontology_parse: Duration,
    pub sql_parse: Duration,
    pub generation: Duration,
    pub documents_loaded: usize,
    pub documents_skipped: usize,
    pub class_count: usize,
    pub property_count: usize,
    pub function_count: usize,
    pub rule_count: usize,
    pub shape_count: usize,
    pub query_count: usize,
    pub diagnostic_count: usize,
}

impl PerformanceStats {
    pub fn summary(&self) -> String {
        format!(
            "{} classes, {} properties, {} functions, {} rules, {} shapes, {} queries \
             ({} warnings); parse {:.2?} ontology + {:.2?} sql, generate {:.2?}",
            self.class_count,
            self.property_count,
            self.function_count,
            self.rule_count,
            self.shape_count,
            self.query_count,
            self.diagnostic_count,
            self.ontology_parse,
            self.sql_parse,
            self.generation,
        )
    }
}

/// Aggregate root of one compilation. Built empty per invocation, filled by the
/// extractors, annotated by the allocator, then only read by the emitters.
#[derive(Debug, Clone, Default)]
pub struct CompilationModel {
    pub classes: BTreeMap<String, ClassEntity>,
    pub properties: BTreeMap<String, PropertyEntity>,
    pub subclass_edges: BTreeSet<SubclassEdge>,
    pub domain_edges: BTreeSet<DomainEdge>,
    pub range_edges: BTreeSet<RangeEdge>,
    pub functions: BTreeMap<String, FunctionRecord>,
    pub shapes: BTreeMap<String, ShapeRecord>,
    pub queries: BTreeMap<String, SqlQueryRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: PerformanceStats,
}

impl CompilationModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a class; a later declaration with the same key replaces the
    /// earlier one.
    pub fn declare_class(&mut self, local_name: &str, source_uri: &str) {
        declare(&mut self.classes, "class", local_name, source_uri);
    }

    pub fn declare_property(&mut self, local_name: &str, source_uri: &str) {
        declare(&mut self.properties, "property", local_name, source_uri);
    }

    pub fn add_function(&mut self, function: FunctionRecord) {
        self.functions.insert(entity_key(&function.name), function);
    }

    pub fn add_shape(&mut self, shape: ShapeRecord) {
        self.shapes.insert(entity_key(&shape.name), shape);
    }

    /// Last definition of a query name wins.
    pub fn add_query(&mut self, query: SqlQueryRecord) {
        if let Some(previous) = self.queries.insert(query.name.clone(), query) {
            debug!("query {} redefined; keeping the later definition", previous.name);
        }
    }

    pub fn class(&self, local_name: &str) -> Option<&ClassEntity> {
        self.classes.get(&entity_key(local_name))
    }

    pub fn property(&self, local_name: &str) -> Option<&PropertyEntity> {
        self.properties.get(&entity_key(local_name))
    }

    pub fn class_id(&self, local_name: &str) -> Option<u32> {
        self.class(local_name).and_then(|entity| entity.numeric_id)
    }

    pub fn property_id(&self, local_name: &str) -> Option<u32> {
        self.property(local_name).and_then(|entity| entity.numeric_id)
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

fn declare(
    entities: &mut BTreeMap<String, Entity>,
    category: &str,
    local_name: &str,
    source_uri: &str,
) {
    let entity = Entity {
        local_name: local_name.to_string(),
        numeric_id: None,
        source_uri: source_uri.to_string(),
    };
    if let Some(previous) = entities.insert(entity_key(local_name), entity) {
        if previous.source_uri != source_uri {
            debug!(
                "{category} {local_name} redeclared: {} replaces {}",
                source_uri, previous.source_uri
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_key_only_uppercases() {
        assert_eq!(entity_key("Person"), "PERSON");
        assert_eq!(entity_key("hasName"), "HASNAME");
        assert_eq!(entity_key("has-name.v2"), "HAS-NAME.V2");
        assert_eq!(entity_key("Café"), "CAFÉ");
    }

    #[test]
    fn names_differing_in_punctuation_stay_distinct() {
        let mut model = CompilationModel::new();
        model.declare_class("Café", "http://example.com/onto#Café");
        model.declare_class("Cafè", "http://example.com/onto#Cafè");
        model.declare_property("has-name", "http://example.com/onto#has-name");
        model.declare_property("has_name", "http://example.com/onto#has_name");

        assert_eq!(model.classes.len(), 2);
        assert_eq!(model.properties.len(), 2);
        assert_eq!(
            model.property("has-name").map(|p| p.source_uri.as_str()),
            Some("http://example.com/onto#has-name")
        );
    }

    #[test]
    fn last_class_declaration_wins() {
        let mut model = CompilationModel::new();
        model.declare_class("Person", "http://a.example/Person");
        model.declare_class("PERSON", "http://b.example/PERSON");

        assert_eq!(model.classes.len(), 1);
        let person = model.class("person").expect("class is keyed case-insensitively");
        assert_eq!(person.local_name, "PERSON");
        assert_eq!(person.source_uri, "http://b.example/PERSON");
    }

    #[test]
    fn last_query_definition_wins() {
        let mut model = CompilationModel::new();
        for text in ["SELECT 1", "SELECT 2"] {
            model.add_query(SqlQueryRecord {
                name: "q".to_string(),
                sql_text: text.to_string(),
                parameters: Vec::new(),
            });
        }
        assert_eq!(model.queries.len(), 1);
        assert_eq!(model.queries["q"].sql_text, "SELECT 2");
    }

    #[test]
    fn ids_are_absent_until_allocated() {
        let mut model = CompilationModel::new();
        model.declare_property("hasName", "http://example.com/hasName");
        assert!(model.property("hasName").is_some());
        assert_eq!(model.property_id("hasName"), None);
    }

    #[test]
    fn summary_mentions_counts() {
        let stats = PerformanceStats {
            class_count: 3,
            query_count: 2,
            ..PerformanceStats::default()
        };
        let summary = stats.summary();
        assert!(summary.contains("3 classes"));
        assert!(summary.contains("2 queries"));
    }
}
