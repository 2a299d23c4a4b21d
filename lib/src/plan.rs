//! Lowering of an ID-allocated [`CompilationModel`] into an [`EmitPlan`]: the
//! backend-neutral list of every item the code generators render.
//!
//! All cross-references are resolved here. An item whose reference cannot be
//! resolved (a subclass edge to an undeclared parent, a shape constraint on an
//! unknown property, ...) is left out with a diagnostic; nothing else is
//! affected.

use crate::ids::IdRanges;
use crate::model::{
    entity_key, CompilationModel, Diagnostic, Entity, ParameterSpec, Phase, PropertyClassEdge,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitPlan {
    pub meta: PlanMeta,
    pub classes: Vec<IdConstant>,
    pub properties: Vec<IdConstant>,
    pub subclass_rules: Vec<SubclassRule>,
    pub domain_rules: Vec<MembershipRule>,
    pub range_rules: Vec<MembershipRule>,
    pub function_budgets: Vec<FunctionBudget>,
    pub validators: Vec<ShapeValidator>,
    pub queries: Vec<QueryStub>,
}

impl EmitPlan {
    pub fn to_json_pretty(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize emit plan: {err}"))
    }

    /// Number of generated inference predicates, not counting the fixed
    /// range/hash utilities.
    pub fn rule_count(&self) -> usize {
        self.subclass_rules.len() + self.domain_rules.len() + self.range_rules.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMeta {
    pub compiler_version: String,
    pub ranges: IdRanges,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdConstant {
    pub name: String,
    pub id: u32,
    pub local_name: String,
    pub source_uri: String,
}

/// `child rdfs:subClassOf parent`, checked by exact ID equality with the child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubclassRule {
    pub fn_name: String,
    pub child: String,
    pub parent: String,
    pub child_const: String,
}

/// Domain or range membership of one class for one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRule {
    pub fn_name: String,
    pub property: String,
    pub class: String,
    pub class_const: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionBudget {
    pub const_name: String,
    pub function: String,
    pub cycles: u32,
    pub tier: Option<String>,
    pub api_signature: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Ok,
    MinCount,
    MaxCount,
    Datatype,
    Class,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 5] = [
        ErrorCode::Ok,
        ErrorCode::MinCount,
        ErrorCode::MaxCount,
        ErrorCode::Datatype,
        ErrorCode::Class,
    ];

    pub fn code(self) -> u32 {
        match self {
            ErrorCode::Ok => 0,
            ErrorCode::MinCount => 1,
            ErrorCode::MaxCount => 2,
            ErrorCode::Datatype => 3,
            ErrorCode::Class => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Ok => "OK",
            ErrorCode::MinCount => "MIN_COUNT",
            ErrorCode::MaxCount => "MAX_COUNT",
            ErrorCode::Datatype => "DATATYPE",
            ErrorCode::Class => "CLASS",
        }
    }

    /// Variant name in generated Rust.
    pub fn variant_name(self) -> &'static str {
        match self {
            ErrorCode::Ok => "Ok",
            ErrorCode::MinCount => "MinCount",
            ErrorCode::MaxCount => "MaxCount",
            ErrorCode::Datatype => "Datatype",
            ErrorCode::Class => "Class",
        }
    }
}

/// Cardinality bounds of one property constraint. The count is fetched once
/// and the minimum is checked before the maximum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountCheck {
    pub property: String,
    pub property_const: String,
    pub property_id: u32,
    pub min_count: Option<u32>,
    pub max_count: Option<u32>,
    pub min_message: String,
    pub max_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeValidator {
    pub fn_name: String,
    pub shape: String,
    pub target_class: Option<String>,
    pub checks: Vec<CountCheck>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStub {
    pub name: String,
    pub fn_name: String,
    pub sql_const: String,
    /// Name of the parameter record; `None` when the query takes no parameters.
    pub params_type: Option<String>,
    pub sql: String,
    pub params: Vec<ParameterSpec>,
}

/// Hands out identifiers, suffixing `_2`, `_3`, ... on collision.
#[derive(Default)]
struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    fn claim(&mut self, base: String) -> String {
        if self.taken.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Uppercase identifier fragment for an entity key. Characters outside
/// `[A-Za-z0-9_]` become `_`, and a leading digit gets a `_` prefix.
pub(crate) fn ident_fragment(key: &str) -> String {
    let mut fragment: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if fragment.is_empty() || fragment.starts_with(|c: char| c.is_ascii_digit()) {
        fragment.insert(0, '_');
    }
    fragment
}

/// Unique identifier fragment per key, claimed in key order.
fn fragments<'a>(keys: impl Iterator<Item = &'a String>) -> BTreeMap<String, String> {
    let mut names = UniqueNames::default();
    keys.map(|key| (key.clone(), names.claim(ident_fragment(key))))
        .collect()
}

/// Fragment of a declared entity that has an allocated ID.
fn resolve<'a>(
    fragments: &'a BTreeMap<String, String>,
    id: Option<u32>,
    local_name: &str,
) -> Option<&'a str> {
    id?;
    fragments.get(&entity_key(local_name)).map(String::as_str)
}

pub(crate) fn pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn class_const(fragment: &str) -> String {
    format!("{fragment}_CLASS")
}

fn property_const(fragment: &str) -> String {
    format!("{fragment}_PROPERTY")
}

/// Name of a query's parameter record. Prefixed with `Q` when the PascalCase
/// form would not start with a letter or `_`.
fn params_type_name(query_name: &str) -> String {
    let base = pascal_case(query_name);
    if base.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        format!("{base}Params")
    } else {
        format!("Q{base}Params")
    }
}

/// Lowers the model. Returns the plan plus the diagnostics for every item that
/// had to be left out.
pub fn lower_model(model: &CompilationModel, ranges: &IdRanges) -> (EmitPlan, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    let class_names = fragments(model.classes.keys());
    let property_names = fragments(model.properties.keys());
    let classes = id_constants(&model.classes, &class_names, class_const);
    let properties = id_constants(&model.properties, &property_names, property_const);

    let mut subclass_rules: BTreeMap<String, SubclassRule> = BTreeMap::new();
    for edge in &model.subclass_edges {
        let (Some(child), Some(parent)) = (
            resolve(&class_names, model.class_id(&edge.child), &edge.child),
            resolve(&class_names, model.class_id(&edge.parent), &edge.parent),
        ) else {
            diagnostics.push(Diagnostic::warn(
                Phase::GenerateHeaders,
                format!("{} subClassOf {}", edge.child, edge.parent),
                "skipping subclass predicate: both classes need an allocated id",
            ));
            continue;
        };
        let fn_name = format!(
            "is_{}_subclass_of_{}",
            child.to_lowercase(),
            parent.to_lowercase()
        );
        subclass_rules.entry(fn_name.clone()).or_insert(SubclassRule {
            fn_name,
            child: edge.child.clone(),
            parent: edge.parent.clone(),
            child_const: class_const(child),
        });
    }

    let names = EntityNames {
        classes: &class_names,
        properties: &property_names,
    };
    let domain_rules =
        membership_rules(model, &names, &model.domain_edges, "domain", &mut diagnostics);
    let range_rules =
        membership_rules(model, &names, &model.range_edges, "range", &mut diagnostics);

    let function_names = fragments(model.functions.keys());
    let function_budgets = model
        .functions
        .iter()
        .map(|(key, function)| FunctionBudget {
            const_name: format!("{}_CYCLE_BUDGET", function_names[key]),
            function: function.name.clone(),
            cycles: function.cycle_cost_estimate,
            tier: function.performance_tier.clone(),
            api_signature: function.api_signature.clone(),
        })
        .collect();

    let shape_names = fragments(model.shapes.keys());
    let validators = model
        .shapes
        .iter()
        .map(|(key, shape)| {
            let mut checks = Vec::new();
            for constraint in &shape.constraints {
                let property_id = model.property_id(&constraint.path);
                let (Some(property_id), Some(property)) = (
                    property_id,
                    resolve(&property_names, property_id, &constraint.path),
                ) else {
                    diagnostics.push(Diagnostic::warn(
                        Phase::GenerateHeaders,
                        format!("{}.{}", shape.name, constraint.path),
                        "skipping constraint: property has no allocated id",
                    ));
                    continue;
                };
                let min_count = constraint.min_count.filter(|min| *min > 0);
                let max_count = constraint.max_count;
                if min_count.is_none() && max_count.is_none() {
                    continue;
                }
                checks.push(CountCheck {
                    property: constraint.path.clone(),
                    property_const: property_const(property),
                    property_id,
                    min_count,
                    max_count,
                    min_message: format!(
                        "{}: {} requires at least {} value(s)",
                        shape.name,
                        constraint.path,
                        min_count.unwrap_or(0)
                    ),
                    max_message: format!(
                        "{}: {} allows at most {} value(s)",
                        shape.name,
                        constraint.path,
                        max_count.unwrap_or(0)
                    ),
                });
            }
            ShapeValidator {
                fn_name: format!("validate_{}", shape_names[key].to_lowercase()),
                shape: shape.name.clone(),
                target_class: shape.target_class.clone(),
                checks,
            }
        })
        .collect();

    let mut sql_consts = UniqueNames::default();
    let mut params_types = UniqueNames::default();
    let queries = model
        .queries
        .values()
        .map(|query| QueryStub {
            name: query.name.clone(),
            fn_name: format!("execute_{}", query.name),
            sql_const: sql_consts.claim(format!("{}_SQL", query.name.to_uppercase())),
            params_type: (!query.parameters.is_empty())
                .then(|| params_types.claim(params_type_name(&query.name))),
            sql: query.sql_text.clone(),
            params: query.parameters.clone(),
        })
        .collect();

    let plan = EmitPlan {
        meta: PlanMeta {
            compiler_version: env!("CARGO_PKG_VERSION").to_string(),
            ranges: *ranges,
        },
        classes,
        properties,
        subclass_rules: subclass_rules.into_values().collect(),
        domain_rules,
        range_rules,
        function_budgets,
        validators,
        queries,
    };
    (plan, diagnostics)
}

fn id_constants(
    entities: &BTreeMap<String, Entity>,
    fragments: &BTreeMap<String, String>,
    const_name: fn(&str) -> String,
) -> Vec<IdConstant> {
    let mut constants: Vec<IdConstant> = entities
        .iter()
        .filter_map(|(key, entity)| {
            Some(IdConstant {
                name: const_name(fragments.get(key)?),
                id: entity.numeric_id?,
                local_name: entity.local_name.clone(),
                source_uri: entity.source_uri.clone(),
            })
        })
        .collect();
    constants.sort_by_key(|constant| constant.id);
    constants
}

struct EntityNames<'a> {
    classes: &'a BTreeMap<String, String>,
    properties: &'a BTreeMap<String, String>,
}

fn membership_rules(
    model: &CompilationModel,
    names: &EntityNames<'_>,
    edges: &BTreeSet<PropertyClassEdge>,
    relation: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<MembershipRule> {
    let mut rules: BTreeMap<String, MembershipRule> = BTreeMap::new();
    for edge in edges {
        let (Some(property), Some(class)) = (
            resolve(names.properties, model.property_id(&edge.property), &edge.property),
            resolve(names.classes, model.class_id(&edge.class), &edge.class),
        ) else {
            diagnostics.push(Diagnostic::warn(
                Phase::GenerateHeaders,
                format!("{} {relation} {}", edge.property, edge.class),
                format!("skipping {relation} predicate: property or class has no allocated id"),
            ));
            continue;
        };
        let fn_name = format!(
            "{}_{relation}_includes_{}",
            property.to_lowercase(),
            class.to_lowercase()
        );
        rules.entry(fn_name.clone()).or_insert(MembershipRule {
            fn_name,
            property: edge.property.clone(),
            class: edge.class.clone(),
            class_const: class_const(class),
        });
    }
    rules.into_values().collect()
}
