//! Inference predicates over allocated IDs, category range checks, the ID
//! hash, and per-function cycle budgets.
//!
//! Subclass predicates test only the declared edge: `is_a_subclass_of_b(id)`
//! holds exactly for `A_CLASS`, not for subclasses of `A`.

use super::{
    c_comment_text, c_header, doc, ids, render_tokens_as_module, rust_ident, u32_lit, Backend,
};
use crate::plan::{EmitPlan, FunctionBudget, MembershipRule};
use proc_macro2::TokenStream;
use quote::quote;

/// Knuth's multiplicative hashing constant.
pub const HASH_MULTIPLIER: u32 = 2_654_435_761;

pub fn file_name(backend: Backend) -> &'static str {
    match backend {
        Backend::C => "ontology_rules.h",
        Backend::Rust => "rules.rs",
    }
}

pub fn generate(plan: &EmitPlan, backend: Backend) -> Result<String, String> {
    match backend {
        Backend::C => Ok(generate_c(plan)),
        Backend::Rust => generate_rust(plan),
    }
}

fn budget_note(budget: &FunctionBudget) -> String {
    let mut note = budget.function.clone();
    if let Some(tier) = &budget.tier {
        note.push_str(&format!(", tier {tier}"));
    }
    if let Some(signature) = &budget.api_signature {
        note.push_str(&format!(": {signature}"));
    }
    note
}

fn generate_c(plan: &EmitPlan) -> String {
    let mut body = String::new();

    if !plan.function_budgets.is_empty() {
        body.push_str("/* Cycle budgets */\n");
        for budget in &plan.function_budgets {
            body.push_str(&format!(
                "#define {} {}u /* {} */\n",
                budget.const_name,
                budget.cycles,
                c_comment_text(&budget_note(budget))
            ));
        }
        body.push('\n');
    }

    for rule in &plan.subclass_rules {
        body.push_str(&format!(
            "/* {} subClassOf {} */\nstatic inline bool {}(uint32_t class_id) {{\n    return class_id == {};\n}}\n\n",
            c_comment_text(&rule.child),
            c_comment_text(&rule.parent),
            rule.fn_name,
            rule.child_const
        ));
    }
    for (relation, rules) in [("domain", &plan.domain_rules), ("range", &plan.range_rules)] {
        for rule in rules {
            body.push_str(&format!(
                "/* {} {relation} {} */\nstatic inline bool {}(uint32_t class_id) {{\n    return class_id == {};\n}}\n\n",
                c_comment_text(&rule.property),
                c_comment_text(&rule.class),
                rule.fn_name,
                rule.class_const
            ));
        }
    }

    body.push_str(
        "static inline bool is_class_id(uint32_t id) {\n    return id >= CLASS_BASE && id < PROPERTY_BASE;\n}\n\n",
    );
    body.push_str(
        "static inline bool is_property_id(uint32_t id) {\n    return id >= PROPERTY_BASE && id < INSTANCE_BASE;\n}\n\n",
    );
    body.push_str(&format!(
        "static inline uint32_t hash_id(uint32_t id) {{\n    return id * {HASH_MULTIPLIER}u;\n}}\n"
    ));

    let ids_include = format!("\"{}\"", ids::file_name(Backend::C));
    c_header(
        file_name(Backend::C),
        &["<stdbool.h>", "<stdint.h>", &ids_include],
        &body,
    )
}

fn generate_rust(plan: &EmitPlan) -> Result<String, String> {
    let budgets = plan.function_budgets.iter().map(|budget| {
        let ident = rust_ident(&budget.const_name);
        let cycles = u32_lit(budget.cycles);
        let doc = doc(&budget_note(budget));
        quote! {
            #doc
            pub const #ident: u32 = #cycles;
        }
    });

    let subclass = plan.subclass_rules.iter().map(|rule| {
        let doc = doc(&format!("`{}` rdfs:subClassOf `{}`", rule.child, rule.parent));
        predicate(&rule.fn_name, &rule.child_const, doc)
    });
    let domain = plan
        .domain_rules
        .iter()
        .map(|rule| membership(rule, "domain"));
    let range = plan.range_rules.iter().map(|rule| membership(rule, "range"));
    let multiplier = u32_lit(HASH_MULTIPLIER);

    let tokens = quote! {
        use super::ids::*;

        #(#budgets)*

        #(#subclass)*
        #(#domain)*
        #(#range)*

        #[inline]
        pub const fn is_class_id(id: u32) -> bool {
            id >= CLASS_BASE && id < PROPERTY_BASE
        }

        #[inline]
        pub const fn is_property_id(id: u32) -> bool {
            id >= PROPERTY_BASE && id < INSTANCE_BASE
        }

        #[inline]
        pub const fn hash_id(id: u32) -> u32 {
            id.wrapping_mul(#multiplier)
        }
    };
    render_tokens_as_module(tokens)
}

fn membership(rule: &MembershipRule, relation: &str) -> TokenStream {
    let doc = doc(&format!("`{}` rdfs:{relation} `{}`", rule.property, rule.class));
    predicate(&rule.fn_name, &rule.class_const, doc)
}

fn predicate(fn_name: &str, const_name: &str, doc: TokenStream) -> TokenStream {
    let fn_ident = rust_ident(fn_name);
    let const_ident = rust_ident(const_name);
    quote! {
        #doc
        #[inline]
        pub const fn #fn_ident(class_id: u32) -> bool {
            class_id == #const_ident
        }
    }
}
