//! Fail-fast shape validators. Each constraint fetches its value count once
//! through the host's counting primitive and checks min before max; the first
//! violation is returned.

use super::{
    c_comment_text, c_header, c_string_literal, doc, ids, render_tokens_as_module, rust_ident,
    u32_lit, Backend,
};
use crate::plan::{CountCheck, EmitPlan, ErrorCode, ShapeValidator};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

pub const COUNT_PRIMITIVE: &str = "count_property_values";

pub fn file_name(backend: Backend) -> &'static str {
    match backend {
        Backend::C => "shape_validators.h",
        Backend::Rust => "validators.rs",
    }
}

pub fn generate(plan: &EmitPlan, backend: Backend) -> Result<String, String> {
    match backend {
        Backend::C => Ok(generate_c(plan)),
        Backend::Rust => generate_rust(plan),
    }
}

fn c_error_constant(code: ErrorCode) -> String {
    format!("VALIDATION_{}", code.as_str())
}

fn validator_note(validator: &ShapeValidator) -> String {
    match &validator.target_class {
        Some(class) => format!("Shape {} targeting {class}", validator.shape),
        None => format!("Shape {}", validator.shape),
    }
}

fn generate_c(plan: &EmitPlan) -> String {
    let mut body = String::new();

    body.push_str("typedef enum {\n");
    for code in ErrorCode::ALL {
        body.push_str(&format!("    {} = {},\n", c_error_constant(code), code.code()));
    }
    body.push_str("} validation_error_t;\n\n");

    body.push_str(
        "typedef struct {\n    bool valid;\n    validation_error_t error_code;\n    const char* message;\n    uint32_t focus_id;\n} validation_result_t;\n\n",
    );
    body.push_str(&format!(
        "extern uint32_t {COUNT_PRIMITIVE}(uint32_t focus_id, uint32_t property_id, const void* graph_data);\n"
    ));

    for validator in &plan.validators {
        body.push_str(&format!(
            "\n/* {} */\nstatic inline validation_result_t {}(uint32_t focus_id, const void* graph_data) {{\n",
            c_comment_text(&validator_note(validator)),
            validator.fn_name
        ));
        if validator.checks.is_empty() {
            body.push_str("    (void)graph_data;\n");
        }
        for (index, check) in validator.checks.iter().enumerate() {
            body.push_str(&format!(
                "    uint32_t count_{index} = {COUNT_PRIMITIVE}(focus_id, {}, graph_data);\n",
                check.property_const
            ));
            if let Some(min) = check.min_count {
                body.push_str(&c_violation(
                    &format!("count_{index} < {min}u"),
                    ErrorCode::MinCount,
                    &check.min_message,
                ));
            }
            if let Some(max) = check.max_count {
                body.push_str(&c_violation(
                    &format!("count_{index} > {max}u"),
                    ErrorCode::MaxCount,
                    &check.max_message,
                ));
            }
        }
        body.push_str(&format!(
            "    return (validation_result_t){{true, {}, \"\", focus_id}};\n}}\n",
            c_error_constant(ErrorCode::Ok)
        ));
    }

    let ids_include = format!("\"{}\"", ids::file_name(Backend::C));
    c_header(
        file_name(Backend::C),
        &["<stdbool.h>", "<stdint.h>", &ids_include],
        &body,
    )
}

fn c_violation(condition: &str, code: ErrorCode, message: &str) -> String {
    format!(
        "    if ({condition}) {{\n        return (validation_result_t){{false, {}, {}, focus_id}};\n    }}\n",
        c_error_constant(code),
        c_string_literal(message)
    )
}

fn generate_rust(plan: &EmitPlan) -> Result<String, String> {
    let variants = ErrorCode::ALL.iter().map(|code| {
        let ident = format_ident!("{}", code.variant_name());
        let value = u32_lit(code.code());
        quote! { #ident = #value, }
    });
    let names = ErrorCode::ALL.iter().map(|code| {
        let ident = format_ident!("{}", code.variant_name());
        let name = code.as_str();
        quote! { ValidationError::#ident => #name, }
    });
    let validators = plan.validators.iter().map(validator_fn);

    let tokens = quote! {
        use super::ids::*;

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u32)]
        pub enum ValidationError {
            #(#variants)*
        }

        impl ValidationError {
            pub const fn as_str(self) -> &'static str {
                match self {
                    #(#names)*
                }
            }
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct ValidationResult {
            pub valid: bool,
            pub error_code: ValidationError,
            pub message: &'static str,
            pub focus_id: u32,
        }

        impl ValidationResult {
            pub const fn ok(focus_id: u32) -> Self {
                ValidationResult {
                    valid: true,
                    error_code: ValidationError::Ok,
                    message: "",
                    focus_id,
                }
            }

            pub const fn violation(
                error_code: ValidationError,
                message: &'static str,
                focus_id: u32,
            ) -> Self {
                ValidationResult {
                    valid: false,
                    error_code,
                    message,
                    focus_id,
                }
            }
        }

        /// Counting primitive implemented by the host engine over its graph data.
        pub trait PropertyCounter {
            fn count_property_values(&self, focus_id: u32, property_id: u32) -> u32;
        }

        #(#validators)*
    };
    render_tokens_as_module(tokens)
}

fn validator_fn(validator: &ShapeValidator) -> TokenStream {
    let fn_ident = rust_ident(&validator.fn_name);
    let doc = doc(&validator_note(validator));
    let checks = validator
        .checks
        .iter()
        .enumerate()
        .map(|(index, check)| check_tokens(index, check));
    quote! {
        #doc
        pub fn #fn_ident<G: PropertyCounter + ?Sized>(focus_id: u32, graph: &G) -> ValidationResult {
            #(#checks)*
            ValidationResult::ok(focus_id)
        }
    }
}

fn check_tokens(index: usize, check: &CountCheck) -> TokenStream {
    let count = format_ident!("count_{}", index);
    let property = rust_ident(&check.property_const);
    let min = check.min_count.map(|min| {
        let min = u32_lit(min);
        let message = &check.min_message;
        quote! {
            if #count < #min {
                return ValidationResult::violation(ValidationError::MinCount, #message, focus_id);
            }
        }
    });
    let max = check.max_count.map(|max| {
        let max = u32_lit(max);
        let message = &check.max_message;
        quote! {
            if #count > #max {
                return ValidationResult::violation(ValidationError::MaxCount, #message, focus_id);
            }
        }
    });
    quote! {
        let #count = graph.count_property_values(focus_id, #property);
        #min
        #max
    }
}
