//! Typed query stubs. The SQL text is carried verbatim as a string constant;
//! the stubs never execute it and return an empty result.

use super::{
    c_comment_text, c_header, c_ident, c_string_literal, doc, render_tokens_as_module, rust_ident,
    Backend,
};
use crate::model::ParamType;
use crate::plan::{EmitPlan, QueryStub};
use proc_macro2::TokenStream;
use quote::quote;

pub fn file_name(backend: Backend) -> &'static str {
    match backend {
        Backend::C => "sql_queries.h",
        Backend::Rust => "queries.rs",
    }
}

pub fn generate(plan: &EmitPlan, backend: Backend) -> Result<String, String> {
    match backend {
        Backend::C => Ok(generate_c(plan)),
        Backend::Rust => generate_rust(plan),
    }
}

fn c_type(param: ParamType) -> &'static str {
    match param {
        ParamType::Integer => "int64_t",
        ParamType::Float => "double",
        ParamType::String => "const char*",
    }
}

fn generate_c(plan: &EmitPlan) -> String {
    let mut body = String::from(
        "typedef struct {\n    void** rows;\n    size_t row_count;\n    size_t column_count;\n} query_result_t;\n",
    );

    for query in &plan.queries {
        body.push_str(&format!(
            "\n/* {}: {} */\nstatic const char* const {} = {};\n",
            query.name,
            c_comment_text(&query.sql),
            query.sql_const,
            c_string_literal(&query.sql)
        ));

        let argument = match &query.params_type {
            Some(params_type) => {
                body.push_str("\ntypedef struct {\n");
                for param in &query.params {
                    body.push_str(&format!(
                        "    {} {};\n",
                        c_type(param.inferred_type),
                        c_ident(&param.name)
                    ));
                }
                body.push_str(&format!("}} {params_type};\n"));
                Some(format!("const {params_type}* params"))
            }
            None => None,
        };

        body.push_str(&format!(
            "\nstatic inline query_result_t {}({}) {{\n",
            query.fn_name,
            argument.as_deref().unwrap_or("void")
        ));
        if argument.is_some() {
            body.push_str("    (void)params;\n");
        }
        body.push_str("    query_result_t result = {0};\n    return result;\n}\n");
    }

    c_header(file_name(Backend::C), &["<stddef.h>", "<stdint.h>"], &body)
}

fn rust_type(param: ParamType) -> TokenStream {
    match param {
        ParamType::Integer => quote! { i64 },
        ParamType::Float => quote! { f64 },
        ParamType::String => quote! { String },
    }
}

fn generate_rust(plan: &EmitPlan) -> Result<String, String> {
    let stubs = plan.queries.iter().map(query_tokens);
    let tokens = quote! {
        /// Result set of a query: rows of column values.
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct QueryResult {
            pub rows: Vec<Vec<String>>,
            pub row_count: usize,
        }

        #(#stubs)*
    };
    render_tokens_as_module(tokens)
}

fn query_tokens(query: &QueryStub) -> TokenStream {
    let sql_const = rust_ident(&query.sql_const);
    let fn_ident = rust_ident(&query.fn_name);
    let sql = &query.sql;
    let sql_doc = doc(&format!("SQL of `{}`.", query.name));
    let stub_doc = doc(&format!(
        "Stub for `{}`; executing `{}` is up to the host.",
        query.name, query.sql_const
    ));

    let (params_def, signature) = match &query.params_type {
        Some(params_type) => {
            let params_ident = rust_ident(params_type);
            let fields = query.params.iter().map(|param| {
                let field = rust_ident(&param.name);
                let ty = rust_type(param.inferred_type);
                quote! { pub #field: #ty, }
            });
            (
                quote! {
                    #[derive(Debug, Clone, Default, PartialEq)]
                    pub struct #params_ident {
                        #(#fields)*
                    }
                },
                quote! { pub fn #fn_ident(params: &#params_ident) -> QueryResult },
            )
        }
        None => (quote! {}, quote! { pub fn #fn_ident() -> QueryResult }),
    };

    quote! {
        #sql_doc
        pub const #sql_const: &str = #sql;

        #params_def

        #stub_doc
        #signature {
            QueryResult::default()
        }
    }
}
