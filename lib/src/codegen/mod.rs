//! Code emitters. Each submodule renders one generated module from an
//! [`EmitPlan`] for a given [`Backend`]: C headers assembled as text, or Rust
//! modules built as token streams and pretty-printed.

use crate::plan::EmitPlan;
use proc_macro2::{Ident, Literal, Span, TokenStream};
use quote::quote;
use serde::{Deserialize, Serialize};
use std::fmt;
use syn::File;

pub mod ids;
pub mod queries;
pub mod rules;
pub mod validators;

pub const GENERATED_BANNER: &str = "// Code generated by ontoc. DO NOT EDIT.\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    C,
    Rust,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::C => "c",
            Backend::Rust => "rust",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete generated module set, in write order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModules {
    pub backend: Backend,
    pub files: Vec<(String, String)>,
}

impl GeneratedModules {
    pub fn file(&self, name: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(file_name, _)| file_name == name)
            .map(|(_, content)| content.as_str())
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.files.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// Renders all four modules. Nothing is returned unless every emitter
/// succeeds.
pub fn generate_modules(plan: &EmitPlan, backend: Backend) -> Result<GeneratedModules, String> {
    let mut files = vec![
        (
            ids::file_name(backend).to_string(),
            ids::generate(plan, backend).map_err(|err| format!("ids module: {err}"))?,
        ),
        (
            rules::file_name(backend).to_string(),
            rules::generate(plan, backend).map_err(|err| format!("rules module: {err}"))?,
        ),
        (
            validators::file_name(backend).to_string(),
            validators::generate(plan, backend)
                .map_err(|err| format!("validators module: {err}"))?,
        ),
        (
            queries::file_name(backend).to_string(),
            queries::generate(plan, backend).map_err(|err| format!("queries module: {err}"))?,
        ),
    ];

    if backend == Backend::Rust {
        let module_names: Vec<String> = files
            .iter()
            .filter_map(|(name, _)| name.strip_suffix(".rs").map(str::to_string))
            .collect();
        files.insert(0, ("mod.rs".to_string(), build_root_module(&module_names)?));
    }

    Ok(GeneratedModules { backend, files })
}

fn build_root_module(module_names: &[String]) -> Result<String, String> {
    let idents: Vec<Ident> = module_names.iter().map(|name| rust_ident(name)).collect();
    let file = syn::parse2::<File>(quote! {
        #![allow(unused_variables)]
        #![allow(dead_code)]
        #![allow(unused_imports)]
        #![allow(unused_comparisons)]
        #![allow(non_snake_case)]

        #(pub mod #idents;)*
    })
    .map_err(|err| format!("failed to build root module AST: {err}"))?;

    let mut root = String::from(GENERATED_BANNER);
    root.push_str(&prettyplease::unparse(&file));
    Ok(root)
}

pub(crate) fn render_tokens_as_module(tokens: TokenStream) -> Result<String, String> {
    let file = syn::parse2::<File>(tokens)
        .map_err(|err| format!("generated tokens do not form a module: {err}"))?;
    let mut module = String::from(GENERATED_BANNER);
    module.push_str(&prettyplease::unparse(&file));
    Ok(module)
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where",
    "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv",
    "try", "typeof", "unsized", "virtual", "yield",
];

/// Identifier for a generated Rust item. Characters outside `[A-Za-z0-9_]`
/// become `_` and a leading digit gets a `_` prefix, so this never panics.
/// Keywords become raw identifiers, except the few that cannot be raw, which
/// get a trailing `_`.
pub(crate) fn rust_ident(name: &str) -> Ident {
    let mut name: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    match name.as_str() {
        "self" | "Self" | "super" | "crate" | "_" => {
            Ident::new(&format!("{name}_"), Span::call_site())
        }
        keyword if RUST_KEYWORDS.contains(&keyword) => Ident::new_raw(keyword, Span::call_site()),
        _ => Ident::new(&name, Span::call_site()),
    }
}

pub(crate) fn u32_lit(value: u32) -> Literal {
    Literal::u32_unsuffixed(value)
}

/// ` text` as a doc attribute, so it renders as `/// text`.
pub(crate) fn doc(text: &str) -> TokenStream {
    let text = format!(" {text}");
    quote! { #[doc = #text] }
}

const C_KEYWORDS: &[&str] = &[
    "auto", "bool", "break", "case", "char", "const", "continue", "default", "do", "double",
    "else", "enum", "extern", "false", "float", "for", "goto", "if", "inline", "int", "long",
    "register", "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch",
    "true", "typedef", "union", "unsigned", "void", "volatile", "while",
];

pub(crate) fn c_ident(name: &str) -> String {
    if C_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Double-quoted C string literal.
pub(crate) fn c_string_literal(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    literal.push('"');
    for c in text.chars() {
        match c {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            // `??` could start a trigraph
            '?' => literal.push_str("\\?"),
            c if c.is_control() => literal.push_str(&format!("\\x{:02x}", c as u32)),
            c => literal.push(c),
        }
    }
    literal.push('"');
    literal
}

/// Text safe to place inside a `/* */` comment.
pub(crate) fn c_comment_text(text: &str) -> String {
    text.replace("*/", "* /").replace(['\n', '\r'], " ")
}

/// Wraps a header body in the banner and an include guard derived from the
/// file name.
pub(crate) fn c_header(file_name: &str, includes: &[&str], body: &str) -> String {
    let guard: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();

    let mut header = String::from(GENERATED_BANNER);
    header.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
    for include in includes {
        header.push_str(&format!("#include {include}\n"));
    }
    if !includes.is_empty() {
        header.push('\n');
    }
    header.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        header.push('\n');
    }
    header.push_str(&format!("\n#endif /* {guard} */\n"));
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_module_declares_each_module_once() {
        let root = build_root_module(&["ids".to_string(), "rules".to_string()])
            .expect("root module should build");
        assert!(root.starts_with(GENERATED_BANNER));
        assert_eq!(root.matches("pub mod ids;").count(), 1);
        assert_eq!(root.matches("pub mod rules;").count(), 1);
        assert!(root.contains("#![allow(dead_code)]"));
    }

    #[test]
    fn keywords_are_escaped_per_backend() {
        assert_eq!(rust_ident("type").to_string(), "r#type");
        assert_eq!(rust_ident("self").to_string(), "self_");
        assert_eq!(rust_ident("user_id").to_string(), "user_id");
        assert_eq!(rust_ident("2024TotalsParams").to_string(), "_2024TotalsParams");
        assert_eq!(rust_ident("has-name").to_string(), "has_name");
        assert_eq!(rust_ident("").to_string(), "__");
        assert_eq!(c_ident("default"), "default_");
        assert_eq!(c_ident("user_id"), "user_id");
    }

    #[test]
    fn c_strings_and_comments_are_escaped() {
        assert_eq!(
            c_string_literal(r#"SELECT "a" FROM t WHERE x = '\'"#),
            r#""SELECT \"a\" FROM t WHERE x = '\\'""#
        );
        assert_eq!(c_string_literal("a ?? b"), r#""a \?\? b""#);
        assert_eq!(c_comment_text("x */ y"), "x * / y");
    }

    #[test]
    fn header_has_guard_and_banner() {
        let header = c_header("ontology_ids.h", &["<stdint.h>"], "#define A 1\n");
        assert!(header.starts_with(GENERATED_BANNER));
        assert!(header.contains("#ifndef ONTOLOGY_IDS_H\n#define ONTOLOGY_IDS_H\n"));
        assert!(header.contains("#include <stdint.h>\n"));
        assert!(header.trim_end().ends_with("#endif /* ONTOLOGY_IDS_H */"));
    }

    #[test]
    fn backend_names_round_trip_through_serde() {
        let json = serde_json::to_string(&Backend::Rust).expect("backend serializes");
        assert_eq!(json, "\"rust\"");
        let parsed: Backend = serde_json::from_str("\"c\"").expect("backend parses");
        assert_eq!(parsed, Backend::C);
        assert_eq!(Backend::default(), Backend::C);
    }
}
