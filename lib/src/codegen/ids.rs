use super::{c_comment_text, c_header, doc, render_tokens_as_module, rust_ident, u32_lit, Backend};
use crate::plan::{EmitPlan, IdConstant};
use quote::quote;

pub fn file_name(backend: Backend) -> &'static str {
    match backend {
        Backend::C => "ontology_ids.h",
        Backend::Rust => "ids.rs",
    }
}

pub fn generate(plan: &EmitPlan, backend: Backend) -> Result<String, String> {
    match backend {
        Backend::C => Ok(generate_c(plan)),
        Backend::Rust => generate_rust(plan),
    }
}

fn generate_c(plan: &EmitPlan) -> String {
    let ranges = &plan.meta.ranges;
    let mut body = String::new();
    body.push_str(&format!("#define CLASS_BASE {}u\n", ranges.class_base));
    body.push_str(&format!("#define PROPERTY_BASE {}u\n", ranges.property_base));
    body.push_str(&format!("#define INSTANCE_BASE {}u\n", ranges.instance_base));

    for (title, constants) in [("Classes", &plan.classes), ("Properties", &plan.properties)] {
        body.push_str(&format!("\n/* {title} */\n"));
        for constant in constants {
            body.push_str(&format!(
                "#define {} {}u /* {} */\n",
                constant.name,
                constant.id,
                c_comment_text(&constant.source_uri)
            ));
        }
    }

    c_header(file_name(Backend::C), &["<stdint.h>"], &body)
}

fn generate_rust(plan: &EmitPlan) -> Result<String, String> {
    let ranges = &plan.meta.ranges;
    let class_base = u32_lit(ranges.class_base);
    let property_base = u32_lit(ranges.property_base);
    let instance_base = u32_lit(ranges.instance_base);
    let classes = plan.classes.iter().map(constant_tokens);
    let properties = plan.properties.iter().map(constant_tokens);

    let tokens = quote! {
        pub const CLASS_BASE: u32 = #class_base;
        pub const PROPERTY_BASE: u32 = #property_base;
        pub const INSTANCE_BASE: u32 = #instance_base;

        #(#classes)*
        #(#properties)*
    };
    render_tokens_as_module(tokens)
}

fn constant_tokens(constant: &IdConstant) -> proc_macro2::TokenStream {
    let ident = rust_ident(&constant.name);
    let id = u32_lit(constant.id);
    let doc = doc(&constant.source_uri);
    quote! {
        #doc
        pub const #ident: u32 = #id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdRanges;
    use crate::plan::PlanMeta;

    fn plan() -> EmitPlan {
        EmitPlan {
            meta: PlanMeta {
                compiler_version: "test".to_string(),
                ranges: IdRanges::default(),
            },
            classes: vec![IdConstant {
                name: "PERSON_CLASS".to_string(),
                id: 1000,
                local_name: "Person".to_string(),
                source_uri: "http://example.com/onto#Person".to_string(),
            }],
            properties: vec![IdConstant {
                name: "HASNAME_PROPERTY".to_string(),
                id: 5000,
                local_name: "hasName".to_string(),
                source_uri: "http://example.com/onto#hasName".to_string(),
            }],
            subclass_rules: Vec::new(),
            domain_rules: Vec::new(),
            range_rules: Vec::new(),
            function_budgets: Vec::new(),
            validators: Vec::new(),
            queries: Vec::new(),
        }
    }

    #[test]
    fn c_header_lists_bases_and_entities() {
        let header = generate(&plan(), Backend::C).expect("ids header renders");
        assert!(header.contains("#ifndef ONTOLOGY_IDS_H"));
        assert!(header.contains("#define CLASS_BASE 1000u"));
        assert!(header.contains("#define INSTANCE_BASE 10000u"));
        assert!(header.contains("#define PERSON_CLASS 1000u /* http://example.com/onto#Person */"));
        assert!(header.contains("#define HASNAME_PROPERTY 5000u"));
    }

    #[test]
    fn rust_module_lists_bases_and_entities() {
        let module = generate(&plan(), Backend::Rust).expect("ids module renders");
        assert!(module.contains("pub const PROPERTY_BASE: u32 = 5000;"));
        assert!(module.contains("/// http://example.com/onto#Person"));
        assert!(module.contains("pub const PERSON_CLASS: u32 = 1000;"));
        assert!(module.contains("pub const HASNAME_PROPERTY: u32 = 5000;"));
    }
}
