use crate::codegen::Backend;
use crate::error::CompileError;
use crate::ids::IdRanges;
use crate::named_nodes::DEFAULT_FUNCTION_NAMESPACE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub ranges: IdRanges,
    pub ontology_extensions: Vec<String>,
    pub sql_extensions: Vec<String>,
    pub function_namespace: String,
    pub target: Backend,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            ranges: IdRanges::default(),
            ontology_extensions: ["ttl", "turtle", "nt", "n3", "rdf", "owl", "xml"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            sql_extensions: vec!["sql".to_string()],
            function_namespace: DEFAULT_FUNCTION_NAMESPACE.to_string(),
            target: Backend::default(),
        }
    }
}

impl CompilerConfig {
    /// Reads a JSON config; fields missing from the file keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, CompileError> {
        let text = fs::read_to_string(path).map_err(|err| {
            CompileError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        let config: CompilerConfig = serde_json::from_str(&text).map_err(|err| {
            CompileError::Config(format!("cannot parse {}: {err}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        self.ranges.validate().map_err(CompileError::Config)?;
        if self.ontology_extensions.is_empty() {
            return Err(CompileError::Config(
                "at least one ontology extension is required".to_string(),
            ));
        }
        if self.function_namespace.trim().is_empty() {
            return Err(CompileError::Config(
                "function_namespace must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ontoc.json");
        fs::write(&path, r#"{ "target": "rust", "ranges": { "class_base": 100 } }"#)
            .expect("config written");

        let config = CompilerConfig::from_json_file(&path).expect("config loads");
        assert_eq!(config.target, Backend::Rust);
        assert_eq!(config.ranges.class_base, 100);
        assert_eq!(config.ranges.property_base, 5000);
        assert_eq!(config.sql_extensions, vec!["sql".to_string()]);
        assert_eq!(config.function_namespace, DEFAULT_FUNCTION_NAMESPACE);
    }

    #[test]
    fn overlapping_ranges_are_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ontoc.json");
        fs::write(&path, r#"{ "ranges": { "class_base": 6000 } }"#).expect("config written");

        let err = CompilerConfig::from_json_file(&path).expect_err("class_base above property_base");
        assert!(matches!(err, CompileError::Config(_)));
    }

    #[test]
    fn unreadable_config_is_a_config_error() {
        let err = CompilerConfig::from_json_file(Path::new("/definitely/not/here.json"))
            .expect_err("missing file");
        assert!(err.to_string().starts_with("invalid configuration: cannot read"));
    }
}
