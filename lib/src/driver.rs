//! Compiler driver: runs the phases in order, collects diagnostics and
//! statistics, and writes the generated modules.
//!
//! `Start -> ParseOntologies -> ParseSql -> GenerateHeaders -> Done`, or
//! `Failed` from whichever phase hit a fatal error.

use crate::codegen::{generate_modules, GeneratedModules};
use crate::config::CompilerConfig;
use crate::emit::write_generated_modules;
use crate::error::CompileError;
use crate::ids::allocate_ids;
use crate::model::{CompilationModel, Diagnostic, PerformanceStats};
use crate::named_nodes::Vocabulary;
use crate::ontology::{load_ontology_dir, OntologyExtractor};
use crate::plan::{lower_model, EmitPlan};
use crate::sql::load_sql_dir;
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct CompilationInputs {
    pub ontology_dir: PathBuf,
    pub sql_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl CompilationInputs {
    pub fn new(
        ontology_dir: impl Into<PathBuf>,
        sql_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        CompilationInputs {
            ontology_dir: ontology_dir.into(),
            sql_dir: sql_dir.into(),
            output_dir: output_dir.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    Start,
    ParseOntologies,
    ParseSql,
    GenerateHeaders,
    Done,
    Failed,
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseState::Start => "start",
            PhaseState::ParseOntologies => "parse-ontologies",
            PhaseState::ParseSql => "parse-sql",
            PhaseState::GenerateHeaders => "generate-headers",
            PhaseState::Done => "done",
            PhaseState::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct PhaseTracker {
    state: PhaseState,
}

impl PhaseTracker {
    fn new() -> Self {
        PhaseTracker {
            state: PhaseState::Start,
        }
    }

    fn enter(&mut self, next: PhaseState) {
        info!("{} -> {}", self.state, next);
        self.state = next;
    }
}

#[derive(Debug)]
pub struct CompilationReport {
    pub state: PhaseState,
    pub stats: PerformanceStats,
    pub diagnostics: Vec<Diagnostic>,
    pub written: Vec<PathBuf>,
    pub plan: EmitPlan,
}

pub struct Compiler {
    config: CompilerConfig,
    vocab: Vocabulary,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Result<Self, CompileError> {
        config.validate()?;
        let vocab = Vocabulary::new(&config.function_namespace).map_err(CompileError::Config)?;
        Ok(Compiler { config, vocab })
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Runs every phase and writes the generated modules into
    /// `inputs.output_dir`.
    pub fn compile(&self, inputs: &CompilationInputs) -> Result<CompilationReport, CompileError> {
        let mut tracker = PhaseTracker::new();
        match self.run(inputs, &mut tracker) {
            Ok(report) => Ok(report),
            Err(err) => {
                tracker.enter(PhaseState::Failed);
                Err(err)
            }
        }
    }

    fn run(
        &self,
        inputs: &CompilationInputs,
        tracker: &mut PhaseTracker,
    ) -> Result<CompilationReport, CompileError> {
        let mut model = CompilationModel::new();

        tracker.enter(PhaseState::ParseOntologies);
        self.parse_ontologies(&inputs.ontology_dir, &mut model)?;

        tracker.enter(PhaseState::ParseSql);
        self.parse_sql(&inputs.sql_dir, &mut model);

        tracker.enter(PhaseState::GenerateHeaders);
        let started = Instant::now();
        let (plan, modules) = self.generate(&mut model)?;
        let written = write_generated_modules(&inputs.output_dir, &modules)?;
        model.stats.generation = started.elapsed();
        info!(
            "generated {} files in {:.2?}",
            written.len(),
            model.stats.generation
        );

        let stats = collect_stats(&model, &plan);
        tracker.enter(PhaseState::Done);
        Ok(CompilationReport {
            state: tracker.state,
            stats,
            diagnostics: model.diagnostics,
            written,
            plan,
        })
    }

    /// Loads and extracts the ontology directory. Fails only if the directory
    /// cannot be listed.
    pub fn parse_ontologies(
        &self,
        dir: &Path,
        model: &mut CompilationModel,
    ) -> Result<(), CompileError> {
        let started = Instant::now();
        let loaded =
            load_ontology_dir(dir, &self.config.ontology_extensions, &mut model.diagnostics)?;
        debug!("{} triples loaded", loaded.store.len());
        OntologyExtractor::new(&loaded.store, &self.vocab).extract_into(model);

        model.stats.documents_loaded = loaded.documents_loaded;
        model.stats.documents_skipped = loaded.documents_skipped;
        model.stats.ontology_parse = started.elapsed();
        info!(
            "{} ontology documents ({} skipped): {} classes, {} properties, {} functions, {} shapes in {:.2?}",
            loaded.documents_loaded,
            loaded.documents_skipped,
            model.classes.len(),
            model.properties.len(),
            model.functions.len(),
            model.shapes.len(),
            model.stats.ontology_parse
        );
        Ok(())
    }

    /// Extracts the SQL directory. Never fails; problems become diagnostics.
    pub fn parse_sql(&self, dir: &Path, model: &mut CompilationModel) {
        let started = Instant::now();
        for query in load_sql_dir(dir, &self.config.sql_extensions, &mut model.diagnostics) {
            model.add_query(query);
        }
        model.stats.sql_parse = started.elapsed();
        info!(
            "{} queries in {:.2?}",
            model.queries.len(),
            model.stats.sql_parse
        );
    }

    /// Allocates IDs, lowers the model and renders every module in memory.
    pub fn generate(
        &self,
        model: &mut CompilationModel,
    ) -> Result<(EmitPlan, GeneratedModules), CompileError> {
        allocate_ids(model, &self.config.ranges)?;
        let (plan, diagnostics) = lower_model(model, &self.config.ranges);
        for diagnostic in diagnostics {
            model.push_diagnostic(diagnostic);
        }
        let modules =
            generate_modules(&plan, self.config.target).map_err(CompileError::Codegen)?;
        Ok((plan, modules))
    }
}

fn collect_stats(model: &CompilationModel, plan: &EmitPlan) -> PerformanceStats {
    PerformanceStats {
        class_count: plan.classes.len(),
        property_count: plan.properties.len(),
        function_count: plan.function_budgets.len(),
        rule_count: plan.rule_count(),
        shape_count: plan.validators.len(),
        query_count: plan.queries.len(),
        diagnostic_count: model.diagnostics.len(),
        ..model.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_ontology_directory_fails_the_run() {
        let dir = tempfile::tempdir().expect("temp dir");
        let compiler = Compiler::new(CompilerConfig::default()).expect("default config is valid");
        let inputs = CompilationInputs::new(
            dir.path().join("missing"),
            dir.path().join("sql"),
            dir.path().join("out"),
        );

        let err = compiler.compile(&inputs).expect_err("ontology dir is required");
        assert!(matches!(err, CompileError::OntologySource { .. }));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn empty_inputs_still_produce_every_module() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::create_dir(dir.path().join("onto")).expect("onto dir");
        let compiler = Compiler::new(CompilerConfig::default()).expect("default config is valid");
        let inputs = CompilationInputs::new(
            dir.path().join("onto"),
            dir.path().join("no-sql-here"),
            dir.path().join("out"),
        );

        let report = compiler.compile(&inputs).expect("compilation succeeds");
        assert_eq!(report.state, PhaseState::Done);
        assert_eq!(report.written.len(), 4);
        assert_eq!(report.stats.query_count, 0);
        assert_eq!(report.diagnostics.len(), 1, "missing SQL dir is only a warning");
        assert!(dir.path().join("out").join("ontology_ids.h").exists());
    }

    #[test]
    fn invalid_namespace_is_a_config_error() {
        let config = CompilerConfig {
            function_namespace: "not an iri ".to_string(),
            ..CompilerConfig::default()
        };
        assert!(matches!(Compiler::new(config), Err(CompileError::Config(_))));
    }
}
