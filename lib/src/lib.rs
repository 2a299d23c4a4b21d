//! Ahead-of-time compiler from an ontology (classes, properties, function cost
//! annotations, SHACL node shapes) and comment-annotated SQL files to
//! generated ID constants, inference predicates, shape validators and typed
//! query stubs.

pub mod codegen;
pub mod config;
pub mod driver;
pub mod emit;
pub mod error;
pub mod ids;
pub mod model;
pub mod named_nodes;
pub mod ontology;
pub mod plan;
pub mod sql;
pub mod store;

pub use codegen::{generate_modules, Backend, GeneratedModules};
pub use config::CompilerConfig;
pub use driver::{CompilationInputs, CompilationReport, Compiler, PhaseState};
pub use emit::write_generated_modules;
pub use error::CompileError;
pub use ids::{allocate_ids, AllocationError, IdRanges};
pub use model::{CompilationModel, Diagnostic, PerformanceStats, Phase};
pub use ontology::extract_local_name;
pub use plan::{lower_model, EmitPlan, ErrorCode};
pub use sql::{extract_queries, infer_param_type};
