use crate::ids::AllocationError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a compilation. Recoverable problems are recorded as
/// [`crate::model::Diagnostic`]s instead.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("cannot enumerate ontology source {}: {source}", path.display())]
    OntologySource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("id allocation failed: {0}")]
    Allocation(#[from] AllocationError),

    #[error("code generation failed: {0}")]
    Codegen(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
