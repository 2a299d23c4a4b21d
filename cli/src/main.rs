use clap::{ArgAction, Parser, ValueEnum};
use log::{info, LevelFilter};
use ontoc::{Backend, CompilationInputs, CompileError, Compiler, CompilerConfig};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile an ontology and annotated SQL into ID, rule, validator and query modules", long_about = None)]
struct Cli {
    /// Directory of ontology documents (Turtle, N-Triples, N3, RDF/XML)
    ontology_dir: PathBuf,

    /// Directory of comment-annotated SQL files
    sql_dir: PathBuf,

    /// Directory the generated modules are written to (created if missing)
    output_dir: PathBuf,

    /// Code generation backend (overrides the config file)
    #[arg(long, value_enum)]
    target: Option<TargetArg>,

    /// JSON compiler configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Optional output path for the lowered emit plan as JSON
    #[arg(long, value_name = "FILE")]
    plan_out: Option<PathBuf>,

    /// Set the base log level (use -v / -q to adjust relative to this level)
    #[arg(
        long,
        value_enum,
        default_value_t = LogLevel::Info,
        help = "error | warn | info | debug | trace"
    )]
    log_level: LogLevel,

    /// Increase logging verbosity (can be used multiple times)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (can be used multiple times)
    #[arg(short, long, action = ArgAction::Count)]
    quiet: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum TargetArg {
    C,
    Rust,
}

impl TargetArg {
    fn to_backend(self) -> Backend {
        match self {
            TargetArg::C => Backend::C,
            TargetArg::Rust => Backend::Rust,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

const LEVELS: [LevelFilter; 5] = [
    LevelFilter::Error,
    LevelFilter::Warn,
    LevelFilter::Info,
    LevelFilter::Debug,
    LevelFilter::Trace,
];

fn adjusted_level(base: LogLevel, verbose: u8, quiet: u8) -> LevelFilter {
    let base_idx = LEVELS
        .iter()
        .position(|lvl| *lvl == base.to_filter())
        .unwrap_or(2) as i16; // default to Info
    let adjusted =
        (base_idx + verbose as i16 - quiet as i16).clamp(0, (LEVELS.len() - 1) as i16) as usize;
    LEVELS[adjusted]
}

fn init_logging(base: LogLevel, verbose: u8, quiet: u8) {
    env_logger::Builder::from_default_env()
        .format_target(false)
        .filter_level(adjusted_level(base, verbose, quiet))
        .init();
}

fn load_config(cli: &Cli) -> Result<CompilerConfig, CompileError> {
    let mut config = match &cli.config {
        Some(path) => CompilerConfig::from_json_file(path)?,
        None => CompilerConfig::default(),
    };
    if let Some(target) = cli.target {
        config.target = target.to_backend();
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), CompileError> {
    let compiler = Compiler::new(load_config(cli)?)?;
    let inputs = CompilationInputs::new(&cli.ontology_dir, &cli.sql_dir, &cli.output_dir);
    let report = compiler.compile(&inputs)?;

    if let Some(path) = &cli.plan_out {
        let json = report.plan.to_json_pretty().map_err(CompileError::Codegen)?;
        fs::write(path, json).map_err(|source| CompileError::Write {
            path: path.clone(),
            source,
        })?;
        info!("wrote emit plan to {}", path.display());
    }

    println!(
        "ontoc: {} files written to {} ({} target): {}",
        report.written.len(),
        cli.output_dir.display(),
        compiler.config().target,
        report.stats.summary()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ontoc: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_positional_paths_are_required() {
        assert!(Cli::try_parse_from(["ontoc", "onto", "sql"]).is_err());
        let cli = Cli::try_parse_from(["ontoc", "onto", "sql", "out"]).expect("valid arguments");
        assert_eq!(cli.ontology_dir, PathBuf::from("onto"));
        assert_eq!(cli.output_dir, PathBuf::from("out"));
        assert_eq!(cli.target, None);
        assert_eq!(cli.log_level, LogLevel::Info);
    }

    #[test]
    fn target_flag_overrides_default_backend() {
        let cli = Cli::try_parse_from(["ontoc", "onto", "sql", "out", "--target", "rust"])
            .expect("valid arguments");
        let config = load_config(&cli).expect("default config");
        assert_eq!(config.target, Backend::Rust);
    }

    #[test]
    fn verbosity_flags_shift_the_base_level() {
        assert_eq!(adjusted_level(LogLevel::Info, 0, 0), LevelFilter::Info);
        assert_eq!(adjusted_level(LogLevel::Info, 2, 0), LevelFilter::Trace);
        assert_eq!(adjusted_level(LogLevel::Info, 9, 0), LevelFilter::Trace);
        assert_eq!(adjusted_level(LogLevel::Warn, 0, 3), LevelFilter::Error);

        let cli = Cli::try_parse_from(["ontoc", "a", "b", "c", "-vv", "-q"]).expect("valid arguments");
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.quiet, 1);
    }
}
