//! SQL query extraction from comment-delimited files.
//!
//! ```sql
//! -- get_user
//! SELECT * FROM users
//! WHERE id = :user_id;
//! ```
//!
//! A `-- <name>` (or `-- name: <name>`) line opens a block; the following
//! non-comment lines form its SQL text. Only `:param` tokens are recognized.

use crate::model::{Diagnostic, ParamType, ParameterSpec, Phase, SqlQueryRecord};
use log::debug;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const COMMENT_MARKER: &str = "--";

fn name_line_regex() -> &'static Regex {
    static NAME_LINE: OnceLock<Regex> = OnceLock::new();
    NAME_LINE.get_or_init(|| {
        Regex::new(r"^\s*(?:name\s*:\s*)?([A-Za-z_][A-Za-z0-9_]*)\s*$")
            .expect("name line pattern is valid")
    })
}

fn parameter_regex() -> &'static Regex {
    static PARAMETER: OnceLock<Regex> = OnceLock::new();
    PARAMETER.get_or_init(|| {
        Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("parameter pattern is valid")
    })
}

/// Returns the query name if `line` opens a new block: exactly one leading
/// comment marker followed by an identifier and nothing else.
fn query_name(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix(COMMENT_MARKER)?;
    if rest.trim_start().starts_with('-') {
        return None;
    }
    name_line_regex()
        .captures(rest)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

/// Best-effort type from the parameter's naming convention.
pub fn infer_param_type(name: &str) -> ParamType {
    const INTEGER_SUFFIXES: [&str; 4] = ["_id", "_count", "_num", "_year"];
    const FLOAT_SUFFIXES: [&str; 4] = ["_value", "_amount", "_price", "_rate"];

    let lowered = name.to_lowercase();
    if INTEGER_SUFFIXES.iter().any(|suffix| lowered.ends_with(suffix)) {
        ParamType::Integer
    } else if FLOAT_SUFFIXES.iter().any(|suffix| lowered.ends_with(suffix)) {
        ParamType::Float
    } else {
        ParamType::String
    }
}

/// `:name` parameters in first-occurrence order. A `::` cast is not a parameter.
pub fn extract_parameters(sql: &str) -> Vec<ParameterSpec> {
    let bytes = sql.as_bytes();
    let mut parameters: Vec<ParameterSpec> = Vec::new();
    for captures in parameter_regex().captures_iter(sql) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if whole.start() > 0 && bytes[whole.start() - 1] == b':' {
            continue;
        }
        let name = name.as_str();
        if parameters.iter().any(|param| param.name == name) {
            continue;
        }
        parameters.push(ParameterSpec {
            name: name.to_string(),
            inferred_type: infer_param_type(name),
        });
    }
    parameters
}

struct OpenBlock {
    name: String,
    lines: Vec<String>,
}

impl OpenBlock {
    fn finish(self) -> SqlQueryRecord {
        let sql_text = self.lines.join(" ");
        let parameters = extract_parameters(&sql_text);
        SqlQueryRecord {
            name: self.name,
            sql_text,
            parameters,
        }
    }
}

/// Extracts every named query of one SQL file. A later block with the same
/// name replaces the earlier one.
pub fn extract_queries(text: &str) -> BTreeMap<String, SqlQueryRecord> {
    let mut queries = BTreeMap::new();
    let mut open: Option<OpenBlock> = None;

    for line in text.lines() {
        if let Some(name) = query_name(line) {
            if let Some(block) = open.take() {
                let query = block.finish();
                queries.insert(query.name.clone(), query);
            }
            open = Some(OpenBlock {
                name: name.to_string(),
                lines: Vec::new(),
            });
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER) {
            continue;
        }
        if let Some(block) = open.as_mut() {
            block.lines.push(trimmed.to_string());
        }
    }

    if let Some(block) = open.take() {
        let query = block.finish();
        queries.insert(query.name.clone(), query);
    }
    queries
}

/// Lists the SQL files of `dir` in sorted order.
fn sql_files(dir: &Path, extensions: &[String]) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let recognized = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);
        if path.is_file() && recognized {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Extracts the queries of every SQL file in `dir`. Never fails: unreadable
/// directories or files become diagnostics and contribute no queries.
pub fn load_sql_dir(
    dir: &Path,
    extensions: &[String],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<SqlQueryRecord> {
    let files = match sql_files(dir, extensions) {
        Ok(files) => files,
        Err(err) => {
            diagnostics.push(Diagnostic::warn(
                Phase::ParseSql,
                dir.display().to_string(),
                format!("cannot list SQL directory, no queries extracted: {err}"),
            ));
            return Vec::new();
        }
    };

    let mut queries = Vec::new();
    for path in files {
        match fs::read_to_string(&path) {
            Ok(text) => {
                let extracted = extract_queries(&text);
                debug!("{} queries in {}", extracted.len(), path.display());
                queries.extend(extracted.into_values());
            }
            Err(err) => diagnostics.push(Diagnostic::warn(
                Phase::ParseSql,
                path.display().to_string(),
                format!("skipping unreadable SQL file: {err}"),
            )),
        }
    }
    queries
}
