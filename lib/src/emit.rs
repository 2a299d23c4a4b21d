use crate::codegen::GeneratedModules;
use crate::error::CompileError;
use log::debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes every generated file into `out_dir`, creating it if needed.
///
/// All files are first staged as temporary files in the same directory and
/// flushed. Only then is each renamed over its final name. A failure while
/// staging replaces nothing, and staged files that were never persisted are
/// removed on drop, so a final name never holds partial content.
pub fn write_generated_modules(
    out_dir: &Path,
    modules: &GeneratedModules,
) -> Result<Vec<PathBuf>, CompileError> {
    fs::create_dir_all(out_dir).map_err(|source| CompileError::OutputDir {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut staged = Vec::with_capacity(modules.files.len());
    for (name, content) in &modules.files {
        let path = out_dir.join(name);
        let file = stage(out_dir, &path, content)?;
        staged.push((path, file, content.len()));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (path, file, len) in staged {
        file.persist(&path).map_err(|err| CompileError::Write {
            path: path.clone(),
            source: err.error,
        })?;
        debug!("wrote {} ({} bytes)", path.display(), len);
        written.push(path);
    }
    Ok(written)
}

fn stage(dir: &Path, path: &Path, content: &str) -> Result<NamedTempFile, CompileError> {
    let write_error = |source| CompileError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(content.as_bytes()).map_err(write_error)?;
    file.flush().map_err(write_error)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::Backend;

    fn modules() -> GeneratedModules {
        GeneratedModules {
            backend: Backend::C,
            files: vec![
                ("a.h".to_string(), "// a\n".to_string()),
                ("b.h".to_string(), "// b\n".to_string()),
            ],
        }
    }

    #[test]
    fn writes_every_file_into_a_fresh_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("nested").join("out");
        let written = write_generated_modules(&out, &modules()).expect("write succeeds");

        assert_eq!(written, vec![out.join("a.h"), out.join("b.h")]);
        assert_eq!(fs::read_to_string(out.join("b.h")).expect("b.h exists"), "// b\n");
        let names: Vec<String> = fs::read_dir(&out)
            .expect("out dir lists")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2, "no temporary files are left behind");
    }

    #[test]
    fn unwritable_output_location_is_fatal() {
        let dir = tempfile::tempdir().expect("temp dir");
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").expect("blocker written");

        let err = write_generated_modules(&blocker.join("out"), &modules())
            .expect_err("cannot create a directory under a file");
        assert!(matches!(err, CompileError::OutputDir { .. }));
    }

    #[test]
    fn failed_persist_leaves_later_files_and_no_temporaries() {
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("a.h").join("inner")).expect("directory in the way");
        fs::write(out.join("b.h"), "old\n").expect("previous output");

        let err = write_generated_modules(&out, &modules())
            .expect_err("a directory cannot be replaced by a file");
        assert!(matches!(err, CompileError::Write { ref path, .. } if path.ends_with("a.h")));
        assert_eq!(fs::read_to_string(out.join("b.h")).expect("b.h kept"), "old\n");
        let count = fs::read_dir(&out).expect("out dir lists").count();
        assert_eq!(count, 2, "staged files are removed");
    }
}
