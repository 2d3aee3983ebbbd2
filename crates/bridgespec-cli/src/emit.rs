//! Writing generated artifacts next to their spec file.
//!
//! ```text
//! <dir>/<name>.bspec
//! <dir>/_generated/.gitignore
//! <dir>/_generated/<backend>/<name>.h
//! <dir>/_generated/<backend>/<name>.c
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use bridgespec_types::GeneratedCode;

use crate::error::{CliError, CliResult};

/// Output directory created beside each spec file.
pub const GENERATED_DIR: &str = "_generated";

const GITIGNORE: &str = "**/*.h\n**/*.c\n";

/// Paths of the two files written for one spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub header: PathBuf,
    pub source: PathBuf,
}

fn write_file(path: &Path, contents: &str) -> CliResult<()> {
    std::fs::write(path, contents).map_err(|e| CliError::io(path, e))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staged = path.as_os_str().to_owned();
    staged.push(".tmp");
    PathBuf::from(staged)
}

fn discard(paths: &[&Path]) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("could not remove {}: {e}", path.display());
            }
        }
    }
}

/// Write both files of a pair or neither.
///
/// Contents are staged next to their targets and renamed into place; if the
/// second rename fails the first target is removed again.
fn write_pair(artifacts: &Artifacts, code: &GeneratedCode) -> CliResult<()> {
    let header_tmp = staging_path(&artifacts.header);
    let source_tmp = staging_path(&artifacts.source);
    let staged = write_file(&header_tmp, &code.header)
        .and_then(|()| write_file(&source_tmp, &code.source));
    if let Err(e) = staged {
        discard(&[&header_tmp, &source_tmp]);
        return Err(e);
    }

    if let Err(e) = std::fs::rename(&header_tmp, &artifacts.header) {
        discard(&[&header_tmp, &source_tmp]);
        return Err(CliError::io(&artifacts.header, e));
    }
    if let Err(e) = std::fs::rename(&source_tmp, &artifacts.source) {
        discard(&[&source_tmp, &artifacts.header]);
        return Err(CliError::io(&artifacts.source, e));
    }
    Ok(())
}

/// Write `code` under `dir` and return the paths written.
pub fn write_artifacts(dir: &Path, name: &str, code: &GeneratedCode) -> CliResult<Artifacts> {
    let generated = dir.join(GENERATED_DIR);
    let out = generated.join(&code.backend);
    std::fs::create_dir_all(&out).map_err(|e| CliError::io(&out, e))?;
    write_file(&generated.join(".gitignore"), GITIGNORE)?;

    let artifacts = Artifacts {
        header: out.join(format!("{name}.h")),
        source: out.join(format!("{name}.c")),
    };
    write_pair(&artifacts, code)?;
    log::info!(
        "wrote {} and {}",
        artifacts.header.display(),
        artifacts.source.display()
    );
    Ok(artifacts)
}

/// Run `formatter` over the artifacts in place.
///
/// Formatting is cosmetic: a missing tool or a non-zero exit is logged and
/// the unformatted files are kept.
pub fn format_artifacts(formatter: &str, artifacts: &Artifacts) {
    let mut parts = formatter.split_whitespace();
    let Some(program) = parts.next() else {
        return;
    };
    let status = Command::new(program)
        .args(parts)
        .arg("-i")
        .arg(&artifacts.header)
        .arg(&artifacts.source)
        .status();
    match status {
        Ok(status) if status.success() => {
            log::debug!("formatted {} with {program}", artifacts.source.display());
        }
        Ok(status) => log::warn!("{program} exited with {status}; keeping unformatted output"),
        Err(e) => log::warn!("could not run {program}: {e}; keeping unformatted output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> GeneratedCode {
        GeneratedCode {
            backend: "nif".to_string(),
            header: "/* h */\n".to_string(),
            source: "/* c */\n".to_string(),
        }
    }

    #[test]
    fn test_layout() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = write_artifacts(dir.path(), "example", &code()).unwrap();
        assert_eq!(
            artifacts.header,
            dir.path().join("_generated/nif/example.h")
        );
        assert_eq!(std::fs::read_to_string(&artifacts.source).unwrap(), "/* c */\n");
        let ignore = std::fs::read_to_string(dir.path().join("_generated/.gitignore")).unwrap();
        assert_eq!(ignore, "**/*.h\n**/*.c\n");
    }

    #[test]
    fn test_rewrite_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), "example", &code()).unwrap();
        let mut changed = code();
        changed.header = "/* h2 */\n".to_string();
        let artifacts = write_artifacts(dir.path(), "example", &changed).unwrap();
        assert_eq!(std::fs::read_to_string(artifacts.header).unwrap(), "/* h2 */\n");
    }

    #[test]
    fn test_failed_source_write_leaves_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("_generated/nif");
        std::fs::create_dir_all(out.join("example.c")).unwrap();

        let err = write_artifacts(dir.path(), "example", &code()).unwrap_err();
        assert!(matches!(err, CliError::Io { ref path, .. } if path.ends_with("example.c")));
        assert!(!out.join("example.h").exists());
        assert!(!out.join("example.h.tmp").exists());
        assert!(!out.join("example.c.tmp").exists());
    }

    #[test]
    fn test_missing_formatter_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = write_artifacts(dir.path(), "example", &code()).unwrap();
        format_artifacts("bridgespec-no-such-formatter-binary", &artifacts);
        assert_eq!(std::fs::read_to_string(&artifacts.header).unwrap(), "/* h */\n");
    }
}
