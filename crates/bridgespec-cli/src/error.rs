//! CLI error types.

use std::path::PathBuf;

use bridgespec_types::CompileErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid project configuration {path}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to walk spec directory")]
    Walk(#[from] walkdir::Error),

    #[error("failed to serialize output")]
    Json(#[from] serde_json::Error),

    /// The spec file itself is invalid.
    #[error("{}:\n{errors}", .path.display())]
    Compile { path: PathBuf, errors: CompileErrors },
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
