use std::path::{Path, PathBuf};
use tether::core::io::diagnostics::DiagnosticsError;
use tether::core::io::fixture_file::FixtureLoadError;
use tether::core::io::xyz::XyzError;
use tether::engine::error::EngineError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write '{path}': {source}", path = path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn fixture(path: &Path, source: FixtureLoadError) -> Self {
        Self::FileParsing {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub fn xyz(path: &Path, source: XyzError) -> Self {
        Self::Output {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub fn diagnostics(path: &Path, source: DiagnosticsError) -> Self {
        Self::Output {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}
