//! Error types for the sync engine.

use std::path::PathBuf;

use modelsync::FormatError;
use modelsync_client::ApiError;

/// All errors that can occur during preview, sync or export.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid definition file: {0}")]
    Format(#[from] FormatError),

    #[error("failed to read definition file {path}: {source}")]
    DefinitionRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("aborted: {0}")]
    Aborted(String),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

impl Error {
    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Aborted(_) => 0,
            Error::Validation(_) | Error::Format(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
