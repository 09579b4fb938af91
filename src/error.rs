use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::markup::MarkupError;
use crate::mt::MtError;

/// Errors that abort a translation run
#[derive(Debug, Error)]
pub enum IdiomError {
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Translation(#[from] MtError),

    #[error("Could not restore markers in translation of '{key}': {source}")]
    Markup { key: String, source: MarkupError },

    #[error("Unsupported source file '{}' (expected .yml, .yaml or .pres)", .0.display())]
    UnsupportedSource(PathBuf),

    #[error("Failed to scan '{}': {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl IdiomError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IdiomError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IdiomError>;
