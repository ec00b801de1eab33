use std::path::PathBuf;

use thiserror::Error;

/// A project entry that could not be turned into a directive. The entry is
/// skipped; the rest of the project is still described.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectDescribeError {
    #[error("{section} entry #{index} has no path")]
    MissingPath { section: &'static str, index: usize },
    #[error("failed to read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read project manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml manifest: {0}")]
    Toml(String),
    #[error("failed to parse json manifest: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for ManifestError {
    fn from(err: toml::de::Error) -> Self {
        ManifestError::Toml(err.message().to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("a project describer with id {id:?} is already registered")]
    DuplicateId { id: String },
}
