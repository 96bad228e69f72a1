use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VigilError {
    #[error("cannot prepare vault folder {path}: {source}")]
    VaultLayout {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("watch folder does not exist: {0}")]
    WatchTargetMissing(PathBuf),

    #[error("spool directory not found: {0}")]
    SpoolMissing(PathBuf),

    #[error("invalid action record: {0}")]
    InvalidRecord(String),

    #[error("unknown connector kind '{0}': expected files, inbox, chat, or network")]
    UnknownConnector(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VigilError>;
