use std::path::PathBuf;

use thiserror::Error;

/// Failures of the key-value storage layer.
///
/// These never reach repository callers: the persistence adapter logs them
/// and keeps the in-memory state authoritative. Only `Persistence::flush`
/// hands one back so shutdown code can report lost durability.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read key {key}: {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write key {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove key {key}: {source}")]
    Remove {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage rejected write for key {key}")]
    Rejected { key: String },
}

impl StoreError {
    pub fn key(&self) -> &str {
        match self {
            StoreError::Read { key, .. }
            | StoreError::Write { key, .. }
            | StoreError::Remove { key, .. }
            | StoreError::Rejected { key } => key,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
