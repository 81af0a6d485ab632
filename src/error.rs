// Library error type. The binary wraps these in anyhow.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfilerError {
    /// The import document could not be parsed at all; nothing was applied.
    #[error("import failed: {0}")]
    Import(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// start() needs a tokio runtime to spawn the sampling task.
    #[error("no tokio runtime available to run the sampler")]
    NoRuntime,

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),
}

pub type Result<T> = std::result::Result<T, ProfilerError>;
