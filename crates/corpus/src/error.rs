use thiserror::Error;

pub type Result<T> = std::result::Result<T, CorpusError>;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Unsupported content schema_version {found} (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },

    #[error("Content pack is empty")]
    Empty,

    #[error("Duplicate composite key: {0}")]
    DuplicateKey(String),

    #[error("Duplicate state key: {0}")]
    DuplicateState(String),

    #[error("State library is missing the required fallback state '{0}'")]
    MissingFallbackState(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
