use thiserror::Error;

pub type Result<T> = std::result::Result<T, IntentError>;

#[derive(Error, Debug)]
pub enum IntentError {
    #[error("Unsupported lexicon schema_version {found} (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },

    #[error("Lexicon section '{0}' is empty")]
    EmptySection(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
