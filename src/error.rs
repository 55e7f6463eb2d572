use thiserror::Error;

/// Crate-wide error type for failures that aren't one of the semantic
/// read-path signals (those live in `handlers`, `remote`, and `snapshot`).
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("remote transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, QueryError>;
