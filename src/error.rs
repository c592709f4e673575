use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("{var} not found; set it in the environment or a .env file")]
    MissingCredentials { var: &'static str },

    #[error("corpus file not found: {0}")]
    CorpusNotFound(PathBuf),

    #[error("{lines} lines but {vectors} vectors")]
    Misaligned { lines: usize, vectors: usize },

    #[error("vector dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("vector {index} has a non-finite component")]
    NonFiniteVector { index: usize },

    #[error("embedding provider returned no vector for the query")]
    EmptyEmbedding,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cache directory does not exist and could not be created: {0}")]
    CacheDir(PathBuf),
}
