use thiserror::Error;

/// Main error type for kglink
#[derive(Error, Debug)]
pub enum KglinkError {
    /// HTTP transport errors (SPARQL endpoint, search API, embedding service)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding service errors
    #[error("Embedding service error: {0}")]
    Embedding(String),

    /// SPARQL endpoint / Wikidata API errors
    #[error("Query service error: {0}")]
    Query(String),

    /// Malformed response bodies or table files
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using KglinkError
pub type Result<T> = std::result::Result<T, KglinkError>;
